//! In-memory directory used for dry runs and tests.

use crate::{
    client::{result_code_error, LdapConnector, LdapSession},
    config::DirectoryConfig,
    dn::DistinguishedName,
    entry::{DirectoryModification, LdapEntry, SearchScope},
    filter::Filter,
    ldif, Result,
};
use async_trait::async_trait;
use nnev_core::{config::DEFAULT_BASE_DN, Error};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

const FIXTURE: &str = include_str!("../fixtures/data.ldif");

const NO_SUCH_ATTRIBUTE: u32 = 16;
const ATTRIBUTE_OR_VALUE_EXISTS: u32 = 20;
const NO_SUCH_OBJECT: u32 = 32;
const ENTRY_ALREADY_EXISTS: u32 = 68;

/// A directory tree kept in process memory.
///
/// Clones share the same tree. The directory accepts any bind, requires parents to exist
/// before children are added, and applies each modify request atomically. No schema is
/// enforced.
#[derive(Debug, Clone)]
pub struct MemoryDirectory {
    state: Arc<Mutex<State>>,
}

#[derive(Debug)]
struct State {
    suffix: DistinguishedName,
    entries: BTreeMap<String, Stored>,
}

#[derive(Debug, Clone)]
struct Stored {
    dn: DistinguishedName,
    entry: LdapEntry,
}

impl MemoryDirectory {
    /// Creates an empty directory serving `suffix`.
    #[must_use]
    pub fn new(suffix: DistinguishedName) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                suffix,
                entries: BTreeMap::new(),
            })),
        }
    }

    /// Creates the management tree for `config` and loads the bundled sample accounts.
    ///
    /// Both id counters start at 2000.
    ///
    /// # Errors
    ///
    /// Returns an error if the sample data does not fit below the configured base DN.
    pub fn seeded(config: &DirectoryConfig) -> Result<Self> {
        let base = config.base_dn();
        let directory = Self::new(base.clone());

        let base_name = base
            .components()
            .next()
            .map(|rdn| rdn.value().to_string())
            .unwrap_or_default();
        directory.insert(
            LdapEntry::new(base.as_str())
                .with_attribute("objectClass", ["top", "dcObject", "organization"])
                .with_attribute("dc", [base_name.as_str()])
                .with_attribute("o", [base_name.as_str()]),
        )?;

        let administration = DistinguishedName::child_of("ou", "administration", base);
        directory.insert(organizational_unit(&administration, "administration"))?;
        for ou in ["bindusers", "sudoers"] {
            let dn = DistinguishedName::child_of("ou", ou, &administration);
            directory.insert(organizational_unit(&dn, ou))?;
        }
        directory.insert(counter(config.next_uid_dn(), "uidNext", "uidNumber"))?;
        directory.insert(counter(config.next_gid_dn(), "GidNext", "gidNumber"))?;
        directory.insert(organizational_unit(config.users_base_dn(), "users"))?;
        directory.insert(organizational_unit(config.groups_base_dn(), "groups"))?;

        let fixture = FIXTURE.replace(DEFAULT_BASE_DN, base.as_str());
        let imported = directory.import_ldif(&fixture)?;
        debug!(entries = imported, "seeded in-memory directory");
        Ok(directory)
    }

    /// Adds `entry` with the same checks an add request gets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] if the entry exists and [`Error::NotFound`] if its parent
    /// does not.
    pub fn insert(&self, entry: LdapEntry) -> Result<()> {
        self.lock()?.add(entry)
    }

    /// Adds every record of an LDIF document and returns how many were added.
    pub fn import_ldif(&self, text: &str) -> Result<usize> {
        let entries = ldif::parse(text)?;
        let mut state = self.lock()?;
        let count = entries.len();
        for entry in entries {
            state.add(entry)?;
        }
        Ok(count)
    }

    /// Renders the whole tree as LDIF, parents before children.
    pub fn export_ldif(&self) -> Result<String> {
        let state = self.lock()?;
        let mut stored = state.entries.values().collect::<Vec<_>>();
        stored.sort_by(|a, b| {
            a.dn.len()
                .cmp(&b.dn.len())
                .then_with(|| a.dn.normalized().cmp(&b.dn.normalized()))
        });
        let entries = stored
            .into_iter()
            .map(|s| s.entry.clone())
            .collect::<Vec<_>>();
        Ok(ldif::write(&entries))
    }

    /// Returns a copy of the entry at `dn`, if present.
    pub fn entry(&self, dn: &str) -> Result<Option<LdapEntry>> {
        let key = DistinguishedName::parse(dn)?.normalized();
        Ok(self.lock()?.entries.get(&key).map(|s| s.entry.clone()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| Error::InternalError("in-memory directory lock poisoned".to_string()))
    }
}

fn organizational_unit(dn: &DistinguishedName, name: &str) -> LdapEntry {
    LdapEntry::new(dn.as_str())
        .with_attribute("objectClass", ["top", "organizationalUnit"])
        .with_attribute("ou", [name])
}

fn counter(dn: &DistinguishedName, class: &str, attribute: &str) -> LdapEntry {
    let cn = dn
        .components()
        .next()
        .map(|rdn| rdn.value().to_string())
        .unwrap_or_default();
    LdapEntry::new(dn.as_str())
        .with_attribute("objectClass", ["top", class])
        .with_attribute("cn", [cn])
        .with_attribute(attribute, ["2000"])
}

impl State {
    fn add(&mut self, entry: LdapEntry) -> Result<()> {
        let dn = entry.distinguished_name()?;
        if !dn.is_within(&self.suffix) {
            return Err(result_code_error(
                NO_SUCH_OBJECT,
                &format!("{dn} is outside {}", self.suffix),
            ));
        }
        let key = dn.normalized();
        if self.entries.contains_key(&key) {
            return Err(result_code_error(
                ENTRY_ALREADY_EXISTS,
                &format!("{dn} already exists"),
            ));
        }
        if !dn.same_entry(&self.suffix) {
            let parent_exists = dn
                .parent()
                .is_some_and(|parent| self.entries.contains_key(&parent.normalized()));
            if !parent_exists {
                return Err(result_code_error(
                    NO_SUCH_OBJECT,
                    &format!("parent of {dn} does not exist"),
                ));
            }
        }
        self.entries.insert(key, Stored { dn, entry });
        Ok(())
    }

    fn search(
        &self,
        base_dn: &str,
        scope: SearchScope,
        filter: &Filter,
        attributes: &[&str],
    ) -> Result<Vec<LdapEntry>> {
        let base = DistinguishedName::parse(base_dn)?;
        if !self.entries.contains_key(&base.normalized()) {
            return Err(result_code_error(
                NO_SUCH_OBJECT,
                &format!("{base} does not exist"),
            ));
        }

        Ok(self
            .entries
            .values()
            .filter(|stored| match scope {
                SearchScope::Base => stored.dn.same_entry(&base),
                SearchScope::OneLevel => stored.dn.is_child_of(&base),
                SearchScope::Subtree => stored.dn.is_within(&base),
            })
            .filter(|stored| filter.matches(&stored.entry))
            .map(|stored| {
                if attributes.is_empty() {
                    stored.entry.clone()
                } else {
                    stored.entry.project(attributes)
                }
            })
            .collect())
    }

    fn modify(&mut self, dn: &str, modifications: &[DirectoryModification]) -> Result<()> {
        let key = DistinguishedName::parse(dn)?.normalized();
        let stored = self
            .entries
            .get_mut(&key)
            .ok_or_else(|| result_code_error(NO_SUCH_OBJECT, &format!("{dn} does not exist")))?;

        let mut updated = stored.entry.clone();
        for modification in modifications {
            apply(&mut updated, modification)?;
        }
        stored.entry = updated;
        Ok(())
    }
}

fn apply(entry: &mut LdapEntry, modification: &DirectoryModification) -> Result<()> {
    match modification {
        DirectoryModification::Add { attribute, values } => {
            for value in values {
                if !entry.add_value(attribute, value.as_str()) {
                    return Err(result_code_error(
                        ATTRIBUTE_OR_VALUE_EXISTS,
                        &format!("{attribute} already has value {value}"),
                    ));
                }
            }
        }
        DirectoryModification::Delete { attribute, values } if values.is_empty() => {
            if !entry.remove_attribute(attribute) {
                return Err(result_code_error(
                    NO_SUCH_ATTRIBUTE,
                    &format!("{attribute} is not present"),
                ));
            }
        }
        DirectoryModification::Delete { attribute, values } => {
            for value in values {
                if !entry.remove_value(attribute, value) {
                    return Err(result_code_error(
                        NO_SUCH_ATTRIBUTE,
                        &format!("{attribute} has no value {value}"),
                    ));
                }
            }
        }
        DirectoryModification::Replace { attribute, values } => {
            entry.remove_attribute(attribute);
            for value in values {
                entry.add_value(attribute, value.as_str());
            }
        }
    }
    Ok(())
}

#[async_trait]
impl LdapConnector for MemoryDirectory {
    async fn connect(&self) -> Result<Box<dyn LdapSession>> {
        Ok(Box::new(MemorySession {
            directory: self.clone(),
        }))
    }
}

struct MemorySession {
    directory: MemoryDirectory,
}

#[async_trait]
impl LdapSession for MemorySession {
    async fn sasl_external_bind(&mut self) -> Result<()> {
        Ok(())
    }

    async fn simple_bind(&mut self, _dn: &str, _password: &str) -> Result<()> {
        Ok(())
    }

    async fn search(
        &mut self,
        base_dn: &str,
        scope: SearchScope,
        filter: &Filter,
        attributes: &[&'static str],
    ) -> Result<Vec<LdapEntry>> {
        self.directory
            .lock()?
            .search(base_dn, scope, filter, attributes)
    }

    async fn add(&mut self, entry: &LdapEntry) -> Result<()> {
        self.directory.lock()?.add(entry.clone())
    }

    async fn modify(&mut self, dn: &str, modifications: &[DirectoryModification]) -> Result<()> {
        self.directory.lock()?.modify(dn, modifications)
    }

    async fn unbind(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> DistinguishedName {
        DistinguishedName::parse("dc=example,dc=org").unwrap()
    }

    fn directory() -> MemoryDirectory {
        let directory = MemoryDirectory::new(base());
        directory
            .insert(LdapEntry::new("dc=example,dc=org").with_attribute("dc", ["example"]))
            .unwrap();
        directory
            .insert(organizational_unit(
                &DistinguishedName::parse("ou=people,dc=example,dc=org").unwrap(),
                "people",
            ))
            .unwrap();
        directory
            .insert(
                LdapEntry::new("uid=ann,ou=people,dc=example,dc=org")
                    .with_attribute("uid", ["ann"])
                    .with_attribute("mail", ["ann@example.org"]),
            )
            .unwrap();
        directory
    }

    #[test]
    fn add_requires_parent_and_unique_dn() {
        let directory = directory();

        let orphan = LdapEntry::new("uid=bob,ou=missing,dc=example,dc=org");
        assert!(matches!(directory.insert(orphan), Err(Error::NotFound(_))));

        let duplicate = LdapEntry::new("UID=ann,ou=people,dc=example,dc=org");
        assert!(matches!(directory.insert(duplicate), Err(Error::Conflict(_))));

        let outside = LdapEntry::new("dc=other,dc=org");
        assert!(matches!(directory.insert(outside), Err(Error::NotFound(_))));
    }

    #[test]
    fn search_respects_scope_and_projection() {
        let directory = directory();
        let state = directory.lock().unwrap();
        let everything = Filter::present("objectClass");
        let any_uid = Filter::present("uid");

        let base = state
            .search("ou=people,dc=example,dc=org", SearchScope::Base, &everything, &[])
            .unwrap();
        assert_eq!(base.len(), 1);

        let children = state
            .search("dc=example,dc=org", SearchScope::OneLevel, &any_uid, &[])
            .unwrap();
        assert!(children.is_empty());

        let subtree = state
            .search("dc=example,dc=org", SearchScope::Subtree, &any_uid, &["uid"])
            .unwrap();
        assert_eq!(subtree.len(), 1);
        assert!(subtree[0].first("mail").is_none());

        let missing = state.search("ou=nope,dc=example,dc=org", SearchScope::Base, &any_uid, &[]);
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }

    #[test]
    fn failed_modify_leaves_entry_untouched() {
        let directory = directory();
        let dn = "uid=ann,ou=people,dc=example,dc=org";
        let result = directory.lock().unwrap().modify(
            dn,
            &[
                DirectoryModification::Add {
                    attribute: "mail".to_string(),
                    values: vec!["ann@example.net".to_string()],
                },
                DirectoryModification::Delete {
                    attribute: "mail".to_string(),
                    values: vec!["nobody@example.org".to_string()],
                },
            ],
        );
        assert!(matches!(result, Err(Error::Conflict(_))));

        let entry = directory.entry(dn).unwrap().unwrap();
        assert_eq!(entry.values("mail").map(<[String]>::len), Some(1));
    }

    #[test]
    fn export_lists_parents_first() {
        let text = directory().export_ldif().unwrap();
        let dns = text
            .lines()
            .filter_map(|line| line.strip_prefix("dn: "))
            .collect::<Vec<_>>();
        assert_eq!(
            dns,
            [
                "dc=example,dc=org",
                "ou=people,dc=example,dc=org",
                "uid=ann,ou=people,dc=example,dc=org",
            ]
        );

        let copy = MemoryDirectory::new(base());
        assert_eq!(copy.import_ldif(&text).unwrap(), 3);
    }
}
