//! Directory entries and modifications.

use crate::dn::DistinguishedName;
use crate::Result;
use ldap3::Scope;
use nnev_core::Error;

/// Represents the search scope for LDAP queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// Base object only.
    Base,
    /// One level below the base.
    OneLevel,
    /// Entire subtree.
    Subtree,
}

impl From<SearchScope> for Scope {
    fn from(scope: SearchScope) -> Self {
        match scope {
            SearchScope::Base => Scope::Base,
            SearchScope::OneLevel => Scope::OneLevel,
            SearchScope::Subtree => Scope::Subtree,
        }
    }
}

/// One multi-valued attribute of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdapAttribute {
    /// Attribute name as stored.
    pub name: String,
    /// Values in server order.
    pub values: Vec<String>,
}

/// LDAP entry: a DN plus attributes in insertion order.
///
/// Attribute names compare case-insensitively. Values compare exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdapEntry {
    /// Distinguished name of the entry.
    pub dn: String,
    /// Attributes in insertion order.
    pub attributes: Vec<LdapAttribute>,
}

impl LdapEntry {
    /// Creates an entry without attributes.
    #[must_use]
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: Vec::new(),
        }
    }

    /// Appends values to `name`, creating the attribute when needed.
    #[must_use]
    pub fn with_attribute<I, V>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        for value in values {
            self.add_value(name, value);
        }
        self
    }

    /// Parses the entry DN.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if the DN is malformed.
    pub fn distinguished_name(&self) -> Result<DistinguishedName> {
        Ok(DistinguishedName::parse(&self.dn)?)
    }

    fn attribute(&self, name: &str) -> Option<&LdapAttribute> {
        self.attributes
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
    }

    fn attribute_mut(&mut self, name: &str) -> Option<&mut LdapAttribute> {
        self.attributes
            .iter_mut()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
    }

    /// Returns the first value of the attribute if present.
    #[must_use]
    pub fn first(&self, attribute: &str) -> Option<&str> {
        self.values(attribute)
            .and_then(|values| values.first().map(String::as_str))
    }

    /// Returns all values for the attribute.
    #[must_use]
    pub fn values(&self, attribute: &str) -> Option<&[String]> {
        self.attribute(attribute).map(|attr| attr.values.as_slice())
    }

    /// Returns true if the attribute holds exactly `value`.
    #[must_use]
    pub fn has_value(&self, attribute: &str, value: &str) -> bool {
        self.values(attribute)
            .is_some_and(|values| values.iter().any(|v| v == value))
    }

    /// Parses the first value of a numeric attribute.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if the attribute is missing or not a number.
    pub fn u32_value(&self, attribute: &str) -> Result<u32> {
        let raw = self
            .first(attribute)
            .ok_or_else(|| Error::ParseError(format!("{} has no `{attribute}`", self.dn)))?;
        raw.trim().parse().map_err(|_| {
            Error::ParseError(format!("{} has non-numeric `{attribute}`: {raw}", self.dn))
        })
    }

    /// Adds a value. Returns false if it was already present.
    pub fn add_value(&mut self, attribute: &str, value: impl Into<String>) -> bool {
        let value = value.into();
        match self.attribute_mut(attribute) {
            Some(attr) if attr.values.contains(&value) => false,
            Some(attr) => {
                attr.values.push(value);
                true
            }
            None => {
                self.attributes.push(LdapAttribute {
                    name: attribute.to_string(),
                    values: vec![value],
                });
                true
            }
        }
    }

    /// Removes a value. Returns false if it was not present. Drops the attribute once empty.
    pub fn remove_value(&mut self, attribute: &str, value: &str) -> bool {
        let Some(attr) = self.attribute_mut(attribute) else {
            return false;
        };
        let before = attr.values.len();
        attr.values.retain(|v| v != value);
        let removed = attr.values.len() != before;
        self.attributes.retain(|attr| !attr.values.is_empty());
        removed
    }

    /// Removes the whole attribute. Returns false if it was absent.
    pub fn remove_attribute(&mut self, attribute: &str) -> bool {
        let before = self.attributes.len();
        self.attributes
            .retain(|attr| !attr.name.eq_ignore_ascii_case(attribute));
        self.attributes.len() != before
    }

    /// Copy restricted to the requested attributes. An empty list or `*` keeps everything.
    #[must_use]
    pub fn project(&self, attributes: &[&str]) -> Self {
        if attributes.is_empty() || attributes.contains(&"*") {
            return self.clone();
        }
        Self {
            dn: self.dn.clone(),
            attributes: self
                .attributes
                .iter()
                .filter(|attr| {
                    attributes
                        .iter()
                        .any(|wanted| attr.name.eq_ignore_ascii_case(wanted))
                })
                .cloned()
                .collect(),
        }
    }

    /// Value-level modifications that turn `before` into `after`.
    ///
    /// Only attributes whose values differ appear; an empty result means nothing to send.
    #[must_use]
    pub fn diff(before: &Self, after: &Self) -> Vec<DirectoryModification> {
        let mut mods = Vec::new();
        let mut names: Vec<&str> = before.attributes.iter().map(|a| a.name.as_str()).collect();
        for attr in &after.attributes {
            if !names.iter().any(|n| n.eq_ignore_ascii_case(&attr.name)) {
                names.push(&attr.name);
            }
        }

        for name in names {
            let old = before.values(name).unwrap_or_default();
            let new = after.values(name).unwrap_or_default();

            let removed: Vec<String> = old.iter().filter(|v| !new.contains(v)).cloned().collect();
            let added: Vec<String> = new.iter().filter(|v| !old.contains(v)).cloned().collect();

            if !removed.is_empty() {
                mods.push(DirectoryModification::Delete {
                    attribute: name.to_string(),
                    values: removed,
                });
            }
            if !added.is_empty() {
                mods.push(DirectoryModification::Add {
                    attribute: name.to_string(),
                    values: added,
                });
            }
        }
        mods
    }
}

impl From<ldap3::SearchEntry> for LdapEntry {
    fn from(entry: ldap3::SearchEntry) -> Self {
        let mut attributes = entry
            .attrs
            .into_iter()
            .map(|(name, values)| LdapAttribute { name, values })
            .collect::<Vec<_>>();
        attributes.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            dn: entry.dn,
            attributes,
        }
    }
}

/// LDAP modification request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryModification {
    /// Add attribute values.
    Add {
        /// Attribute to modify.
        attribute: String,
        /// Values to add.
        values: Vec<String>,
    },
    /// Delete attribute values.
    Delete {
        /// Attribute to modify.
        attribute: String,
        /// Values to delete (empty removes attribute).
        values: Vec<String>,
    },
    /// Replace attribute values.
    Replace {
        /// Attribute to modify.
        attribute: String,
        /// Replacement values.
        values: Vec<String>,
    },
}

impl DirectoryModification {
    /// Attribute targeted by the modification.
    #[must_use]
    pub fn attribute(&self) -> &str {
        match self {
            Self::Add { attribute, .. }
            | Self::Delete { attribute, .. }
            | Self::Replace { attribute, .. } => attribute,
        }
    }
}
