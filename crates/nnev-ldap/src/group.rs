//! POSIX group representation.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dn::DistinguishedName;
use crate::entry::LdapEntry;
use crate::Result;
use nnev_core::Error;

/// Object classes every managed group carries.
pub const GROUP_OBJECT_CLASSES: &[&str] = &["top", "groupOfEntries", "posixGroup"];

/// Attributes requested when reading groups.
pub(crate) const GROUP_ATTRIBUTES: &[&str] = &["objectClass", "cn", "gidNumber", "member"];

/// A `posixGroup` entry below the groups base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosixGroup {
    /// Distinguished name of the group.
    pub dn: DistinguishedName,
    /// Group name (`cn`).
    pub name: String,
    /// Numeric group id.
    pub gid_number: u32,
    /// Distinguished names of the members.
    #[serde(default)]
    pub members: Vec<DistinguishedName>,
}

impl PosixGroup {
    /// Creates a new builder with the required fields.
    #[must_use]
    pub fn builder(
        dn: DistinguishedName,
        name: impl Into<String>,
        gid_number: u32,
    ) -> PosixGroupBuilder {
        PosixGroupBuilder {
            dn,
            name: name.into(),
            gid_number,
            members: Vec::new(),
        }
    }

    /// Reads a group from a directory entry. Unparsable member DNs are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if the DN, `cn` or `gidNumber` is missing or malformed.
    pub fn from_entry(entry: &LdapEntry) -> Result<Self> {
        let dn = entry.distinguished_name()?;
        let name = entry
            .first("cn")
            .ok_or_else(|| Error::ParseError(format!("{} is missing `cn`", entry.dn)))?;

        let mut builder = Self::builder(dn, name, entry.u32_value("gidNumber")?);
        if let Some(members) = entry.values("member") {
            let parsed = members
                .iter()
                .filter_map(|dn_str| match DistinguishedName::parse(dn_str) {
                    Ok(member_dn) => Some(member_dn),
                    Err(err) => {
                        warn!("Failed to parse member DN `{dn_str}`: {err}");
                        None
                    }
                })
                .collect::<Vec<_>>();
            builder = builder.members(parsed);
        }

        Ok(builder.build())
    }

    /// Converts the group into the entry that is added to the directory.
    #[must_use]
    pub fn to_entry(&self) -> LdapEntry {
        LdapEntry::new(self.dn.as_str())
            .with_attribute("objectClass", GROUP_OBJECT_CLASSES.iter().copied())
            .with_attribute("cn", [self.name.as_str()])
            .with_attribute("gidNumber", [self.gid_number.to_string()])
            .with_attribute("member", self.members.iter().map(DistinguishedName::as_str))
    }

    /// Returns the number of members in the group.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Checks whether the given distinguished name is a member (case-insensitive).
    #[must_use]
    pub fn has_member(&self, member_dn: &DistinguishedName) -> bool {
        self.members.iter().any(|dn| dn.same_entry(member_dn))
    }
}

/// Builder for [`PosixGroup`].
#[derive(Debug)]
pub struct PosixGroupBuilder {
    dn: DistinguishedName,
    name: String,
    gid_number: u32,
    members: Vec<DistinguishedName>,
}

impl PosixGroupBuilder {
    /// Appends a member distinguished name.
    #[must_use]
    pub fn add_member(mut self, dn: DistinguishedName) -> Self {
        self.members.push(dn);
        self
    }

    /// Appends multiple members.
    #[must_use]
    pub fn members<I>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = DistinguishedName>,
    {
        self.members.extend(members);
        self
    }

    /// Builds the [`PosixGroup`].
    #[must_use]
    pub fn build(self) -> PosixGroup {
        PosixGroup {
            dn: self.dn,
            name: self.name,
            gid_number: self.gid_number,
            members: self.members,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_creates_group() {
        let dn = DistinguishedName::parse("cn=noname,ou=groups,dc=noname-ev,dc=de").unwrap();
        let member = DistinguishedName::parse("uid=user1,ou=users,dc=noname-ev,dc=de").unwrap();
        let group = PosixGroup::builder(dn.clone(), "noname", 1000)
            .add_member(member.clone())
            .build();

        assert_eq!(group.dn, dn);
        assert_eq!(group.member_count(), 1);
        assert!(group.has_member(&member));
        assert!(group.has_member(
            &DistinguishedName::parse("UID=user1,OU=users,DC=noname-ev,DC=de").unwrap()
        ));
    }

    #[test]
    fn entry_round_trip_skips_bad_members() {
        let entry = LdapEntry::new("cn=group1,ou=groups,dc=noname-ev,dc=de")
            .with_attribute("objectClass", GROUP_OBJECT_CLASSES.iter().copied())
            .with_attribute("cn", ["group1"])
            .with_attribute("gidNumber", ["1001"])
            .with_attribute(
                "member",
                ["uid=user1,ou=users,dc=noname-ev,dc=de", "not a dn"],
            );

        let group = PosixGroup::from_entry(&entry).unwrap();
        assert_eq!(group.name, "group1");
        assert_eq!(group.gid_number, 1001);
        assert_eq!(group.member_count(), 1);

        let written = group.to_entry();
        assert_eq!(written.values("member").map(<[String]>::len), Some(1));
        assert_eq!(written.first("gidNumber"), Some("1001"));
    }

    #[test]
    fn empty_group_has_no_member_attribute() {
        let dn = DistinguishedName::parse("cn=empty,ou=groups,dc=noname-ev,dc=de").unwrap();
        let entry = PosixGroup::builder(dn, "empty", 2000).build().to_entry();
        assert!(entry.values("member").is_none());
    }
}
