//! POSIX account representation.

use serde::{Deserialize, Serialize};

use crate::dn::DistinguishedName;
use crate::entry::LdapEntry;
use crate::Result;
use nnev_core::Error;

/// Object classes every managed account carries.
pub const ACCOUNT_OBJECT_CLASSES: &[&str] = &["top", "account", "posixAccount", "ldapPublicKey"];

/// Attributes requested when reading accounts.
pub(crate) const ACCOUNT_ATTRIBUTES: &[&str] = &[
    "objectClass",
    "cn",
    "uid",
    "uidNumber",
    "gidNumber",
    "loginShell",
    "homeDirectory",
    "sshPublicKey",
];

/// A `posixAccount` entry below the users base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosixAccount {
    /// Distinguished name of the entry.
    pub dn: DistinguishedName,
    /// Login name.
    pub uid: String,
    /// Real name.
    pub real_name: String,
    /// Numeric user id.
    pub uid_number: u32,
    /// Numeric id of the primary group.
    pub gid_number: u32,
    /// Login shell.
    pub login_shell: String,
    /// Home directory.
    pub home_directory: String,
    /// Authorized SSH public keys.
    #[serde(default)]
    pub ssh_public_keys: Vec<String>,
}

impl PosixAccount {
    /// Creates a builder with the required fields.
    #[must_use]
    pub fn builder(
        dn: DistinguishedName,
        uid: impl Into<String>,
        uid_number: u32,
        gid_number: u32,
    ) -> PosixAccountBuilder {
        let uid = uid.into();
        PosixAccountBuilder {
            dn,
            real_name: uid.clone(),
            uid,
            uid_number,
            gid_number,
            login_shell: String::new(),
            home_directory: String::new(),
            ssh_public_keys: Vec::new(),
        }
    }

    /// Reads an account from a directory entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if the DN or a required attribute is missing or malformed.
    pub fn from_entry(entry: &LdapEntry) -> Result<Self> {
        let dn = entry.distinguished_name()?;
        let uid = required(entry, "uid")?;

        let mut builder = Self::builder(
            dn,
            uid,
            entry.u32_value("uidNumber")?,
            entry.u32_value("gidNumber")?,
        )
        .login_shell(entry.first("loginShell").unwrap_or_default())
        .home_directory(required(entry, "homeDirectory")?);

        if let Some(cn) = entry.first("cn") {
            builder = builder.real_name(cn);
        }
        if let Some(keys) = entry.values("sshPublicKey") {
            builder = builder.ssh_public_keys(keys.iter().cloned());
        }

        Ok(builder.build())
    }

    /// Converts the account into the entry that is added to the directory.
    #[must_use]
    pub fn to_entry(&self) -> LdapEntry {
        let mut entry = LdapEntry::new(self.dn.as_str())
            .with_attribute("objectClass", ACCOUNT_OBJECT_CLASSES.iter().copied())
            .with_attribute("cn", [self.real_name.as_str()])
            .with_attribute("uid", [self.uid.as_str()])
            .with_attribute("uidNumber", [self.uid_number.to_string()])
            .with_attribute("gidNumber", [self.gid_number.to_string()])
            .with_attribute("loginShell", [self.login_shell.as_str()])
            .with_attribute("homeDirectory", [self.home_directory.as_str()]);
        for key in &self.ssh_public_keys {
            entry.add_value("sshPublicKey", key.as_str());
        }
        entry
    }

    /// Returns true if the account has exactly this key.
    #[must_use]
    pub fn has_key(&self, key: &str) -> bool {
        self.ssh_public_keys.iter().any(|k| k == key)
    }
}

fn required<'a>(entry: &'a LdapEntry, attribute: &str) -> Result<&'a str> {
    entry
        .first(attribute)
        .ok_or_else(|| Error::ParseError(format!("{} is missing `{attribute}`", entry.dn)))
}

/// Builder for [`PosixAccount`].
#[derive(Debug)]
pub struct PosixAccountBuilder {
    dn: DistinguishedName,
    uid: String,
    real_name: String,
    uid_number: u32,
    gid_number: u32,
    login_shell: String,
    home_directory: String,
    ssh_public_keys: Vec<String>,
}

impl PosixAccountBuilder {
    /// Sets the real name (`cn`). Defaults to the login name.
    #[must_use]
    pub fn real_name(mut self, real_name: impl Into<String>) -> Self {
        self.real_name = real_name.into();
        self
    }

    /// Sets the login shell.
    #[must_use]
    pub fn login_shell(mut self, shell: impl Into<String>) -> Self {
        self.login_shell = shell.into();
        self
    }

    /// Sets the home directory.
    #[must_use]
    pub fn home_directory(mut self, home: impl Into<String>) -> Self {
        self.home_directory = home.into();
        self
    }

    /// Replaces the SSH key list.
    #[must_use]
    pub fn ssh_public_keys<I>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.ssh_public_keys = keys.into_iter().collect();
        self
    }

    /// Finalises the builder and returns the [`PosixAccount`].
    #[must_use]
    pub fn build(self) -> PosixAccount {
        PosixAccount {
            dn: self.dn,
            uid: self.uid,
            real_name: self.real_name,
            uid_number: self.uid_number,
            gid_number: self.gid_number,
            login_shell: self.login_shell,
            home_directory: self.home_directory,
            ssh_public_keys: self.ssh_public_keys,
        }
    }
}
