//! LDAP directory management for the noname e.V. member accounts.
//!
//! This crate provides typed POSIX account and group records, a [`DirectoryClient`] that
//! allocates ids and edits memberships and SSH keys, and an in-memory directory used for
//! dry runs and tests.

#![deny(missing_docs)]

mod client;
mod config;
mod dn;
mod entry;
mod filter;
mod group;
pub mod ldif;
mod memory;
mod posix;
mod user;

pub use client::{DirectoryClient, LdapConnector, LdapSession, RealLdapConnector};
pub use config::{
    ldapi_url, BindMethod, DirectoryConfig, DEFAULT_CONNECTION_TIMEOUT_SECS,
    DEFAULT_OPERATION_TIMEOUT_SECS,
};
pub use dn::{DistinguishedName, DistinguishedNameError, RelativeDistinguishedName};
pub use entry::{DirectoryModification, LdapAttribute, LdapEntry, SearchScope};
pub use filter::Filter;
pub use group::{PosixGroup, PosixGroupBuilder, GROUP_OBJECT_CLASSES};
pub use memory::MemoryDirectory;
pub use posix::{check_group_name, check_user_name, validate_posix_id};
pub use user::{PosixAccount, PosixAccountBuilder, ACCOUNT_OBJECT_CLASSES};

/// Convenient result alias that reuses the core error type.
pub type Result<T> = nnev_core::Result<T>;
