//! POSIX user and group name rules.

use crate::Result;
use nnev_core::Error;
use regex::Regex;
use std::sync::OnceLock;

/// Lowercase letter or underscore, then up to 31 of `[a-z0-9_-]`.
const POSIX_ID_PATTERN: &str = "^[a-z_][a-z0-9_-]{0,31}$";

fn posix_id_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(POSIX_ID_PATTERN).expect("POSIX id pattern is valid"))
}

/// Returns true if `id` is usable as a user or group name.
#[must_use]
pub fn validate_posix_id(id: &str) -> bool {
    posix_id_regex().is_match(id)
}

/// Rejects invalid user names.
///
/// # Errors
///
/// Returns [`Error::InvalidRequest`] when `uid` is not a valid POSIX name.
pub fn check_user_name(uid: &str) -> Result<()> {
    if validate_posix_id(uid) {
        Ok(())
    } else {
        Err(Error::InvalidRequest("Invalid user name".to_string()))
    }
}

/// Rejects invalid group names.
///
/// # Errors
///
/// Returns [`Error::InvalidRequest`] when `gid` is not a valid POSIX name.
pub fn check_group_name(gid: &str) -> Result<()> {
    if validate_posix_id(gid) {
        Ok(())
    } else {
        Err(Error::InvalidRequest("Invalid group name".to_string()))
    }
}
