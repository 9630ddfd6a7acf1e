//! File-backed settings for the management tools.
//!
//! Settings are read from an optional TOML file. Every key has a default matching the production
//! directory host, so running without a file talks to the local `slapd` over its `ldapi` socket.

use crate::Error;
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use validator::Validate;

/// Default path of the OpenLDAP `ldapi` Unix domain socket.
pub const DEFAULT_LDAPI_SOCKET: &str = "/var/run/slapd/ldapi";
/// Default directory base.
pub const DEFAULT_BASE_DN: &str = "dc=noname-ev,dc=de";
/// Default login shell for new accounts.
pub const DEFAULT_SHELL: &str = "/usr/bin/bash";
/// Default parent directory for home directories.
pub const DEFAULT_HOME_PREFIX: &str = "/home";
/// Group every club member is added to.
pub const DEFAULT_MEMBER_GROUP: &str = "noname";
/// Where test mode dumps the in-memory directory.
pub const DEFAULT_TEST_DUMP_PATH: &str = "/tmp/ldapDump.ldif";

/// Top-level settings.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// LDAP connection settings
    #[validate(nested)]
    #[serde(default)]
    pub ldap: LdapSettings,

    /// Defaults applied to newly created accounts
    #[validate(nested)]
    #[serde(default)]
    pub accounts: AccountSettings,

    /// Settings for the in-memory test directory
    #[serde(default)]
    pub test_mode: TestModeSettings,
}

impl Settings {
    /// Loads settings from `path`, or returns validated defaults when no path is given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be read, [`Error::ConfigError`] when it is not
    /// valid TOML, and [`Error::ValidationError`] when a value is out of range.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let Some(path) = path else {
            debug!("no settings file given, using defaults");
            return Ok(Self::default());
        };

        debug!(path = %path.display(), "loading settings");
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(format!("failed to read settings {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parses and validates settings from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or fails validation.
    pub fn from_toml_str(raw: &str) -> Result<Self, Error> {
        let settings: Self = toml::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }
}

/// How to reach and authenticate against the directory server.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct LdapSettings {
    /// Path of the `ldapi` socket, used when `url` is unset
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,

    /// Explicit server URL (`ldap://`, `ldaps://` or `ldapi://`)
    #[validate(url)]
    #[serde(default)]
    pub url: Option<String>,

    /// DN for a simple bind; SASL EXTERNAL is used when unset
    #[serde(default)]
    pub bind_dn: Option<String>,

    /// Password for the simple bind
    #[serde(default)]
    pub bind_password: Option<SecretString>,

    /// Directory base DN
    #[validate(length(min = 1))]
    #[serde(default = "default_base_dn")]
    pub base_dn: String,

    /// Upgrade plain `ldap://` connections with StartTLS
    #[serde(default)]
    pub starttls: bool,

    /// Whether to verify TLS certificates
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    /// Optional path to a custom CA certificate
    #[serde(default)]
    pub tls_ca_cert: Option<PathBuf>,

    /// Connection timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_timeout_secs")]
    pub connection_timeout_secs: u64,

    /// Per-operation timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_timeout_secs")]
    pub operation_timeout_secs: u64,
}

fn default_socket_path() -> PathBuf {
    PathBuf::from(DEFAULT_LDAPI_SOCKET)
}

fn default_base_dn() -> String {
    DEFAULT_BASE_DN.to_string()
}

const fn default_tls_verify() -> bool {
    true
}

const fn default_timeout_secs() -> u64 {
    10
}

impl LdapSettings {
    /// Connection timeout as a Duration.
    #[must_use]
    pub const fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// Operation timeout as a Duration.
    #[must_use]
    pub const fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}

impl Default for LdapSettings {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            url: None,
            bind_dn: None,
            bind_password: None,
            base_dn: default_base_dn(),
            starttls: false,
            tls_verify: default_tls_verify(),
            tls_ca_cert: None,
            connection_timeout_secs: default_timeout_secs(),
            operation_timeout_secs: default_timeout_secs(),
        }
    }
}

/// Defaults for new accounts.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AccountSettings {
    /// Login shell for accounts created by `add-noname-user`
    #[validate(length(min = 1))]
    #[serde(default = "default_shell")]
    pub default_shell: String,

    /// Parent directory of generated home directories
    #[validate(length(min = 1))]
    #[serde(default = "default_home_prefix")]
    pub home_prefix: String,

    /// Group new club members are added to
    #[validate(length(min = 1))]
    #[serde(default = "default_member_group")]
    pub default_group: String,
}

fn default_shell() -> String {
    DEFAULT_SHELL.to_string()
}

fn default_home_prefix() -> String {
    DEFAULT_HOME_PREFIX.to_string()
}

fn default_member_group() -> String {
    DEFAULT_MEMBER_GROUP.to_string()
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            default_shell: default_shell(),
            home_prefix: default_home_prefix(),
            default_group: default_member_group(),
        }
    }
}

/// Settings for `--test` runs.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestModeSettings {
    /// LDIF file the in-memory directory is written to on exit
    #[serde(default = "default_dump_path")]
    pub dump_path: PathBuf,
}

fn default_dump_path() -> PathBuf {
    PathBuf::from(DEFAULT_TEST_DUMP_PATH)
}

impl Default for TestModeSettings {
    fn default() -> Self {
        Self {
            dump_path: default_dump_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;

    #[test]
    fn test_defaults_match_production_host() {
        let settings = Settings::default();
        assert_eq!(settings.ldap.socket_path, PathBuf::from("/var/run/slapd/ldapi"));
        assert_eq!(settings.ldap.base_dn, "dc=noname-ev,dc=de");
        assert!(settings.ldap.url.is_none());
        assert!(settings.ldap.tls_verify);
        assert_eq!(settings.accounts.default_shell, "/usr/bin/bash");
        assert_eq!(settings.accounts.default_group, "noname");
        assert_eq!(settings.test_mode.dump_path, PathBuf::from("/tmp/ldapDump.ldif"));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_empty_document_yields_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings.ldap.connection_timeout(), Duration::from_secs(10));
        assert_eq!(settings.accounts.home_prefix, "/home");
    }

    #[test]
    fn test_partial_document_overrides() {
        let settings = Settings::from_toml_str(
            r#"
            [ldap]
            url = "ldaps://ldap.example.org"
            bind_dn = "cn=admin,dc=example,dc=org"
            bind_password = "hunter2"
            operation_timeout_secs = 30

            [accounts]
            default_shell = "/bin/zsh"
            "#,
        )
        .unwrap();

        assert_eq!(settings.ldap.url.as_deref(), Some("ldaps://ldap.example.org"));
        assert_eq!(
            settings
                .ldap
                .bind_password
                .as_ref()
                .map(|p| p.expose_secret().to_string()),
            Some("hunter2".to_string())
        );
        assert_eq!(settings.ldap.operation_timeout(), Duration::from_secs(30));
        assert_eq!(settings.accounts.default_shell, "/bin/zsh");
        assert_eq!(settings.accounts.default_group, "noname");
    }

    #[test]
    fn test_timeout_out_of_range_is_rejected() {
        let err = Settings::from_toml_str("[ldap]\nconnection_timeout_secs = 0\n").unwrap_err();
        assert!(matches!(err, Error::ValidationError(_)));

        let err = Settings::from_toml_str("[ldap]\noperation_timeout_secs = 301\n").unwrap_err();
        assert!(matches!(err, Error::ValidationError(_)));
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let err = Settings::from_toml_str("[ldap]\nurl = \"not a url\"\n").unwrap_err();
        assert!(matches!(err, Error::ValidationError(_)));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = Settings::from_toml_str("[ldap]\nhost = \"x\"\n").unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[test_mode]\ndump_path = \"/tmp/other.ldif\"").unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.test_mode.dump_path, PathBuf::from("/tmp/other.ldif"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Settings::load(Some(Path::new("/nonexistent/num.toml"))).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_load_without_path() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.ldap.base_dn, DEFAULT_BASE_DN);
    }
}
