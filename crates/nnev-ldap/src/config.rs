//! Configuration types for directory client usage.

use crate::{dn::DistinguishedName, Result};
use nnev_core::config::{
    Settings, DEFAULT_HOME_PREFIX, DEFAULT_MEMBER_GROUP, DEFAULT_SHELL,
};
use nnev_core::Error;
use secrecy::{ExposeSecret, SecretString};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Default connection timeout (seconds).
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 10;
/// Default operation timeout (seconds).
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 10;

/// How the client authenticates after connecting.
#[derive(Debug)]
pub enum BindMethod {
    /// SASL EXTERNAL with an empty authorization id. Over `ldapi` the server derives the
    /// identity from the peer credentials of the socket.
    SaslExternal,
    /// Simple bind with a DN and password.
    Simple {
        /// Bind DN.
        dn: String,
        /// Bind password.
        password: SecretString,
    },
}

/// Builds an `ldapi://` URL for a Unix domain socket path.
#[must_use]
pub fn ldapi_url(socket_path: &Path) -> String {
    let path = socket_path.to_string_lossy();
    let encoded: String = url::form_urlencoded::byte_serialize(path.as_bytes()).collect();
    // byte_serialize turns spaces into `+`; a literal `+` is already `%2B`.
    format!("ldapi://{}", encoded.replace('+', "%20"))
}

/// Configuration for connecting to the directory and laying out new entries.
#[derive(Debug)]
pub struct DirectoryConfig {
    url: String,
    bind: BindMethod,
    base_dn: DistinguishedName,
    users_base_dn: DistinguishedName,
    groups_base_dn: DistinguishedName,
    next_uid_dn: DistinguishedName,
    next_gid_dn: DistinguishedName,
    default_shell: String,
    home_prefix: String,
    default_group: String,
    starttls: bool,
    tls_verify: bool,
    tls_ca_cert: Option<PathBuf>,
    connection_timeout_secs: u64,
    operation_timeout_secs: u64,
}

impl DirectoryConfig {
    /// Creates a configuration for `url` below `base_dn`, binding with SASL EXTERNAL.
    ///
    /// The users, groups and id counter locations are derived from the base:
    /// `ou=users`, `ou=groups`, and `cn=Next POSIX UID|GID,ou=administration`.
    ///
    /// # Errors
    ///
    /// Returns an error if the provided URL is invalid.
    pub fn new(url: impl Into<String>, base_dn: DistinguishedName) -> Result<Self> {
        let url_string = url.into();
        Url::parse(&url_string)?;

        let administration = DistinguishedName::child_of("ou", "administration", &base_dn);
        Ok(Self {
            url: url_string,
            bind: BindMethod::SaslExternal,
            users_base_dn: DistinguishedName::child_of("ou", "users", &base_dn),
            groups_base_dn: DistinguishedName::child_of("ou", "groups", &base_dn),
            next_uid_dn: DistinguishedName::child_of("cn", "Next POSIX UID", &administration),
            next_gid_dn: DistinguishedName::child_of("cn", "Next POSIX GID", &administration),
            base_dn,
            default_shell: DEFAULT_SHELL.to_string(),
            home_prefix: DEFAULT_HOME_PREFIX.to_string(),
            default_group: DEFAULT_MEMBER_GROUP.to_string(),
            starttls: false,
            tls_verify: true,
            tls_ca_cert: None,
            connection_timeout_secs: DEFAULT_CONNECTION_TIMEOUT_SECS,
            operation_timeout_secs: DEFAULT_OPERATION_TIMEOUT_SECS,
        })
    }

    /// Creates a configuration for the `ldapi` socket at `socket_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting URL is invalid.
    pub fn ldapi(socket_path: &Path, base_dn: DistinguishedName) -> Result<Self> {
        Self::new(ldapi_url(socket_path), base_dn)
    }

    /// Derives the runtime configuration from loaded settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] when the base DN or URL is malformed, or when a bind DN is
    /// given without a password.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let ldap = &settings.ldap;
        let base_dn = DistinguishedName::parse(&ldap.base_dn)
            .map_err(|e| Error::ConfigError(format!("invalid base_dn: {e}")))?;

        let mut config = match &ldap.url {
            Some(url) => Self::new(url.clone(), base_dn)?,
            None => Self::ldapi(&ldap.socket_path, base_dn)?,
        };

        if let Some(dn) = &ldap.bind_dn {
            let password = ldap.bind_password.as_ref().ok_or_else(|| {
                Error::ConfigError("bind_dn is set but bind_password is missing".to_string())
            })?;
            config = config.with_bind(BindMethod::Simple {
                dn: dn.clone(),
                password: SecretString::from(password.expose_secret().to_string()),
            });
        }

        config = config
            .with_starttls(ldap.starttls)
            .with_tls_verification(ldap.tls_verify)
            .with_connection_timeout_secs(ldap.connection_timeout_secs)
            .with_operation_timeout_secs(ldap.operation_timeout_secs)
            .with_default_shell(settings.accounts.default_shell.clone())
            .with_home_prefix(settings.accounts.home_prefix.clone())
            .with_default_group(settings.accounts.default_group.clone());
        if let Some(ca) = &ldap.tls_ca_cert {
            config = config.with_tls_ca_cert(ca.clone());
        }
        Ok(config)
    }

    /// Returns the server URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns true when the URL points at a Unix domain socket.
    #[must_use]
    pub fn is_ldapi(&self) -> bool {
        self.url.starts_with("ldapi://")
    }

    /// Returns the bind method.
    #[must_use]
    pub const fn bind(&self) -> &BindMethod {
        &self.bind
    }

    /// Returns the base distinguished name.
    #[must_use]
    pub const fn base_dn(&self) -> &DistinguishedName {
        &self.base_dn
    }

    /// Returns the base below which accounts live.
    #[must_use]
    pub const fn users_base_dn(&self) -> &DistinguishedName {
        &self.users_base_dn
    }

    /// Returns the base below which groups live.
    #[must_use]
    pub const fn groups_base_dn(&self) -> &DistinguishedName {
        &self.groups_base_dn
    }

    /// Returns the entry holding the next free `uidNumber`.
    #[must_use]
    pub const fn next_uid_dn(&self) -> &DistinguishedName {
        &self.next_uid_dn
    }

    /// Returns the entry holding the next free `gidNumber`.
    #[must_use]
    pub const fn next_gid_dn(&self) -> &DistinguishedName {
        &self.next_gid_dn
    }

    /// Login shell for new club members.
    #[must_use]
    pub fn default_shell(&self) -> &str {
        &self.default_shell
    }

    /// Group new club members join.
    #[must_use]
    pub fn default_group(&self) -> &str {
        &self.default_group
    }

    /// Home directory for `uid`.
    #[must_use]
    pub fn home_for(&self, uid: &str) -> String {
        format!("{}/{uid}", self.home_prefix.trim_end_matches('/'))
    }

    /// Returns whether StartTLS is requested.
    #[must_use]
    pub const fn starttls(&self) -> bool {
        self.starttls
    }

    /// Returns whether TLS certificate verification is enabled.
    #[must_use]
    pub const fn tls_verify(&self) -> bool {
        self.tls_verify
    }

    /// Optional custom CA certificate path.
    #[must_use]
    pub fn tls_ca_cert(&self) -> Option<&PathBuf> {
        self.tls_ca_cert.as_ref()
    }

    /// Returns the connection timeout duration.
    #[must_use]
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// Returns the operation timeout duration.
    #[must_use]
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    /// Overrides the bind method.
    #[must_use]
    pub fn with_bind(mut self, bind: BindMethod) -> Self {
        self.bind = bind;
        self
    }

    /// Overrides the accounts base.
    #[must_use]
    pub fn with_users_base_dn(mut self, dn: DistinguishedName) -> Self {
        self.users_base_dn = dn;
        self
    }

    /// Overrides the groups base.
    #[must_use]
    pub fn with_groups_base_dn(mut self, dn: DistinguishedName) -> Self {
        self.groups_base_dn = dn;
        self
    }

    /// Overrides the default login shell.
    #[must_use]
    pub fn with_default_shell(mut self, shell: impl Into<String>) -> Self {
        self.default_shell = shell.into();
        self
    }

    /// Overrides the home directory prefix.
    #[must_use]
    pub fn with_home_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.home_prefix = prefix.into();
        self
    }

    /// Overrides the group new members join.
    #[must_use]
    pub fn with_default_group(mut self, group: impl Into<String>) -> Self {
        self.default_group = group.into();
        self
    }

    /// Enables or disables StartTLS.
    #[must_use]
    pub const fn with_starttls(mut self, starttls: bool) -> Self {
        self.starttls = starttls;
        self
    }

    /// Enables or disables TLS certificate verification.
    #[must_use]
    pub const fn with_tls_verification(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Sets the custom CA certificate path for TLS verification.
    #[must_use]
    pub fn with_tls_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Overrides the connection timeout in seconds.
    #[must_use]
    pub const fn with_connection_timeout_secs(mut self, seconds: u64) -> Self {
        self.connection_timeout_secs = seconds;
        self
    }

    /// Overrides the operation timeout in seconds.
    #[must_use]
    pub const fn with_operation_timeout_secs(mut self, seconds: u64) -> Self {
        self.operation_timeout_secs = seconds;
        self
    }
}
