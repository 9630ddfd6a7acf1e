//! Directory client: POSIX account, group and SSH key management over LDAP.

use crate::{
    config::{BindMethod, DirectoryConfig},
    dn::DistinguishedName,
    entry::{DirectoryModification, LdapEntry, SearchScope},
    filter::Filter,
    group::{PosixGroup, GROUP_ATTRIBUTES},
    posix::{check_group_name, check_user_name},
    user::{PosixAccount, ACCOUNT_ATTRIBUTES},
    Result,
};
use async_trait::async_trait;
use ldap3::{LdapConnAsync, LdapConnSettings, Mod};
use native_tls::{Certificate, TlsConnector};
use nnev_core::Error;
use secrecy::ExposeSecret;
use std::collections::HashSet;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};

/// One authenticated conversation with a directory server.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LdapSession: Send {
    /// Binds with SASL EXTERNAL and an empty authorization id.
    async fn sasl_external_bind(&mut self) -> Result<()>;
    /// Binds with a DN and password.
    async fn simple_bind(&mut self, dn: &str, password: &str) -> Result<()>;
    /// Searches below `base_dn`. An empty attribute list requests all user attributes.
    async fn search(
        &mut self,
        base_dn: &str,
        scope: SearchScope,
        filter: &Filter,
        attributes: &[&'static str],
    ) -> Result<Vec<LdapEntry>>;
    /// Adds a new entry.
    async fn add(&mut self, entry: &LdapEntry) -> Result<()>;
    /// Applies all modifications to `dn` atomically.
    async fn modify(&mut self, dn: &str, modifications: &[DirectoryModification]) -> Result<()>;
    /// Ends the session.
    async fn unbind(&mut self) -> Result<()>;
}

/// Opens sessions against a directory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LdapConnector: Send + Sync {
    /// Opens an unauthenticated session.
    async fn connect(&self) -> Result<Box<dyn LdapSession>>;
}

/// Manages POSIX accounts and groups through a pluggable LDAP backend.
///
/// Each public operation opens its own session, binds, runs every directory call it needs on
/// that session, and unbinds again.
pub struct DirectoryClient {
    config: Arc<DirectoryConfig>,
    connector: Box<dyn LdapConnector>,
}

impl DirectoryClient {
    /// Creates a client that talks to the configured server through `ldap3`.
    #[must_use]
    pub fn new(config: DirectoryConfig) -> Self {
        let config = Arc::new(config);
        let connector: Box<dyn LdapConnector> = Box::new(RealLdapConnector::new(config.clone()));
        Self { config, connector }
    }

    /// Creates a client over a custom connector, such as the in-memory directory.
    #[must_use]
    pub fn with_connector(config: DirectoryConfig, connector: Box<dyn LdapConnector>) -> Self {
        Self {
            config: Arc::new(config),
            connector,
        }
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    /// Hands out the next free `uidNumber` and advances the counter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] if another writer advanced the counter concurrently.
    pub async fn next_uid_number(&self) -> Result<u32> {
        let mut session = self.session().await?;
        let result = self
            .allocate_id(&mut *session, self.config.next_uid_dn(), "uidNumber")
            .await;
        finish(session, result).await
    }

    /// Hands out the next free `gidNumber` and advances the counter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] if another writer advanced the counter concurrently.
    pub async fn next_gid_number(&self) -> Result<u32> {
        let mut session = self.session().await?;
        let result = self
            .allocate_id(&mut *session, self.config.next_gid_dn(), "gidNumber")
            .await;
        finish(session, result).await
    }

    /// Returns true if an account named `uid` exists.
    pub async fn user_exists(&self, uid: &str) -> Result<bool> {
        let mut session = self.session().await?;
        let result = self.find_users(&mut *session, uid).await;
        finish(session, result).await.map(|found| !found.is_empty())
    }

    /// Returns true if a group named `name` exists.
    pub async fn group_exists(&self, name: &str) -> Result<bool> {
        let mut session = self.session().await?;
        let result = self.find_groups(&mut *session, name).await;
        finish(session, result).await.map(|found| !found.is_empty())
    }

    /// Fetches the raw entry of account `uid`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no account matches and [`Error::Conflict`] if several do.
    pub async fn user_entry(&self, uid: &str) -> Result<LdapEntry> {
        let mut session = self.session().await?;
        let result = self.user_entry_in(&mut *session, uid).await;
        finish(session, result).await
    }

    /// Fetches the raw entry of group `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no group matches and [`Error::Conflict`] if several do.
    pub async fn group_entry(&self, name: &str) -> Result<LdapEntry> {
        let mut session = self.session().await?;
        let result = self.group_entry_in(&mut *session, name).await;
        finish(session, result).await
    }

    /// Fetches account `uid`.
    pub async fn user(&self, uid: &str) -> Result<PosixAccount> {
        PosixAccount::from_entry(&self.user_entry(uid).await?)
    }

    /// Fetches group `name`.
    pub async fn group(&self, name: &str) -> Result<PosixGroup> {
        PosixGroup::from_entry(&self.group_entry(name).await?)
    }

    /// Returns the `gidNumber` of group `name`.
    pub async fn gid_number(&self, name: &str) -> Result<u32> {
        self.group_entry(name).await?.u32_value("gidNumber")
    }

    /// Returns the SSH public keys stored for `uid`.
    pub async fn ssh_keys(&self, uid: &str) -> Result<Vec<String>> {
        let entry = self.user_entry(uid).await?;
        Ok(entry
            .values("sshPublicKey")
            .map(<[String]>::to_vec)
            .unwrap_or_default())
    }

    /// Lists the groups that have `uid` as a member.
    pub async fn groups_of(&self, uid: &str) -> Result<Vec<PosixGroup>> {
        let mut session = self.session().await?;
        let result = self.groups_of_in(&mut *session, uid).await;
        finish(session, result).await
    }

    /// Creates a POSIX group and returns its `gidNumber`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] for an invalid name and [`Error::Conflict`] if the name
    /// is already taken.
    pub async fn add_group(&self, name: &str) -> Result<u32> {
        check_group_name(name)?;
        let mut session = self.session().await?;
        let result = self.create_group(&mut *session, name).await;
        finish(session, result).await
    }

    /// Creates an account whose primary group is the existing group `group`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the group does not exist, plus the errors of
    /// [`DirectoryClient::add_user_with_gid_number`].
    pub async fn add_user(
        &self,
        uid: &str,
        real_name: &str,
        group: &str,
        shell: &str,
        home: &str,
    ) -> Result<u32> {
        check_user_name(uid)?;
        let mut session = self.session().await?;
        let result = async {
            let gid_number = self
                .group_entry_in(&mut *session, group)
                .await?
                .u32_value("gidNumber")?;
            self.create_user(&mut *session, uid, real_name, gid_number, shell, home)
                .await
        }
        .await;
        finish(session, result).await
    }

    /// Creates an account with an explicit primary `gidNumber` and returns its `uidNumber`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] for an invalid name and [`Error::Conflict`] if the name
    /// is already taken.
    pub async fn add_user_with_gid_number(
        &self,
        uid: &str,
        real_name: &str,
        gid_number: u32,
        shell: &str,
        home: &str,
    ) -> Result<u32> {
        check_user_name(uid)?;
        let mut session = self.session().await?;
        let result = self
            .create_user(&mut *session, uid, real_name, gid_number, shell, home)
            .await;
        finish(session, result).await
    }

    /// Creates a personal group named `uid` and an account using it as primary group.
    ///
    /// The account name is checked before the group is created. Home is `<home_prefix>/<uid>`.
    pub async fn add_user_with_user_group(
        &self,
        uid: &str,
        real_name: &str,
        shell: &str,
    ) -> Result<u32> {
        check_user_name(uid)?;
        let home = self.config.home_for(uid);
        let mut session = self.session().await?;
        let result = async {
            self.ensure_user_free(&mut *session, uid).await?;
            let gid_number = self.create_group(&mut *session, uid).await?;
            self.create_user(&mut *session, uid, real_name, gid_number, shell, &home)
                .await
        }
        .await;
        finish(session, result).await
    }

    /// Adds account `uid` to the members of `group`. Returns false if it already was one.
    pub async fn add_user_to_group(&self, uid: &str, group: &str) -> Result<bool> {
        self.update_membership(uid, group, true).await
    }

    /// Removes account `uid` from the members of `group`. Returns false if it was not one.
    pub async fn remove_user_from_group(&self, uid: &str, group: &str) -> Result<bool> {
        self.update_membership(uid, group, false).await
    }

    /// Adds an SSH public key to `uid`. Returns false if the key was already present.
    pub async fn add_ssh_key(&self, uid: &str, key: &str) -> Result<bool> {
        self.update_ssh_key(uid, key, true).await
    }

    /// Removes an SSH public key from `uid`. Returns false if the key was not present.
    pub async fn remove_ssh_key(&self, uid: &str, key: &str) -> Result<bool> {
        self.update_ssh_key(uid, key, false).await
    }

    async fn update_membership(&self, uid: &str, group: &str, add: bool) -> Result<bool> {
        let mut session = self.session().await?;
        let result = async {
            let user = self.user_entry_in(&mut *session, uid).await?;
            let before = self.group_entry_in(&mut *session, group).await?;
            let user_dn = user.distinguished_name()?;
            let stored = member_values(&before, &user_dn);
            let mut after = before.clone();
            if add {
                if stored.is_empty() {
                    after.add_value("member", user.dn.as_str());
                }
            } else {
                for value in &stored {
                    after.remove_value("member", value);
                }
            }
            let changed = apply_diff(&mut *session, &before, &after).await?;
            if changed {
                info!(uid, group, add, "updated group membership");
            }
            Ok(changed)
        }
        .await;
        finish(session, result).await
    }

    async fn update_ssh_key(&self, uid: &str, key: &str, add: bool) -> Result<bool> {
        let mut session = self.session().await?;
        let result = async {
            let before = self.user_entry_in(&mut *session, uid).await?;
            let mut after = before.clone();
            if add {
                after.add_value("sshPublicKey", key);
            } else {
                after.remove_value("sshPublicKey", key);
            }
            let changed = apply_diff(&mut *session, &before, &after).await?;
            if changed {
                info!(uid, add, "updated ssh public keys");
            }
            Ok(changed)
        }
        .await;
        finish(session, result).await
    }

    async fn session(&self) -> Result<Box<dyn LdapSession>> {
        debug!(url = self.config.url(), "opening directory session");
        let mut session = self
            .execute_with_timeout(self.config.connection_timeout(), self.connector.connect())
            .await?;
        let bound = match self.config.bind() {
            BindMethod::SaslExternal => {
                self.execute_with_timeout(
                    self.config.operation_timeout(),
                    session.sasl_external_bind(),
                )
                .await
            }
            BindMethod::Simple { dn, password } => {
                self.execute_with_timeout(
                    self.config.operation_timeout(),
                    session.simple_bind(dn, password.expose_secret()),
                )
                .await
            }
        };
        bound?;
        Ok(session)
    }

    async fn execute_with_timeout<F, T>(&self, limit: Duration, fut: F) -> Result<T>
    where
        F: std::future::Future<Output = Result<T>>,
    {
        timeout(limit, fut)
            .await
            .map_err(|_| Error::Timeout("LDAP operation timed out".to_string()))?
    }

    async fn allocate_id(
        &self,
        session: &mut dyn LdapSession,
        counter_dn: &DistinguishedName,
        attribute: &'static str,
    ) -> Result<u32> {
        let counter = read_entry(session, counter_dn.as_str(), &[attribute]).await?;
        let next = counter.u32_value(attribute)?;
        let bumped = next
            .checked_add(1)
            .ok_or_else(|| Error::Conflict(format!("{attribute} counter is exhausted")))?;

        // Deleting the old value by value fails if someone else bumped the counter meanwhile.
        session
            .modify(
                counter_dn.as_str(),
                &[
                    DirectoryModification::Delete {
                        attribute: attribute.to_string(),
                        values: vec![next.to_string()],
                    },
                    DirectoryModification::Add {
                        attribute: attribute.to_string(),
                        values: vec![bumped.to_string()],
                    },
                ],
            )
            .await?;
        debug!(attribute, allocated = next, "advanced id counter");
        Ok(next)
    }

    async fn find_users(&self, session: &mut dyn LdapSession, uid: &str) -> Result<Vec<LdapEntry>> {
        session
            .search(
                self.config.users_base_dn().as_str(),
                SearchScope::Subtree,
                &user_filter(uid),
                ACCOUNT_ATTRIBUTES,
            )
            .await
    }

    async fn find_groups(
        &self,
        session: &mut dyn LdapSession,
        name: &str,
    ) -> Result<Vec<LdapEntry>> {
        session
            .search(
                self.config.groups_base_dn().as_str(),
                SearchScope::Subtree,
                &group_filter(name),
                GROUP_ATTRIBUTES,
            )
            .await
    }

    async fn user_entry_in(&self, session: &mut dyn LdapSession, uid: &str) -> Result<LdapEntry> {
        let found = self.find_users(session, uid).await?;
        exactly_one(found, "User")
    }

    async fn group_entry_in(
        &self,
        session: &mut dyn LdapSession,
        name: &str,
    ) -> Result<LdapEntry> {
        let found = self.find_groups(session, name).await?;
        exactly_one(found, "Group")
    }

    async fn groups_of_in(
        &self,
        session: &mut dyn LdapSession,
        uid: &str,
    ) -> Result<Vec<PosixGroup>> {
        let user = self.user_entry_in(session, uid).await?;
        let filter = Filter::and([
            Filter::equality("objectClass", "posixGroup"),
            Filter::equality("member", user.dn.as_str()),
        ]);
        session
            .search(
                self.config.groups_base_dn().as_str(),
                SearchScope::Subtree,
                &filter,
                GROUP_ATTRIBUTES,
            )
            .await?
            .iter()
            .map(PosixGroup::from_entry)
            .collect()
    }

    async fn ensure_user_free(&self, session: &mut dyn LdapSession, uid: &str) -> Result<()> {
        if self.find_users(session, uid).await?.is_empty() {
            Ok(())
        } else {
            Err(Error::Conflict("Already in use as user name".to_string()))
        }
    }

    async fn ensure_group_free(&self, session: &mut dyn LdapSession, name: &str) -> Result<()> {
        if self.find_groups(session, name).await?.is_empty() {
            Ok(())
        } else {
            Err(Error::Conflict("Already in use as group name".to_string()))
        }
    }

    async fn create_group(&self, session: &mut dyn LdapSession, name: &str) -> Result<u32> {
        check_group_name(name)?;
        self.ensure_group_free(session, name).await?;

        let gid_number = self
            .allocate_id(session, self.config.next_gid_dn(), "gidNumber")
            .await?;
        let dn = DistinguishedName::child_of("cn", name, self.config.groups_base_dn());
        let group = PosixGroup::builder(dn, name, gid_number).build();
        session.add(&group.to_entry()).await?;

        info!(group = name, gid_number, "created group");
        Ok(gid_number)
    }

    async fn create_user(
        &self,
        session: &mut dyn LdapSession,
        uid: &str,
        real_name: &str,
        gid_number: u32,
        shell: &str,
        home: &str,
    ) -> Result<u32> {
        check_user_name(uid)?;
        self.ensure_user_free(session, uid).await?;

        let uid_number = self
            .allocate_id(session, self.config.next_uid_dn(), "uidNumber")
            .await?;
        let dn = DistinguishedName::child_of("uid", uid, self.config.users_base_dn());
        let account = PosixAccount::builder(dn, uid, uid_number, gid_number)
            .real_name(real_name)
            .login_shell(shell)
            .home_directory(home)
            .build();
        session.add(&account.to_entry()).await?;

        info!(uid, uid_number, gid_number, "created account");
        Ok(uid_number)
    }
}

fn user_filter(uid: &str) -> Filter {
    Filter::and([
        Filter::equality("objectClass", "account"),
        Filter::equality("objectClass", "posixAccount"),
        Filter::equality("uid", uid),
    ])
}

fn group_filter(name: &str) -> Filter {
    Filter::and([
        Filter::equality("objectClass", "groupOfEntries"),
        Filter::equality("objectClass", "posixGroup"),
        Filter::equality("cn", name),
    ])
}

fn exactly_one(mut found: Vec<LdapEntry>, kind: &str) -> Result<LdapEntry> {
    match found.len() {
        0 => Err(Error::NotFound(format!("{kind} not found"))),
        1 => Ok(found.remove(0)),
        _ => Err(Error::Conflict(format!("{kind} not unique"))),
    }
}

/// Stored `member` values naming `user`, in whatever spelling the directory holds them.
fn member_values(group: &LdapEntry, user: &DistinguishedName) -> Vec<String> {
    group
        .values("member")
        .unwrap_or_default()
        .iter()
        .filter(|value| {
            DistinguishedName::parse(value.as_str()).is_ok_and(|dn| dn.same_entry(user))
        })
        .cloned()
        .collect()
}

async fn read_entry(
    session: &mut dyn LdapSession,
    dn: &str,
    attributes: &[&'static str],
) -> Result<LdapEntry> {
    let found = session
        .search(dn, SearchScope::Base, &Filter::present("objectClass"), attributes)
        .await?;
    found
        .into_iter()
        .next()
        .ok_or_else(|| Error::NotFound(format!("{dn} does not exist")))
}

/// Sends the value-level difference between `before` and `after`, if any.
async fn apply_diff(
    session: &mut dyn LdapSession,
    before: &LdapEntry,
    after: &LdapEntry,
) -> Result<bool> {
    let mods = LdapEntry::diff(before, after);
    if mods.is_empty() {
        return Ok(false);
    }
    session.modify(&before.dn, &mods).await?;
    Ok(true)
}

/// Unbinds and hands back the operation result. An unbind failure only surfaces when the
/// operation itself succeeded.
async fn finish<T>(mut session: Box<dyn LdapSession>, result: Result<T>) -> Result<T> {
    let unbound = session.unbind().await;
    let value = result?;
    unbound?;
    Ok(value)
}

/// Real LDAP connector backed by `ldap3`.
pub struct RealLdapConnector {
    config: Arc<DirectoryConfig>,
}

impl RealLdapConnector {
    /// Creates a new connector instance.
    #[must_use]
    pub fn new(config: Arc<DirectoryConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl LdapConnector for RealLdapConnector {
    async fn connect(&self) -> Result<Box<dyn LdapSession>> {
        let settings = build_ldap_settings(&self.config)?;
        let (conn, ldap) = LdapConnAsync::with_settings(settings, self.config.url())
            .await
            .map_err(|err| {
                Error::ServiceUnavailable(format!("Unable to connect to ldap server: {err}"))
            })?;
        ldap3::drive!(conn);
        Ok(Box::new(RealLdapSession {
            inner: ldap,
            operation_timeout: self.config.operation_timeout(),
        }))
    }
}

struct RealLdapSession {
    inner: ldap3::Ldap,
    operation_timeout: Duration,
}

async fn timed<F, T>(limit: Duration, operation: &str, fut: F) -> Result<T>
where
    F: std::future::Future<Output = ldap3::result::Result<T>>,
{
    timeout(limit, fut)
        .await
        .map_err(|_| Error::Timeout(format!("LDAP {operation} timed out")))?
        .map_err(map_ldap_error)
}

#[async_trait]
impl LdapSession for RealLdapSession {
    async fn sasl_external_bind(&mut self) -> Result<()> {
        let result = timed(
            self.operation_timeout,
            "bind",
            self.inner.sasl_external_bind(),
        )
        .await?;
        ensure_ldap_success(result)
    }

    async fn simple_bind(&mut self, dn: &str, password: &str) -> Result<()> {
        let result = timed(
            self.operation_timeout,
            "bind",
            self.inner.simple_bind(dn, password),
        )
        .await?;
        ensure_ldap_success(result)
    }

    async fn search(
        &mut self,
        base_dn: &str,
        scope: SearchScope,
        filter: &Filter,
        attributes: &[&'static str],
    ) -> Result<Vec<LdapEntry>> {
        let filter = filter.to_string();
        debug!(base_dn, filter = %filter, "search");
        let result = timed(
            self.operation_timeout,
            "search",
            self.inner
                .search(base_dn, scope.into(), &filter, attributes.to_vec()),
        )
        .await?;
        let (entries, _) = result.success().map_err(map_ldap_error)?;
        Ok(entries
            .into_iter()
            .map(ldap3::SearchEntry::construct)
            .map(LdapEntry::from)
            .collect())
    }

    async fn add(&mut self, entry: &LdapEntry) -> Result<()> {
        debug!(dn = %entry.dn, "add");
        let attributes = entry
            .attributes
            .iter()
            .map(|attr| {
                (
                    attr.name.clone(),
                    attr.values.iter().cloned().collect::<HashSet<_>>(),
                )
            })
            .collect::<Vec<_>>();
        let result = timed(
            self.operation_timeout,
            "add",
            self.inner.add(&entry.dn, attributes),
        )
        .await?;
        ensure_ldap_success(result)
    }

    async fn modify(&mut self, dn: &str, modifications: &[DirectoryModification]) -> Result<()> {
        debug!(dn, count = modifications.len(), "modify");
        let mods = modifications
            .iter()
            .map(|m| match m {
                DirectoryModification::Add { attribute, values } => Mod::Add(
                    attribute.clone(),
                    values.iter().cloned().collect::<HashSet<_>>(),
                ),
                DirectoryModification::Delete { attribute, values } => Mod::Delete(
                    attribute.clone(),
                    values.iter().cloned().collect::<HashSet<_>>(),
                ),
                DirectoryModification::Replace { attribute, values } => Mod::Replace(
                    attribute.clone(),
                    values.iter().cloned().collect::<HashSet<_>>(),
                ),
            })
            .collect::<Vec<_>>();

        let result = timed(self.operation_timeout, "modify", self.inner.modify(dn, mods)).await?;
        ensure_ldap_success(result)
    }

    async fn unbind(&mut self) -> Result<()> {
        timed(self.operation_timeout, "unbind", self.inner.unbind()).await
    }
}

fn build_ldap_settings(config: &DirectoryConfig) -> Result<LdapConnSettings> {
    let mut settings = LdapConnSettings::new().set_conn_timeout(config.connection_timeout());
    if config.is_ldapi() {
        return Ok(settings);
    }

    settings = settings.set_starttls(config.starttls());
    if !config.tls_verify() {
        let connector = TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|err| {
                Error::ConfigError(format!("failed to construct TLS connector: {err}"))
            })?;
        settings = settings.set_connector(connector).set_no_tls_verify(true);
    } else if let Some(cert_path) = config.tls_ca_cert() {
        let pem = fs::read(cert_path).map_err(|err| {
            Error::ConfigError(format!(
                "failed to read LDAP CA certificate {}: {err}",
                cert_path.display()
            ))
        })?;
        let certificate = Certificate::from_pem(&pem)
            .map_err(|err| Error::ConfigError(format!("invalid LDAP CA certificate: {err}")))?;
        let connector = TlsConnector::builder()
            .add_root_certificate(certificate)
            .build()
            .map_err(|err| {
                Error::ConfigError(format!("failed to load LDAP CA certificate: {err}"))
            })?;
        settings = settings.set_connector(connector);
    }

    Ok(settings)
}

fn map_ldap_error(err: ldap3::LdapError) -> Error {
    match err {
        ldap3::LdapError::LdapResult { result } => result_code_error(result.rc, &result.text),
        other => Error::ldap(other.to_string()),
    }
}

fn ensure_ldap_success(result: ldap3::LdapResult) -> Result<()> {
    result.success().map(|_| ()).map_err(map_ldap_error)
}

/// Maps an LDAP result code (RFC 4511) onto the shared error type.
pub(crate) fn result_code_error(rc: u32, text: &str) -> Error {
    let detail = if text.is_empty() {
        format!("result code {rc}")
    } else {
        format!("result code {rc}: {text}")
    };
    match rc {
        32 => Error::NotFound(detail),
        16 | 20 | 68 => Error::Conflict(detail),
        49 | 50 => Error::InvalidRequest(detail),
        _ => Error::ldap(detail),
    }
}
