//! Command execution against a [`DirectoryClient`].

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use nnev_core::Error;
use nnev_ldap::DirectoryClient;
use serde_json::json;
use tracing::debug;

use crate::cli::Commands;
use crate::output;

/// Runs one subcommand.
pub async fn execute_command(client: &DirectoryClient, command: &Commands) -> Result<()> {
    debug!(?command, "executing");
    match command {
        Commands::AddNonameUser { username, realname } => {
            add_noname_user(client, username, realname).await
        }
        Commands::AddUser {
            username,
            realname,
            group,
            shell,
            home,
        } => {
            let config = client.config();
            let shell = shell.as_deref().unwrap_or_else(|| config.default_shell());
            let home = home.clone().unwrap_or_else(|| config.home_for(username));
            let uid_number = client
                .add_user(username, realname, group, shell, &home)
                .await?;
            output::success(&format!(
                "User {username} created in group {group} with uidNumber {uid_number}!"
            ));
            Ok(())
        }
        Commands::AddGroup { group } => {
            let gid_number = client.add_group(group).await?;
            output::success(&format!("Group {group} created with gidNumber {gid_number}!"));
            Ok(())
        }
        Commands::AddUserToGroup { username, group } => {
            if client.add_user_to_group(username, group).await? {
                output::success(&format!("User {username} added to group {group}!"));
            } else {
                output::notice(&format!("User {username} already is a member of {group}."));
            }
            Ok(())
        }
        Commands::RemoveUserFromGroup { username, group } => {
            if client.remove_user_from_group(username, group).await? {
                output::success(&format!("User {username} removed from group {group}!"));
            } else {
                output::notice(&format!("User {username} was not a member of {group}."));
            }
            Ok(())
        }
        Commands::AddSshKey { username, key_file } => {
            for key in read_keys(key_file)? {
                if client.add_ssh_key(username, &key).await? {
                    output::success_with(
                        &format!("Key added successfully to user {username}:"),
                        &key,
                    );
                } else {
                    output::notice_with(&format!("Key already present for user {username}:"), &key);
                }
            }
            Ok(())
        }
        Commands::RemoveSshKey { username, key_file } => {
            for key in read_keys(key_file)? {
                if client.remove_ssh_key(username, &key).await? {
                    output::success_with(
                        &format!("Key removed successfully from user {username}:"),
                        &key,
                    );
                } else {
                    output::notice_with(&format!("Key not present for user {username}:"), &key);
                }
            }
            Ok(())
        }
        Commands::GetSshKeys { username } => {
            let keys = client.ssh_keys(username).await?;
            if keys.is_empty() {
                output::notice(&format!("No keys found for user {username}!"));
            } else {
                output::success(&format!(
                    "Found the following {} keys for user {username}:",
                    keys.len()
                ));
                for key in &keys {
                    output::info(key);
                }
            }
            Ok(())
        }
        Commands::ShowUser { username, json } => show_user(client, username, *json).await,
    }
}

async fn add_noname_user(client: &DirectoryClient, username: &str, realname: &str) -> Result<()> {
    let config = client.config();
    let group = config.default_group();
    client
        .add_user_with_user_group(username, realname, config.default_shell())
        .await?;
    client
        .add_user_to_group(username, group)
        .await
        .with_context(|| format!("account {username} was created but not added to {group}"))?;

    output::success(&format!(
        "User successfully created with user group and added to the {group} group!"
    ));
    Ok(())
}

async fn show_user(client: &DirectoryClient, username: &str, as_json: bool) -> Result<()> {
    let account = client.user(username).await?;
    let groups = client
        .groups_of(username)
        .await?
        .into_iter()
        .map(|group| group.name)
        .collect::<Vec<_>>();

    if as_json {
        let document = json!({ "account": account, "groups": groups });
        output::info(&serde_json::to_string_pretty(&document).map_err(Error::from)?);
        return Ok(());
    }

    output::header(&account.uid);
    output::field("dn", &account.dn);
    output::field("name", &account.real_name);
    output::field("uidNumber", &account.uid_number);
    output::field("gidNumber", &account.gid_number);
    output::field("shell", &account.login_shell);
    output::field("home", &account.home_directory);
    output::field("groups", &groups.join(", "));
    output::field("ssh keys", &account.ssh_public_keys.len());
    Ok(())
}

/// Reads one public key per non-empty line.
fn read_keys(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .map_err(Error::from)
        .with_context(|| format!("failed to read key file {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nnev_ldap::{DirectoryConfig, DistinguishedName, MemoryDirectory};
    use std::io::Write;
    use std::path::PathBuf;

    fn test_client() -> DirectoryClient {
        let base_dn = DistinguishedName::parse("dc=noname-ev,dc=de").unwrap();
        let config = DirectoryConfig::ldapi(Path::new("/var/run/slapd/ldapi"), base_dn).unwrap();
        let directory = MemoryDirectory::seeded(&config).unwrap();
        DirectoryClient::with_connector(config, Box::new(directory))
    }

    fn key_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn key_files_skip_blank_lines() {
        let file = key_file("ssh-ed25519 AAAA one@host\r\n\n   \nssh-rsa BBBB two@host");
        let keys = read_keys(file.path()).unwrap();
        assert_eq!(keys, ["ssh-ed25519 AAAA one@host", "ssh-rsa BBBB two@host"]);
    }

    #[test]
    fn unreadable_key_file_is_io_error() {
        let err = read_keys(Path::new("/nonexistent/id.pub")).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Io(_))));
        assert!(err.to_string().contains("/nonexistent/id.pub"));
    }

    #[tokio::test]
    async fn add_noname_user_creates_member() {
        let client = test_client();
        let command = Commands::AddNonameUser {
            username: "newbie".to_string(),
            realname: "New Member".to_string(),
        };
        execute_command(&client, &command).await.unwrap();

        let account = client.user("newbie").await.unwrap();
        assert_eq!(account.login_shell, "/usr/bin/bash");
        let groups = client.groups_of("newbie").await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "noname");
        assert!(client.group_exists("newbie").await.unwrap());
    }

    #[tokio::test]
    async fn add_noname_user_rejects_taken_name() {
        let client = test_client();
        let command = Commands::AddNonameUser {
            username: "user1".to_string(),
            realname: "Again".to_string(),
        };
        let err = execute_command(&client, &command).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<Error>(),
            Some(&Error::Conflict("Already in use as user name".to_string()))
        );
    }

    #[tokio::test]
    async fn ssh_keys_from_file() {
        let client = test_client();
        let file = key_file("ssh-ed25519 AAAA one@host\nssh-ed25519 BBBB two@host\n");
        let key_file = PathBuf::from(file.path());

        let add = Commands::AddSshKey {
            username: "user3".to_string(),
            key_file: key_file.clone(),
        };
        execute_command(&client, &add).await.unwrap();
        execute_command(&client, &add).await.unwrap();
        assert_eq!(client.ssh_keys("user3").await.unwrap().len(), 2);

        let remove = Commands::RemoveSshKey {
            username: "user3".to_string(),
            key_file,
        };
        execute_command(&client, &remove).await.unwrap();
        assert!(client.ssh_keys("user3").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_user_uses_configured_defaults() {
        let client = test_client();
        let command = Commands::AddUser {
            username: "guest".to_string(),
            realname: "Guest".to_string(),
            group: "group2".to_string(),
            shell: None,
            home: None,
        };
        execute_command(&client, &command).await.unwrap();

        let guest = client.user("guest").await.unwrap();
        assert_eq!(guest.gid_number, 1002);
        assert_eq!(guest.login_shell, "/usr/bin/bash");
        assert_eq!(guest.home_directory, "/home/guest");
    }

    #[tokio::test]
    async fn membership_commands() {
        let client = test_client();
        let add = Commands::AddUserToGroup {
            username: "user3".to_string(),
            group: "group2".to_string(),
        };
        execute_command(&client, &add).await.unwrap();
        assert!(client.group("group2").await.unwrap().member_count() == 2);

        let remove = Commands::RemoveUserFromGroup {
            username: "user3".to_string(),
            group: "group2".to_string(),
        };
        execute_command(&client, &remove).await.unwrap();
        execute_command(&client, &remove).await.unwrap();
        assert_eq!(client.group("group2").await.unwrap().member_count(), 1);
    }

    #[tokio::test]
    async fn lookups_of_unknown_users_fail() {
        let client = test_client();
        for command in [
            Commands::GetSshKeys {
                username: "ghost".to_string(),
            },
            Commands::ShowUser {
                username: "ghost".to_string(),
                json: true,
            },
        ] {
            let err = execute_command(&client, &command).await.unwrap_err();
            assert_eq!(
                err.downcast_ref::<Error>(),
                Some(&Error::NotFound("User not found".to_string()))
            );
        }
    }

    #[tokio::test]
    async fn show_user_prints_existing_account() {
        let client = test_client();
        for json in [false, true] {
            let command = Commands::ShowUser {
                username: "user1".to_string(),
                json,
            };
            execute_command(&client, &command).await.unwrap();
        }
    }
}
