//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Manage noname e.V. member accounts, groups and SSH keys in LDAP
#[derive(Parser, Debug)]
#[command(name = "num")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Run against a seeded in-memory directory and dump it afterwards
    #[arg(short, long, global = true)]
    pub test: bool,

    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "NUM_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create a member account with a personal group and add it to the member group
    #[command(alias = "addNonameUser")]
    AddNonameUser {
        /// Login name
        username: String,
        /// Real name
        realname: String,
    },

    /// Create an account whose primary group already exists
    #[command(alias = "addUser")]
    AddUser {
        /// Login name
        username: String,
        /// Real name
        realname: String,
        /// Existing primary group
        group: String,
        /// Login shell (default: configured default shell)
        #[arg(long)]
        shell: Option<String>,
        /// Home directory (default: <home_prefix>/<username>)
        #[arg(long, value_hint = ValueHint::DirPath)]
        home: Option<String>,
    },

    /// Create a POSIX group
    #[command(alias = "addGroup")]
    AddGroup {
        /// Group name
        group: String,
    },

    /// Add a user to a group
    #[command(alias = "addUserToGroup")]
    AddUserToGroup {
        /// Login name
        username: String,
        /// Group name
        group: String,
    },

    /// Remove a user from a group
    #[command(alias = "removeUserFromGroup")]
    RemoveUserFromGroup {
        /// Login name
        username: String,
        /// Group name
        group: String,
    },

    /// Add every public key in a file to a user
    #[command(alias = "addSshKey")]
    AddSshKey {
        /// Login name
        username: String,
        /// File with one public key per line
        #[arg(value_name = "FILE_TO_PUBLIC_KEY", value_hint = ValueHint::FilePath)]
        key_file: PathBuf,
    },

    /// Remove every public key in a file from a user
    #[command(alias = "removeSshKey")]
    RemoveSshKey {
        /// Login name
        username: String,
        /// File with one public key per line
        #[arg(value_name = "FILE_TO_PUBLIC_KEY", value_hint = ValueHint::FilePath)]
        key_file: PathBuf,
    },

    /// List the public keys of a user
    #[command(alias = "getSshKeys")]
    GetSshKeys {
        /// Login name
        username: String,
    },

    /// Show an account and its group memberships
    ShowUser {
        /// Login name
        username: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}
