mod cli;
mod commands;
mod exitcode;
mod output;

use std::fs;
use std::path::Path;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use nnev_core::{Error, Settings};
use nnev_ldap::{DirectoryClient, DirectoryConfig, MemoryDirectory};
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::cli::Cli;
use crate::commands::execute_command;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let code = match run(&cli).await {
        Ok(()) => exitcode::OK,
        Err(err) => {
            let cause = err.chain().find_map(|c| c.downcast_ref::<Error>());
            if let Some(cause) = cause.filter(|c| c.should_log()) {
                error!(code = cause.error_code(), "{err:#}");
            }
            output::error(&format!("{err:#}"));
            exitcode::for_error(&err)
        }
    };
    process::exit(code);
}

async fn run(cli: &Cli) -> Result<()> {
    let settings =
        Settings::load(cli.config.as_deref()).context("failed to load configuration")?;
    let config = DirectoryConfig::from_settings(&settings)?;

    if !cli.test {
        let client = DirectoryClient::new(config);
        return execute_command(&client, &cli.command).await;
    }

    info!("test mode: using seeded in-memory directory");
    let directory = MemoryDirectory::seeded(&config)?;
    let client = DirectoryClient::with_connector(config, Box::new(directory.clone()));
    let result = execute_command(&client, &cli.command).await;

    // The dump is best effort; the command result decides the exit code.
    if let Err(err) = dump_directory(&directory, &settings.test_mode.dump_path) {
        warn!("{err:#}");
    }
    result
}

fn dump_directory(directory: &MemoryDirectory, path: &Path) -> Result<()> {
    let ldif = directory.export_ldif()?;
    fs::write(path, ldif)
        .map_err(Error::from)
        .with_context(|| format!("failed to write directory dump to {}", path.display()))?;
    info!(path = %path.display(), "wrote directory dump");
    Ok(())
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    // RUST_LOG wins over -v.
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .with_filter(filter);

    tracing_subscriber::registry().with(fmt_layer).init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Commands;
    use std::io::Write;

    fn cli_with_config(config: &Path, command: Commands) -> Cli {
        Cli {
            test: true,
            config: Some(config.to_path_buf()),
            verbose: 0,
            command,
        }
    }

    #[tokio::test]
    async fn test_mode_writes_dump() {
        let dir = tempfile::tempdir().unwrap();
        let dump = dir.path().join("dump.ldif");
        let config = dir.path().join("num.toml");
        let mut file = fs::File::create(&config).unwrap();
        writeln!(file, "[test_mode]\ndump_path = {:?}", dump.display().to_string()).unwrap();

        let cli = cli_with_config(
            &config,
            Commands::AddGroup {
                group: "makers".to_string(),
            },
        );
        run(&cli).await.unwrap();

        let ldif = fs::read_to_string(&dump).unwrap();
        assert!(ldif.contains("dn: cn=makers,ou=groups,dc=noname-ev,dc=de"));
        assert!(ldif.contains("dn: uid=user1,ou=users,dc=noname-ev,dc=de"));
    }

    #[tokio::test]
    async fn failed_command_still_dumps_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let dump = dir.path().join("dump.ldif");
        let config = dir.path().join("num.toml");
        fs::write(
            &config,
            format!("[test_mode]\ndump_path = {:?}\n", dump.display().to_string()),
        )
        .unwrap();

        let cli = cli_with_config(
            &config,
            Commands::AddUserToGroup {
                username: "user4".to_string(),
                group: "group1".to_string(),
            },
        );
        let err = run(&cli).await.unwrap_err();
        assert_eq!(exitcode::for_error(&err), exitcode::FAILURE);
        assert!(dump.exists());
    }

    #[tokio::test]
    async fn bad_configuration_maps_to_config_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("num.toml");
        fs::write(&config, "[ldap]\nbase_dn = \"\"\n").unwrap();

        let cli = cli_with_config(
            &config,
            Commands::GetSshKeys {
                username: "user1".to_string(),
            },
        );
        let err = run(&cli).await.unwrap_err();
        assert_eq!(exitcode::for_error(&err), exitcode::CONFIG);
    }
}
