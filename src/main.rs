//! skm CLI application.
//!
//! This binary provides a command-line interface for storing several SSH key
//! pairs and switching the one linked into `~/.ssh`.

use clap::{Parser, Subcommand};
use colored::Colorize;
use skm::backup::{backup_store, restore_store};
use skm::config::Config;
use skm::error::{Result, SkmError};
use skm::storage::keypair::ActiveStatus;
use skm::storage::keystore::{
    create_key, delete_key, init_store, list_keys, read_public_key, rename_key, use_key,
    DeleteOutcome, KeyStore, KeygenOptions,
};
use skm::ui::{self, Prompter};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "skm")]
#[command(about = "Manage your multiple SSH keys easily", long_about = None)]
#[command(version, arg_required_else_help = true)]
struct Cli {
    /// Key store directory (default: ~/.skm)
    #[arg(long, global = true, env = "SKM_STORE_PATH")]
    store: Option<PathBuf>,

    /// SSH directory holding the default identity (default: ~/.ssh)
    #[arg(long, global = true, env = "SKM_SSH_PATH")]
    ssh_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the key store and adopt existing default keys
    Init,

    /// Generate a new SSH key pair with ssh-keygen
    Create {
        /// Alias name for the key
        alias: String,

        /// Key type passed to ssh-keygen
        #[arg(short = 't', long = "type", default_value = "rsa")]
        key_type: String,

        /// Key size in bits
        #[arg(short, long)]
        bits: Option<u32>,

        /// Key comment, usually an email address
        #[arg(short = 'C', long)]
        comment: Option<String>,
    },

    /// List all stored SSH keys
    #[command(visible_alias = "list")]
    Ls {
        /// Print the keys as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set the given key as the default SSH key
    Use {
        /// Alias of the key to activate
        alias: String,
    },

    /// Delete a stored SSH key
    #[command(visible_alias = "rm")]
    Delete {
        /// Alias of the key to delete
        alias: String,
    },

    /// Rename a stored SSH key
    #[command(visible_alias = "mv")]
    Rename {
        /// Current alias
        old: String,

        /// New alias
        new: String,
    },

    /// Print a public key (the active one by default)
    Display {
        /// Alias of the key to display
        alias: Option<String>,
    },

    /// Archive the key store with tar
    Backup {
        /// Directory receiving the archive (default: ~)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Restore the key store from a backup archive
    Restore {
        /// Archive created by `skm backup`
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::failure(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "skm=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::resolve(cli.store, cli.ssh_dir)?;
    let store = KeyStore::open(config)?;

    match cli.command {
        Commands::Init => {
            let adopted = init_store(&store)?;
            ui::success(&format!(
                "SSH key store initialized at {}",
                store.config().store_path.display()
            ));
            if let Some(key) = adopted {
                ui::success(&format!(
                    "Existing SSH key moved to [{}] and set as default",
                    key.alias
                ));
            }
            Ok(())
        }

        Commands::Create {
            alias,
            key_type,
            bits,
            comment,
        } => {
            let options = KeygenOptions {
                key_type,
                bits,
                comment,
            };
            create_key(&store, &alias, &options)?;
            ui::success(&format!("SSH key [{}] created!", alias));
            Ok(())
        }

        Commands::Ls { json } => {
            let keys = list_keys(&store);

            if json {
                println!("{}", serde_json::to_string_pretty(&keys)?);
                return Ok(());
            }

            if keys.is_empty() {
                println!("No SSH keys found in {}", store.config().store_path.display());
                return Ok(());
            }

            for key in keys {
                match key.status {
                    ActiveStatus::Active => println!("{}", format!("-> {}", key.alias).green()),
                    ActiveStatus::Inactive => println!("   {}", key.alias),
                    ActiveStatus::Unknown => println!("{}", format!("?  {}", key.alias).yellow()),
                }
            }
            Ok(())
        }

        Commands::Use { alias } => {
            use_key(&store, &alias)?;
            ui::success(&format!("Now using SSH key: [{}]", alias));
            Ok(())
        }

        Commands::Delete { alias } => {
            let mut prompter = Prompter::stdio();
            match delete_key(&store, &alias, &mut prompter) {
                Ok(DeleteOutcome::Deleted { .. }) => {
                    ui::success(&format!("SSH key [{}] deleted!", alias));
                    Ok(())
                }
                Ok(DeleteOutcome::Declined) => Ok(()),
                Err(SkmError::StorageError(e)) => Err(SkmError::StorageError(std::io::Error::new(
                    e.kind(),
                    format!("Failed to delete SSH key [{}]: {}", alias, e),
                ))),
                Err(e) => Err(e),
            }
        }

        Commands::Rename { old, new } => {
            rename_key(&store, &old, &new)?;
            ui::success(&format!("SSH key [{}] renamed to [{}]", old, new));
            Ok(())
        }

        Commands::Display { alias } => {
            let public_key = read_public_key(&store, alias.as_deref())?;
            print!("{}", public_key);
            Ok(())
        }

        Commands::Backup { output } => {
            let output_dir = match output {
                Some(dir) => dir,
                None => std::env::var_os("HOME").map(PathBuf::from).ok_or_else(|| {
                    SkmError::ConfigError("HOME is not set; pass --output".to_string())
                })?,
            };
            let archive = backup_store(store.config(), &output_dir)?;
            ui::success(&format!("SSH keys backed up to {}", archive.display()));
            Ok(())
        }

        Commands::Restore { file } => {
            restore_store(store.config(), &file)?;
            ui::success(&format!("SSH keys restored from {}", file.display()));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_create() {
        let cli = Cli::try_parse_from([
            "skm", "create", "work", "-t", "ed25519", "-C", "me@example.com",
        ])
        .unwrap();

        match cli.command {
            Commands::Create {
                alias,
                key_type,
                bits,
                comment,
            } => {
                assert_eq!(alias, "work");
                assert_eq!(key_type, "ed25519");
                assert_eq!(bits, None);
                assert_eq!(comment.as_deref(), Some("me@example.com"));
            }
            _ => panic!("Expected create"),
        }
    }

    #[test]
    fn test_parse_global_paths() {
        let cli = Cli::try_parse_from(["skm", "use", "work", "--store", "/tmp/store"]).unwrap();

        assert_eq!(cli.store, Some(PathBuf::from("/tmp/store")));
        assert!(matches!(cli.command, Commands::Use { alias } if alias == "work"));
    }

    #[test]
    fn test_parse_aliases() {
        assert!(matches!(
            Cli::try_parse_from(["skm", "list"]).unwrap().command,
            Commands::Ls { json: false }
        ));
        assert!(matches!(
            Cli::try_parse_from(["skm", "rm", "work"]).unwrap().command,
            Commands::Delete { .. }
        ));
    }
}
