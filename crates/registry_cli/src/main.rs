//! Command-line probe for the voter registry store.
//!
//! # Responsibility
//! - Drive each repository port operation against a SQLite store.
//! - Keep output deterministic for scripted checks.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use registry_core::{
    default_log_level, init_logging, LogOutput, RegistryRepositoryPort, SqliteRegistryStore,
    StoreConfig,
};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "registry_cli", version, about = "Voter registry store probe")]
struct Cli {
    /// Store address: a file path, `sqlite://path` or a `file:` URI.
    #[arg(long, env = "REGISTRY_DB_URL")]
    db: String,

    #[arg(long, requires = "password")]
    user: Option<String>,

    #[arg(long, requires = "user")]
    password: Option<String>,

    #[arg(long)]
    log_level: Option<String>,

    /// Absolute directory for rotating log files; stderr when omitted.
    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the voters table if it does not exist.
    Init,
    /// Insert one voter; fails if the id is taken.
    Save {
        id: i32,
        name: String,
        age: i32,
        #[arg(action = clap::ArgAction::Set)]
        alive: bool,
    },
    /// Print `true` or `false`.
    Exists { id: i32 },
    /// Print the voter as JSON, or `absent`.
    Find { id: i32 },
    /// Remove every voter.
    DeleteAll,
}

fn main() {
    if let Err(err) = run(Cli::parse()) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    let output = cli.log_dir.map_or(LogOutput::Stderr, LogOutput::Directory);
    init_logging(level, output).map_err(anyhow::Error::msg)?;

    let config = match (cli.user, cli.password) {
        (Some(user), Some(password)) => StoreConfig::with_credentials(cli.db, user, password),
        _ => StoreConfig::anonymous(cli.db),
    };
    let store = SqliteRegistryStore::new(config).context("failed to configure store")?;

    match cli.command {
        Command::Init => store.init_schema().context("init failed")?,
        Command::Save {
            id,
            name,
            age,
            alive,
        } => store
            .save(id, &name, age, alive)
            .with_context(|| format!("save of voter {id} failed"))?,
        Command::Exists { id } => println!("{}", store.exists_by_id(id)?),
        Command::Find { id } => match store.find_by_id(id)? {
            Some(record) => println!("{}", serde_json::to_string(&record)?),
            None => println!("absent"),
        },
        Command::DeleteAll => store.delete_all().context("delete-all failed")?,
    }

    Ok(())
}
