mod config;
mod database;
mod entities;
mod logging;
mod migrator;
mod ports;
mod schema;
mod steps;
#[cfg(test)]
mod test_utils;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::{Result, eyre::Context};

use crate::{
    config::Config,
    database::Database,
    logging::setup_logging,
    migrator::Migrator,
    ports::schema_store::{SchemaStore, StepLedger},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "MUSIC_SCHEMA_CONFIG")]
    config: Option<PathBuf>,

    /// Database file, overriding the config
    #[arg(short, long, global = true, env = "MUSIC_SCHEMA_DATABASE")]
    database: Option<PathBuf>,

    /// Console log level (default: off)
    #[arg(long, default_value = "off", global = true, env = "LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// File log level (default: debug)
    #[arg(long, default_value = "debug", global = true)]
    log_file_level: log::LevelFilter,

    /// Path to log file
    #[arg(long, env = "MUSIC_SCHEMA_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply, revert and inspect schema steps
    #[command(subcommand)]
    Migrate(MigrateCommands),
    /// Inspect collection definitions
    #[command(subcommand)]
    Collection(CollectionCommands),
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum MigrateCommands {
    /// Apply pending steps in order
    Up {
        /// Apply at most this many steps
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Revert the most recently applied steps
    Down {
        /// Number of steps to revert
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,
    },
    /// List every registered step and whether it has been applied
    Status {
        /// Only report whether this step id has been applied
        step: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum CollectionCommands {
    /// List all collections
    List,
    /// Print a collection definition as JSON
    Show {
        /// Collection id or name
        name_or_id: String,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    setup_logging(args.log_level, args.log_file.clone(), args.log_file_level)?;

    log::debug!("Music schema starting");

    match args.command {
        Commands::Config(config_commands) => match config_commands {
            ConfigCommands::CreateDefault => {
                log::debug!("Creating default config");
                let path = Config::create_default()?;
                println!("{}", path.display());
            }
            ConfigCommands::Path => match Config::config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("No default config path found"),
            },
        },
        Commands::Migrate(migrate_commands) => {
            let database = open_database(args.config, args.database).await?;
            let migrator = steps::migrator().context("Invalid step registry")?;
            run_migrate(migrate_commands, &database, &migrator).await?;
        }
        Commands::Collection(collection_commands) => {
            let database = open_database(args.config, args.database).await?;
            run_collection(collection_commands, &database).await?;
        }
    }

    Ok(())
}

async fn open_database(config: Option<PathBuf>, database: Option<PathBuf>) -> Result<Database> {
    log::debug!("Loading configuration");
    let config = {
        if let Some(config) = config {
            Config::from_file(&config)
        } else {
            Config::load()
        }
    }
    .with_context(|| "Failed to load music-schema config")?;

    let database_path = database.unwrap_or_else(|| config.database_path());
    Database::open(&database_path).await
}

async fn run_migrate(
    command: MigrateCommands,
    database: &Database,
    migrator: &Migrator,
) -> Result<()> {
    match command {
        MigrateCommands::Up { limit } => {
            let applied = migrator
                .up(database, limit)
                .await
                .context("Failed to apply migration steps")?;
            if applied.is_empty() {
                println!("Nothing to apply");
            }
            for id in applied {
                println!("applied  {}", id);
            }
        }
        MigrateCommands::Down { count } => {
            let reverted = migrator
                .down(database, count)
                .await
                .context("Failed to revert migration steps")?;
            if reverted.is_empty() {
                println!("Nothing to revert");
            }
            for id in reverted {
                println!("reverted {}", id);
            }
        }
        MigrateCommands::Status { step: Some(step_id) } => {
            if migrator.find_step(&step_id).is_none() {
                log::warn!("Step {} is not registered", step_id);
            }
            let applied = migrator.is_applied(&database.store(), &step_id).await?;
            println!("{:<40} {}", step_id, if applied { "applied" } else { "pending" });
        }
        MigrateCommands::Status { step: None } => {
            let store = database.store();
            for status in migrator.status(&store).await? {
                let applied_at = status
                    .applied_at
                    .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
                    .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                    .unwrap_or_else(|| "pending".to_string());
                println!("{:<40} {}", status.id, applied_at);
            }

            for entry in store.applied_steps().await? {
                if migrator.find_step(&entry.id).is_none() {
                    log::warn!(
                        "Ledger contains unregistered step {} (sequence {})",
                        entry.id,
                        entry.sequence
                    );
                }
            }
        }
    }

    Ok(())
}

async fn run_collection(command: CollectionCommands, database: &Database) -> Result<()> {
    let store = database.store();
    match command {
        CollectionCommands::List => {
            for collection in store.list_collections().await? {
                println!(
                    "{:<20} {:<24} {} fields",
                    collection.id,
                    collection.name,
                    collection.fields.len()
                );
            }
        }
        CollectionCommands::Show { name_or_id } => {
            let collection = store.find_collection(&name_or_id).await?;
            println!("{}", serde_json::to_string_pretty(&collection)?);
        }
    }

    Ok(())
}
