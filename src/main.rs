use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use breachwatch::analysis::{report, BreachAggregator};
use breachwatch::config::{Config, LoggingConfig};
use breachwatch::records::{records_from_json, BreachFilter, RecordSource};
use breachwatch::storage::{self, BreachStore};

#[derive(Parser)]
#[command(
    name = "breachwatch",
    about = "Data breach tracking and trend reporting",
    version,
    long_about = None
)]
struct Cli {
    /// Config file (defaults to $BREACHWATCH_CONFIG, then /etc/breachwatch/breachwatch.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address (overrides server.bind)
        #[arg(long)]
        bind: Option<String>,

        /// SQLite database path (overrides storage.database_path)
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Print the breach statistics report
    Stats {
        /// SQLite database path (overrides storage.database_path)
        #[arg(long)]
        db: Option<PathBuf>,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Import breach records from a JSON array file
    Import {
        /// SQLite database path (overrides storage.database_path)
        #[arg(long)]
        db: Option<PathBuf>,

        /// File containing a JSON array of breach documents
        #[arg(long)]
        file: PathBuf,
    },

    /// Generate a random API token
    Token,
}

/// Load the config under a temporary stderr subscriber so fallback warnings
/// are visible before `[logging]` is known.
fn load_config(path: Option<&Path>) -> Result<Config> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::with_default(bootstrap, || match path {
        Some(path) => Config::load(path),
        None => Ok(Config::load_or_default()),
    })
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn open_store(config: &Config, db: Option<PathBuf>) -> Result<BreachStore> {
    let path = db.unwrap_or_else(|| config.storage.database_path.clone());
    Ok(BreachStore::new(storage::open_pool(&path)?))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Serve { bind, db } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if let Some(db) = db {
                config.storage.database_path = db;
            }
            tracing::info!(bind = %config.server.bind, "Starting BreachWatch");
            breachwatch::serve(config).await?;
        }
        Commands::Stats { db, json } => {
            let store = open_store(&config, db)?;
            let records = store.fetch_records(&BreachFilter::default())?;
            let aggregator = BreachAggregator::new(&records);
            let stats = aggregator.stats_report();

            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("\nBreachWatch Statistics\n");
                print!("{}", report::format_summary(&stats));
            }
        }
        Commands::Import { db, file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let value: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("{} is not valid JSON", file.display()))?;
            let records = records_from_json(value)?;

            let store = open_store(&config, db)?;
            for record in &records {
                store.insert(record, Some("import"))?;
            }
            println!("Imported {} breach records from {}", records.len(), file.display());
        }
        Commands::Token => {
            let token = breachwatch::api::auth::generate_token();
            println!("{token}");
            eprintln!("\nAdd it to the config file:\n");
            eprintln!("[[auth.tokens]]\nname = \"<principal>\"\ntoken = \"{token}\"");
        }
    }

    Ok(())
}
