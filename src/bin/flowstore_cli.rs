use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use flowstore::{IntervalQuery, LogStore, LogStoreConfig, Repository, RepositoryConfig};

#[derive(Parser, Debug)]
#[command(name = "flowstore-cli", version, about = "Flow-meter telemetry store tooling")]
struct Cli {
    /// Directory holding the cell log
    #[arg(long, default_value = "./data/flowstore")]
    db: PathBuf,

    /// JSON repository configuration (column family, bucket interval)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sync the log after every write
    #[arg(long)]
    sync: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store a `deviceKey,timestamp,volume,...` upload
    Store { payload: String },
    /// Run a JSON interval query and print the measurements
    Query { request: String },
    /// Print cell and row counts
    Stats,
}

fn load_config(path: Option<&PathBuf>) -> Result<RepositoryConfig> {
    let Some(path) = path else {
        return Ok(RepositoryConfig::default());
    };
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    RepositoryConfig::from_json(&body).context("Failed to parse config")
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref())?;
    let store = LogStore::open_with_config(
        &cli.db,
        LogStoreConfig {
            sync_on_write: cli.sync,
        },
    )
    .with_context(|| format!("Failed to open store at {}", cli.db.display()))?;
    info!("Opened store {}", store.path().display());

    let repo = Repository::with_config(store, config).context("Invalid repository config")?;

    match cli.command {
        Commands::Store { payload } => {
            let summary = repo
                .store_payload(&payload)
                .context("Failed to insert data from device")?;
            println!("written={} dropped={}", summary.written, summary.dropped);
        }
        Commands::Query { request } => {
            let query = IntervalQuery::from_json(&request)?;
            let result = repo.search(&query).context("Failed to load data")?;
            println!("{}", result.to_json()?);
        }
        Commands::Stats => {
            let store = repo.backend();
            println!("cells={} rows={}", store.cell_count()?, store.row_count()?);
        }
    }
    Ok(())
}
