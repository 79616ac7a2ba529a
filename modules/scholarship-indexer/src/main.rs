use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Instrument;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use scholarship_common::{load_config, IndexerConfig, Secrets, StoreBackend};
use scholarship_engine::Engine;
use scholarship_indexer::{dump_entities, read_logs, replay};
use scholarship_probe::StaticContractReader;
use scholarship_store::{EntityStore, MemoryEntityStore, PgEntityStore};

#[derive(Parser)]
#[command(name = "indexer", about = "Scholarship event indexer: replays chain logs into entities")]
struct Cli {
    /// Path to config TOML file
    #[arg(long, default_value = "./config/indexer.toml")]
    config: PathBuf,

    /// Ordered JSON-lines file of raw logs
    #[arg(long)]
    events: PathBuf,

    /// JSON snapshot of contract state answering probe calls
    #[arg(long)]
    contracts: Option<PathBuf>,

    /// Print every stored entity as JSON when done
    #[arg(long)]
    dump: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config_path = cli.config.canonicalize().with_context(|| {
        format!(
            "Config file not found: {}. Create one or specify --config <path>",
            cli.config.display()
        )
    })?;
    tracing::info!(config = %config_path.display(), "Loading config");
    let config = load_config(&config_path)?;

    let run_id = Uuid::new_v4();
    run(cli, config)
        .instrument(tracing::info_span!("replay", %run_id))
        .await
}

async fn run(cli: Cli, config: IndexerConfig) -> Result<()> {
    let store = open_store(&config).await?;

    let reader = match &cli.contracts {
        Some(path) => StaticContractReader::from_json_file(path)?,
        None => {
            tracing::warn!("No contract snapshot given; every probe falls back to its default");
            StaticContractReader::new()
        }
    };

    let logs = read_logs(&cli.events)?;
    tracing::info!(
        events = %cli.events.display(),
        count = logs.len(),
        factory = %config.factory.address,
        "Event log loaded"
    );

    let engine = Engine::new(store, reader, config.discovery);
    let mut registry = engine.restore_registry(config.factory.address).await?;

    replay(&engine, &mut registry, &logs).await?;

    if cli.dump {
        let dump = dump_entities(engine.store()).await?;
        println!("{}", serde_json::to_string_pretty(&dump)?);
    }

    Ok(())
}

async fn open_store(config: &IndexerConfig) -> Result<Arc<dyn EntityStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory entity store");
            Ok(Arc::new(MemoryEntityStore::new()))
        }
        StoreBackend::Postgres => {
            let secrets = Secrets::from_env();
            let store = PgEntityStore::connect(secrets.require_database_url()?).await?;
            store.migrate().await?;
            tracing::info!("Connected to Postgres entity store");
            Ok(Arc::new(store))
        }
    }
}
