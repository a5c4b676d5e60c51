//! spedupctl - operator tool for the spedup-furnaces store
//!
//! Opens the same database the plugin uses (embedded SQLite file or MySQL,
//! per `<data-dir>/config.toml`) and provides:
//! - Schema status (`status`)
//! - Listing hydrated furnaces and unreadable rows (`list`)
//! - Removing one furnace or clearing the table (`remove`, `clear`)

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use spedup_store::config::{self, StorageConfig, CONFIG_FILE};
use spedup_store::{BlockLocation, FurnaceStore, SchemaStatus, WriteOutcome};
use tracing::debug;

mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "spedupctl",
    author,
    version,
    about = "Inspect and maintain the spedup-furnaces furnace store"
)]
struct Cli {
    /// Plugin data directory (holds database.sqlite and config.toml)
    #[arg(long, global = true, env = config::DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    /// Config file (defaults to <data-dir>/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the store and report engine and schema status
    Status,
    /// List stored furnaces with their label placement
    List(ListArgs),
    /// Remove the furnace stored at a block
    Remove(RemoveArgs),
    /// Delete every stored furnace
    Clear(ClearArgs),
}

#[derive(Parser, Debug)]
struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct RemoveArgs {
    /// World name
    world: String,
    /// Block X coordinate
    #[arg(allow_negative_numbers = true)]
    x: i32,
    /// Block Y coordinate
    #[arg(allow_negative_numbers = true)]
    y: i32,
    /// Block Z coordinate
    #[arg(allow_negative_numbers = true)]
    z: i32,
}

#[derive(Parser, Debug)]
struct ClearArgs {
    /// Confirm deleting every stored furnace
    #[arg(long)]
    yes: bool,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("spedup-furnaces"))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug })?;

    if let Commands::Clear(ClearArgs { yes: false }) = cli.command {
        bail!("Refusing to clear every furnace without --yes");
    }

    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    let config_path = cli.config.clone().unwrap_or_else(|| data_dir.join(CONFIG_FILE));
    debug!(data_dir = %data_dir.display(), config = %config_path.display(), "resolved paths");

    let storage = StorageConfig::load(&config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;
    let store = FurnaceStore::open(&storage, &data_dir)
        .await
        .context("Failed to open furnace store")?;

    let result = run(&cli.command, &store, &storage, &data_dir).await;
    store.close().await;
    result
}

async fn run(
    command: &Commands,
    store: &FurnaceStore,
    storage: &StorageConfig,
    data_dir: &std::path::Path,
) -> Result<()> {
    match command {
        Commands::Status => run_status(store, storage, data_dir),
        Commands::List(args) => run_list(store, args).await,
        Commands::Remove(args) => run_remove(store, args).await,
        Commands::Clear(_) => {
            let rows = store.clear_all().await.context("Failed to clear furnaces")?;
            println!("Removed {rows} furnace(s)");
            Ok(())
        }
    }
}

fn run_status(store: &FurnaceStore, storage: &StorageConfig, data_dir: &std::path::Path) -> Result<()> {
    println!("engine: {}", store.dialect().name());
    println!("url:    {}", storage.redacted_url(data_dir));
    println!("pool:   {} (max {} connections)", storage.pool.name, storage.pool.max_connections);

    match store.schema_status() {
        SchemaStatus::Verified => println!("schema: verified"),
        SchemaStatus::Migrated { added } => println!("schema: migrated (added {})", added.join(", ")),
        SchemaStatus::Failed { reason } => {
            println!("schema: FAILED");
            bail!("Schema check failed: {reason}");
        }
    }
    Ok(())
}

async fn run_list(store: &FurnaceStore, args: &ListArgs) -> Result<()> {
    let hydration = store.get_all().await.context("Failed to load furnaces")?;

    let mut furnaces: Vec<_> = hydration.furnaces.values().collect();
    furnaces.sort_by(|a, b| a.location.cmp(&b.location));

    if args.json {
        let output = serde_json::json!({
            "furnaces": furnaces,
            "skipped": hydration.skipped,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if furnaces.is_empty() {
        println!("No furnaces stored");
    }
    for furnace in &furnaces {
        let label = &furnace.label;
        println!(
            "{:<28} {:<14} level {:<3} {:<5} label ({:.2}, {:.2}, {:.2}) yaw {}{}",
            furnace.location.to_string(),
            furnace.material.as_str(),
            furnace.level,
            furnace.facing.as_str(),
            label.position.x,
            label.position.y,
            label.position.z,
            label.yaw,
            if furnace.world_loaded { "" } else { " [world not loaded]" }
        );
    }
    for skipped in &hydration.skipped {
        println!("skipped row {}: {}", skipped.id, skipped.reason);
    }
    Ok(())
}

async fn run_remove(store: &FurnaceStore, args: &RemoveArgs) -> Result<()> {
    let location = BlockLocation::new(args.world.clone(), args.x, args.y, args.z);
    match store.remove(&location).await.context("Failed to remove furnace")? {
        WriteOutcome::Applied { .. } => println!("Removed furnace at {location}"),
        WriteOutcome::NotFound => println!("No furnace stored at {location}"),
    }
    Ok(())
}
