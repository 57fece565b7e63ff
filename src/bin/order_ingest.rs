//! order-ingest: Load archived JSON orders into a SQLite database
//!
//! Usage:
//!   # Load an archive into shop.db (created if missing)
//!   order-ingest --database shop.db --file orders.zip
//!
//!   # Replace the built-in table declarations
//!   order-ingest -d shop.db -f orders.tar.gz --schema schema.json
//!
//!   # Machine-readable logs, with per-row detail
//!   RUST_LOG=order_ingest=debug order-ingest -d shop.db -f orders.tar.gz --log-format json

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use order_ingest::{ingest_archive, DeclaredSchemas, IngestConfig, SqliteStore};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "order-ingest")]
#[command(about = "Load JSON order documents from a zip or tar.gz archive into SQLite", long_about = None)]
struct Args {
    /// SQLite database file
    #[arg(short = 'd', long, env = "ORDER_INGEST_DATABASE", value_name = "PATH")]
    database: PathBuf,

    /// Archive (.zip or .tar.gz) of JSON documents, each {"orders": [...]}
    #[arg(short = 'f', long, env = "ORDER_INGEST_FILE", value_name = "PATH")]
    file: PathBuf,

    /// JSON file replacing the built-in orders/items column declarations
    #[arg(long, value_name = "PATH")]
    schema: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format);

    let mut config = IngestConfig::default();
    if let Some(path) = &args.schema {
        config.schemas = DeclaredSchemas::from_file(path)
            .with_context(|| format!("Failed to load schema file {}", path.display()))?;
    }

    let mut store = SqliteStore::open(&args.database)
        .with_context(|| format!("Cannot open database {}", args.database.display()))?;

    let report = ingest_archive(&args.file, &mut store, config)
        .with_context(|| format!("Failed to ingest {}", args.file.display()))?;

    info!(
        entries = report.entries,
        orders = report.orders,
        items = report.items,
        "done"
    );
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Pretty => builder.with_target(false).init(),
        LogFormat::Json => builder.json().init(),
    }
}
