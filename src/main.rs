//! flocksense - poultry house analytics server
//!
//! Simulates broiler house telemetry, estimates flock KPIs and serves
//! operator recommendations over HTTP.
//!
//! # Usage
//!
//! ```bash
//! # Serve with flocksense.toml (or built-in defaults)
//! cargo run --release
//!
//! # Explicit config and data file
//! ./flocksense --config farm.toml --data /var/lib/flocksense/telemetry.csv
//!
//! # Print the effective configuration and exit
//! ./flocksense --dump-config
//! ```
//!
//! # Environment Variables
//!
//! - `FLOCKSENSE_CONFIG`: Path to the farm config file
//! - `FLOCKSENSE_SERVER_ADDR`: Bind address (default: 0.0.0.0:8080)
//! - `FLOCKSENSE_CORS_ORIGINS`: Comma-separated allowed origins
//! - `RUST_LOG`: Logging level (default: info)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use flocksense::api::{create_app, ApiState, SharedStore};
use flocksense::config::{defaults::SERVER_ADDR_ENV_VAR, FarmConfig};
use flocksense::service::FarmService;
use flocksense::storage::{CsvStore, InMemoryStore};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "flocksense")]
#[command(about = "flocksense poultry house analytics server")]
#[command(version)]
struct CliArgs {
    /// Override the server address (default: "0.0.0.0:8080")
    #[arg(short, long)]
    addr: Option<String>,

    /// Farm config file. Load errors are fatal when given explicitly.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the CSV telemetry store path
    #[arg(long, value_name = "PATH")]
    data: Option<PathBuf>,

    /// Keep telemetry in memory only (nothing written to disk)
    #[arg(long, conflicts_with = "data")]
    in_memory: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    dump_config: bool,
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    let mut farm_config = match &args.config {
        Some(path) => FarmConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => FarmConfig::load(),
    };
    if let Some(data) = &args.data {
        farm_config.storage.data_path = data.clone();
    }

    if args.dump_config {
        print!("{}", farm_config.to_toml()?);
        return Ok(());
    }

    let server_addr = args
        .addr
        .or_else(|| std::env::var(SERVER_ADDR_ENV_VAR).ok())
        .unwrap_or_else(|| farm_config.server.addr.clone());

    info!("======================================================================");
    info!("  flocksense - Poultry House Analytics");
    info!("  Farm: {}", farm_config.farm.name);
    info!("======================================================================");

    let store: SharedStore = if args.in_memory {
        info!("Storage: in-memory (not persisted)");
        Arc::new(InMemoryStore::new())
    } else {
        let path = farm_config.storage.data_path.clone();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory {}", parent.display()))?;
        }
        info!("Storage: CSV at {}", path.display());
        Arc::new(CsvStore::new(path))
    };

    let service = FarmService::new(farm_config, store).context("Failed to build farm service")?;
    let app = create_app(ApiState::new(service));

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let listener = tokio::net::TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", server_addr))?;
    info!("HTTP server listening on {}", server_addr);

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel_token.cancelled().await;
            info!("[HttpServer] Received shutdown signal");
        })
        .await;

    if let Err(e) = result {
        error!("[HttpServer] Server error: {}", e);
        return Err(e.into());
    }

    info!("flocksense shutdown complete");
    Ok(())
}
