//! Payout Server
//!
//! Watches submitted cryptocurrency withdrawals until their wallet gateway
//! reports them on chain and confirmed, and serves the admin API.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::{Parser, Subcommand};
use config::{ConfigLoader, get_database_url};
use payout_core::gateway::GatewayRegistry;
use payout_core::import::Importer;
use payout_core::processors::{TracingReporter, WithdrawWatcher};
use payout_core::store::PgStore;
use server::{build_router, run_server};
use shutdown::{spawn_config_reload_handler, spawn_shutdown_broadcaster, wait_for_shutdown};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Payout - withdrawal confirmation watcher
#[derive(Parser, Debug)]
#[command(name = "payout-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "./payout-config.toml")]
    config: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long, global = true, default_value = "false")]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the watcher and the admin API (default)
    Serve {
        /// Override the listen address (e.g., 0.0.0.0:3000)
        #[arg(short, long)]
        listen: Option<SocketAddr>,

        /// Run database migrations on startup
        #[arg(long, default_value = "false")]
        migrate: bool,
    },
    /// Import blockchains, currencies and wallets from a JSON file, then exit
    Import {
        /// Path to the JSON payload
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_tracing(args.log_json);

    tracing::info!("Starting payout-server v{}", env!("CARGO_PKG_VERSION"));

    match args.command.unwrap_or(Command::Serve {
        listen: None,
        migrate: false,
    }) {
        Command::Serve { listen, migrate } => serve(&args.config, listen, migrate).await,
        Command::Import { file } => import(&file).await,
    }
}

async fn serve(config_path: &Path, listen: Option<SocketAddr>, migrate: bool) -> anyhow::Result<()> {
    // Load configuration
    let config_loader = Arc::new(ConfigLoader::new(config_path, listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!("Configuration loaded from {:?}", config_path);

    // Convert to shared config with separate locks for each section
    let shared_config = loaded_config.into_shared();
    let listen_addr = shared_config.server.read().await.listen;
    let gateway_timeout = shared_config.watcher.read().await.gateway_timeout;

    let db_pool = connect_database().await?;

    // Run migrations if requested
    if migrate {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&db_pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                e
            })?;
        tracing::info!("Migrations completed successfully");
    }

    let store = Arc::new(PgStore::new(db_pool.clone()));
    let registry = Arc::new(GatewayRegistry::with_builtin(gateway_timeout));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let signal_handle = spawn_shutdown_broadcaster(shutdown_tx.clone());

    // Spawn the withdrawal watcher
    let watcher = WithdrawWatcher::new(
        store.clone(),
        registry,
        Arc::new(TracingReporter),
        shared_config.watcher.clone(),
        shutdown_rx.clone(),
    );
    let watcher_handle = tokio::spawn(watcher.run());

    // Spawn config reload handler (listens for SIGHUP)
    let reload_handle = spawn_config_reload_handler(
        shared_config.clone(),
        config_loader,
        shutdown_rx.clone(),
    );

    let state = AppState::new(Arc::new(Importer::new(store)), shared_config);
    let router = build_router(state);

    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr, wait_for_shutdown(shutdown_rx)).await;

    // The server may have stopped on its own; make sure everything else does too
    let _ = shutdown_tx.send(true);
    signal_handle.abort();
    if let Err(e) = watcher_handle.await {
        tracing::error!("Withdraw watcher task failed: {}", e);
    }
    if let Err(e) = reload_handle.await {
        tracing::error!("Config reload task failed: {}", e);
    }

    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

async fn import(file: &Path) -> anyhow::Result<()> {
    let contents = std::fs::read_to_string(file)?;
    let payload: serde_json::Value = serde_json::from_str(&contents)?;

    let db_pool = connect_database().await?;
    let importer = Importer::new(Arc::new(PgStore::new(db_pool.clone())));
    let result = importer.import(payload).await;
    db_pool.close().await;

    let report = result?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if report.total_failed() > 0 {
        tracing::warn!(failed = report.total_failed(), "Some records were not imported");
    }
    Ok(())
}

async fn connect_database() -> anyhow::Result<PgPool> {
    let database_url = get_database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;

    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");
    Ok(db_pool)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
