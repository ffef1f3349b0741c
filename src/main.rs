//! Interview Arena - HTTP entry point
//!
//! Loads the JSON configuration, opens the SQLite database and serves the
//! practice API until Ctrl+C.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use interview_arena::storage::{ConfigService, Database};
use interview_arena::utils::paths;
use interview_arena::{build_router, AppState};

/// How often stale practice sessions are evicted
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Interview Arena command line arguments
#[derive(Parser, Debug)]
#[command(name = "interview-arena")]
#[command(about = "AI mock interview practice backend", long_about = None)]
#[command(version)]
struct Args {
    /// Configuration file (defaults to ~/.interview-arena/config.json)
    #[arg(short, long, env = "INTERVIEW_ARENA_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overrides bind_address from the configuration
    #[arg(short, long, env = "INTERVIEW_ARENA_BIND")]
    bind: Option<String>,

    /// SQLite database file, overrides database_path from the configuration
    #[arg(long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer())
        .init();

    let args = Args::parse();
    info!("Starting interview-arena v{}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => ConfigService::load_or_create(path),
        None => ConfigService::new(),
    }
    .context("Failed to load configuration")?;
    info!(path = %config.path().display(), "Configuration loaded");

    let settings = config.get_config_clone();
    let db_path = match (args.database, settings.database_path.as_deref()) {
        (Some(path), _) => path,
        (None, Some(path)) => PathBuf::from(path),
        (None, None) => paths::database_path()?,
    };
    let db = Database::open(&db_path).context("Failed to open database")?;

    let state = AppState::from_config(db, config).context("Failed to build generation client")?;
    if settings.resolved_api_key().is_none() {
        tracing::warn!(
            provider = %settings.provider,
            "No API key configured; generation requests will fail until one is set"
        );
    }

    let shutdown = CancellationToken::new();
    let sweeper = state.spawn_session_sweeper(SESSION_SWEEP_INTERVAL, shutdown.clone());
    let app = build_router(state);

    let bind = args.bind.unwrap_or(settings.bind_address);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("Listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    if let Err(e) = sweeper.await {
        tracing::warn!("Session sweeper ended abnormally: {}", e);
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
    shutdown.cancel();
}
