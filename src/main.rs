//! Tollgate Server: authentication tokens, login captcha and request throttling.
//!
//! Main entry point that wires all crates together and starts the server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use tollgate_auth::rate_limit::RateLimitSweeper;
use tollgate_auth::{Argon2PasswordHasher, MemoryUserStore};
use tollgate_cache::CacheManager;
use tollgate_core::config::AppConfig;

/// Command-line options.
#[derive(Debug, Parser)]
#[command(name = "tollgate-server", version, about = "Tollgate authentication server")]
struct Cli {
    /// Environment overlay to load from `config/{env}.toml`.
    #[arg(long, env = "TOLLGATE_ENV", default_value = "development")]
    env: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load(&cli.env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %cli.env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e:#}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting Tollgate v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Cache ────────────────────────────────────────────
    tracing::info!(provider = %config.cache.provider, "Initializing cache...");
    let cache = CacheManager::new(&config.cache)
        .await
        .context("Cache init failed")?;

    // ── Step 2: User store and hasher ────────────────────────────
    let users = Arc::new(MemoryUserStore::new());
    let hasher = Arc::new(Argon2PasswordHasher::new());

    // ── Step 3: Services ─────────────────────────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let rate_limit = config.rate_limit.clone();
    let state = tollgate_api::AppState::new(config, cache, users, hasher);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 4: Background sweeper for the in-process limiter ────
    let sweeper_handle = match state.rate_limiter.as_memory() {
        Some(limiter) if rate_limit.enabled => {
            let sweeper = RateLimitSweeper::new(
                limiter.clone(),
                Duration::from_secs(rate_limit.sweep_interval_seconds.max(1)),
            );
            Some(tokio::spawn(sweeper.run(shutdown_rx.clone())))
        }
        _ => None,
    };

    // ── Step 5: HTTP server ──────────────────────────────────────
    let app = tollgate_api::build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("Tollgate server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    })
    .await
    .context("Server error")?;

    if let Some(handle) = sweeper_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }

    tracing::info!("Tollgate server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
