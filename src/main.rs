//! lrucache - A fixed-capacity LRU cache server
//!
//! Serves an in-memory LRU cache over a small JSON HTTP API.

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lrucache::{api::create_router, AppState, Config};

/// Main entry point for the cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache with the configured capacity
/// 4. Create Axum router with all endpoints
/// 5. Start HTTP server on the configured address
/// 6. Handle graceful shutdown on SIGINT/SIGTERM/SIGQUIT
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lrucache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting lrucache server");

    let config = Config::from_env().context("failed to load configuration")?;
    info!(
        "Configuration loaded: capacity={}, address={}, request_timeout={:?}",
        config.capacity, config.server_address, config.request_timeout
    );

    let state = AppState::from_config(&config).context("failed to create cache")?;
    info!("Cache initialized");

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.server_address)
        .await
        .with_context(|| format!("failed to bind {}", config.server_address))?;
    info!("Server listening on http://{}", config.server_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C, SIGTERM or SIGQUIT).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let unix_signal = |kind: signal::unix::SignalKind, name: &'static str| async move {
        match signal::unix::signal(kind) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install {} handler: {}", name, e);
                std::future::pending::<()>().await;
            }
        }
        name
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::select! {
            name = unix_signal(signal::unix::SignalKind::terminate(), "SIGTERM") => name,
            name = unix_signal(signal::unix::SignalKind::quit(), "SIGQUIT") => name,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        name = terminate => {
            info!("Received {}, initiating shutdown...", name);
        }
    }
}
