//! Server startup and shutdown.
//!
//! `run_server` opens the record store, runs migrations, connects the cache,
//! assembles the reputation checker chain and the alias allocator, then
//! serves the router until a shutdown signal arrives.

use crate::cache::Cache;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::reputation;
use crate::routes;
use crate::services::reputation::BLACKLIST_REJECTION_MESSAGE;
use crate::services::{AliasAllocator, ReputationGuard};
use crate::state::AppState;
use crate::store;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Build the shared application state from configuration.
///
/// # Errors
///
/// Fails when the store cannot be opened or migrated, when the cache or the
/// reputation client cannot be constructed, or when the alias alphabet is
/// unusable. An unreachable cache is only logged.
pub async fn build_state(config: &Config, should_migrate: bool) -> AppResult<Arc<AppState>> {
    info!("Opening record store...");
    let store = store::open(&config.database).await?;

    if should_migrate {
        info!("Running database migrations...");
        store.migrate().await?;
        info!("Migrations completed successfully");
    }

    let cache = Cache::from_config(&config.cache)?;
    match &cache {
        Some(cache) => match cache.ping().await {
            Ok(_) => info!("Cache connection verified"),
            Err(e) => warn!("Cache ping failed: {}. Lookups will fall back to the store.", e),
        },
        None => info!("Cache disabled"),
    }

    let checker = reputation::build_checker(&config.reputation)?;
    let guard = ReputationGuard::new(checker, config.reputation.timeout())
        .with_message(reputation::BLACKLIST_NAME, BLACKLIST_REJECTION_MESSAGE);

    let allocator = AliasAllocator::new(store.clone(), &config.alias)?;
    info!(
        alphabet = %allocator.factory().alphabet(),
        min_len = allocator.factory().min_length(),
        max_len = allocator.factory().max_length(),
        "Alias generation configured"
    );

    Ok(Arc::new(AppState::new(
        allocator,
        guard,
        store,
        cache,
        config.server.base_url.clone(),
    )))
}

/// Run the web server with the given configuration.
///
/// Returns once the server has shut down gracefully.
pub async fn run_server(config: Config, addr: String, should_migrate: bool) -> AppResult<()> {
    info!("Starting shorturl server...");

    let state = build_state(&config, should_migrate).await?;

    let app = routes::create_router(state, &config.cors, &config.rate_limit)?;

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to address {}: {}", addr, e)))?;

    info!("Server listening on {}", addr);
    info!("Base URL: {}", config.server.base_url);

    axum::serve(listener, app)
        .with_graceful_shutdown(create_shutdown_signal())
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
///
/// # Panics
///
/// Panics if a signal handler cannot be installed.
async fn create_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    #[cfg(not(unix))]
    ctrl_c.await;

    info!("Shutdown signal received");
}
