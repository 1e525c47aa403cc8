//! Administrative command handlers.
//!
//! CLI entry points for migrations, store statistics, cache connectivity
//! and one-off reputation checks.

use crate::cache::Cache;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::reputation;
use crate::services::ReputationGuard;
use crate::store;
use crate::target::TargetUrl;
use clap::Subcommand;
use tracing::info;

/// Administrative commands available via CLI.
#[derive(Subcommand, Debug)]
pub enum AdminCommands {
    /// Run database migrations
    Migrate,

    /// Show record statistics
    Stats,

    /// Ping the cache server
    PingCache,

    /// Classify a URL with the configured reputation checkers
    CheckUrl {
        /// URL to classify
        url: String,
    },
}

/// Run an administrative command with the given configuration.
pub async fn run(config: Config, admin_command: AdminCommands) -> AppResult<()> {
    match admin_command {
        AdminCommands::Migrate => migrate(config).await,
        AdminCommands::Stats => stats(config).await,
        AdminCommands::PingCache => ping_cache(config).await,
        AdminCommands::CheckUrl { url } => check_url(config, &url).await,
    }
}

async fn migrate(config: Config) -> AppResult<()> {
    info!("Running database migrations...");

    let store = store::open(&config.database).await?;
    store.migrate().await?;

    info!("Migrations completed successfully");
    Ok(())
}

async fn stats(config: Config) -> AppResult<()> {
    info!("Fetching statistics...");

    let store = store::open(&config.database).await?;
    let stats = store.stats().await?;

    println!("\n=== shorturl Statistics ===");
    println!("Total records:   {}", stats.total_records);
    println!("Flagged records: {}", stats.flagged_records);
    println!();

    Ok(())
}

async fn ping_cache(config: Config) -> AppResult<()> {
    info!("Pinging cache server...");

    let cache = Cache::new(
        &config.cache.url,
        config.cache.max_connections,
        config.cache.default_ttl_seconds,
    )?;

    let response = cache.ping().await?;

    info!("Cache server responded: {}", response);

    Ok(())
}

async fn check_url(config: Config, url: &str) -> AppResult<()> {
    let target = TargetUrl::parse(url)?;

    let checker = reputation::build_checker(&config.reputation)?;
    if config.reputation.api_key.is_none() {
        info!("REPUTATION_API_KEY is not set, Safe Browsing is skipped");
    }

    let guard = ReputationGuard::new(checker, config.reputation.timeout());
    let classification = guard.classify(&target).await?;

    println!("URL:     {}", target);
    println!("Verdict: {:?}", classification.verdict);
    println!("Source:  {}", classification.source);

    if classification.verdict.is_clean() {
        Ok(())
    } else {
        Err(AppError::UrlRejected(format!(
            "{} is classified as {:?}",
            target, classification.verdict
        )))
    }
}
