//! Persistence of alias records.
//!
//! Both backends enforce uniqueness of `alias` and of `target_url` at insert
//! time and report a violation as `AppError::UniqueConflict`, so callers can
//! race on inserts without a global lock.

pub mod memory;
pub mod postgres;

use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};
use crate::models::ShortUrlRecord;
use async_trait::async_trait;
use std::sync::Arc;

pub use memory::MemoryRecordStore;
pub use postgres::PgRecordStore;

/// Aggregate counts over the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStats {
    pub total_records: i64,
    pub flagged_records: i64,
}

/// Storage contract for alias records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Find the record registered for a normalized target URL
    async fn find_by_target(&self, target_url: &str) -> AppResult<Option<ShortUrlRecord>>;

    /// Find the record for an alias
    async fn find_by_alias(&self, alias: &str) -> AppResult<Option<ShortUrlRecord>>;

    /// Insert a new record.
    ///
    /// # Errors
    ///
    /// Returns `AppError::UniqueConflict` naming the violated column when the
    /// alias or the target URL is already stored. Nothing is written in that
    /// case.
    async fn insert(&self, alias: &str, target_url: &str) -> AppResult<ShortUrlRecord>;

    /// Check whether an alias is taken
    async fn exists_alias(&self, alias: &str) -> AppResult<bool>;

    /// Record the latest preview verdict for an alias
    async fn set_flagged(&self, alias: &str, flagged: bool) -> AppResult<()>;

    async fn stats(&self) -> AppResult<StoreStats>;

    /// Check connectivity
    async fn ping(&self) -> AppResult<()>;

    /// Bring the schema up to date
    async fn migrate(&self) -> AppResult<()>;
}

/// Open the store selected by `config.url`.
///
/// `memory://` selects the in-process store, `postgres://` and
/// `postgresql://` select PostgreSQL.
pub async fn open(config: &DatabaseConfig) -> AppResult<Arc<dyn RecordStore>> {
    let uri = config.url.as_str();

    if uri.starts_with("memory://") {
        tracing::warn!("Using in-memory record store, records will not survive a restart");
        return Ok(Arc::new(MemoryRecordStore::new()));
    }

    if uri.starts_with("postgres://") || uri.starts_with("postgresql://") {
        let store = PgRecordStore::new(
            uri,
            config.max_connections,
            config.min_connections,
            config.acquire_timeout_seconds,
        )
        .await?;
        return Ok(Arc::new(store));
    }

    Err(AppError::Configuration(format!(
        "Unsupported STORE_URI scheme: {}",
        uri.split("://").next().unwrap_or_default()
    )))
}
