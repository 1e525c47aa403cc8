use crate::config::CacheConfig;
use crate::error::{AppError, AppResult};
use crate::models::ShortUrlRecord;
use deadpool_redis::{redis::AsyncCommands, Manager, Pool, Runtime};
use std::time::Duration;

/// Read-through cache of records keyed by alias.
///
/// Only stored records are cached. Reputation verdicts never are; a preview
/// always asks the checker again.
#[derive(Clone)]
pub struct Cache {
    pool: Pool,
    default_ttl: Duration,
}

impl Cache {
    /// Create a new cache connection pool
    pub fn new(redis_url: &str, max_connections: u32, default_ttl_seconds: u64) -> AppResult<Self> {
        let manager = Manager::new(redis_url)
            .map_err(|e| AppError::Configuration(format!("Invalid Redis URL: {}", e)))?;

        let pool = Pool::builder(manager)
            .max_size(max_connections as usize)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create Redis pool: {}", e)))?;

        Ok(Self {
            pool,
            default_ttl: Duration::from_secs(default_ttl_seconds),
        })
    }

    /// Build the cache when it is enabled in `config`
    pub fn from_config(config: &CacheConfig) -> AppResult<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }

        Self::new(
            &config.url,
            config.max_connections,
            config.default_ttl_seconds,
        )
        .map(Some)
    }

    /// Ping the Redis server to check connectivity
    pub async fn ping(&self) -> AppResult<String> {
        let mut conn = self.pool.get().await?;
        let response: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(response)
    }

    /// Get a record from cache by alias
    pub async fn get_record(&self, alias: &str) -> AppResult<Option<ShortUrlRecord>> {
        let key = Self::alias_key(alias);
        let mut conn = self.pool.get().await?;

        let value: Option<String> = conn.get(&key).await?;

        match value {
            Some(v) => Ok(Some(serde_json::from_str(&v)?)),
            None => Ok(None),
        }
    }

    /// Put a record in cache
    pub async fn set_record(&self, record: &ShortUrlRecord) -> AppResult<()> {
        let key = Self::alias_key(&record.alias);
        let value = serde_json::to_string(record)?;
        let mut conn = self.pool.get().await?;

        let _: () = conn.set_ex(&key, value, self.default_ttl.as_secs()).await?;

        Ok(())
    }

    /// Drop a record from cache
    pub async fn delete_record(&self, alias: &str) -> AppResult<()> {
        let key = Self::alias_key(alias);
        let mut conn = self.pool.get().await?;

        let _: () = conn.del(&key).await?;

        Ok(())
    }

    fn alias_key(alias: &str) -> String {
        format!("{}:{}", Self::KEY_PREFIX, alias)
    }

    const KEY_PREFIX: &'static str = "alias";
}
