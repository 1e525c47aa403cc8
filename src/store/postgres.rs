use crate::error::{AppError, AppResult, ConflictField};
use crate::models::ShortUrlRecord;
use async_trait::async_trait;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    ConnectOptions, PgPool,
};
use std::str::FromStr;
use std::time::Duration;

use super::{RecordStore, StoreStats};

/// Name of the unique constraint on `short_urls.target_url`
const TARGET_UNIQUE_CONSTRAINT: &str = "short_urls_target_url_key";

/// PostgreSQL record store
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    /// Create a new store with a connection pool
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout_seconds: u64,
    ) -> AppResult<Self> {
        let options = PgConnectOptions::from_str(database_url)
            .map_err(|e| AppError::Configuration(format!("Invalid database URL: {}", e)))?
            .disable_statement_logging();

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(acquire_timeout_seconds))
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }
}

/// Translate a unique violation into `UniqueConflict`
fn map_insert_error(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_error) = &error {
        if db_error.is_unique_violation() {
            let field = if db_error.constraint() == Some(TARGET_UNIQUE_CONSTRAINT) {
                ConflictField::Target
            } else {
                ConflictField::Alias
            };
            return AppError::UniqueConflict(field);
        }
    }
    AppError::Database(error)
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn find_by_target(&self, target_url: &str) -> AppResult<Option<ShortUrlRecord>> {
        let result = sqlx::query_as::<_, ShortUrlRecord>(
            r#"
            SELECT * FROM short_urls
            WHERE target_url = $1
            "#,
        )
        .bind(target_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result)
    }

    async fn find_by_alias(&self, alias: &str) -> AppResult<Option<ShortUrlRecord>> {
        let result = sqlx::query_as::<_, ShortUrlRecord>(
            r#"
            SELECT * FROM short_urls
            WHERE alias = $1
            "#,
        )
        .bind(alias)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result)
    }

    async fn insert(&self, alias: &str, target_url: &str) -> AppResult<ShortUrlRecord> {
        sqlx::query_as::<_, ShortUrlRecord>(
            r#"
            INSERT INTO short_urls (alias, target_url)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(alias)
        .bind(target_url)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)
    }

    async fn exists_alias(&self, alias: &str) -> AppResult<bool> {
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM short_urls WHERE alias = $1)
            "#,
        )
        .bind(alias)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    async fn set_flagged(&self, alias: &str, flagged: bool) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE short_urls
            SET is_flagged = $1
            WHERE alias = $2 AND is_flagged <> $1
            "#,
        )
        .bind(flagged)
        .bind(alias)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn stats(&self) -> AppResult<StoreStats> {
        let row = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT
                COUNT(*) as total_records,
                COUNT(*) FILTER (WHERE is_flagged) as flagged_records
            FROM short_urls
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(StoreStats {
            total_records: row.0,
            flagged_records: row.1,
        })
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}
