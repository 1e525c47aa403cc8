use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// The unique column a failed insert collided on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictField {
    Alias,
    Target,
}

impl fmt::Display for ConflictField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictField::Alias => write!(f, "alias"),
            ConflictField::Target => write!(f, "target_url"),
        }
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Redis pool error: {0}")]
    RedisPool(#[from] deadpool_redis::PoolError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Alias not found: {0}")]
    AliasNotFound(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid alias: {0}")]
    InvalidAlias(String),

    #[error("{0}")]
    UrlRejected(String),

    #[error("Unique constraint violated on {0}")]
    UniqueConflict(ConflictField),

    #[error("Alias allocation exhausted after {0} attempts")]
    AllocationExhausted(u32),

    #[error("Reputation check failed: {0}")]
    ReputationCheckFailed(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Environment variable missing: {0}")]
    MissingEnvVar(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Status code and machine-readable code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::AliasNotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::InvalidUrl(_) => (StatusCode::BAD_REQUEST, "INVALID_URL"),
            AppError::InvalidAlias(_) => (StatusCode::BAD_REQUEST, "INVALID_ALIAS"),
            AppError::UrlRejected(_) => (StatusCode::BAD_REQUEST, "URL_REJECTED"),
            AppError::AllocationExhausted(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "ALLOCATION_EXHAUSTED")
            }
            AppError::ReputationCheckFailed(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "REPUTATION_UNAVAILABLE")
            }
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            AppError::Migration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "MIGRATION_ERROR"),
            AppError::Redis(_) | AppError::RedisPool(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CACHE_ERROR")
            }
            AppError::Serialization(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "SERIALIZATION_ERROR")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

/// Convert AppError to HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();

        let error_message = match &self {
            AppError::AliasNotFound(_)
            | AppError::InvalidUrl(_)
            | AppError::InvalidAlias(_)
            | AppError::UrlRejected(_) => self.to_string(),
            AppError::AllocationExhausted(attempts) => {
                tracing::error!(
                    attempts,
                    "Alias space exhausted, widen ALIAS_MIN_LEN/ALIAS_MAX_LEN"
                );
                "Could not allocate a short alias".to_string()
            }
            AppError::ReputationCheckFailed(reason) => {
                tracing::warn!("Reputation check failed: {}", reason);
                "The URL could not be verified right now, please try again".to_string()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error occurred".to_string()
            }
            AppError::Migration(e) => {
                tracing::error!("Migration error: {:?}", e);
                "Migration error occurred".to_string()
            }
            AppError::Redis(e) => {
                tracing::error!("Redis error: {:?}", e);
                "Cache error occurred".to_string()
            }
            AppError::RedisPool(e) => {
                tracing::error!("Redis pool error: {:?}", e);
                "Cache error occurred".to_string()
            }
            AppError::Serialization(e) => {
                tracing::error!("Serialization error: {:?}", e);
                "Data serialization error".to_string()
            }
            _ => {
                tracing::error!("Internal error: {}", self);
                "An internal error occurred".to_string()
            }
        };

        let body = json!({
            "error": error_code,
            "message": error_message,
        });

        (status, Json(body)).into_response()
    }
}

/// Result type alias for AppResult
pub type AppResult<T> = Result<T, AppError>;
