use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::reputation::Verdict;

/// Short URL record in the store
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ShortUrlRecord {
    pub id: i64,
    pub alias: String,
    pub target_url: String,
    /// Verdict seen on the latest preview, informational only
    pub is_flagged: bool,
    pub created_at: DateTime<Utc>,
}

/// Request to shorten a URL
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUrlRequest {
    /// Parsed and normalized by `TargetUrl::parse`; only the raw size is checked here
    #[validate(length(max = 2083, message = "URL must not be longer than 2083 characters"))]
    pub url: String,
}

/// Response after registering a URL
#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterUrlResponse {
    pub alias: String,
    pub short_url: String,
    pub preview_url: String,
    pub target_url: String,
}

/// Preview of the target behind an alias
#[derive(Debug, Serialize, ToSchema)]
pub struct PreviewResponse {
    pub alias: String,
    pub short_url: String,
    pub target_url: String,
    #[schema(value_type = String, example = "clean")]
    pub verdict: Verdict,
    pub flagged: bool,
    pub warning: Option<String>,
}

/// Error response body
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
