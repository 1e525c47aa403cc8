use crate::error::AppResult;
use crate::routes::types::{HealthCheckResponse, HealthStatus};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use super::AppState;

const PROBE_TIMEOUT: StdDuration = StdDuration::from_secs(5);

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/_health",
    tag = "health",
    responses(
        (status = 200, description = "Store and cache status", body = HealthCheckResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    let start = Instant::now();
    let db_health = match tokio::time::timeout(PROBE_TIMEOUT, state.store.ping()).await {
        Ok(Ok(())) => HealthStatus::healthy(start.elapsed().as_millis() as u64),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Store health probe failed");
            HealthStatus::unhealthy()
        }
        Err(_) => HealthStatus::unhealthy(),
    };

    let cache_health = match &state.cache {
        Some(cache) => {
            let cache_start = Instant::now();
            match tokio::time::timeout(PROBE_TIMEOUT, cache.ping()).await {
                Ok(Ok(_)) => HealthStatus::healthy(cache_start.elapsed().as_millis() as u64),
                Ok(Err(_)) | Err(_) => HealthStatus::unhealthy(),
            }
        }
        None => HealthStatus::disabled(),
    };

    // The cache is optional for serving; only the store decides
    let overall_status = if db_health.is_healthy() {
        "healthy"
    } else {
        "degraded"
    };

    let response = HealthCheckResponse {
        status: overall_status.to_string(),
        database: db_health,
        cache: cache_health,
        timestamp: chrono::Utc::now(),
    };

    Ok(Json(response))
}
