use crate::config::{CorsConfig, RateLimitConfig};
use crate::error::{AppError, AppResult};
use crate::middleware::{request_context_middleware, request_id_middleware, ClientIpKeyExtractor};
use axum::middleware;
use axum::routing::{get, post};
use axum::Json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::GovernorLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::health;
use super::url_handlers;
use super::AppState;

/// Registration bodies carry one URL
const MAX_BODY_BYTES: usize = 16 * 1024;

/// Create application router
pub fn create_router(
    state: Arc<AppState>,
    cors_config: &CorsConfig,
    rate_limit_config: &RateLimitConfig,
) -> AppResult<axum::Router> {
    // Registration is the expensive path: reputation lookup plus insert
    let governor_config_strict = GovernorConfigBuilder::default()
        .per_millisecond(rate_limit_config.strict_period_ms())
        .burst_size(rate_limit_config.burst_size)
        .key_extractor(ClientIpKeyExtractor)
        .finish()
        .ok_or_else(|| {
            AppError::Configuration("Failed to build strict rate limiter".to_string())
        })?;

    let governor_config_lenient = GovernorConfigBuilder::default()
        .per_millisecond(rate_limit_config.lenient_period_ms())
        .burst_size(rate_limit_config.lenient_burst_size())
        .key_extractor(ClientIpKeyExtractor)
        .finish()
        .ok_or_else(|| {
            AppError::Configuration("Failed to build lenient rate limiter".to_string())
        })?;

    let cors = if cors_config.allows_any_origin() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<http::HeaderValue> = cors_config
            .allowed_origins
            .iter()
            .filter_map(|s| s.parse::<http::HeaderValue>().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let sensitive_routes = axum::Router::new()
        .route("/", post(url_handlers::register_url))
        .layer(GovernorLayer::new(governor_config_strict));

    let public_routes = axum::Router::new()
        .route("/{alias}", get(url_handlers::redirect_alias))
        .route("/preview/{alias}", get(url_handlers::preview_alias))
        .layer(GovernorLayer::new(governor_config_lenient));

    // No rate limiting
    let service_routes = axum::Router::new()
        .route("/_health", get(health::health_check))
        .route(
            "/_openapi.json",
            get(|| async { Json(crate::api_doc::openapi_spec()) }),
        );

    // The last layer runs first, so the request id exists before the context is built
    Ok(sensitive_routes
        .merge(public_routes)
        .merge(service_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
                .layer(cors),
        )
        .layer(middleware::from_fn(request_context_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state))
}
