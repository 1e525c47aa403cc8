use crate::error::{AppError, AppResult};
use crate::middleware::RequestContext;
use crate::models::{
    ErrorResponse, PreviewResponse, RegisterUrlRequest, RegisterUrlResponse, ShortUrlRecord,
};
use crate::services::reputation::PREVIEW_WARNING;
use crate::target::TargetUrl;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Redirect};
use axum::Extension;
use std::sync::Arc;
use validator::{Validate, ValidationErrors};

use super::AppState;

/// First field message, so request checks read like `TargetUrl::parse` errors
fn validation_message(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|field| field.iter())
        .find_map(|error| error.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| errors.to_string())
}

/// Shorten a URL
///
/// Registering a target that is already known returns its existing alias
/// with `200 OK`; a new registration answers `201 Created`.
#[utoipa::path(
    post,
    path = "/",
    tag = "urls",
    request_body = RegisterUrlRequest,
    responses(
        (status = 201, description = "Alias created", body = RegisterUrlResponse),
        (status = 200, description = "Target already registered", body = RegisterUrlResponse),
        (status = 400, description = "Invalid or rejected URL", body = ErrorResponse),
        (status = 503, description = "Reputation service unavailable", body = ErrorResponse)
    )
)]
pub async fn register_url(
    State(state): State<Arc<AppState>>,
    Extension(context): Extension<RequestContext>,
    payload: Result<Json<RegisterUrlRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload.map_err(|e| AppError::InvalidUrl(e.body_text()))?;

    payload
        .validate()
        .map_err(|e| AppError::InvalidUrl(validation_message(&e)))?;

    let target = TargetUrl::parse(&payload.url)?;

    state.reputation.check_for_registration(&target).await?;

    let allocation = state.allocator.get_or_create_alias(&target).await?;

    tracing::info!(
        request_id = %context.request_id,
        client_ip = %context.client_ip,
        user_agent = context.user_agent.as_deref().unwrap_or("-"),
        alias = %allocation.alias(),
        created = allocation.created,
        "Registered URL"
    );

    if let Some(cache) = &state.cache {
        if let Err(e) = cache.set_record(&allocation.record).await {
            tracing::warn!(alias = %allocation.alias(), error = %e, "Failed to cache record");
        }
    }

    let status = if allocation.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    let alias = allocation.record.alias;
    let response = RegisterUrlResponse {
        short_url: state.short_url(&alias),
        preview_url: state.preview_url(&alias),
        target_url: allocation.record.target_url,
        alias,
    };

    Ok((status, Json(response)))
}

/// Redirect an alias to its target
#[utoipa::path(
    get,
    path = "/{alias}",
    tag = "urls",
    params(("alias" = String, Path, description = "Short alias")),
    responses(
        (status = 307, description = "Redirect to the target URL"),
        (status = 404, description = "Unknown alias", body = ErrorResponse)
    )
)]
pub async fn redirect_alias(
    State(state): State<Arc<AppState>>,
    Path(alias): Path<String>,
) -> AppResult<impl IntoResponse> {
    let record = lookup_record(&state, &alias).await?;

    Ok(Redirect::temporary(&record.target_url))
}

/// Preview the target behind an alias with a fresh reputation verdict
#[utoipa::path(
    get,
    path = "/preview/{alias}",
    tag = "urls",
    params(("alias" = String, Path, description = "Short alias")),
    responses(
        (status = 200, description = "Target and current verdict", body = PreviewResponse),
        (status = 404, description = "Unknown alias", body = ErrorResponse),
        (status = 503, description = "Reputation service unavailable", body = ErrorResponse)
    )
)]
pub async fn preview_alias(
    State(state): State<Arc<AppState>>,
    Path(alias): Path<String>,
) -> AppResult<impl IntoResponse> {
    let record = lookup_record(&state, &alias).await?;

    let target = TargetUrl::parse(&record.target_url).map_err(|e| {
        AppError::Internal(format!("Stored target for {} is invalid: {}", record.alias, e))
    })?;

    let verdict = state.reputation.check_reputation_for_preview(&target).await?;
    let flagged = !verdict.is_clean();

    if flagged != record.is_flagged {
        state.store.set_flagged(&record.alias, flagged).await?;
        if let Some(cache) = &state.cache {
            if let Err(e) = cache.delete_record(&record.alias).await {
                tracing::warn!(alias = %record.alias, error = %e, "Failed to invalidate cache");
            }
        }
    }

    let response = PreviewResponse {
        short_url: state.short_url(&record.alias),
        alias: record.alias,
        target_url: record.target_url,
        verdict,
        flagged,
        warning: flagged.then(|| PREVIEW_WARNING.to_string()),
    };

    Ok(Json(response))
}

/// Resolve a user-supplied alias, reading through the cache when enabled
async fn lookup_record(state: &AppState, alias: &str) -> AppResult<ShortUrlRecord> {
    let normalized = state
        .allocator
        .factory()
        .from_string(alias)
        .map_err(|_| AppError::AliasNotFound(alias.to_string()))?;

    if let Some(cache) = &state.cache {
        match cache.get_record(&normalized).await {
            Ok(Some(record)) => return Ok(record),
            Ok(None) => {}
            Err(e) => tracing::warn!(alias = %normalized, error = %e, "Cache lookup failed"),
        }
    }

    let record = state.allocator.resolve(&normalized).await?;

    if let Some(cache) = &state.cache {
        if let Err(e) = cache.set_record(&record).await {
            tracing::warn!(alias = %record.alias, error = %e, "Failed to cache record");
        }
    }

    Ok(record)
}
