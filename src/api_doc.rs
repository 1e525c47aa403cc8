//! OpenAPI documentation served at `/_openapi.json`.

use utoipa::OpenApi;

use crate::models;
use crate::routes::{health, types, url_handlers};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "shorturl",
        description = "URL shortener with homoglyph-safe aliases and link reputation checks"
    ),
    paths(
        url_handlers::register_url,
        url_handlers::redirect_alias,
        url_handlers::preview_alias,
        health::health_check,
    ),
    components(schemas(
        models::RegisterUrlRequest,
        models::RegisterUrlResponse,
        models::PreviewResponse,
        models::ErrorResponse,
        types::HealthCheckResponse,
        types::HealthStatus,
    )),
    tags(
        (name = "urls", description = "Shortening, redirects and previews"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

/// The OpenAPI document with the crate version filled in
pub fn openapi_spec() -> utoipa::openapi::OpenApi {
    let mut spec = ApiDoc::openapi();
    spec.info.version = env!("CARGO_PKG_VERSION").to_string();
    spec
}
