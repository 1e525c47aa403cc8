//! Integration tests for the HTTP API.
//!
//! The router runs against the in-memory record store and a switchable
//! reputation checker, so no database, cache or outside network is needed.
//! Redirect checks use a redirector bound to the loopback interface.

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use shorturl::config::{AliasConfig, CorsConfig, RateLimitConfig, DEFAULT_ALPHABET};
use shorturl::reputation::{
    CheckerChain, HostList, HostListChecker, RedirectFollowingChecker, RedirectResolver,
    ReputationChecker, StaticChecker, Verdict,
};
use shorturl::routes::{create_router, AppState};
use shorturl::services::{AliasAllocator, ReputationGuard};
use shorturl::store::{MemoryRecordStore, RecordStore};
use std::sync::Arc;
use std::time::Duration;

const BASE_URL: &str = "https://sho.rt";

struct TestApp {
    server: TestServer,
    checker: Arc<StaticChecker>,
    store: Arc<MemoryRecordStore>,
}

fn spawn_app() -> TestApp {
    spawn_app_with(|chain| chain)
}

/// Build the app with `wrap` applied around the test checker chain
fn spawn_app_with(
    wrap: impl FnOnce(Arc<dyn ReputationChecker>) -> Arc<dyn ReputationChecker>,
) -> TestApp {
    let store = Arc::new(MemoryRecordStore::new());
    let checker = Arc::new(StaticChecker::new(Verdict::Clean));

    let chain = CheckerChain::new()
        .with_checker(Arc::new(HostListChecker::new(HostList::new(
            "test blacklist",
            &["evil.test"],
        ))))
        .with_checker(checker.clone());
    let guard = ReputationGuard::new(wrap(Arc::new(chain)), Duration::from_secs(3));

    let alias_config = AliasConfig {
        min_len: 4,
        max_len: 6,
        alphabet: DEFAULT_ALPHABET.to_string(),
        max_attempts: 10,
        conflict_warn_limit: 3,
    };
    let allocator = AliasAllocator::new(store.clone(), &alias_config).unwrap();

    let state = Arc::new(AppState::new(allocator, guard, store.clone(), None, BASE_URL));
    let rate_limit = RateLimitConfig {
        requests_per_minute: 30_000,
        burst_size: 10_000,
    };
    let cors = CorsConfig {
        allowed_origins: vec!["*".to_string()],
    };
    let router = create_router(state, &cors, &rate_limit).unwrap();

    TestApp {
        server: TestServer::new(router).unwrap(),
        checker,
        store,
    }
}

async fn register(app: &TestApp, url: &str) -> (StatusCode, Value) {
    let response = app.server.post("/").json(&json!({ "url": url })).await;
    (response.status_code(), response.json::<Value>())
}

fn alias_of(body: &Value) -> String {
    body["alias"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_register_returns_created_with_links() {
    let app = spawn_app();

    let (status, body) = register(&app, "https://Example.com/path?q=1#section").await;

    assert_eq!(status, StatusCode::CREATED);
    let alias = alias_of(&body);
    assert!((4..=6).contains(&alias.len()));
    assert!(alias.chars().all(|c| DEFAULT_ALPHABET.contains(c)));
    assert_eq!(body["short_url"], format!("{}/{}", BASE_URL, alias));
    assert_eq!(body["preview_url"], format!("{}/preview/{}", BASE_URL, alias));
    assert_eq!(body["target_url"], "https://example.com/path?q=1");
}

#[tokio::test]
async fn test_registering_same_target_reuses_alias() {
    let app = spawn_app();

    let (first_status, first) = register(&app, "https://example.com/a").await;
    let (second_status, second) = register(&app, "https://example.com/a#other").await;

    assert_eq!(first_status, StatusCode::CREATED);
    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(alias_of(&first), alias_of(&second));
    assert_eq!(app.store.stats().await.unwrap().total_records, 1);
}

#[tokio::test]
async fn test_distinct_targets_get_distinct_aliases() {
    let app = spawn_app();
    let mut aliases = std::collections::HashSet::new();

    for i in 0..25 {
        let (status, body) = register(&app, &format!("https://example.com/page/{}", i)).await;
        assert_eq!(status, StatusCode::CREATED);
        aliases.insert(alias_of(&body));
    }

    assert_eq!(aliases.len(), 25);
}

#[tokio::test]
async fn test_redirect_to_target() {
    let app = spawn_app();
    let (_, body) = register(&app, "https://example.com/landing").await;

    let response = app.server.get(&format!("/{}", alias_of(&body))).await;

    response.assert_status(StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.header("location"), "https://example.com/landing");
}

#[tokio::test]
async fn test_redirect_accepts_homoglyphs() {
    let app = spawn_app();
    let (_, body) = register(&app, "https://example.com/typed").await;

    // `1` and `6` are the kept forms of `l` and `b` in the default alphabet
    let typed = alias_of(&body).replace('1', "l").replace('6', "b");
    let response = app.server.get(&format!("/{}", typed)).await;

    response.assert_status(StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.header("location"), "https://example.com/typed");
}

#[tokio::test]
async fn test_unknown_alias_is_not_found() {
    let app = spawn_app();

    for path in ["/zzzz", "/no_such", "/preview/zzzz"] {
        let response = app.server.get(path).await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["error"], "NOT_FOUND");
    }
}

#[tokio::test]
async fn test_invalid_urls_are_rejected() {
    let app = spawn_app();

    for url in ["", "not a url", "ftp://example.com/file", "https://"] {
        let (status, body) = register(&app, url).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "url {:?}", url);
        assert_eq!(body["error"], "INVALID_URL");
    }

    let response = app.server.post("/").json(&json!({ "link": "x" })).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "INVALID_URL");

    assert_eq!(app.store.stats().await.unwrap().total_records, 0);
}

async fn spawn_redirector() -> String {
    use axum::response::Redirect;
    use axum::routing::get;

    let app = axum::Router::new()
        .route("/go", get(|| async { Redirect::temporary("http://evil.test/phish") }))
        .route("/landing", get(|| async { "welcome" }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_redirect_to_blacklisted_host_is_refused() {
    let base = spawn_redirector().await;
    let app = spawn_app_with(|chain| {
        let resolver = RedirectResolver::new(5, Duration::from_secs(2)).unwrap();
        Arc::new(RedirectFollowingChecker::new(chain, resolver))
    });

    let (status, body) = register(&app, &format!("{}/go", base)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "URL_REJECTED");

    let (status, _) = register(&app, &format!("{}/landing", base)).await;
    assert_eq!(status, StatusCode::CREATED);

    assert_eq!(app.store.stats().await.unwrap().total_records, 1);
}

#[tokio::test]
async fn test_invalid_url_messages_come_from_target_parsing() {
    let app = spawn_app();

    for url in ["", "   "] {
        let (_, body) = register(&app, url).await;
        assert_eq!(body["message"], "Invalid URL: A target URL is required");
    }

    let (_, body) = register(&app, "not a url").await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid URL: A valid URL is required"));

    let (_, body) = register(&app, "https://").await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid URL: A valid URL is required"));

    let long = format!("https://example.com/{}", "a".repeat(2083));
    let (status, body) = register(&app, &long).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Invalid URL: URL must not be longer than 2083 characters"
    );
}

#[tokio::test]
async fn test_blacklisted_and_spam_urls_are_refused() {
    let app = spawn_app();

    let (status, body) = register(&app, "https://www.evil.test/login").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "URL_REJECTED");
    assert_eq!(body["message"], "The URL has been recognized as spam.");

    app.checker.set_verdict(Verdict::Spam);
    let (status, body) = register(&app, "https://example.com/spam").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "URL_REJECTED");

    assert_eq!(app.store.stats().await.unwrap().total_records, 0);
}

#[tokio::test]
async fn test_unavailable_reputation_fails_registration() {
    let app = spawn_app();
    app.checker.set_failing();

    let (status, body) = register(&app, "https://example.com/unverified").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "REPUTATION_UNAVAILABLE");
    assert_eq!(app.store.stats().await.unwrap().total_records, 0);
}

#[tokio::test]
async fn test_preview_reflects_current_verdict() {
    let app = spawn_app();
    let (_, body) = register(&app, "https://example.com/turns-bad").await;
    let alias = alias_of(&body);

    let preview = app.server.get(&format!("/preview/{}", alias)).await;
    preview.assert_status_ok();
    let preview = preview.json::<Value>();
    assert_eq!(preview["verdict"], "clean");
    assert_eq!(preview["flagged"], false);
    assert!(preview["warning"].is_null());
    assert_eq!(preview["target_url"], "https://example.com/turns-bad");

    app.checker.set_verdict(Verdict::Spam);

    let preview = app
        .server
        .get(&format!("/preview/{}", alias))
        .await
        .json::<Value>();
    assert_eq!(preview["verdict"], "spam");
    assert_eq!(preview["flagged"], true);
    assert!(preview["warning"].as_str().unwrap().contains("spam"));

    let record = app.store.find_by_alias(&alias).await.unwrap().unwrap();
    assert!(record.is_flagged);

    // Redirects keep working for flagged records
    app.server
        .get(&format!("/{}", alias))
        .await
        .assert_status(StatusCode::TEMPORARY_REDIRECT);

    app.checker.set_verdict(Verdict::Clean);
    let preview = app
        .server
        .get(&format!("/preview/{}", alias))
        .await
        .json::<Value>();
    assert_eq!(preview["flagged"], false);
    assert!(!app.store.find_by_alias(&alias).await.unwrap().unwrap().is_flagged);
}

#[tokio::test]
async fn test_preview_with_unavailable_reputation() {
    let app = spawn_app();
    let (_, body) = register(&app, "https://example.com/later").await;
    app.checker.set_failing();

    let response = app.server.get(&format!("/preview/{}", alias_of(&body))).await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.json::<Value>()["error"], "REPUTATION_UNAVAILABLE");
}

#[tokio::test]
async fn test_health_reports_store_and_disabled_cache() {
    let app = spawn_app();

    let response = app.server.get("/_health").await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"]["status"], "healthy");
    assert_eq!(body["cache"]["status"], "disabled");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = spawn_app();

    let response = app.server.get("/_openapi.json").await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert!(body["paths"]["/preview/{alias}"].is_object());
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = spawn_app();

    let response = app
        .server
        .get("/_health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("req-42"),
        )
        .await;
    assert_eq!(response.header("x-request-id"), "req-42");

    let response = app.server.get("/_health").await;
    assert_eq!(response.header("x-request-id").len(), 36);
}
