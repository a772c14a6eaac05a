//! Router-level tests for behavior that only emerges once the middleware
//! stack and routes are wired together: deployment-profile gating (P12),
//! malicious-input/SSRF rejection at the edge (P9, P10), and rate limiting
//! (E5).

use std::time::Duration;

use axum_test::TestServer;
use media_gateway::config::{ExtractorProfile, GatewayConfig};
use media_gateway::web::{create_router, AppState};

fn test_state(configure: impl FnOnce(&mut GatewayConfig)) -> AppState {
    let mut config = GatewayConfig::default();
    configure(&mut config);
    AppState::new(config).expect("state construction should not require network access")
}

#[tokio::test]
async fn vercel_profile_rejects_wrapper_backed_platforms() {
    let state = test_state(|c| c.extraction.profile = ExtractorProfile::Vercel);
    let server = TestServer::new(create_router(state)).unwrap();

    let response = server
        .post("/extract")
        .json(&serde_json::json!({ "url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ" }))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn full_profile_reports_wrapper_backed_platforms_as_supported() {
    let state = test_state(|c| {
        c.extraction.profile = ExtractorProfile::Full;
        c.security.api_keys = vec!["test-key".to_string()];
    });
    let server = TestServer::new(create_router(state)).unwrap();

    let response = server.get("/status").add_header("x-api-key", "test-key").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let extractors = body["extractors"].as_array().unwrap();
    assert!(extractors.iter().any(|p| p == "youtube"));
}

#[tokio::test]
async fn stream_rejects_a_private_ip_target() {
    let state = test_state(|_| {});
    let server = TestServer::new(create_router(state)).unwrap();

    let response = server
        .get("/stream")
        .add_query_param("url", "http://169.254.169.254/latest/meta-data/")
        .await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malicious_path_is_blocked_before_routing() {
    let state = test_state(|_| {});
    let server = TestServer::new(create_router(state)).unwrap();

    let response = server.get("/etc/passwd").await;
    response.assert_status(axum::http::StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let state = test_state(|_| {});
    let server = TestServer::new(create_router(state)).unwrap();

    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn requests_past_the_configured_rate_limit_receive_429() {
    let state = test_state(|c| {
        c.rate_limit.enabled = true;
        c.rate_limit.max_requests = 3;
        c.rate_limit.window = Duration::from_secs(60);
    });
    let server = TestServer::new(create_router(state)).unwrap();

    for _ in 0..3 {
        server.get("/health").await.assert_status_ok();
    }
    let limited = server.get("/health").await;
    limited.assert_status(axum::http::StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn extract_rejects_an_unsupported_platform() {
    let state = test_state(|_| {});
    let server = TestServer::new(create_router(state)).unwrap();

    let response = server
        .post("/extract")
        .json(&serde_json::json!({ "url": "https://example.com/not-a-platform" }))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn extract_rejects_a_missing_url() {
    let state = test_state(|_| {});
    let server = TestServer::new(create_router(state)).unwrap();

    let response = server.post("/extract").json(&serde_json::json!({ "url": "" })).await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}
