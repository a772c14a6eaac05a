//! Gateway Middleware (C9): rate limiting, malicious-input filtering, SSRF
//! protection, and origin/key access control, applied to every request in
//! the order laid out in §4.9.

pub mod access_control;
pub mod input_filter;
pub mod rate_limit;
pub mod ssrf;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::config::{RateLimitConfig, SecurityConfig};
use crate::model::ResponseMeta;
pub use rate_limit::RateLimiter;

/// Shared, cheaply-cloneable state every middleware layer reads from.
#[derive(Clone)]
pub struct MiddlewareState {
    pub rate_limiter: RateLimiter,
    pub rate_limit_enabled: bool,
    pub security: Arc<SecurityConfig>,
}

impl MiddlewareState {
    pub fn new(rate_limit: &RateLimitConfig, security: SecurityConfig) -> Self {
        Self {
            rate_limiter: RateLimiter::new(rate_limit.max_requests, rate_limit.window),
            rate_limit_enabled: rate_limit.enabled,
            security: Arc::new(security),
        }
    }

    pub fn spawn_rate_limiter_sweeper(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let limiter = self.rate_limiter.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                limiter.sweep().await;
            }
        })
    }
}

fn error_response(status: StatusCode, code: &'static str, message: &str) -> Response {
    (
        status,
        Json(json!({
            "success": false,
            "error": { "code": code, "message": message },
            "meta": ResponseMeta::instant(),
        })),
    )
        .into_response()
}

pub async fn rate_limit_middleware(
    State(state): State<MiddlewareState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    if !state.rate_limit_enabled {
        return next.run(request).await;
    }

    match state.rate_limiter.check(addr.ip()).await {
        rate_limit::Decision::Allowed => next.run(request).await,
        rate_limit::Decision::Limited { retry_after_secs } => {
            let mut response = error_response(
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                &format!("Rate limited, retry after {retry_after_secs}s"),
            );
            response
                .headers_mut()
                .insert(axum::http::header::RETRY_AFTER, retry_after_secs.into());
            response
        }
    }
}

/// Path is always scanned; the query string is scanned too unless the route
/// is one of the long-signed-URL delivery endpoints.
pub async fn input_filter_middleware(uri: Uri, request: Request, next: Next) -> Response {
    let path = uri.path();
    if let Some(violation) = input_filter::scan(path) {
        tracing::warn!(?violation, path, "blocked malicious path");
        return error_response(StatusCode::FORBIDDEN, "FORBIDDEN", "forbidden pattern");
    }

    if !input_filter::query_scan_exempt(path) {
        if let Some(query) = uri.query() {
            if let Some(violation) = input_filter::scan(query) {
                tracing::warn!(?violation, path, "blocked malicious query");
                return error_response(StatusCode::FORBIDDEN, "FORBIDDEN", "forbidden pattern");
            }
        }
    }

    next.run(request).await
}

/// Query keys that carry a URL passed straight through to an upstream fetch
/// or ffmpeg invocation: `url` (`/stream`, `/download`, `/thumbnail`,
/// `/hls-proxy`), `videoUrl`/`audioUrl` (`/merge`), and `audioUrl`
/// (`/hls-stream`). Every one of them needs the same SSRF check before the
/// request reaches its handler.
const UPSTREAM_URL_PARAMS: &[&str] = &["url", "videoUrl", "audioUrl"];

/// Maps an internal blocklist reason to its caller-facing message. `"blocked
/// host"` gets the wording E4 documents; the other, pre-blocklist rejection
/// reasons (malformed URL, bad scheme, missing host) are passed through as-is.
fn ssrf_rejection_message(reason: &'static str) -> &'static str {
    match reason {
        "blocked host" => "Internal hosts not allowed",
        other => other,
    }
}

/// Validates every upstream URL query parameter against the SSRF blocklist.
/// Endpoints with none of `UPSTREAM_URL_PARAMS` present (e.g. `?h=<hash>`
/// lookups) pass through untouched; the registry lookup that follows can't
/// resolve to anything that wasn't already validated when it was added.
pub async fn ssrf_middleware(
    State(state): State<MiddlewareState>,
    uri: Uri,
    request: Request,
    next: Next,
) -> Response {
    if let Some(query) = uri.query() {
        let pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        for param in UPSTREAM_URL_PARAMS {
            for (key, value) in &pairs {
                if key != param {
                    continue;
                }
                if let Err(reason) = ssrf::validate_upstream_url(value, &state.security.extra_blocked_hosts) {
                    tracing::warn!(url = %value, reason, "blocked SSRF target");
                    return error_response(
                        StatusCode::BAD_REQUEST,
                        "INVALID_URL",
                        ssrf_rejection_message(reason),
                    );
                }
            }
        }
    }

    next.run(request).await
}

pub async fn access_control_middleware(
    State(state): State<MiddlewareState>,
    headers: HeaderMap,
    uri: Uri,
    request: Request,
    next: Next,
) -> Response {
    if access_control::is_public_route(uri.path()) {
        return next.run(request).await;
    }

    let api_key = headers.get("x-api-key").and_then(|v| v.to_str().ok());
    let origin = headers.get(axum::http::header::ORIGIN).and_then(|v| v.to_str().ok());
    let referer = headers.get(axum::http::header::REFERER).and_then(|v| v.to_str().ok());

    if access_control::is_allowed(
        api_key,
        origin,
        referer,
        &state.security.api_keys,
        &state.security.allowed_origins,
    ) {
        next.run(request).await
    } else {
        error_response(StatusCode::FORBIDDEN, "FORBIDDEN", "forbidden origin")
    }
}

/// Used by `main.rs`'s router fallback to keep unmatched routes consistent
/// with the rest of the error envelope shape instead of axum's default body.
pub async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "NOT_FOUND", "no such route")
}
