//! Web layer (§4.9, §6): shared [`AppState`] plus route/middleware wiring.
//!
//! Handlers stay thin: each one resolves its target through [`AppState`]
//! and delegates the actual work to `extractors`, `delivery`, or
//! `normalize`.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::config::GatewayConfig;
use crate::errors::GatewayResult;
use crate::extractors::ExtractorRegistry;
use crate::middleware::{self, MiddlewareState};
use crate::registry::UrlRegistry;
use crate::transport::HttpTransport;

/// Shared application state, cloned into every handler via axum's `State`
/// extractor. Cheap to clone: every field is an `Arc`, a `Clone`-able
/// connection-pool-style handle, or a `Copy` timestamp.
#[derive(Clone)]
pub struct AppState {
    pub transport: HttpTransport,
    pub extractors: Arc<ExtractorRegistry>,
    pub registry: UrlRegistry,
    pub config: Arc<GatewayConfig>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        let transport = HttpTransport::new(&config.transport, &config.server.user_agent)?;
        let extractors = Arc::new(ExtractorRegistry::new(&config.extraction));
        let registry = UrlRegistry::new(config.registry.ttl);

        Ok(Self {
            transport,
            extractors,
            registry,
            config: Arc::new(config),
            started_at: Instant::now(),
        })
    }
}

/// Builds the router with every route wired up and the full middleware
/// stack applied in the order §4.9 requires.
///
/// `axum::Router::layer` wraps outside-in: the *last* `.layer()` call ends
/// up outermost, running first. To get rate limiting → input filtering →
/// SSRF validation → access control (in that order of execution), the
/// calls below are written innermost-first: access control, then SSRF,
/// then input filtering, then rate limiting last.
pub fn create_router(state: AppState) -> Router {
    let middleware_state = MiddlewareState::new(&state.config.rate_limit, state.config.security.clone());
    middleware_state.spawn_rate_limiter_sweeper(Duration::from_secs(60));

    let router = Router::new()
        .route("/extract", post(handlers::extract::extract))
        .route("/stream", get(handlers::delivery::stream_handler))
        .route("/download", get(handlers::delivery::download))
        .route("/thumbnail", get(handlers::delivery::thumbnail_handler))
        .route("/hls-proxy", get(handlers::delivery::hls_proxy))
        .route("/hls-stream", get(handlers::delivery::hls_stream))
        .route("/merge", get(handlers::delivery::merge_handler))
        .route("/status", get(handlers::status::status))
        .route("/health", get(handlers::status::health))
        .route("/events", get(handlers::status::events))
        .route("/changelog", get(handlers::status::changelog))
        .with_state(state);

    router
        .layer(from_fn_with_state(middleware_state.clone(), middleware::access_control_middleware))
        .layer(from_fn_with_state(middleware_state.clone(), middleware::ssrf_middleware))
        .layer(from_fn(middleware::input_filter_middleware))
        .layer(from_fn_with_state(middleware_state, middleware::rate_limit_middleware))
        .layer(CorsLayer::permissive())
        .fallback(middleware::not_found)
}
