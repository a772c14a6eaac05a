//! `POST /extract` (§6): resolves a platform URL to its `ExtractResult`
//! envelope, resolving server-side credentials and stamping response meta
//! along the way.

use std::time::Instant;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use crate::config::ServerCookies;
use crate::errors::{GatewayError, GatewayResult};
use crate::extractors::ExtractOptions;
use crate::model::{AccessMode, ExtractResult};
use crate::normalize;
use crate::web::AppState;

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub url: String,
    #[serde(default)]
    pub cookie: Option<String>,
}

/// The process's own credential for the platform `url` belongs to, if one
/// is configured (tier B, §4.4). `None` for platforms with no server
/// credential concept (TikTok, Pixiv, wrapper-backed platforms).
fn server_cookie_for(url: &str, cookies: &ServerCookies) -> Option<String> {
    if url.contains("facebook.com") || url.contains("fb.watch") || url.contains("fb.me") {
        cookies.facebook.clone()
    } else if url.contains("instagram.com") {
        cookies.instagram.clone()
    } else if url.contains("twitter.com") || url.contains("x.com") {
        cookies.twitter.clone()
    } else {
        None
    }
}

/// `/extract` is itself a public route (bypasses origin/key gating), so
/// whether this particular call presented a valid key still has to be
/// checked here to report an accurate `meta.accessMode`.
fn access_mode_for(headers: &HeaderMap, api_keys: &[String]) -> AccessMode {
    let presented = headers.get("x-api-key").and_then(|v| v.to_str().ok());
    match presented {
        Some(key) if api_keys.iter().any(|k| k == key) => AccessMode::ApiKey,
        _ => AccessMode::Public,
    }
}

pub async fn extract(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ExtractRequest>,
) -> GatewayResult<Json<ExtractResult>> {
    let started = Instant::now();

    if req.url.trim().is_empty() {
        return Err(GatewayError::MissingParameter("url"));
    }
    url::Url::parse(&req.url).map_err(|_| GatewayError::InvalidUrl(req.url.clone()))?;

    let opts = ExtractOptions {
        cookie: req.cookie.clone(),
        server_cookie: server_cookie_for(&req.url, &state.config.extraction.server_cookies),
    };

    let result = state.extractors.extract(&state.transport, &req.url, &opts).await?;

    let mode = access_mode_for(&headers, &state.config.security.api_keys);
    let normalized = normalize::normalize(result, &state.registry, started, mode).await;
    Ok(Json(normalized))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_the_configured_cookie_for_each_native_platform() {
        let cookies = ServerCookies {
            facebook: Some("fb-cookie".into()),
            instagram: Some("ig-cookie".into()),
            twitter: Some("tw-cookie".into()),
        };
        assert_eq!(
            server_cookie_for("https://www.facebook.com/watch/?v=1", &cookies),
            Some("fb-cookie".to_string())
        );
        assert_eq!(
            server_cookie_for("https://www.instagram.com/p/abc/", &cookies),
            Some("ig-cookie".to_string())
        );
        assert_eq!(
            server_cookie_for("https://x.com/jack/status/20", &cookies),
            Some("tw-cookie".to_string())
        );
        assert_eq!(server_cookie_for("https://www.tiktok.com/@a/video/1", &cookies), None);
    }

    #[test]
    fn access_mode_reflects_a_valid_api_key() {
        let keys = vec!["secret".to_string()];
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "secret".parse().unwrap());
        assert_eq!(access_mode_for(&headers, &keys), AccessMode::ApiKey);

        let headers = HeaderMap::new();
        assert_eq!(access_mode_for(&headers, &keys), AccessMode::Public);
    }
}
