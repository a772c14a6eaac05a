//! Wrapper bridge (C5): forwards extraction to the sibling `yt-dlp`/
//! `gallery-dl` HTTP service instead of running a native scanner.

use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

use crate::errors::GatewayError;
use crate::model::ExtractResult;
use crate::transport::{FetchOptions, HttpTransport};

use super::traits::{ExtractOptions, ExtractOutcome, Extractor};

/// Platforms known to carry NSFW content; `isNsfw` is stamped for these
/// regardless of what the wrapper service itself reports.
const NSFW_WRAPPER_PLATFORMS: &[&str] = &["pornhub", "xvideos", "redgifs"];

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:youtube\.com|youtu\.be|bilibili\.com|soundcloud\.com|reddit\.com|pinterest\.com|pornhub\.com|xvideos\.com|redgifs\.com)",
    )
    .unwrap()
});

#[derive(Debug, serde::Serialize)]
struct WrapperRequest<'a> {
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cookie: Option<&'a str>,
}

pub struct WrapperExtractor {
    base_url: String,
}

impl WrapperExtractor {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }

    /// Resolution order for the bridge target (§4.5): explicit config,
    /// `PYTHON_API_URL`, its public variant, then the documented fallback.
    pub fn resolve_base_url(configured: Option<&str>) -> String {
        if let Some(url) = configured {
            return url.to_string();
        }
        if let Ok(url) = std::env::var("PYTHON_API_URL") {
            return url;
        }
        if let Ok(url) = std::env::var("PYTHON_API_PUBLIC_URL") {
            return url;
        }
        "http://127.0.0.1:5000".to_string()
    }

    fn platform_from_url(url: &str) -> &'static str {
        if url.contains("youtube.com") || url.contains("youtu.be") {
            "youtube"
        } else if url.contains("bilibili.com") {
            "bilibili"
        } else if url.contains("soundcloud.com") {
            "soundcloud"
        } else if url.contains("reddit.com") {
            "reddit"
        } else if url.contains("pinterest.com") {
            "pinterest"
        } else if url.contains("pornhub.com") {
            "pornhub"
        } else if url.contains("xvideos.com") {
            "xvideos"
        } else if url.contains("redgifs.com") {
            "redgifs"
        } else {
            "unknown"
        }
    }
}

#[async_trait]
impl Extractor for WrapperExtractor {
    fn platform(&self) -> &'static str {
        "wrapper"
    }

    fn patterns(&self) -> &[Regex] {
        std::slice::from_ref(&*URL_RE)
    }

    async fn extract(
        &self,
        transport: &HttpTransport,
        url: &str,
        opts: &ExtractOptions,
    ) -> ExtractOutcome {
        let endpoint = format!("{}/extract", self.base_url.trim_end_matches('/'));
        let body = serde_json::to_string(&WrapperRequest {
            url,
            cookie: opts.cookie.as_deref(),
        })
        .map_err(|e| GatewayError::Internal(e.to_string()))?;

        let resp = transport
            .fetch_text(
                &endpoint,
                &FetchOptions {
                    method: reqwest::Method::POST,
                    headers: vec![
                        ("Content-Type".to_string(), "application/json".to_string()),
                    ],
                    ..Default::default()
                },
            )
            .await;

        let resp = match resp {
            Ok(r) => r,
            Err(_) => return Err(GatewayError::ExtractionFailed(body)),
        };

        let mut result: ExtractResult = serde_json::from_str(&resp.data)
            .map_err(|_| GatewayError::ExtractionFailed("malformed wrapper envelope".into()))?;

        if result.items.is_empty() {
            return Err(GatewayError::NoMediaFound);
        }

        let platform = Self::platform_from_url(url);
        result.platform = platform.to_string();
        if Self::is_nsfw_platform(platform) {
            result.is_nsfw = Some(true);
        }
        Ok(result)
    }
}

impl WrapperExtractor {
    pub fn is_nsfw_platform(platform: &str) -> bool {
        NSFW_WRAPPER_PLATFORMS.contains(&platform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifies_platform_from_url() {
        assert_eq!(
            WrapperExtractor::platform_from_url("https://www.youtube.com/watch?v=x"),
            "youtube"
        );
        assert_eq!(
            WrapperExtractor::platform_from_url("https://www.bilibili.com/video/BV1"),
            "bilibili"
        );
    }

    #[test]
    fn resolves_configured_url_before_env() {
        assert_eq!(
            WrapperExtractor::resolve_base_url(Some("http://configured:9000")),
            "http://configured:9000"
        );
    }

    #[test]
    fn flags_known_nsfw_platforms() {
        assert!(WrapperExtractor::is_nsfw_platform("pornhub"));
        assert!(!WrapperExtractor::is_nsfw_platform("youtube"));
    }
}
