//! TikTok extractor: a single external helper API call, no credentials.
//! Handles both single videos and image slideshows.

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::errors::{GatewayError, GatewayResult};
use crate::model::{EngagementStats, ExtractResult, MediaItem, MediaKind, MediaSource};
use crate::transport::{FetchOptions, HttpTransport};

use super::traits::{ExtractOptions, ExtractOutcome, Extractor};

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"tiktok\.com/.*?/video/(\d+)|vm\.tiktok\.com/").unwrap());

const HELPER_API_BASE: &str = "https://www.tikwm.com/api/";

pub struct TikTokExtractor;

impl TikTokExtractor {
    async fn fetch_helper(transport: &HttpTransport, url: &str) -> GatewayResult<Value> {
        let endpoint = format!("{HELPER_API_BASE}?url={}&hd=1", urlencoding::encode(url));
        let resp = transport.fetch_text(&endpoint, &FetchOptions::default()).await?;
        let parsed: Value = serde_json::from_str(&resp.data)
            .map_err(|_| GatewayError::ExtractionFailed("malformed helper response".into()))?;
        if parsed.get("code").and_then(|c| c.as_i64()) != Some(0) {
            return Err(GatewayError::NoMediaFound);
        }
        Ok(parsed)
    }
}

#[async_trait]
impl Extractor for TikTokExtractor {
    fn platform(&self) -> &'static str {
        "tiktok"
    }

    fn patterns(&self) -> &[Regex] {
        std::slice::from_ref(&*URL_RE)
    }

    async fn extract(
        &self,
        transport: &HttpTransport,
        url: &str,
        _opts: &ExtractOptions,
    ) -> ExtractOutcome {
        let parsed = Self::fetch_helper(transport, url).await?;
        let data = parsed.get("data").ok_or(GatewayError::NoMediaFound)?;

        let mut result = ExtractResult::new("tiktok", "video");
        result.source_url = Some(url.to_string());
        result.id = data.get("id").and_then(|v| v.as_str()).map(str::to_string);
        result.title = data.get("title").and_then(|v| v.as_str()).map(str::to_string);
        result.author = data
            .get("author")
            .and_then(|a| a.get("nickname"))
            .and_then(|v| v.as_str())
            .map(str::to_string);
        result.author_username = data
            .get("author")
            .and_then(|a| a.get("unique_id"))
            .and_then(|v| v.as_str())
            .map(str::to_string);
        result.stats = Some(EngagementStats {
            views: data.get("play_count").and_then(|v| v.as_u64()),
            likes: data.get("digg_count").and_then(|v| v.as_u64()),
            comments: data.get("comment_count").and_then(|v| v.as_u64()),
            shares: data.get("share_count").and_then(|v| v.as_u64()),
        });

        let images = data.get("images").and_then(|v| v.as_array());
        if let Some(images) = images.filter(|i| !i.is_empty()) {
            result.content_type = "slideshow".to_string();
            result.items = images
                .iter()
                .enumerate()
                .filter_map(|(index, img)| {
                    let src = img.as_str()?.to_string();
                    Some(MediaItem {
                        index,
                        kind: MediaKind::Image,
                        thumbnail: Some(src.clone()),
                        thumbnail_hash: None,
                        format: None,
                        sources: vec![MediaSource {
                            quality: "original".into(),
                            url: src,
                            ..Default::default()
                        }],
                    })
                })
                .collect();
        } else {
            let hd = data.get("hdplay").and_then(|v| v.as_str());
            let sd = data.get("play").and_then(|v| v.as_str());
            let mut sources = Vec::new();
            if let Some(hd) = hd {
                sources.push(MediaSource {
                    quality: "hd".into(),
                    url: hd.to_string(),
                    ..Default::default()
                });
            }
            if let Some(sd) = sd {
                sources.push(MediaSource {
                    quality: "sd".into(),
                    url: sd.to_string(),
                    ..Default::default()
                });
            }
            if sources.is_empty() {
                return Err(GatewayError::NoMediaFound);
            }
            result.items.push(MediaItem {
                index: 0,
                kind: MediaKind::Video,
                thumbnail: data.get("cover").and_then(|v| v.as_str()).map(str::to_string),
                thumbnail_hash: None,
                format: None,
                sources,
            });
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_video_urls() {
        let e = TikTokExtractor;
        assert!(e.matches("https://www.tiktok.com/@user/video/12345"));
        assert!(e.matches("https://vm.tiktok.com/ZMabcdef/"));
        assert!(!e.matches("https://youtube.com/watch?v=1"));
    }
}
