//! Instagram extractor: posts, reels, and IGTV (`/p/`, `/reel/`, `/tv/`).
//!
//! Tier A issues the public GraphQL query; Tier B/C call the internal
//! `media/{id}/info` API with an `X-CSRFToken` derived from the `csrftoken`
//! cookie (§4.4).

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::errors::{GatewayError, GatewayResult};
use crate::model::{CookieSource, ExtractResult, MediaItem, MediaKind, MediaSource};
use crate::transport::{FetchOptions, HttpTransport};

use super::auth::{run_with_escalation, starting_tier, AuthTier};
use super::cookie::extract_cookie_value;
use super::traits::{ExtractOptions, ExtractOutcome, Extractor};

const ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Converts a shortcode to its numeric media id (P2). `None` on any
/// character outside the 64-symbol alphabet.
pub fn shortcode_to_media_id(shortcode: &str) -> Option<u64> {
    let mut id: u128 = 0;
    for c in shortcode.chars() {
        let idx = ALPHABET.iter().position(|&b| b == c as u8)? as u128;
        id = id.checked_mul(64)?.checked_add(idx)?;
    }
    u64::try_from(id).ok()
}

/// Inverse of [`shortcode_to_media_id`], zero-padded to `len` characters so
/// the round trip recovers the original shortcode bit-for-bit.
pub fn media_id_to_shortcode(media_id: u64, len: usize) -> String {
    let mut chars = vec!['A'; len];
    let mut id = media_id as u128;
    let mut i = len;
    while id > 0 && i > 0 {
        i -= 1;
        chars[i] = ALPHABET[(id % 64) as usize] as char;
        id /= 64;
    }
    chars.into_iter().collect()
}

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"instagram\.com/(?:[\w.]+/)?(p|reel|tv)/([A-Za-z0-9_-]+)").unwrap()
});

pub struct InstagramExtractor;

impl InstagramExtractor {
    fn parse_url(url: &str) -> Option<(&'static str, String)> {
        let caps = URL_RE.captures(url)?;
        let kind = match &caps[1] {
            "p" => "post",
            "reel" => "reel",
            "tv" => "igtv",
            _ => return None,
        };
        Some((kind, caps[2].to_string()))
    }

    async fn fetch_guest(transport: &HttpTransport, shortcode: &str) -> GatewayResult<Value> {
        let url = format!(
            "https://www.instagram.com/graphql/query/?query_hash=9f8827793ef34641b2fb195d4d41151&variables=%7B%22shortcode%22%3A%22{shortcode}%22%7D"
        );
        let resp = transport
            .fetch_text(
                &url,
                &FetchOptions {
                    headers: vec![("Accept".into(), "application/json".into())],
                    ..Default::default()
                },
            )
            .await?;
        serde_json::from_str(&resp.data)
            .map_err(|_| GatewayError::ExtractionFailed("malformed GraphQL response".into()))
    }

    async fn fetch_authenticated(
        transport: &HttpTransport,
        media_id: u64,
        cookie: &str,
    ) -> GatewayResult<Value> {
        let csrf = extract_cookie_value(cookie, "csrftoken").unwrap_or_default();
        let url = format!("https://i.instagram.com/api/v1/media/{media_id}/info/");
        let resp = transport
            .fetch_text(
                &url,
                &FetchOptions {
                    headers: vec![
                        ("Cookie".into(), cookie.to_string()),
                        ("X-CSRFToken".into(), csrf),
                        ("X-IG-App-ID".into(), "936619743392459".into()),
                    ],
                    ..Default::default()
                },
            )
            .await?;
        serde_json::from_str(&resp.data)
            .map_err(|_| GatewayError::ExtractionFailed("malformed media info response".into()))
    }

    fn media_to_items(media: &Value) -> Vec<MediaItem> {
        let carousel = media
            .get("edge_sidecar_to_children")
            .and_then(|e| e.get("edges"))
            .and_then(|e| e.as_array());

        let nodes: Vec<&Value> = match carousel {
            Some(edges) => edges.iter().filter_map(|e| e.get("node")).collect(),
            None => vec![media],
        };

        nodes
            .into_iter()
            .enumerate()
            .map(|(index, node)| {
                let is_video = node
                    .get("is_video")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                let thumbnail = node
                    .get("display_url")
                    .and_then(|v| v.as_str())
                    .map(str::to_string);

                let sources = if is_video {
                    node.get("video_url")
                        .and_then(|v| v.as_str())
                        .map(|url| {
                            vec![MediaSource {
                                quality: "hd".into(),
                                url: url.to_string(),
                                ..Default::default()
                            }]
                        })
                        .unwrap_or_default()
                } else {
                    thumbnail
                        .clone()
                        .map(|url| {
                            vec![MediaSource {
                                quality: "original".into(),
                                url,
                                ..Default::default()
                            }]
                        })
                        .unwrap_or_default()
                };

                MediaItem {
                    index,
                    kind: if is_video { MediaKind::Video } else { MediaKind::Image },
                    thumbnail,
                    thumbnail_hash: None,
                    format: None,
                    sources,
                }
            })
            .collect()
    }
}

#[async_trait]
impl Extractor for InstagramExtractor {
    fn platform(&self) -> &'static str {
        "instagram"
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
        let (content_type, shortcode) =
            Self::parse_url(url).ok_or_else(|| GatewayError::InvalidUrl(url.to_string()))?;
        let media_id = shortcode_to_media_id(&shortcode)
            .ok_or_else(|| GatewayError::InvalidUrl("malformed shortcode".into()))?;

        // Whether this is a known-private URL isn't decidable from the URL
        // alone; tier escalation (below) handles the private case reactively.
        let starting = starting_tier(false, opts.cookie.as_deref());

        run_with_escalation(
            starting,
            true,
            opts.server_cookie.as_deref(),
            opts.cookie.as_deref(),
            |tier, cookie| {
                let content_type = content_type.to_string();
                let shortcode = shortcode.clone();
                async move {
                    let media = match tier {
                        AuthTier::A => Self::fetch_guest(transport, &shortcode).await?,
                        AuthTier::B | AuthTier::C => match &cookie {
                            Some(c) => Self::fetch_authenticated(transport, media_id, c).await?,
                            None => return Err(GatewayError::LoginRequired),
                        },
                    };

                    let node = media
                        .get("data")
                        .and_then(|d| d.get("shortcode_media"))
                        .or_else(|| media.get("item"))
                        .ok_or(GatewayError::NoMediaFound)?;

                    let items = Self::media_to_items(node);
                    if items.is_empty() {
                        return Err(GatewayError::NoMediaFound);
                    }

                    let mut result = ExtractResult::new("instagram", content_type);
                    result.source_url = Some(url.to_string());
                    result.id = Some(shortcode.clone());
                    result.author = node
                        .get("owner")
                        .and_then(|o| o.get("username"))
                        .and_then(|v| v.as_str())
                        .map(str::to_string);
                    result.description = node
                        .get("edge_media_to_caption")
                        .and_then(|c| c.get("edges"))
                        .and_then(|e| e.as_array())
                        .and_then(|e| e.first())
                        .and_then(|e| e.get("node"))
                        .and_then(|n| n.get("text"))
                        .and_then(|v| v.as_str())
                        .map(str::to_string);
                    result.used_cookie = cookie.is_some();
                    result.cookie_source = tier.cookie_source();
                    result.items = items;
                    Ok(result)
                }
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortcode_round_trips_through_media_id() {
        for code in ["CzMermNsgD1", "B1abcXYZ_-9", "A"] {
            let id = shortcode_to_media_id(code).expect("valid shortcode");
            let recovered = media_id_to_shortcode(id, code.len());
            assert_eq!(recovered, code);
        }
    }

    #[test]
    fn rejects_characters_outside_the_alphabet() {
        assert!(shortcode_to_media_id("abc!def").is_none());
    }

    #[test]
    fn parses_post_reel_and_tv_urls() {
        assert_eq!(
            InstagramExtractor::parse_url("https://instagram.com/p/CzMermNsgD1/"),
            Some(("post", "CzMermNsgD1".to_string()))
        );
        assert_eq!(
            InstagramExtractor::parse_url("https://www.instagram.com/reel/CzMermNsgD1/"),
            Some(("reel", "CzMermNsgD1".to_string()))
        );
        assert_eq!(
            InstagramExtractor::parse_url("https://instagram.com/tv/CzMermNsgD1/"),
            Some(("igtv", "CzMermNsgD1".to_string()))
        );
    }
}
