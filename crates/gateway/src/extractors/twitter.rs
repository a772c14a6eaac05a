//! Twitter/X extractor. Tier A uses the public syndication endpoint; Tier
//! B/C use the GraphQL endpoint with a `ct0`-derived CSRF header and the
//! well-known public bearer token. Retweets and quote-tweets are unwrapped
//! when the surrounding tweet carries no media of its own.

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::errors::{GatewayError, GatewayResult};
use crate::model::{EngagementStats, ExtractResult, MediaItem, MediaKind, MediaSource};
use crate::transport::{FetchOptions, HttpTransport};

use super::auth::{run_with_escalation, starting_tier};
use super::cookie::extract_cookie_value;
use super::traits::{ExtractOptions, ExtractOutcome, Extractor};

/// Public bearer token used by the syndication/guest timeline, not a secret:
/// it is shipped in every logged-out web client.
const PUBLIC_BEARER: &str =
    "AAAAAAAAAAAAAAAAAAAAANRILgAAAAAAnNwIzUejRCOuH5E6I8xnZz4puTs%3D1Zv7ttfk8LF81IUq16cHjhLTvJu4FA33AGWWjCpTnA";

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:twitter\.com|x\.com)/\w+/status/(\d+)|t\.co/").unwrap());
static SHORT_LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"t\.co/").unwrap());
static STATUS_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"status/(\d+)").unwrap());

pub struct TwitterExtractor;

impl TwitterExtractor {
    fn extract_status_id(url: &str) -> Option<String> {
        STATUS_ID_RE.captures(url).map(|c| c[1].to_string())
    }

    async fn fetch_syndication(transport: &HttpTransport, status_id: &str) -> GatewayResult<Value> {
        let url = format!(
            "https://cdn.syndication.twimg.com/tweet-result?id={status_id}&lang=en"
        );
        let resp = transport.fetch_text(&url, &FetchOptions::default()).await?;
        serde_json::from_str(&resp.data)
            .map_err(|_| GatewayError::ExtractionFailed("malformed syndication response".into()))
    }

    async fn fetch_graphql(
        transport: &HttpTransport,
        status_id: &str,
        cookie: &str,
    ) -> GatewayResult<Value> {
        let ct0 = extract_cookie_value(cookie, "ct0").unwrap_or_default();
        let url = format!(
            "https://x.com/i/api/graphql/TweetResultByRestId?variables=%7B%22tweetId%22%3A%22{status_id}%22%7D"
        );
        let resp = transport
            .fetch_text(
                &url,
                &FetchOptions {
                    headers: vec![
                        ("Cookie".into(), cookie.to_string()),
                        ("x-csrf-token".into(), ct0),
                        ("Authorization".into(), format!("Bearer {PUBLIC_BEARER}")),
                    ],
                    ..Default::default()
                },
            )
            .await?;
        serde_json::from_str(&resp.data)
            .map_err(|_| GatewayError::ExtractionFailed("malformed GraphQL response".into()))
    }

    /// Finds the tweet node actually carrying media: the tweet itself, or
    /// (when it has none) the retweeted/quoted tweet it references.
    fn media_bearing_node(tweet: &Value) -> (&Value, bool) {
        let has_media = |t: &Value| -> bool {
            t.get("mediaDetails")
                .or_else(|| t.get("extended_entities").and_then(|e| e.get("media")))
                .and_then(|v| v.as_array())
                .map(|a| !a.is_empty())
                .unwrap_or(false)
        };

        if has_media(tweet) {
            return (tweet, false);
        }
        if let Some(quoted) = tweet.get("quoted_tweet").filter(|t| has_media(t)) {
            return (quoted, true);
        }
        if let Some(rt) = tweet.get("retweeted_status").filter(|t| has_media(t)) {
            return (rt, true);
        }
        (tweet, false)
    }

    fn build_items(node: &Value) -> Vec<MediaItem> {
        let media = node
            .get("mediaDetails")
            .or_else(|| node.get("extended_entities").and_then(|e| e.get("media")))
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        media
            .iter()
            .enumerate()
            .filter_map(|(index, m)| {
                let media_type = m.get("type").and_then(|v| v.as_str()).unwrap_or("photo");
                if media_type == "photo" {
                    let base = m.get("media_url_https").and_then(|v| v.as_str())?;
                    return Some(MediaItem {
                        index,
                        kind: MediaKind::Image,
                        thumbnail: Some(base.to_string()),
                        thumbnail_hash: None,
                        format: None,
                        sources: vec![MediaSource {
                            quality: "orig".into(),
                            url: format!("{base}?name=orig"),
                            ..Default::default()
                        }],
                    });
                }

                let mut variants: Vec<(u32, String)> = m
                    .get("video_info")
                    .and_then(|vi| vi.get("variants"))
                    .and_then(|v| v.as_array())
                    .into_iter()
                    .flatten()
                    .filter(|v| v.get("content_type").and_then(|c| c.as_str()) == Some("video/mp4"))
                    .filter_map(|v| {
                        let bitrate = v.get("bitrate").and_then(|b| b.as_u64()).unwrap_or(0) as u32;
                        let url = v.get("url").and_then(|u| u.as_str())?.to_string();
                        Some((bitrate, url))
                    })
                    .collect();
                // P4: non-increasing bitrate order.
                variants.sort_by(|a, b| b.0.cmp(&a.0));
                if variants.is_empty() {
                    return None;
                }

                let sources = variants
                    .into_iter()
                    .map(|(bitrate, url)| MediaSource {
                        quality: format!("{}kbps", bitrate / 1000),
                        url,
                        bitrate: Some(bitrate / 1000),
                        ..Default::default()
                    })
                    .collect();

                Some(MediaItem {
                    index,
                    kind: MediaKind::Video,
                    thumbnail: m.get("media_url_https").and_then(|v| v.as_str()).map(str::to_string),
                    thumbnail_hash: None,
                    format: None,
                    sources,
                })
            })
            .collect()
    }
}

#[async_trait]
impl Extractor for TwitterExtractor {
    fn platform(&self) -> &'static str {
        "twitter"
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
        let mut target = url.to_string();
        if SHORT_LINK_RE.is_match(&target) {
            target = transport.resolve_url(&target, &FetchOptions::default()).await?;
        }
        let status_id = Self::extract_status_id(&target)
            .ok_or_else(|| GatewayError::InvalidUrl(target.clone()))?;

        let starting = starting_tier(false, opts.cookie.as_deref());

        run_with_escalation(
            starting,
            true,
            opts.server_cookie.as_deref(),
            opts.cookie.as_deref(),
            |tier, cookie| {
                let status_id = status_id.clone();
                let target = target.clone();
                async move {
                    let tweet = match &cookie {
                        Some(c) => Self::fetch_graphql(transport, &status_id, c).await?,
                        None => Self::fetch_syndication(transport, &status_id).await?,
                    };

                    let (node, unwrapped) = Self::media_bearing_node(&tweet);
                    let items = Self::build_items(node);
                    if items.is_empty() {
                        return Err(GatewayError::NoMediaFound);
                    }

                    let mut result = ExtractResult::new("twitter", "tweet");
                    result.source_url = Some(target);
                    result.id = Some(status_id);
                    result.author = tweet
                        .get("user")
                        .and_then(|u| u.get("name"))
                        .and_then(|v| v.as_str())
                        .map(str::to_string);
                    result.author_username = tweet
                        .get("user")
                        .and_then(|u| u.get("screen_name"))
                        .and_then(|v| v.as_str())
                        .map(str::to_string);
                    result.description = Some(if unwrapped {
                        format!(
                            "{} (media from the referenced tweet)",
                            tweet.get("text").and_then(|v| v.as_str()).unwrap_or_default()
                        )
                    } else {
                        tweet.get("text").and_then(|v| v.as_str()).unwrap_or_default().to_string()
                    });
                    result.stats = Some(EngagementStats {
                        views: node.get("view_count").and_then(|v| v.as_u64()),
                        likes: node.get("favorite_count").and_then(|v| v.as_u64()),
                        comments: node.get("reply_count").and_then(|v| v.as_u64()),
                        shares: node.get("retweet_count").and_then(|v| v.as_u64()),
                    });
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
    use serde_json::json;

    #[test]
    fn extracts_status_id() {
        assert_eq!(
            TwitterExtractor::extract_status_id("https://x.com/jack/status/20"),
            Some("20".to_string())
        );
    }

    #[test]
    fn video_variants_sort_non_increasing_by_bitrate() {
        let node = json!({
            "video_info": {
                "variants": [
                    {"content_type": "video/mp4", "bitrate": 256000, "url": "low.mp4"},
                    {"content_type": "video/mp4", "bitrate": 832000, "url": "hi.mp4"},
                    {"content_type": "application/x-mpegURL", "bitrate": 0, "url": "playlist.m3u8"},
                ]
            }
        });
        let items = TwitterExtractor::build_items(&json!({
            "extended_entities": { "media": [ {"type": "video", "video_info": node["video_info"]} ] }
        }));
        let bitrates: Vec<u32> = items[0].sources.iter().map(|s| s.bitrate.unwrap()).collect();
        assert!(bitrates.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn unwraps_retweet_when_outer_tweet_has_no_media() {
        let tweet = json!({
            "retweeted_status": {
                "extended_entities": { "media": [ {"type": "photo", "media_url_https": "https://p.example/x.jpg"} ] }
            }
        });
        let (node, unwrapped) = TwitterExtractor::media_bearing_node(&tweet);
        assert!(unwrapped);
        assert!(node.get("extended_entities").is_some());
    }
}
