//! Facebook extractor: videos, reels, watch links, posts (photo galleries),
//! and stories, plus short-link resolution (`fb.watch`, `fb.me`, `/share/`,
//! `l.facebook.com/l.php`).

use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

use crate::errors::GatewayError;
use crate::model::{EngagementStats, ExtractResult, MediaItem, MediaKind, MediaSource};
use crate::parsing::extract::{extract_all, extract_fragment, extract_meta_tags};
use crate::transport::{FetchOptions, HttpTransport};

use super::auth::{run_with_escalation, starting_tier};
use super::common::{detect_content_issue, MOBILE_USER_AGENT};
use super::traits::{ExtractOptions, ExtractOutcome, Extractor};

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:facebook\.com|fb\.watch|fb\.me)").unwrap()
});

static SHORT_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"fb\.watch|fb\.me|/share/[vrp]/|l\.facebook\.com/l\.php").unwrap());

/// Priority-ordered keys searched around the video target block (§4.4).
const VIDEO_URL_KEYS: &[&str] = &[
    "playable_url_quality_hd",
    "playable_url",
    "browser_native_hd_url",
    "browser_native_sd_url",
    "hd_src",
];

pub struct FacebookExtractor;

impl FacebookExtractor {
    fn content_type_from_path(url: &str) -> &'static str {
        if url.contains("/stories/") {
            "story"
        } else if url.contains("/reel/") {
            "reel"
        } else if url.contains("/videos/") || url.contains("/watch/") {
            "video"
        } else if url.contains("/groups/") {
            "post"
        } else {
            "post"
        }
    }

    fn is_short_link(url: &str) -> bool {
        SHORT_LINK_RE.is_match(url)
    }

    fn extract_video_url(html: &str) -> Option<(String, String)> {
        for key in VIDEO_URL_KEYS {
            let needle = format!("\"{key}\":\"");
            if let Some(fragment) = extract_fragment(html, &needle, Some("\""), 4096) {
                let url = fragment.replace("\\/", "/").replace("\\u0025", "%");
                if !url.is_empty() {
                    return Some((key.to_string(), url));
                }
            }
        }
        None
    }

    fn extract_images(html: &str) -> Vec<String> {
        let block = extract_fragment(html, "\"all_subattachments\"", Some("\"page_info\""), 200_000)
            .unwrap_or_default();
        let re = Regex::new(r#""url":"(https:[^"]+\.(?:jpg|jpeg|png|webp)[^"]*)""#).unwrap();
        extract_all(&block, &re, 100)
            .into_iter()
            .map(|s| s.replace("\\/", "/"))
            .collect()
    }

    fn extract_stats(html: &str) -> EngagementStats {
        let grab = |key: &str| -> Option<u64> {
            extract_fragment(html, &format!("\"{key}\":"), Some(","), 20)
                .and_then(|s| s.trim().parse().ok())
        };
        EngagementStats {
            views: grab("video_view_count").or_else(|| grab("play_count")),
            likes: grab("reaction_count"),
            comments: grab("comment_count"),
            shares: grab("share_count"),
        }
    }
}

#[async_trait]
impl Extractor for FacebookExtractor {
    fn platform(&self) -> &'static str {
        "facebook"
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
        if Self::is_short_link(&target) {
            target = transport
                .resolve_url(&target, &FetchOptions::default())
                .await?;
        }

        let content_type = Self::content_type_from_path(&target);
        let requires_auth = content_type == "story";
        let starting = starting_tier(requires_auth, opts.cookie.as_deref());

        run_with_escalation(
            starting,
            content_type == "video" || content_type == "reel",
            opts.server_cookie.as_deref(),
            opts.cookie.as_deref(),
            |tier, cookie| {
                let target = target.clone();
                async move {
                    let mut headers = vec![("User-Agent".to_string(), MOBILE_USER_AGENT.to_string())];
                    if let Some(c) = &cookie {
                        headers.push(("Cookie".to_string(), c.clone()));
                    }

                    let fetched = transport
                        .fetch_text(
                            &target,
                            &FetchOptions {
                                headers,
                                ..Default::default()
                            },
                        )
                        .await?;

                    if let Some(issue) = detect_content_issue(&fetched.data) {
                        return Err(issue);
                    }

                    let mut result = ExtractResult::new("facebook", content_type);
                    result.source_url = Some(target.clone());
                    result.used_cookie = cookie.is_some();
                    result.cookie_source = tier.cookie_source();

                    let meta = extract_meta_tags(&fetched.data);
                    result.title = meta.og_title.or(meta.title);
                    result.description = meta.og_description;

                    match content_type {
                        "video" | "reel" | "story" => {
                            let Some((quality_key, video_url)) = Self::extract_video_url(&fetched.data)
                            else {
                                return Err(GatewayError::NoMediaFound);
                            };
                            let quality = if quality_key.contains("hd") { "hd" } else { "sd" };
                            result.items.push(MediaItem {
                                index: 0,
                                kind: MediaKind::Video,
                                thumbnail: meta.og_image,
                                thumbnail_hash: None,
                                format: None,
                                sources: vec![MediaSource {
                                    quality: quality.to_string(),
                                    url: video_url,
                                    ..Default::default()
                                }],
                            });
                            result.stats = Some(Self::extract_stats(&fetched.data));
                        }
                        _ => {
                            let images = Self::extract_images(&fetched.data);
                            if images.is_empty() {
                                return Err(GatewayError::NoMediaFound);
                            }
                            result.items = images
                                .into_iter()
                                .enumerate()
                                .map(|(index, url)| MediaItem {
                                    index,
                                    kind: MediaKind::Image,
                                    thumbnail: Some(url.clone()),
                                    thumbnail_hash: None,
                                    format: None,
                                    sources: vec![MediaSource {
                                        quality: "original".into(),
                                        url,
                                        ..Default::default()
                                    }],
                                })
                                .collect();
                            result.stats = Some(Self::extract_stats(&fetched.data));
                        }
                    }

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
    fn classifies_content_type_from_path() {
        assert_eq!(
            FacebookExtractor::content_type_from_path("https://facebook.com/x/stories/1"),
            "story"
        );
        assert_eq!(
            FacebookExtractor::content_type_from_path("https://facebook.com/reel/1"),
            "reel"
        );
        assert_eq!(
            FacebookExtractor::content_type_from_path("https://facebook.com/watch/?v=1"),
            "video"
        );
    }

    #[test]
    fn recognizes_short_links() {
        assert!(FacebookExtractor::is_short_link("https://fb.watch/abc123/"));
        assert!(FacebookExtractor::is_short_link(
            "https://l.facebook.com/l.php?u=x"
        ));
        assert!(!FacebookExtractor::is_short_link(
            "https://facebook.com/watch/?v=1"
        ));
    }

    #[test]
    fn extracts_hd_video_url_in_priority_order() {
        let html = r#"{"playable_url_quality_hd":"https:\/\/video.example\/hd.mp4","hd_src":"https:\/\/video.example\/other.mp4"}"#;
        let (key, url) = FacebookExtractor::extract_video_url(html).unwrap();
        assert_eq!(key, "playable_url_quality_hd");
        assert_eq!(url, "https://video.example/hd.mp4");
    }
}
