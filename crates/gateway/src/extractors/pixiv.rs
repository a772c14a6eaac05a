//! Pixiv extractor: scoped JSON extraction for (possibly multi-page)
//! artwork. Delivery of pixiv-hosted images requires a `Referer` header,
//! which this extractor stamps onto every source.

use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

use crate::errors::GatewayError;
use crate::model::{ExtractResult, MediaItem, MediaKind, MediaSource};
use crate::parsing::extract::extract_json;
use crate::transport::{FetchOptions, HttpTransport};

use super::traits::{ExtractOptions, ExtractOutcome, Extractor};

const PIXIV_REFERER: &str = "https://www.pixiv.net/";

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"pixiv\.net/(?:en/)?artworks/(\d+)").unwrap());

pub struct PixivExtractor;

impl PixivExtractor {
    fn extract_artwork_id(url: &str) -> Option<&str> {
        URL_RE.captures(url).and_then(|c| c.get(1)).map(|m| m.as_str())
    }
}

#[async_trait]
impl Extractor for PixivExtractor {
    fn platform(&self) -> &'static str {
        "pixiv"
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
        let artwork_id =
            Self::extract_artwork_id(url).ok_or_else(|| GatewayError::InvalidUrl(url.to_string()))?;

        let pages_url = format!("https://www.pixiv.net/ajax/illust/{artwork_id}/pages");
        let meta_url = format!("https://www.pixiv.net/ajax/illust/{artwork_id}");

        let pages_resp = transport
            .fetch_text(
                &pages_url,
                &FetchOptions {
                    headers: vec![("Referer".into(), PIXIV_REFERER.into())],
                    ..Default::default()
                },
            )
            .await?;
        let meta_resp = transport
            .fetch_text(
                &meta_url,
                &FetchOptions {
                    headers: vec![("Referer".into(), PIXIV_REFERER.into())],
                    ..Default::default()
                },
            )
            .await?;

        let pages = extract_json(&pages_resp.data, None).ok_or(GatewayError::NoMediaFound)?;
        let body = pages.get("body").and_then(|b| b.as_array()).ok_or(GatewayError::NoMediaFound)?;
        if body.is_empty() {
            return Err(GatewayError::NoMediaFound);
        }

        let meta = extract_json(&meta_resp.data, None);

        let mut result = ExtractResult::new("pixiv", "artwork");
        result.source_url = Some(url.to_string());
        result.id = Some(artwork_id.to_string());
        if let Some(meta) = &meta {
            let meta_body = meta.get("body").unwrap_or(meta);
            result.title = meta_body.get("title").and_then(|v| v.as_str()).map(str::to_string);
            result.author = meta_body
                .get("userName")
                .and_then(|v| v.as_str())
                .map(str::to_string);
            result.description = meta_body
                .get("description")
                .and_then(|v| v.as_str())
                .map(str::to_string);
        }

        result.items = body
            .iter()
            .enumerate()
            .filter_map(|(index, page)| {
                let urls = page.get("urls")?;
                let original = urls.get("original").and_then(|v| v.as_str())?;
                let thumb = urls.get("thumb_mini").and_then(|v| v.as_str());
                Some(MediaItem {
                    index,
                    kind: MediaKind::Image,
                    thumbnail: thumb.map(str::to_string),
                    thumbnail_hash: None,
                    format: None,
                    sources: vec![MediaSource {
                        quality: "original".into(),
                        url: original.to_string(),
                        ..Default::default()
                    }],
                })
            })
            .collect();

        if result.items.is_empty() {
            return Err(GatewayError::NoMediaFound);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_artwork_id_from_english_and_default_paths() {
        assert_eq!(
            PixivExtractor::extract_artwork_id("https://www.pixiv.net/artworks/12345"),
            Some("12345")
        );
        assert_eq!(
            PixivExtractor::extract_artwork_id("https://www.pixiv.net/en/artworks/12345"),
            Some("12345")
        );
    }
}
