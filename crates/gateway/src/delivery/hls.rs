//! HLS proxy (§4.8, E6): rewrites relative URIs in a fetched manifest to
//! absolute ones (so the player's next fetch goes straight to the CDN) and
//! otherwise forwards segments byte-for-byte.

use axum::body::Body;
use axum::http::{header, Response, StatusCode};

use crate::errors::{GatewayError, GatewayResult};
use crate::transport::{FetchOptions, HttpTransport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HlsRequestType {
    Manifest,
    Segment,
}

impl HlsRequestType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "manifest" => Some(Self::Manifest),
            "segment" => Some(Self::Segment),
            _ => None,
        }
    }
}

/// Rewrites every non-comment, non-blank line of an HLS playlist (absolute,
/// root-relative, or relative URIs alike) into a link back to this proxy:
/// `<hls_proxy_path>?url=<original_absolute>&type=segment`. Comment/tag
/// lines (`#EXT-...`) are left untouched.
pub fn rewrite_playlist(base: &url::Url, raw: &str, hls_proxy_path: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 256);
    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            out.push_str(line);
        } else if let Ok(absolute) = base.join(trimmed) {
            let encoded = url::form_urlencoded::byte_serialize(absolute.as_str().as_bytes()).collect::<String>();
            out.push_str(&format!("{hls_proxy_path}?url={encoded}&type=segment"));
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}

pub async fn proxy_manifest(
    transport: &HttpTransport,
    url: &str,
    hls_proxy_path: &str,
) -> GatewayResult<Response<Body>> {
    let fetched = transport.fetch_text(url, &FetchOptions::default()).await?;
    let base = url::Url::parse(&fetched.final_url)?;
    let rewritten = rewrite_playlist(&base, &fetched.data, hls_proxy_path);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/vnd.apple.mpegurl")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header("X-Playlist-Rewritten", "absolute-uris")
        .body(Body::from(rewritten))
        .map_err(|e| GatewayError::Internal(e.to_string()))
}

/// Segment TTL per §5: 1 hour.
pub const SEGMENT_CACHE_CONTROL: &str = "public, max-age=3600";

pub async fn proxy_segment(
    transport: &HttpTransport,
    url: &str,
    client_headers: &axum::http::HeaderMap,
) -> GatewayResult<Response<Body>> {
    let mut response = super::stream::proxy(transport, url, client_headers, &[]).await?;
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static(SEGMENT_CACHE_CONTROL),
    );
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_relative_segment_uris_into_proxy_links() {
        let base = url::Url::parse("https://cdn.example.com/hls/index.m3u8").unwrap();
        let playlist = "#EXTM3U\n#EXTINF:6.0,\nseg0.ts\n#EXTINF:6.0,\nseg1.ts\n";
        let rewritten = rewrite_playlist(&base, playlist, "/hls-proxy");
        assert!(rewritten.contains("/hls-proxy?url="));
        assert!(rewritten.contains("&type=segment"));
        assert!(rewritten.contains("seg0.ts"));
    }

    #[test]
    fn rewrites_already_absolute_uris_into_proxy_links_too() {
        let base = url::Url::parse("https://cdn.example.com/hls/index.m3u8").unwrap();
        let playlist = "#EXTM3U\nhttps://other-cdn.example.com/seg0.ts\n";
        let rewritten = rewrite_playlist(&base, playlist, "/hls-proxy");
        assert!(rewritten.contains("/hls-proxy?url="));
        assert!(rewritten.contains("other-cdn.example.com"));
    }

    #[test]
    fn leaves_comment_lines_untouched() {
        let base = url::Url::parse("https://cdn.example.com/hls/index.m3u8").unwrap();
        let playlist = "#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:6\n";
        let rewritten = rewrite_playlist(&base, playlist, "/hls-proxy");
        assert!(rewritten.contains("#EXT-X-VERSION:3"));
    }

    #[test]
    fn parses_request_type() {
        assert_eq!(HlsRequestType::parse("manifest"), Some(HlsRequestType::Manifest));
        assert_eq!(HlsRequestType::parse("segment"), Some(HlsRequestType::Segment));
        assert_eq!(HlsRequestType::parse("bogus"), None);
    }
}
