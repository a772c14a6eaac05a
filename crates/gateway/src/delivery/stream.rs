//! Range-aware streaming proxy (§4.8, P8): relays upstream bytes to the
//! client byte-for-byte, forwarding `Range` and echoing back whatever
//! status/headers the upstream used to answer it.

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Response, StatusCode};
use futures::TryStreamExt;

use crate::errors::{GatewayError, GatewayResult};
use crate::transport::{FetchOptions, HttpTransport};

const FORWARDED_REQUEST_HEADERS: &[header::HeaderName] = &[
    header::RANGE,
    header::IF_RANGE,
    header::IF_NONE_MATCH,
    header::IF_MODIFIED_SINCE,
];

const FORWARDED_RESPONSE_HEADERS: &[header::HeaderName] = &[
    header::CONTENT_TYPE,
    header::CONTENT_LENGTH,
    header::CONTENT_RANGE,
    header::ACCEPT_RANGES,
    header::ETAG,
    header::LAST_MODIFIED,
    header::CACHE_CONTROL,
];

/// Proxies `upstream_url`, forwarding any `Range`/conditional headers the
/// client sent and relaying the upstream's status verbatim (`200`/`206`/`304`).
pub async fn proxy(
    transport: &HttpTransport,
    upstream_url: &str,
    client_headers: &HeaderMap,
    extra_upstream_headers: &[(&'static str, String)],
) -> GatewayResult<Response<Body>> {
    let mut headers = Vec::new();
    for name in FORWARDED_REQUEST_HEADERS {
        if let Some(value) = client_headers.get(name).and_then(|v| v.to_str().ok()) {
            headers.push((name.as_str().to_string(), value.to_string()));
        }
    }
    for (name, value) in extra_upstream_headers {
        headers.push((name.to_string(), value.clone()));
    }

    let opts = FetchOptions {
        headers,
        stream_mode: true,
        ..Default::default()
    };

    let fetched = transport.fetch_stream(upstream_url, &opts).await?;
    let status = StatusCode::from_u16(fetched.status.as_u16()).unwrap_or(StatusCode::OK);

    let mut builder = Response::builder()
        .status(status)
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header(header::ACCESS_CONTROL_EXPOSE_HEADERS, "*");

    for name in FORWARDED_RESPONSE_HEADERS {
        if let Some(value) = fetched.headers.get(name) {
            builder = builder.header(name, value.clone());
        }
    }

    let body = Body::from_stream(
        fetched
            .body
            .map_err(|e| GatewayError::FetchFailed(e.to_string())),
    );

    builder
        .body(body)
        .map_err(|e| GatewayError::Internal(e.to_string()))
}

/// `Content-Disposition` for `/download`: an ASCII-only `filename=` for
/// clients that don't understand the extended form, plus an RFC-5987
/// `filename*=UTF-8''…` for everyone else.
pub fn content_disposition_header(filename: &str) -> HeaderValue {
    let ascii_fallback: String = filename
        .chars()
        .map(|c| if c.is_ascii() && c != '"' && c != '\\' { c } else { '_' })
        .collect();
    let encoded = urlencoding::encode(filename);
    let value = format!("attachment; filename=\"{ascii_fallback}\"; filename*=UTF-8''{encoded}");
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_disposition_strips_quotes_from_the_ascii_fallback() {
        let header = content_disposition_header("weird\"name.mp4");
        let value = header.to_str().unwrap();
        assert!(value.contains("filename=\"weird_name.mp4\""));
    }

    #[test]
    fn content_disposition_carries_an_rfc5987_utf8_form_too() {
        let header = content_disposition_header("caf\u{e9} video.mp4");
        let value = header.to_str().unwrap();
        assert!(value.contains("filename*=UTF-8''"));
        assert!(value.contains("%C3%A9"));
    }
}
