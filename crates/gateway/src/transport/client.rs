//! Pooled keep-alive HTTP client with manual redirect tracking and
//! transparent `Content-Encoding` decompression.
//!
//! Redirects are tracked by hand (the underlying `reqwest::Client` is built
//! with `redirect::Policy::none()`) because callers need the `finalUrl` of
//! whichever hop was actually fetched, not just the original request.

use std::{
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use async_compression::tokio::bufread::{BrotliDecoder, DeflateDecoder, GzipDecoder};
use bytes::Bytes;
use futures::{stream::BoxStream, Stream, StreamExt, TryStreamExt};
use reqwest::{header, Method, StatusCode};
use tokio::io::BufReader;
use tokio_util::io::{ReaderStream, StreamReader};
use url::Url;

use crate::config::TransportConfig;
use crate::errors::{GatewayError, GatewayResult};

const KEEP_ALIVE_WARM_WINDOW_MS: i64 = 60_000;

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub headers: Vec<(String, String)>,
    pub method: Method,
    pub timeout: Option<Duration>,
    pub max_redirects: Option<usize>,
    /// Disables the body-idle timeout so a handler can proxy a long-lived
    /// stream without the transport racing it against a fixed deadline.
    pub stream_mode: bool,
    pub follow_redirects: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            headers: Vec::new(),
            method: Method::GET,
            timeout: None,
            max_redirects: None,
            stream_mode: false,
            follow_redirects: true,
        }
    }
}

pub struct FetchedStream {
    pub status: StatusCode,
    pub headers: header::HeaderMap,
    pub final_url: String,
    pub body: BoxStream<'static, std::io::Result<Bytes>>,
}

pub struct FetchedText {
    pub status: StatusCode,
    pub headers: header::HeaderMap,
    pub data: String,
    pub final_url: String,
}

#[derive(Debug, Clone, Copy)]
pub struct TransportStats {
    pub is_warm: bool,
    pub last_request_age_ms: Option<u64>,
}

/// Process-wide HTTP transport. Cheap to clone: the reqwest client and the
/// warmth timestamp are both shared.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    default_timeout: Duration,
    default_max_redirects: usize,
    last_request_at_ms: Arc<AtomicI64>,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig, user_agent: &str) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent.to_string())
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .build()
            .map_err(GatewayError::from)?;

        Ok(Self {
            client,
            default_timeout: Duration::from_secs(30),
            default_max_redirects: config.max_redirects,
            last_request_at_ms: Arc::new(AtomicI64::new(0)),
        })
    }

    pub async fn fetch_stream(
        &self,
        url: &str,
        opts: &FetchOptions,
    ) -> GatewayResult<FetchedStream> {
        let (status, headers, final_url, response) = self.send_following_redirects(url, opts).await?;
        self.mark_warm();

        let encoding = headers
            .get(header::CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_ascii_lowercase());
        let body = decompress_stream(encoding.as_deref(), response.bytes_stream());

        Ok(FetchedStream {
            status,
            headers,
            final_url,
            body,
        })
    }

    pub async fn fetch_text(&self, url: &str, opts: &FetchOptions) -> GatewayResult<FetchedText> {
        let fetched = self.fetch_stream(url, opts).await?;
        let mut buf = Vec::new();
        let mut body = fetched.body;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| GatewayError::FetchFailed(e.to_string()))?;
            buf.extend_from_slice(&chunk);
        }
        let data = String::from_utf8_lossy(&buf).into_owned();
        Ok(FetchedText {
            status: fetched.status,
            headers: fetched.headers,
            data,
            final_url: fetched.final_url,
        })
    }

    /// Resolves a URL through its redirect chain using HEAD, falling back to
    /// GET when the origin rejects HEAD (common for CDNs).
    pub async fn resolve_url(&self, url: &str, opts: &FetchOptions) -> GatewayResult<String> {
        let mut head_opts = opts.clone();
        head_opts.method = Method::HEAD;
        match self.send_following_redirects(url, &head_opts).await {
            Ok((status, _, final_url, _)) if status.as_u16() < 400 => Ok(final_url),
            _ => {
                let mut get_opts = opts.clone();
                get_opts.method = Method::GET;
                let (_, _, final_url, _) = self.send_following_redirects(url, &get_opts).await?;
                Ok(final_url)
            }
        }
    }

    pub async fn file_size(&self, url: &str) -> GatewayResult<Option<u64>> {
        let opts = FetchOptions {
            method: Method::HEAD,
            ..Default::default()
        };
        let (status, headers, _, _) = self.send_following_redirects(url, &opts).await?;
        if !status.is_success() {
            return Ok(None);
        }
        Ok(headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok()))
    }

    pub async fn file_sizes(&self, urls: &[String]) -> Vec<(String, Option<u64>)> {
        let futures = urls.iter().map(|u| async move {
            let size = self.file_size(u).await.unwrap_or(None);
            (u.clone(), size)
        });
        futures::future::join_all(futures).await
    }

    pub fn stats(&self) -> TransportStats {
        let last = self.last_request_at_ms.load(Ordering::Relaxed);
        if last == 0 {
            return TransportStats {
                is_warm: false,
                last_request_age_ms: None,
            };
        }
        let age = now_ms().saturating_sub(last).max(0);
        TransportStats {
            is_warm: age < KEEP_ALIVE_WARM_WINDOW_MS,
            last_request_age_ms: Some(age as u64),
        }
    }

    fn mark_warm(&self) {
        self.last_request_at_ms.store(now_ms(), Ordering::Relaxed);
    }

    /// Performs one logical fetch, manually walking redirects up to
    /// `opts.max_redirects` (or the transport default). Returns the terminal
    /// response along with the URL that actually produced it.
    async fn send_following_redirects(
        &self,
        url: &str,
        opts: &FetchOptions,
    ) -> GatewayResult<(StatusCode, header::HeaderMap, String, reqwest::Response)> {
        let max_redirects = opts.max_redirects.unwrap_or(self.default_max_redirects);
        let mut current = url.to_string();

        for _ in 0..=max_redirects {
            let mut builder = self.client.request(opts.method.clone(), &current);
            for (name, value) in &opts.headers {
                builder = builder.header(name, value);
            }
            if !opts.stream_mode {
                builder = builder.timeout(opts.timeout.unwrap_or(self.default_timeout));
            }

            let response = builder
                .send()
                .await
                .map_err(|e| map_send_error(e, opts.stream_mode))?;
            let status = response.status();

            if opts.follow_redirects && status.is_redirection() {
                let Some(location) = response
                    .headers()
                    .get(header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                else {
                    return Err(GatewayError::FetchFailed(
                        "redirect without Location header".into(),
                    ));
                };
                let base = Url::parse(&current)?;
                current = base.join(location)?.to_string();
                continue;
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after_secs = response
                    .headers()
                    .get(header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(60);
                return Err(GatewayError::RateLimited { retry_after_secs });
            }
            if status.as_u16() >= 400 {
                return Err(GatewayError::UpstreamError {
                    status: status.as_u16(),
                });
            }

            let headers = response.headers().clone();
            return Ok((status, headers, current, response));
        }

        Err(GatewayError::FetchFailed(format!(
            "exceeded {max_redirects} redirects"
        )))
    }
}

fn map_send_error(err: reqwest::Error, stream_mode: bool) -> GatewayError {
    if err.is_timeout() && !stream_mode {
        GatewayError::Timeout
    } else {
        GatewayError::from(err)
    }
}

fn decompress_stream(
    encoding: Option<&str>,
    stream: impl Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
) -> BoxStream<'static, std::io::Result<Bytes>> {
    let io_stream =
        stream.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));

    match encoding {
        Some("gzip") => {
            let reader = BufReader::new(StreamReader::new(io_stream));
            ReaderStream::new(GzipDecoder::new(reader)).boxed()
        }
        Some("deflate") => {
            let reader = BufReader::new(StreamReader::new(io_stream));
            ReaderStream::new(DeflateDecoder::new(reader)).boxed()
        }
        Some("br") => {
            let reader = BufReader::new(StreamReader::new(io_stream));
            ReaderStream::new(BrotliDecoder::new(reader)).boxed()
        }
        _ => io_stream.boxed(),
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> HttpTransport {
        HttpTransport::new(&TransportConfig::default(), "media-gateway-test/0.0").unwrap()
    }

    #[test]
    fn cold_transport_reports_not_warm() {
        let t = transport();
        let stats = t.stats();
        assert!(!stats.is_warm);
        assert!(stats.last_request_age_ms.is_none());
    }

    #[tokio::test]
    async fn warm_after_marking_a_request() {
        let t = transport();
        t.mark_warm();
        let stats = t.stats();
        assert!(stats.is_warm);
        assert!(stats.last_request_age_ms.unwrap() < 1000);
    }
}
