//! `GET /stream`, `/download`, `/thumbnail`, `/hls-proxy`, `/hls-stream`,
//! `/merge` (§4.8, §6): the handlers that sit on top of [`crate::delivery`].

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, Response};
use axum::body::Body;
use serde::Deserialize;
use url::Url;

use crate::delivery::{hls, merge, muxer, stream, thumbnail, youtube};
use crate::errors::{GatewayError, GatewayResult};
use crate::extractors::common::DESKTOP_USER_AGENT;
use crate::web::AppState;

/// Hostnames whose signed query string already carries its own expiry
/// (§4.8, §9 open question 4): these bypass the registry-membership check
/// that every other `url=` target is held to.
const SIGNED_URL_ALLOWLIST_SUFFIXES: &[&str] =
    &["googlevideo.com", "youtube.com", "bilivideo.com", "bilibili.com", "akamaized.net"];

fn is_signed_url_allowlisted(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    SIGNED_URL_ALLOWLIST_SUFFIXES
        .iter()
        .any(|suffix| host == *suffix || host.ends_with(&format!(".{suffix}")))
}

/// Resolves a delivery target from `h=<fingerprint>` or `url=<encoded>`,
/// per §4.8's three accepted forms (the third, a raw YouTube watch URL, is
/// handled by [`download`] before this is ever reached).
async fn resolve_target(
    state: &AppState,
    hash: Option<&str>,
    url: Option<&str>,
) -> GatewayResult<String> {
    if let Some(hash) = hash {
        return state.registry.lookup(hash).await.ok_or(GatewayError::InvalidHash);
    }
    if let Some(url) = url {
        if let Some(found) = state.registry.lookup(url).await {
            return Ok(found);
        }
        if is_signed_url_allowlisted(url) {
            return Ok(url.to_string());
        }
        return Err(GatewayError::UnauthorizedUrl);
    }
    Err(GatewayError::MissingParameter("url"))
}

/// Referer/Origin/User-Agent a handful of CDNs require on the request that
/// actually fetches the bytes (§4.8).
fn upstream_headers_for(url: &str) -> Vec<(&'static str, String)> {
    let Ok(parsed) = Url::parse(url) else {
        return Vec::new();
    };
    let Some(host) = parsed.host_str() else {
        return Vec::new();
    };

    if host.ends_with("googlevideo.com") || host.ends_with("youtube.com") {
        vec![("Referer", "https://www.youtube.com/".to_string())]
    } else if host.ends_with("bilivideo.com") || host.ends_with("bilibili.com") {
        vec![
            ("Referer", "https://www.bilibili.com/".to_string()),
            ("Origin", "https://www.bilibili.com".to_string()),
            ("User-Agent", DESKTOP_USER_AGENT.to_string()),
        ]
    } else if host.ends_with("pximg.net") {
        vec![("Referer", "https://www.pixiv.net/".to_string())]
    } else {
        Vec::new()
    }
}

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub url: Option<String>,
    pub h: Option<String>,
}

pub async fn stream_handler(
    State(state): State<AppState>,
    Query(q): Query<StreamQuery>,
    headers: HeaderMap,
) -> GatewayResult<Response<Body>> {
    let target = resolve_target(&state, q.h.as_deref(), q.url.as_deref()).await?;
    let extra = upstream_headers_for(&target);
    let extra_ref: Vec<(&'static str, String)> = extra;
    stream::proxy(&state.transport, &target, &headers, &extra_ref).await
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub url: Option<String>,
    pub h: Option<String>,
    #[serde(rename = "watchUrl")]
    pub watch_url: Option<String>,
    pub filename: Option<String>,
}

fn filename_from_url(url: &str, fallback: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.path_segments().and_then(|mut s| s.next_back().map(str::to_string)))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

pub async fn download(
    State(state): State<AppState>,
    Query(q): Query<DownloadQuery>,
    headers: HeaderMap,
) -> GatewayResult<Response<Body>> {
    if let Some(watch_url) = q.watch_url.as_deref().filter(|u| youtube::is_youtube_watch_url(u)) {
        let delivery = &state.config.delivery;
        match youtube::fast_path_download(&delivery.ytdlp_command, watch_url, delivery.ytdlp_timeout).await {
            Ok(response) => return Ok(response),
            Err(e) => {
                tracing::warn!(error = %e, "youtube fast path failed, falling through to generic proxy");
            }
        }
    }

    let url_param = q.watch_url.as_deref().or(q.url.as_deref());
    let target = resolve_target(&state, q.h.as_deref(), url_param).await?;
    let extra = upstream_headers_for(&target);

    let mut response = stream::proxy(&state.transport, &target, &headers, &extra).await?;
    let filename = q
        .filename
        .clone()
        .unwrap_or_else(|| filename_from_url(&target, "download"));
    response
        .headers_mut()
        .insert(header::CONTENT_DISPOSITION, stream::content_disposition_header(&filename));
    Ok(response)
}

#[derive(Debug, Deserialize)]
pub struct ThumbnailQuery {
    pub url: Option<String>,
    pub h: Option<String>,
}

pub async fn thumbnail_handler(
    State(state): State<AppState>,
    Query(q): Query<ThumbnailQuery>,
    headers: HeaderMap,
) -> GatewayResult<Response<Body>> {
    let target = resolve_target(&state, q.h.as_deref(), q.url.as_deref()).await?;
    if !thumbnail::is_allowed_thumbnail_host(&target) {
        return Err(GatewayError::UnauthorizedUrl);
    }
    let mut response = stream::proxy(&state.transport, &target, &headers, &[]).await?;
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static(thumbnail::CACHE_CONTROL),
    );
    Ok(response)
}

#[derive(Debug, Deserialize)]
pub struct HlsProxyQuery {
    pub url: String,
    #[serde(rename = "type")]
    pub request_type: String,
}

pub async fn hls_proxy(
    State(state): State<AppState>,
    Query(q): Query<HlsProxyQuery>,
    headers: HeaderMap,
) -> GatewayResult<Response<Body>> {
    let request_type =
        hls::HlsRequestType::parse(&q.request_type).ok_or_else(|| GatewayError::MissingParameter("type"))?;
    match request_type {
        hls::HlsRequestType::Manifest => hls::proxy_manifest(&state.transport, &q.url, "/hls-proxy").await,
        hls::HlsRequestType::Segment => hls::proxy_segment(&state.transport, &q.url, &headers).await,
    }
}

#[derive(Debug, Deserialize)]
pub struct HlsStreamQuery {
    pub url: String,
    #[serde(rename = "audioUrl")]
    pub audio_url: Option<String>,
    #[serde(rename = "type")]
    pub request_type: String,
}

const HLS_AUDIO_CONTENT_TYPE: &str = "audio/mpeg";
const HLS_VIDEO_CONTENT_TYPE: &str = "video/mp4";

pub async fn hls_stream(
    State(state): State<AppState>,
    Query(q): Query<HlsStreamQuery>,
) -> GatewayResult<Response<Body>> {
    let muxer_command = muxer::discover_muxer(&state.config.delivery.ffmpeg_command);
    let headers: &[(&str, &str)] = &[];

    let (args, content_type) = match (q.request_type.as_str(), q.audio_url.as_deref()) {
        ("audio", _) => (muxer::hls_audio_args(&q.url, headers), HLS_AUDIO_CONTENT_TYPE),
        ("video", Some(audio_url)) => (
            muxer::dash_video_audio_args(&q.url, audio_url, headers),
            HLS_VIDEO_CONTENT_TYPE,
        ),
        ("video", None) => (muxer::hls_video_args(&q.url, headers), HLS_VIDEO_CONTENT_TYPE),
        _ => return Err(GatewayError::UnsupportedFormat),
    };

    muxer::run_and_stream(&muxer_command, &args, content_type, state.config.delivery.muxer_max_duration).await
}

#[derive(Debug, Deserialize)]
pub struct MergeQuery {
    #[serde(rename = "videoUrl")]
    pub video_url: String,
    #[serde(rename = "audioUrl")]
    pub audio_url: String,
    #[serde(rename = "copyAudio")]
    pub copy_audio: Option<String>,
}

pub async fn merge_handler(
    State(state): State<AppState>,
    Query(q): Query<MergeQuery>,
) -> GatewayResult<Response<Body>> {
    let muxer_command = muxer::discover_muxer(&state.config.delivery.ffmpeg_command);
    let video_headers = upstream_headers_for(&q.video_url);
    let audio_headers = upstream_headers_for(&q.audio_url);
    let mut headers: Vec<(&str, &str)> = Vec::new();
    for (k, v) in video_headers.iter().chain(audio_headers.iter()) {
        headers.push((k, v.as_str()));
    }
    let copy_audio = matches!(q.copy_audio.as_deref(), Some("1") | Some("true"));

    merge::run(
        &muxer_command,
        &q.video_url,
        &q.audio_url,
        &headers,
        copy_audio,
        state.config.delivery.muxer_max_duration,
    )
    .await
}
