//! YouTube watch-url fast path (§4.8): used inside `/download` when the
//! target is a raw watch URL rather than an already-resolved CDN URL.
//! Shells out to `yt-dlp` to materialize a file, streams it, and always
//! cleans up the temp directory afterwards.

use std::path::PathBuf;

use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use regex::Regex;
use std::sync::LazyLock;
use tokio_util::io::ReaderStream;

use crate::errors::{GatewayError, GatewayResult};

static WATCH_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:www\.)?(?:youtube\.com/watch\?v=|youtu\.be/)[\w-]+").unwrap()
});

pub fn is_youtube_watch_url(url: &str) -> bool {
    WATCH_URL_RE.is_match(url)
}

struct TempDir(PathBuf);

impl Drop for TempDir {
    fn drop(&mut self) {
        let path = self.0.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::fs::remove_dir_all(&path).await {
                tracing::warn!(path = %path.display(), error = %e, "failed to clean up yt-dlp temp dir");
            }
        });
    }
}

/// Invokes `yt-dlp` to download `watch_url` into a fresh temp directory as
/// an MP4, then streams the resulting file. The temp directory is removed
/// once the response body is dropped, whether that's a clean finish, a
/// client disconnect, or an error partway through.
pub async fn fast_path_download(
    ytdlp_command: &str,
    watch_url: &str,
    timeout: std::time::Duration,
) -> GatewayResult<Response<Body>> {
    let dir = std::env::temp_dir().join(format!("gateway-ytdlp-{}", uuid_like()));
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| GatewayError::Internal(e.to_string()))?;
    let temp_dir = TempDir(dir.clone());

    let output_template = dir.join("video.%(ext)s");
    let run = tokio::process::Command::new(ytdlp_command)
        .arg("-f")
        .arg("bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best")
        .arg("--merge-output-format")
        .arg("mp4")
        .arg("-o")
        .arg(output_template.to_string_lossy().to_string())
        .arg(watch_url)
        .output();

    let output = match tokio::time::timeout(timeout, run).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(GatewayError::Internal(e.to_string()));
        }
        Err(_) => {
            return Err(GatewayError::Timeout);
        }
    };

    if !output.status.success() {
        tracing::warn!(
            status = ?output.status,
            stderr = %String::from_utf8_lossy(&output.stderr),
            "yt-dlp fast path failed"
        );
        return Err(GatewayError::DownloadFailed);
    }

    let produced = find_produced_file(&dir).await?;
    let file = tokio::fs::File::open(&produced)
        .await
        .map_err(|e| GatewayError::Internal(e.to_string()))?;
    let len = file
        .metadata()
        .await
        .map(|m| m.len())
        .map_err(|e| GatewayError::Internal(e.to_string()))?;

    let stream = streamed_with_cleanup(file, temp_dir);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "video/mp4")
        .header(header::CONTENT_LENGTH, len)
        .header(
            header::CONTENT_DISPOSITION,
            super::stream::content_disposition_header("video.mp4"),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| GatewayError::Internal(e.to_string()))
}

async fn find_produced_file(dir: &PathBuf) -> GatewayResult<PathBuf> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| GatewayError::Internal(e.to_string()))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| GatewayError::Internal(e.to_string()))?
    {
        if entry.path().is_file() {
            return Ok(entry.path());
        }
    }
    Err(GatewayError::DownloadFailed)
}

/// Wraps a file handle in a stream that keeps `temp_dir` alive until the
/// stream itself is dropped, so the directory is removed exactly once the
/// client is done reading (or disconnects early).
fn streamed_with_cleanup(
    file: tokio::fs::File,
    temp_dir: TempDir,
) -> impl futures::Stream<Item = std::io::Result<bytes::Bytes>> + Send + 'static {
    use tokio_stream::StreamExt;
    async_stream::stream! {
        let _guard = temp_dir;
        let mut rest = ReaderStream::new(file);
        while let Some(chunk) = rest.next().await {
            yield chunk;
        }
    }
}

fn uuid_like() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_watch_and_short_urls() {
        assert!(is_youtube_watch_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(is_youtube_watch_url("https://youtu.be/dQw4w9WgXcQ"));
    }

    #[test]
    fn rejects_non_youtube_urls() {
        assert!(!is_youtube_watch_url("https://cdn.example.com/video.mp4"));
    }
}
