//! `/merge`: combines a separate video and audio upstream into one file
//! (§4.8). Tries an audio stream-copy first when asked; if the muxer fails
//! before any bytes reach the client, retries once with audio transcoding.

use std::time::Duration;

use axum::body::Body;
use axum::http::Response;

use super::muxer;
use crate::errors::GatewayResult;

pub const MERGED_CONTENT_TYPE: &str = "video/mp4";

/// Runs the merge, retrying with transcoded audio if a copy-audio attempt
/// fails before producing any output. A failure on the retry itself is
/// returned as-is. `max_duration` bounds each attempt's wall-clock time.
pub async fn run(
    muxer_command: &str,
    video_url: &str,
    audio_url: &str,
    headers: &[(&str, &str)],
    copy_audio: bool,
    max_duration: Duration,
) -> GatewayResult<Response<Body>> {
    if copy_audio {
        let args = muxer::merge_args_copy_audio(video_url, audio_url, headers);
        match muxer::run_and_stream(muxer_command, &args, MERGED_CONTENT_TYPE, max_duration).await {
            Ok(response) => return Ok(response),
            Err(e) => {
                tracing::warn!(error = %e, "copy-audio merge failed before first byte, retrying with transcode");
            }
        }
    }

    let args = muxer::merge_args_transcode_audio(video_url, audio_url, headers);
    muxer::run_and_stream(muxer_command, &args, MERGED_CONTENT_TYPE, max_duration).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn falls_back_to_transcode_when_muxer_is_unavailable() {
        // With no real ffmpeg on PATH, both attempts fail to spawn; the
        // function should still surface the transcode attempt's error rather
        // than panicking or hanging.
        let result = run(
            "/nonexistent/ffmpeg",
            "https://cdn/v.mp4",
            "https://cdn/a.mp4",
            &[],
            true,
            std::time::Duration::from_secs(60),
        )
        .await;
        assert!(result.is_err());
    }
}
