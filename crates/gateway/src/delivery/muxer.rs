//! External muxer invocation (§4.8): builds the FFmpeg argument vector for
//! each of the four documented `/hls-stream` cases plus `/merge`, then
//! spawns the subprocess and pipes its stdout to the response.

use std::process::Stdio;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::time::Instant;
use tokio_stream::StreamExt;
use tokio_util::io::ReaderStream;

use crate::errors::{GatewayError, GatewayResult};

/// Tried in order; the first one found on disk wins. A static binary
/// bundled in the dependency tree is the last resort.
const MUXER_CANDIDATES: &[&str] = &["/usr/bin/ffmpeg", "/usr/local/bin/ffmpeg"];

pub fn discover_muxer(configured: &str) -> String {
    if !configured.is_empty() && configured != "ffmpeg" {
        return configured.to_string();
    }
    MUXER_CANDIDATES
        .iter()
        .find(|path| std::path::Path::new(path).exists())
        .map(|path| path.to_string())
        .unwrap_or_else(|| "ffmpeg".to_string())
}

fn input_args(url: &str, headers: &[(&str, &str)]) -> Vec<String> {
    let mut args = Vec::new();
    if !headers.is_empty() {
        let header_block = headers
            .iter()
            .map(|(k, v)| format!("{k}: {v}\r\n"))
            .collect::<String>();
        args.push("-headers".to_string());
        args.push(header_block);
    }
    args.push("-i".to_string());
    args.push(url.to_string());
    args
}

const FRAGMENTED_MP4_FLAGS: &str = "frag_keyframe+empty_moov+default_base_moof";

/// HLS audio-only: transcode to MP3 192 kbps.
pub fn hls_audio_args(url: &str, headers: &[(&str, &str)]) -> Vec<String> {
    let mut args = input_args(url, headers);
    args.extend(
        ["-vn", "-c:a", "libmp3lame", "-b:a", "192k", "-f", "mp3", "pipe:1"]
            .iter()
            .map(|s| s.to_string()),
    );
    args
}

/// HLS video: copy video, transcode audio to AAC 128 kbps, fragmented MP4.
pub fn hls_video_args(url: &str, headers: &[(&str, &str)]) -> Vec<String> {
    let mut args = input_args(url, headers);
    args.extend(
        [
            "-c:v", "copy", "-c:a", "aac", "-b:a", "128k", "-movflags", FRAGMENTED_MP4_FLAGS,
            "-f", "mp4", "pipe:1",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    args
}

/// BiliBili DASH with separate video/audio inputs: copy video, transcode
/// audio, explicit stream mapping, fragmented MP4.
pub fn dash_video_audio_args(
    video_url: &str,
    audio_url: &str,
    headers: &[(&str, &str)],
) -> Vec<String> {
    let mut args = input_args(video_url, headers);
    args.extend(input_args(audio_url, headers));
    args.extend(
        [
            "-map", "0:v:0", "-map", "1:a:0", "-c:v", "copy", "-c:a", "aac", "-b:a", "128k",
            "-movflags", FRAGMENTED_MP4_FLAGS, "-f", "mp4", "pipe:1",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    args
}

/// BiliBili DASH audio-only: transcode to MP3.
pub fn dash_audio_args(url: &str, headers: &[(&str, &str)]) -> Vec<String> {
    hls_audio_args(url, headers)
}

/// `/merge`: combine two upstreams into fragmented MP4. `copy_audio` selects
/// an audio stream-copy attempt (the caller retries once with
/// [`merge_args_transcode_audio`] if this fails before any bytes flow).
pub fn merge_args_copy_audio(video_url: &str, audio_url: &str, headers: &[(&str, &str)]) -> Vec<String> {
    let mut args = input_args(video_url, headers);
    args.extend(input_args(audio_url, headers));
    args.extend(
        [
            "-map", "0:v:0", "-map", "1:a:0", "-c:v", "copy", "-c:a", "copy", "-movflags",
            FRAGMENTED_MP4_FLAGS, "-f", "mp4", "pipe:1",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    args
}

pub fn merge_args_transcode_audio(video_url: &str, audio_url: &str, headers: &[(&str, &str)]) -> Vec<String> {
    dash_video_audio_args(video_url, audio_url, headers)
}

/// Spawns the muxer with stdout/stderr piped, returning the child process
/// so the caller can stream stdout and inspect the exit status.
pub fn spawn(muxer_command: &str, args: &[String]) -> GatewayResult<Child> {
    Command::new(muxer_command)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            tracing::warn!(detail = %e, "muxer spawn failed");
            GatewayError::FfmpegNotAvailable
        })
}

/// Takes ownership of the child's stdout, panicking only if called twice —
/// `Command::stdout(Stdio::piped())` guarantees it's present on first call.
pub fn take_stdout(child: &mut Child) -> impl AsyncRead + Unpin + Send + 'static {
    child.stdout.take().expect("stdout was piped at spawn")
}

/// Spawns the muxer and streams its stdout as the HTTP response body.
///
/// Reads the first chunk before committing the response: if the process
/// exits non-zero before producing any output, the handler can still return
/// a clean `CONVERSION_FAILED` error instead of a response that started
/// streaming and then died. Once the first chunk is in hand the response is
/// committed — a later non-zero exit just ends the stream.
///
/// `max_duration` bounds the muxer's whole wall-clock lifetime (§5): a hung
/// ffmpeg is killed once the deadline passes, whether that's before the
/// first chunk or partway through the stream.
pub async fn run_and_stream(
    muxer_command: &str,
    args: &[String],
    content_type: &'static str,
    max_duration: Duration,
) -> GatewayResult<Response<Body>> {
    let mut child = spawn(muxer_command, args)?;
    let mut stdout = take_stdout(&mut child);
    let deadline = Instant::now() + max_duration;

    let mut first_chunk = [0u8; 64 * 1024];
    let n = match tokio::time::timeout_at(deadline, stdout.read(&mut first_chunk)).await {
        Ok(Ok(n)) => n,
        Ok(Err(e)) => {
            let _ = child.kill().await;
            return Err(GatewayError::Internal(e.to_string()));
        }
        Err(_) => {
            let _ = child.kill().await;
            tracing::warn!("muxer exceeded wall-clock limit before producing output");
            return Err(GatewayError::ConversionFailed);
        }
    };

    if n == 0 {
        // EOF with nothing written: the process either exited already or is
        // about to. Either way there are no bytes to salvage.
        let status = child.wait().await.ok();
        tracing::warn!(?status, "muxer produced no output");
        return Err(GatewayError::ConversionFailed);
    }

    let first = Bytes::copy_from_slice(&first_chunk[..n]);

    // `child` is moved into the generator so it lives exactly as long as the
    // stream does: a client disconnect drops the axum body, which drops this
    // stream, which drops `child` — and `kill_on_drop` terminates the
    // subprocess. The deadline race covers the case the client stays
    // connected but the muxer itself hangs.
    let combined = async_stream::stream! {
        yield Ok::<_, std::io::Error>(first);
        let mut rest = ReaderStream::new(stdout);
        loop {
            tokio::select! {
                chunk = rest.next() => {
                    match chunk {
                        Some(chunk) => yield chunk,
                        None => break,
                    }
                }
                _ = tokio::time::sleep_until(deadline) => {
                    tracing::warn!("muxer exceeded wall-clock limit mid-stream");
                    break;
                }
            }
        }
        drop(child);
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::ACCEPT_RANGES, "none")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(Body::from_stream(combined))
        .map_err(|e| GatewayError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hls_audio_transcodes_to_mp3_192k() {
        let args = hls_audio_args("https://cdn.example.com/a.m3u8", &[]);
        assert!(args.windows(2).any(|w| w == ["-b:a", "192k"]));
        assert!(args.contains(&"libmp3lame".to_string()));
    }

    #[test]
    fn hls_video_copies_video_and_transcodes_audio() {
        let args = hls_video_args("https://cdn.example.com/v.m3u8", &[]);
        assert!(args.windows(2).any(|w| w == ["-c:v", "copy"]));
        assert!(args.windows(2).any(|w| w == ["-c:a", "aac"]));
        assert!(args.contains(&FRAGMENTED_MP4_FLAGS.to_string()));
    }

    #[test]
    fn dash_video_audio_maps_two_inputs_explicitly() {
        let args = dash_video_audio_args("https://cdn/v.m4s", "https://cdn/a.m4s", &[]);
        assert!(args.windows(2).any(|w| w == ["-map", "0:v:0"]));
        assert!(args.windows(2).any(|w| w == ["-map", "1:a:0"]));
    }

    #[test]
    fn merge_copy_audio_variant_copies_both_streams() {
        let args = merge_args_copy_audio("https://cdn/v.mp4", "https://cdn/a.mp4", &[]);
        assert!(args.windows(2).any(|w| w == ["-c:v", "copy"]));
        assert!(args.windows(2).any(|w| w == ["-c:a", "copy"]));
    }

    #[test]
    fn merge_transcode_audio_variant_transcodes_instead() {
        let args = merge_args_transcode_audio("https://cdn/v.mp4", "https://cdn/a.mp4", &[]);
        assert!(args.windows(2).any(|w| w == ["-c:a", "aac"]));
    }

    #[test]
    fn input_headers_are_formatted_as_a_single_crlf_block() {
        let args = input_args("https://cdn/v.mp4", &[("Referer", "https://example.com")]);
        let header_idx = args.iter().position(|a| a == "-headers").unwrap();
        assert_eq!(args[header_idx + 1], "Referer: https://example.com\r\n");
    }

    #[test]
    fn discover_muxer_falls_back_to_bare_command_when_nothing_is_found() {
        assert_eq!(discover_muxer(""), "ffmpeg");
    }
}
