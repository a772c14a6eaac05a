//! MIME/extension table and per-source analysis (§4.6).

use crate::model::{MediaSource, SourceFormat};

/// `(mime, extension)` pairs for the formats this gateway actually hands
/// back to a browser. Order matters only for [`mime_to_extension`]'s
/// reverse lookup: the first match for a given MIME wins.
const TABLE: &[(&str, &str)] = &[
    ("video/mp4", "mp4"),
    ("video/webm", "webm"),
    ("video/quicktime", "mov"),
    ("video/mp2t", "ts"),
    ("application/vnd.apple.mpegurl", "m3u8"),
    ("application/dash+xml", "mpd"),
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
    ("audio/mpeg", "mp3"),
    ("audio/mp4", "m4a"),
    ("audio/aac", "aac"),
    ("audio/ogg", "ogg"),
];

pub fn mime_to_extension(mime: &str) -> Option<&'static str> {
    TABLE.iter().find(|(m, _)| *m == mime).map(|(_, ext)| *ext)
}

pub fn extension_to_mime(extension: &str) -> Option<&'static str> {
    let extension = extension.trim_start_matches('.');
    TABLE.iter().find(|(_, e)| *e == extension).map(|(m, _)| *m)
}

fn extension_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let last_segment = path.rsplit('/').next()?;
    let extension = last_segment.rsplit('.').next()?;
    (extension != last_segment && !extension.is_empty()).then(|| extension.to_ascii_lowercase())
}

#[derive(Debug, Clone, Default)]
pub struct MimeInfo {
    pub mime: Option<String>,
    pub extension: Option<String>,
    pub format: Option<SourceFormat>,
}

/// Fills in `source.mime`/`source.extension`/`source.format` from, in order
/// of confidence: an explicit upstream `Content-Type`, then the URL's file
/// extension. Leaves fields untouched if already populated by the
/// extractor (it knows more than a generic table can).
pub fn analyze_source(source: &mut MediaSource, content_type: Option<&str>) {
    if source.mime.is_none() {
        source.mime = content_type.map(|s| s.to_string()).or_else(|| {
            extension_from_url(&source.url).and_then(|ext| extension_to_mime(&ext)).map(str::to_string)
        });
    }
    if source.extension.is_none() {
        source.extension = source
            .mime
            .as_deref()
            .and_then(mime_to_extension)
            .map(str::to_string)
            .or_else(|| extension_from_url(&source.url));
    }
    if source.format.is_none() {
        source.format = match source.extension.as_deref() {
            Some("m3u8") => Some(SourceFormat::Hls),
            Some("mpd") => Some(SourceFormat::Dash),
            Some(_) => Some(SourceFormat::Progressive),
            None => None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_and_extension_are_inverse_for_table_entries() {
        for (mime, ext) in TABLE {
            assert_eq!(mime_to_extension(mime), Some(*ext));
            assert_eq!(extension_to_mime(ext), Some(*mime));
        }
    }

    #[test]
    fn analyzes_from_content_type_first() {
        let mut source = MediaSource {
            url: "https://cdn.example.com/video".into(),
            ..Default::default()
        };
        analyze_source(&mut source, Some("video/mp4"));
        assert_eq!(source.mime.as_deref(), Some("video/mp4"));
        assert_eq!(source.extension.as_deref(), Some("mp4"));
        assert_eq!(source.format, Some(SourceFormat::Progressive));
    }

    #[test]
    fn falls_back_to_url_extension_when_no_content_type() {
        let mut source = MediaSource {
            url: "https://cdn.example.com/playlist.m3u8?sig=1".into(),
            ..Default::default()
        };
        analyze_source(&mut source, None);
        assert_eq!(source.extension.as_deref(), Some("m3u8"));
        assert_eq!(source.format, Some(SourceFormat::Hls));
    }
}
