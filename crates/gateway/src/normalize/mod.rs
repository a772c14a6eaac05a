//! Result Normalizer (C6): MIME/size analysis, filename synthesis, URL
//! registry insertion, and response envelope construction, applied to
//! every successful [`ExtractResult`] before it's returned to the client.

pub mod filename;
pub mod mime;

use std::time::Instant;

use crate::model::{AccessMode, ExtractResult, ResponseMeta, SizeConfidence};
use crate::registry::UrlRegistry;

pub use filename::{sanitize, synthesize_filename};
pub use mime::{analyze_source, MimeInfo};

/// Inserts every source URL and item thumbnail into the registry, stamping
/// the returned fingerprint back onto the result, synthesizes filenames,
/// and fills in `meta`.
pub async fn normalize(
    mut result: ExtractResult,
    registry: &UrlRegistry,
    started: Instant,
    access_mode: AccessMode,
) -> ExtractResult {
    let author = result.author.clone().unwrap_or_default();
    let title = result.title.clone().unwrap_or_default();
    let content_type = result.content_type.clone();
    let total_items = result.items.len();

    for item in &mut result.items {
        if let Some(thumbnail) = &item.thumbnail {
            item.thumbnail_hash = Some(registry.add(thumbnail).await);
        }

        let source_count = item.sources.len();
        for source in &mut item.sources {
            analyze_source(source, None);
            source.hash = Some(registry.add(&source.url).await);
            let extension = source.extension.clone().unwrap_or_default();
            source.filename = Some(synthesize_filename(
                &author,
                &content_type,
                &title,
                &source.quality,
                &extension,
                item.index,
                total_items,
                source_count > 1,
            ));
        }
    }

    result.meta = ResponseMeta::new(started, access_mode, result.used_cookie);
    result
}

/// §4.6: the normalizer must never claim `exact` size for an adaptive
/// container unless both bandwidth and duration were actually known.
pub fn size_confidence_for(
    content_length: Option<u64>,
    bitrate_kbps: Option<u32>,
    duration_secs: Option<f64>,
) -> (Option<u64>, Option<SizeConfidence>) {
    if let Some(len) = content_length {
        return (Some(len), Some(SizeConfidence::Exact));
    }
    if let (Some(bitrate), Some(duration)) = (bitrate_kbps, duration_secs) {
        let estimated = (bitrate as f64 * 1000.0 / 8.0 * duration) as u64;
        return (Some(estimated), Some(SizeConfidence::Estimated));
    }
    (None, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_is_exact_when_content_length_known() {
        let (size, confidence) = size_confidence_for(Some(1024), None, None);
        assert_eq!(size, Some(1024));
        assert_eq!(confidence, Some(SizeConfidence::Exact));
    }

    #[test]
    fn size_is_estimated_from_bitrate_and_duration() {
        let (size, confidence) = size_confidence_for(None, Some(128), Some(10.0));
        assert_eq!(size, Some(160_000));
        assert_eq!(confidence, Some(SizeConfidence::Estimated));
    }

    #[test]
    fn size_is_omitted_when_nothing_is_known() {
        let (size, confidence) = size_confidence_for(None, None, None);
        assert_eq!(size, None);
        assert_eq!(confidence, None);
    }
}
