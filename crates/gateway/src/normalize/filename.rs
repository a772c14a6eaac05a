//! Filename synthesis (§4.6, P11): deterministic, filesystem-safe names for
//! delivered media, built the same way regardless of platform.

/// Characters illegal (or awkward) in a filename on at least one of
/// Windows/macOS/Linux.
const ILLEGAL_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|', '\0'];

/// Removes control characters and filesystem-illegal characters, collapses
/// whitespace runs to a single underscore, and truncates to `max_len`
/// without ever leaving a leading/trailing underscore (P11).
pub fn sanitize(input: &str, max_len: usize) -> String {
    let mut out = String::with_capacity(input.len().min(max_len));
    let mut last_was_underscore = false;

    for c in input.chars() {
        if c.is_control() {
            continue;
        }
        if c.is_whitespace() || ILLEGAL_CHARS.contains(&c) {
            if !last_was_underscore && !out.is_empty() {
                out.push('_');
                last_was_underscore = true;
            }
            continue;
        }
        out.push(c);
        last_was_underscore = false;
        if out.chars().count() >= max_len {
            break;
        }
    }

    out.trim_matches('_').to_string()
}

/// `sanitize(author,20)_contentType_sanitize(title,40)[_index+1]_quality.extension`.
#[allow(clippy::too_many_arguments)]
pub fn synthesize_filename(
    author: &str,
    content_type: &str,
    title: &str,
    quality: &str,
    extension: &str,
    index: usize,
    total_items: usize,
    needs_index: bool,
) -> String {
    let author = sanitize(author, 20);
    let title = sanitize(title, 40);
    let quality = sanitize(quality, 20);
    let extension = extension.trim_start_matches('.');

    let mut parts = Vec::new();
    if !author.is_empty() {
        parts.push(author);
    }
    parts.push(content_type.to_string());
    if !title.is_empty() {
        parts.push(title);
    }
    if total_items > 1 || needs_index {
        parts.push((index + 1).to_string());
    }
    parts.push(quality);

    let base = parts.into_iter().filter(|p| !p.is_empty()).collect::<Vec<_>>().join("_");
    if extension.is_empty() {
        base
    } else {
        format!("{base}.{extension}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_collapses_whitespace_and_strips_illegal_chars() {
        assert_eq!(sanitize("My  Cool: Video?!", 100), "My_Cool_Video!");
    }

    #[test]
    fn sanitize_never_leaves_leading_or_trailing_underscore() {
        assert_eq!(sanitize("  leading and trailing  ", 100), "leading_and_trailing");
    }

    #[test]
    fn sanitize_truncates_to_budget() {
        let long = "a".repeat(50);
        assert_eq!(sanitize(&long, 20).chars().count(), 20);
    }

    #[test]
    fn sanitize_preserves_unicode_letters() {
        assert_eq!(sanitize("日本語のタイトル", 40), "日本語のタイトル");
    }

    #[test]
    fn synthesizes_full_filename() {
        let name = synthesize_filename("jane doe", "video", "a cool clip", "hd", "mp4", 0, 1, false);
        assert_eq!(name, "jane_doe_video_a_cool_clip_hd.mp4");
    }

    #[test]
    fn synthesizes_with_index_for_multi_item_carousels() {
        let name = synthesize_filename("jane", "image", "carousel", "original", "jpg", 2, 5, false);
        assert_eq!(name, "jane_image_carousel_3_original.jpg");
    }
}
