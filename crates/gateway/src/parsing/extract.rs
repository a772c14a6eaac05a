//! Scoped, bounded extraction primitives used by every native extractor.
//! None of these build a DOM; they operate on substrings of an already
//! fetched fragment.

use std::collections::BTreeSet;

use regex::Regex;
use std::sync::LazyLock;

/// Substring between `start` and `end` (or `start` + `max_len` when `end` is
/// absent). Returns `None` if `start` isn't present.
pub fn extract_fragment(html: &str, start: &str, end: Option<&str>, max_len: usize) -> Option<String> {
    let from = html.find(start)? + start.len();
    let rest = &html[from..];
    let slice = match end.and_then(|e| rest.find(e)) {
        Some(end_idx) => &rest[..end_idx],
        None => {
            let cap = rest.len().min(max_len);
            let cap = floor_char_boundary(rest, cap);
            &rest[..cap]
        }
    };
    Some(slice.to_string())
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Locates a `<script>` element either by its `id` attribute or by a marker
/// string contained in its body, and returns its inner text.
pub fn extract_script_content(html: &str, id_or_marker: &str) -> Option<String> {
    let by_id_needle = format!("id=\"{id_or_marker}\"");
    let anchor = html
        .find(&by_id_needle)
        .or_else(|| html.find(id_or_marker))?;

    let tag_start = html[..anchor].rfind("<script")?;
    let body_start = html[tag_start..].find('>')? + tag_start + 1;
    let body_end = html[body_start..].find("</script>")? + body_start;
    Some(html[body_start..body_end].to_string())
}

#[derive(Debug, Clone, Default)]
pub struct MetaTags {
    pub title: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image: Option<String>,
    pub og_url: Option<String>,
}

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());
static META_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<meta[^>]+(?:property|name)=["']([^"']+)["'][^>]+content=["']([^"']*)["']"#)
        .unwrap()
});

pub fn extract_meta_tags(html: &str) -> MetaTags {
    let mut tags = MetaTags::default();
    if let Some(caps) = TITLE_RE.captures(html) {
        tags.title = caps.get(1).map(|m| m.as_str().trim().to_string());
    }
    for caps in META_RE.captures_iter(html) {
        let key = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let value = caps.get(2).map(|m| m.as_str().to_string());
        match key {
            "og:title" => tags.og_title = value,
            "og:description" => tags.og_description = value,
            "og:image" => tags.og_image = value,
            "og:url" => tags.og_url = value,
            _ => {}
        }
    }
    tags
}

/// Bounded sweep: returns at most `limit` matches of `pattern`'s first
/// capture group (or the whole match when there is no capture group).
pub fn extract_all(text: &str, pattern: &Regex, limit: usize) -> Vec<String> {
    pattern
        .captures_iter(text)
        .take(limit)
        .map(|caps| {
            caps.get(1)
                .or_else(|| caps.get(0))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        })
        .collect()
}

/// Finds the first balanced `{...}` object, optionally anchored at a start
/// marker, and parses it as JSON.
pub fn extract_json(text: &str, start_marker: Option<&str>) -> Option<serde_json::Value> {
    let search_from = match start_marker {
        Some(marker) => text.find(marker)? + marker.len(),
        None => 0,
    };
    let region = &text[search_from..];
    let open = region.find('{')?;
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    let bytes = region.as_bytes();

    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    let candidate = &region[open..=i];
                    return serde_json::from_str(candidate).ok();
                }
            }
            _ => {}
        }
    }
    None
}

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s"'<>\\]+"#).unwrap());

#[derive(Debug, Clone, Default)]
pub struct UrlFilter<'a> {
    pub protocol: Option<&'a str>,
    pub domain: Option<&'a str>,
}

/// Deduplicated, order-preserving set of URLs found in `text`.
pub fn extract_urls(text: &str, filter: &UrlFilter<'_>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut ordered = Vec::new();
    for m in URL_RE.find_iter(text) {
        let candidate = m.as_str().trim_end_matches(|c| matches!(c, ',' | ')' | ']' | '.'));
        if let Some(protocol) = filter.protocol {
            if !candidate.starts_with(protocol) {
                continue;
            }
        }
        if let Some(domain) = filter.domain {
            if !candidate.contains(domain) {
                continue;
            }
        }
        if seen.insert(candidate.to_string()) {
            ordered.push(candidate.to_string());
        }
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_fragment_between_markers() {
        let html = "prefix<<VIDEO_ID:123>>suffix<<END>>tail";
        let got = extract_fragment(html, "<<VIDEO_ID:123>>", Some("<<END>>"), 100);
        assert_eq!(got.as_deref(), Some("suffix"));
    }

    #[test]
    fn extracts_fragment_with_max_len_when_no_end() {
        let html = "marker0123456789abcdef";
        let got = extract_fragment(html, "marker", None, 5);
        assert_eq!(got.as_deref(), Some("01234"));
    }

    #[test]
    fn extracts_script_by_id() {
        let html = r#"<html><script id="shared-data" type="application/json">{"a":1}</script></html>"#;
        let got = extract_script_content(html, "shared-data").unwrap();
        assert_eq!(got, r#"{"a":1}"#);
    }

    #[test]
    fn extracts_meta_tags() {
        let html = r#"<title>Hello</title><meta property="og:title" content="Hi there">"#;
        let tags = extract_meta_tags(html);
        assert_eq!(tags.title.as_deref(), Some("Hello"));
        assert_eq!(tags.og_title.as_deref(), Some("Hi there"));
    }

    #[test]
    fn extracts_balanced_json_object() {
        let text = r#"window.__DATA__ = {"id":1,"nested":{"a":[1,2]}};"#;
        let value = extract_json(text, Some("window.__DATA__ = ")).unwrap();
        assert_eq!(value["id"], 1);
        assert_eq!(value["nested"]["a"][1], 2);
    }

    #[test]
    fn extracts_deduplicated_urls() {
        let text = "see https://a.com/x and https://a.com/x again, also https://b.com/y.";
        let urls = extract_urls(text, &UrlFilter::default());
        assert_eq!(urls, vec!["https://a.com/x", "https://b.com/y"]);
    }
}
