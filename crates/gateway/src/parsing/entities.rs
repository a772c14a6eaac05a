//! HTML entity and JavaScript string-escape decoding.
//!
//! Covers the three escape families that actually show up in scraped
//! `<script>` JSON blobs: named HTML entities, numeric HTML entities
//! (decimal and hex), and JavaScript string escapes (`\uXXXX`, `\xHH`,
//! `\/`).

use std::borrow::Cow;

const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&nbsp;", "\u{a0}"),
];

pub fn decode_html_entities(input: &str) -> String {
    if !input.contains('&') && !input.contains('\\') {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices().peekable();
    let bytes = input.as_bytes();

    while let Some((i, c)) = chars.next() {
        if c == '&' {
            if let Some(rest) = input.get(i..) {
                if let Some((decoded, consumed)) = decode_entity_at(rest) {
                    out.push_str(&decoded);
                    advance_chars(&mut chars, consumed.saturating_sub(1));
                    continue;
                }
            }
            out.push(c);
        } else if c == '\\' && i + 1 < bytes.len() {
            if let Some(rest) = input.get(i..) {
                if let Some((decoded, consumed)) = decode_js_escape_at(rest) {
                    out.push(decoded);
                    advance_chars(&mut chars, consumed.saturating_sub(1));
                    continue;
                }
            }
            out.push(c);
        } else {
            out.push(c);
        }
    }
    out
}

fn advance_chars(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>, n: usize) {
    for _ in 0..n {
        chars.next();
    }
}

fn decode_entity_at(s: &str) -> Option<(Cow<'static, str>, usize)> {
    for (entity, replacement) in NAMED_ENTITIES {
        if s.starts_with(entity) {
            return Some((Cow::Borrowed(*replacement), entity.chars().count()));
        }
    }

    if let Some(hex) = s.strip_prefix("&#x").or_else(|| s.strip_prefix("&#X")) {
        let end = hex.find(';')?;
        let code = u32::from_str_radix(&hex[..end], 16).ok()?;
        let ch = char::from_u32(code)?;
        return Some((Cow::Owned(ch.to_string()), 3 + end + 1));
    }

    if let Some(dec) = s.strip_prefix("&#") {
        let end = dec.find(';')?;
        let code: u32 = dec[..end].parse().ok()?;
        let ch = char::from_u32(code)?;
        return Some((Cow::Owned(ch.to_string()), 2 + end + 1));
    }

    None
}

fn decode_js_escape_at(s: &str) -> Option<(char, usize)> {
    let rest = s.strip_prefix('\\')?;
    if let Some(hex) = rest.strip_prefix('u') {
        let code = u32::from_str_radix(hex.get(..4)?, 16).ok()?;
        return Some((char::from_u32(code)?, 6));
    }
    if let Some(hex) = rest.strip_prefix('x') {
        let code = u32::from_str_radix(hex.get(..2)?, 16).ok()?;
        return Some((char::from_u32(code)?, 4));
    }
    if let Some(stripped) = rest.strip_prefix('/') {
        let _ = stripped;
        return Some(('/', 2));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_named_entities() {
        assert_eq!(decode_html_entities("Tom &amp; Jerry"), "Tom & Jerry");
    }

    #[test]
    fn decodes_numeric_entities() {
        assert_eq!(decode_html_entities("&#65;&#x42;"), "AB");
    }

    #[test]
    fn decodes_js_escapes() {
        assert_eq!(decode_html_entities(r"café"), "café");
        assert_eq!(decode_html_entities(r"a\/b"), "a/b");
        assert_eq!(decode_html_entities(r"\x41"), "A");
    }

    #[test]
    fn leaves_plain_text_untouched() {
        assert_eq!(decode_html_entities("no escapes here"), "no escapes here");
    }
}
