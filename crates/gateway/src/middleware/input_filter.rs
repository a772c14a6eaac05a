//! Malicious-input pattern filter (§4.9.2, P9): path traversal, shell
//! metacharacters, XSS, and a lightweight SQLi pattern set, checked after
//! fully percent-decoding the input up to 5 layers deep.

const MAX_DECODE_DEPTH: u32 = 5;

const TRAVERSAL_PATTERNS: &[&str] = &["../", "..\\", "%2e%2e", "/etc/passwd", "/proc/self"];
const CONTROL_PATTERNS: &[char] = &['\0', '\r', '\n'];
const SHELL_PATTERNS: &[&str] = &["`", "$(", "${", "&&", "||", ";"];
const XSS_PATTERNS: &[&str] = &[
    "<script",
    "javascript:",
    "<iframe",
    "<object",
    "<embed",
    "expression(",
    "data:text/html",
    "onerror=",
    "onload=",
    "onclick=",
];
const SQLI_PATTERNS: &[&str] = &[
    "union select",
    "' or '1'='1",
    "or 1=1",
    "drop table",
    "; --",
    "xp_cmdshell",
];

/// Decodes one layer of `%XX` percent-encoding. Leaves malformed escapes
/// untouched rather than failing, since a half-decoded attack string is
/// still something the pattern set should see.
fn percent_decode_once(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Ok(hex) = std::str::from_utf8(&bytes[i + 1..i + 3]) {
                if let Ok(byte) = u8::from_str_radix(hex, 16) {
                    out.push(byte);
                    i += 3;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Fully decodes up to [`MAX_DECODE_DEPTH`] layers, stopping early once a
/// round of decoding is a no-op.
fn fully_decode(input: &str) -> String {
    let mut current = input.to_string();
    for _ in 0..MAX_DECODE_DEPTH {
        let decoded = percent_decode_once(&current);
        if decoded == current {
            break;
        }
        current = decoded;
    }
    current
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    PathTraversal,
    ControlCharacter,
    ShellMetacharacter,
    Xss,
    Sqli,
}

/// Checks `input` (already the owned, un-decoded string taken from a path
/// segment or query parameter) against every pattern set at every decode
/// depth up to 5.
pub fn scan(input: &str) -> Option<Violation> {
    let decoded = fully_decode(input);
    let lower = decoded.to_ascii_lowercase();

    if TRAVERSAL_PATTERNS.iter().any(|p| lower.contains(p)) {
        return Some(Violation::PathTraversal);
    }
    if decoded.chars().any(|c| CONTROL_PATTERNS.contains(&c)) {
        return Some(Violation::ControlCharacter);
    }
    if SHELL_PATTERNS.iter().any(|p| decoded.contains(p)) {
        return Some(Violation::ShellMetacharacter);
    }
    if XSS_PATTERNS.iter().any(|p| lower.contains(p)) {
        return Some(Violation::Xss);
    }
    if SQLI_PATTERNS.iter().any(|p| lower.contains(p)) {
        return Some(Violation::Sqli);
    }
    None
}

/// Endpoints that legitimately carry long signed URLs in their query string
/// and so are exempt from query-parameter scanning (path is still checked).
pub fn query_scan_exempt(path: &str) -> bool {
    matches!(
        path,
        "/hls-stream" | "/hls-proxy" | "/stream" | "/download" | "/merge"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_path_traversal() {
        assert_eq!(scan("../../etc/passwd"), Some(Violation::PathTraversal));
    }

    #[test]
    fn detects_traversal_through_one_layer_of_percent_encoding() {
        assert_eq!(scan("%2e%2e%2fetc%2fpasswd"), Some(Violation::PathTraversal));
    }

    #[test]
    fn detects_traversal_through_double_encoding() {
        // %252e%252e decodes to %2e%2e after one pass, then ".." after a second.
        assert_eq!(scan("%252e%252e/"), Some(Violation::PathTraversal));
    }

    #[test]
    fn detects_script_tags_case_insensitively() {
        assert_eq!(scan("<SCRIPT>alert(1)</SCRIPT>"), Some(Violation::Xss));
    }

    #[test]
    fn detects_javascript_uri() {
        assert_eq!(scan("javascript:alert(document.cookie)"), Some(Violation::Xss));
    }

    #[test]
    fn detects_shell_command_substitution() {
        assert_eq!(scan("$(rm -rf /)"), Some(Violation::ShellMetacharacter));
    }

    #[test]
    fn detects_sql_injection_patterns() {
        assert_eq!(scan("1' OR '1'='1"), Some(Violation::Sqli));
    }

    #[test]
    fn detects_embedded_crlf() {
        assert_eq!(scan("value\r\nSet-Cookie: evil=1"), Some(Violation::ControlCharacter));
    }

    #[test]
    fn allows_ordinary_input() {
        assert_eq!(scan("https://example.com/video/123"), None);
    }

    #[test]
    fn delivery_endpoints_are_exempt_from_query_scanning() {
        assert!(query_scan_exempt("/stream"));
        assert!(!query_scan_exempt("/extract"));
    }
}
