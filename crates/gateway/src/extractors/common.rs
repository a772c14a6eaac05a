//! Shared building blocks every native extractor reuses: the content-issue
//! (tombstone) filter and a couple of conventional user-agent strings.

use crate::errors::GatewayError;

pub const MOBILE_USER_AGENT: &str =
    "Mozilla/5.0 (iPad; CPU OS 16_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.0 Mobile/15E148 Safari/604.1";

pub const DESKTOP_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Markers that indicate a fetched fragment is a tombstone rather than real
/// content, checked once the buffer crosses its readiness threshold.
const AGE_RESTRICTED_MARKERS: &[&str] = &["age-restricted", "confirm your age", "content_warning"];
const PRIVATE_MARKERS: &[&str] = &["this account is private", "this profile is private"];
const DELETED_MARKERS: &[&str] = &[
    "sorry, this content isn't available",
    "this page isn't available",
    "content has been deleted",
];
const LOGIN_REQUIRED_MARKERS: &[&str] = &["log in to continue", "login_required", "please log in"];
const STORY_EXPIRED_MARKERS: &[&str] = &["story has expired", "story no longer available"];

/// Readiness threshold (§4.4): only run the tombstone filter once the
/// buffer holds at least this many bytes, to avoid false positives on a
/// half-fetched fragment.
pub const CONTENT_ISSUE_READY_BYTES: u64 = 50 * 1024;

/// Scans `fragment` for one of the documented tombstone markers and returns
/// the matching error, if any. Checked in a fixed priority order since a
/// page can legitimately mention more than one state (e.g. a deleted story).
pub fn detect_content_issue(fragment: &str) -> Option<GatewayError> {
    let lower = fragment.to_ascii_lowercase();
    if STORY_EXPIRED_MARKERS.iter().any(|m| lower.contains(m)) {
        return Some(GatewayError::StoryExpired);
    }
    if DELETED_MARKERS.iter().any(|m| lower.contains(m)) {
        return Some(GatewayError::DeletedContent);
    }
    if LOGIN_REQUIRED_MARKERS.iter().any(|m| lower.contains(m)) {
        return Some(GatewayError::LoginRequired);
    }
    if PRIVATE_MARKERS.iter().any(|m| lower.contains(m)) {
        return Some(GatewayError::PrivateContent);
    }
    if AGE_RESTRICTED_MARKERS.iter().any(|m| lower.contains(m)) {
        return Some(GatewayError::AgeRestricted);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_deleted_before_login_when_both_present() {
        let html = "this page isn't available. please log in to see more.";
        assert!(matches!(
            detect_content_issue(html),
            Some(GatewayError::DeletedContent)
        ));
    }

    #[test]
    fn returns_none_for_clean_fragment() {
        assert!(detect_content_issue("<html><body>hello</body></html>").is_none());
    }
}
