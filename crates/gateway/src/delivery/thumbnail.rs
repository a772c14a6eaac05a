//! Thumbnail proxy (§4.8): like [`super::stream`], but restricted to a
//! fixed set of CDN hostnames so it can't be used as a general image relay.

use url::Url;

/// Hostname suffixes thumbnails may be fetched from. A request for any other
/// host is rejected before the upstream is ever contacted.
const ALLOWED_SUFFIXES: &[&str] = &[
    "fbcdn.net",
    "cdninstagram.com",
    "twimg.com",
    "tiktokcdn.com",
    "tiktokcdn-us.com",
    "pximg.net",
    "ytimg.com",
    "ggpht.com",
];

pub fn is_allowed_thumbnail_host(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    ALLOWED_SUFFIXES.iter().any(|suffix| host == *suffix || host.ends_with(&format!(".{suffix}")))
}

/// 24h per §5's thumbnail cache TTL.
pub const CACHE_CONTROL: &str = "public, max-age=86400, immutable";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_known_cdn_subdomains() {
        assert!(is_allowed_thumbnail_host("https://scontent.cdninstagram.com/v/t1.jpg"));
        assert!(is_allowed_thumbnail_host("https://pbs.twimg.com/media/abc.jpg"));
    }

    #[test]
    fn rejects_arbitrary_hosts() {
        assert!(!is_allowed_thumbnail_host("https://evil.example.com/steal.jpg"));
    }

    #[test]
    fn rejects_hosts_that_merely_contain_an_allowed_suffix() {
        assert!(!is_allowed_thumbnail_host("https://notfbcdn.net.evil.com/x.jpg"));
    }
}
