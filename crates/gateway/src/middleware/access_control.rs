//! Origin/API-key gating (§4.9.4).

/// Routes that bypass the origin/key check entirely, because they're either
/// meant to be embedded directly (`<video src="/stream?...">`) or are
/// themselves the public entry points.
const PUBLIC_ROUTES: &[&str] = &[
    "/stream",
    "/download",
    "/thumbnail",
    "/hls-proxy",
    "/hls-stream",
    "/merge",
    "/events",
    "/changelog",
    "/extract",
    "/health",
];

pub fn is_public_route(path: &str) -> bool {
    PUBLIC_ROUTES.iter().any(|route| path == *route || path.starts_with(route))
}

fn origin_allowed(origin: &str, allowed: &[String]) -> bool {
    allowed.iter().any(|prefix| origin.starts_with(prefix.as_str()))
}

/// Accepts if `api_key` matches a configured key, or if `origin`/`referer`
/// starts with an allowed origin. `origin` is checked before `referer`,
/// matching the order callers are most likely to send them in.
pub fn is_allowed(
    api_key: Option<&str>,
    origin: Option<&str>,
    referer: Option<&str>,
    configured_keys: &[String],
    allowed_origins: &[String],
) -> bool {
    if let Some(key) = api_key {
        if configured_keys.iter().any(|k| k == key) {
            return true;
        }
    }
    if let Some(origin) = origin {
        if origin_allowed(origin, allowed_origins) {
            return true;
        }
    }
    if let Some(referer) = referer {
        if origin_allowed(referer, allowed_origins) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_routes_bypass_regardless_of_credentials() {
        assert!(is_public_route("/extract"));
        assert!(is_public_route("/stream"));
        assert!(is_public_route("/hls-proxy"));
        assert!(!is_public_route("/admin"));
    }

    #[test]
    fn accepts_a_configured_api_key() {
        let keys = vec!["secret-key".to_string()];
        assert!(is_allowed(Some("secret-key"), None, None, &keys, &[]));
    }

    #[test]
    fn accepts_an_allowed_origin() {
        let allowed = vec!["https://app.example.com".to_string()];
        assert!(is_allowed(None, Some("https://app.example.com"), None, &[], &allowed));
    }

    #[test]
    fn falls_back_to_referer_when_origin_is_absent() {
        let allowed = vec!["https://app.example.com".to_string()];
        assert!(is_allowed(
            None,
            None,
            Some("https://app.example.com/dashboard"),
            &[],
            &allowed
        ));
    }

    #[test]
    fn rejects_unknown_credentials() {
        let allowed = vec!["https://app.example.com".to_string()];
        assert!(!is_allowed(Some("wrong"), Some("https://evil.example.com"), None, &[], &allowed));
    }
}
