//! SSRF protection (§4.9.3, P10): rejects upstream targets that would let a
//! caller use this gateway to reach internal infrastructure.

use std::net::IpAddr;
use std::str::FromStr;

use ipnet::IpNet;
use url::Url;

/// CIDR ranges a caller-supplied URL's host must not resolve into.
fn blocked_cidrs() -> &'static [&'static str] {
    &[
        "127.0.0.0/8",
        "10.0.0.0/8",
        "172.16.0.0/12",
        "192.168.0.0/16",
        "169.254.0.0/16",
        "::1/128",
        "fc00::/7",
        "fe80::/10",
        // cloud metadata endpoints
        "169.254.169.254/32",
    ]
}

fn is_blocked_ip(ip: IpAddr) -> bool {
    blocked_cidrs()
        .iter()
        .filter_map(|cidr| IpNet::from_str(cidr).ok())
        .any(|net| net.contains(&ip))
}

fn is_blocked_suffix(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host.ends_with(".internal") || host.ends_with(".local") || host == "localhost"
}

/// A numeric-only hostname (`2130706433`), or a segment written in octal
/// (`0177`) or hex (`0x7f`), is a disguised IP literal parsers may treat
/// differently than they display — reject outright rather than try to
/// decode it faithfully.
fn is_disguised_ip_literal(host: &str) -> bool {
    if host.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    host.split('.').any(|segment| {
        segment.starts_with("0x")
            || segment.starts_with("0X")
            || (segment.len() > 1 && segment.starts_with('0') && segment.chars().all(|c| c.is_ascii_digit()))
    })
}

/// `extra` is the deployment's additional blocklist (`security.extra_blocked_hosts`).
pub fn is_blocked_host(host: &str, extra: &[String]) -> bool {
    if is_blocked_suffix(host) || is_disguised_ip_literal(host) {
        return true;
    }
    if let Ok(ip) = host.parse::<IpAddr>() {
        if is_blocked_ip(ip) {
            return true;
        }
    }
    extra.iter().any(|blocked| blocked.eq_ignore_ascii_case(host))
}

/// Parses `raw` and checks scheme + host against the blocklist. Returns the
/// parsed `Url` on success.
pub fn validate_upstream_url(raw: &str, extra_blocked_hosts: &[String]) -> Result<Url, &'static str> {
    let url = Url::parse(raw).map_err(|_| "malformed URL")?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err("unsupported scheme");
    }
    let host = url.host_str().ok_or("missing host")?;
    if is_blocked_host(host, extra_blocked_hosts) {
        return Err("blocked host");
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_loopback_and_private_ranges() {
        assert!(is_blocked_host("127.0.0.1", &[]));
        assert!(is_blocked_host("10.1.2.3", &[]));
        assert!(is_blocked_host("192.168.1.1", &[]));
        assert!(is_blocked_host("169.254.169.254", &[]));
    }

    #[test]
    fn blocks_internal_and_local_suffixes() {
        assert!(is_blocked_host("service.internal", &[]));
        assert!(is_blocked_host("printer.local", &[]));
        assert!(is_blocked_host("localhost", &[]));
    }

    #[test]
    fn blocks_numeric_octal_and_hex_ip_literals() {
        assert!(is_blocked_host("2130706433", &[]));
        assert!(is_blocked_host("0177.0.0.1", &[]));
        assert!(is_blocked_host("0x7f.0.0.1", &[]));
    }

    #[test]
    fn allows_ordinary_public_hostnames() {
        assert!(!is_blocked_host("cdn.example.com", &[]));
        assert!(!is_blocked_host("93.184.216.34", &[]));
    }

    #[test]
    fn rejects_non_http_schemes() {
        assert_eq!(
            validate_upstream_url("file:///etc/passwd", &[]),
            Err("unsupported scheme")
        );
    }

    #[test]
    fn rejects_blocked_hosts_end_to_end() {
        assert_eq!(
            validate_upstream_url("http://127.0.0.1/admin", &[]),
            Err("blocked host")
        );
    }

    #[test]
    fn honors_deployment_specific_extra_blocklist() {
        let extra = vec!["evil.example.com".to_string()];
        assert!(is_blocked_host("evil.example.com", &extra));
        assert!(!is_blocked_host("fine.example.com", &extra));
    }
}
