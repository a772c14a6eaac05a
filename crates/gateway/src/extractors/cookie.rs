//! Cookie parsing (P6): accepts a Netscape tab-delimited cookie file, a JSON
//! browser export, or a raw `name=value; ...` string, and always produces the
//! same canonical `name=value; name2=value2` form.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct JsonCookie {
    name: String,
    value: String,
}

/// Parses any of the three supported cookie representations into an ordered
/// list of `(name, value)` pairs, dropping pairs whose value is empty.
pub fn parse_cookie_pairs(input: &str) -> Vec<(String, String)> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if let Some(pairs) = try_parse_json(trimmed) {
        return pairs;
    }

    if looks_like_netscape(trimmed) {
        return parse_netscape(trimmed);
    }

    parse_raw(trimmed)
}

/// Parses and re-serializes to the canonical `name=value; name2=value2` form.
pub fn to_canonical_string(input: &str) -> String {
    parse_cookie_pairs(input)
        .into_iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

fn try_parse_json(input: &str) -> Option<Vec<(String, String)>> {
    let cookies: Vec<JsonCookie> = serde_json::from_str(input).ok()?;
    Some(
        cookies
            .into_iter()
            .filter(|c| !c.value.is_empty())
            .map(|c| (c.name, c.value))
            .collect(),
    )
}

fn looks_like_netscape(input: &str) -> bool {
    input
        .lines()
        .filter(|l| !l.trim().is_empty() && !l.trim_start().starts_with('#'))
        .any(|l| l.split('\t').count() >= 7)
}

fn parse_netscape(input: &str) -> Vec<(String, String)> {
    input
        .lines()
        .filter(|l| !l.trim().is_empty() && !l.trim_start().starts_with('#'))
        .filter_map(|line| {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 7 {
                return None;
            }
            let name = fields[5].to_string();
            let value = fields[6].to_string();
            (!value.is_empty()).then_some((name, value))
        })
        .collect()
}

fn parse_raw(input: &str) -> Vec<(String, String)> {
    input
        .split(';')
        .filter_map(|part| {
            let part = part.trim();
            let (name, value) = part.split_once('=')?;
            let value = value.trim();
            (!value.is_empty()).then(|| (name.trim().to_string(), value.to_string()))
        })
        .collect()
}

/// Extracts a single named cookie's value from any supported representation,
/// e.g. the `ct0` CSRF token used by Twitter's GraphQL endpoint.
pub fn extract_cookie_value(input: &str, name: &str) -> Option<String> {
    parse_cookie_pairs(input)
        .into_iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_raw_cookie_string() {
        let canonical = to_canonical_string("a=1; b=2;  c=3 ");
        assert_eq!(canonical, "a=1; b=2; c=3");
    }

    #[test]
    fn drops_empty_values() {
        let canonical = to_canonical_string("a=1; b=; c=3");
        assert_eq!(canonical, "a=1; c=3");
    }

    #[test]
    fn parses_netscape_format() {
        let input = "# Netscape HTTP Cookie File\n.example.com\tTRUE\t/\tFALSE\t1999999999\tsid\tabc123\n";
        let canonical = to_canonical_string(input);
        assert_eq!(canonical, "sid=abc123");
    }

    #[test]
    fn parses_json_export() {
        let input = r#"[{"name":"sid","value":"abc123"},{"name":"empty","value":""}]"#;
        let canonical = to_canonical_string(input);
        assert_eq!(canonical, "sid=abc123");
    }

    #[test]
    fn all_three_forms_agree_on_same_pairs() {
        let raw = "ct0=xyz; auth_token=abc";
        let json = r#"[{"name":"ct0","value":"xyz"},{"name":"auth_token","value":"abc"}]"#;
        assert_eq!(to_canonical_string(raw), to_canonical_string(json));
    }

    #[test]
    fn extracts_single_cookie_value() {
        assert_eq!(
            extract_cookie_value("ct0=xyz; auth_token=abc", "ct0"),
            Some("xyz".to_string())
        );
    }
}
