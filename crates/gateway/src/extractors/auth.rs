//! Three-tier authentication escalation (§4.4), shared across every native
//! extractor that supports credentials.

use std::future::Future;

use crate::errors::GatewayError;
use crate::model::CookieSource;

use super::traits::ExtractOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AuthTier {
    /// Guest: no credentials.
    A,
    /// Process-owned server credential.
    B,
    /// Credential supplied in the request.
    C,
}

impl AuthTier {
    pub fn cookie_source(self) -> CookieSource {
        match self {
            AuthTier::A => CookieSource::None,
            AuthTier::B => CookieSource::Server,
            AuthTier::C => CookieSource::Client,
        }
    }

    fn next(self) -> AuthTier {
        match self {
            AuthTier::A => AuthTier::B,
            AuthTier::B | AuthTier::C => AuthTier::C,
        }
    }
}

/// Content classes known to require authentication (Facebook stories,
/// Instagram private URLs, ...) should start here instead of at guest tier.
pub fn starting_tier(requires_auth: bool, client_cookie: Option<&str>) -> AuthTier {
    match (requires_auth, client_cookie) {
        (true, Some(_)) => AuthTier::C,
        (true, None) => AuthTier::B,
        (false, _) => AuthTier::A,
    }
}

fn error_justifies_retry(err: &GatewayError, is_video_like: bool) -> bool {
    matches!(
        err,
        GatewayError::PrivateContent | GatewayError::LoginRequired
    ) || (is_video_like && matches!(err, GatewayError::NoMediaFound))
}

/// Drives the tier escalation rule: start at `starting`, and if the result
/// fails for a retry-justifying reason (or returns zero media), escalate
/// once and re-run. `server_cookie` is only used when escalating to tier B;
/// `client_cookie` is only used at tier C.
pub async fn run_with_escalation<F, Fut>(
    starting: AuthTier,
    is_video_like: bool,
    server_cookie: Option<&str>,
    client_cookie: Option<&str>,
    mut attempt: F,
) -> ExtractOutcome
where
    F: FnMut(AuthTier, Option<String>) -> Fut,
    Fut: Future<Output = ExtractOutcome>,
{
    let cookie_for = |tier: AuthTier| -> Option<String> {
        match tier {
            AuthTier::A => None,
            AuthTier::B => server_cookie.map(|s| s.to_string()),
            AuthTier::C => client_cookie.map(|s| s.to_string()),
        }
    };

    let result = attempt(starting, cookie_for(starting)).await;

    let needs_escalation = match &result {
        Ok(r) if r.items.is_empty() => true,
        Err(e) => error_justifies_retry(e, is_video_like),
        _ => false,
    };

    if !needs_escalation || starting == AuthTier::C {
        return result;
    }

    let escalated = starting.next();
    if escalated == starting {
        return result;
    }
    attempt(escalated, cookie_for(escalated)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ExtractResult;

    #[tokio::test]
    async fn escalates_once_on_private_content() {
        let mut calls = Vec::new();
        let result = run_with_escalation(
            AuthTier::A,
            false,
            Some("server-cookie"),
            None,
            |tier, cookie| {
                calls.push((tier, cookie));
                async move {
                    if tier == AuthTier::A {
                        Err(GatewayError::PrivateContent)
                    } else {
                        Ok(ExtractResult::new("facebook", "video"))
                    }
                }
            },
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, AuthTier::A);
        assert_eq!(calls[1].0, AuthTier::B);
        assert_eq!(calls[1].1.as_deref(), Some("server-cookie"));
    }

    #[tokio::test]
    async fn does_not_escalate_past_client_tier() {
        let mut calls = 0;
        let _ = run_with_escalation(AuthTier::C, false, None, Some("client-cookie"), |_, _| {
            calls += 1;
            async { Err(GatewayError::PrivateContent) }
        })
        .await;
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn content_requiring_auth_starts_at_tier_b() {
        assert_eq!(starting_tier(true, None), AuthTier::B);
        assert_eq!(starting_tier(true, Some("x")), AuthTier::C);
        assert_eq!(starting_tier(false, Some("x")), AuthTier::A);
    }
}
