//! The capability set every extractor implements (§4.3), modeled as a trait
//! object rather than a class hierarchy.

use async_trait::async_trait;
use regex::Regex;

use crate::errors::GatewayError;
use crate::model::ExtractResult;
use crate::transport::HttpTransport;

#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Cookie supplied by the caller in the request body (tier C).
    pub cookie: Option<String>,
    /// This process's own configured credential for the target platform
    /// (tier B), resolved by the dispatch layer before the extractor runs.
    pub server_cookie: Option<String>,
}

/// One documented failure of an extraction attempt (§4.4 error semantics).
/// Distinct from [`GatewayError`] so extractor-internal retry logic can
/// match on it before it's mapped to the HTTP boundary.
pub type ExtractError = GatewayError;

pub type ExtractOutcome = Result<ExtractResult, ExtractError>;

#[async_trait]
pub trait Extractor: Send + Sync {
    fn platform(&self) -> &'static str;
    fn patterns(&self) -> &[Regex];

    fn matches(&self, url: &str) -> bool {
        self.patterns().iter().any(|p| p.is_match(url))
    }

    async fn extract(
        &self,
        transport: &HttpTransport,
        url: &str,
        opts: &ExtractOptions,
    ) -> ExtractOutcome;
}
