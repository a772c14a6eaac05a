//! Extractor Registry (C3): URL → extractor dispatch, native-first, with
//! deployment-profile gating for wrapper-backed platforms.

use crate::config::{ExtractionConfig, ExtractorProfile};
use crate::errors::GatewayError;
use crate::model::ExtractResult;
use crate::transport::HttpTransport;

use super::facebook::FacebookExtractor;
use super::instagram::InstagramExtractor;
use super::pixiv::PixivExtractor;
use super::tiktok::TikTokExtractor;
use super::traits::{ExtractOptions, Extractor};
use super::twitter::TwitterExtractor;
use super::wrapper::WrapperExtractor;

/// Native extractors run in this fixed order (§4.3); the first positive
/// match wins.
pub struct ExtractorRegistry {
    natives: Vec<Box<dyn Extractor>>,
    wrapper: WrapperExtractor,
    profile: ExtractorProfile,
}

impl ExtractorRegistry {
    pub fn new(config: &ExtractionConfig) -> Self {
        let natives: Vec<Box<dyn Extractor>> = vec![
            Box::new(FacebookExtractor),
            Box::new(InstagramExtractor),
            Box::new(TikTokExtractor),
            Box::new(TwitterExtractor),
            Box::new(PixivExtractor),
        ];
        let base_url = WrapperExtractor::resolve_base_url(config.wrapper_bridge_url.as_deref());
        Self {
            natives,
            wrapper: WrapperExtractor::new(base_url),
            profile: config.profile,
        }
    }

    fn match_native(&self, url: &str) -> Option<&dyn Extractor> {
        self.natives.iter().map(|e| e.as_ref()).find(|e| e.matches(url))
    }

    fn wrapper_matches(&self, url: &str) -> bool {
        self.wrapper.matches(url)
    }

    /// `true` for a URL handled by any registered extractor; wrapper
    /// patterns are only reported as supported under the `full` profile.
    pub fn is_supported(&self, url: &str) -> bool {
        if self.match_native(url).is_some() {
            return true;
        }
        self.wrapper_matches(url) && self.profile == ExtractorProfile::Full
    }

    pub fn supported_platforms(&self) -> Vec<&'static str> {
        let mut platforms: Vec<&'static str> =
            self.natives.iter().map(|e| e.platform()).collect();
        if self.profile == ExtractorProfile::Full {
            platforms.push("youtube");
            platforms.push("bilibili");
            platforms.push("soundcloud");
            platforms.push("reddit");
            platforms.push("pinterest");
        }
        platforms
    }

    pub async fn extract(
        &self,
        transport: &HttpTransport,
        url: &str,
        opts: &ExtractOptions,
    ) -> Result<ExtractResult, GatewayError> {
        if let Some(extractor) = self.match_native(url) {
            return extractor.extract(transport, url, opts).await;
        }

        if self.wrapper_matches(url) {
            if self.profile != ExtractorProfile::Full {
                return Err(GatewayError::PlatformUnavailableOnDeployment);
            }
            return self.wrapper.extract(transport, url, opts).await;
        }

        Err(GatewayError::UnsupportedPlatform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionConfig;

    fn registry(profile: ExtractorProfile) -> ExtractorRegistry {
        ExtractorRegistry::new(&ExtractionConfig {
            profile,
            ..ExtractionConfig::default()
        })
    }

    #[test]
    fn native_platforms_are_always_supported() {
        let r = registry(ExtractorProfile::Vercel);
        assert!(r.is_supported("https://x.com/jack/status/20"));
        assert!(r.is_supported("https://instagram.com/p/abc/"));
    }

    #[test]
    fn wrapper_platforms_gated_by_profile() {
        let vercel = registry(ExtractorProfile::Vercel);
        let full = registry(ExtractorProfile::Full);
        assert!(!vercel.is_supported("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(full.is_supported("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
    }

    #[test]
    fn unknown_url_is_unsupported() {
        let r = registry(ExtractorProfile::Full);
        assert!(!r.is_supported("https://example.com/nothing"));
    }

    #[tokio::test]
    async fn extract_rejects_wrapper_platform_under_vercel_profile() {
        let r = registry(ExtractorProfile::Vercel);
        let transport = HttpTransport::new(
            &crate::config::TransportConfig::default(),
            "media-gateway-test/0.0",
        )
        .unwrap();
        let result = r
            .extract(
                &transport,
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
                &ExtractOptions::default(),
            )
            .await;
        assert!(matches!(
            result,
            Err(GatewayError::PlatformUnavailableOnDeployment)
        ));
    }
}
