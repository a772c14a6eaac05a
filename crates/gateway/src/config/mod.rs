//! Layered configuration: compiled-in defaults → optional TOML file →
//! environment variables (`GATEWAY_*`).

pub mod defaults;
pub mod duration_serde;

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use defaults::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorProfile {
    /// Conservative deployment profile: wrapper-backed platforms are disabled.
    Vercel,
    /// Full deployment: native and wrapper-backed platforms are both routable.
    Full,
}

impl Default for ExtractorProfile {
    fn default() -> Self {
        ExtractorProfile::Full
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(with = "duration_serde::duration")]
    pub request_timeout: std::time::Duration,
    pub max_request_body_bytes: usize,
    pub user_agent: String,
    pub log_level: String,
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            request_timeout: std::time::Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_request_body_bytes: DEFAULT_MAX_REQUEST_BODY_BYTES,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_json: DEFAULT_LOG_JSON,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub pool_max_idle_per_host: usize,
    #[serde(with = "duration_serde::duration")]
    pub pool_idle_timeout: std::time::Duration,
    #[serde(with = "duration_serde::duration")]
    pub connect_timeout: std::time::Duration,
    pub max_redirects: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            pool_idle_timeout: std::time::Duration::from_secs(DEFAULT_POOL_IDLE_TIMEOUT_SECS),
            connect_timeout: std::time::Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

/// Per-platform server-owned credentials, loaded from the environment and
/// never logged or echoed back to a client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerCookies {
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub twitter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub profile: ExtractorProfile,
    pub wrapper_bridge_url: Option<String>,
    pub wrapper_fallback_url: String,
    #[serde(with = "duration_serde::duration")]
    pub timeout: std::time::Duration,
    pub server_cookies: ServerCookies,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            profile: ExtractorProfile::default(),
            wrapper_bridge_url: None,
            wrapper_fallback_url: DEFAULT_WRAPPER_FALLBACK_URL.to_string(),
            timeout: std::time::Duration::from_secs(DEFAULT_EXTRACTION_TIMEOUT_SECS),
            server_cookies: ServerCookies::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub max_requests: u32,
    #[serde(with = "duration_serde::duration")]
    pub window: std::time::Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_RATE_LIMIT_ENABLED,
            max_requests: DEFAULT_RATE_LIMIT_MAX,
            window: std::time::Duration::from_secs(DEFAULT_RATE_LIMIT_WINDOW_SECS),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    #[serde(with = "duration_serde::duration")]
    pub ttl: std::time::Duration,
    #[serde(with = "duration_serde::duration")]
    pub sweep_interval: std::time::Duration,
    #[serde(with = "duration_serde::duration")]
    pub thumbnail_cache_ttl: std::time::Duration,
    #[serde(with = "duration_serde::duration")]
    pub hls_segment_cache_ttl: std::time::Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            ttl: std::time::Duration::from_secs(DEFAULT_REGISTRY_TTL_SECS),
            sweep_interval: std::time::Duration::from_secs(DEFAULT_REGISTRY_SWEEP_INTERVAL_SECS),
            thumbnail_cache_ttl: std::time::Duration::from_secs(DEFAULT_THUMBNAIL_CACHE_TTL_SECS),
            hls_segment_cache_ttl: std::time::Duration::from_secs(
                DEFAULT_HLS_SEGMENT_CACHE_TTL_SECS,
            ),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
    pub api_keys: Vec<String>,
    /// Extra hostnames/CIDRs blocked in addition to the built-in SSRF list.
    pub extra_blocked_hosts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    pub ffmpeg_command: String,
    #[serde(with = "duration_serde::duration")]
    pub muxer_max_duration: std::time::Duration,
    pub ytdlp_command: String,
    #[serde(with = "duration_serde::duration")]
    pub ytdlp_timeout: std::time::Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            ffmpeg_command: DEFAULT_FFMPEG_COMMAND.to_string(),
            muxer_max_duration: std::time::Duration::from_secs(DEFAULT_MUXER_MAX_DURATION_SECS),
            ytdlp_command: DEFAULT_YTDLP_COMMAND.to_string(),
            ytdlp_timeout: std::time::Duration::from_secs(DEFAULT_YTDLP_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    pub transport: TransportConfig,
    pub extraction: ExtractionConfig,
    pub rate_limit: RateLimitConfig,
    pub registry: RegistryConfig,
    pub security: SecurityConfig,
    pub delivery: DeliveryConfig,
}

impl GatewayConfig {
    /// Load configuration from compiled-in defaults, an optional TOML file,
    /// then environment variables prefixed `GATEWAY_` (nested keys separated
    /// by `__`, e.g. `GATEWAY_RATE_LIMIT__MAX_REQUESTS=200`).
    pub fn load(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let defaults = Self::default();
        let mut figment = Figment::new().merge(Serialized::defaults(defaults));

        if let Some(path) = config_path {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            } else {
                tracing::warn!(path = %path.display(), "config file not found, using defaults");
            }
        }

        figment
            .merge(Env::prefixed("GATEWAY_").split("__"))
            .extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_without_a_file() {
        let config = GatewayConfig::load(None).expect("defaults must be a valid config");
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.rate_limit.max_requests, DEFAULT_RATE_LIMIT_MAX);
    }

    #[test]
    #[serial_test::serial]
    fn env_override_wins_over_defaults() {
        unsafe {
            std::env::set_var("GATEWAY_SERVER__PORT", "9999");
        }
        let config = GatewayConfig::load(None).expect("config must load");
        assert_eq!(config.server.port, 9999);
        unsafe {
            std::env::remove_var("GATEWAY_SERVER__PORT");
        }
    }
}
