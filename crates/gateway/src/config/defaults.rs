//! Configuration default values.
//!
//! Keeping these as plain consts in one place means the process boots safely
//! with zero configuration, and every default is grep-able from one file.

// Web server defaults
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;
pub const DEFAULT_USER_AGENT: &str = concat!("media-gateway/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_JSON: bool = false;

// Extraction defaults
pub const DEFAULT_PROFILE: &str = "full";
pub const DEFAULT_WRAPPER_FALLBACK_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_EXTRACTION_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_REDIRECTS: usize = 5;

// HTTP transport defaults (C1)
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 100;
pub const DEFAULT_POOL_IDLE_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

// Rate limit defaults (C9)
pub const DEFAULT_RATE_LIMIT_ENABLED: bool = true;
pub const DEFAULT_RATE_LIMIT_MAX: u32 = 100;
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

// URL Registry defaults (C7)
pub const DEFAULT_REGISTRY_TTL_SECS: u64 = 300;
pub const DEFAULT_REGISTRY_SWEEP_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_THUMBNAIL_CACHE_TTL_SECS: u64 = 86_400;
pub const DEFAULT_HLS_SEGMENT_CACHE_TTL_SECS: u64 = 3_600;

// Delivery / muxer defaults (C8)
pub const DEFAULT_FFMPEG_COMMAND: &str = "ffmpeg";
pub const DEFAULT_MUXER_MAX_DURATION_SECS: u64 = 60;
pub const DEFAULT_YTDLP_COMMAND: &str = "yt-dlp";
pub const DEFAULT_YTDLP_TIMEOUT_SECS: u64 = 45;
