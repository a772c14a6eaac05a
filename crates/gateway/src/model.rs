//! The shared data model (§3): what an extraction produces, regardless of
//! which platform or tier produced it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
    Audio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Hls,
    Dash,
    Progressive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeConfidence {
    Exact,
    Estimated,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CookieSource {
    None,
    Server,
    Client,
}

impl Default for CookieSource {
    fn default() -> Self {
        CookieSource::None
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaSource {
    pub quality: String,
    pub url: String,
    pub resolution: Option<String>,
    pub mime: Option<String>,
    pub extension: Option<String>,
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_confidence: Option<SizeConfidence>,
    pub bitrate: Option<u32>,
    pub filename: Option<String>,
    pub hash: Option<String>,
    pub codec: Option<String>,
    #[serde(rename = "hasAudio")]
    pub has_audio: Option<bool>,
    #[serde(rename = "needsMerge")]
    pub needs_merge: Option<bool>,
    #[serde(rename = "needsProxy")]
    pub needs_proxy: Option<bool>,
    pub format: Option<SourceFormat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    pub index: usize,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub thumbnail: Option<String>,
    #[serde(rename = "thumbnailHash")]
    pub thumbnail_hash: Option<String>,
    pub format: Option<SourceFormat>,
    /// Quality-descending (§5 ordering guarantee).
    pub sources: Vec<MediaSource>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngagementStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shares: Option<u64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResponseMeta {
    #[serde(rename = "responseTime")]
    pub response_time_ms: u64,
    #[serde(rename = "accessMode")]
    pub access_mode: AccessMode,
    #[serde(rename = "publicContent")]
    pub public_content: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessMode {
    Public,
    ApiKey,
}

impl ResponseMeta {
    pub fn new(started: std::time::Instant, access_mode: AccessMode, used_cookie: bool) -> Self {
        Self {
            response_time_ms: started.elapsed().as_millis() as u64,
            access_mode,
            public_content: !used_cookie,
        }
    }

    /// A zero-latency meta for responses computed before any clock was
    /// started (e.g. pure validation failures).
    pub fn instant() -> Self {
        Self {
            response_time_ms: 0,
            access_mode: AccessMode::Public,
            public_content: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractResult {
    pub success: bool,
    pub platform: String,
    #[serde(rename = "contentType")]
    pub content_type: String,
    #[serde(rename = "sourceUrl", skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(rename = "authorUsername", skip_serializing_if = "Option::is_none")]
    pub author_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "uploadDate", skip_serializing_if = "Option::is_none")]
    pub upload_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<EngagementStats>,
    pub items: Vec<MediaItem>,
    pub meta: ResponseMeta,
    #[serde(rename = "usedCookie")]
    pub used_cookie: bool,
    #[serde(rename = "cookieSource")]
    pub cookie_source: CookieSource,
    /// Set only by the wrapper bridge, for platforms it knows carry NSFW
    /// content (§4.5). Native extractors leave this `None`.
    #[serde(rename = "isNsfw", skip_serializing_if = "Option::is_none")]
    pub is_nsfw: Option<bool>,
}

impl ExtractResult {
    pub fn new(platform: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            success: true,
            platform: platform.into(),
            content_type: content_type.into(),
            source_url: None,
            title: None,
            author: None,
            author_username: None,
            id: None,
            description: None,
            upload_date: None,
            stats: None,
            items: Vec::new(),
            meta: ResponseMeta::instant(),
            used_cookie: false,
            cookie_source: CookieSource::None,
            is_nsfw: None,
        }
    }
}
