//! Error taxonomy for the media gateway.
//!
//! `GatewayError` is the single error type that crosses the HTTP boundary. Every
//! variant maps 1:1 to one of the error codes in the external contract and to a
//! fixed HTTP status, so handlers can simply `?` their way out and let
//! [`IntoResponse`] do the rest.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::model::ResponseMeta;

#[derive(Error, Debug)]
pub enum GatewayError {
    // --- Input ---
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Unsupported platform")]
    UnsupportedPlatform,
    #[error("Missing parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid hash")]
    InvalidHash,

    // --- Gating ---
    #[error("Forbidden")]
    Forbidden,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Unauthorized URL")]
    UnauthorizedUrl,
    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    #[error("Platform unavailable on this deployment")]
    PlatformUnavailableOnDeployment,

    // --- Network ---
    #[error("Fetch failed: {0}")]
    FetchFailed(String),
    #[error("Timed out")]
    Timeout,
    #[error("Upstream error: {status}")]
    UpstreamError { status: u16 },

    // --- Content ---
    #[error("Private content")]
    PrivateContent,
    #[error("Login required")]
    LoginRequired,
    #[error("Age restricted")]
    AgeRestricted,
    #[error("Deleted content")]
    DeletedContent,
    #[error("Story expired")]
    StoryExpired,
    #[error("No media found")]
    NoMediaFound,

    // --- Delivery ---
    #[error("Conversion failed")]
    ConversionFailed,
    #[error("Merge failed")]
    MergeFailed,
    #[error("Download failed")]
    DownloadFailed,
    #[error("ffmpeg not available")]
    FfmpegNotAvailable,
    #[error("Unsupported format")]
    UnsupportedFormat,
    #[error("Proxy failed")]
    ProxyFailed,

    // --- Generic ---
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// The uppercase-snake-case code used in the JSON envelope (§7).
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "INVALID_URL",
            Self::UnsupportedPlatform => "UNSUPPORTED_PLATFORM",
            Self::MissingParameter(_) => "MISSING_PARAMETER",
            Self::InvalidHash => "INVALID_HASH",
            Self::Forbidden => "FORBIDDEN",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::UnauthorizedUrl => "UNAUTHORIZED_URL",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::PlatformUnavailableOnDeployment => "PLATFORM_UNAVAILABLE_ON_DEPLOYMENT",
            Self::FetchFailed(_) => "FETCH_FAILED",
            Self::Timeout => "TIMEOUT",
            Self::UpstreamError { .. } => "UPSTREAM_ERROR",
            Self::PrivateContent => "PRIVATE_CONTENT",
            Self::LoginRequired => "LOGIN_REQUIRED",
            Self::AgeRestricted => "AGE_RESTRICTED",
            Self::DeletedContent => "DELETED_CONTENT",
            Self::StoryExpired => "STORY_EXPIRED",
            Self::NoMediaFound => "NO_MEDIA_FOUND",
            Self::ConversionFailed => "CONVERSION_FAILED",
            Self::MergeFailed => "MERGE_FAILED",
            Self::DownloadFailed => "DOWNLOAD_FAILED",
            Self::FfmpegNotAvailable => "FFMPEG_NOT_AVAILABLE",
            Self::UnsupportedFormat => "UNSUPPORTED_FORMAT",
            Self::ProxyFailed => "PROXY_FAILED",
            Self::ExtractionFailed(_) => "EXTRACTION_FAILED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidUrl(_)
            | Self::UnsupportedPlatform
            | Self::MissingParameter(_)
            | Self::PlatformUnavailableOnDeployment => StatusCode::BAD_REQUEST,
            Self::InvalidHash => StatusCode::NOT_FOUND,
            Self::Forbidden | Self::Unauthorized | Self::UnauthorizedUrl => StatusCode::FORBIDDEN,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::FetchFailed(_) | Self::Timeout | Self::UpstreamError { .. } => {
                StatusCode::BAD_GATEWAY
            }
            Self::PrivateContent
            | Self::LoginRequired
            | Self::AgeRestricted
            | Self::DeletedContent
            | Self::StoryExpired
            | Self::NoMediaFound => StatusCode::OK,
            Self::ConversionFailed
            | Self::MergeFailed
            | Self::DownloadFailed
            | Self::FfmpegNotAvailable
            | Self::UnsupportedFormat
            | Self::ProxyFailed => StatusCode::BAD_GATEWAY,
            Self::ExtractionFailed(_) => StatusCode::OK,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

#[derive(Serialize)]
pub struct ErrorEnvelope {
    success: bool,
    error: ErrorBody,
    meta: ResponseMeta,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let retry_after = match &self {
            Self::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        };
        let body = ErrorEnvelope {
            success: false,
            error: ErrorBody {
                code: self.code(),
                message: self.to_string(),
            },
            meta: ResponseMeta::instant(),
        };
        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(axum::http::header::RETRY_AFTER, secs.into());
        }
        response
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else if let Some(status) = err.status() {
            GatewayError::UpstreamError {
                status: status.as_u16(),
            }
        } else {
            GatewayError::FetchFailed(err.to_string())
        }
    }
}

impl From<url::ParseError> for GatewayError {
    fn from(err: url::ParseError) -> Self {
        GatewayError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        GatewayError::Internal(err.to_string())
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
