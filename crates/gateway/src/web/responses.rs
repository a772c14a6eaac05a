//! Response shapes outside the extraction envelope (§4.10, §6).
//!
//! `ExtractResult` (§3) already serializes to the documented success
//! envelope, and [`crate::errors::GatewayError`] already implements
//! `IntoResponse` for the error envelope, so this module only needs the two
//! shapes neither of those cover: `/status` and `/health`.

use serde::Serialize;

use crate::model::ResponseMeta;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub status: &'static str,
    pub version: &'static str,
    pub uptime: u64,
    pub extractors: Vec<&'static str>,
    pub meta: ResponseMeta,
}

impl StatusResponse {
    pub fn online(uptime: u64, extractors: Vec<&'static str>, meta: ResponseMeta) -> Self {
        Self {
            success: true,
            status: "online",
            version: env!("CARGO_PKG_VERSION"),
            uptime,
            extractors,
            meta,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: u64,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok",
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }
}
