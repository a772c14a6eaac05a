//! Native and wrapper-backed platform extractors (C3/C4/C5).

pub mod auth;
pub mod common;
pub mod cookie;
pub mod facebook;
pub mod instagram;
pub mod pixiv;
pub mod registry;
pub mod tiktok;
pub mod traits;
pub mod twitter;
pub mod wrapper;

pub use registry::ExtractorRegistry;
pub use traits::{ExtractOptions, Extractor};
