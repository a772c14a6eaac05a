//! Delivery Proxy (C8, §4.8): the handlers behind `/stream`, `/download`,
//! `/thumbnail`, `/hls-proxy`, `/hls-stream`, and `/merge` all live here,
//! split by concern rather than by route.

pub mod hls;
pub mod merge;
pub mod muxer;
pub mod stream;
pub mod thumbnail;
pub mod youtube;
