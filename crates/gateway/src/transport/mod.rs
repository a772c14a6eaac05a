//! HTTP Transport (C1): a pooled, streaming client with manual redirect
//! tracking and transparent decompression.

pub mod client;

pub use client::{FetchOptions, FetchedStream, FetchedText, HttpTransport, TransportStats};
