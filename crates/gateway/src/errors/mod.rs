//! Crate-wide error taxonomy.
//!
//! ```
//! use media_gateway::errors::{GatewayError, GatewayResult};
//!
//! fn parse(hash: &str) -> GatewayResult<Vec<u8>> {
//!     hex::decode(hash).map_err(|_| GatewayError::InvalidHash)
//! }
//! ```

pub mod types;

pub use types::*;
