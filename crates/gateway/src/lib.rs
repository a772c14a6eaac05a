pub mod config;
pub mod delivery;
pub mod errors;
pub mod extractors;
pub mod middleware;
pub mod model;
pub mod normalize;
pub mod observability;
pub mod parsing;
pub mod registry;
pub mod transport;
pub mod web;
