//! Process-wide `tracing` setup (§11.3): a single `EnvFilter`-driven
//! subscriber, configured once at startup from the configured log level.
//! No metrics/OTel exporter is wired up; everything stays at the logging
//! layer.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the global `tracing` subscriber. `log_level` is used only
/// when `RUST_LOG` isn't set, so operators can always override it directly.
///
/// `json` selects `tracing-subscriber`'s JSON formatter, the shape a log
/// aggregator expects in production; the plain formatter is friendlier for
/// a terminal during local development.
pub fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
