//! Subscriber setup for the `dojo` binary.
//!
//! The library only emits `tracing` events; embedding hosts install their
//! own subscriber. The filter comes from `DOJO_LOG`, then the configured
//! directive, then `warn`. `DOJO_LOG_FORMAT=json` switches to JSON lines.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV: &str = "DOJO_LOG";
pub const LOG_FORMAT_ENV: &str = "DOJO_LOG_FORMAT";
pub const DEFAULT_FILTER: &str = "warn";

/// Installs the global subscriber, writing to stderr. Later calls are ignored.
pub fn init(configured_filter: Option<&str>) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .ok()
        .or_else(|| configured_filter.and_then(|directive| EnvFilter::try_new(directive).ok()))
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));

    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init()
            .ok();
    }
}
