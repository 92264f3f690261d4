//! Subscriber bootstrap for binaries. Libraries only emit `tracing` events.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Parse `filter`, falling back to [`DEFAULT_LOG_FILTER`] when absent or invalid.
pub fn env_filter(filter: Option<&str>) -> EnvFilter {
    filter
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install a stderr `fmt` subscriber. Returns `false` if one was already set.
pub fn init_logging(filter: Option<&str>) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
