//! Diagnostics go to stderr through `tracing`; stdout carries only replies.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "warn";
pub const VERBOSE_FILTER: &str = "debug";

/// `-v` wins over `CHATSHELL_LOG`, which wins over the default.
pub fn filter_directive(env_filter: Option<&str>, verbose: bool) -> &str {
    if verbose {
        return VERBOSE_FILTER;
    }
    env_filter
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_FILTER)
}

pub fn init(env_filter: Option<&str>, verbose: bool) {
    let directive = filter_directive(env_filter, verbose);
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
