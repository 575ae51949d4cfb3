use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the process-wide tracing subscriber.
///
/// RUST_LOG controls the filter and defaults to `info`,
/// e.g. RUST_LOG=debug or RUST_LOG=observer_distribution=trace.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
