use std::io;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize logging with environment-based filtering (defaults to "info").
///
/// Logs go to stderr: stdout belongs to the dashboard and gets cleared on
/// every render cycle.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
