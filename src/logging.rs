//! Environment-aware structured logging.
//!
//! Console output only: the session owns stdout for its prompt, so log
//! lines go to stderr and default to `warn` unless `ROUTE_SCOUT_LOG`
//! says otherwise.

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize the global tracing subscriber exactly once.
///
/// Filter resolution order: `ROUTE_SCOUT_LOG`, then `RUST_LOG`, then a
/// `warn`-level default that keeps the interactive prompt quiet.
pub fn init() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = std::env::var("ROUTE_SCOUT_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| "warn,route_scout=info".to_string());

        // try_init: tests may have installed a subscriber already.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(filter))
            .with_writer(std::io::stderr)
            .with_target(true)
            .try_init();
    });
}
