//! Diagnostic logging setup.
//!
//! Operator-facing output goes through [`crate::reporting::console`]; this
//! is the `tracing` side channel on stderr, filtered by `CI_TEST_RUNNER_LOG`.

use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "CI_TEST_RUNNER_LOG";

/// Installs the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
