//! Logging initialization
//!
//! Console logging with env-filter based level control. The engine is a
//! library, so log sinks beyond the console belong to the host; this helper
//! exists for binaries and tests that embed the engine directly.

use tracing_subscriber::{EnvFilter, fmt};

/// Initialize console logging, reading `RUST_LOG` when set
///
/// Idempotent: repeated calls after a subscriber is installed are no-ops.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
