//! Tracing/logging initialization.
//!
//! Hardened deployments log JSON for collection; everything else gets compact
//! human-readable lines. Filtering follows `RUST_LOG`.

use mercato_core::RuntimeMode;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(mode: RuntimeMode) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime);

    // `security` events keep their target so they can be routed separately.
    let _ = if mode.is_hardened() {
        builder.json().with_target(true).try_init()
    } else {
        builder.compact().with_target(true).try_init()
    };
}
