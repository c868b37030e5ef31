//! Tracing and logging setup shared by every binary.

use mercato_core::RuntimeMode;

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init(mode: RuntimeMode) {
    tracing::init(mode);
}

/// Tracing configuration (filters, layers).
pub mod tracing;
