//! Tracing and logging (shared setup).

/// Initialize process-wide logging with the given filter and output format.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init(filter: &str, format: LogFormat) {
    tracing::init(filter, format);
}

/// Tracing configuration (filters, layers).
pub mod tracing;

pub use tracing::{LogFormat, UnknownLogFormat};
