//! Tracing/logging setup shared by the CampEase binaries.

/// Initialize process-wide tracing with defaults (`RUST_LOG`, JSON output).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(&ObservabilityConfig::default());
}

/// Initialize process-wide tracing with an explicit configuration.
pub fn init_with(config: &ObservabilityConfig) {
    tracing::init(config);
}

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use self::tracing::{LogFormat, ObservabilityConfig};
