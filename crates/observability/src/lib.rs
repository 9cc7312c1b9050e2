//! Process-wide tracing/logging setup.

pub mod subscriber;

pub use subscriber::LogFormat;

/// Initialize process-wide observability (tracing/logging).
///
/// The output format comes from `LOG_FORMAT`, the filter from `RUST_LOG`.
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    subscriber::init(LogFormat::from_env());
}
