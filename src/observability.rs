//! Metrics hooks for backend operations.

use crate::cleaning::CleaningMode;
use std::time::Duration;

/// Receives per-operation measurements from a backend.
///
/// All methods default to no-ops; implement the ones you care about.
pub trait CacheMetrics: Send + Sync {
    /// A load found its entry.
    fn record_hit(&self, _id: &str, _duration: Duration) {}

    /// A load found nothing.
    fn record_miss(&self, _id: &str, _duration: Duration) {}

    /// A store call failed and was reported to the host as a negative result.
    fn record_error(&self, _operation: &str, _error: &str) {}

    /// A clean finished scanning.
    fn record_clean(&self, _mode: CleaningMode, _scanned: usize, _removed: usize) {}
}

/// Metrics sink that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {}
