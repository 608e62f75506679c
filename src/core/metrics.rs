//! Logger metrics for observability
//!
//! Counters for monitoring logger health: records written, records that
//! failed to reach at least one facility, and failing hooks.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics shared by a logger and every logger derived from it
///
/// # Example
///
/// ```
/// use rust_structured_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_written();
/// metrics.record_write_error();
///
/// assert_eq!(metrics.written_count(), 1);
/// assert_eq!(metrics.write_error_count(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Entries written to every accepting facility
    written: AtomicU64,

    /// Entries where at least one facility failed
    write_errors: AtomicU64,

    /// Hook invocations that failed or panicked
    hook_errors: AtomicU64,
}

impl LoggerMetrics {
    pub const fn new() -> Self {
        Self {
            written: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
            hook_errors: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn written_count(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn write_error_count(&self) -> u64 {
        self.write_errors.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn hook_error_count(&self) -> u64 {
        self.hook_errors.load(Ordering::Relaxed)
    }

    /// Record a successfully written entry; returns the previous count
    #[inline]
    pub fn record_written(&self) -> u64 {
        self.written.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_write_error(&self) -> u64 {
        self.write_errors.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_hook_error(&self) -> u64 {
        self.hook_errors.fetch_add(1, Ordering::Relaxed)
    }

    /// Failed entries as a percentage (0.0 - 100.0) of all entries
    ///
    /// Returns 0.0 if nothing has been logged.
    pub fn error_rate(&self) -> f64 {
        let failed = self.write_error_count() as f64;
        let total = self.written_count() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }

    pub fn reset(&self) {
        self.written.store(0, Ordering::Relaxed);
        self.write_errors.store(0, Ordering::Relaxed);
        self.hook_errors.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            written: AtomicU64::new(self.written_count()),
            write_errors: AtomicU64::new(self.write_error_count()),
            hook_errors: AtomicU64::new(self.hook_error_count()),
        }
    }
}
