//! Observability metrics for request governance.
//!
//! Provides counters about governor decisions and validation outcomes for
//! monitoring and debugging. All metrics use atomic operations for
//! thread-safe updates and reads.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking governance statistics.
///
/// Cloning is cheap and clones share the same underlying counters.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    /// Checks that were allowed through
    checks_allowed: AtomicU64,
    /// Checks denied because the window quota was exhausted
    checks_exhausted: AtomicU64,
    /// Checks denied by the minimum-interval throttle
    checks_throttled: AtomicU64,
    /// Field or schema validations that failed
    validations_failed: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                checks_allowed: AtomicU64::new(0),
                checks_exhausted: AtomicU64::new(0),
                checks_throttled: AtomicU64::new(0),
                validations_failed: AtomicU64::new(0),
            }),
        }
    }

    pub(crate) fn record_allowed(&self) {
        self.inner.checks_allowed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_exhausted(&self) {
        self.inner.checks_exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_throttled(&self) {
        self.inner.checks_throttled.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed validation. Exposed so hosts wiring the validation
    /// engine into their own flows can keep one set of counters.
    pub fn record_validation_failure(&self) {
        self.inner.validations_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Total checks allowed through.
    pub fn checks_allowed(&self) -> u64 {
        self.inner.checks_allowed.load(Ordering::Relaxed)
    }

    /// Total checks denied on an exhausted window.
    pub fn checks_exhausted(&self) -> u64 {
        self.inner.checks_exhausted.load(Ordering::Relaxed)
    }

    /// Total checks denied by the throttle.
    pub fn checks_throttled(&self) -> u64 {
        self.inner.checks_throttled.load(Ordering::Relaxed)
    }

    /// Total failed validations.
    pub fn validations_failed(&self) -> u64 {
        self.inner.validations_failed.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            checks_allowed: self.checks_allowed(),
            checks_exhausted: self.checks_exhausted(),
            checks_throttled: self.checks_throttled(),
            validations_failed: self.validations_failed(),
        }
    }

    /// Reset all metrics to zero.
    ///
    /// Useful for testing or when starting a new monitoring period.
    pub fn reset(&self) {
        self.inner.checks_allowed.store(0, Ordering::Relaxed);
        self.inner.checks_exhausted.store(0, Ordering::Relaxed);
        self.inner.checks_throttled.store(0, Ordering::Relaxed);
        self.inner.validations_failed.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Checks allowed through
    pub checks_allowed: u64,
    /// Checks denied on an exhausted window
    pub checks_exhausted: u64,
    /// Checks denied by the throttle
    pub checks_throttled: u64,
    /// Failed validations
    pub validations_failed: u64,
}

impl MetricsSnapshot {
    /// Total checks processed.
    pub fn total_checks(&self) -> u64 {
        self.checks_allowed
            .saturating_add(self.checks_exhausted)
            .saturating_add(self.checks_throttled)
    }

    /// Ratio of denied checks to total checks (0.0 to 1.0).
    pub fn denial_rate(&self) -> f64 {
        let total = self.total_checks();
        if total == 0 {
            0.0
        } else {
            (self.checks_exhausted + self.checks_throttled) as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initial_state() {
        let metrics = Metrics::new();
        assert_eq!(metrics.checks_allowed(), 0);
        assert_eq!(metrics.checks_exhausted(), 0);
        assert_eq!(metrics.checks_throttled(), 0);
        assert_eq!(metrics.validations_failed(), 0);
    }

    #[test]
    fn test_counters_accumulate() {
        let metrics = Metrics::new();
        metrics.record_allowed();
        metrics.record_allowed();
        metrics.record_exhausted();
        metrics.record_throttled();
        metrics.record_validation_failure();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.checks_allowed, 2);
        assert_eq!(snapshot.checks_exhausted, 1);
        assert_eq!(snapshot.checks_throttled, 1);
        assert_eq!(snapshot.validations_failed, 1);
        assert_eq!(snapshot.total_checks(), 4);
    }

    #[test]
    fn test_denial_rate() {
        let metrics = Metrics::new();
        assert_eq!(metrics.snapshot().denial_rate(), 0.0);

        metrics.record_allowed();
        metrics.record_exhausted();
        assert!((metrics.snapshot().denial_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset() {
        let metrics = Metrics::new();
        metrics.record_allowed();
        metrics.record_exhausted();

        metrics.reset();
        assert_eq!(metrics.snapshot().total_checks(), 0);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics1 = Metrics::new();
        metrics1.record_allowed();

        let metrics2 = metrics1.clone();
        metrics2.record_allowed();

        assert_eq!(metrics1.checks_allowed(), 2);
        assert_eq!(metrics2.checks_allowed(), 2);
    }

    #[test]
    fn test_concurrent_updates() {
        use std::thread;

        let metrics = Metrics::new();
        let mut handles = vec![];

        for _ in 0..10 {
            let m = metrics.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    m.record_allowed();
                    m.record_throttled();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.checks_allowed(), 1000);
        assert_eq!(metrics.checks_throttled(), 1000);
    }
}
