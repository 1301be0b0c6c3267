//! Throttle counters.
//!
//! Lock-free totals of what the limiter admitted, rejected and purged since
//! it was built (or last reset).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared request counters.
///
/// Clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    requests_admitted: AtomicU64,
    requests_rejected: AtomicU64,
    /// Expired records physically removed by sweeps
    records_purged: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_admitted(&self) {
        self.inner.requests_admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.inner.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_purged(&self, count: usize) {
        self.inner
            .records_purged
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Total requests admitted.
    pub fn requests_admitted(&self) -> u64 {
        self.inner.requests_admitted.load(Ordering::Relaxed)
    }

    /// Total requests rejected.
    pub fn requests_rejected(&self) -> u64 {
        self.inner.requests_rejected.load(Ordering::Relaxed)
    }

    /// Total expired records removed from memory.
    pub fn records_purged(&self) -> u64 {
        self.inner.records_purged.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_admitted: self.requests_admitted(),
            requests_rejected: self.requests_rejected(),
            records_purged: self.records_purged(),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.inner.requests_admitted.store(0, Ordering::Relaxed);
        self.inner.requests_rejected.store(0, Ordering::Relaxed);
        self.inner.records_purged.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub requests_admitted: u64,
    pub requests_rejected: u64,
    pub records_purged: u64,
}

impl MetricsSnapshot {
    /// Total requests seen.
    pub fn total_requests(&self) -> u64 {
        self.requests_admitted + self.requests_rejected
    }

    /// Fraction of requests rejected, 0.0 when nothing was seen.
    pub fn rejection_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            0.0
        } else {
            self.requests_rejected as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_counters_and_snapshot() {
        let metrics = Metrics::new();
        metrics.record_admitted();
        metrics.record_admitted();
        metrics.record_admitted();
        metrics.record_rejected();
        metrics.record_purged(4);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_admitted, 3);
        assert_eq!(snapshot.requests_rejected, 1);
        assert_eq!(snapshot.records_purged, 4);
        assert_eq!(snapshot.total_requests(), 4);
        assert!((snapshot.rejection_rate() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_rejection_rate() {
        assert_eq!(Metrics::new().snapshot().rejection_rate(), 0.0);
    }

    #[test]
    fn test_clones_share_counters_and_reset() {
        let metrics = Metrics::new();
        let clone = metrics.clone();
        clone.record_rejected();
        assert_eq!(metrics.requests_rejected(), 1);

        metrics.reset();
        assert_eq!(clone.snapshot().total_requests(), 0);
    }

    #[test]
    fn test_concurrent_updates() {
        let metrics = Metrics::new();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let metrics = metrics.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        metrics.record_admitted();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(metrics.requests_admitted(), 4000);
    }
}
