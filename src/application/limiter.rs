//! Fixed-window request limiter.
//!
//! Decides whether a request from an identifier (usually the client
//! address) is admitted, counting it if so.
//!
//! # Limitations
//!
//! State lives in this process's memory only. Several server processes each
//! enforce their own limit with no shared counter, so this is abuse
//! mitigation for low-stakes endpoints, not a security boundary.

use crate::application::metrics::Metrics;
use crate::application::ports::Storage;
use crate::application::registry::WindowRegistry;
use crate::domain::window::{
    PolicyError, RateLimitInfo, RateLimitRecord, WindowDecision, WindowPolicy,
};
use rand::Rng;
use std::fmt;

/// Limit assumed by `peek` when the caller does not pass one.
pub const DEFAULT_REFERENCE_LIMIT: u32 = 10;

/// Chance that a call also sweeps expired records.
pub const DEFAULT_CLEANUP_PROBABILITY: f64 = 0.1;

/// When expired records are physically removed.
///
/// Correctness never depends on this: expired records are treated as
/// absent whether or not they were removed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CleanupStrategy {
    /// Only explicit `sweep_expired` calls (or a background sweeper) purge
    Disabled,
    /// Each `check` first sweeps with the given probability (0.0 to 1.0)
    Probabilistic { probability: f64 },
}

impl CleanupStrategy {
    /// Whether the configuration is usable.
    pub fn is_valid(&self) -> bool {
        match self {
            CleanupStrategy::Disabled => true,
            CleanupStrategy::Probabilistic { probability } => {
                (0.0..=1.0).contains(probability)
            }
        }
    }
}

impl Default for CleanupStrategy {
    fn default() -> Self {
        CleanupStrategy::Probabilistic {
            probability: DEFAULT_CLEANUP_PROBABILITY,
        }
    }
}

/// Admits or rejects requests per identifier using fixed windows.
///
/// Clones share the same records and metrics.
#[derive(Clone)]
pub struct FixedWindowLimiter<S>
where
    S: Storage<String, RateLimitRecord> + Clone,
{
    registry: WindowRegistry<S>,
    metrics: Metrics,
    cleanup: CleanupStrategy,
    reference_limit: u32,
}

impl<S> FixedWindowLimiter<S>
where
    S: Storage<String, RateLimitRecord> + Clone,
{
    /// Create a new limiter.
    ///
    /// # Arguments
    /// * `registry` - The window registry (which contains the clock)
    /// * `metrics` - Metrics tracker
    /// * `cleanup` - When to purge expired records
    pub fn new(registry: WindowRegistry<S>, metrics: Metrics, cleanup: CleanupStrategy) -> Self {
        Self {
            registry,
            metrics,
            cleanup,
            reference_limit: DEFAULT_REFERENCE_LIMIT,
        }
    }

    /// Set the limit `peek` reports `remaining` against.
    pub fn with_reference_limit(mut self, limit: u32) -> Self {
        self.reference_limit = limit;
        self
    }

    /// Register a request from `identifier` under `policy`.
    ///
    /// 1. No live record: open a window with count 1 and admit.
    /// 2. Count already at the limit: reject, record unchanged.
    /// 3. Otherwise: increment and admit.
    ///
    /// The check and the update happen under the identifier's entry lock,
    /// so concurrent callers can never push the count past the limit.
    pub fn check(&self, identifier: &str, policy: &WindowPolicy) -> WindowDecision {
        self.maybe_sweep();

        let decision = self
            .registry
            .with_record(identifier, policy.window(), |record, created, now| {
                if created {
                    WindowDecision::Admit
                } else {
                    record.register(now, policy)
                }
            });

        match decision {
            WindowDecision::Admit => {
                self.metrics.record_admitted();
                tracing::debug!(client = identifier, limit = policy.limit(), "request admitted");
            }
            WindowDecision::Reject => {
                self.metrics.record_rejected();
                tracing::warn!(
                    client = identifier,
                    limit = policy.limit(),
                    window_secs = policy.window().as_secs(),
                    "request rejected: rate limit exceeded"
                );
            }
        }

        decision
    }

    /// Admit (`true`) or reject (`false`) a request from `identifier`,
    /// allowing `limit` requests per `window_seconds`.
    ///
    /// # Errors
    /// Returns `PolicyError` if `limit` or `window_seconds` is zero, or if
    /// `window_seconds` exceeds one year.
    pub fn check_and_consume(
        &self,
        identifier: &str,
        limit: u32,
        window_seconds: u64,
    ) -> Result<bool, PolicyError> {
        let policy = WindowPolicy::per_seconds(limit, window_seconds)?;
        Ok(self.check(identifier, &policy).is_admit())
    }

    /// Remaining budget for `identifier` under the reference limit, or
    /// `None` without a live record.
    pub fn peek(&self, identifier: &str) -> Option<RateLimitInfo> {
        self.peek_with_limit(identifier, self.reference_limit)
    }

    /// Remaining budget for `identifier` under an explicit limit.
    pub fn peek_with_limit(&self, identifier: &str, limit: u32) -> Option<RateLimitInfo> {
        self.registry
            .live_record(identifier)
            .map(|record| record.info(limit))
    }

    /// Remove all expired records now. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let purged = self.registry.purge_expired();
        if purged > 0 {
            self.metrics.record_purged(purged);
            tracing::debug!(purged, remaining = self.registry.len(), "swept expired records");
        }
        purged
    }

    fn maybe_sweep(&self) {
        if let CleanupStrategy::Probabilistic { probability } = self.cleanup {
            if probability > 0.0
                && probability <= 1.0
                && rand::thread_rng().gen_bool(probability)
            {
                self.sweep_expired();
            }
        }
    }

    /// Records currently held in memory, expired ones included.
    pub fn tracked_identifiers(&self) -> usize {
        self.registry.len()
    }

    /// The limit `peek` uses.
    pub fn reference_limit(&self) -> u32 {
        self.reference_limit
    }

    /// The configured cleanup strategy.
    pub fn cleanup_strategy(&self) -> CleanupStrategy {
        self.cleanup
    }

    /// Get a reference to the registry.
    pub fn registry(&self) -> &WindowRegistry<S> {
        &self.registry
    }

    /// Get a reference to the metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

impl<S> fmt::Debug for FixedWindowLimiter<S>
where
    S: Storage<String, RateLimitRecord> + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedWindowLimiter")
            .field("registry", &self.registry)
            .field("cleanup", &self.cleanup)
            .field("reference_limit", &self.reference_limit)
            .finish()
    }
}
