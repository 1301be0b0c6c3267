//! Ready-to-use request throttle for the form endpoints.
//!
//! [`RequestThrottle`] wires the sharded record storage, the system clock,
//! the fixed-window limiter and the submission guard together, and can run
//! a background expiry sweeper.

use crate::application::guard::{Endpoint, SubmissionError, SubmissionGuard};
use crate::application::limiter::{CleanupStrategy, FixedWindowLimiter, DEFAULT_REFERENCE_LIMIT};
use crate::application::metrics::Metrics;
use crate::application::ports::Clock;
use crate::application::registry::WindowRegistry;
use crate::application::sweeper::SweepConfigError;
use crate::domain::reservation::{Reservation, ReservationRequest};
use crate::domain::window::{PolicyError, RateLimitInfo, RateLimitRecord, WindowDecision, WindowPolicy};
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::storage::ShardedStorage;
use chrono::NaiveDate;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "async")]
use crate::application::sweeper::{ExpirySweeper, ShutdownError, SweepConfig, SweeperHandle};
#[cfg(feature = "async")]
use std::sync::{Mutex, PoisonError};
#[cfg(feature = "async")]
use std::time::Duration;

/// Record storage used by [`RequestThrottle`].
pub type RecordStorage = Arc<ShardedStorage<String, RateLimitRecord>>;

/// Sweeper handle shared by every clone of a throttle. Dropping the last
/// clone stops the sweeper.
#[cfg(feature = "async")]
#[derive(Debug, Default)]
struct SweeperSlot(Mutex<Option<SweeperHandle>>);

#[cfg(feature = "async")]
impl SweeperSlot {
    fn lock(&self) -> std::sync::MutexGuard<'_, Option<SweeperHandle>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(feature = "async")]
impl Drop for SweeperSlot {
    fn drop(&mut self) {
        if let Some(handle) = self.lock().take() {
            tracing::debug!("last throttle handle dropped, stopping expiry sweeper");
            handle.stop();
        }
    }
}

/// Error returned when building a `RequestThrottle` fails.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildError {
    /// Cleanup probability must be within 0.0 to 1.0
    InvalidCleanupProbability(f64),
    /// The reference limit used by `peek` must be greater than zero
    ZeroReferenceLimit,
    /// Sweeper configuration validation failed
    SweepConfig(SweepConfigError),
    /// A background sweeper was requested outside a tokio runtime
    NoRuntime,
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::InvalidCleanupProbability(p) => {
                write!(f, "cleanup probability must be between 0.0 and 1.0, got {}", p)
            }
            BuildError::ZeroReferenceLimit => {
                write!(f, "reference limit must be greater than 0")
            }
            BuildError::SweepConfig(e) => {
                write!(f, "sweeper configuration error: {}", e)
            }
            BuildError::NoRuntime => {
                write!(f, "background sweeping requires a running tokio runtime")
            }
        }
    }
}

impl std::error::Error for BuildError {}

impl From<SweepConfigError> for BuildError {
    fn from(e: SweepConfigError) -> Self {
        BuildError::SweepConfig(e)
    }
}

/// Builder for constructing a `RequestThrottle`.
pub struct RequestThrottleBuilder {
    clock: Option<Arc<dyn Clock>>,
    cleanup: CleanupStrategy,
    reference_limit: u32,
    #[cfg(feature = "async")]
    sweep_interval: Option<Duration>,
}

impl RequestThrottleBuilder {
    /// Set a custom clock (mainly for testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set when expired records are purged during `check` calls.
    ///
    /// The probability will be validated when `build()` is called.
    pub fn with_cleanup(mut self, cleanup: CleanupStrategy) -> Self {
        self.cleanup = cleanup;
        self
    }

    /// Set the limit `peek` reports remaining requests against.
    pub fn with_reference_limit(mut self, limit: u32) -> Self {
        self.reference_limit = limit;
        self
    }

    /// Also purge expired records on a timer.
    ///
    /// `build()` must then be called inside a tokio runtime, and
    /// `RequestThrottle::shutdown` stops the timer.
    ///
    /// **Requires the `async` feature.**
    #[cfg(feature = "async")]
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = Some(interval);
        self
    }

    /// Build the throttle.
    ///
    /// # Errors
    /// Returns `BuildError` if the configuration is invalid.
    pub fn build(self) -> Result<RequestThrottle, BuildError> {
        if let CleanupStrategy::Probabilistic { probability } = self.cleanup {
            if !self.cleanup.is_valid() {
                return Err(BuildError::InvalidCleanupProbability(probability));
            }
        }
        if self.reference_limit == 0 {
            return Err(BuildError::ZeroReferenceLimit);
        }

        #[cfg(feature = "async")]
        let sweep_config = match self.sweep_interval {
            Some(interval) => {
                let config = SweepConfig::new(interval)?;
                if tokio::runtime::Handle::try_current().is_err() {
                    return Err(BuildError::NoRuntime);
                }
                Some(config)
            }
            None => None,
        };

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock::new()));
        let throttle = RequestThrottle::assemble(clock, self.cleanup, self.reference_limit);

        #[cfg(feature = "async")]
        {
            if let Some(config) = sweep_config {
                let handle = ExpirySweeper::new(throttle.limiter().clone(), config).start();
                *throttle.sweeper.lock() = Some(handle);
            }
        }

        Ok(throttle)
    }
}

/// Per-client request limits for the reservation and email endpoints.
///
/// Clones share the same records, metrics and sweeper. The sweeper stops
/// on `shutdown`, or once the last clone is dropped.
///
/// # Example
///
/// ```
/// use eunpa_salon::{Endpoint, RequestThrottle};
///
/// let throttle = RequestThrottle::new();
/// for _ in 0..5 {
///     assert!(throttle.admit(Endpoint::EmailRelay, "203.0.113.7").is_ok());
/// }
/// let err = throttle.admit(Endpoint::EmailRelay, "203.0.113.7").unwrap_err();
/// assert_eq!(err.status_code(), 429);
/// ```
#[derive(Clone)]
pub struct RequestThrottle {
    guard: SubmissionGuard<RecordStorage>,
    #[cfg(feature = "async")]
    sweeper: Arc<SweeperSlot>,
}

impl RequestThrottle {
    /// Create a builder for configuring the throttle.
    ///
    /// Defaults:
    /// - Clock: system clock
    /// - Cleanup: probabilistic, 10% of calls
    /// - Reference limit: 10
    /// - Background sweeper: none
    pub fn builder() -> RequestThrottleBuilder {
        RequestThrottleBuilder {
            clock: None,
            cleanup: CleanupStrategy::default(),
            reference_limit: DEFAULT_REFERENCE_LIMIT,
            #[cfg(feature = "async")]
            sweep_interval: None,
        }
    }

    /// Create a throttle with default settings.
    pub fn new() -> Self {
        Self::assemble(
            Arc::new(SystemClock::new()),
            CleanupStrategy::default(),
            DEFAULT_REFERENCE_LIMIT,
        )
    }

    fn assemble(clock: Arc<dyn Clock>, cleanup: CleanupStrategy, reference_limit: u32) -> Self {
        let storage: RecordStorage = Arc::new(ShardedStorage::new());
        let registry = WindowRegistry::new(storage, clock);
        let limiter = FixedWindowLimiter::new(registry, Metrics::new(), cleanup)
            .with_reference_limit(reference_limit);

        Self {
            guard: SubmissionGuard::new(limiter),
            #[cfg(feature = "async")]
            sweeper: Arc::new(SweeperSlot::default()),
        }
    }

    /// See [`FixedWindowLimiter::check_and_consume`].
    pub fn check_and_consume(
        &self,
        identifier: &str,
        limit: u32,
        window_seconds: u64,
    ) -> Result<bool, PolicyError> {
        self.limiter().check_and_consume(identifier, limit, window_seconds)
    }

    /// See [`FixedWindowLimiter::check`].
    pub fn check(&self, identifier: &str, policy: &WindowPolicy) -> WindowDecision {
        self.limiter().check(identifier, policy)
    }

    /// See [`FixedWindowLimiter::peek`].
    pub fn peek(&self, identifier: &str) -> Option<RateLimitInfo> {
        self.limiter().peek(identifier)
    }

    /// Count one request against an endpoint's budget.
    pub fn admit(&self, endpoint: Endpoint, client: &str) -> Result<(), SubmissionError> {
        self.guard.admit(endpoint, client)
    }

    /// Rate limit, then validate, a reservation form.
    pub fn submit(
        &self,
        endpoint: Endpoint,
        client: &str,
        request: &ReservationRequest,
        today: NaiveDate,
    ) -> Result<Reservation, SubmissionError> {
        self.guard.submit(endpoint, client, request, today)
    }

    /// Purge expired records now.
    pub fn sweep_expired(&self) -> usize {
        self.limiter().sweep_expired()
    }

    /// Get a reference to the submission guard.
    pub fn guard(&self) -> &SubmissionGuard<RecordStorage> {
        &self.guard
    }

    /// Get a reference to the underlying limiter.
    pub fn limiter(&self) -> &FixedWindowLimiter<RecordStorage> {
        self.guard.limiter()
    }

    /// Get a reference to the metrics.
    pub fn metrics(&self) -> &Metrics {
        self.limiter().metrics()
    }

    /// Records currently held in memory.
    pub fn tracked_identifiers(&self) -> usize {
        self.limiter().tracked_identifiers()
    }

    /// Whether a background sweeper is running.
    #[cfg(feature = "async")]
    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the background sweeper, if one is running.
    ///
    /// **Requires the `async` feature.**
    ///
    /// # Errors
    /// Returns an error if the sweeper task did not stop cleanly.
    #[cfg(feature = "async")]
    pub async fn shutdown(&self) -> Result<(), ShutdownError> {
        // Release the lock before awaiting
        let handle = self.sweeper.lock().take();

        if let Some(handle) = handle {
            handle.shutdown().await?;
        }
        Ok(())
    }
}

impl Default for RequestThrottle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RequestThrottle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestThrottle")
            .field("guard", &self.guard)
            .finish()
    }
}
