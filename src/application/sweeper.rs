//! Periodic purging of expired request records.
//!
//! The probabilistic per-call cleanup bounds memory on busy endpoints; a
//! timer-driven sweep also covers quiet periods where no calls arrive.

use crate::application::limiter::FixedWindowLimiter;
use crate::application::ports::Storage;
use crate::domain::window::RateLimitRecord;
use std::fmt;
use std::time::Duration;

#[cfg(feature = "async")]
use tokio::sync::oneshot;
#[cfg(feature = "async")]
use tokio::task::JoinHandle;

/// Error returned when sweeper configuration validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepConfigError {
    /// Sweep interval must be greater than zero
    ZeroInterval,
}

impl fmt::Display for SweepConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepConfigError::ZeroInterval => write!(f, "sweep interval must be greater than 0"),
        }
    }
}

impl std::error::Error for SweepConfigError {}

/// How often the background sweep runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepConfig {
    interval: Duration,
}

impl SweepConfig {
    /// Create a sweep config.
    ///
    /// # Errors
    /// Returns `SweepConfigError::ZeroInterval` if `interval` is zero.
    pub fn new(interval: Duration) -> Result<Self, SweepConfigError> {
        if interval.is_zero() {
            return Err(SweepConfigError::ZeroInterval);
        }
        Ok(Self { interval })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
        }
    }
}

/// Sweeps a limiter's expired records on a timer.
pub struct ExpirySweeper<S>
where
    S: Storage<String, RateLimitRecord> + Clone,
{
    limiter: FixedWindowLimiter<S>,
    config: SweepConfig,
}

impl<S> ExpirySweeper<S>
where
    S: Storage<String, RateLimitRecord> + Clone,
{
    /// Create a sweeper for `limiter` (a clone sharing its records).
    pub fn new(limiter: FixedWindowLimiter<S>, config: SweepConfig) -> Self {
        Self { limiter, config }
    }

    /// Run one sweep now.
    pub fn sweep_once(&self) -> usize {
        self.limiter.sweep_expired()
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Spawn the sweep loop on the current tokio runtime.
    ///
    /// The loop runs until `SweeperHandle::shutdown` or `SweeperHandle::stop`
    /// is called. Dropping the handle without calling either leaves the task
    /// running.
    ///
    /// Must be called from within a tokio runtime.
    #[cfg(feature = "async")]
    pub fn start(self) -> SweeperHandle
    where
        S: Send + Sync + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let join_handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.interval);
            // The first tick completes immediately
            ticker.tick().await;
            // A dropped handle closes the channel without asking to stop
            let mut handle_alive = true;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.sweep_once();
                    }
                    signal = &mut shutdown_rx, if handle_alive => {
                        if signal.is_ok() {
                            tracing::debug!("expiry sweeper stopping");
                            break;
                        }
                        handle_alive = false;
                    }
                }
            }
        });

        SweeperHandle {
            shutdown_tx: Some(shutdown_tx),
            join_handle,
        }
    }
}

/// Error returned when stopping the sweeper fails.
#[cfg(feature = "async")]
#[derive(Debug)]
pub enum ShutdownError {
    /// The sweep task panicked
    TaskPanicked,
    /// The sweep task was cancelled before it could stop cleanly
    TaskCancelled,
}

#[cfg(feature = "async")]
impl fmt::Display for ShutdownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownError::TaskPanicked => write!(f, "sweeper task panicked"),
            ShutdownError::TaskCancelled => write!(f, "sweeper task was cancelled"),
        }
    }
}

#[cfg(feature = "async")]
impl std::error::Error for ShutdownError {}

/// Handle to a running sweep loop.
#[cfg(feature = "async")]
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    join_handle: JoinHandle<()>,
}

#[cfg(feature = "async")]
impl SweeperHandle {
    /// Stop the loop and wait for the task to finish.
    pub async fn shutdown(mut self) -> Result<(), ShutdownError> {
        if let Some(tx) = self.shutdown_tx.take() {
            // The task may already be gone; join below reports why
            let _ = tx.send(());
        }

        match self.join_handle.await {
            Ok(()) => Ok(()),
            Err(e) if e.is_panic() => Err(ShutdownError::TaskPanicked),
            Err(_) => Err(ShutdownError::TaskCancelled),
        }
    }

    /// Ask the loop to stop without waiting for it.
    pub fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Whether the task has ended.
    pub fn is_finished(&self) -> bool {
        self.join_handle.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::limiter::CleanupStrategy;
    use crate::application::metrics::Metrics;
    use crate::application::registry::WindowRegistry;
    use crate::infrastructure::mocks::MockClock;
    use crate::infrastructure::storage::ShardedStorage;
    use std::sync::Arc;

    type TestLimiter = FixedWindowLimiter<Arc<ShardedStorage<String, RateLimitRecord>>>;

    fn limiter() -> (TestLimiter, MockClock) {
        let clock = MockClock::starting_now();
        let registry = WindowRegistry::new(Arc::new(ShardedStorage::new()), Arc::new(clock.clone()));
        let limiter = FixedWindowLimiter::new(registry, Metrics::new(), CleanupStrategy::Disabled);
        (limiter, clock)
    }

    #[test]
    fn test_config_zero_interval() {
        assert_eq!(
            SweepConfig::new(Duration::ZERO),
            Err(SweepConfigError::ZeroInterval)
        );
        assert_eq!(SweepConfig::default().interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_sweep_once_shares_limiter_state() {
        let (limiter, clock) = limiter();
        limiter.check_and_consume("a", 1, 5).unwrap();
        limiter.check_and_consume("b", 1, 50).unwrap();

        let sweeper = ExpirySweeper::new(limiter.clone(), SweepConfig::default());
        assert_eq!(sweeper.sweep_once(), 0);

        clock.advance_secs(6);
        assert_eq!(sweeper.sweep_once(), 1);
        assert_eq!(limiter.tracked_identifiers(), 1);
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_background_sweep_and_shutdown() {
        let (limiter, clock) = limiter();
        limiter.check_and_consume("a", 1, 5).unwrap();
        clock.advance_secs(6);

        let config = SweepConfig::new(Duration::from_millis(20)).unwrap();
        let handle = ExpirySweeper::new(limiter.clone(), config).start();

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(limiter.tracked_identifiers(), 0);
        assert!(!handle.is_finished());

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_ends_loop_without_waiting() {
        let (limiter, clock) = limiter();
        let config = SweepConfig::new(Duration::from_millis(20)).unwrap();
        ExpirySweeper::new(limiter.clone(), config).start().stop();
        tokio::time::sleep(Duration::from_millis(40)).await;

        limiter.check_and_consume("a", 1, 5).unwrap();
        clock.advance_secs(6);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(limiter.tracked_identifiers(), 1);
    }

    #[tokio::test]
    async fn test_dropped_handle_keeps_loop_alive() {
        let (limiter, clock) = limiter();
        let config = SweepConfig::new(Duration::from_millis(20)).unwrap();
        drop(ExpirySweeper::new(limiter.clone(), config).start());
        tokio::time::sleep(Duration::from_millis(40)).await;

        limiter.check_and_consume("a", 1, 5).unwrap();
        clock.advance_secs(6);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(limiter.tracked_identifiers(), 0);
    }
}
