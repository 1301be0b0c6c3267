//! Identifier-keyed registry of open request windows.
//!
//! The registry pairs the record storage with the clock, so every access
//! sees a single consistent `now`.

use crate::application::ports::{Clock, Storage};
use crate::domain::window::RateLimitRecord;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Registry of request windows, generic over the storage backend.
///
/// In production use `Arc<ShardedStorage<String, RateLimitRecord>>`.
#[derive(Clone)]
pub struct WindowRegistry<S>
where
    S: Storage<String, RateLimitRecord> + Clone,
{
    storage: S,
    clock: Arc<dyn Clock>,
}

impl<S> WindowRegistry<S>
where
    S: Storage<String, RateLimitRecord> + Clone,
{
    /// Create a registry over `storage` that reads time from `clock`.
    pub fn new(storage: S, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Current time according to the registry's clock.
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Run `f` on the record for `identifier` while holding its entry lock.
    ///
    /// A missing record is created by opening a `window` at the current
    /// time; `f` is told whether that just happened.
    pub fn with_record<F, R>(&self, identifier: &str, window: Duration, f: F) -> R
    where
        F: FnOnce(&mut RateLimitRecord, bool, Instant) -> R,
    {
        let now = self.clock.now();
        self.storage.with_entry_mut(
            identifier.to_string(),
            || RateLimitRecord::open(now, window),
            |record, created| f(record, created, now),
        )
    }

    /// Copy of the live record for `identifier`. Expired records read as
    /// `None` whether or not they were purged yet.
    pub fn live_record(&self, identifier: &str) -> Option<RateLimitRecord> {
        let now = self.clock.now();
        self.storage
            .read(identifier, |record| *record)
            .filter(|record| !record.is_expired(now))
    }

    /// Remove every expired record and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut purged = 0;
        self.storage.retain(|_, record| {
            let expired = record.is_expired(now);
            if expired {
                purged += 1;
            }
            !expired
        });
        purged
    }

    /// Number of records held in memory, expired ones included.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Drop all records.
    pub fn clear(&self) {
        self.storage.clear();
    }
}

impl<S> std::fmt::Debug for WindowRegistry<S>
where
    S: Storage<String, RateLimitRecord> + Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowRegistry")
            .field("records", &self.storage.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mocks::MockClock;
    use crate::infrastructure::storage::ShardedStorage;

    type TestRegistry = WindowRegistry<Arc<ShardedStorage<String, RateLimitRecord>>>;

    fn registry() -> (TestRegistry, MockClock) {
        let clock = MockClock::starting_now();
        let registry = WindowRegistry::new(Arc::new(ShardedStorage::new()), Arc::new(clock.clone()));
        (registry, clock)
    }

    #[test]
    fn test_with_record_creates_once() {
        let (registry, _clock) = registry();
        let window = Duration::from_secs(60);

        assert!(registry.with_record("a", window, |_, created, _| created));
        assert!(!registry.with_record("a", window, |_, created, _| created));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_live_record_hides_expired() {
        let (registry, clock) = registry();
        registry.with_record("a", Duration::from_secs(60), |_, _, _| ());

        assert_eq!(registry.live_record("a").map(|r| r.count()), Some(1));
        clock.advance_secs(61);
        assert_eq!(registry.live_record("a"), None);
        // Still physically present until purged
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_purge_expired_keeps_live_records() {
        let (registry, clock) = registry();
        registry.with_record("short", Duration::from_secs(10), |_, _, _| ());
        registry.with_record("long", Duration::from_secs(100), |_, _, _| ());

        clock.advance_secs(11);
        assert_eq!(registry.purge_expired(), 1);
        assert!(registry.live_record("long").is_some());
        assert_eq!(registry.len(), 1);

        registry.clear();
        assert!(registry.is_empty());
    }
}
