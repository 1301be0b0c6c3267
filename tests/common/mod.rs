#![allow(dead_code)]

use eunpa_salon::infrastructure::mocks::MockClock;
use eunpa_salon::{CleanupStrategy, RequestThrottle};
use std::sync::Arc;

/// Throttle on a hand-driven clock with no random cleanup.
pub fn throttle() -> (RequestThrottle, MockClock) {
    let clock = MockClock::starting_now();
    let throttle = RequestThrottle::builder()
        .with_clock(Arc::new(clock.clone()))
        .with_cleanup(CleanupStrategy::Disabled)
        .build()
        .unwrap();
    (throttle, clock)
}
