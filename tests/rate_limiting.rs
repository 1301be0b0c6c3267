mod common;

use common::throttle;
use eunpa_salon::infrastructure::mocks::MockClock;
use eunpa_salon::{CleanupStrategy, PolicyError, RequestThrottle, WindowPolicy};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

#[test]
fn test_fourth_request_in_window_is_rejected() {
    let (throttle, _clock) = throttle();

    let results: Vec<bool> = (0..4)
        .map(|_| throttle.check_and_consume("1.2.3.4", 3, 60).unwrap())
        .collect();

    assert_eq!(results, vec![true, true, true, false]);
}

#[test]
fn test_rejections_do_not_extend_the_window() {
    let (throttle, clock) = throttle();
    let start_info = {
        throttle.check_and_consume("client", 1, 60).unwrap();
        throttle.peek("client").unwrap()
    };

    for _ in 0..10 {
        clock.advance_secs(5);
        assert!(!throttle.check_and_consume("client", 1, 60).unwrap());
    }
    assert_eq!(throttle.peek("client").unwrap().reset_at, start_info.reset_at);

    clock.advance_secs(11);
    assert!(throttle.check_and_consume("client", 1, 60).unwrap());
}

#[test]
fn test_window_boundary_allows_double_burst() {
    let (throttle, clock) = throttle();

    // First request opens the window; the rest arrive just before it closes
    assert!(throttle.check_and_consume("burst", 5, 60).unwrap());
    clock.advance_secs(59);
    for _ in 0..4 {
        assert!(throttle.check_and_consume("burst", 5, 60).unwrap());
    }
    assert!(!throttle.check_and_consume("burst", 5, 60).unwrap());

    // Two seconds later a fresh window admits a full limit again
    clock.advance_secs(2);
    let admitted = (0..6)
        .filter(|_| throttle.check_and_consume("burst", 5, 60).unwrap())
        .count();
    assert_eq!(admitted, 5);
}

#[test]
fn test_reset_instant_itself_is_still_inside_the_window() {
    let (throttle, clock) = throttle();
    throttle.check_and_consume("edge", 1, 30).unwrap();

    clock.advance_secs(30);
    assert!(!throttle.check_and_consume("edge", 1, 30).unwrap());

    clock.advance(Duration::from_millis(1));
    assert!(throttle.check_and_consume("edge", 1, 30).unwrap());
}

#[test]
fn test_invalid_parameters_are_reported() {
    let (throttle, _clock) = throttle();
    assert_eq!(throttle.check_and_consume("a", 0, 60), Err(PolicyError::ZeroLimit));
    assert_eq!(throttle.check_and_consume("a", 3, 0), Err(PolicyError::ZeroWindow));
    assert_eq!(throttle.peek("a"), None);
}

#[test]
fn test_huge_window_is_an_error_not_a_crash() {
    let (throttle, _clock) = throttle();
    assert_eq!(
        throttle.check_and_consume("a", 1, u64::MAX),
        Err(PolicyError::WindowTooLarge)
    );
    assert_eq!(throttle.peek("a"), None);

    // The longest accepted window still works
    let one_year = WindowPolicy::MAX_WINDOW.as_secs();
    assert!(throttle.check_and_consume("a", 1, one_year).unwrap());
    assert!(!throttle.check_and_consume("a", 1, one_year).unwrap());
}

#[test]
fn test_peek_never_counts() {
    let (throttle, _clock) = throttle();
    throttle.check_and_consume("client", 3, 60).unwrap();

    for _ in 0..20 {
        assert_eq!(throttle.peek("client").unwrap().remaining, 9);
    }
    assert_eq!(throttle.metrics().snapshot().total_requests(), 1);
}

#[test]
fn test_typed_policy_matches_raw_parameters() {
    let (throttle, _clock) = throttle();
    let policy = WindowPolicy::new(2, Duration::from_secs(60)).unwrap();

    assert!(throttle.check("typed", &policy).is_admit());
    assert!(throttle.check_and_consume("typed", 2, 60).unwrap());
    assert!(throttle.check("typed", &policy).is_reject());
}

#[test]
fn test_many_identifiers_under_contention() {
    const CLIENTS: usize = 8;
    const THREADS_PER_CLIENT: usize = 6;
    const LIMIT: u32 = 4;

    let (throttle, _clock) = throttle();
    let barrier = Arc::new(Barrier::new(CLIENTS * THREADS_PER_CLIENT));

    let handles: Vec<_> = (0..CLIENTS * THREADS_PER_CLIENT)
        .map(|i| {
            let throttle = throttle.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let client = format!("10.0.0.{}", i % CLIENTS);
                barrier.wait();
                (0..2)
                    .filter(|_| throttle.check_and_consume(&client, LIMIT, 60).unwrap())
                    .count()
            })
        })
        .collect();

    let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    // Each client sent 12 requests against a limit of 4
    assert_eq!(admitted, CLIENTS * LIMIT as usize);
    for client in 0..CLIENTS {
        let info = throttle.peek(&format!("10.0.0.{}", client)).unwrap();
        assert_eq!(info.remaining, 10 - LIMIT);
    }
}

#[test]
fn test_probabilistic_cleanup_bounds_memory() {
    let clock = MockClock::starting_now();
    let throttle = RequestThrottle::builder()
        .with_clock(Arc::new(clock.clone()))
        .with_cleanup(CleanupStrategy::Probabilistic { probability: 1.0 })
        .build()
        .unwrap();

    for i in 0..100 {
        throttle.check_and_consume(&format!("client-{}", i), 1, 10).unwrap();
    }
    assert_eq!(throttle.tracked_identifiers(), 100);

    clock.advance_secs(11);
    throttle.check_and_consume("late", 1, 10).unwrap();
    assert_eq!(throttle.tracked_identifiers(), 1);
    assert_eq!(throttle.metrics().records_purged(), 100);
}

#[test]
fn test_expired_records_are_absent_before_purge() {
    let (throttle, clock) = throttle();
    throttle.check_and_consume("stale", 1, 10).unwrap();
    clock.advance_secs(11);

    assert_eq!(throttle.peek("stale"), None);
    assert_eq!(throttle.tracked_identifiers(), 1);
    assert_eq!(throttle.sweep_expired(), 1);
    assert_eq!(throttle.tracked_identifiers(), 0);
}
