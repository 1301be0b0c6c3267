mod common;

use chrono::NaiveDate;
use common::throttle;
use eunpa_salon::{client_identifier, Endpoint, Field, ReservationRequest, SubmissionError};
use std::time::Duration;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
}

fn form_body() -> &'static str {
    r#"{
        "name": "김민지",
        "email": "",
        "phone": "010-1234-5678",
        "date": "2026-10-24",
        "time": "11:00",
        "service": "Perm",
        "message": ""
    }"#
}

#[test]
fn test_json_form_is_accepted() {
    let (throttle, _clock) = throttle();
    let request: ReservationRequest = serde_json::from_str(form_body()).unwrap();

    let client = client_identifier(Some("203.0.113.7, 10.0.0.1"), Some("10.0.0.1"));
    let reservation = throttle
        .submit(Endpoint::Reservation, &client, &request, today())
        .unwrap();

    assert_eq!(reservation.email, None);
    assert_eq!(reservation.service.as_deref(), Some("Perm"));
    assert_eq!(reservation.date, NaiveDate::from_ymd_opt(2026, 10, 24).unwrap());
    assert_eq!(throttle.guard().remaining(Endpoint::Reservation, &client), Some(9));
}

#[test]
fn test_missing_fields_default_and_fail_validation() {
    let (throttle, _clock) = throttle();
    let request: ReservationRequest = serde_json::from_str(r#"{"name": "Jane"}"#).unwrap();

    let err = throttle
        .submit(Endpoint::Reservation, "client", &request, today())
        .unwrap_err();
    assert_eq!(err.status_code(), 400);

    let SubmissionError::Invalid(errors) = err else {
        panic!("expected validation failure");
    };
    assert!(!errors.has(Field::Name));
    assert!(errors.has(Field::Phone));
    assert!(errors.has(Field::Date));
    assert!(errors.has(Field::Time));
    assert!(errors.to_string().starts_with("invalid input: "));
}

#[test]
fn test_eleventh_reservation_in_a_minute_is_refused() {
    let (throttle, clock) = throttle();
    let request: ReservationRequest = serde_json::from_str(form_body()).unwrap();

    for _ in 0..10 {
        throttle
            .submit(Endpoint::Reservation, "198.51.100.2", &request, today())
            .unwrap();
    }
    clock.advance_secs(15);
    let err = throttle
        .submit(Endpoint::Reservation, "198.51.100.2", &request, today())
        .unwrap_err();
    assert_eq!(
        err,
        SubmissionError::TooManyRequests {
            retry_after: Some(Duration::from_secs(45))
        }
    );

    // Other clients are unaffected
    assert!(throttle
        .submit(Endpoint::Reservation, "198.51.100.3", &request, today())
        .is_ok());

    clock.advance_secs(46);
    assert!(throttle
        .submit(Endpoint::Reservation, "198.51.100.2", &request, today())
        .is_ok());
}

#[test]
fn test_reservations_count_toward_the_email_relay_budget() {
    let (throttle, clock) = throttle();
    let request: ReservationRequest = serde_json::from_str(form_body()).unwrap();

    for _ in 0..5 {
        throttle
            .submit(Endpoint::Reservation, "client", &request, today())
            .unwrap();
    }
    assert_eq!(
        throttle
            .submit(Endpoint::EmailRelay, "client", &request, today())
            .unwrap_err()
            .status_code(),
        429
    );
    assert_eq!(throttle.metrics().requests_rejected(), 1);

    // A fresh window restores the relay budget
    clock.advance_secs(61);
    assert!(throttle
        .submit(Endpoint::EmailRelay, "client", &request, today())
        .is_ok());
}

#[test]
fn test_non_ascii_digits_in_form_are_rejected() {
    let (throttle, _clock) = throttle();
    let request = ReservationRequest {
        time: "१२:००".to_string(),
        phone: "010-١٢٣٤-٥٦٧٨".to_string(),
        ..serde_json::from_str(form_body()).unwrap()
    };

    let SubmissionError::Invalid(errors) = throttle
        .submit(Endpoint::Reservation, "client", &request, today())
        .unwrap_err()
    else {
        panic!("expected validation failure");
    };
    assert!(errors.has(Field::Time));
    assert!(errors.has(Field::Phone));
}

#[test]
fn test_requests_without_address_share_one_bucket() {
    let (throttle, _clock) = throttle();
    let anonymous = client_identifier(None, None);

    for _ in 0..5 {
        throttle.admit(Endpoint::EmailRelay, &anonymous).unwrap();
    }
    let other_anonymous = client_identifier(Some("  "), None);
    assert!(throttle.admit(Endpoint::EmailRelay, &other_anonymous).is_err());
}
