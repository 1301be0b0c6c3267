//! Reservation form input and its validation rules.
//!
//! Both the reservation endpoint and the email relay accept the same form.
//! Validation collects every failing field instead of stopping at the
//! first one, so the caller can report them together.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[가-힣a-zA-Z\s]+$").expect("valid name pattern"));
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^01[0-9]-[0-9]{3,4}-[0-9]{4}$").expect("valid phone pattern"));
static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid date pattern"));
static TIME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{2}:[0-9]{2}$").expect("valid time pattern"));

const NAME_MIN_CHARS: usize = 2;
const NAME_MAX_CHARS: usize = 50;
const SERVICE_MAX_CHARS: usize = 100;
const MESSAGE_MAX_CHARS: usize = 500;
const FIRST_BOOKABLE_HOUR: u32 = 9;
const LAST_BOOKABLE_HOUR: u32 = 19;

/// Raw form body as submitted by the browser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservationRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub date: String,
    pub time: String,
    pub service: Option<String>,
    pub message: Option<String>,
}

/// A reservation that passed validation.
///
/// Empty optional fields are normalized to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reservation {
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub date: NaiveDate,
    pub time: String,
    pub service: Option<String>,
    pub message: Option<String>,
}

/// Form field a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
    Phone,
    Date,
    Time,
    Service,
    Message,
}

/// One failed validation rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: &'static str,
}

/// All validation failures for one submission, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    fn push(&mut self, field: Field, message: &'static str) {
        self.errors.push(FieldError { field, message });
    }

    /// The individual failures.
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Whether `field` failed any rule.
    pub fn has(&self, field: Field) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message).collect();
        write!(f, "invalid input: {}", messages.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl ReservationRequest {
    /// Validate the form against `today` (the earliest bookable date).
    ///
    /// # Errors
    /// Returns every failing rule when any field is invalid.
    pub fn validate(&self, today: NaiveDate) -> Result<Reservation, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let name_chars = self.name.chars().count();
        if name_chars < NAME_MIN_CHARS {
            errors.push(Field::Name, "name must be at least 2 characters");
        } else if name_chars > NAME_MAX_CHARS {
            errors.push(Field::Name, "name must be at most 50 characters");
        } else if !NAME_PATTERN.is_match(&self.name) {
            errors.push(Field::Name, "name may only contain Hangul or Latin letters");
        }

        if let Some(email) = non_empty(&self.email) {
            if !EMAIL_PATTERN.is_match(email) {
                errors.push(Field::Email, "email address is not valid");
            }
        }

        if !PHONE_PATTERN.is_match(&self.phone) {
            errors.push(Field::Phone, "phone number must look like 010-XXXX-XXXX");
        }

        let date = if DATE_PATTERN.is_match(&self.date) {
            match NaiveDate::parse_from_str(&self.date, "%Y-%m-%d") {
                Ok(date) if date < today => {
                    errors.push(Field::Date, "past dates cannot be booked");
                    None
                }
                Ok(date) => Some(date),
                Err(_) => {
                    errors.push(Field::Date, "date is not valid");
                    None
                }
            }
        } else {
            errors.push(Field::Date, "date is not valid");
            None
        };

        if !TIME_PATTERN.is_match(&self.time) {
            errors.push(Field::Time, "time is not valid");
        } else {
            let hour = self
                .time
                .split_once(':')
                .and_then(|(hour, _)| hour.parse::<u32>().ok())
                .unwrap_or(u32::MAX);
            if !(FIRST_BOOKABLE_HOUR..=LAST_BOOKABLE_HOUR).contains(&hour) {
                errors.push(Field::Time, "reservations are available from 09:00 to 19:00");
            }
        }

        if non_empty(&self.service).is_some_and(|s| s.chars().count() > SERVICE_MAX_CHARS) {
            errors.push(Field::Service, "service must be at most 100 characters");
        }

        if non_empty(&self.message).is_some_and(|m| m.chars().count() > MESSAGE_MAX_CHARS) {
            errors.push(Field::Message, "message must be at most 500 characters");
        }

        match date {
            Some(date) if errors.is_empty() => Ok(Reservation {
                name: self.name.clone(),
                email: non_empty(&self.email).map(str::to_string),
                phone: self.phone.clone(),
                date,
                time: self.time.clone(),
                service: non_empty(&self.service).map(str::to_string),
                message: non_empty(&self.message).map(str::to_string),
            }),
            _ => Err(errors),
        }
    }
}

/// Today's date in the server's local time zone.
pub fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
