//! Request gating for the public form endpoints.
//!
//! Both endpoints count against one record per client address; each
//! endpoint only differs in how many requests per window it tolerates. Five
//! reservations in a minute therefore also exhaust the email relay's budget
//! of five. A submission is rate limited first and validated second, so a
//! flood of malformed bodies still uses up the client's budget.

use crate::application::limiter::FixedWindowLimiter;
use crate::application::ports::Storage;
use crate::domain::reservation::{Reservation, ReservationRequest, ValidationErrors};
use crate::domain::window::{RateLimitRecord, WindowPolicy};
use chrono::NaiveDate;
use std::fmt;
use std::time::Duration;

/// Identifier used when the request carries no client address.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// A rate-limited form endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Reservation form submissions
    Reservation,
    /// Reservation notification email relay
    EmailRelay,
}

impl Endpoint {
    /// The request budget for this endpoint.
    pub fn policy(&self) -> WindowPolicy {
        match self {
            Endpoint::Reservation => WindowPolicy::RESERVATION,
            Endpoint::EmailRelay => WindowPolicy::EMAIL_RELAY,
        }
    }

    /// Short name used in log events.
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Reservation => "reservation",
            Endpoint::EmailRelay => "email",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Derive the limiter identifier from proxy headers.
///
/// Uses the first entry of `X-Forwarded-For`, then `X-Real-IP`, then
/// [`UNKNOWN_CLIENT`]. Blank values are skipped.
///
/// # Example
/// ```
/// use eunpa_salon::application::guard::client_identifier;
///
/// assert_eq!(client_identifier(Some("203.0.113.7, 10.0.0.1"), None), "203.0.113.7");
/// assert_eq!(client_identifier(None, Some("198.51.100.2")), "198.51.100.2");
/// assert_eq!(client_identifier(None, None), "unknown");
/// ```
pub fn client_identifier(forwarded_for: Option<&str>, real_ip: Option<&str>) -> String {
    forwarded_for
        .and_then(|header| header.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .or_else(|| real_ip.map(str::trim).filter(|ip| !ip.is_empty()))
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

/// Why a submission was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    /// The client's request count reached this endpoint's limit
    TooManyRequests {
        /// Time until the client's window closes, when known
        retry_after: Option<Duration>,
    },
    /// The form failed validation
    Invalid(ValidationErrors),
}

impl SubmissionError {
    /// HTTP status code to answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            SubmissionError::TooManyRequests { .. } => 429,
            SubmissionError::Invalid(_) => 400,
        }
    }
}

impl fmt::Display for SubmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionError::TooManyRequests {
                retry_after: Some(after),
            } => write!(
                f,
                "too many requests, try again in {} seconds",
                after.as_secs().max(1)
            ),
            SubmissionError::TooManyRequests { retry_after: None } => {
                write!(f, "too many requests, try again later")
            }
            SubmissionError::Invalid(errors) => write!(f, "{}", errors),
        }
    }
}

impl std::error::Error for SubmissionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SubmissionError::Invalid(errors) => Some(errors),
            SubmissionError::TooManyRequests { .. } => None,
        }
    }
}

impl From<ValidationErrors> for SubmissionError {
    fn from(errors: ValidationErrors) -> Self {
        SubmissionError::Invalid(errors)
    }
}

/// Applies per-endpoint limits over a shared per-client count, and form
/// validation.
///
/// Clones share the underlying limiter.
#[derive(Clone)]
pub struct SubmissionGuard<S>
where
    S: Storage<String, RateLimitRecord> + Clone,
{
    limiter: FixedWindowLimiter<S>,
}

impl<S> SubmissionGuard<S>
where
    S: Storage<String, RateLimitRecord> + Clone,
{
    pub fn new(limiter: FixedWindowLimiter<S>) -> Self {
        Self { limiter }
    }

    /// Count one request from `client`, admitting it while the client's
    /// count is below `endpoint`'s limit.
    ///
    /// # Errors
    /// Returns `SubmissionError::TooManyRequests` when the budget is spent.
    pub fn admit(&self, endpoint: Endpoint, client: &str) -> Result<(), SubmissionError> {
        if self.limiter.check(client, &endpoint.policy()).is_admit() {
            return Ok(());
        }

        let registry = self.limiter.registry();
        let retry_after = registry
            .live_record(client)
            .map(|record| record.retry_after(registry.now()));
        Err(SubmissionError::TooManyRequests { retry_after })
    }

    /// Rate limit, then validate, a reservation form.
    ///
    /// # Errors
    /// `TooManyRequests` if the budget is spent, otherwise `Invalid` with
    /// every failing field.
    pub fn submit(
        &self,
        endpoint: Endpoint,
        client: &str,
        request: &ReservationRequest,
        today: NaiveDate,
    ) -> Result<Reservation, SubmissionError> {
        self.admit(endpoint, client)?;

        let reservation = request.validate(today).map_err(|errors| {
            tracing::debug!(endpoint = endpoint.name(), client, %errors, "submission rejected");
            errors
        })?;

        tracing::debug!(
            endpoint = endpoint.name(),
            client,
            date = %reservation.date,
            "submission accepted"
        );
        Ok(reservation)
    }

    /// Remaining budget for `client` on `endpoint`, or `None` before its
    /// first request in the current window.
    pub fn remaining(&self, endpoint: Endpoint, client: &str) -> Option<u32> {
        self.limiter
            .peek_with_limit(client, endpoint.policy().limit())
            .map(|info| info.remaining)
    }

    /// Get a reference to the limiter.
    pub fn limiter(&self) -> &FixedWindowLimiter<S> {
        &self.limiter
    }
}

impl<S> fmt::Debug for SubmissionGuard<S>
where
    S: Storage<String, RateLimitRecord> + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionGuard")
            .field("limiter", &self.limiter)
            .finish()
    }
}
