//! Fixed-window request accounting.
//!
//! A [`RateLimitRecord`] counts the requests one identifier made in the
//! current window. The window opens on the first request and closes at a
//! fixed instant; the next request after that opens a fresh window.
//!
//! This is a fixed window, not a sliding log: `limit` requests at the very
//! end of one window followed by `limit` more at the start of the next are
//! all admitted, so up to twice the limit can pass around a boundary.

use std::fmt;
use std::time::{Duration, Instant};

/// Error returned when policy parameters are invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyError {
    /// The request limit must be at least 1
    ZeroLimit,
    /// The window length must be greater than zero
    ZeroWindow,
    /// The window length exceeds [`WindowPolicy::MAX_WINDOW`]
    WindowTooLarge,
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyError::ZeroLimit => write!(f, "limit must be greater than 0"),
            PolicyError::ZeroWindow => write!(f, "window must be greater than 0"),
            PolicyError::WindowTooLarge => write!(
                f,
                "window must not exceed {} seconds",
                WindowPolicy::MAX_WINDOW.as_secs()
            ),
        }
    }
}

impl std::error::Error for PolicyError {}

/// How many requests are admitted per window, and how long a window lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPolicy {
    limit: u32,
    window: Duration,
}

impl WindowPolicy {
    /// Reservation form submissions: 10 per 60 seconds.
    pub const RESERVATION: WindowPolicy = WindowPolicy {
        limit: 10,
        window: Duration::from_secs(60),
    };

    /// Email relay: 5 per 60 seconds.
    pub const EMAIL_RELAY: WindowPolicy = WindowPolicy {
        limit: 5,
        window: Duration::from_secs(60),
    };

    /// Longest accepted window: one year.
    pub const MAX_WINDOW: Duration = Duration::from_secs(365 * 24 * 60 * 60);

    /// Create a policy.
    ///
    /// # Errors
    /// Returns `PolicyError::ZeroLimit` or `PolicyError::ZeroWindow` for
    /// zero parameters, and `PolicyError::WindowTooLarge` for a window
    /// longer than [`Self::MAX_WINDOW`].
    pub fn new(limit: u32, window: Duration) -> Result<Self, PolicyError> {
        if limit == 0 {
            return Err(PolicyError::ZeroLimit);
        }
        if window.is_zero() {
            return Err(PolicyError::ZeroWindow);
        }
        if window > Self::MAX_WINDOW {
            return Err(PolicyError::WindowTooLarge);
        }
        Ok(Self { limit, window })
    }

    /// Create a policy with the window given in whole seconds.
    pub fn per_seconds(limit: u32, window_seconds: u64) -> Result<Self, PolicyError> {
        Self::new(limit, Duration::from_secs(window_seconds))
    }

    /// Maximum admitted requests per window.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Window length.
    pub fn window(&self) -> Duration {
        self.window
    }
}

/// Outcome of registering a request against a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowDecision {
    /// The request is within the limit and was counted
    Admit,
    /// The limit for the current window is used up
    Reject,
}

impl WindowDecision {
    /// Check if this decision is Admit.
    pub fn is_admit(&self) -> bool {
        matches!(self, WindowDecision::Admit)
    }

    /// Check if this decision is Reject.
    pub fn is_reject(&self) -> bool {
        matches!(self, WindowDecision::Reject)
    }
}

/// Per-identifier request count for the current window.
///
/// `count` is at least 1 for as long as the record exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRecord {
    count: u32,
    reset_at: Instant,
}

impl RateLimitRecord {
    /// Open a new window at `now`, counting the request that opened it.
    ///
    /// A window reaching past the largest representable instant is
    /// clamped to [`WindowPolicy::MAX_WINDOW`].
    pub fn open(now: Instant, window: Duration) -> Self {
        let reset_at = now
            .checked_add(window)
            .or_else(|| now.checked_add(WindowPolicy::MAX_WINDOW))
            .unwrap_or(now);
        Self { count: 1, reset_at }
    }

    /// Requests counted in the current window.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// When the current window closes.
    pub fn reset_at(&self) -> Instant {
        self.reset_at
    }

    /// A record is expired once `now` is strictly past `reset_at`.
    /// Expired records must be treated as absent.
    pub fn is_expired(&self, now: Instant) -> bool {
        now > self.reset_at
    }

    /// Register one more request at `now`.
    ///
    /// Expired records are replaced by a fresh window. Rejections leave the
    /// record untouched.
    pub fn register(&mut self, now: Instant, policy: &WindowPolicy) -> WindowDecision {
        if self.is_expired(now) {
            *self = Self::open(now, policy.window);
            return WindowDecision::Admit;
        }

        if self.count >= policy.limit {
            return WindowDecision::Reject;
        }

        self.count += 1;
        WindowDecision::Admit
    }

    /// Requests left under `limit` in this window.
    pub fn remaining(&self, limit: u32) -> u32 {
        limit.saturating_sub(self.count)
    }

    /// Time until the window closes, zero if already closed.
    pub fn retry_after(&self, now: Instant) -> Duration {
        self.reset_at.saturating_duration_since(now)
    }

    /// Read-only view of the record under a reference limit.
    pub fn info(&self, limit: u32) -> RateLimitInfo {
        RateLimitInfo {
            remaining: self.remaining(limit),
            reset_at: self.reset_at,
        }
    }
}

/// Snapshot returned by `peek`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// `max(0, limit - count)` for the reference limit used
    pub remaining: u32,
    /// When the current window closes
    pub reset_at: Instant,
}
