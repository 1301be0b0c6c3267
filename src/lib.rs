//! # eunpa-salon
//!
//! Core of the Eunpa salon site: which language a visitor sees, the strings
//! shown in that language, and how often a client may hit the public form
//! endpoints.
//!
//! ## Quick Start
//!
//! ```rust
//! use eunpa_salon::{
//!     AcceptLanguage, Endpoint, Locale, MemoryPreferenceStore, PreferenceResolver,
//!     RequestThrottle,
//! };
//!
//! // Locale: saved preference, else browser signal, else Korean
//! let store = MemoryPreferenceStore::new();
//! let resolver = PreferenceResolver::new(store.clone(), AcceptLanguage::new("ja-JP,en;q=0.8"));
//! assert_eq!(resolver.resolve(), Locale::Ja);
//! assert_eq!(resolver.current_translations().header.book_now, "予約する");
//!
//! // Switching persists the choice for the next session
//! resolver.set_locale(Locale::En);
//! let next_session = PreferenceResolver::new(store, AcceptLanguage::new("ko"));
//! assert_eq!(next_session.resolve(), Locale::En);
//!
//! // Rate limiting: one count per client, capped at 10 per minute for
//! // reservations and 5 for the email relay
//! let throttle = RequestThrottle::new();
//! assert!(throttle.admit(Endpoint::Reservation, "203.0.113.7").is_ok());
//! ```
//!
//! ## Locale Resolution
//!
//! [`PreferenceResolver`] picks the active [`Locale`] once per session:
//!
//! 1. A valid tag saved under the `"language"` key of the
//!    [`PreferenceStore`]
//! 2. The primary subtag of the [`LanguageSignal`] (OS locale, or a
//!    browser's `Accept-Language`)
//! 3. Korean
//!
//! Resolution itself never writes storage. Only an explicit
//! `set_locale` persists a choice, and a failed write never undoes it in
//! memory.
//!
//! ## Translations
//!
//! Every locale has a [`Translations`] table with the same shape. The
//! tables are embedded JSON, deserialized once and checked against the type
//! (missing or unknown keys fail). Strings can be read as fields or
//! resolved by key:
//!
//! ```rust
//! use eunpa_salon::{catalog, Locale};
//!
//! let t = catalog::translations(Locale::Ko);
//! assert_eq!(t.services_list.perm, "펌");
//! assert_eq!(
//!     t.lookup("pricing.premiumFeatures[5]").unwrap().as_text(),
//!     Some("스타일링 가이드")
//! );
//! assert!(catalog::verify_parity().is_ok());
//! ```
//!
//! ## Rate Limiting
//!
//! [`FixedWindowLimiter`] counts requests per identifier in fixed windows.
//! The first request opens a window of `window_seconds`; up to `limit`
//! requests are admitted until it closes; the first request after that
//! opens a new one.
//!
//! ```rust
//! use eunpa_salon::RequestThrottle;
//!
//! let throttle = RequestThrottle::new();
//! let results: Vec<bool> = (0..4)
//!     .map(|_| throttle.check_and_consume("198.51.100.2", 3, 60).unwrap())
//!     .collect();
//! assert_eq!(results, vec![true, true, true, false]);
//! ```
//!
//! The check and the increment happen under one per-key lock, so
//! concurrent requests cannot overshoot the limit.
//!
//! ### Window boundaries
//!
//! Windows are fixed, not sliding. A client that sends `limit` requests
//! just before its window closes and `limit` more just after gets all of
//! them admitted: up to twice the limit in a short span.
//!
//! ### Memory
//!
//! Expired records are treated as absent immediately and removed later:
//! each `check` sweeps with probability 0.1 by default
//! ([`CleanupStrategy`]), `sweep_expired` sweeps on demand, and with the
//! `async` feature a background sweeper can run on a timer until `shutdown`
//! or until the last throttle clone is dropped:
//!
//! ```rust,no_run
//! use eunpa_salon::RequestThrottle;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let throttle = RequestThrottle::builder()
//!     .with_sweep_interval(Duration::from_secs(60))
//!     .build()
//!     .expect("valid config");
//!
//! // Serve requests...
//!
//! throttle.shutdown().await.expect("shutdown failed");
//! # }
//! ```
//!
//! ### Limitations
//!
//! Counts live in this process's memory. Several instances behind a load
//! balancer each enforce their own limit, and a restart forgets every
//! count. Treat this as abuse mitigation for low-stakes endpoints, not as a
//! security boundary.
//!
//! ## Logging
//!
//! The crate emits `tracing` events and never installs a subscriber:
//! `debug` for admissions and locale resolution, `warn` for rejections and
//! failed preference writes, `error` for an embedded table that fails to
//! load.
//!
//! ## Features
//!
//! - `async` (default): background expiry sweeper on tokio
//! - `test-helpers`: exports `infrastructure::mocks` (controllable clock,
//!   capturing tracing layer)

// Domain layer - pure business logic
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

pub use infrastructure::catalog;

// Re-export commonly used types for convenience
pub use domain::{
    locale::{Locale, LocaleError},
    reservation::{
        local_today, Field, FieldError, Reservation, ReservationRequest, ValidationErrors,
    },
    translations::{TranslationValue, Translations},
    window::{PolicyError, RateLimitInfo, RateLimitRecord, WindowDecision, WindowPolicy},
};

pub use application::{
    guard::{client_identifier, Endpoint, SubmissionError, SubmissionGuard},
    limiter::{CleanupStrategy, FixedWindowLimiter},
    metrics::{Metrics, MetricsSnapshot},
    ports::{Clock, LanguageSignal, PreferenceStore, PreferenceStoreError, Storage},
    preferences::{LocaleSource, PreferenceResolver},
    registry::WindowRegistry,
    sweeper::{ExpirySweeper, SweepConfig, SweepConfigError},
};

#[cfg(feature = "async")]
pub use application::sweeper::{ShutdownError, SweeperHandle};

pub use infrastructure::{
    catalog::ParityError,
    clock::SystemClock,
    language_signal::{AcceptLanguage, FixedTag, SystemLocale},
    preference_store::{FilePreferenceStore, MemoryPreferenceStore},
    storage::ShardedStorage,
    throttle::{BuildError, RecordStorage, RequestThrottle, RequestThrottleBuilder},
};
