//! Infrastructure layer - external adapters and integrations.
//!
//! This layer provides adapters for:
//! - Clock abstraction (system time vs mock)
//! - Storage implementations (sharded maps)
//! - Embedded translation tables
//! - Durable preference stores and language signals
//! - The assembled request throttle

pub mod catalog;
pub mod clock;
pub mod language_signal;
pub mod preference_store;
pub mod storage;
pub mod throttle;

/// Mock implementations for testing.
///
/// This module is only available when the `test-helpers` feature is enabled,
/// or during test builds. It provides a controllable clock and a capturing
/// tracing layer.
///
/// To use these mocks in integration tests, add to your `Cargo.toml`:
/// ```toml
/// [dev-dependencies]
/// eunpa-salon = { version = "*", features = ["test-helpers"] }
/// ```
#[cfg(any(test, feature = "test-helpers"))]
pub mod mocks;
