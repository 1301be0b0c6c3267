//! Application layer - orchestration of domain logic.
//!
//! This layer coordinates the domain types and manages runtime state:
//! - Window registry (per-identifier request records)
//! - Fixed-window limiter (admission decisions)
//! - Expiry sweeper (periodic purging)
//! - Preference resolver (active locale per session)
//! - Submission guard (limits and validation for the form endpoints)
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details.

pub mod guard;
pub mod limiter;
pub mod metrics;
pub mod ports;
pub mod preferences;
pub mod registry;
pub mod sweeper;
