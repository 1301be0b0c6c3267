//! Domain layer - pure types and rules with no I/O.
//!
//! - Supported locales and tag parsing
//! - Typed translation tables and key lookup
//! - Fixed-window request records and policies
//! - Reservation form validation

pub mod locale;
pub mod reservation;
pub mod translations;
pub mod window;
