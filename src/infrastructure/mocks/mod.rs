//! Test doubles for infrastructure adapters.

pub mod clock;
pub mod layer;

pub use clock::MockClock;
pub use layer::{CapturedEvent, MockCaptureLayer};
