//! Letter model and delivery state machine for Capsule.
//!
//! This crate owns the lifecycle of a single time-locked letter:
//! - Lock evaluation (is the content still hidden?)
//! - The open transition (idempotent, forward-only)
//! - Recurring due-date computation (yearly/monthly anchors)
//!
//! Everything here is pure: no I/O, no clock access. Callers pass `now`.

mod error;
mod types;

pub use error::LetterError;
pub use types::{Cadence, DeliveryPlan, Letter, LetterId, LetterStatus, OpenOutcome, Recipient};
