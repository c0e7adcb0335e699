//! Error types for the delivery engine.

use capsule_letter::{LetterError, LetterId};
use thiserror::Error;

/// Errors from the persistence collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached or the query failed.
    /// Treated as catastrophic: a sweep invocation fails rather than
    /// guessing at partial state.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the notification collaborator.
///
/// Always per-item: a failed dispatch is collected into the sweep report
/// and never aborts sibling letters in the batch.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Dispatch failed (mail provider rejected, timed out, etc).
    #[error("notification dispatch failed: {0}")]
    Dispatch(String),
}

/// Errors that can occur in delivery operations.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Letter not found.
    #[error("letter not found: {0}")]
    NotFound(LetterId),

    /// State machine rejection (letter still locked).
    #[error(transparent)]
    Letter(#[from] LetterError),
}
