//! Error types for letter state transitions.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur when transitioning a letter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LetterError {
    /// Open attempted before the unlock time. Recoverable; not retried
    /// automatically. Opening an already-opened letter is NOT an error.
    #[error("letter is locked until {unlock_at}")]
    Locked { unlock_at: DateTime<Utc> },
}
