//! Persistence seam for letters.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use capsule_letter::{Letter, LetterId, LetterStatus};

use crate::StoreError;

/// Persistence collaborator for the delivery engine.
///
/// The persisted letter record is the single source of truth and the
/// synchronization point: the two conditional updates below are required
/// to be atomic per-row, and that atomicity is what keeps concurrent
/// opens and overlapping sweeps idempotent. No other transaction
/// semantics are assumed of the backing store.
#[async_trait]
pub trait LetterStore: Send + Sync {
    /// Sealed, non-recurring letters whose unlock time has passed,
    /// ordered by unlock time, capped at `limit`.
    async fn find_due_scheduled(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Letter>, StoreError>;

    /// All letters with a recurring delivery plan, regardless of status.
    async fn find_recurring(&self) -> Result<Vec<Letter>, StoreError>;

    /// Fetch a single letter.
    async fn get(&self, id: LetterId) -> Result<Option<Letter>, StoreError>;

    /// Conditionally move a letter's status from `from` to `to`.
    ///
    /// Returns `false` (without writing) when the letter is missing or its
    /// current status no longer matches `from`. A `false` here means some
    /// other pass already processed the letter.
    async fn transition_status(
        &self,
        id: LetterId,
        from: LetterStatus,
        to: LetterStatus,
    ) -> Result<bool, StoreError>;

    /// Conditionally stamp a letter as opened.
    ///
    /// Sets `status = opened` and `opened_at` together, only if the letter
    /// is not already opened. Returns `false` when a concurrent open won
    /// the race (the existing `opened_at` stays untouched) or the letter
    /// is missing.
    async fn record_opened(
        &self,
        id: LetterId,
        opened_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}
