//! In-memory letter store.
//!
//! Thread-safe store used by the bundled server and by tests. The two
//! conditional updates go through `DashMap`'s per-entry locking, which
//! gives the same single-winner behavior a row-level conditional `UPDATE`
//! gives against a real database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use capsule_letter::{Letter, LetterId, LetterStatus};

use crate::{LetterStore, StoreError};

/// DashMap-backed implementation of [`LetterStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    letters: DashMap<LetterId, Letter>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a letter.
    pub fn insert(&self, letter: Letter) {
        self.letters.insert(letter.id, letter);
    }

    pub fn len(&self) -> usize {
        self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }
}

#[async_trait]
impl LetterStore for MemoryStore {
    async fn find_due_scheduled(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Letter>, StoreError> {
        let mut due: Vec<Letter> = self
            .letters
            .iter()
            .filter(|entry| entry.value().scheduled_due(now))
            .map(|entry| entry.value().clone())
            .collect();
        due.sort_by_key(|letter| letter.unlock_at);
        due.truncate(limit);
        Ok(due)
    }

    async fn find_recurring(&self) -> Result<Vec<Letter>, StoreError> {
        Ok(self
            .letters
            .iter()
            .filter(|entry| entry.value().plan.is_recurring())
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn get(&self, id: LetterId) -> Result<Option<Letter>, StoreError> {
        Ok(self.letters.get(&id).map(|entry| entry.value().clone()))
    }

    async fn transition_status(
        &self,
        id: LetterId,
        from: LetterStatus,
        to: LetterStatus,
    ) -> Result<bool, StoreError> {
        let Some(mut entry) = self.letters.get_mut(&id) else {
            return Ok(false);
        };
        if entry.status != from {
            return Ok(false);
        }
        entry.status = to;
        Ok(true)
    }

    async fn record_opened(
        &self,
        id: LetterId,
        opened_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let Some(mut entry) = self.letters.get_mut(&id) else {
            return Ok(false);
        };
        if entry.status == LetterStatus::Opened {
            return Ok(false);
        }
        entry.status = LetterStatus::Opened;
        entry.opened_at = Some(opened_at);
        Ok(true)
    }
}
