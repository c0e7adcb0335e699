//! Request-triggered open path.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use capsule_letter::{Letter, LetterId, OpenOutcome};

use crate::{DeliveryError, LetterStore};

/// Applies the open transition against the store.
///
/// Authorization stays with the caller; this service only enforces the
/// state machine. Concurrent duplicate opens both succeed: the conditional
/// update picks one winner and the loser observes the idempotent
/// already-opened path.
pub struct OpenService {
    store: Arc<dyn LetterStore>,
}

impl OpenService {
    pub fn new(store: Arc<dyn LetterStore>) -> Self {
        Self { store }
    }

    /// Open a letter at `now`.
    ///
    /// Returns the letter as persisted plus whether this call did the
    /// opening. Locked letters fail with `LetterError::Locked`; unknown
    /// ids with `NotFound`.
    #[tracing::instrument(skip(self))]
    pub async fn open(
        &self,
        id: LetterId,
        now: DateTime<Utc>,
    ) -> Result<(Letter, OpenOutcome), DeliveryError> {
        let Some(mut letter) = self.store.get(id).await? else {
            return Err(DeliveryError::NotFound(id));
        };

        let outcome = letter.mark_opened(now)?;
        if outcome == OpenOutcome::Opened {
            let applied = self.store.record_opened(id, now).await?;
            if !applied {
                // A concurrent open won; re-read for the authoritative stamp.
                debug!(letter_id = %id, "open lost race, reloading");
                let current = self
                    .store
                    .get(id)
                    .await?
                    .ok_or(DeliveryError::NotFound(id))?;
                return Ok((current, OpenOutcome::AlreadyOpened));
            }
            info!(letter_id = %id, opened_at = %now, "letter opened");
        }

        Ok((letter, outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use capsule_letter::{DeliveryPlan, LetterError, LetterStatus, Recipient};
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    use crate::MemoryStore;

    fn utc(y: i32, mo: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, 12, 0, 0).unwrap()
    }

    fn store_with_letter(at: DateTime<Utc>) -> (Arc<MemoryStore>, LetterId) {
        let store = Arc::new(MemoryStore::new());
        let letter = Letter::new(
            Recipient::Email {
                address: "someone@example.com".to_string(),
            },
            DeliveryPlan::ScheduledAt { at },
            at - Duration::days(7),
        );
        let id = letter.id;
        store.insert(letter);
        (store, id)
    }

    #[tokio::test]
    async fn open_unlocked_letter_persists_stamp() {
        let at = utc(2024, 6, 1);
        let (store, id) = store_with_letter(at);
        let service = OpenService::new(store.clone());

        let now = at + Duration::hours(1);
        let (letter, outcome) = service.open(id, now).await.unwrap();
        assert_eq!(outcome, OpenOutcome::Opened);
        assert_eq!(letter.opened_at, Some(now));

        let stored = store.get(id).await.unwrap().unwrap();
        assert_eq!(stored.status, LetterStatus::Opened);
        assert_eq!(stored.opened_at, Some(now));
    }

    #[tokio::test]
    async fn open_locked_letter_fails_without_mutation() {
        let at = utc(2024, 6, 1);
        let (store, id) = store_with_letter(at);
        let service = OpenService::new(store.clone());

        let result = service.open(id, at - Duration::hours(1)).await;
        assert!(matches!(
            result,
            Err(DeliveryError::Letter(LetterError::Locked { .. }))
        ));
        let stored = store.get(id).await.unwrap().unwrap();
        assert_eq!(stored.status, LetterStatus::Sealed);
        assert_eq!(stored.opened_at, None);
    }

    #[tokio::test]
    async fn repeat_open_keeps_first_stamp() {
        let at = utc(2024, 6, 1);
        let (store, id) = store_with_letter(at);
        let service = OpenService::new(store);

        let first = at + Duration::hours(1);
        let second = at + Duration::hours(9);
        service.open(id, first).await.unwrap();
        let (letter, outcome) = service.open(id, second).await.unwrap();

        assert_eq!(outcome, OpenOutcome::AlreadyOpened);
        assert_eq!(letter.opened_at, Some(first));
    }

    #[tokio::test]
    async fn concurrent_opens_pick_one_winner() {
        let at = utc(2024, 6, 1);
        let (store, id) = store_with_letter(at);
        let service = Arc::new(OpenService::new(store.clone()));

        let a = {
            let service = service.clone();
            tokio::spawn(async move { service.open(id, at + Duration::minutes(1)).await })
        };
        let b = {
            let service = service.clone();
            tokio::spawn(async move { service.open(id, at + Duration::minutes(2)).await })
        };

        let (_, outcome_a) = a.await.unwrap().unwrap();
        let (_, outcome_b) = b.await.unwrap().unwrap();

        // Exactly one caller did the opening; both succeeded.
        let outcomes = [outcome_a, outcome_b];
        assert_eq!(
            outcomes
                .iter()
                .filter(|o| **o == OpenOutcome::Opened)
                .count(),
            1
        );

        let stored = store.get(id).await.unwrap().unwrap();
        assert_eq!(stored.status, LetterStatus::Opened);
        assert!(stored.opened_at.is_some());
    }

    #[tokio::test]
    async fn unknown_letter_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let service = OpenService::new(store);
        let result = service.open(LetterId::new(), utc(2024, 6, 1)).await;
        assert!(matches!(result, Err(DeliveryError::NotFound(_))));
    }
}
