//! End-to-end tests over the delivery engine: compose, sweep, open.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;

use capsule_delivery::{LetterStore, LogNotifier, MemoryStore, OpenService, Sweeper};
use capsule_letter::{Cadence, DeliveryPlan, Letter, LetterStatus, OpenOutcome, Recipient};

fn utc(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
}

// Helper to compose a scheduled letter the way the compose flow would.
fn compose_scheduled(at: DateTime<Utc>, created_at: DateTime<Utc>) -> Letter {
    Letter::new(
        Recipient::Email {
            address: "future.me@example.com".to_string(),
        },
        DeliveryPlan::ScheduledAt { at },
        created_at,
    )
    .with_sender("acct-42", "Past Me")
    .with_language("de")
}

fn engine(store: Arc<MemoryStore>) -> (Sweeper, OpenService) {
    (
        Sweeper::new(store.clone(), Arc::new(LogNotifier)),
        OpenService::new(store),
    )
}

#[tokio::test]
async fn scheduled_letter_full_lifecycle() {
    let store = Arc::new(MemoryStore::new());
    let (sweeper, opener) = engine(store.clone());

    let created = utc(2024, 1, 1, 9);
    let unlock = utc(2024, 6, 1, 9);
    let letter = compose_scheduled(unlock, created);
    let id = letter.id;
    store.insert(letter);

    // Before unlock: sweep leaves it sealed, open is rejected.
    let early = sweeper.process_scheduled(utc(2024, 5, 31, 9)).await.unwrap();
    assert_eq!(early.notified, 0);
    assert!(opener.open(id, utc(2024, 5, 31, 9)).await.is_err());

    // Unlock passes: sweep notifies and flips to delivered.
    let due = sweeper.process_scheduled(utc(2024, 6, 1, 10)).await.unwrap();
    assert_eq!(due.notified, 1);
    let delivered = store.get(id).await.unwrap().unwrap();
    assert_eq!(delivered.status, LetterStatus::Delivered);
    assert_eq!(delivered.opened_at, None);

    // Delivered letters drop out of later sweeps.
    let rerun = sweeper.process_scheduled(utc(2024, 6, 1, 11)).await.unwrap();
    assert_eq!(rerun.notified, 0);

    // Recipient opens; opened is terminal.
    let opened_at = utc(2024, 6, 2, 20);
    let (opened, outcome) = opener.open(id, opened_at).await.unwrap();
    assert_eq!(outcome, OpenOutcome::Opened);
    assert_eq!(opened.status, LetterStatus::Opened);
    assert_eq!(opened.opened_at, Some(opened_at));

    let (again, outcome) = opener.open(id, opened_at + Duration::days(1)).await.unwrap();
    assert_eq!(outcome, OpenOutcome::AlreadyOpened);
    assert_eq!(again.opened_at, Some(opened_at));
}

#[tokio::test]
async fn open_racing_ahead_of_sweep_skips_delivered() {
    let store = Arc::new(MemoryStore::new());
    let (sweeper, opener) = engine(store.clone());

    let unlock = utc(2024, 6, 1, 9);
    let letter = compose_scheduled(unlock, utc(2024, 1, 1, 9));
    let id = letter.id;
    store.insert(letter);

    // The user opens before any sweep ran: sealed -> opened directly.
    let (_, outcome) = opener.open(id, utc(2024, 6, 1, 9)).await.unwrap();
    assert_eq!(outcome, OpenOutcome::Opened);

    // The sweep finds nothing left to deliver and never regresses status.
    let report = sweeper.process_scheduled(utc(2024, 6, 1, 10)).await.unwrap();
    assert_eq!(report.notified, 0);
    assert_eq!(
        store.get(id).await.unwrap().unwrap().status,
        LetterStatus::Opened
    );
}

#[tokio::test]
async fn yearly_letter_keeps_firing_across_years() {
    let store = Arc::new(MemoryStore::new());
    let (sweeper, _) = engine(store.clone());

    let anchor = utc(2024, 3, 15, 9);
    let letter = Letter::new(
        Recipient::Account {
            id: "acct-7".to_string(),
        },
        DeliveryPlan::Recurring {
            anchor,
            cadence: Cadence::Yearly,
        },
        anchor - Duration::days(1),
    );
    let id = letter.id;
    store.insert(letter);

    // Anchor year: recurring sweep stays quiet.
    assert_eq!(
        sweeper.process_recurring(utc(2024, 3, 15, 12)).await.unwrap().notified,
        0
    );

    // Three anniversaries, three notifications, anchor never moves.
    for year in 2025..=2027 {
        let report = sweeper.process_recurring(utc(year, 3, 15, 12)).await.unwrap();
        assert_eq!(report.notified, 1, "anniversary {} should fire", year);
    }
    let stored = store.get(id).await.unwrap().unwrap();
    assert_eq!(stored.unlock_at, anchor);
    assert_eq!(stored.status, LetterStatus::Sealed);
}

#[tokio::test]
async fn mixed_population_sweeps_stay_disjoint() {
    let store = Arc::new(MemoryStore::new());
    let (sweeper, _) = engine(store.clone());

    let now = utc(2025, 3, 15, 12);

    // A due scheduled letter and a due recurring letter.
    store.insert(compose_scheduled(utc(2025, 3, 15, 9), utc(2025, 1, 1, 9)));
    store.insert(Letter::new(
        Recipient::Email {
            address: "anniversary@example.com".to_string(),
        },
        DeliveryPlan::Recurring {
            anchor: utc(2024, 3, 15, 9),
            cadence: Cadence::Yearly,
        },
        utc(2024, 3, 14, 9),
    ));

    // Each sweep handles only its own population.
    let scheduled = sweeper.process_scheduled(now).await.unwrap();
    assert_eq!(scheduled.notified, 1);

    let recurring = sweeper.process_recurring(now).await.unwrap();
    assert_eq!(recurring.notified, 1);
}
