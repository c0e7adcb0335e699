//! Periodic sweep over due letters.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use capsule_letter::{LetterId, LetterStatus};

use crate::{DeliveryError, DeliveryNotice, LetterStore, Notifier, NotifyError};

/// Default page cap for a single scheduled sweep pass. Bounds the work per
/// tick; leftovers are picked up by the next invocation.
pub const SCHEDULED_PAGE_LIMIT: usize = 50;

/// A letter whose notification dispatch failed during a sweep.
///
/// Scheduled letters stay `sealed` on failure and are retried naturally on
/// the next tick; a recurring letter's missed cycle is simply missed.
#[derive(Debug)]
pub struct SweepFailure {
    pub letter_id: LetterId,
    pub error: NotifyError,
}

/// Outcome of one sweep invocation.
///
/// Per-item failures are collected here rather than propagated; the
/// invocation as a whole still counts as a success.
#[derive(Debug, Default)]
pub struct SweepReport {
    /// Letters whose notification was dispatched this pass.
    pub notified: usize,
    /// Letters another pass got to first (conditional update lost, or no
    /// longer due on re-check).
    pub skipped: usize,
    /// Per-letter dispatch failures.
    pub failures: Vec<SweepFailure>,
}

impl SweepReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// The sweep engine.
///
/// Safe to re-run and to overlap: scheduled letters are excluded from
/// future passes by their status, recurring letters by the anchor-cycle
/// guard. No locks involved.
pub struct Sweeper {
    store: Arc<dyn LetterStore>,
    notifier: Arc<dyn Notifier>,
    page_limit: usize,
}

impl Sweeper {
    pub fn new(store: Arc<dyn LetterStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            page_limit: SCHEDULED_PAGE_LIMIT,
        }
    }

    /// Override the scheduled page cap.
    pub fn with_page_limit(mut self, limit: usize) -> Self {
        self.page_limit = limit;
        self
    }

    /// Process one page of due scheduled letters.
    ///
    /// Per letter: dispatch the notification, then conditionally move
    /// `sealed -> delivered`. A dispatch failure leaves the letter sealed
    /// and is collected; a lost conditional update means another pass
    /// already handled the letter and counts as skipped. Only the store
    /// itself failing aborts the invocation.
    #[tracing::instrument(skip(self))]
    pub async fn process_scheduled(&self, now: DateTime<Utc>) -> Result<SweepReport, DeliveryError> {
        let due = self.store.find_due_scheduled(now, self.page_limit).await?;
        debug!(count = due.len(), "loaded due scheduled letters");

        let mut report = SweepReport::default();
        for letter in due {
            // The store query may race a concurrent pass; re-check.
            if !letter.scheduled_due(now) {
                report.skipped += 1;
                continue;
            }

            match self.notifier.notify(&DeliveryNotice::from_letter(&letter)).await {
                Ok(()) => {
                    let applied = self
                        .store
                        .transition_status(letter.id, LetterStatus::Sealed, LetterStatus::Delivered)
                        .await?;
                    if applied {
                        info!(letter_id = %letter.id, unlock_at = %letter.unlock_at, "letter delivered");
                        report.notified += 1;
                    } else {
                        debug!(letter_id = %letter.id, "lost delivery race, skipping");
                        report.skipped += 1;
                    }
                }
                Err(error) => {
                    warn!(letter_id = %letter.id, %error, "notification dispatch failed, will retry next sweep");
                    report.failures.push(SweepFailure {
                        letter_id: letter.id,
                        error,
                    });
                }
            }
        }

        info!(
            notified = report.notified,
            skipped = report.skipped,
            failed = report.failed(),
            "scheduled sweep complete"
        );
        Ok(report)
    }

    /// Re-notify recurring letters whose cycle is due today.
    ///
    /// Scans the full recurring set (expected small), dispatches
    /// notifications only. Status and anchor are never mutated; the letter
    /// fires again on the next matching date, indefinitely.
    #[tracing::instrument(skip(self))]
    pub async fn process_recurring(&self, now: DateTime<Utc>) -> Result<SweepReport, DeliveryError> {
        let recurring = self.store.find_recurring().await?;
        debug!(count = recurring.len(), "loaded recurring letters");

        let mut report = SweepReport::default();
        for letter in recurring {
            if !letter.recurrence_due(now) {
                continue;
            }

            match self.notifier.notify(&DeliveryNotice::from_letter(&letter)).await {
                Ok(()) => {
                    info!(letter_id = %letter.id, anchor = %letter.unlock_at, "recurring letter re-notified");
                    report.notified += 1;
                }
                Err(error) => {
                    warn!(letter_id = %letter.id, %error, "recurring dispatch failed, cycle missed");
                    report.failures.push(SweepFailure {
                        letter_id: letter.id,
                        error,
                    });
                }
            }
        }

        info!(
            notified = report.notified,
            failed = report.failed(),
            "recurring sweep complete"
        );
        Ok(report)
    }
}
