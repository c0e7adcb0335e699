//! Letter types and the delivery state machine.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::LetterError;

/// Opaque letter identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LetterId(Uuid);

impl LetterId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LetterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LetterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who receives the letter: a registered account or a bare email address.
/// Never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Recipient {
    /// A registered account, by id.
    Account { id: String },
    /// A bare email address (recipient may not have an account).
    Email { address: String },
}

/// Cadence for recurring letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    /// Fires on the anchor's month-and-day every year after the anchor year.
    Yearly,
    /// Fires on the anchor's day-of-month every month after the anchor month.
    Monthly,
}

/// How a letter's unlock time is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeliveryPlan {
    /// Unlock a fixed number of hours after creation.
    Duration { hours: u32 },
    /// Unlock at an explicit wall-clock time.
    ScheduledAt { at: DateTime<Utc> },
    /// Re-fires indefinitely on month/day matches against the anchor.
    /// The anchor is immutable; due-ness is computed, never written back.
    Recurring {
        anchor: DateTime<Utc>,
        cadence: Cadence,
    },
}

impl DeliveryPlan {
    /// The unlock time implied by this plan for a letter created at
    /// `created_at`.
    pub fn unlock_at(&self, created_at: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            DeliveryPlan::Duration { hours } => created_at + Duration::hours(i64::from(*hours)),
            DeliveryPlan::ScheduledAt { at } => *at,
            DeliveryPlan::Recurring { anchor, .. } => *anchor,
        }
    }

    /// Whether this plan re-fires after its first unlock.
    pub fn is_recurring(&self) -> bool {
        matches!(self, DeliveryPlan::Recurring { .. })
    }
}

/// Delivery state of a letter.
///
/// Forward-only: `sealed -> delivered -> opened`, with `sealed -> opened`
/// allowed when the open action races ahead of the sweep. `opened` is
/// terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LetterStatus {
    /// Content hidden, countdown active.
    #[default]
    Sealed,
    /// Unlock time reached and notification sent; content not yet viewed.
    Delivered,
    /// Recipient has revealed the content. Terminal.
    Opened,
}

/// Result of an open transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// First successful open; `opened_at` was stamped.
    Opened,
    /// Letter was already open; nothing changed. A success, not an error.
    AlreadyOpened,
}

/// A time-locked letter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Letter {
    /// Opaque unique identifier.
    pub id: LetterId,
    /// Sender account id, if not anonymous.
    pub sender_id: Option<String>,
    /// Display name used in notifications, if the sender chose to show one.
    pub sender_name: Option<String>,
    /// Who receives the letter.
    pub recipient: Recipient,
    /// Notification locale (BCP 47 tag).
    pub language: String,
    /// Current delivery state.
    pub status: LetterStatus,
    /// How the unlock time was determined.
    pub plan: DeliveryPlan,
    /// When the letter was composed. Immutable.
    pub created_at: DateTime<Utc>,
    /// When the content may be revealed. Derived from `plan` at creation
    /// and never mutated; for recurring letters this is the anchor date.
    pub unlock_at: DateTime<Utc>,
    /// Set exactly once, on the first successful open.
    pub opened_at: Option<DateTime<Utc>>,
}

impl Letter {
    /// Create a new sealed letter. The unlock time is fixed here and never
    /// changes afterward.
    pub fn new(recipient: Recipient, plan: DeliveryPlan, created_at: DateTime<Utc>) -> Self {
        Self {
            id: LetterId::new(),
            sender_id: None,
            sender_name: None,
            recipient,
            language: "en".to_string(),
            status: LetterStatus::Sealed,
            plan,
            created_at,
            unlock_at: plan.unlock_at(created_at),
            opened_at: None,
        }
    }

    /// Attach a sender identity (letters are anonymous by default).
    pub fn with_sender(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.sender_id = Some(id.into());
        self.sender_name = Some(name.into());
        self
    }

    /// Set the notification locale.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Whether the content is still hidden at `now`.
    ///
    /// Pure and total: `now < unlock_at`. An unlock time in the past at
    /// creation simply means the letter was never locked.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        now < self.unlock_at
    }

    /// Reveal the letter's content.
    ///
    /// Idempotent: opening an already-open letter is a no-op success and
    /// leaves `opened_at` untouched. Opening while locked fails without
    /// mutating anything. This is the only mutation a read-side (user)
    /// action may trigger.
    pub fn mark_opened(&mut self, now: DateTime<Utc>) -> Result<OpenOutcome, LetterError> {
        if self.status == LetterStatus::Opened {
            return Ok(OpenOutcome::AlreadyOpened);
        }
        if self.is_locked(now) {
            return Err(LetterError::Locked {
                unlock_at: self.unlock_at,
            });
        }
        self.status = LetterStatus::Opened;
        self.opened_at = Some(now);
        Ok(OpenOutcome::Opened)
    }

    /// Whether a plain (non-recurring) letter is due for delivery at `now`.
    ///
    /// Once the status moves off `Sealed`, the letter is excluded from
    /// future scheduled sweeps; that exclusion is the dedupe guarantee.
    pub fn scheduled_due(&self, now: DateTime<Utc>) -> bool {
        self.status == LetterStatus::Sealed && !self.plan.is_recurring() && self.unlock_at <= now
    }

    /// Whether a recurring letter should re-notify at `now`.
    ///
    /// Yearly: today's month-and-day match the anchor's, outside the anchor
    /// year. Monthly: day-of-month matches, outside the anchor year/month.
    /// The guard keeps the letter from double-firing on its original unlock
    /// date, which the scheduled path already handles.
    ///
    /// A Feb 29 yearly anchor never matches in a non-leap year, so the
    /// letter skips those years entirely.
    pub fn recurrence_due(&self, now: DateTime<Utc>) -> bool {
        let DeliveryPlan::Recurring { anchor, cadence } = self.plan else {
            return false;
        };
        match cadence {
            Cadence::Yearly => {
                now.month() == anchor.month()
                    && now.day() == anchor.day()
                    && now.year() != anchor.year()
            }
            Cadence::Monthly => {
                now.day() == anchor.day()
                    && (now.year(), now.month()) != (anchor.year(), anchor.month())
            }
        }
    }
}
