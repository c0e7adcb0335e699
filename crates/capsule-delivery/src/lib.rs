//! Sweep engine and open service for Capsule letters.
//!
//! This crate orchestrates the two execution contexts around the pure
//! state machine in `capsule-letter`:
//! - The periodic sweep (cron-triggered) that finds due letters, fires
//!   notifications, and flips `sealed -> delivered`
//! - The request-triggered open path, persisted through a conditional
//!   update so concurrent duplicate opens stay idempotent
//!
//! Persistence and notification dispatch live behind traits; an in-memory
//! store is provided for tests and the bundled server.

mod error;
mod memory;
mod notify;
mod open;
mod store;
mod sweep;

pub use error::{DeliveryError, NotifyError, StoreError};
pub use memory::MemoryStore;
pub use notify::{DeliveryNotice, LogNotifier, Notifier};
pub use open::OpenService;
pub use store::LetterStore;
pub use sweep::{SCHEDULED_PAGE_LIMIT, SweepFailure, SweepReport, Sweeper};
