//! Notification dispatch seam.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use capsule_letter::{Letter, LetterId, Recipient};

use crate::NotifyError;

/// Everything a dispatcher needs to tell a recipient their letter is ready.
///
/// Account recipients carry an account id rather than an address; resolving
/// that to a mailbox is the dispatcher's concern (profile lookup, push
/// token, whatever the deployment uses).
#[derive(Debug, Clone)]
pub struct DeliveryNotice {
    pub letter_id: LetterId,
    pub recipient: Recipient,
    /// Sender display name; `None` for anonymous letters.
    pub sender_name: Option<String>,
    pub unlock_at: DateTime<Utc>,
    /// Notification locale (BCP 47 tag).
    pub language: String,
}

impl DeliveryNotice {
    /// Build a notice from a letter's persisted fields.
    pub fn from_letter(letter: &Letter) -> Self {
        Self {
            letter_id: letter.id,
            recipient: letter.recipient.clone(),
            sender_name: letter.sender_name.clone(),
            unlock_at: letter.unlock_at,
            language: letter.language.clone(),
        }
    }
}

/// Notification collaborator.
///
/// Fire-and-collect: a failed dispatch is reported back to the sweep,
/// never propagated across the batch.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: &DeliveryNotice) -> Result<(), NotifyError>;
}

/// Notifier that only logs. Used by the bundled server and as a stand-in
/// wherever real dispatch is wired up elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notice: &DeliveryNotice) -> Result<(), NotifyError> {
        info!(
            letter_id = %notice.letter_id,
            recipient = ?notice.recipient,
            language = %notice.language,
            unlock_at = %notice.unlock_at,
            "letter ready for delivery"
        );
        Ok(())
    }
}
