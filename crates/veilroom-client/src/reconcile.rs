//! Batch reconciliation.
//!
//! Merges one batch of server rows into the [`MessageIndex`]. Rows are handled
//! in received order:
//!
//! 1. The cursor advances to the row id, whatever happens to the row next
//! 2. The row is shape-checked and both fields decrypted; failures drop it
//! 3. Rows without a timestamp are dropped
//! 4. The row is looked up by server key, fingerprint, then plaintext key
//! 5. A match is confirmed in place (`updated`), otherwise a new confirmed
//!    record is stored (`created`)
//!
//! Applying the same batch twice creates nothing the second time.

use veilroom_core::{
    DecryptedMessage, IdentityKeys, MessageState, RoomId, SyncError, wire::WireMessage,
};
use veilroom_crypto::{RoomKey, decrypt};

use crate::{MessageEntry, MessageIndex};

/// Highest server id observed so far.
///
/// Never decreases and only moves on ids actually seen in a batch, including
/// rows that were later dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    last_seen_id: u64,
}

impl Cursor {
    /// Cursor starting at `last_seen_id`.
    pub fn new(last_seen_id: u64) -> Self {
        Self { last_seen_id }
    }

    /// Highest id seen, or zero.
    pub fn last_seen_id(self) -> u64 {
        self.last_seen_id
    }

    /// Advance to `id` if it is higher.
    pub fn observe(&mut self, id: u64) {
        self.last_seen_id = self.last_seen_id.max(id);
    }
}

/// A row the reconciler skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedRow {
    /// Row id, if the row had one
    pub id: Option<u64>,
    /// Why it was dropped
    pub error: SyncError,
}

/// Outcome of merging one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Messages stored for the first time
    pub created: Vec<MessageEntry>,
    /// Existing messages confirmed or refreshed in place
    pub updated: Vec<MessageEntry>,
    /// Rows skipped with their row-level error
    pub dropped: Vec<DroppedRow>,
}

impl ReconcileReport {
    /// Whether any stored message changed.
    pub fn changed(&self) -> bool {
        !self.created.is_empty() || !self.updated.is_empty()
    }
}

/// Merge `rows` into `index`, advancing `cursor`.
pub fn reconcile(
    index: &mut MessageIndex,
    cursor: &mut Cursor,
    room: &RoomId,
    key: &RoomKey,
    rows: &[WireMessage],
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    for row in rows {
        if let Some(id) = row.id {
            cursor.observe(id);
        }

        let message = match open_row(row, room, key) {
            Ok(message) => message,
            Err(error) => {
                if matches!(error, SyncError::Authentication) {
                    tracing::warn!(id = ?row.id, "dropping row: authentication failed (wrong key or tampering)");
                } else {
                    tracing::debug!(id = ?row.id, %error, "dropping row");
                }
                report.dropped.push(DroppedRow { id: row.id, error });
                continue;
            },
        };

        let keys = IdentityKeys::of(&message);
        match index.find(&keys) {
            Some(id) => {
                index.confirm(id, message);
                if let Some(stored) = index.get(id) {
                    report.updated.push(MessageEntry { id, message: stored.clone() });
                }
            },
            None => {
                let id = index.insert(message.clone());
                report.created.push(MessageEntry { id, message });
            },
        }
    }

    report
}

fn open_row(
    row: &WireMessage,
    room: &RoomId,
    key: &RoomKey,
) -> Result<DecryptedMessage, SyncError> {
    let sealed = row.validate(room)?;
    let user = decrypt(&sealed.user, key)?;
    let content = decrypt(&sealed.content, key)?;
    let timestamp = sealed.timestamp.ok_or_else(|| SyncError::format("missing timestamp"))?;

    Ok(DecryptedMessage {
        server_id: Some(sealed.id),
        user,
        content,
        timestamp,
        state: MessageState::Confirmed,
    })
}
