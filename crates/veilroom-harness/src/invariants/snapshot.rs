//! Observable session state for invariant checks.

use veilroom_app::Timeline;
use veilroom_client::{LocalId, SyncSession};
use veilroom_core::{DecryptedMessage, MessageState, env::Environment};

/// What the view showed for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSnapshot {
    /// Session handle
    pub id: LocalId,
    /// Server id shown
    pub server_id: Option<u64>,
    /// State shown
    pub state: MessageState,
}

/// Snapshot of a session and, optionally, its timeline.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    /// Cursor value
    pub cursor: u64,
    /// Stored messages in insertion order
    pub messages: Vec<(LocalId, DecryptedMessage)>,
    /// Timeline entries in display order, if a timeline was captured
    pub rendered: Option<Vec<RenderedSnapshot>>,
}

impl SessionSnapshot {
    /// Capture the observable state.
    pub fn capture<E: Environment>(session: &SyncSession<E>, timeline: Option<&Timeline>) -> Self {
        Self {
            cursor: session.cursor().last_seen_id(),
            messages: session.index().iter().map(|(id, m)| (id, m.clone())).collect(),
            rendered: timeline.map(|t| {
                t.entries()
                    .iter()
                    .map(|e| RenderedSnapshot { id: e.id, server_id: e.server_id, state: e.state })
                    .collect()
            }),
        }
    }
}
