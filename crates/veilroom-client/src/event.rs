//! Client events and actions.

use veilroom_core::{DecryptedMessage, IdentityKey, wire::WireMessage};

use crate::{LocalId, Notification, OutgoingMessage, Presence, ScrollAnchor, ScrollIntent, Viewport};

/// A stored message together with its handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEntry {
    /// Stable local handle
    pub id: LocalId,
    /// Message as currently stored
    pub message: DecryptedMessage,
}

/// Events fed into the session.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// A fetched page or pushed event arrived
    BatchReceived {
        /// Rows in received order
        rows: Vec<WireMessage>,
        /// Viewport before the rows are applied
        viewport: Viewport,
        /// Focus and notification permission
        presence: Presence,
    },

    /// The user submitted a message
    Send {
        /// Author name as entered
        user: String,
        /// Body as entered
        content: String,
    },

    /// The server accepted a send
    SendAccepted {
        /// Plaintext key the message was sent under
        plaintext_key: IdentityKey,
        /// Stored row returned by the server, if the response carried one
        echo: Option<WireMessage>,
        /// Viewport before the echo is applied
        viewport: Viewport,
        /// Focus and notification permission
        presence: Presence,
    },

    /// The send call failed
    SendFailed {
        /// Plaintext key the message was sent under
        plaintext_key: IdentityKey,
        /// What went wrong
        reason: String,
    },
}

/// Actions for the caller to execute, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientAction {
    /// Append a new message to the view
    Insert(MessageEntry),

    /// Re-render an existing message in place
    Refresh(MessageEntry),

    /// Send an encrypted message to the server
    Transmit(OutgoingMessage),

    /// Clear the compose input
    ClearInput,

    /// Raise a notification
    Notify(Notification),

    /// Apply a scroll instruction immediately
    Scroll(ScrollIntent),

    /// Once the view re-rendered, resolve this anchor against the new content
    /// height and apply the resulting intent
    Anchor(ScrollAnchor),
}
