//! Driver events

use veilroom_core::{IdentityKey, wire::WireMessage};

/// Input delivered by a [`Driver`](crate::Driver).
#[derive(Debug, Clone, PartialEq)]
pub enum DriverEvent {
    /// The transport delivered rows (poll page, history or pushed message)
    Rows(Vec<WireMessage>),

    /// The user submitted the compose input
    Compose {
        /// Raw input text
        content: String,
    },

    /// A send call succeeded
    SendSucceeded {
        /// Plaintext key of the sent message
        plaintext_key: IdentityKey,
        /// Stored row from the response body, if any
        echo: Option<WireMessage>,
    },

    /// A send call failed
    SendFailed {
        /// Plaintext key of the sent message
        plaintext_key: IdentityKey,
        /// What went wrong
        reason: String,
    },

    /// The transport (re)connected
    Connected,

    /// The transport is failing and retrying
    Unavailable {
        /// What went wrong
        reason: String,
    },

    /// The server cleared the room
    RoomNuked {
        /// Number of rows removed
        deleted_count: u64,
    },

    /// The user asked to quit
    Quit,
}
