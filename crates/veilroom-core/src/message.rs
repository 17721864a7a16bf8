//! Decrypted messages and their lifecycle.

/// Lifecycle state of a locally stored message.
///
/// ```text
///            server row
///   ───────────────────────────► Confirmed
///
///   send()          echo matched
///   ─────► Pending ─────────────► Confirmed
///             │                       ▲
///             │ send rejected         │ late echo
///             ▼                       │
///           Failed ───────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageState {
    /// Created locally; the server has not echoed it yet
    Pending,
    /// Stored by the server
    Confirmed,
    /// The send call was rejected; never retried automatically
    Failed,
}

/// A message with both fields decrypted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedMessage {
    /// Server-assigned id, once known
    pub server_id: Option<u64>,
    /// Author name
    pub user: String,
    /// Message body
    pub content: String,
    /// ISO-8601 timestamp (client clock while pending, server clock after)
    pub timestamp: String,
    /// Lifecycle state
    pub state: MessageState,
}

impl DecryptedMessage {
    /// Whether the server has stored this message.
    pub fn is_confirmed(&self) -> bool {
        self.state == MessageState::Confirmed
    }
}
