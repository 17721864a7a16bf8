//! Identity resolution.
//!
//! The same logical message reaches the client under up to three names:
//!
//! | key | form | known when |
//! |-----|------|------------|
//! | server | `s:<id>` | the server has stored the row |
//! | fingerprint | `fp:<user>::<content>` (normalized) | always |
//! | plaintext | `id:<user>_<content>_<timestamp>` | always |
//!
//! The fingerprint ignores timestamps and whitespace differences, which is
//! what lets a locally sent message (client clock) be matched with its server
//! echo (server clock). All functions here are pure and total.

use std::fmt;

use crate::DecryptedMessage;

/// One of the three identity keys of a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Server identity: `s:<id>`.
    pub fn server(id: u64) -> Self {
        Self(format!("s:{id}"))
    }

    /// Fingerprint identity: `fp:<normalize(user)>::<normalize(content)>`.
    pub fn fingerprint(user: &str, content: &str) -> Self {
        Self(format!("fp:{}::{}", normalize(user), normalize(content)))
    }

    /// Plaintext identity: `id:<user>_<content>_<timestamp>`.
    pub fn plaintext(user: &str, content: &str, timestamp: &str) -> Self {
        Self(format!("id:{user}_{content}_{timestamp}"))
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// All identity keys computable for a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityKeys {
    /// Present only once the server has assigned an id
    pub server: Option<IdentityKey>,
    /// Timestamp-independent content fingerprint
    pub fingerprint: IdentityKey,
    /// Exact composite of author, body and timestamp
    pub plaintext: IdentityKey,
}

impl IdentityKeys {
    /// Compute the keys of a message.
    pub fn of(message: &DecryptedMessage) -> Self {
        Self {
            server: message.server_id.map(IdentityKey::server),
            fingerprint: IdentityKey::fingerprint(&message.user, &message.content),
            plaintext: IdentityKey::plaintext(
                &message.user,
                &message.content,
                &message.timestamp,
            ),
        }
    }
}

/// Trim and collapse every run of internal whitespace to one space.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
