//! Optimistic send support.

use veilroom_core::{IdentityKey, wire::NewMessage};

use crate::ClientError;

/// An encrypted message ready for the send call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Plaintext key of the pending record; report the outcome with it
    pub plaintext_key: IdentityKey,
    /// Request body
    pub body: NewMessage,
}

/// Rejects a send identical to the one immediately before it.
///
/// Guards against double submission (a repeated key press, a double click)
/// without blocking the same text sent again later.
#[derive(Debug, Clone, Default)]
pub struct SendGuard {
    last: Option<(String, String)>,
}

impl SendGuard {
    /// Accept and remember `(user, content)`, or reject a repeat.
    ///
    /// # Errors
    ///
    /// - `DuplicateSend` if it matches the previous accepted send
    pub fn admit(&mut self, user: &str, content: &str) -> Result<(), ClientError> {
        if self.matches(user, content) {
            return Err(ClientError::DuplicateSend);
        }
        self.last = Some((user.to_owned(), content.to_owned()));
        Ok(())
    }

    /// Forget `(user, content)` so it can be sent again by hand.
    pub fn release(&mut self, user: &str, content: &str) {
        if self.matches(user, content) {
            self.last = None;
        }
    }

    fn matches(&self, user: &str, content: &str) -> bool {
        self.last.as_ref().is_some_and(|(u, c)| u == user && c == content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immediate_repeat_is_rejected() {
        let mut guard = SendGuard::default();
        guard.admit("alice", "hi").unwrap();
        assert_eq!(guard.admit("alice", "hi"), Err(ClientError::DuplicateSend));
    }

    #[test]
    fn repeat_after_other_message_is_allowed() {
        let mut guard = SendGuard::default();
        guard.admit("alice", "hi").unwrap();
        guard.admit("alice", "there").unwrap();
        assert!(guard.admit("alice", "hi").is_ok());
    }

    #[test]
    fn separator_inside_fields_is_not_a_repeat() {
        let mut guard = SendGuard::default();
        guard.admit("a::b", "c").unwrap();
        assert!(guard.admit("a", "b::c").is_ok());
        guard.release("a::b", "c");
        assert_eq!(guard.admit("a", "b::c"), Err(ClientError::DuplicateSend));
    }

    #[test]
    fn release_allows_manual_retry() {
        let mut guard = SendGuard::default();
        guard.admit("alice", "hi").unwrap();
        guard.release("alice", "hi");
        assert!(guard.admit("alice", "hi").is_ok());
    }

    #[test]
    fn release_of_other_message_keeps_guard() {
        let mut guard = SendGuard::default();
        guard.admit("alice", "hi").unwrap();
        guard.release("alice", "bye");
        assert!(guard.admit("alice", "hi").is_err());
    }
}
