//! Error types for the Veilroom sync engine.
//!
//! [`SyncError`] is the engine-wide taxonomy. Row-level errors (`Format`,
//! `Authentication`) drop a single row and never stop the sync loop;
//! `Transport` errors are retried on the next tick or reconnect; `Send`
//! errors fail exactly one pending message.

use thiserror::Error;
use veilroom_crypto::CipherError;

/// Errors raised while syncing a room.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Malformed row: bad hex, wrong IV size, short ciphertext, missing
    /// timestamp, or a row for another room
    #[error("malformed row: {reason}")]
    Format {
        /// What was wrong with the row
        reason: String,
    },

    /// Tag verification failed. Logged as a wrong-key or tampering signal.
    #[error("authentication failed: wrong key or tampered row")]
    Authentication,

    /// Fetch, push or connect failure
    #[error("transport error: {reason}")]
    Transport {
        /// Underlying failure
        reason: String,
    },

    /// The server rejected or never acknowledged a send
    #[error("send failed: {reason}")]
    Send {
        /// Underlying failure
        reason: String,
    },

    /// No usable room key is available
    #[error("no room key available")]
    MissingKey,
}

impl SyncError {
    /// Construct a `Format` error.
    pub fn format(reason: impl Into<String>) -> Self {
        Self::Format { reason: reason.into() }
    }
}

impl From<CipherError> for SyncError {
    fn from(err: CipherError) -> Self {
        match err {
            CipherError::Format { reason } => Self::Format { reason },
            CipherError::Authentication => Self::Authentication,
        }
    }
}

/// Errors from persistent client storage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("storage error: {reason}")]
pub struct StorageError {
    /// Underlying failure
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cipher_errors_keep_their_kind() {
        let auth: SyncError = CipherError::Authentication.into();
        assert_eq!(auth, SyncError::Authentication);

        let format: SyncError = CipherError::Format { reason: "odd hex length 3".into() }.into();
        assert!(matches!(&format, SyncError::Format { reason } if reason.contains("odd")));
    }

    #[test]
    fn format_helper_carries_reason() {
        assert_eq!(SyncError::format("bad iv"), SyncError::Format { reason: "bad iv".into() });
    }
}
