//! Client error types

use thiserror::Error;

/// Errors returned by [`SyncSession`](crate::SyncSession) operations.
///
/// None of these stop the sync loop; they reject a single user action.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The session is closed, so there is no key to encrypt with
    #[error("no room key: session is closed")]
    MissingKey,

    /// Same author and body as the immediately preceding send
    #[error("duplicate send suppressed")]
    DuplicateSend,

    /// Nothing to send after trimming
    #[error("empty message")]
    EmptyMessage,
}
