//! Veilroom Core
//!
//! Shared vocabulary of the sync engine: where the room and its key come from,
//! what a message looks like on the wire and once decrypted, and how a message
//! is identified across the three addressing schemes the engine reconciles.
//!
//! # Architecture
//!
//! Nothing in this crate performs I/O. Time and randomness come from an
//! [`env::Environment`]; the URL and persistent storage are reached through
//! the [`location::Location`] and [`location::Storage`] traits. Production and
//! simulation plug in their own implementations.
//!
//! # Components
//!
//! - [`keys`]: obtain or create the room key from the URL fragment
//! - [`room`]: room id format and resolution from path or storage
//! - [`identity`]: server, fingerprint and plaintext identity keys
//! - [`message`]: decrypted message and its lifecycle state
//! - [`wire`]: JSON rows, send bodies and push events
//! - [`sanitize`]: display-safe author names and notification bodies

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod env;
pub mod error;
pub mod identity;
pub mod keys;
pub mod location;
pub mod message;
pub mod room;
pub mod sanitize;
pub mod wire;

pub use error::{StorageError, SyncError};
pub use identity::{IdentityKey, IdentityKeys};
pub use message::{DecryptedMessage, MessageState};
pub use room::RoomId;
