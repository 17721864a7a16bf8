//! Veilroom Client
//!
//! Action-based sync session for an end-to-end-encrypted room. Merges
//! repeatedly fetched or pushed message batches into one deduplicated,
//! order-preserving local view while locally sent messages move from
//! pending to confirmed.
//!
//! # Architecture
//!
//! The session follows the Sans-IO pattern. It receives events
//! ([`ClientEvent`]), processes them through pure state machine logic, and
//! returns actions ([`ClientAction`]) for the caller to execute. The caller is
//! the single writer: batches and sends are fed in one at a time, so the
//! message index never sees concurrent mutation.
//!
//! # Components
//!
//! - [`SyncSession`]: owns the room, key, index and cursor
//! - [`MessageIndex`]: one arena of messages addressed by three key maps
//! - [`reconcile`]: merge one batch, reporting created and updated messages
//! - [`NotificationDispatcher`]: at most one notification per message
//! - [`ScrollAnchor`]: keeps the viewport stable across a merge
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::spawn_poller`]: HTTP polling from the cursor
//! - [`transport::spawn_push`]: WebSocket push with fixed-delay reconnect
//! - [`transport::HttpApi`]: send and administrative requests

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod event;
mod index;
mod notify;
mod reconcile;
mod scroll;
mod send;
mod session;

#[cfg(feature = "transport")]
pub mod transport;

pub use error::ClientError;
pub use event::{ClientAction, ClientEvent, MessageEntry};
pub use index::{LocalId, MessageIndex};
pub use notify::{Notification, NotificationDispatcher, Permission, Presence};
pub use reconcile::{Cursor, DroppedRow, ReconcileReport, reconcile};
pub use scroll::{NEAR_BOTTOM_THRESHOLD_PX, ScrollAnchor, ScrollIntent, Viewport};
pub use send::{OutgoingMessage, SendGuard};
pub use session::{SessionConfig, SyncSession};
pub use veilroom_core::{
    DecryptedMessage, IdentityKey, IdentityKeys, MessageState, RoomId, env::Environment,
};
