//! Notification dispatch.
//!
//! A message raises at most one notification for the lifetime of the
//! dispatcher, and only when it is first created. Updates (a pending message
//! being confirmed, a re-fetched row) never notify.

use std::collections::HashSet;

use veilroom_core::{
    IdentityKey, IdentityKeys, RoomId,
    sanitize::{notification_body, sanitize_username},
};

use crate::MessageEntry;

/// Notification permission as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Permission {
    /// Not yet asked
    #[default]
    Default,
    /// The user allowed notifications
    Granted,
    /// The user refused notifications
    Denied,
}

/// Whether the user is looking at the room right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Presence {
    /// The chat surface has focus
    pub focused: bool,
    /// Notification permission
    pub permission: Permission,
}

impl Presence {
    fn wants_notifications(self) -> bool {
        !self.focused && self.permission == Permission::Granted
    }
}

/// A notification to raise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Sanitized author name
    pub title: String,
    /// Sanitized body
    pub body: String,
    /// Grouping tag, `chat-<room>`
    pub tag: String,
    /// Whether a notification replacing one with the same tag should alert
    /// again. Always false.
    pub renotify: bool,
}

/// Raises one notification per newly created message.
#[derive(Debug, Clone, Default)]
pub struct NotificationDispatcher {
    notified: HashSet<IdentityKey>,
}

impl NotificationDispatcher {
    /// Create a dispatcher with an empty notified set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications for `created`.
    ///
    /// Every message is marked as seen, even when `presence` or `suppress`
    /// hold the notification back, so it can never fire later.
    pub fn dispatch(
        &mut self,
        created: &[MessageEntry],
        presence: Presence,
        room: &RoomId,
        suppress: bool,
    ) -> Vec<Notification> {
        let mut out = Vec::new();
        for entry in created {
            let key = IdentityKeys::of(&entry.message).plaintext;
            if !self.notified.insert(key) {
                continue;
            }
            if suppress || !presence.wants_notifications() {
                continue;
            }

            out.push(Notification {
                title: sanitize_username(&entry.message.user),
                body: notification_body(&entry.message.content),
                tag: format!("chat-{room}"),
                renotify: false,
            });
        }
        out
    }

    /// Whether `key` has already been considered.
    pub fn was_notified(&self, key: &IdentityKey) -> bool {
        self.notified.contains(key)
    }
}
