//! Timeline view model.
//!
//! The ordered list of messages a frontend renders, plus connection status.
//! Entries are addressed by [`LocalId`], so a pending message confirmed by its
//! echo is updated in the slot it already occupies.

use std::collections::HashMap;

use veilroom_client::{LocalId, MessageEntry};
use veilroom_core::{MessageState, RoomId, sanitize::sanitize_username};

/// One rendered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry {
    /// Session handle
    pub id: LocalId,
    /// Server id, once confirmed
    pub server_id: Option<u64>,
    /// Author, sanitized for display
    pub user: String,
    /// Body
    pub content: String,
    /// ISO-8601 timestamp
    pub timestamp: String,
    /// Lifecycle state
    pub state: MessageState,
}

impl From<MessageEntry> for TimelineEntry {
    fn from(entry: MessageEntry) -> Self {
        Self {
            id: entry.id,
            server_id: entry.message.server_id,
            user: sanitize_username(&entry.message.user),
            content: entry.message.content,
            timestamp: entry.message.timestamp,
            state: entry.message.state,
        }
    }
}

/// Transport status shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// Nothing received yet
    #[default]
    Connecting,
    /// Rows are flowing
    Live,
    /// The transport is retrying
    Unavailable {
        /// Last failure
        reason: String,
    },
}

/// Rendered state of one room.
#[derive(Debug, Clone)]
pub struct Timeline {
    room: RoomId,
    nickname: String,
    entries: Vec<TimelineEntry>,
    positions: HashMap<LocalId, usize>,
    status: ConnectionStatus,
    notice: Option<String>,
}

impl Timeline {
    /// Empty timeline for `room`.
    pub fn new(room: RoomId, nickname: String) -> Self {
        Self {
            room,
            nickname,
            entries: Vec::new(),
            positions: HashMap::new(),
            status: ConnectionStatus::default(),
            notice: None,
        }
    }

    /// Room shown.
    pub fn room(&self) -> &RoomId {
        &self.room
    }

    /// Local author name.
    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// Entries in display order.
    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    /// Entry for `id`.
    pub fn get(&self, id: LocalId) -> Option<&TimelineEntry> {
        self.positions.get(&id).and_then(|&pos| self.entries.get(pos))
    }

    /// Append a new entry. An id already present is refreshed instead.
    pub fn insert(&mut self, entry: MessageEntry) {
        if self.positions.contains_key(&entry.id) {
            self.refresh(entry);
            return;
        }
        self.positions.insert(entry.id, self.entries.len());
        self.entries.push(entry.into());
    }

    /// Replace an entry in place. An unknown id is appended.
    pub fn refresh(&mut self, entry: MessageEntry) {
        match self.positions.get(&entry.id) {
            Some(&pos) => self.entries[pos] = entry.into(),
            None => self.insert(entry),
        }
    }

    /// Transport status.
    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    /// Set the transport status. Returns true if it changed.
    pub fn set_status(&mut self, status: ConnectionStatus) -> bool {
        if self.status == status {
            return false;
        }
        self.status = status;
        true
    }

    /// One-off notice (e.g. the room was cleared).
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Show a notice.
    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }
}
