//! Sync session state machine.
//!
//! One [`SyncSession`] owns everything a room needs while it is open: the
//! room id and key, the message index, the cursor, the notified set and the
//! duplicate-send guard. It never performs I/O. Transports feed it batches and
//! send outcomes; it answers with [`ClientAction`]s.

use chrono::SecondsFormat;
use veilroom_core::{
    DecryptedMessage, IdentityKey, IdentityKeys, MessageState, RoomId,
    env::Environment,
    sanitize::{clamp_content, sanitize_username},
    wire::{MAX_PAGE_LIMIT, NewMessage, WireMessage},
};
use veilroom_crypto::{IV_SIZE, RoomKey};

use crate::{
    ClientAction, ClientError, ClientEvent, Cursor, MessageEntry, MessageIndex,
    NEAR_BOTTOM_THRESHOLD_PX, NotificationDispatcher, OutgoingMessage, Presence, ScrollAnchor,
    ScrollIntent, SendGuard, Viewport, reconcile,
};

/// Engine knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    /// Distance from the bottom that still counts as following new messages
    pub near_bottom_threshold: f64,
    /// Whether messages fetched as initial history may notify
    pub notify_history: bool,
    /// Rows per fetch. A batch this long is one page of a longer history, so
    /// the history window stays open after it.
    pub page_limit: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            near_bottom_threshold: NEAR_BOTTOM_THRESHOLD_PX,
            notify_history: false,
            page_limit: MAX_PAGE_LIMIT,
        }
    }
}

/// State of one open room.
pub struct SyncSession<E: Environment> {
    env: E,
    config: SessionConfig,
    room: RoomId,
    key: Option<RoomKey>,
    index: MessageIndex,
    cursor: Cursor,
    notifier: NotificationDispatcher,
    guard: SendGuard,
    history_loaded: bool,
}

impl<E: Environment> SyncSession<E> {
    /// Open a session for `room` with `key`.
    pub fn open(env: E, room: RoomId, key: RoomKey, config: SessionConfig) -> Self {
        tracing::info!(room = %room, "session opened");
        Self {
            env,
            config,
            room,
            key: Some(key),
            index: MessageIndex::new(),
            cursor: Cursor::default(),
            notifier: NotificationDispatcher::new(),
            guard: SendGuard::default(),
            history_loaded: false,
        }
    }

    /// Tear the session down: drop the key and forget every message.
    pub fn close(&mut self) {
        if self.key.take().is_some() {
            tracing::info!(room = %self.room, "session closed");
        }
        self.index = MessageIndex::new();
        self.cursor = Cursor::default();
        self.notifier = NotificationDispatcher::new();
        self.guard = SendGuard::default();
        self.history_loaded = false;
    }

    /// Whether a key is loaded.
    pub fn is_open(&self) -> bool {
        self.key.is_some()
    }

    /// Room this session syncs.
    pub fn room(&self) -> &RoomId {
        &self.room
    }

    /// Current cursor.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Stored messages.
    pub fn index(&self) -> &MessageIndex {
        &self.index
    }

    /// Notification state.
    pub fn notifier(&self) -> &NotificationDispatcher {
        &self.notifier
    }

    /// Process an event.
    ///
    /// # Errors
    ///
    /// - `MissingKey` if the session is closed
    /// - `EmptyMessage`, `DuplicateSend` for rejected sends
    pub fn handle(&mut self, event: ClientEvent) -> Result<Vec<ClientAction>, ClientError> {
        match event {
            ClientEvent::BatchReceived { rows, viewport, presence } => {
                self.apply_batch(&rows, viewport, presence)
            },
            ClientEvent::Send { user, content } => self.send(&user, &content),
            ClientEvent::SendAccepted { plaintext_key, echo, viewport, presence } => {
                tracing::debug!(key = %plaintext_key, "send accepted");
                match echo {
                    Some(row) => {
                        let suppress = self.loading_history();
                        self.merge(&[row], viewport, presence, suppress)
                    },
                    None => Ok(Vec::new()),
                }
            },
            ClientEvent::SendFailed { plaintext_key, reason } => {
                Ok(self.send_failed(&plaintext_key, &reason))
            },
        }
    }

    /// Merge a fetched or pushed batch and describe the view changes it
    /// causes.
    ///
    /// Batches received before the first one shorter than a full page are
    /// initial history and raise no notifications.
    ///
    /// # Errors
    ///
    /// - `MissingKey` if the session is closed
    pub fn apply_batch(
        &mut self,
        rows: &[WireMessage],
        viewport: Viewport,
        presence: Presence,
    ) -> Result<Vec<ClientAction>, ClientError> {
        let suppress = self.loading_history();
        let actions = self.merge(rows, viewport, presence, suppress)?;
        if rows.len() < self.config.page_limit.max(1) as usize {
            self.history_loaded = true;
        }
        Ok(actions)
    }

    fn loading_history(&self) -> bool {
        !self.history_loaded && !self.config.notify_history
    }

    fn merge(
        &mut self,
        rows: &[WireMessage],
        viewport: Viewport,
        presence: Presence,
        suppress: bool,
    ) -> Result<Vec<ClientAction>, ClientError> {
        let Some(key) = &self.key else {
            return Err(ClientError::MissingKey);
        };

        let anchor = ScrollAnchor::capture(viewport, self.config.near_bottom_threshold);

        let report = reconcile(&mut self.index, &mut self.cursor, &self.room, key, rows);
        if !report.dropped.is_empty() {
            tracing::debug!(dropped = report.dropped.len(), "rows dropped from batch");
        }

        let notifications =
            self.notifier.dispatch(&report.created, presence, &self.room, suppress);
        let changed = report.changed();

        let mut actions: Vec<ClientAction> = report
            .created
            .into_iter()
            .map(ClientAction::Insert)
            .chain(report.updated.into_iter().map(ClientAction::Refresh))
            .collect();
        if changed {
            actions.push(ClientAction::Anchor(anchor));
        }
        actions.extend(notifications.into_iter().map(ClientAction::Notify));
        Ok(actions)
    }

    /// Create a pending message and the request that sends it.
    ///
    /// The pending record is stored before anything is encrypted, so the view
    /// shows it immediately.
    ///
    /// # Errors
    ///
    /// - `MissingKey` if the session is closed
    /// - `EmptyMessage` if the body is blank
    /// - `DuplicateSend` if it repeats the previous send exactly
    pub fn send(&mut self, user: &str, content: &str) -> Result<Vec<ClientAction>, ClientError> {
        let Some(key) = &self.key else {
            return Err(ClientError::MissingKey);
        };

        let user = sanitize_username(user);
        let content = clamp_content(content);
        if content.is_empty() {
            return Err(ClientError::EmptyMessage);
        }
        if let Err(err) = self.guard.admit(&user, &content) {
            tracing::warn!("duplicate send suppressed");
            return Err(err);
        }

        let timestamp = self.env.wall_clock().to_rfc3339_opts(SecondsFormat::Millis, true);
        let message = DecryptedMessage {
            server_id: None,
            user,
            content,
            timestamp,
            state: MessageState::Pending,
        };
        let plaintext_key = IdentityKeys::of(&message).plaintext;
        let id = self.index.insert(message.clone());

        let mut user_iv = [0u8; IV_SIZE];
        let mut content_iv = [0u8; IV_SIZE];
        self.env.random_bytes(&mut user_iv);
        self.env.random_bytes(&mut content_iv);
        let body = NewMessage::seal(&message.user, &message.content, key, user_iv, content_iv);

        Ok(vec![
            ClientAction::Insert(MessageEntry { id, message }),
            ClientAction::ClearInput,
            ClientAction::Scroll(ScrollIntent::StickToBottom),
            ClientAction::Transmit(OutgoingMessage { plaintext_key, body }),
        ])
    }

    /// Mark the pending message sent under `plaintext_key` as failed.
    ///
    /// Messages already confirmed by an echo are left alone.
    pub fn send_failed(&mut self, plaintext_key: &IdentityKey, reason: &str) -> Vec<ClientAction> {
        let Some(id) = self.index.find_plaintext(plaintext_key, MessageState::Pending) else {
            tracing::debug!(key = %plaintext_key, "send failure for message no longer pending");
            return Vec::new();
        };

        tracing::warn!(%reason, "send failed");
        self.index.mark_failed(id);

        match self.index.get(id) {
            Some(message) => {
                self.guard.release(&message.user, &message.content);
                vec![ClientAction::Refresh(MessageEntry { id, message: message.clone() })]
            },
            None => Vec::new(),
        }
    }
}
