//! Terminal driver.
//!
//! Implements the [`Driver`] trait for a line-oriented terminal: stdin lines
//! are composed messages, the timeline is appended to stdout as it changes,
//! and rows arrive from the HTTP poller or the WebSocket push channel.

use std::{
    collections::HashMap,
    io::{self, Write},
};

use thiserror::Error;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::{mpsc, watch},
    task::JoinHandle,
};
use veilroom_app::{ConnectionStatus, Driver, DriverEvent, Timeline};
use veilroom_client::{
    LocalId, MessageState, Notification, OutgoingMessage, Permission, Presence, ScrollIntent,
    Viewport,
    transport::{
        HttpApi, Strategy, TransportConfig, TransportError, TransportEvent, TransportHandle,
        spawn_poller, spawn_push,
    },
};
use veilroom_core::RoomId;

use crate::format;

/// Input line that ends the session.
pub const QUIT_COMMAND: &str = "/quit";

const INBOX_CAPACITY: usize = 64;

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error writing to the terminal.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Transport could not be started.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Terminal driver implementing the [`Driver`] trait.
pub struct TerminalDriver {
    api: HttpApi,
    room: RoomId,
    transport: TransportHandle,
    cursor: watch::Sender<u64>,
    input: mpsc::Receiver<String>,
    reader: JoinHandle<()>,
    outcomes_tx: mpsc::Sender<DriverEvent>,
    outcomes: mpsc::Receiver<DriverEvent>,
    printed: HashMap<LocalId, MessageState>,
    status: Option<ConnectionStatus>,
    notice: Option<String>,
    notify: bool,
}

impl TerminalDriver {
    /// Start reading stdin and the configured transport for `room`.
    ///
    /// With `notify` set the terminal behaves like an unfocused window with
    /// notification permission, so new messages from others ring the bell.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or push URL cannot be built.
    pub fn start(config: &TransportConfig, room: RoomId, notify: bool) -> Result<Self, TerminalError> {
        let api = HttpApi::new(config)?;
        let (cursor, cursor_rx) = watch::channel(0);
        let transport = match config.strategy {
            Strategy::Poll => spawn_poller(api.clone(), room.clone(), cursor_rx, config),
            Strategy::Push => spawn_push(room.clone(), cursor_rx, config)?,
        };

        let (input_tx, input) = mpsc::channel(INBOX_CAPACITY);
        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if input_tx.send(line).await.is_err() {
                    break;
                }
            }
        });

        let (outcomes_tx, outcomes) = mpsc::channel(INBOX_CAPACITY);
        Ok(Self {
            api,
            room,
            transport,
            cursor,
            input,
            reader,
            outcomes_tx,
            outcomes,
            printed: HashMap::new(),
            status: None,
            notice: None,
            notify,
        })
    }

    fn write_line(line: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{line}")?;
        out.flush()
    }
}

/// Map a compose line to a driver event.
pub fn input_event(line: String) -> DriverEvent {
    if line.trim() == QUIT_COMMAND {
        DriverEvent::Quit
    } else {
        DriverEvent::Compose { content: line }
    }
}

/// Map a transport observation to a driver event.
pub fn transport_event(event: TransportEvent) -> DriverEvent {
    match event {
        TransportEvent::Batch(rows) => DriverEvent::Rows(rows),
        TransportEvent::Connected => DriverEvent::Connected,
        TransportEvent::RoomNuked { deleted_count } => DriverEvent::RoomNuked { deleted_count },
        TransportEvent::Unavailable { reason } => DriverEvent::Unavailable { reason },
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;

    async fn next_event(&mut self) -> Result<Option<DriverEvent>, Self::Error> {
        tokio::select! {
            line = self.input.recv() => {
                // Closed stdin ends the session like /quit
                Ok(Some(line.map_or(DriverEvent::Quit, input_event)))
            }
            Some(outcome) = self.outcomes.recv() => Ok(Some(outcome)),
            event = self.transport.events.recv() => Ok(event.map(transport_event)),
        }
    }

    fn transmit(&mut self, message: OutgoingMessage) -> Result<(), Self::Error> {
        let api = self.api.clone();
        let room = self.room.clone();
        let outcomes = self.outcomes_tx.clone();

        tokio::spawn(async move {
            let OutgoingMessage { plaintext_key, body } = message;
            let event = match api.post_message(&room, &body).await {
                Ok(echo) => DriverEvent::SendSucceeded { plaintext_key, echo },
                Err(err) => {
                    tracing::warn!(%err, "send failed");
                    DriverEvent::SendFailed { plaintext_key, reason: err.to_string() }
                },
            };
            if outcomes.send(event).await.is_err() {
                tracing::debug!("driver gone before send outcome arrived");
            }
        });
        Ok(())
    }

    fn observe_cursor(&mut self, last_seen_id: u64) {
        self.cursor.send_replace(last_seen_id);
    }

    fn presence(&self) -> Presence {
        let permission = if self.notify { Permission::Granted } else { Permission::Denied };
        Presence { focused: false, permission }
    }

    fn viewport(&self) -> Viewport {
        // Output is append-only: the reader is always at the bottom
        Viewport::default()
    }

    fn render(&mut self, timeline: &Timeline) -> Result<(), Self::Error> {
        if self.status.as_ref() != Some(timeline.status()) {
            Self::write_line(&format::status_line(timeline.status()))?;
            self.status = Some(timeline.status().clone());
        }

        if let Some(notice) = timeline.notice()
            && self.notice.as_deref() != Some(notice)
        {
            Self::write_line(&format!("* {notice}"))?;
            self.notice = Some(notice.to_owned());
        }

        for entry in timeline.entries() {
            if self.printed.get(&entry.id) == Some(&entry.state) {
                continue;
            }
            // A confirmation of something already on screen is not news
            let was_pending = self.printed.get(&entry.id) == Some(&MessageState::Pending);
            if !(was_pending && entry.state == MessageState::Confirmed) {
                Self::write_line(&format::entry_line(entry))?;
            }
            self.printed.insert(entry.id, entry.state);
        }
        Ok(())
    }

    fn scroll(&mut self, intent: ScrollIntent) {
        tracing::trace!(?intent, "scroll ignored by line terminal");
    }

    fn notify(&mut self, notification: &Notification) -> Result<(), Self::Error> {
        let mut out = io::stdout().lock();
        write!(out, "\x07")?;
        writeln!(out, "{}", format::notification_line(notification))?;
        out.flush()?;
        Ok(())
    }

    fn clear_input(&mut self) {}

    fn stop(&mut self) {
        self.transport.abort();
        self.reader.abort();
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quit_command_ends_session() {
        assert_eq!(input_event("/quit".into()), DriverEvent::Quit);
        assert_eq!(input_event("  /quit ".into()), DriverEvent::Quit);
    }

    #[test]
    fn other_lines_are_composed_verbatim() {
        assert_eq!(
            input_event(" hello /quit".into()),
            DriverEvent::Compose { content: " hello /quit".into() }
        );
    }

    #[test]
    fn transport_events_map_one_to_one() {
        assert_eq!(transport_event(TransportEvent::Batch(Vec::new())), DriverEvent::Rows(Vec::new()));
        assert_eq!(transport_event(TransportEvent::Connected), DriverEvent::Connected);
        assert_eq!(
            transport_event(TransportEvent::RoomNuked { deleted_count: 2 }),
            DriverEvent::RoomNuked { deleted_count: 2 }
        );
        assert_eq!(
            transport_event(TransportEvent::Unavailable { reason: "x".into() }),
            DriverEvent::Unavailable { reason: "x".into() }
        );
    }
}
