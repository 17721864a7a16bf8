//! Network transport for the sync session.
//!
//! Two interchangeable strategies deliver rows to the session:
//!
//! - **Polling** ([`spawn_poller`]): a bounded, ascending fetch from the
//!   cursor on a fixed timer
//! - **Push** ([`spawn_push`]): a WebSocket that requests history on open and
//!   then forwards each stored row, reconnecting after a fixed delay
//!
//! Both run as background tasks and report through a [`TransportHandle`].
//! They read the cursor from a `watch` channel written by the single owner of
//! the session, so they never advance it themselves.

mod http;
mod push;

use std::time::Duration;

pub use http::{HttpApi, spawn_poller};
pub use push::spawn_push;
pub use reqwest::Url;
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};
use veilroom_core::{
    RoomId, SyncError,
    wire::{MAX_PAGE_LIMIT, WireMessage},
};

/// Base URL of a local development server.
pub const DEVELOPMENT_URL: &str = "http://127.0.0.1:8000/";

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Base URL cannot address the API
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// HTTP request failed
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("server returned status {status}")]
    Status {
        /// HTTP status code
        status: u16,
    },

    /// WebSocket failure
    #[error("websocket error: {0}")]
    WebSocket(String),

    /// Response body was not what the API promises
    #[error("decode error: {0}")]
    Decode(String),

    /// Operation did not finish in time
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl From<TransportError> for SyncError {
    fn from(err: TransportError) -> Self {
        SyncError::Transport { reason: err.to_string() }
    }
}

/// How rows reach the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Periodic HTTP fetch
    #[default]
    Poll,
    /// WebSocket push
    Push,
}

/// Transport configuration.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Server base URL, e.g. `https://chat.example.com/`
    pub base_url: Url,
    /// Polling or push
    pub strategy: Strategy,
    /// Delay between polls
    pub poll_interval: Duration,
    /// Rows requested per poll, capped at [`MAX_PAGE_LIMIT`]
    pub page_limit: u32,
    /// Bound on every HTTP request and on the WebSocket handshake
    pub request_timeout: Duration,
    /// Delay before reconnecting a closed push channel
    pub reconnect_delay: Duration,
    /// Capacity of the event channel
    pub event_buffer: usize,
}

impl TransportConfig {
    /// Configuration with defaults for `base_url`.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            strategy: Strategy::Poll,
            poll_interval: Duration::from_secs(1),
            page_limit: MAX_PAGE_LIMIT,
            request_timeout: Duration::from_secs(10),
            reconnect_delay: Duration::from_secs(1),
            event_buffer: 64,
        }
    }

    /// Local development server on port 8000.
    #[allow(clippy::expect_used)]
    pub fn development() -> Self {
        let base_url =
            Url::parse(DEVELOPMENT_URL).expect("invariant: DEVELOPMENT_URL is a valid URL");
        Self::new(base_url)
    }

    /// Page size actually requested.
    pub fn effective_limit(&self) -> u32 {
        self.page_limit.clamp(1, MAX_PAGE_LIMIT)
    }

    /// Base URL with a trailing slash, so relative joins append.
    pub(crate) fn api_base(&self) -> Url {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base
    }

    /// WebSocket URL of `room`'s push channel.
    ///
    /// # Errors
    ///
    /// - `InvalidUrl` if the base URL scheme is not http(s) or ws(s)
    pub fn websocket_url(&self, room: &RoomId) -> Result<Url, TransportError> {
        let mut url = self
            .api_base()
            .join(&format!("ws/messages/{room}/"))
            .map_err(|e| TransportError::InvalidUrl(e.to_string()))?;

        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => return Err(TransportError::InvalidUrl(format!("unsupported scheme {other}"))),
        };
        url.set_scheme(scheme)
            .map_err(|()| TransportError::InvalidUrl(format!("cannot switch to {scheme}")))?;
        Ok(url)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::development()
    }
}

/// Something the transport observed.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Rows in server order (possibly empty for an idle poll)
    Batch(Vec<WireMessage>),
    /// The push channel opened
    Connected,
    /// Every message in the room was deleted server-side
    RoomNuked {
        /// Number of rows removed
        deleted_count: u64,
    },
    /// A poll failed or the push channel dropped; retried automatically
    Unavailable {
        /// What went wrong
        reason: String,
    },
}

/// A running transport task.
///
/// Dropping the handle stops the task.
#[derive(Debug)]
pub struct TransportHandle {
    /// Events in arrival order
    pub events: mpsc::Receiver<TransportEvent>,
    task: JoinHandle<()>,
}

impl TransportHandle {
    /// Stop the background task.
    pub fn abort(&self) {
        self.task.abort();
    }
}

impl Drop for TransportHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
