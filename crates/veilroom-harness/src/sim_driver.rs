//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the terminal driver but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`veilroom_app::Runtime`] orchestration code runs in both production and
//! simulation.
//!
//! The viewport is a pixel model: every rendered entry is
//! [`SimDriver::LINE_HEIGHT`] tall per started 40 characters of body, the
//! visible area has a fixed height, and scroll instructions move
//! `scroll_top` the way a browser would.

use std::{
    collections::VecDeque,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use veilroom_app::{Driver, DriverEvent, Timeline, TimelineEntry};
use veilroom_client::{
    Notification, OutgoingMessage, Permission, Presence, ScrollIntent, Viewport,
};
use veilroom_core::RoomId;

use crate::SimServer;

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// Shared state for event injection and inspection.
#[derive(Default)]
struct SharedState {
    pending_events: VecDeque<DriverEvent>,
    outbox: Vec<OutgoingMessage>,
    notifications: Vec<Notification>,
    scrolls: Vec<ScrollIntent>,
    rendered: Vec<TimelineEntry>,
    renders: usize,
    inputs_cleared: usize,
    cursor: u64,
    presence: Presence,
    scroll_top: f64,
    content_height: f64,
    client_height: f64,
    stopped: bool,
}

/// Simulation driver for deterministic testing.
#[derive(Clone)]
pub struct SimDriver {
    state: Arc<Mutex<SharedState>>,
}

impl Default for SimDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimDriver {
    /// Pixel height of one rendered line.
    pub const LINE_HEIGHT: f64 = 20.0;

    /// Characters per rendered line.
    pub const LINE_CHARS: usize = 40;

    /// Driver with a 200 px viewport, unfocused, permission granted.
    pub fn new() -> Self {
        let state = SharedState {
            client_height: 200.0,
            presence: Presence { focused: false, permission: Permission::Granted },
            ..SharedState::default()
        };
        Self { state: Arc::new(Mutex::new(state)) }
    }

    fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue an event.
    pub fn inject(&self, event: DriverEvent) {
        self.lock().pending_events.push_back(event);
    }

    /// Queue the user typing `content` and pressing enter.
    pub fn compose(&self, content: &str) {
        self.inject(DriverEvent::Compose { content: content.to_owned() });
    }

    /// Queue one poll of `server` from the last observed cursor.
    pub fn poll(&self, server: &SimServer, room: &RoomId, limit: u32) {
        let since_id = self.cursor();
        self.inject(DriverEvent::Rows(server.fetch(room, since_id, limit)));
    }

    /// Post every transmitted message to `server` and queue the outcomes.
    ///
    /// With `echo` the stored row is returned to the session the way a
    /// JSON response body would be.
    pub fn deliver_outbox(&self, server: &mut SimServer, room: &RoomId, echo: bool) {
        for message in self.take_outbox() {
            let event = match server.post(room, &message.body) {
                Ok(row) => DriverEvent::SendSucceeded {
                    plaintext_key: message.plaintext_key,
                    echo: echo.then_some(row),
                },
                Err(err) => DriverEvent::SendFailed {
                    plaintext_key: message.plaintext_key,
                    reason: err.to_string(),
                },
            };
            self.inject(event);
        }
    }

    /// Fail every transmitted message with `reason`.
    pub fn fail_outbox(&self, reason: &str) {
        for message in self.take_outbox() {
            self.inject(DriverEvent::SendFailed {
                plaintext_key: message.plaintext_key,
                reason: reason.to_owned(),
            });
        }
    }

    /// Remove and return transmitted messages.
    pub fn take_outbox(&self) -> Vec<OutgoingMessage> {
        std::mem::take(&mut self.lock().outbox)
    }

    /// Set focus and permission.
    pub fn set_presence(&self, presence: Presence) {
        self.lock().presence = presence;
    }

    /// Scroll the viewport to `scroll_top`, as a user would.
    pub fn set_scroll_top(&self, scroll_top: f64) {
        self.lock().scroll_top = scroll_top;
    }

    /// Notifications raised so far.
    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().notifications.clone()
    }

    /// Scroll instructions applied so far.
    pub fn scrolls(&self) -> Vec<ScrollIntent> {
        self.lock().scrolls.clone()
    }

    /// Entries of the last render.
    pub fn rendered(&self) -> Vec<TimelineEntry> {
        self.lock().rendered.clone()
    }

    /// Number of renders.
    pub fn render_count(&self) -> usize {
        self.lock().renders
    }

    /// Number of times the compose input was cleared.
    pub fn inputs_cleared(&self) -> usize {
        self.lock().inputs_cleared
    }

    /// Last cursor reported by the runtime.
    pub fn cursor(&self) -> u64 {
        self.lock().cursor
    }

    /// Whether [`Driver::stop`] was called.
    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    fn entry_height(entry: &TimelineEntry) -> f64 {
        let lines = 1 + entry.content.chars().count() / Self::LINE_CHARS;
        lines as f64 * Self::LINE_HEIGHT
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    fn next_event(&mut self) -> impl Future<Output = Result<Option<DriverEvent>, Self::Error>> + Send {
        let event = self.lock().pending_events.pop_front();
        std::future::ready(Ok(event))
    }

    fn transmit(&mut self, message: OutgoingMessage) -> Result<(), Self::Error> {
        self.lock().outbox.push(message);
        Ok(())
    }

    fn observe_cursor(&mut self, last_seen_id: u64) {
        self.lock().cursor = last_seen_id;
    }

    fn presence(&self) -> Presence {
        self.lock().presence
    }

    fn viewport(&self) -> Viewport {
        let state = self.lock();
        Viewport {
            scroll_top: state.scroll_top,
            scroll_height: state.content_height.max(state.client_height),
            client_height: state.client_height,
        }
    }

    fn render(&mut self, timeline: &Timeline) -> Result<(), Self::Error> {
        let mut state = self.lock();
        state.rendered = timeline.entries().to_vec();
        state.content_height = state.rendered.iter().map(Self::entry_height).sum();
        state.renders += 1;
        Ok(())
    }

    fn scroll(&mut self, intent: ScrollIntent) {
        let mut state = self.lock();
        let max_top = (state.content_height - state.client_height).max(0.0);
        state.scroll_top = match intent {
            ScrollIntent::StickToBottom => max_top,
            ScrollIntent::PreserveOffset { delta } => (state.scroll_top + delta).clamp(0.0, max_top),
        };
        state.scrolls.push(intent);
    }

    fn notify(&mut self, notification: &Notification) -> Result<(), Self::Error> {
        self.lock().notifications.push(notification.clone());
        Ok(())
    }

    fn clear_input(&mut self) {
        self.lock().inputs_cleared += 1;
    }

    fn stop(&mut self) {
        self.lock().stopped = true;
    }
}
