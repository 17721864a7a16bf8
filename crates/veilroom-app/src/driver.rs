//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the runtime from specific I/O
//! implementations. Each frontend implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::future::Future;

use veilroom_client::{Notification, OutgoingMessage, Presence, ScrollIntent, Viewport};

use crate::{DriverEvent, Timeline};

/// Abstracts I/O operations for the runtime.
///
/// # Implementations
///
/// - **Terminal**: stdin lines, HTTP/WebSocket transport, stdout rendering
/// - **Simulation**: scripted events and an in-memory server
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next input event.
    ///
    /// Returns `None` when no more events will arrive.
    fn next_event(&mut self) -> impl Future<Output = Result<Option<DriverEvent>, Self::Error>> + Send;

    /// Start sending an encrypted message.
    ///
    /// Must not wait for the server: the outcome is reported later as
    /// [`DriverEvent::SendSucceeded`] or [`DriverEvent::SendFailed`].
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be handed to the transport.
    fn transmit(&mut self, message: OutgoingMessage) -> Result<(), Self::Error>;

    /// The session's cursor moved; later fetches start after this id.
    fn observe_cursor(&mut self, last_seen_id: u64);

    /// Current focus and notification permission.
    fn presence(&self) -> Presence;

    /// Current scroll metrics of the message list.
    fn viewport(&self) -> Viewport;

    /// Render the timeline.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, timeline: &Timeline) -> Result<(), Self::Error>;

    /// Apply a scroll instruction.
    fn scroll(&mut self, intent: ScrollIntent);

    /// Raise a notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform refused the notification.
    fn notify(&mut self, notification: &Notification) -> Result<(), Self::Error>;

    /// Clear the compose input.
    fn clear_input(&mut self);

    /// Stop the transport and clean up resources.
    fn stop(&mut self);
}
