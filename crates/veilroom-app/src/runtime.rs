//! Generic runtime for application orchestration.
//!
//! The Runtime drives the event loop, coordinating between:
//! - [`SyncSession`]: reconciliation and send state machine
//! - [`Timeline`]: view model
//! - [`Driver`]: platform-specific I/O
//!
//! The runtime is the single writer of the session. Transport batches, send
//! outcomes and user input are serialized through [`Driver::next_event`], so
//! reconciliation passes never interleave.

use veilroom_client::{ClientAction, ClientError, ClientEvent, SyncSession};
use veilroom_core::env::Environment;

use crate::{ConnectionStatus, Driver, DriverEvent, Timeline};

/// Generic runtime that orchestrates SyncSession, Timeline, and Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `E`: Environment for time and randomness
pub struct Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    driver: D,
    session: SyncSession<E>,
    timeline: Timeline,
}

impl<D, E> Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    /// Create a runtime for an open session, posting as `nickname`.
    pub fn new(driver: D, session: SyncSession<E>, nickname: String) -> Self {
        let timeline = Timeline::new(session.room().clone(), nickname);
        Self { driver, session, timeline }
    }

    /// Run the main event loop until the driver runs dry or the user quits.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self) -> Result<(), D::Error> {
        let result = self.run_until_idle().await;
        self.session.close();
        self.driver.stop();
        result
    }

    /// Process events until the driver has none left or the user quits,
    /// leaving the session open.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run_until_idle(&mut self) -> Result<(), D::Error> {
        self.driver.render(&self.timeline)?;

        while let Some(event) = self.driver.next_event().await? {
            if self.handle_event(event)? {
                break;
            }
        }
        Ok(())
    }

    /// Handle one event. Returns `true` if the application should quit.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails to render or transmit.
    pub fn handle_event(&mut self, event: DriverEvent) -> Result<bool, D::Error> {
        match event {
            DriverEvent::Rows(rows) => {
                let event = ClientEvent::BatchReceived {
                    rows,
                    viewport: self.driver.viewport(),
                    presence: self.driver.presence(),
                };
                let result = self.session.handle(event);
                self.process(result)?;
                self.driver.observe_cursor(self.session.cursor().last_seen_id());
                self.update_status(ConnectionStatus::Live)?;
            },
            DriverEvent::Compose { content } => {
                let user = self.timeline.nickname().to_owned();
                let result = self.session.handle(ClientEvent::Send { user, content });
                self.process(result)?;
            },
            DriverEvent::SendSucceeded { plaintext_key, echo } => {
                let event = ClientEvent::SendAccepted {
                    plaintext_key,
                    echo,
                    viewport: self.driver.viewport(),
                    presence: self.driver.presence(),
                };
                let result = self.session.handle(event);
                self.process(result)?;
                self.driver.observe_cursor(self.session.cursor().last_seen_id());
            },
            DriverEvent::SendFailed { plaintext_key, reason } => {
                let result = self.session.handle(ClientEvent::SendFailed { plaintext_key, reason });
                self.process(result)?;
            },
            DriverEvent::Connected => self.update_status(ConnectionStatus::Live)?,
            DriverEvent::Unavailable { reason } => {
                self.update_status(ConnectionStatus::Unavailable { reason })?;
            },
            DriverEvent::RoomNuked { deleted_count } => {
                tracing::warn!(deleted_count, "room cleared by server");
                self.timeline.set_notice(format!("room cleared ({deleted_count} messages deleted)"));
                self.driver.render(&self.timeline)?;
            },
            DriverEvent::Quit => return Ok(true),
        }
        Ok(false)
    }

    fn process(&mut self, result: Result<Vec<ClientAction>, ClientError>) -> Result<(), D::Error> {
        match result {
            Ok(actions) => self.apply(actions),
            Err(ClientError::MissingKey) => {
                tracing::debug!("session closed, event skipped");
                Ok(())
            },
            Err(err) => {
                tracing::debug!(%err, "send rejected");
                Ok(())
            },
        }
    }

    /// Execute session actions.
    ///
    /// View changes are rendered before a transmit starts and before any
    /// scroll instruction is applied, so anchors resolve against the new
    /// content height.
    fn apply(&mut self, actions: Vec<ClientAction>) -> Result<(), D::Error> {
        let mut dirty = false;
        let mut anchors = Vec::new();
        let mut scrolls = Vec::new();

        for action in actions {
            match action {
                ClientAction::Insert(entry) => {
                    self.timeline.insert(entry);
                    dirty = true;
                },
                ClientAction::Refresh(entry) => {
                    self.timeline.refresh(entry);
                    dirty = true;
                },
                ClientAction::Transmit(message) => {
                    if dirty {
                        self.driver.render(&self.timeline)?;
                        dirty = false;
                    }
                    self.driver.transmit(message)?;
                },
                ClientAction::ClearInput => self.driver.clear_input(),
                ClientAction::Notify(notification) => {
                    if let Err(err) = self.driver.notify(&notification) {
                        tracing::warn!(%err, "notification failed");
                    }
                },
                ClientAction::Scroll(intent) => scrolls.push(intent),
                ClientAction::Anchor(anchor) => anchors.push(anchor),
            }
        }

        if dirty {
            self.driver.render(&self.timeline)?;
        }

        let height = self.driver.viewport().scroll_height;
        for anchor in anchors {
            self.driver.scroll(anchor.resolve(height));
        }
        for intent in scrolls {
            self.driver.scroll(intent);
        }
        Ok(())
    }

    fn update_status(&mut self, status: ConnectionStatus) -> Result<(), D::Error> {
        if self.timeline.set_status(status) {
            self.driver.render(&self.timeline)?;
        }
        Ok(())
    }

    /// The timeline view model.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// The sync session.
    pub fn session(&self) -> &SyncSession<E> {
        &self.session
    }

    /// The driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Mutable access to the driver.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}
