//! HTTP message API and the polling loop.

use serde_json::Value;
use tokio::{
    sync::{mpsc, watch},
    time::MissedTickBehavior,
};
use veilroom_core::{
    RoomId,
    wire::{NewMessage, WireMessage, parse_rows},
};

use super::{TransportConfig, TransportError, TransportEvent, TransportHandle, Url};

/// Client for the REST endpoints of the message API.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpApi {
    /// Build a client whose every request is bounded by the configured
    /// timeout.
    ///
    /// # Errors
    ///
    /// - `Http` if the TLS backend cannot be initialized
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { client, base_url: config.api_base() })
    }

    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url.join(path).map_err(|e| TransportError::InvalidUrl(e.to_string()))
    }

    /// Fetch up to `limit` rows with id greater than `since_id`, ascending.
    ///
    /// # Errors
    ///
    /// - `Http`, `Status` on request failure
    /// - `Decode` if the body is not a JSON array
    pub async fn fetch_since(
        &self,
        room: &RoomId,
        since_id: u64,
        limit: u32,
    ) -> Result<Vec<WireMessage>, TransportError> {
        let url = self.endpoint(&format!("api/messages/{room}"))?;
        let response = self
            .client
            .get(url)
            .query(&[
                ("since_id", since_id.to_string()),
                ("order", "asc".to_owned()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status { status: status.as_u16() });
        }

        let body: Value = response.json().await?;
        let rows = body
            .as_array()
            .ok_or_else(|| TransportError::Decode("expected a JSON array of rows".to_owned()))?;
        Ok(parse_rows(rows))
    }

    /// Store an encrypted message.
    ///
    /// Returns the stored row when the response body carries one.
    ///
    /// # Errors
    ///
    /// - `Http`, `Status` if the server did not accept the message
    pub async fn post_message(
        &self,
        room: &RoomId,
        message: &NewMessage,
    ) -> Result<Option<WireMessage>, TransportError> {
        let url = self.endpoint(&format!("api/messages/{room}"))?;
        let response = self.client.post(url).json(message).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status { status: status.as_u16() });
        }

        let echo = response.json::<Value>().await.ok();
        Ok(echo.as_ref().and_then(WireMessage::from_value))
    }

    /// Delete every message in `room`.
    ///
    /// # Errors
    ///
    /// - `Http`, `Status` on request failure
    pub async fn nuke_room(&self, room: &RoomId) -> Result<(), TransportError> {
        let url = self.endpoint(&format!("api/room/{room}/nuke/"))?;
        let response = self.client.post(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status { status: status.as_u16() });
        }
        Ok(())
    }
}

/// Poll `room` from the cursor on a fixed interval.
///
/// Each tick reads the latest cursor and issues one request; a slow request
/// delays the next tick rather than overlapping it. Failures are reported as
/// [`TransportEvent::Unavailable`] and retried on the next tick.
pub fn spawn_poller(
    api: HttpApi,
    room: RoomId,
    cursor: watch::Receiver<u64>,
    config: &TransportConfig,
) -> TransportHandle {
    let (tx, events) = mpsc::channel(config.event_buffer);
    let interval = config.poll_interval;
    let limit = config.effective_limit();

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let since_id = *cursor.borrow();

            let event = match api.fetch_since(&room, since_id, limit).await {
                Ok(rows) => TransportEvent::Batch(rows),
                Err(err) => {
                    tracing::warn!(%err, since_id, "poll failed");
                    TransportEvent::Unavailable { reason: err.to_string() }
                },
            };

            if tx.send(event).await.is_err() {
                tracing::debug!("poll receiver dropped, stopping");
                break;
            }
        }
    });

    TransportHandle { events, task }
}
