//! WebSocket push channel.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use veilroom_core::{
    RoomId,
    wire::{FetchRequest, PushEvent},
};

use super::{TransportConfig, TransportError, TransportEvent, TransportHandle, Url};

/// Open the push channel for `room` and keep it open.
///
/// On every (re)connect the channel asks for history from the current cursor.
/// When the connection drops, an [`TransportEvent::Unavailable`] is emitted
/// and a new connection is attempted after the fixed reconnect delay,
/// indefinitely.
///
/// # Errors
///
/// - `InvalidUrl` if no WebSocket URL can be derived from the base URL
pub fn spawn_push(
    room: RoomId,
    cursor: watch::Receiver<u64>,
    config: &TransportConfig,
) -> Result<TransportHandle, TransportError> {
    let url = config.websocket_url(&room)?;
    let (tx, events) = mpsc::channel(config.event_buffer);
    let handshake_timeout = config.request_timeout;
    let reconnect_delay = config.reconnect_delay;

    let task = tokio::spawn(async move {
        loop {
            let reason = match run_connection(&url, &cursor, &tx, handshake_timeout).await {
                Ok(()) => "connection closed".to_owned(),
                Err(err) => err.to_string(),
            };
            if tx.is_closed() {
                break;
            }

            tracing::info!(%reason, delay = ?reconnect_delay, "push channel down, reconnecting");
            if tx.send(TransportEvent::Unavailable { reason }).await.is_err() {
                break;
            }
            tokio::time::sleep(reconnect_delay).await;
        }
    });

    Ok(TransportHandle { events, task })
}

async fn run_connection(
    url: &Url,
    cursor: &watch::Receiver<u64>,
    tx: &mpsc::Sender<TransportEvent>,
    handshake_timeout: Duration,
) -> Result<(), TransportError> {
    let (stream, _) = tokio::time::timeout(handshake_timeout, connect_async(url.as_str()))
        .await
        .map_err(|_| TransportError::Timeout(handshake_timeout))?
        .map_err(websocket_error)?;
    let (mut write, mut read) = stream.split();

    let since_id = *cursor.borrow();
    let request = serde_json::to_string(&FetchRequest::since(since_id))
        .map_err(|e| TransportError::Decode(e.to_string()))?;
    write.send(Message::Text(request)).await.map_err(websocket_error)?;
    tracing::info!(since_id, "push channel connected");

    if tx.send(TransportEvent::Connected).await.is_err() {
        return Ok(());
    }

    while let Some(frame) = read.next().await {
        match frame.map_err(websocket_error)? {
            Message::Text(text) => {
                let Some(event) = classify(&text) else {
                    continue;
                };
                if tx.send(event).await.is_err() {
                    return Ok(());
                }
            },
            Message::Ping(payload) => {
                write.send(Message::Pong(payload)).await.map_err(websocket_error)?;
            },
            Message::Close(frame) => {
                tracing::debug!(?frame, "push channel closed by server");
                return Ok(());
            },
            _ => {},
        }
    }

    Ok(())
}

/// Turn one server frame into a transport event.
///
/// History and single-message events become identical batches.
fn classify(text: &str) -> Option<TransportEvent> {
    let event: PushEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(err) => {
            tracing::debug!(%err, "ignoring unparseable push frame");
            return None;
        },
    };

    match event {
        PushEvent::History { .. } | PushEvent::Message { .. } => {
            Some(TransportEvent::Batch(event.rows()))
        },
        PushEvent::RoomNuked { deleted_count, .. } => {
            Some(TransportEvent::RoomNuked { deleted_count })
        },
        PushEvent::Unknown => None,
    }
}

fn websocket_error(err: tokio_tungstenite::tungstenite::Error) -> TransportError {
    TransportError::WebSocket(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_and_message_are_batches() {
        let history = classify(r#"{"type":"history","messages":[{"id":1},{"id":2}]}"#);
        assert!(matches!(history, Some(TransportEvent::Batch(rows)) if rows.len() == 2));

        let single = classify(r#"{"type":"message","message":{"id":3}}"#);
        assert!(matches!(single, Some(TransportEvent::Batch(rows)) if rows[0].id == Some(3)));
    }

    #[test]
    fn nuke_is_forwarded() {
        let nuked = classify(r#"{"type":"room_nuked","room":"0123456789abcdef","deleted_count":9}"#);
        assert_eq!(nuked, Some(TransportEvent::RoomNuked { deleted_count: 9 }));
    }

    #[test]
    fn garbage_and_unknown_are_ignored() {
        assert_eq!(classify("not json"), None);
        assert_eq!(classify(r#"{"type":"typing"}"#), None);
    }
}
