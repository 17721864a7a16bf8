//! In-memory message API.
//!
//! Behaves like the real server from the client's point of view: it assigns
//! strictly increasing ids and server-clock timestamps, validates envelope
//! shapes on write, pages ascending from a since-id, and can clear a room.
//! It never sees plaintext.

use chrono::SecondsFormat;
use veilroom_core::{
    RoomId,
    env::Environment,
    wire::{IV_HEX_LEN, MAX_PAGE_LIMIT, MIN_CIPHER_HEX_LEN, NewMessage, WireMessage},
};

use crate::SimEnv;

/// Rejected write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimServerError(pub String);

impl std::fmt::Display for SimServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimServerError: {}", self.0)
    }
}

impl std::error::Error for SimServerError {}

/// Simulated message server.
#[derive(Debug, Clone)]
pub struct SimServer {
    env: SimEnv,
    rows: Vec<WireMessage>,
    next_id: u64,
}

impl SimServer {
    /// Empty server using `env` for timestamps.
    pub fn new(env: SimEnv) -> Self {
        Self { env, rows: Vec::new(), next_id: 1 }
    }

    /// Number of stored rows across all rooms.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no row is stored.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Store a message, returning the stored row (the POST response body).
    ///
    /// # Errors
    ///
    /// Returns an error if an IV is not 24 hex chars or a field is shorter
    /// than a bare tag.
    pub fn post(&mut self, room: &RoomId, message: &NewMessage) -> Result<WireMessage, SimServerError> {
        for (name, iv) in [("iv", &message.iv), ("user_iv", &message.user_iv)] {
            if iv.len() != IV_HEX_LEN {
                return Err(SimServerError(format!("{name} must be {IV_HEX_LEN} hex chars")));
            }
        }
        for (name, field) in [("content", &message.content), ("user", &message.user)] {
            if field.len() < MIN_CIPHER_HEX_LEN {
                return Err(SimServerError(format!("{name} ciphertext too short")));
            }
        }

        let row = WireMessage {
            id: None,
            room: Some(room.to_string()),
            user: Some(message.user.clone()),
            user_iv: Some(message.user_iv.clone()),
            content: Some(message.content.clone()),
            iv: Some(message.iv.clone()),
            timestamp: Some(self.timestamp()),
        };
        Ok(self.store(row))
    }

    /// Store an arbitrary row unvalidated, assigning the next id.
    ///
    /// Used to plant malformed or foreign rows.
    pub fn inject_raw(&mut self, row: WireMessage) -> WireMessage {
        self.store(row)
    }

    /// Rows of `room` with id above `since_id`, ascending, at most `limit`.
    pub fn fetch(&self, room: &RoomId, since_id: u64, limit: u32) -> Vec<WireMessage> {
        let limit = limit.clamp(1, MAX_PAGE_LIMIT) as usize;
        self.rows
            .iter()
            .filter(|row| row.room.as_deref().is_some_and(|r| room.matches(r)))
            .filter(|row| row.id.is_some_and(|id| id > since_id))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Delete every row of `room`, returning how many were removed.
    pub fn nuke(&mut self, room: &RoomId) -> u64 {
        let before = self.rows.len();
        self.rows.retain(|row| !row.room.as_deref().is_some_and(|r| room.matches(r)));
        (before - self.rows.len()) as u64
    }

    fn store(&mut self, mut row: WireMessage) -> WireMessage {
        row.id = Some(self.next_id);
        self.next_id += 1;
        tracing::trace!(id = ?row.id, "sim server stored row");
        self.rows.push(row.clone());
        row
    }

    fn timestamp(&self) -> String {
        self.env.wall_clock().to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

#[cfg(test)]
mod tests {
    use veilroom_crypto::{KEY_SIZE, RoomKey};

    use super::*;

    fn room() -> RoomId {
        RoomId::parse("0123456789abcdef").unwrap()
    }

    fn message(text: &str) -> NewMessage {
        let key = RoomKey::from_bytes([0u8; KEY_SIZE]);
        NewMessage::seal("alice", text, &key, [1; 12], [2; 12])
    }

    #[test]
    fn ids_increase_and_timestamps_use_z() {
        let mut server = SimServer::new(SimEnv::with_seed(1));
        let a = server.post(&room(), &message("a")).unwrap();
        let b = server.post(&room(), &message("b")).unwrap();

        assert_eq!(a.id, Some(1));
        assert_eq!(b.id, Some(2));
        assert!(a.timestamp.unwrap().ends_with('Z'));
    }

    #[test]
    fn fetch_pages_from_since_id() {
        let mut server = SimServer::new(SimEnv::with_seed(1));
        for text in ["a", "b", "c", "d"] {
            server.post(&room(), &message(text)).unwrap();
        }

        let page = server.fetch(&room(), 1, 2);
        let ids: Vec<_> = page.iter().filter_map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn rejects_short_iv() {
        let mut server = SimServer::new(SimEnv::with_seed(1));
        let mut bad = message("x");
        bad.iv.truncate(20);
        assert!(server.post(&room(), &bad).is_err());
        assert!(server.is_empty());
    }

    #[test]
    fn nuke_clears_only_that_room() {
        let mut server = SimServer::new(SimEnv::with_seed(1));
        let other = RoomId::parse("fedcba9876543210").unwrap();
        server.post(&room(), &message("a")).unwrap();
        server.post(&other, &message("b")).unwrap();

        assert_eq!(server.nuke(&room()), 1);
        assert_eq!(server.len(), 1);
        assert!(server.fetch(&room(), 0, 10).is_empty());
    }
}
