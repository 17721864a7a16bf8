//! Room identifiers.
//!
//! A room is named by 16 lowercase hex characters (8 random bytes). The id is
//! taken from the last URL path segment when it has that shape, else from
//! storage, else freshly generated. Whatever is chosen is written back to both
//! storage and the URL so reloads land in the same room.

use std::fmt;

use serde::{Deserialize, Serialize};
use veilroom_crypto::hex;

use crate::{
    StorageError,
    env::Environment,
    location::{Location, Storage},
};

/// Storage key holding the last room id.
pub const ROOM_STORAGE_KEY: &str = "room";

/// Number of random bytes in a room id.
pub const ROOM_ID_BYTES: usize = 8;

/// Opaque room identifier (16 lowercase hex characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomId(String);

impl RoomId {
    /// Parse a room id. Either case is accepted; the result is lowercase.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        let well_formed = trimmed.len() == ROOM_ID_BYTES * 2
            && trimmed.bytes().all(|b| b.is_ascii_hexdigit());
        well_formed.then(|| Self(trimmed.to_ascii_lowercase()))
    }

    /// Generate a fresh random room id.
    pub fn generate<E: Environment>(env: &E) -> Self {
        let mut bytes = [0u8; ROOM_ID_BYTES];
        env.random_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a wire row's room field names this room (case-insensitive).
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.trim())
    }

    /// Canonical URL path for this room.
    pub fn path(&self) -> String {
        format!("/room/{}", self.0)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RoomId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid room id: {value:?}"))
    }
}

impl From<RoomId> for String {
    fn from(room: RoomId) -> Self {
        room.0
    }
}

/// Resolve the room for this session.
///
/// Order: last non-empty path segment, then stored id, then a new random id.
/// The path segment wins over storage and updates it. A stored or generated
/// id is written into the location path without navigation.
pub fn resolve_room<L, S, E>(
    location: &mut L,
    storage: &mut S,
    env: &E,
) -> Result<RoomId, StorageError>
where
    L: Location,
    S: Storage,
    E: Environment,
{
    let path = location.path();
    let from_path = path.split('/').rfind(|segment| !segment.is_empty()).and_then(RoomId::parse);
    if let Some(room) = from_path {
        storage.set(ROOM_STORAGE_KEY, room.as_str())?;
        return Ok(room);
    }

    if let Some(room) = storage.get(ROOM_STORAGE_KEY).as_deref().and_then(RoomId::parse) {
        location.set_path(&room.path());
        return Ok(room);
    }

    let room = RoomId::generate(env);
    tracing::info!(room = %room, "generated new room");
    storage.set(ROOM_STORAGE_KEY, room.as_str())?;
    location.set_path(&room.path());
    Ok(room)
}
