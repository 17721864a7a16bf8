//! Room key management.
//!
//! The room key is carried only in the URL fragment, which browsers never send
//! to the server. A well-formed 64-hex fragment is imported; anything else is
//! replaced by a freshly generated key written back into the fragment.
//!
//! Raw key bytes are never logged.

use veilroom_crypto::{KEY_SIZE, RoomKey};

use crate::{SyncError, env::Environment, location::Location};

/// Read the room key from the fragment.
///
/// # Errors
///
/// - `MissingKey` if the fragment is absent or not a 64-hex key
pub fn load_key<L: Location>(location: &L) -> Result<RoomKey, SyncError> {
    let fragment = location.fragment().ok_or(SyncError::MissingKey)?;
    RoomKey::from_hex(fragment.trim_start_matches('#')).map_err(|_| SyncError::MissingKey)
}

/// Read the room key from the fragment, or generate and publish a new one.
///
/// A generated key replaces whatever malformed fragment was present.
pub fn load_or_create_key<L, E>(location: &mut L, env: &E) -> RoomKey
where
    L: Location,
    E: Environment,
{
    if let Ok(key) = load_key(location) {
        return key;
    }

    let mut bytes = [0u8; KEY_SIZE];
    env.random_bytes(&mut bytes);
    let key = RoomKey::from_bytes(bytes);
    location.set_fragment(&key.to_hex());
    tracing::info!("generated new room key");
    key
}
