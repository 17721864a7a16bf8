//! Room key material.

use std::fmt;

use zeroize::{Zeroize, Zeroizing};

use crate::{CipherError, hex};

/// Room key size in bytes (AES-256).
pub const KEY_SIZE: usize = 32;

/// The 256-bit symmetric key shared by everyone holding the room link.
///
/// The key only ever travels inside the URL fragment. It is zeroized on drop
/// and its `Debug` output is redacted so it cannot leak through logs.
#[derive(Clone, PartialEq, Eq)]
pub struct RoomKey {
    bytes: [u8; KEY_SIZE],
}

impl RoomKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Parse a key from its 64-character hex form.
    ///
    /// # Errors
    ///
    /// - `Format` if the input is not exactly 64 hex characters
    pub fn from_hex(input: &str) -> Result<Self, CipherError> {
        let trimmed = input.trim();
        if trimmed.len() != KEY_SIZE * 2 {
            return Err(CipherError::Format {
                reason: format!("room key must be {} hex chars, got {}", KEY_SIZE * 2, trimmed.len()),
            });
        }
        hex::decode_array::<KEY_SIZE>(trimmed).map(Self::from_bytes)
    }

    /// Lowercase hex form, as written into the URL fragment.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.bytes))
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for RoomKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl fmt::Debug for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RoomKey(<redacted>)")
    }
}
