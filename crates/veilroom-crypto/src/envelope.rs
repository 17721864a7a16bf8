//! Field encryption using AES-256-GCM.
//!
//! All functions are pure - the IV must be provided by the caller.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};

use crate::{CipherError, RoomKey, hex};

/// GCM IV size in bytes.
pub const IV_SIZE: usize = 12;

/// GCM authentication tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// One encrypted field as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedEnvelope {
    /// Hex of ciphertext followed by the 16-byte tag
    pub cipher_hex: String,
    /// Hex of the 12-byte IV
    pub iv_hex: String,
}

/// Encrypt a UTF-8 field under the room key.
///
/// # Security
///
/// - Caller MUST provide a fresh random IV per call in production
#[allow(clippy::expect_used)]
pub fn encrypt(plaintext: &str, key: &RoomKey, iv: [u8; IV_SIZE]) -> EncryptedEnvelope {
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    // GCM only rejects plaintexts longer than 2^36 bytes
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext.as_bytes())
        .expect("invariant: field is far below the AES-GCM plaintext limit");

    EncryptedEnvelope { cipher_hex: hex::encode(ciphertext), iv_hex: hex::encode(iv) }
}

/// Decrypt an envelope back to its UTF-8 plaintext.
///
/// # Errors
///
/// - `Format`: hex is malformed, the IV is not 12 bytes, or the plaintext is
///   not UTF-8
/// - `Authentication`: the tag does not verify (wrong key or tampering)
pub fn decrypt(envelope: &EncryptedEnvelope, key: &RoomKey) -> Result<String, CipherError> {
    let iv: [u8; IV_SIZE] = hex::decode_array(&envelope.iv_hex)?;
    let ciphertext = hex::decode(&envelope.cipher_hex)?;

    let cipher = Aes256Gcm::new(key.as_bytes().into());
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&iv), ciphertext.as_slice())
        .map_err(|_| CipherError::Authentication)?;

    String::from_utf8(plaintext)
        .map_err(|e| CipherError::Format { reason: format!("plaintext is not UTF-8: {e}") })
}
