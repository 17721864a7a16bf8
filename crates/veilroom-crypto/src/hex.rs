//! Hex codec for keys, IVs and ciphertext.
//!
//! Decoding trims surrounding whitespace and accepts either case. Encoding
//! always produces lowercase, so `encode(decode(s)) == normalize(s)` for every
//! valid `s`.

use crate::CipherError;

/// Decode a hex string into bytes.
///
/// Whitespace-only input decodes to an empty buffer.
///
/// # Errors
///
/// - `Format` if the trimmed input has odd length or contains a non-hex
///   character
pub fn decode(input: &str) -> Result<Vec<u8>, CipherError> {
    let trimmed = input.trim();
    if trimmed.len() % 2 != 0 {
        return Err(CipherError::format(format!("odd hex length {}", trimmed.len())));
    }

    ::hex::decode(trimmed).map_err(|e| CipherError::format(format!("invalid hex: {e}")))
}

/// Decode a hex string that must describe exactly `N` bytes.
///
/// # Errors
///
/// - `Format` if the input is not valid hex or decodes to a different length
pub fn decode_array<const N: usize>(input: &str) -> Result<[u8; N], CipherError> {
    let bytes = decode(input)?;
    let actual = bytes.len();
    bytes
        .try_into()
        .map_err(|_| CipherError::format(format!("expected {N} bytes, got {actual}")))
}

/// Encode bytes as lowercase hex.
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    ::hex::encode(bytes)
}

/// Canonical form of a hex string: trimmed and lowercased.
pub fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase()
}
