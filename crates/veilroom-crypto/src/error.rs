//! Cipher error types

use thiserror::Error;

/// Errors from decoding or opening an encrypted envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CipherError {
    /// Input is not well-formed: bad hex, odd length, wrong IV or key size,
    /// or a plaintext that is not UTF-8.
    #[error("malformed input: {reason}")]
    Format {
        /// Human-readable description of the problem
        reason: String,
    },

    /// The GCM tag did not verify. Either the key is wrong or the ciphertext
    /// or IV were modified.
    #[error("authentication failed: wrong key or tampered ciphertext")]
    Authentication,
}

impl CipherError {
    pub(crate) fn format(reason: impl Into<String>) -> Self {
        Self::Format { reason: reason.into() }
    }

    /// Whether this error signals a wrong key or tampering.
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication)
    }
}
