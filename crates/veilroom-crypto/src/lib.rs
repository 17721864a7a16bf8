//! Veilroom Cryptographic Primitives
//!
//! Field-level encryption for room chat. Every author name and message body is
//! sealed with AES-256-GCM under a single room key that never leaves the
//! client. Functions are pure: callers provide the IV bytes, which keeps
//! encryption deterministic under test.
//!
//! # Wire Form
//!
//! ```text
//! plaintext ──AES-256-GCM(room key, 12-byte IV)──► ciphertext ‖ 16-byte tag
//!                                                       │
//!                                                       ▼
//!                                  EncryptedEnvelope { cipher_hex, iv_hex }
//! ```
//!
//! Both halves of an envelope travel as lowercase hex. A message on the wire
//! carries two envelopes (author and body).
//!
//! # Security
//!
//! - IVs MUST be fresh random bytes per encryption; reuse under one key breaks
//!   GCM confidentiality and authenticity
//! - A tag mismatch is reported as [`CipherError::Authentication`] and never
//!   as a format problem, so callers can tell a wrong key (or tampering) apart
//!   from a malformed row
//! - [`RoomKey`] zeroizes its bytes on drop and redacts itself in `Debug`

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod envelope;
mod error;
pub mod hex;
mod key;

pub use envelope::{EncryptedEnvelope, IV_SIZE, TAG_SIZE, decrypt, encrypt};
pub use error::CipherError;
pub use key::{KEY_SIZE, RoomKey};
