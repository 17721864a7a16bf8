//! Fuzz target for envelope decryption
//!
//! # Strategy
//!
//! - Random hex strings for ciphertext and IV (wrong lengths, bad digits)
//! - Bit flips in a valid envelope
//!
//! # Invariants
//!
//! - NEVER panic on malformed envelopes
//! - A modified envelope never decrypts to a different plaintext

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use veilroom_crypto::{EncryptedEnvelope, IV_SIZE, KEY_SIZE, RoomKey, decrypt, encrypt, hex};

#[derive(Debug, Arbitrary)]
enum Input {
    Raw { cipher_hex: String, iv_hex: String },
    Flip { plaintext: String, iv: [u8; IV_SIZE], byte: usize, bit: u8 },
}

fuzz_target!(|input: Input| {
    let key = RoomKey::from_bytes([0x5a; KEY_SIZE]);

    match input {
        Input::Raw { cipher_hex, iv_hex } => {
            let _ = decrypt(&EncryptedEnvelope { cipher_hex, iv_hex }, &key);
        },
        Input::Flip { plaintext, iv, byte, bit } => {
            let envelope = encrypt(&plaintext, &key, iv);
            let Ok(mut bytes) = hex::decode(&envelope.cipher_hex) else {
                return;
            };
            let index = byte % bytes.len();
            bytes[index] ^= 1 << (bit % 8);

            let tampered = EncryptedEnvelope { cipher_hex: hex::encode(&bytes), iv_hex: envelope.iv_hex };
            assert!(decrypt(&tampered, &key).is_err());
        },
    }
});
