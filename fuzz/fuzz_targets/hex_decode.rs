//! Fuzz target for the hex codec
//!
//! # Invariants
//!
//! - NEVER panic on arbitrary input
//! - Anything that decodes re-encodes to its normalized form
//! - Odd trimmed length is always rejected

#![no_main]

use libfuzzer_sys::fuzz_target;
use veilroom_crypto::hex;

fuzz_target!(|input: &str| {
    if let Ok(bytes) = hex::decode(input) {
        assert_eq!(hex::encode(&bytes), hex::normalize(input));
    }

    if input.trim().len() % 2 == 1 {
        assert!(hex::decode(input).is_err());
    }
});
