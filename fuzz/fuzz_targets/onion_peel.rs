//! Fuzz target for layer peeling
//!
//! Arbitrary text handed to a relay must be rejected, never panic.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shallot_core::{Address, peel};
use shallot_crypto::PrivateKey;

#[derive(Debug, Arbitrary)]
struct PeelInput {
    secret: [u8; 32],
    onion: String,
}

fuzz_target!(|input: PeelInput| {
    let key = PrivateKey::from_bytes(input.secret);
    let _ = peel(&input.onion, &key);

    // The address prefix parser sees every decrypted layer
    let _ = Address::split_prefix(&input.onion);
});
