//! Fuzz target for the hybrid cipher
//!
//! Tests that the symmetric and sealed-envelope paths handle arbitrary input.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shallot_crypto::{PrivateKey, SymmetricKey, envelope};

#[derive(Debug, Arbitrary)]
struct CryptoInput {
    key: [u8; 32],
    secret: [u8; 32],
    plaintext: Vec<u8>,
    ciphertext: Vec<u8>,
}

fuzz_target!(|input: CryptoInput| {
    let key = SymmetricKey::new(input.key);

    if let Ok(ciphertext) = key.encrypt(&input.plaintext) {
        assert_eq!(key.decrypt(&ciphertext).ok(), Some(input.plaintext.clone()));
    }
    let _ = key.decrypt(&input.ciphertext);

    let private = PrivateKey::from_bytes(input.secret);
    let public = private.public_key();
    match envelope::encrypt(&input.plaintext, &public) {
        Ok(sealed) => {
            assert_eq!(envelope::decrypt(&sealed, &private).ok(), Some(input.plaintext));
        }
        Err(_) => assert!(input.plaintext.len() > envelope::ENVELOPE_CAPACITY),
    }
    let _ = envelope::decrypt(&input.ciphertext, &private);
});
