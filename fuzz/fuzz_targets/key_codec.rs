//! Fuzz target for key text decoding

#![no_main]

use libfuzzer_sys::fuzz_target;
use shallot_crypto::codec;

fuzz_target!(|text: &str| {
    if let Ok(key) = codec::decode_public_key(text) {
        assert_eq!(codec::encode_public_key(&key), text);
    }
    let _ = codec::decode_private_key(text);
    let _ = codec::decode_symmetric_key(text);
    let _ = codec::decode_bytes(text);
});
