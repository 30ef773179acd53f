//! Text codec for keys and ciphertexts.
//!
//! Keys travel inside JSON bodies, so every binary value is carried as
//! standard padded base64. Encoding is deterministic and decoding rejects
//! anything that is not exactly the expected key length.

use crate::keys::{PrivateKey, PublicKey};
use crate::symmetric::{KEY_SIZE, SymmetricKey};
use crate::{CryptoError, X25519_PUBLIC_KEY_SIZE, X25519_SECRET_KEY_SIZE};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use zeroize::Zeroize;

/// Encode arbitrary bytes as transport-safe text.
#[must_use]
pub fn encode_bytes(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode transport-safe text back into bytes.
///
/// Returns `None` if `text` is not canonical padded base64.
#[must_use]
pub fn decode_bytes(text: &str) -> Option<Vec<u8>> {
    STANDARD.decode(text).ok()
}

/// Length of the text encoding of `len` bytes.
#[must_use]
pub const fn encoded_len(len: usize) -> usize {
    len.div_ceil(3) * 4
}

/// Encode a public key.
#[must_use]
pub fn encode_public_key(key: &PublicKey) -> String {
    encode_bytes(key.as_bytes())
}

/// Encode a private key, if one is held.
#[must_use]
pub fn encode_private_key(key: Option<&PrivateKey>) -> Option<String> {
    key.map(|key| {
        let mut bytes = key.to_bytes();
        let text = encode_bytes(&bytes);
        bytes.zeroize();
        text
    })
}

/// Encode a symmetric key.
#[must_use]
pub fn encode_symmetric_key(key: &SymmetricKey) -> String {
    encode_bytes(key.as_bytes())
}

/// Decode a public key.
///
/// # Errors
///
/// Returns `CryptoError::KeyFormat` if `text` is not base64 of 32 bytes.
pub fn decode_public_key(text: &str) -> Result<PublicKey, CryptoError> {
    let bytes = decode_fixed::<X25519_PUBLIC_KEY_SIZE>(text, "public key")?;
    Ok(PublicKey::from_bytes(bytes))
}

/// Decode a private key.
///
/// # Errors
///
/// Returns `CryptoError::KeyFormat` if `text` is not base64 of 32 bytes.
pub fn decode_private_key(text: &str) -> Result<PrivateKey, CryptoError> {
    let mut bytes = decode_fixed::<X25519_SECRET_KEY_SIZE>(text, "private key")?;
    let key = PrivateKey::from_bytes(bytes);
    bytes.zeroize();
    Ok(key)
}

/// Decode a symmetric key.
///
/// # Errors
///
/// Returns `CryptoError::KeyFormat` if `text` is not base64 of 32 bytes.
pub fn decode_symmetric_key(text: &str) -> Result<SymmetricKey, CryptoError> {
    let mut bytes = decode_fixed::<KEY_SIZE>(text, "symmetric key")?;
    let key = SymmetricKey::new(bytes);
    bytes.zeroize();
    Ok(key)
}

fn decode_fixed<const N: usize>(text: &str, what: &str) -> Result<[u8; N], CryptoError> {
    let mut decoded = STANDARD
        .decode(text)
        .map_err(|e| CryptoError::KeyFormat(format!("{what}: {e}")))?;

    let result = <[u8; N]>::try_from(decoded.as_slice()).map_err(|_| {
        CryptoError::KeyFormat(format!(
            "{what}: expected {N} bytes, got {}",
            decoded.len()
        ))
    });
    decoded.zeroize();
    result
}
