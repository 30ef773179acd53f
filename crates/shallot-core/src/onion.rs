//! Onion construction and peeling.
//!
//! An onion is text. Each layer is
//!
//! ```text
//! base64(envelope)   152 chars, the layer key sealed to the hop
//! base64(nonce || ciphertext || tag)
//! ```
//!
//! and the ciphertext decrypts to `Address || inner`, where `inner` is the
//! next onion, or the message itself on the last layer. Every hop runs the
//! same peel; nothing marks the final layer.

use crate::address::Address;
use crate::error::{Error, Result};
use rand_core::{CryptoRng, RngCore};
use shallot_crypto::envelope::{self, ENVELOPE_SIZE};
use shallot_crypto::{CryptoError, PrivateKey, PublicKey, SymmetricKey, codec};
use std::fmt;

/// Length of the sealed-key prefix of every layer
pub const SEALED_KEY_LEN: usize = codec::encoded_len(ENVELOPE_SIZE);

/// One relay of a circuit as seen by the sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
    /// Where the relay listens
    pub address: Address,
    /// Relay's public key
    pub public_key: PublicKey,
}

/// Layered ciphertext
#[derive(Clone, PartialEq, Eq)]
pub struct Onion(String);

impl Onion {
    /// Onion text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Unwrap onion text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Text length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the onion is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Onion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Onion({} chars)", self.0.len())
    }
}

/// Result of removing one layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeeledLayer {
    /// Where the payload goes next
    pub next_hop: Address,
    /// Inner onion, or the message on the last layer
    pub payload: String,
}

/// Wrap `message` for delivery to `destination` through `hops`.
///
/// `hops` is entry first. Layers are added from the exit inward, so the
/// entry relay's layer is outermost and each layer names the hop after it.
///
/// # Errors
///
/// Returns `Error::EmptyCircuit` if `hops` is empty, and `Error::Crypto` if
/// a hop's key cannot be encrypted to.
pub fn build_onion<R: RngCore + CryptoRng>(
    rng: &mut R,
    message: &str,
    destination: Address,
    hops: &[Hop],
) -> Result<Onion> {
    if hops.is_empty() {
        return Err(Error::EmptyCircuit);
    }

    let mut payload = message.to_string();
    let mut next_hop = destination;

    for hop in hops.iter().rev() {
        let layer_key = SymmetricKey::generate(rng);
        let inner = format!("{next_hop}{payload}");
        let ciphertext = layer_key.encrypt_with_rng(rng, inner.as_bytes())?;

        let encoded_key = codec::encode_symmetric_key(&layer_key);
        let sealed_key = envelope::encrypt_with_rng(rng, encoded_key.as_bytes(), &hop.public_key)?;

        payload = codec::encode_bytes(&sealed_key);
        payload.push_str(&codec::encode_bytes(&ciphertext));
        next_hop = hop.address;
    }

    Ok(Onion(payload))
}

/// Remove one layer with the relay's private key.
///
/// # Errors
///
/// Returns `Error::Crypto` with a decryption failure if the layer is
/// truncated, not base64, sealed to another key, or tampered with, and
/// `Error::MalformedLayer` if it decrypts to something without a valid
/// address prefix.
pub fn peel(onion: &str, private_key: &PrivateKey) -> Result<PeeledLayer> {
    let sealed_text = onion
        .get(..SEALED_KEY_LEN)
        .ok_or(CryptoError::CiphertextTooShort {
            minimum: SEALED_KEY_LEN,
            actual: onion.len(),
        })?;
    let payload_text = &onion[SEALED_KEY_LEN..];

    let sealed_key = codec::decode_bytes(sealed_text).ok_or(CryptoError::DecryptionFailed)?;
    let encoded_key = envelope::decrypt(&sealed_key, private_key)?;
    let layer_key = std::str::from_utf8(&encoded_key)
        .ok()
        .and_then(|text| codec::decode_symmetric_key(text).ok())
        .ok_or(CryptoError::DecryptionFailed)?;

    let ciphertext = codec::decode_bytes(payload_text).ok_or(CryptoError::DecryptionFailed)?;
    let inner = layer_key.decrypt(&ciphertext)?;

    let inner = String::from_utf8(inner)
        .map_err(|_| Error::MalformedLayer("layer is not UTF-8".to_string()))?;
    let (next_hop, payload) = Address::split_prefix(&inner)
        .ok_or_else(|| Error::MalformedLayer("layer has no routing address".to_string()))?;

    Ok(PeeledLayer {
        next_hop,
        payload: payload.to_string(),
    })
}
