//! Sealed envelopes: asymmetric encryption of short payloads.
//!
//! An envelope carries one onion layer's symmetric key to the relay that
//! owns `recipient`. A fresh ephemeral X25519 key is generated per
//! envelope; the ECDH secret is expanded with BLAKE3 into an
//! `XChaCha20-Poly1305` key and nonce.
//!
//! The plaintext is padded into a fixed block so every envelope has the
//! same length regardless of what it carries:
//!
//! ```text
//! +---------------------+------------------------------------------+-----------+
//! | Ephemeral PK (32B)  | Block: len (1B) | data | zero pad (64B) | Tag (16B) |
//! +---------------------+------------------------------------------+-----------+
//! ```
//!
//! Envelopes are for key-sized material only; bulk data belongs in
//! [`crate::symmetric`].

use crate::hash::Kdf;
use crate::keys::{PrivateKey, PublicKey};
use crate::symmetric::{NONCE_SIZE, Nonce, SymmetricKey, TAG_SIZE};
use crate::{CryptoError, X25519_PUBLIC_KEY_SIZE};
use rand_core::{CryptoRng, OsRng, RngCore};
use zeroize::Zeroize;

/// Padded plaintext block size.
const BLOCK_SIZE: usize = 64;

/// Largest plaintext an envelope can carry.
pub const ENVELOPE_CAPACITY: usize = BLOCK_SIZE - 1;

/// Length of every envelope.
pub const ENVELOPE_SIZE: usize = X25519_PUBLIC_KEY_SIZE + BLOCK_SIZE + TAG_SIZE;

const KDF_CONTEXT: &str = "shallot-envelope-v1";

/// Seal `plaintext` for `recipient` using `OsRng`.
///
/// # Errors
///
/// Returns `CryptoError::PlaintextTooLarge` if `plaintext` exceeds
/// [`ENVELOPE_CAPACITY`], and `CryptoError::EncryptionFailed` if `recipient`
/// is a low-order point.
pub fn encrypt(plaintext: &[u8], recipient: &PublicKey) -> Result<Vec<u8>, CryptoError> {
    encrypt_with_rng(&mut OsRng, plaintext, recipient)
}

/// Seal `plaintext` for `recipient` with an ephemeral key drawn from `rng`.
///
/// # Errors
///
/// See [`encrypt`].
pub fn encrypt_with_rng<R: RngCore + CryptoRng>(
    rng: &mut R,
    plaintext: &[u8],
    recipient: &PublicKey,
) -> Result<Vec<u8>, CryptoError> {
    if plaintext.len() > ENVELOPE_CAPACITY {
        return Err(CryptoError::PlaintextTooLarge {
            capacity: ENVELOPE_CAPACITY,
            actual: plaintext.len(),
        });
    }

    let ephemeral = PrivateKey::generate(rng);
    let ephemeral_public = ephemeral.public_key();
    let shared = ephemeral
        .exchange(recipient)
        .ok_or(CryptoError::EncryptionFailed)?;

    let (key, nonce) = derive_envelope_key(shared.as_bytes(), &ephemeral_public, recipient);

    let mut block = [0u8; BLOCK_SIZE];
    block[0] = plaintext.len() as u8;
    block[1..=plaintext.len()].copy_from_slice(plaintext);

    let sealed = key.seal(&nonce, &block, ephemeral_public.as_bytes());
    block.zeroize();
    let sealed = sealed?;

    let mut envelope = Vec::with_capacity(ENVELOPE_SIZE);
    envelope.extend_from_slice(ephemeral_public.as_bytes());
    envelope.extend_from_slice(&sealed);
    debug_assert_eq!(envelope.len(), ENVELOPE_SIZE);
    Ok(envelope)
}

/// Open an envelope with the recipient's private key.
///
/// # Errors
///
/// Returns `CryptoError::CiphertextTooShort` if `envelope` is truncated and
/// `CryptoError::DecryptionFailed` if it was not sealed for this key or was
/// modified in transit.
pub fn decrypt(envelope: &[u8], recipient: &PrivateKey) -> Result<Vec<u8>, CryptoError> {
    if envelope.len() < ENVELOPE_SIZE {
        return Err(CryptoError::CiphertextTooShort {
            minimum: ENVELOPE_SIZE,
            actual: envelope.len(),
        });
    }
    if envelope.len() != ENVELOPE_SIZE {
        return Err(CryptoError::DecryptionFailed);
    }

    let (ephemeral_bytes, sealed) = envelope.split_at(X25519_PUBLIC_KEY_SIZE);
    let ephemeral_public = PublicKey::from_bytes(
        ephemeral_bytes
            .try_into()
            .map_err(|_| CryptoError::DecryptionFailed)?,
    );
    let shared = recipient
        .exchange(&ephemeral_public)
        .ok_or(CryptoError::DecryptionFailed)?;

    let (key, nonce) =
        derive_envelope_key(shared.as_bytes(), &ephemeral_public, &recipient.public_key());

    let mut block = key.open(&nonce, sealed, ephemeral_public.as_bytes())?;
    let len = usize::from(block[0]);
    let result = if len <= ENVELOPE_CAPACITY {
        Ok(block[1..=len].to_vec())
    } else {
        Err(CryptoError::DecryptionFailed)
    };
    block.zeroize();
    result
}

/// Expand the ECDH secret into a one-time key and nonce bound to both public keys.
fn derive_envelope_key(
    shared: &[u8; 32],
    ephemeral: &PublicKey,
    recipient: &PublicKey,
) -> (SymmetricKey, Nonce) {
    let mut ikm = [0u8; 96];
    ikm[..32].copy_from_slice(shared);
    ikm[32..64].copy_from_slice(ephemeral.as_bytes());
    ikm[64..].copy_from_slice(recipient.as_bytes());

    let mut okm = [0u8; 32 + NONCE_SIZE];
    Kdf::new(KDF_CONTEXT).derive(&ikm, &mut okm);

    let mut key_bytes = [0u8; 32];
    key_bytes.copy_from_slice(&okm[..32]);
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    nonce_bytes.copy_from_slice(&okm[32..]);

    ikm.zeroize();
    okm.zeroize();
    let key = SymmetricKey::new(key_bytes);
    key_bytes.zeroize();

    (key, Nonce::from_bytes(nonce_bytes))
}
