//! # Shallot Crypto
//!
//! Cryptographic primitives for the shallot onion-routing overlay.
//!
//! This crate provides:
//! - X25519 relay key pairs
//! - A text codec for public, private and symmetric keys
//! - Sealed envelopes: fixed-size asymmetric encryption of short payloads
//! - `XChaCha20-Poly1305` payload encryption with a fresh nonce per message
//!
//! ## Cryptographic Suite
//!
//! | Function | Algorithm | Security Level |
//! |----------|-----------|----------------|
//! | Relay keys | X25519 | 128-bit |
//! | Envelope | X25519 ECDH + BLAKE3 KDF + XChaCha20-Poly1305 | 128-bit |
//! | Payload | XChaCha20-Poly1305 | 256-bit key |
//! | KDF | keyed BLAKE3 | 128-bit |
//! | Text encoding | base64 (standard, padded) | N/A |
//!
//! ## Hybrid Encryption
//!
//! Each onion layer pairs a fresh [`SymmetricKey`] (bulk payload) with a
//! sealed [`envelope`] carrying that key to the relay holding the matching
//! [`PrivateKey`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod codec;
pub mod envelope;
pub mod error;
pub mod hash;
pub mod keys;
pub mod symmetric;

pub use error::CryptoError;
pub use keys::{KeyPair, PrivateKey, PublicKey};
pub use symmetric::SymmetricKey;

/// X25519 public key size
pub const X25519_PUBLIC_KEY_SIZE: usize = 32;

/// X25519 secret key size
pub const X25519_SECRET_KEY_SIZE: usize = 32;

/// XChaCha20-Poly1305 key size
pub const XCHACHA_KEY_SIZE: usize = 32;

/// XChaCha20-Poly1305 nonce size
pub const XCHACHA_NONCE_SIZE: usize = 24;

/// Poly1305 authentication tag size
pub const TAG_SIZE: usize = 16;
