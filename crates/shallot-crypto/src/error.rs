//! Cryptographic error types.

use thiserror::Error;

/// Cryptographic errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Encoded key is not valid text or has the wrong length
    #[error("malformed key: {0}")]
    KeyFormat(String),

    /// Plaintext does not fit the envelope
    #[error("plaintext too large: capacity {capacity} bytes, got {actual}")]
    PlaintextTooLarge {
        /// Maximum plaintext size
        capacity: usize,
        /// Actual plaintext size
        actual: usize,
    },

    /// Encryption failed (e.g. low-order recipient key)
    #[error("encryption failed")]
    EncryptionFailed,

    /// Decryption failed (authentication failure or wrong key)
    #[error("decryption failed: authentication failure")]
    DecryptionFailed,

    /// Ciphertext is shorter than its fixed-size framing
    #[error("ciphertext too short: expected at least {minimum}, got {actual}")]
    CiphertextTooShort {
        /// Minimum acceptable length
        minimum: usize,
        /// Actual length
        actual: usize,
    },
}

impl CryptoError {
    /// Whether this error means a ciphertext could not be opened.
    #[must_use]
    pub fn is_decryption_failure(&self) -> bool {
        matches!(
            self,
            CryptoError::DecryptionFailed | CryptoError::CiphertextTooShort { .. }
        )
    }

    /// Whether this error was raised while producing a ciphertext.
    #[must_use]
    pub fn is_encryption_failure(&self) -> bool {
        matches!(
            self,
            CryptoError::EncryptionFailed | CryptoError::PlaintextTooLarge { .. }
        )
    }
}
