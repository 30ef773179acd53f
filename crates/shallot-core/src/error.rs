//! Error types for the shallot core.

use crate::address::Address;
use shallot_crypto::CryptoError;
use shallot_discovery::DirectoryError;
use shallot_transport::{ErrorCode, TransportError, WireError};
use thiserror::Error;

/// Core errors
#[derive(Debug, Error)]
pub enum Error {
    /// Cryptographic error
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// A layer decrypted but does not start with a routable address
    #[error("malformed layer: {0}")]
    MalformedLayer(String),

    /// Directory holds fewer distinct relays than the circuit needs
    #[error("insufficient relays: need {required}, directory has {available}")]
    InsufficientRelays {
        /// Circuit length
        required: usize,
        /// Distinct relays available
        available: usize,
    },

    /// An onion needs at least one hop
    #[error("circuit is empty")]
    EmptyCircuit,

    /// An id does not map to a port on this network
    #[error("id {id} is out of range for base port {base}")]
    AddressOutOfRange {
        /// Base port of the id range
        base: u16,
        /// Offending id
        id: u32,
    },

    /// Directory failure
    #[error("directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Next hop failure
    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// A node answered a query with an error
    #[error("node rejected request: {0}")]
    Remote(WireError),

    /// A node could not be queried
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Delivering a payload to the next address failed
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Nothing answered at the address
    #[error("{address} unreachable: {source}")]
    Unreachable {
        /// Target address
        address: Address,
        /// Transport failure
        #[source]
        source: TransportError,
    },

    /// The next hop answered with a failure
    #[error("{address} rejected payload: {error}")]
    Rejected {
        /// Target address
        address: Address,
        /// Failure reported by the next hop
        error: WireError,
    },
}

impl DeliveryError {
    /// Address that could not be delivered to.
    #[must_use]
    pub fn address(&self) -> Address {
        match self {
            DeliveryError::Unreachable { address, .. } | DeliveryError::Rejected { address, .. } => {
                *address
            }
        }
    }
}

impl Error {
    /// Wire code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Crypto(CryptoError::KeyFormat(_)) => ErrorCode::KeyFormat,
            Error::Crypto(e) if e.is_encryption_failure() => ErrorCode::EncryptionFailed,
            Error::Crypto(_) | Error::MalformedLayer(_) => ErrorCode::DecryptionFailed,
            Error::InsufficientRelays { .. } => ErrorCode::InsufficientRelays,
            Error::EmptyCircuit | Error::AddressOutOfRange { .. } => ErrorCode::Malformed,
            Error::Directory(e) => e.code(),
            Error::Delivery(_) => ErrorCode::DeliveryFailed,
            Error::Remote(wire) => wire.code,
            Error::Transport(_) => ErrorCode::Internal,
        }
    }

    /// Wire form of this error.
    #[must_use]
    pub fn to_wire(&self) -> WireError {
        match self {
            Error::Remote(wire) => wire.clone(),
            other => WireError::new(other.code(), other.to_string()),
        }
    }

    /// Whether this is a layer that failed to decrypt or parse.
    #[must_use]
    pub fn is_decryption_failure(&self) -> bool {
        self.code() == ErrorCode::DecryptionFailed
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;
