//! Directory errors.

use crate::protocol::NodeId;
use shallot_crypto::CryptoError;
use shallot_transport::{ErrorCode, TransportError, WireError};

/// Errors raised by the directory and its clients
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// A relay with this id is already registered
    #[error("relay {node_id} is already registered")]
    RegistrationConflict {
        /// Conflicting id
        node_id: NodeId,
    },

    /// The announced public key does not decode
    #[error("invalid relay key: {0}")]
    InvalidKey(#[from] CryptoError),

    /// The directory refused the request
    #[error("directory rejected request: {0}")]
    Rejected(WireError),

    /// The directory answered with a response of the wrong kind
    #[error("unexpected directory response: {0}")]
    UnexpectedResponse(&'static str),

    /// The directory could not be reached
    #[error("directory unreachable: {0}")]
    Transport(#[from] TransportError),
}

impl DirectoryError {
    /// Wire code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            DirectoryError::RegistrationConflict { .. } => ErrorCode::RegistrationConflict,
            DirectoryError::InvalidKey(_) => ErrorCode::Malformed,
            DirectoryError::Rejected(wire) => wire.code,
            DirectoryError::UnexpectedResponse(_) | DirectoryError::Transport(_) => {
                ErrorCode::Internal
            }
        }
    }

    /// Wire form of this error.
    #[must_use]
    pub fn to_wire(&self) -> WireError {
        match self {
            DirectoryError::Rejected(wire) => wire.clone(),
            other => WireError::new(other.code(), other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_code() {
        let err = DirectoryError::RegistrationConflict { node_id: 2 };
        assert_eq!(err.code(), ErrorCode::RegistrationConflict);
        assert_eq!(err.to_string(), "relay 2 is already registered");
    }

    #[test]
    fn test_rejected_keeps_remote_code() {
        let wire = WireError::new(ErrorCode::Unsupported, "nope");
        let err = DirectoryError::Rejected(wire.clone());
        assert_eq!(err.to_wire(), wire);
    }

    #[test]
    fn test_invalid_key_is_malformed() {
        let err = DirectoryError::from(CryptoError::KeyFormat("bad base64".into()));
        assert_eq!(err.code(), ErrorCode::Malformed);
    }
}
