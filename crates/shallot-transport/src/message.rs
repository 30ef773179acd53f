//! JSON message conventions shared by every shallot service.
//!
//! Requests are adjacently tagged objects, `{"op": "...", "body": {...}}`.
//! Failures travel as a [`WireError`] carrying a closed [`ErrorCode`], so a
//! caller can reconstruct the error kind on its side of the socket.

use crate::transport::{TransportError, TransportResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error kinds that can cross the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    /// Request body failed schema validation
    Malformed,
    /// Operation not offered by this service
    Unsupported,
    /// Encoded key could not be decoded
    KeyFormat,
    /// Encryption input exceeded capacity
    EncryptionFailed,
    /// Layer could not be decrypted or parsed
    DecryptionFailed,
    /// Directory holds fewer relays than the circuit needs
    InsufficientRelays,
    /// Relay id already registered
    RegistrationConflict,
    /// Next hop unreachable or rejected the payload
    DeliveryFailed,
    /// Anything else
    Internal,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::Malformed => "malformed",
            ErrorCode::Unsupported => "unsupported",
            ErrorCode::KeyFormat => "keyFormat",
            ErrorCode::EncryptionFailed => "encryptionFailed",
            ErrorCode::DecryptionFailed => "decryptionFailed",
            ErrorCode::InsufficientRelays => "insufficientRelays",
            ErrorCode::RegistrationConflict => "registrationConflict",
            ErrorCode::DeliveryFailed => "deliveryFailed",
            ErrorCode::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Error body returned by a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WireError {
    /// Error kind
    pub code: ErrorCode,
    /// Human-readable detail
    pub message: String,
}

impl WireError {
    /// Create a wire error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Why an inbound request was refused before dispatch
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// The `op` names an operation this service does not offer
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// The datagram is not a well-formed request
    #[error("malformed request: {0}")]
    Malformed(String),
}

impl RequestError {
    /// Wire form of this refusal.
    #[must_use]
    pub fn to_wire(&self) -> WireError {
        match self {
            RequestError::Unsupported(_) => WireError::new(ErrorCode::Unsupported, self.to_string()),
            RequestError::Malformed(_) => WireError::new(ErrorCode::Malformed, self.to_string()),
        }
    }
}

/// Decode a tagged request, distinguishing unknown operations from bad bodies.
///
/// `ops` lists the operation names the service understands.
///
/// # Errors
///
/// Returns [`RequestError::Unsupported`] when the datagram is an object whose
/// `op` string is not in `ops`, and [`RequestError::Malformed`] otherwise.
pub fn decode_request<T: DeserializeOwned>(bytes: &[u8], ops: &[&str]) -> Result<T, RequestError> {
    match serde_json::from_slice::<T>(bytes) {
        Ok(request) => Ok(request),
        Err(err) => {
            let op = serde_json::from_slice::<serde_json::Value>(bytes)
                .ok()
                .and_then(|value| value.get("op")?.as_str().map(str::to_owned));

            match op {
                Some(op) if !ops.contains(&op.as_str()) => Err(RequestError::Unsupported(op)),
                _ => Err(RequestError::Malformed(err.to_string())),
            }
        }
    }
}

/// Serialize a message to its datagram form.
///
/// # Errors
///
/// Returns `TransportError::Serialization` if the value cannot be encoded.
pub fn encode<T: Serialize + ?Sized>(message: &T) -> TransportResult<Vec<u8>> {
    serde_json::to_vec(message).map_err(|e| TransportError::Serialization(e.to_string()))
}

/// Deserialize a message from its datagram form.
///
/// # Errors
///
/// Returns `TransportError::Deserialization` if the bytes do not decode as `T`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> TransportResult<T> {
    serde_json::from_slice(bytes).map_err(|e| TransportError::Deserialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "op", content = "body", rename_all = "camelCase")]
    enum Request {
        Status,
        Echo(EchoBody),
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct EchoBody {
        text: String,
    }

    const OPS: &[&str] = &["status", "echo"];

    #[test]
    fn test_decode_unit_op_without_body() {
        let request: Request = decode_request(br#"{"op":"status"}"#, OPS).unwrap();
        assert_eq!(request, Request::Status);
    }

    #[test]
    fn test_decode_op_with_body() {
        let request: Request =
            decode_request(br#"{"op":"echo","body":{"text":"hi"}}"#, OPS).unwrap();
        assert_eq!(
            request,
            Request::Echo(EchoBody {
                text: "hi".to_string()
            })
        );
    }

    #[test]
    fn test_unknown_op_is_unsupported() {
        let err = decode_request::<Request>(br#"{"op":"shutdown"}"#, OPS).unwrap_err();
        assert_eq!(err, RequestError::Unsupported("shutdown".to_string()));
        assert_eq!(err.to_wire().code, ErrorCode::Unsupported);
    }

    #[test]
    fn test_bad_body_is_malformed() {
        let err = decode_request::<Request>(br#"{"op":"echo","body":{"txt":"hi"}}"#, OPS)
            .unwrap_err();
        assert!(matches!(err, RequestError::Malformed(_)));

        let err = decode_request::<Request>(b"\xff\x00", OPS).unwrap_err();
        assert!(matches!(err, RequestError::Malformed(_)));
    }

    #[test]
    fn test_wire_error_shape() {
        let err = WireError::new(ErrorCode::RegistrationConflict, "node 3 already registered");
        let json = String::from_utf8(encode(&err).unwrap()).unwrap();
        assert_eq!(
            json,
            r#"{"code":"registrationConflict","message":"node 3 already registered"}"#
        );
        assert_eq!(decode::<WireError>(json.as_bytes()).unwrap(), err);
    }

    #[test]
    fn test_error_code_display_matches_serde() {
        for code in [
            ErrorCode::Malformed,
            ErrorCode::DecryptionFailed,
            ErrorCode::DeliveryFailed,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{code}\""));
        }
    }
}
