//! Directory protocol message definitions.

use serde::{Deserialize, Serialize};
use shallot_crypto::{CryptoError, PublicKey, codec};
use shallot_transport::{RequestError, TransportResult, WireError, message};

/// Relay identifier
pub type NodeId = u32;

/// A registered relay: its id and encoded public key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RelayRecord {
    /// Relay id, unique within the directory
    pub node_id: NodeId,
    /// Base64 X25519 public key
    #[serde(rename = "pubKey")]
    pub public_key: String,
}

impl RelayRecord {
    /// Build a record from a decoded key.
    #[must_use]
    pub fn new(node_id: NodeId, public_key: &PublicKey) -> Self {
        Self {
            node_id,
            public_key: codec::encode_public_key(public_key),
        }
    }

    /// Decode the announced public key.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::KeyFormat` if the key text is not a valid key.
    pub fn decode_public_key(&self) -> Result<PublicKey, CryptoError> {
        codec::decode_public_key(&self.public_key)
    }
}

/// Registry snapshot, in registration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeRegistry {
    /// Registered relays
    pub nodes: Vec<RelayRecord>,
}

/// Requests understood by the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "body", rename_all = "camelCase")]
pub enum DirectoryRequest {
    /// Liveness probe
    Status,
    /// Announce a relay
    RegisterNode(RelayRecord),
    /// Fetch every registered relay
    GetNodeRegistry,
}

impl DirectoryRequest {
    /// Operation names, as they appear on the wire
    pub const OPS: &'static [&'static str] = &["status", "registerNode", "getNodeRegistry"];

    /// Decode a request datagram.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::Unsupported` for unknown operations and
    /// `RequestError::Malformed` for anything that fails schema validation.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RequestError> {
        message::decode_request(bytes, Self::OPS)
    }

    /// Encode as a datagram.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Serialization` if encoding fails.
    pub fn to_bytes(&self) -> TransportResult<Vec<u8>> {
        message::encode(self)
    }

    /// Get the operation name
    #[must_use]
    pub fn op(&self) -> &'static str {
        match self {
            DirectoryRequest::Status => "status",
            DirectoryRequest::RegisterNode(_) => "registerNode",
            DirectoryRequest::GetNodeRegistry => "getNodeRegistry",
        }
    }
}

/// Directory responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "body", rename_all = "camelCase")]
pub enum DirectoryResponse {
    /// Directory is up
    Live,
    /// Registration accepted
    Registered,
    /// Registry snapshot
    Registry(NodeRegistry),
    /// Request failed
    Error(WireError),
}

impl DirectoryResponse {
    /// Encode as a datagram.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Serialization` if encoding fails.
    pub fn to_bytes(&self) -> TransportResult<Vec<u8>> {
        message::encode(self)
    }

    /// Get the response kind name
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            DirectoryResponse::Live => "live",
            DirectoryResponse::Registered => "registered",
            DirectoryResponse::Registry(_) => "registry",
            DirectoryResponse::Error(_) => "error",
        }
    }
}
