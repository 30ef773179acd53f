//! Relay and user service protocol.

use crate::address::Address;
use crate::config::UserId;
use serde::{Deserialize, Serialize};
use shallot_discovery::NodeId;
use shallot_transport::{RequestError, TransportResult, WireError, message};
use std::time::Duration;

/// `{message}` body, the only thing a hop ever receives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MessageBody {
    /// Onion for a relay, plaintext for a user inbox
    pub message: String,
    /// How long the caller waits for the answer, in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl MessageBody {
    /// Body without a budget.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timeout_ms: None,
        }
    }

    /// Tell the receiver how long the caller waits.
    #[must_use]
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(budget.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Caller's budget, if it sent one.
    #[must_use]
    pub fn budget(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Body of a send request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SendMessageBody {
    /// Plaintext to send
    pub message: String,
    /// Recipient user
    pub destination_user_id: UserId,
}

/// Requests understood by relay and user services
///
/// Each service answers the subset that applies to it and refuses the rest
/// with `unsupported`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "body", rename_all = "camelCase")]
pub enum NodeRequest {
    /// Liveness probe
    Status,
    /// Deliver a payload: peel and forward on a relay, store on a user
    Message(MessageBody),
    /// Ask a user to send a message (user only)
    SendMessage(SendMessageBody),
    /// Relay only
    GetLastReceivedEncryptedMessage,
    /// Relay only
    GetLastReceivedDecryptedMessage,
    /// Relay only
    GetLastMessageDestination,
    /// User only
    GetLastReceivedMessage,
    /// User only
    GetLastSentMessage,
    /// User only
    GetLastCircuit,
}

impl NodeRequest {
    /// Operation names, as they appear on the wire
    pub const OPS: &'static [&'static str] = &[
        "status",
        "message",
        "sendMessage",
        "getLastReceivedEncryptedMessage",
        "getLastReceivedDecryptedMessage",
        "getLastMessageDestination",
        "getLastReceivedMessage",
        "getLastSentMessage",
        "getLastCircuit",
    ];

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
            NodeRequest::Status => "status",
            NodeRequest::Message(_) => "message",
            NodeRequest::SendMessage(_) => "sendMessage",
            NodeRequest::GetLastReceivedEncryptedMessage => "getLastReceivedEncryptedMessage",
            NodeRequest::GetLastReceivedDecryptedMessage => "getLastReceivedDecryptedMessage",
            NodeRequest::GetLastMessageDestination => "getLastMessageDestination",
            NodeRequest::GetLastReceivedMessage => "getLastReceivedMessage",
            NodeRequest::GetLastSentMessage => "getLastSentMessage",
            NodeRequest::GetLastCircuit => "getLastCircuit",
        }
    }

    /// Refusal for an operation this service does not offer.
    #[must_use]
    pub fn unsupported(&self, service: &str) -> NodeResponse {
        NodeResponse::Error(
            RequestError::Unsupported(format!("{} on {service}", self.op())).to_wire(),
        )
    }
}

/// Relay and user service responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "body", rename_all = "camelCase")]
pub enum NodeResponse {
    /// Service is up
    Live,
    /// Request carried out
    Success,
    /// Introspection text, `null` until set
    Text(Option<String>),
    /// Last forwarding destination, `null` until set
    Destination(Option<Address>),
    /// Relays of the last circuit, entry first
    Circuit(Vec<NodeId>),
    /// Request failed
    Error(WireError),
}

impl NodeResponse {
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
            NodeResponse::Live => "live",
            NodeResponse::Success => "success",
            NodeResponse::Text(_) => "text",
            NodeResponse::Destination(_) => "destination",
            NodeResponse::Circuit(_) => "circuit",
            NodeResponse::Error(_) => "error",
        }
    }
}

/// Fallback when a response cannot be encoded
pub(crate) const ENCODING_FAILED: &[u8] =
    br#"{"result":"error","body":{"code":"internal","message":"response encoding failed"}}"#;

/// Encode a response, falling back to a fixed internal error.
pub(crate) fn encode_response(response: &NodeResponse) -> Vec<u8> {
    response.to_bytes().unwrap_or_else(|e| {
        tracing::error!("failed to encode response: {e}");
        ENCODING_FAILED.to_vec()
    })
}
