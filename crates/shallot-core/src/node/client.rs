//! Client for querying relay and user services.

use crate::address::Address;
use crate::config::UserId;
use crate::error::{Error, Result};
use crate::node::protocol::{NodeRequest, NodeResponse, SendMessageBody};
use shallot_discovery::NodeId;
use shallot_transport::DatagramClient;
use std::net::SocketAddr;
use std::time::Duration;

/// Queries running nodes. Used by the CLI and tests.
#[derive(Debug, Clone, Default)]
pub struct NodeClient {
    transport: DatagramClient,
}

impl NodeClient {
    /// Create a client with a custom request timeout.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            transport: DatagramClient::new(timeout),
        }
    }

    /// Send a raw request.
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` if the node does not answer and
    /// `Error::Remote` if it answers with an error.
    pub async fn request(&self, addr: SocketAddr, request: &NodeRequest) -> Result<NodeResponse> {
        match self.transport.call(addr, request).await? {
            NodeResponse::Error(wire) => Err(Error::Remote(wire)),
            response => Ok(response),
        }
    }

    /// Check that a node is up.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn status(&self, addr: SocketAddr) -> Result<()> {
        match self.request(addr, &NodeRequest::Status).await? {
            NodeResponse::Live => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    /// Ask the user at `addr` to send `message` to `destination`.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request); the remote error carries the user's
    /// failure, such as `insufficientRelays` or `deliveryFailed`.
    pub async fn send_message(
        &self,
        addr: SocketAddr,
        message: &str,
        destination: UserId,
    ) -> Result<()> {
        let request = NodeRequest::SendMessage(SendMessageBody {
            message: message.to_string(),
            destination_user_id: destination,
        });
        match self.request(addr, &request).await? {
            NodeResponse::Success => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    /// Relay: last onion received.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn last_received_encrypted(&self, addr: SocketAddr) -> Result<Option<String>> {
        self.text(addr, NodeRequest::GetLastReceivedEncryptedMessage).await
    }

    /// Relay: payload of the last successful peel.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn last_received_decrypted(&self, addr: SocketAddr) -> Result<Option<String>> {
        self.text(addr, NodeRequest::GetLastReceivedDecryptedMessage).await
    }

    /// Relay: next hop of the last successful peel.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn last_destination(&self, addr: SocketAddr) -> Result<Option<Address>> {
        match self.request(addr, &NodeRequest::GetLastMessageDestination).await? {
            NodeResponse::Destination(destination) => Ok(destination),
            other => Err(unexpected(&other)),
        }
    }

    /// User: last message received.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn last_received_message(&self, addr: SocketAddr) -> Result<Option<String>> {
        self.text(addr, NodeRequest::GetLastReceivedMessage).await
    }

    /// User: last message sent.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn last_sent_message(&self, addr: SocketAddr) -> Result<Option<String>> {
        self.text(addr, NodeRequest::GetLastSentMessage).await
    }

    /// User: relays of the last circuit, entry first.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn last_circuit(&self, addr: SocketAddr) -> Result<Vec<NodeId>> {
        match self.request(addr, &NodeRequest::GetLastCircuit).await? {
            NodeResponse::Circuit(ids) => Ok(ids),
            other => Err(unexpected(&other)),
        }
    }

    async fn text(&self, addr: SocketAddr, request: NodeRequest) -> Result<Option<String>> {
        match self.request(addr, &request).await? {
            NodeResponse::Text(text) => Ok(text),
            other => Err(unexpected(&other)),
        }
    }
}

fn unexpected(response: &NodeResponse) -> Error {
    Error::Remote(shallot_transport::WireError::new(
        shallot_transport::ErrorCode::Internal,
        format!("unexpected {} response", response.kind()),
    ))
}
