//! Directory client.

use crate::error::DirectoryError;
use crate::protocol::{DirectoryRequest, DirectoryResponse, RelayRecord};
use shallot_transport::{DatagramClient, ErrorCode};
use std::net::SocketAddr;
use std::time::Duration;

/// Talks to a directory service.
///
/// Every call is a single request/response exchange; nothing is retried.
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    addr: SocketAddr,
    transport: DatagramClient,
}

impl DirectoryClient {
    /// Create a client with the default request timeout.
    #[must_use]
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            transport: DatagramClient::default(),
        }
    }

    /// Create a client with a custom request timeout.
    #[must_use]
    pub fn with_timeout(addr: SocketAddr, timeout: Duration) -> Self {
        Self {
            addr,
            transport: DatagramClient::new(timeout),
        }
    }

    /// Directory address.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Check that the directory is up.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Transport` if the directory does not answer.
    pub async fn status(&self) -> Result<(), DirectoryError> {
        match self.call(&DirectoryRequest::Status).await? {
            DirectoryResponse::Live => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Announce a relay.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::RegistrationConflict` if the id is already
    /// taken, `DirectoryError::Rejected` for any other refusal.
    pub async fn register(&self, record: RelayRecord) -> Result<(), DirectoryError> {
        let node_id = record.node_id;
        match self.call(&DirectoryRequest::RegisterNode(record)).await? {
            DirectoryResponse::Registered => Ok(()),
            DirectoryResponse::Error(wire) if wire.code == ErrorCode::RegistrationConflict => {
                Err(DirectoryError::RegistrationConflict { node_id })
            }
            other => Err(unexpected(other)),
        }
    }

    /// Fetch every registered relay, in registration order.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Transport` if the directory does not answer.
    pub async fn fetch_relays(&self) -> Result<Vec<RelayRecord>, DirectoryError> {
        match self.call(&DirectoryRequest::GetNodeRegistry).await? {
            DirectoryResponse::Registry(registry) => Ok(registry.nodes),
            other => Err(unexpected(other)),
        }
    }

    async fn call(&self, request: &DirectoryRequest) -> Result<DirectoryResponse, DirectoryError> {
        Ok(self.transport.call(self.addr, request).await?)
    }
}

fn unexpected(response: DirectoryResponse) -> DirectoryError {
    match response {
        DirectoryResponse::Error(wire) => DirectoryError::Rejected(wire),
        other => DirectoryError::UnexpectedResponse(other.kind()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::DirectoryServer;
    use shallot_crypto::KeyPair;
    use shallot_transport::AsyncUdpTransport;
    use std::sync::Arc;

    async fn start() -> (DirectoryClient, tokio::task::JoinHandle<()>) {
        let transport = AsyncUdpTransport::bind(([127, 0, 0, 1], 0)).await.unwrap();
        let addr = transport.local_addr().unwrap();
        let task = transport.spawn(Arc::new(DirectoryServer::new()));
        (DirectoryClient::with_timeout(addr, Duration::from_secs(2)), task)
    }

    fn record(node_id: u32) -> RelayRecord {
        RelayRecord::new(node_id, KeyPair::generate(&mut rand_core::OsRng).public_key())
    }

    #[tokio::test]
    async fn test_status_over_udp() {
        let (client, task) = start().await;
        client.status().await.unwrap();
        task.abort();
    }

    #[tokio::test]
    async fn test_register_and_fetch_over_udp() {
        let (client, task) = start().await;

        let first = record(1);
        client.register(first.clone()).await.unwrap();
        client.register(record(2)).await.unwrap();

        let err = client.register(record(1)).await.unwrap_err();
        assert!(matches!(err, DirectoryError::RegistrationConflict { node_id: 1 }));

        let relays = client.fetch_relays().await.unwrap();
        assert_eq!(relays.len(), 2);
        assert_eq!(relays[0], first);

        task.abort();
    }

    #[tokio::test]
    async fn test_bad_key_rejected_over_udp() {
        let (client, task) = start().await;
        let err = client
            .register(RelayRecord {
                node_id: 1,
                public_key: "@@@".to_string(),
            })
            .await
            .unwrap_err();

        match err {
            DirectoryError::Rejected(wire) => assert_eq!(wire.code, ErrorCode::Malformed),
            other => panic!("expected rejection, got {other:?}"),
        }
        task.abort();
    }

    #[tokio::test]
    async fn test_unreachable_directory() {
        let silent = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let client =
            DirectoryClient::with_timeout(silent.local_addr().unwrap(), Duration::from_millis(100));

        let err = client.fetch_relays().await.unwrap_err();
        assert!(matches!(err, DirectoryError::Transport(_)));
    }
}
