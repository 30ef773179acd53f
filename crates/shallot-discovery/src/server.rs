//! Directory service request handler.

use crate::protocol::{DirectoryRequest, DirectoryResponse, NodeRegistry};
use crate::registry::Registry;
use async_trait::async_trait;
use shallot_transport::DatagramHandler;
use std::net::SocketAddr;

/// Serves the directory protocol over a [`Registry`].
#[derive(Debug, Clone, Default)]
pub struct DirectoryServer {
    registry: Registry,
}

impl DirectoryServer {
    /// Create a server with an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a server over an existing registry.
    #[must_use]
    pub fn with_registry(registry: Registry) -> Self {
        Self { registry }
    }

    /// The registry this server answers from.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Execute one decoded request.
    pub async fn dispatch(&self, request: DirectoryRequest) -> DirectoryResponse {
        match request {
            DirectoryRequest::Status => DirectoryResponse::Live,
            DirectoryRequest::RegisterNode(record) => {
                let node_id = record.node_id;
                match self.registry.register(record).await {
                    Ok(()) => {
                        tracing::info!("registered relay {node_id}");
                        DirectoryResponse::Registered
                    }
                    Err(e) => {
                        tracing::warn!("rejected registration of relay {node_id}: {e}");
                        DirectoryResponse::Error(e.to_wire())
                    }
                }
            }
            DirectoryRequest::GetNodeRegistry => DirectoryResponse::Registry(NodeRegistry {
                nodes: self.registry.snapshot().await,
            }),
        }
    }
}

#[async_trait]
impl DatagramHandler for DirectoryServer {
    async fn handle(&self, request: Vec<u8>, from: SocketAddr) -> Vec<u8> {
        let response = match DirectoryRequest::from_bytes(&request) {
            Ok(request) => {
                tracing::debug!("{} from {from}", request.op());
                self.dispatch(request).await
            }
            Err(e) => {
                tracing::warn!("refused request from {from}: {e}");
                DirectoryResponse::Error(e.to_wire())
            }
        };

        response.to_bytes().unwrap_or_else(|e| {
            tracing::error!("failed to encode directory response: {e}");
            ENCODING_FAILED.to_vec()
        })
    }
}

/// Fallback when a response cannot be encoded
const ENCODING_FAILED: &[u8] =
    br#"{"result":"error","body":{"code":"internal","message":"response encoding failed"}}"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RelayRecord;
    use shallot_crypto::KeyPair;
    use shallot_transport::{ErrorCode, message};

    fn addr() -> SocketAddr {
        "127.0.0.1:5000".parse().unwrap()
    }

    fn record(node_id: u32) -> RelayRecord {
        RelayRecord::new(node_id, KeyPair::generate(&mut rand_core::OsRng).public_key())
    }

    async fn roundtrip(server: &DirectoryServer, request: &DirectoryRequest) -> DirectoryResponse {
        let bytes = server.handle(request.to_bytes().unwrap(), addr()).await;
        message::decode(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_status() {
        let server = DirectoryServer::new();
        assert_eq!(
            roundtrip(&server, &DirectoryRequest::Status).await,
            DirectoryResponse::Live
        );
    }

    #[tokio::test]
    async fn test_register_then_list() {
        let server = DirectoryServer::new();
        let a = record(1);
        let b = record(2);

        for r in [&a, &b] {
            let response = roundtrip(&server, &DirectoryRequest::RegisterNode(r.clone())).await;
            assert_eq!(response, DirectoryResponse::Registered);
        }

        let response = roundtrip(&server, &DirectoryRequest::GetNodeRegistry).await;
        assert_eq!(
            response,
            DirectoryResponse::Registry(NodeRegistry { nodes: vec![a, b] })
        );
    }

    #[tokio::test]
    async fn test_duplicate_is_conflict() {
        let registry = Registry::new();
        let server = DirectoryServer::with_registry(registry.clone());
        let original = record(1);
        roundtrip(&server, &DirectoryRequest::RegisterNode(original.clone())).await;

        match roundtrip(&server, &DirectoryRequest::RegisterNode(record(1))).await {
            DirectoryResponse::Error(wire) => assert_eq!(wire.code, ErrorCode::RegistrationConflict),
            other => panic!("expected error, got {other:?}"),
        }

        // The server shares the registry it was given.
        assert_eq!(server.registry().len().await, 1);
        assert_eq!(registry.get(1).await, Some(original));
    }

    #[tokio::test]
    async fn test_garbage_is_malformed() {
        let server = DirectoryServer::new();
        let bytes = server.handle(b"{not json".to_vec(), addr()).await;
        match message::decode::<DirectoryResponse>(&bytes).unwrap() {
            DirectoryResponse::Error(wire) => assert_eq!(wire.code, ErrorCode::Malformed),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_op_is_unsupported() {
        let server = DirectoryServer::new();
        let bytes = server
            .handle(br#"{"op":"getPrivateKey"}"#.to_vec(), addr())
            .await;
        match message::decode::<DirectoryResponse>(&bytes).unwrap() {
            DirectoryResponse::Error(wire) => assert_eq!(wire.code, ErrorCode::Unsupported),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn test_encoding_fallback_decodes() {
        match message::decode::<DirectoryResponse>(ENCODING_FAILED).unwrap() {
            DirectoryResponse::Error(wire) => assert_eq!(wire.code, ErrorCode::Internal),
            other => panic!("expected error, got {other:?}"),
        }
    }
}
