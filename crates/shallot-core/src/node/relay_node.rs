//! Relay service node.

use crate::config::NetworkPlan;
use crate::error::Result;
use crate::network::Delivery;
use crate::node::NodeHandle;
use crate::node::protocol::{NodeRequest, NodeResponse, encode_response};
use crate::node::udp::UdpDelivery;
use crate::relay::RelayEngine;
use async_trait::async_trait;
use rand_core::OsRng;
use shallot_discovery::{DirectoryClient, NodeId};
use shallot_transport::{AsyncUdpTransport, DatagramHandler};
use std::net::SocketAddr;
use std::sync::Arc;

/// Serves the relay protocol around a [`RelayEngine`].
pub struct RelayService<D> {
    engine: Arc<RelayEngine>,
    plan: NetworkPlan,
    delivery: D,
}

impl<D: Delivery> RelayService<D> {
    /// Create a service forwarding through `delivery`, with timeouts from
    /// `plan`.
    pub fn new(engine: Arc<RelayEngine>, plan: &NetworkPlan, delivery: D) -> Self {
        Self {
            engine,
            plan: plan.clone(),
            delivery,
        }
    }

    /// Execute one decoded request.
    pub async fn dispatch(&self, request: NodeRequest) -> NodeResponse {
        match request {
            NodeRequest::Status => NodeResponse::Live,
            NodeRequest::Message(body) => {
                let budget = self.plan.forward_budget(body.budget());
                match self.engine.handle(body.message, &self.delivery, budget).await {
                    Ok(_) => NodeResponse::Success,
                    Err(e) => NodeResponse::Error(e.to_wire()),
                }
            }
            NodeRequest::GetLastReceivedEncryptedMessage => {
                NodeResponse::Text(self.engine.introspect().await.last_received_encrypted)
            }
            NodeRequest::GetLastReceivedDecryptedMessage => {
                NodeResponse::Text(self.engine.introspect().await.last_received_decrypted)
            }
            NodeRequest::GetLastMessageDestination => {
                NodeResponse::Destination(self.engine.introspect().await.last_destination)
            }
            other => other.unsupported("relay"),
        }
    }
}

#[async_trait]
impl<D: Delivery + 'static> DatagramHandler for RelayService<D> {
    async fn handle(&self, request: Vec<u8>, from: SocketAddr) -> Vec<u8> {
        let response = match NodeRequest::from_bytes(&request) {
            Ok(request) => self.dispatch(request).await,
            Err(e) => {
                tracing::warn!("relay {} refused request from {from}: {e}", self.engine.node_id());
                NodeResponse::Error(e.to_wire())
            }
        };
        encode_response(&response)
    }
}

/// Running relay
#[derive(Debug)]
pub struct RelayNode {
    engine: Arc<RelayEngine>,
    handle: NodeHandle,
}

impl RelayNode {
    /// Generate keys, bind the relay's port, register, and serve.
    ///
    /// The port is bound before registering so the relay can take traffic
    /// as soon as the directory lists it.
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` if the port cannot be bound and
    /// `Error::Directory` if registration fails; nothing is served then.
    pub async fn start(node_id: NodeId, plan: &NetworkPlan) -> Result<Self> {
        Self::start_with_engine(RelayEngine::generate(node_id, &mut OsRng), plan).await
    }

    /// Like [`start`](Self::start) with a prepared engine.
    ///
    /// # Errors
    ///
    /// See [`start`](Self::start).
    pub async fn start_with_engine(engine: RelayEngine, plan: &NetworkPlan) -> Result<Self> {
        let node_id = engine.node_id();
        let bind_addr = plan.resolve(plan.relay_address(node_id)?);
        let transport = AsyncUdpTransport::bind(bind_addr).await?;
        let addr = transport.local_addr()?;

        let directory = DirectoryClient::with_timeout(plan.registry_addr(), plan.request_timeout);
        directory.register(engine.record()).await?;
        tracing::info!("relay {node_id} registered, listening on {addr}");

        let engine = Arc::new(engine);
        let service = RelayService::new(Arc::clone(&engine), plan, UdpDelivery::new(plan));
        let task = transport.clone().spawn(Arc::new(service));

        Ok(Self {
            engine,
            handle: NodeHandle::new(addr, transport, task),
        })
    }

    /// Relay id.
    #[must_use]
    pub fn node_id(&self) -> NodeId {
        self.engine.node_id()
    }

    /// Peeling engine.
    #[must_use]
    pub fn engine(&self) -> &Arc<RelayEngine> {
        &self.engine
    }

    /// Bound address.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.handle.local_addr()
    }

    /// Service handle.
    #[must_use]
    pub fn handle(&self) -> &NodeHandle {
        &self.handle
    }
}
