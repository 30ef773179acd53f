//! User service node.

use crate::config::{NetworkPlan, UserId};
use crate::error::Result;
use crate::network::{Delivery, RelayDirectory};
use crate::node::NodeHandle;
use crate::node::protocol::{NodeRequest, NodeResponse, encode_response};
use crate::node::udp::UdpDelivery;
use crate::user::UserAgent;
use async_trait::async_trait;
use shallot_discovery::DirectoryClient;
use shallot_transport::{AsyncUdpTransport, DatagramHandler};
use std::net::SocketAddr;
use std::sync::Arc;

/// Serves the user protocol around a [`UserAgent`].
pub struct UserService<Dir, D> {
    agent: Arc<UserAgent>,
    directory: Dir,
    delivery: D,
}

impl<Dir: RelayDirectory, D: Delivery> UserService<Dir, D> {
    /// Create a service that looks up relays in `directory` and sends
    /// through `delivery`.
    pub fn new(agent: Arc<UserAgent>, directory: Dir, delivery: D) -> Self {
        Self {
            agent,
            directory,
            delivery,
        }
    }

    /// Execute one decoded request.
    pub async fn dispatch(&self, request: NodeRequest) -> NodeResponse {
        match request {
            NodeRequest::Status => NodeResponse::Live,
            NodeRequest::Message(body) => {
                self.agent.receive(body.message).await;
                NodeResponse::Success
            }
            NodeRequest::SendMessage(body) => {
                let sent = self
                    .agent
                    .send_message(
                        &body.message,
                        body.destination_user_id,
                        &self.directory,
                        &self.delivery,
                    )
                    .await;
                match sent {
                    Ok(_) => NodeResponse::Success,
                    Err(e) => {
                        tracing::warn!("user {} failed to send: {e}", self.agent.user_id());
                        NodeResponse::Error(e.to_wire())
                    }
                }
            }
            NodeRequest::GetLastReceivedMessage => {
                NodeResponse::Text(self.agent.introspect().await.last_received)
            }
            NodeRequest::GetLastSentMessage => {
                NodeResponse::Text(self.agent.introspect().await.last_sent)
            }
            NodeRequest::GetLastCircuit => {
                NodeResponse::Circuit(self.agent.introspect().await.last_circuit)
            }
            other => other.unsupported("user"),
        }
    }
}

#[async_trait]
impl<Dir, D> DatagramHandler for UserService<Dir, D>
where
    Dir: RelayDirectory + 'static,
    D: Delivery + 'static,
{
    async fn handle(&self, request: Vec<u8>, from: SocketAddr) -> Vec<u8> {
        let response = match NodeRequest::from_bytes(&request) {
            Ok(request) => self.dispatch(request).await,
            Err(e) => {
                tracing::warn!("user {} refused request from {from}: {e}", self.agent.user_id());
                NodeResponse::Error(e.to_wire())
            }
        };
        encode_response(&response)
    }
}

/// Running user
#[derive(Debug)]
pub struct UserNode {
    agent: Arc<UserAgent>,
    handle: NodeHandle,
}

impl UserNode {
    /// Bind the user's port and serve.
    ///
    /// # Errors
    ///
    /// Returns `Error::AddressOutOfRange` if the id has no port and
    /// `Error::Transport` if the port cannot be bound.
    pub async fn start(user_id: UserId, plan: &NetworkPlan) -> Result<Self> {
        let bind_addr = plan.resolve(plan.user_address(user_id)?);
        let transport = AsyncUdpTransport::bind(bind_addr).await?;
        let addr = transport.local_addr()?;

        let agent = Arc::new(UserAgent::new(user_id, plan.clone()));
        let directory = DirectoryClient::with_timeout(plan.registry_addr(), plan.request_timeout);
        let service = UserService::new(Arc::clone(&agent), directory, UdpDelivery::new(plan));
        let task = transport.clone().spawn(Arc::new(service));

        tracing::info!("user {user_id} listening on {addr}");
        Ok(Self {
            agent,
            handle: NodeHandle::new(addr, transport, task),
        })
    }

    /// User id.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.agent.user_id()
    }

    /// User agent.
    #[must_use]
    pub fn agent(&self) -> &Arc<UserAgent> {
        &self.agent
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
