//! Network nodes.
//!
//! Each node binds one UDP port from the [`NetworkPlan`](crate::NetworkPlan)
//! and serves the JSON protocol in [`protocol`]. Every inbound datagram gets
//! its own task, so a relay waiting on a slow next hop keeps serving other
//! messages.

pub mod client;
pub mod protocol;
pub mod registry_node;
pub mod relay_node;
pub mod udp;
pub mod user_node;

pub use client::NodeClient;
pub use protocol::{MessageBody, NodeRequest, NodeResponse, SendMessageBody};
pub use registry_node::RegistryNode;
pub use relay_node::RelayNode;
pub use udp::UdpDelivery;
pub use user_node::UserNode;

use shallot_transport::{AsyncUdpTransport, TransportStats};
use std::fmt;
use std::net::SocketAddr;
use tokio::task::JoinHandle;

/// A running service. Dropping the handle stops the service.
pub struct NodeHandle {
    addr: SocketAddr,
    transport: AsyncUdpTransport,
    task: JoinHandle<()>,
}

impl NodeHandle {
    pub(crate) fn new(addr: SocketAddr, transport: AsyncUdpTransport, task: JoinHandle<()>) -> Self {
        Self {
            addr,
            transport,
            task,
        }
    }

    /// Address the service is bound to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Datagrams and bytes the service has handled so far.
    #[must_use]
    pub fn stats(&self) -> TransportStats {
        self.transport.stats()
    }

    /// Whether the service loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop serving.
    pub fn shutdown(&self) {
        self.task.abort();
    }
}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeHandle")
            .field("addr", &self.addr)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl Drop for NodeHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
