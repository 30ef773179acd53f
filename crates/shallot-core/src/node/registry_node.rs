//! Directory service node.

use crate::config::NetworkPlan;
use crate::error::Result;
use crate::node::NodeHandle;
use shallot_discovery::{DirectoryServer, Registry};
use shallot_transport::AsyncUdpTransport;
use std::net::SocketAddr;
use std::sync::Arc;

/// Running directory service
#[derive(Debug)]
pub struct RegistryNode {
    registry: Registry,
    handle: NodeHandle,
}

impl RegistryNode {
    /// Bind the plan's registry port and serve.
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` if the port cannot be bound.
    pub async fn start(plan: &NetworkPlan) -> Result<Self> {
        let transport = AsyncUdpTransport::bind(plan.registry_addr()).await?;
        let addr = transport.local_addr()?;

        let registry = Registry::new();
        let server = DirectoryServer::with_registry(registry.clone());
        let task = transport.clone().spawn(Arc::new(server));

        tracing::info!("directory listening on {addr}");
        Ok(Self {
            registry,
            handle: NodeHandle::new(addr, transport, task),
        })
    }

    /// Registry being served.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
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
