//! Network layout.

use crate::address::Address;
use crate::error::Result;
use shallot_discovery::{DEFAULT_REGISTRY_PORT, NodeId};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// User identifier
pub type UserId = u32;

/// Default first relay port; relay `n` listens on `base + n`
pub const DEFAULT_BASE_RELAY_PORT: u16 = 4000;

/// Default first user port; user `n` listens on `base + n`
pub const DEFAULT_BASE_USER_PORT: u16 = 3000;

/// Default number of relays per circuit
pub const DEFAULT_CIRCUIT_LENGTH: usize = 3;

/// Where every service of one shallot network lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkPlan {
    /// Host all services bind on
    pub host: IpAddr,
    /// Port of relay 0
    pub base_relay_port: u16,
    /// Port of user 0
    pub base_user_port: u16,
    /// Directory port
    pub registry_port: u16,
    /// Relays per circuit
    pub circuit_length: usize,
    /// Bound on each request/response exchange
    pub request_timeout: Duration,
}

impl Default for NetworkPlan {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            base_relay_port: DEFAULT_BASE_RELAY_PORT,
            base_user_port: DEFAULT_BASE_USER_PORT,
            registry_port: DEFAULT_REGISTRY_PORT,
            circuit_length: DEFAULT_CIRCUIT_LENGTH,
            request_timeout: shallot_transport::DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl NetworkPlan {
    /// Address of relay `node_id`.
    ///
    /// # Errors
    ///
    /// Returns `Error::AddressOutOfRange` if the id does not fit the port range.
    pub fn relay_address(&self, node_id: NodeId) -> Result<Address> {
        Address::offset(self.base_relay_port, node_id)
    }

    /// Address of user `user_id`'s inbox.
    ///
    /// # Errors
    ///
    /// Returns `Error::AddressOutOfRange` if the id does not fit the port range.
    pub fn user_address(&self, user_id: UserId) -> Result<Address> {
        Address::offset(self.base_user_port, user_id)
    }

    /// Socket address for an overlay address.
    #[must_use]
    pub fn resolve(&self, address: Address) -> SocketAddr {
        SocketAddr::new(self.host, address.port())
    }

    /// Directory socket address.
    #[must_use]
    pub fn registry_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.registry_port)
    }

    /// How long a sender waits for its entry relay.
    ///
    /// One request timeout for every hop below the sender, the recipient's
    /// inbox included.
    #[must_use]
    pub fn circuit_budget(&self) -> Duration {
        let hops = u32::try_from(self.circuit_length)
            .unwrap_or(u32::MAX)
            .saturating_add(1);
        self.request_timeout.saturating_mul(hops)
    }

    /// How long a relay waits for its next hop, given how long its caller
    /// waits for the relay.
    ///
    /// Always shorter than `budget`, so a hop that stalls further down the
    /// circuit times out below every hop still waiting above it. Without a
    /// budget the relay waits one request timeout.
    #[must_use]
    pub fn forward_budget(&self, budget: Option<Duration>) -> Duration {
        match budget {
            Some(budget) => budget
                .saturating_sub(self.request_timeout)
                .max(budget / 2),
            None => self.request_timeout,
        }
    }

    /// How long to wait for a user to answer a send request: its directory
    /// lookup, the circuit, and the hop to the user itself.
    #[must_use]
    pub fn send_budget(&self) -> Duration {
        self.circuit_budget()
            .saturating_add(self.request_timeout.saturating_mul(2))
    }
}
