//! Loopback network fixture
//!
//! Starts a directory, a set of relays and a set of users on loopback UDP,
//! each fixture on its own block of ports so tests can run concurrently.
//!
//! # Example
//!
//! ```no_run
//! use shallot_integration_tests::fixtures::NetworkFixture;
//!
//! #[tokio::test]
//! async fn test_send() {
//!     let net = NetworkFixture::new(3, 2).await.unwrap();
//!     net.send(0, 1, "hello").await.unwrap();
//!     assert_eq!(net.last_received(1).await.unwrap().as_deref(), Some("hello"));
//! }
//! ```

use shallot_core::node::{NodeClient, RegistryNode, RelayNode, UserNode};
use shallot_core::{NetworkPlan, Result, UserId};
use shallot_discovery::{DirectoryClient, NodeId};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

/// Global port allocator for concurrent test execution
static NEXT_PORT: AtomicU16 = AtomicU16::new(21000);

/// Ports reserved per fixture
const PORT_BLOCK: u16 = 64;

/// Relay and user ids per fixture
pub const MAX_IDS: u16 = 31;

/// Allocate a unique block of ports for a test
fn allocate_port_block() -> u16 {
    NEXT_PORT.fetch_add(PORT_BLOCK, Ordering::SeqCst)
}

/// A running loopback network
pub struct NetworkFixture {
    /// Layout of this network
    pub plan: NetworkPlan,
    /// Directory
    pub registry: RegistryNode,
    /// Relays, by id
    pub relays: Vec<RelayNode>,
    /// Users, by id
    pub users: Vec<UserNode>,
    /// Query client
    pub client: NodeClient,
}

impl NetworkFixture {
    /// Layout for a fresh port block, with nothing started
    #[must_use]
    pub fn plan() -> NetworkPlan {
        let base = allocate_port_block();
        NetworkPlan {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            registry_port: base,
            base_relay_port: base + 1,
            base_user_port: base + 1 + MAX_IDS,
            circuit_length: 3,
            request_timeout: Duration::from_secs(2),
        }
    }

    /// Start a directory, `relays` relays and `users` users
    ///
    /// # Errors
    ///
    /// Returns the first startup failure.
    pub async fn new(relays: u16, users: u16) -> Result<Self> {
        Self::with_plan(Self::plan(), relays, users).await
    }

    /// Like [`new`](Self::new) on a custom plan
    ///
    /// # Errors
    ///
    /// Returns the first startup failure.
    pub async fn with_plan(plan: NetworkPlan, relays: u16, users: u16) -> Result<Self> {
        assert!(relays <= MAX_IDS && users <= MAX_IDS);

        let registry = RegistryNode::start(&plan).await?;

        let mut relay_nodes = Vec::new();
        for id in 0..u32::from(relays) {
            relay_nodes.push(RelayNode::start(id, &plan).await?);
        }

        let mut user_nodes = Vec::new();
        for id in 0..u32::from(users) {
            user_nodes.push(UserNode::start(id, &plan).await?);
        }

        Ok(Self {
            client: NodeClient::with_timeout(plan.send_budget()),
            plan,
            registry,
            relays: relay_nodes,
            users: user_nodes,
        })
    }

    /// Socket address of relay `id`
    #[must_use]
    pub fn relay_addr(&self, id: NodeId) -> SocketAddr {
        self.relays[id as usize].local_addr()
    }

    /// Socket address of user `id`
    #[must_use]
    pub fn user_addr(&self, id: UserId) -> SocketAddr {
        self.users[id as usize].local_addr()
    }

    /// Directory client for this network
    #[must_use]
    pub fn directory(&self) -> DirectoryClient {
        DirectoryClient::with_timeout(self.plan.registry_addr(), self.plan.request_timeout)
    }

    /// Ask user `from` to send `message` to user `to`
    ///
    /// # Errors
    ///
    /// Returns the user's failure.
    pub async fn send(&self, from: UserId, to: UserId, message: &str) -> Result<()> {
        self.client
            .send_message(self.user_addr(from), message, to)
            .await
    }

    /// Last message in user `id`'s inbox
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not answer.
    pub async fn last_received(&self, id: UserId) -> Result<Option<String>> {
        self.client.last_received_message(self.user_addr(id)).await
    }
}
