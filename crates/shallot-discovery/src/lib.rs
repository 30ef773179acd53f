//! # Shallot Discovery
//!
//! The directory service of the shallot overlay. Relays announce
//! `{nodeId, pubKey}` on startup; circuit builders fetch the full list before
//! each message.
//!
//! The directory only ever sees public keys. A relay's private key never
//! leaves the relay process.
//!
//! ## Example
//!
//! ```rust,no_run
//! use shallot_discovery::{DirectoryClient, DirectoryServer, RelayRecord};
//! use shallot_transport::AsyncUdpTransport;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = AsyncUdpTransport::bind(([127, 0, 0, 1], 8080)).await?;
//! let addr = transport.local_addr()?;
//! transport.spawn(Arc::new(DirectoryServer::new()));
//!
//! let directory = DirectoryClient::new(addr);
//! for relay in directory.fetch_relays().await? {
//!     println!("relay {}", relay.node_id);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod server;

pub use client::DirectoryClient;
pub use error::DirectoryError;
pub use protocol::{DirectoryRequest, DirectoryResponse, NodeId, NodeRegistry, RelayRecord};
pub use registry::Registry;
pub use server::DirectoryServer;

/// Default directory port
pub const DEFAULT_REGISTRY_PORT: u16 = 8080;
