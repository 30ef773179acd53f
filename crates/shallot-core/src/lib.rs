//! # Shallot Core
//!
//! Onion routing over a small relay overlay.
//!
//! A sender fetches the relay list from the directory, picks a circuit of
//! distinct relays, and wraps its message in one encryption layer per relay.
//! Each relay removes exactly one layer, learns only the next address, and
//! forwards the rest. The last relay hands the plaintext to the recipient's
//! inbox.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   getNodeRegistry   ┌───────────┐
//! │  sender  │ ──────────────────► │ directory │ ◄── registerNode (relays)
//! └────┬─────┘                     └───────────┘
//!      │ onion (3 layers)
//!      ▼
//! ┌─────────┐  2 layers  ┌─────────┐  1 layer  ┌─────────┐  plaintext  ┌───────────┐
//! │ relay A │ ─────────► │ relay B │ ────────► │ relay C │ ──────────► │ recipient │
//! └─────────┘            └─────────┘           └─────────┘             └───────────┘
//! ```
//!
//! - [`circuit`]: random relay selection
//! - [`onion`]: layer construction and peeling
//! - [`relay`]: the per-relay peel-and-forward engine
//! - [`user`]: sending and receiving
//! - [`node`]: UDP services for all of the above

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod address;
pub mod circuit;
pub mod config;
pub mod error;
pub mod network;
pub mod node;
pub mod onion;
pub mod relay;
pub mod user;

pub use address::{ADDRESS_WIDTH, Address};
pub use circuit::{Circuit, select_circuit};
pub use config::{NetworkPlan, UserId};
pub use error::{DeliveryError, Error, Result};
pub use network::{Delivery, RelayDirectory};
pub use onion::{Hop, Onion, PeeledLayer, build_onion, peel};
pub use relay::{RelayEngine, RelayIntrospection};
pub use user::{OutgoingMessage, UserAgent, UserIntrospection, prepare_message};
