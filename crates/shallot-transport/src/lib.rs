//! # Shallot Transport
//!
//! The "deliver bytes to address" collaborator of the shallot overlay.
//!
//! Every exchange is one request datagram answered by one response
//! datagram:
//! - [`AsyncUdpTransport`] binds a service socket and hands each inbound
//!   datagram to a [`DatagramHandler`] on its own task
//! - [`DatagramClient`] sends a request from an ephemeral socket and waits
//!   for the reply, bounded by a timeout
//!
//! - [`message`] fixes the JSON conventions every service shares
//!
//! No retries happen at this layer; a timeout is reported to the caller.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod message;
pub mod transport;
pub mod udp_async;

pub use client::DatagramClient;
pub use message::{ErrorCode, RequestError, WireError};
pub use transport::{DatagramHandler, TransportError, TransportResult, TransportStats};
pub use udp_async::AsyncUdpTransport;

use std::time::Duration;

/// Largest payload a single UDP datagram can carry over IPv4.
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Default bound on a single request/response exchange.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
