//! Transport errors and the request handler seam.

use async_trait::async_trait;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

/// Transport layer errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// I/O error from underlying socket
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Address binding failed
    #[error("Failed to bind to address: {0}")]
    BindFailed(String),

    /// No response arrived in time
    #[error("No response from {addr} within {timeout:?}")]
    Timeout {
        /// Peer that did not answer
        addr: SocketAddr,
        /// Bound that expired
        timeout: Duration,
    },

    /// Message could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Datagram did not decode as the expected message
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Payload does not fit in one datagram
    #[error("Payload of {size} bytes exceeds datagram limit of {max}")]
    PayloadTooLarge {
        /// Payload size
        size: usize,
        /// Maximum allowed size
        max: usize,
    },
}

impl TransportError {
    /// Whether the peer was unreachable or silent, as opposed to a local fault.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        match self {
            TransportError::Timeout { .. } => true,
            TransportError::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::ConnectionRefused | io::ErrorKind::ConnectionReset
            ),
            _ => false,
        }
    }
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Handles one request datagram and produces the response datagram.
///
/// Implementations must be stateless across requests or guard their own
/// state: the transport invokes `handle` concurrently, one task per datagram.
#[async_trait]
pub trait DatagramHandler: Send + Sync + 'static {
    /// Produce the response for `request` received from `from`.
    async fn handle(&self, request: Vec<u8>, from: SocketAddr) -> Vec<u8>;
}

/// Transport statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportStats {
    /// Total bytes sent
    pub bytes_sent: u64,
    /// Total bytes received
    pub bytes_received: u64,
    /// Total datagrams sent
    pub packets_sent: u64,
    /// Total datagrams received
    pub packets_received: u64,
    /// Send errors
    pub send_errors: u64,
    /// Receive errors
    pub recv_errors: u64,
}

impl fmt::Display for TransportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} requests ({} bytes) in, {} replies ({} bytes) out",
            self.packets_received, self.bytes_received, self.packets_sent, self.bytes_sent
        )?;
        if self.send_errors + self.recv_errors > 0 {
            write!(
                f,
                ", {} send errors, {} receive errors",
                self.send_errors, self.recv_errors
            )?;
        }
        Ok(())
    }
}
