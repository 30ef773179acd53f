//! Request/response client over ephemeral UDP sockets.

use crate::MAX_DATAGRAM_SIZE;
use crate::message;
use crate::transport::{TransportError, TransportResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time;

/// Sends one datagram and waits for one reply.
///
/// A fresh socket is bound per request so concurrent requests never see
/// each other's responses.
#[derive(Debug, Clone)]
pub struct DatagramClient {
    timeout: Duration,
}

impl DatagramClient {
    /// Create a client with the given per-request bound.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Per-request bound.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send `payload` to `addr` and return the response datagram.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::PayloadTooLarge` before sending if `payload`
    /// does not fit in a datagram, `TransportError::Timeout` if no reply
    /// arrives in time, and `TransportError::Io` on socket failures
    /// (including ICMP port-unreachable surfacing as connection refused).
    pub async fn request(&self, addr: SocketAddr, payload: &[u8]) -> TransportResult<Vec<u8>> {
        if payload.len() > MAX_DATAGRAM_SIZE {
            return Err(TransportError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_DATAGRAM_SIZE,
            });
        }

        let local: SocketAddr = if addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(local).await?;
        socket.connect(addr).await?;
        socket.send(payload).await?;

        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        let len = time::timeout(self.timeout, socket.recv(&mut buf))
            .await
            .map_err(|_| TransportError::Timeout {
                addr,
                timeout: self.timeout,
            })??;

        buf.truncate(len);
        Ok(buf)
    }

    /// Send a JSON request and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Everything [`request`](Self::request) returns, plus
    /// `TransportError::Serialization`/`Deserialization` on encoding failures.
    pub async fn call<Req, Resp>(&self, addr: SocketAddr, request: &Req) -> TransportResult<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let payload = message::encode(request)?;
        let response = self.request(addr, &payload).await?;
        message::decode(&response)
    }
}

impl Default for DatagramClient {
    fn default() -> Self {
        Self::new(crate::DEFAULT_REQUEST_TIMEOUT)
    }
}
