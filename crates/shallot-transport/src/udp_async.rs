//! Async UDP service socket.
//!
//! Binds with socket2 for buffer sizing, then serves request datagrams
//! through a [`DatagramHandler`]. Each datagram is handled on its own Tokio
//! task, so a slow downstream hop stalls only the request that depends on it.

use crate::MAX_DATAGRAM_SIZE;
use crate::transport::{DatagramHandler, TransportError, TransportResult, TransportStats};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

/// Socket buffer size for service sockets
const SOCKET_BUFFER_SIZE: usize = 2 * 1024 * 1024;

#[derive(Default)]
struct Counters {
    bytes_sent: AtomicU64,
    bytes_received: AtomicU64,
    packets_sent: AtomicU64,
    packets_received: AtomicU64,
    send_errors: AtomicU64,
    recv_errors: AtomicU64,
}

/// Async UDP service transport.
#[derive(Clone)]
pub struct AsyncUdpTransport {
    socket: Arc<UdpSocket>,
    counters: Arc<Counters>,
}

impl AsyncUdpTransport {
    /// Bind a service socket.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::BindFailed` if the socket cannot be created or bound.
    pub async fn bind<A: Into<SocketAddr>>(addr: A) -> TransportResult<Self> {
        let addr = addr.into();

        let domain = if addr.is_ipv4() {
            socket2::Domain::IPV4
        } else {
            socket2::Domain::IPV6
        };

        let socket2 =
            socket2::Socket::new(domain, socket2::Type::DGRAM, Some(socket2::Protocol::UDP))
                .map_err(|e| TransportError::BindFailed(e.to_string()))?;

        socket2
            .set_recv_buffer_size(SOCKET_BUFFER_SIZE)
            .map_err(|e| TransportError::BindFailed(e.to_string()))?;
        socket2
            .set_send_buffer_size(SOCKET_BUFFER_SIZE)
            .map_err(|e| TransportError::BindFailed(e.to_string()))?;

        socket2
            .bind(&addr.into())
            .map_err(|e| TransportError::BindFailed(format!("{addr}: {e}")))?;

        socket2
            .set_nonblocking(true)
            .map_err(|e| TransportError::BindFailed(e.to_string()))?;
        let std_socket: std::net::UdpSocket = socket2.into();
        let socket = UdpSocket::from_std(std_socket)
            .map_err(|e| TransportError::BindFailed(e.to_string()))?;

        Ok(Self {
            socket: Arc::new(socket),
            counters: Arc::new(Counters::default()),
        })
    }

    /// Get the local address this transport is bound to.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Io` if the address cannot be determined.
    pub fn local_addr(&self) -> TransportResult<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Serve requests until the socket fails.
    ///
    /// Receive errors are counted and logged; the loop keeps running.
    pub async fn serve<H: DatagramHandler>(self, handler: Arc<H>) {
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

        loop {
            match self.socket.recv_from(&mut buf).await {
                Ok((len, from)) => {
                    self.counters.packets_received.fetch_add(1, Ordering::Relaxed);
                    self.counters
                        .bytes_received
                        .fetch_add(len as u64, Ordering::Relaxed);

                    let request = buf[..len].to_vec();
                    let handler = Arc::clone(&handler);
                    let transport = self.clone();

                    tokio::spawn(async move {
                        let response = handler.handle(request, from).await;
                        transport.reply(&response, from).await;
                    });
                }
                Err(e) => {
                    self.counters.recv_errors.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!("receive error: {e}");
                }
            }
        }
    }

    /// Spawn [`serve`](Self::serve) onto the Tokio runtime.
    pub fn spawn<H: DatagramHandler>(self, handler: Arc<H>) -> JoinHandle<()> {
        tokio::spawn(self.serve(handler))
    }

    async fn reply(&self, response: &[u8], to: SocketAddr) {
        if response.len() > MAX_DATAGRAM_SIZE {
            self.counters.send_errors.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                "dropping {}-byte response to {to}: exceeds datagram limit",
                response.len()
            );
            return;
        }

        match self.socket.send_to(response, to).await {
            Ok(sent) => {
                self.counters.packets_sent.fetch_add(1, Ordering::Relaxed);
                self.counters
                    .bytes_sent
                    .fetch_add(sent as u64, Ordering::Relaxed);
            }
            Err(e) => {
                self.counters.send_errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("failed to reply to {to}: {e}");
            }
        }
    }

    /// Snapshot of the transport counters.
    #[must_use]
    pub fn stats(&self) -> TransportStats {
        TransportStats {
            bytes_sent: self.counters.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.counters.bytes_received.load(Ordering::Relaxed),
            packets_sent: self.counters.packets_sent.load(Ordering::Relaxed),
            packets_received: self.counters.packets_received.load(Ordering::Relaxed),
            send_errors: self.counters.send_errors.load(Ordering::Relaxed),
            recv_errors: self.counters.recv_errors.load(Ordering::Relaxed),
        }
    }
}
