//! Unframed UDP transport.
//!
//! UDP already preserves datagram boundaries, so there is no framing
//! layer here: one `send` is one datagram, one `recv` is one datagram.
//! Oversized outgoing payloads are the caller's problem (§4.4 only binds
//! the TCP frame format).

use std::net::{ToSocketAddrs, UdpSocket};
use std::time::Duration;

use crate::error::TransportError;

const RECV_BUF_LEN: usize = 65_536;

pub struct UdpTransport {
    socket: UdpSocket,
    recv_buf: Vec<u8>,
}

impl UdpTransport {
    /// Binds an ephemeral local socket and connects it to `host:port` so
    /// `send`/`recv` don't need to carry a peer address on every call.
    pub fn connect(host: &str, port: u16, recv_timeout_ms: Option<u64>) -> Result<Self, TransportError> {
        if host.is_empty() {
            return Err(TransportError::Config("host must not be empty"));
        }
        if port == 0 {
            return Err(TransportError::Config("port must be nonzero"));
        }

        let addr = (host, port)
            .to_socket_addrs()
            .map_err(TransportError::ConnectRefused)?
            .next()
            .ok_or_else(|| {
                TransportError::ConnectRefused(std::io::Error::new(
                    std::io::ErrorKind::AddrNotAvailable,
                    "no addresses resolved",
                ))
            })?;

        let socket = UdpSocket::bind("0.0.0.0:0").map_err(TransportError::Io)?;
        socket.connect(addr).map_err(TransportError::ConnectRefused)?;
        if let Some(ms) = recv_timeout_ms {
            socket
                .set_read_timeout(Some(Duration::from_millis(ms)))
                .map_err(TransportError::Io)?;
        }

        Ok(UdpTransport {
            socket,
            recv_buf: vec![0u8; RECV_BUF_LEN],
        })
    }

    pub fn send(&self, payload: &[u8]) -> Result<(), TransportError> {
        self.socket.send(payload).map_err(TransportError::Io)?;
        Ok(())
    }

    /// Blocks (subject to any `recv_timeout_ms` set at connect time) for
    /// one whole datagram.
    pub fn recv(&mut self) -> Result<Vec<u8>, TransportError> {
        let n = self.socket.recv(&mut self.recv_buf).map_err(TransportError::Io)?;
        Ok(self.recv_buf[..n].to_vec())
    }

    /// Waits up to `timeout_ms` for one datagram; `Ok(None)` on timeout.
    pub fn try_recv(&mut self, timeout_ms: u64) -> Result<Option<Vec<u8>>, TransportError> {
        self.socket
            .set_read_timeout(Some(Duration::from_millis(timeout_ms)))
            .map_err(TransportError::Io)?;
        match self.socket.recv(&mut self.recv_buf) {
            Ok(n) => Ok(Some(self.recv_buf[..n].to_vec())),
            Err(e) if is_timeout(&e) => Ok(None),
            Err(e) => Err(TransportError::Io(e)),
        }
    }
}

fn is_timeout(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
    )
}
