//! Transport-level error types.

use std::io;

use thiserror::Error;

use crate::frame_reader::FrameError;

/// Errors surfaced by [`crate::tcp::TcpTransport`] and
/// [`crate::udp::UdpTransport`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// Empty host or zero port passed to `connect`.
    #[error("invalid transport config: {0}")]
    Config(&'static str),

    /// TCP connect was refused or the host was unreachable.
    #[error("connect refused: {0}")]
    ConnectRefused(io::Error),

    /// The peer closed the connection (EOF on a `recv`).
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// A frame on the stream failed to reassemble.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Any other I/O failure (partial write that never completes, reset,
    /// etc).
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A send was attempted on a transport that is not connected.
    #[error("not connected")]
    NotConnected,
}
