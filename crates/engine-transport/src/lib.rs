//! engine-transport
//!
//! Socket transports for the matching-engine client: a length-prefixed
//! TCP frame reader/writer and a datagram-oriented UDP transport.
//!
//! - [`frame_reader`] : reassembles length-prefixed frames out of
//!   arbitrary socket reads.
//! - [`tcp`]           : [`tcp::TcpTransport`] and its split
//!   sender/receiver halves.
//! - [`udp`]           : [`udp::UdpTransport`].

pub mod error;
pub mod frame_reader;
pub mod tcp;
pub mod udp;

pub use error::TransportError;
pub use frame_reader::{FrameError, FrameReader, HEADER_LEN, MAX_PAYLOAD_LEN};
pub use tcp::{TcpReceiver, TcpSender, TcpTransport};
pub use udp::UdpTransport;
