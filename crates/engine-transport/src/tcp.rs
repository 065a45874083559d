//! Framed TCP transport.
//!
//! Every message is written as a 4-byte big-endian length header followed
//! by the payload (§4.4); [`FrameReader`] reassembles that framing on the
//! receive side regardless of how the kernel happens to chunk reads.

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::TransportError;
use crate::frame_reader::{FrameReader, HEADER_LEN};

/// A connected, framed TCP transport.
///
/// `recv`/`try_recv` return an owned `Vec<u8>` rather than a slice borrowed
/// from the internal frame reader: the same tradeoff the donor makes in its
/// async client, which copies each frame out of a `BytesMut` read buffer
/// before handing it to the UI layer.
pub struct TcpTransport {
    stream: TcpStream,
    reader: FrameReader,
    send_staging: Vec<u8>,
    connected: bool,
}

impl TcpTransport {
    /// Connects to `host:port`. Maps a refused/unreachable connect into
    /// [`TransportError::ConnectRefused`].
    pub fn connect(host: &str, port: u16) -> Result<Self, TransportError> {
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

        let stream = TcpStream::connect(addr).map_err(TransportError::ConnectRefused)?;
        stream.set_nodelay(true).map_err(TransportError::Io)?;

        Ok(TcpTransport {
            stream,
            reader: FrameReader::new(),
            send_staging: Vec::with_capacity(HEADER_LEN + 256),
            connected: true,
        })
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn close(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
        self.connected = false;
    }

    /// Writes `payload` length-prefixed, retrying until the whole record
    /// has been drained or the socket errors.
    pub fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }

        self.send_staging.clear();
        self.send_staging
            .extend_from_slice(&(payload.len() as u32).to_be_bytes());
        self.send_staging.extend_from_slice(payload);

        match self.stream.write_all(&self.send_staging) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.connected = false;
                Err(TransportError::Io(e))
            }
        }
    }

    /// Blocks until one full frame has arrived.
    pub fn recv(&mut self) -> Result<Vec<u8>, TransportError> {
        self.stream.set_read_timeout(None).map_err(TransportError::Io)?;
        loop {
            if let Some(msg) = self.reader.next_message()? {
                return Ok(msg.to_vec());
            }
            self.read_once()?;
        }
    }

    /// Waits up to `timeout_ms` for a complete frame. The timeout governs
    /// how long we wait to obtain *new* bytes from the socket; once a
    /// partial frame is already buffered, each subsequent read gets its own
    /// grace window and a timeout there does not give up the frame -- we
    /// keep polling until either more bytes complete it or the socket
    /// errors, so a frame that has already started arriving is never
    /// abandoned mid-flight.
    pub fn try_recv(&mut self, timeout_ms: u64) -> Result<Option<Vec<u8>>, TransportError> {
        if let Some(msg) = self.reader.next_message()? {
            return Ok(Some(msg.to_vec()));
        }

        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            let partial_frame_in_flight = self.reader.has_partial_frame();
            let budget = if partial_frame_in_flight {
                Duration::from_millis(timeout_ms.max(1_000))
            } else {
                let now = Instant::now();
                if now >= deadline {
                    return Ok(None);
                }
                deadline - now
            };

            self.stream
                .set_read_timeout(Some(budget))
                .map_err(TransportError::Io)?;

            match self.read_once() {
                Ok(()) => {
                    if let Some(msg) = self.reader.next_message()? {
                        return Ok(Some(msg.to_vec()));
                    }
                    // No complete frame yet; loop and re-evaluate whether a
                    // partial frame is now in flight.
                }
                Err(TransportError::Io(e)) if is_timeout(&e) => {
                    if partial_frame_in_flight {
                        // A frame is mid-flight; this read's grace window
                        // lapsed without completing it, but the frame is
                        // still worth waiting for, so poll again instead
                        // of giving up.
                        continue;
                    }
                    return Ok(None);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn read_once(&mut self) -> Result<(), TransportError> {
        let region = self.reader.write_region();
        match self.stream.read(region) {
            Ok(0) => {
                self.connected = false;
                Err(TransportError::ConnectionClosed)
            }
            Ok(n) => {
                self.reader.advance(n);
                Ok(())
            }
            Err(e) => Err(TransportError::Io(e)),
        }
    }

    /// Splits this transport into an independent sender and receiver,
    /// backed by `try_clone`d handles to the same socket. Used by the
    /// threaded stress scenario (§4.7), which pins one OS thread to
    /// sending and another to draining responses.
    pub fn split(self) -> Result<(TcpSender, TcpReceiver), TransportError> {
        let read_half = self.stream.try_clone().map_err(TransportError::Io)?;
        let sender = TcpSender {
            stream: self.stream,
            send_staging: Vec::with_capacity(HEADER_LEN + 256),
        };
        let receiver = TcpReceiver {
            stream: read_half,
            reader: self.reader,
        };
        Ok((sender, receiver))
    }
}

fn is_timeout(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
    )
}

/// The write half of a [`TcpTransport::split`] pair.
pub struct TcpSender {
    stream: TcpStream,
    send_staging: Vec<u8>,
}

impl TcpSender {
    pub fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        self.send_staging.clear();
        self.send_staging
            .extend_from_slice(&(payload.len() as u32).to_be_bytes());
        self.send_staging.extend_from_slice(payload);
        self.stream
            .write_all(&self.send_staging)
            .map_err(TransportError::Io)
    }

    pub fn close(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Write);
    }
}

/// The read half of a [`TcpTransport::split`] pair.
pub struct TcpReceiver {
    stream: TcpStream,
    reader: FrameReader,
}

impl TcpReceiver {
    pub fn recv(&mut self) -> Result<Vec<u8>, TransportError> {
        self.stream.set_read_timeout(None).map_err(TransportError::Io)?;
        loop {
            if let Some(msg) = self.reader.next_message()? {
                return Ok(msg.to_vec());
            }
            let region = self.reader.write_region();
            match self.stream.read(region) {
                Ok(0) => return Err(TransportError::ConnectionClosed),
                Ok(n) => self.reader.advance(n),
                Err(e) => return Err(TransportError::Io(e)),
            }
        }
    }

    pub fn try_recv(&mut self, timeout_ms: u64) -> Result<Option<Vec<u8>>, TransportError> {
        if let Some(msg) = self.reader.next_message()? {
            return Ok(Some(msg.to_vec()));
        }
        self.stream
            .set_read_timeout(Some(Duration::from_millis(timeout_ms)))
            .map_err(TransportError::Io)?;
        let region = self.reader.write_region();
        match self.stream.read(region) {
            Ok(0) => Err(TransportError::ConnectionClosed),
            Ok(n) => {
                self.reader.advance(n);
                self.reader.next_message().map(|m| m.map(|s| s.to_vec()))
            }
            Err(e) if is_timeout(&e) => {
                debug!("tcp receiver timed out waiting for a frame");
                Ok(None)
            }
            Err(e) => {
                warn!(error = %e, "tcp receiver read failed");
                Err(TransportError::Io(e))
            }
        }
    }

    pub fn close(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Read);
    }
}
