//! TCP stream demuxer: reassembles length-prefixed frames out of
//! however the socket happens to deliver bytes.
//!
//! Wire format: a 4-byte big-endian length `N`, followed by `N` payload
//! bytes. `N` must be `<= `[`MAX_PAYLOAD_LEN`].

use thiserror::Error;

/// Header size, in bytes, preceding every frame's payload.
pub const HEADER_LEN: usize = 4;

/// Largest payload a single frame may carry.
pub const MAX_PAYLOAD_LEN: usize = 16_384;

/// Minimum spare capacity `write_region` keeps available: enough for one
/// full frame plus its header, so a socket read can never be starved of
/// room regardless of how much of a partial frame is already buffered.
const MIN_SPARE: usize = HEADER_LEN + MAX_PAYLOAD_LEN;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The length header announced a payload larger than
    /// [`MAX_PAYLOAD_LEN`]. The reader is poisoned once this is returned;
    /// the transport must close the connection.
    #[error("oversized frame: {0} bytes (max {MAX_PAYLOAD_LEN})")]
    OversizedFrame(usize),

    /// A previous call already returned `OversizedFrame`; this reader can
    /// no longer be trusted to find frame boundaries.
    #[error("frame reader is poisoned by a prior oversized frame")]
    Poisoned,
}

/// Accumulates raw socket bytes and yields complete frame payloads.
///
/// Not `Sync`; a single `FrameReader` is meant to be owned by whichever
/// side of a transport is doing the reading (see the threaded split in
/// `engine-transport::tcp`).
pub struct FrameReader {
    buf: Vec<u8>,
    filled: usize,
    staging: Vec<u8>,
    poisoned: bool,
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameReader {
    pub fn new() -> Self {
        FrameReader {
            buf: vec![0u8; MIN_SPARE],
            filled: 0,
            staging: Vec::with_capacity(MAX_PAYLOAD_LEN),
            poisoned: false,
        }
    }

    /// The region a socket read should fill. Always at least
    /// [`MAX_PAYLOAD_LEN`] `+` [`HEADER_LEN`] bytes, growing the
    /// underlying buffer if a caller has not yet consumed completed
    /// frames.
    pub fn write_region(&mut self) -> &mut [u8] {
        let spare = self.buf.len() - self.filled;
        if spare < MIN_SPARE {
            self.buf.resize(self.filled + MIN_SPARE, 0);
        }
        &mut self.buf[self.filled..]
    }

    /// Informs the reader that `n` bytes were written into the slice
    /// returned by the most recent [`write_region`](Self::write_region) call.
    pub fn advance(&mut self, n: usize) {
        self.filled += n;
    }

    /// True if some bytes of a not-yet-complete frame are already
    /// buffered. Callers use this to decide whether a read timeout should
    /// be treated as "still waiting for the next message" versus "a frame
    /// already in flight stalled".
    pub fn has_partial_frame(&self) -> bool {
        self.filled > 0
    }

    /// Returns the next complete frame's payload, if one is fully
    /// buffered, and compacts it out of the internal buffer.
    ///
    /// `Ok(None)` means "keep reading from the socket"; it is not an
    /// error.
    pub fn next_message(&mut self) -> Result<Option<&[u8]>, FrameError> {
        if self.poisoned {
            return Err(FrameError::Poisoned);
        }
        if self.filled < HEADER_LEN {
            return Ok(None);
        }

        let len_bytes: [u8; 4] = self.buf[..HEADER_LEN].try_into().expect("4 bytes");
        let payload_len = u32::from_be_bytes(len_bytes) as usize;

        if payload_len > MAX_PAYLOAD_LEN {
            self.poisoned = true;
            return Err(FrameError::OversizedFrame(payload_len));
        }

        let total = HEADER_LEN + payload_len;
        if self.filled < total {
            return Ok(None);
        }

        self.staging.clear();
        self.staging.extend_from_slice(&self.buf[HEADER_LEN..total]);
        self.buf.copy_within(total..self.filled, 0);
        self.filled -= total;

        Ok(Some(&self.staging[..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn feed(reader: &mut FrameReader, chunk: &[u8]) {
        let mut offset = 0;
        while offset < chunk.len() {
            let region = reader.write_region();
            let n = region.len().min(chunk.len() - offset);
            region[..n].copy_from_slice(&chunk[offset..offset + n]);
            reader.advance(n);
            offset += n;
        }
    }

    #[test]
    fn single_frame_in_one_write() {
        let mut reader = FrameReader::new();
        feed(&mut reader, &frame(b"Hello"));
        assert_eq!(reader.next_message().unwrap(), Some(&b"Hello"[..]));
        assert_eq!(reader.next_message().unwrap(), None);
    }

    #[test]
    fn frame_split_across_many_one_byte_writes() {
        let mut reader = FrameReader::new();
        let bytes = frame(b"Hello");
        for byte in &bytes {
            let region = reader.write_region();
            region[0] = *byte;
            reader.advance(1);
            // Not complete until the whole frame lands.
        }
        assert_eq!(reader.next_message().unwrap(), Some(&b"Hello"[..]));
    }

    #[test]
    fn arbitrary_chunking_yields_every_frame_in_order() {
        let payloads: [&[u8]; 4] = [b"a", b"bb", b"ccc", b"dddd"];
        let mut all_bytes = Vec::new();
        for p in &payloads {
            all_bytes.extend(frame(p));
        }

        // Partition at every 3rd byte, an arbitrary chunk size that
        // does not align with any frame boundary.
        let mut reader = FrameReader::new();
        let mut decoded: Vec<Vec<u8>> = Vec::new();
        for chunk in all_bytes.chunks(3) {
            feed(&mut reader, chunk);
            while let Some(msg) = reader.next_message().unwrap() {
                decoded.push(msg.to_vec());
            }
        }

        assert_eq!(decoded.len(), payloads.len());
        for (got, want) in decoded.iter().zip(payloads.iter()) {
            assert_eq!(got.as_slice(), *want);
        }
    }

    #[test]
    fn oversized_frame_poisons_the_reader() {
        let mut reader = FrameReader::new();
        let huge_len = (MAX_PAYLOAD_LEN + 1) as u32;
        feed(&mut reader, &huge_len.to_be_bytes());
        assert_eq!(
            reader.next_message(),
            Err(FrameError::OversizedFrame(MAX_PAYLOAD_LEN + 1))
        );
        // Once poisoned, it stays poisoned.
        assert_eq!(reader.next_message(), Err(FrameError::Poisoned));
    }

    #[test]
    fn partial_header_yields_none_not_error() {
        let mut reader = FrameReader::new();
        feed(&mut reader, &[0u8, 0u8]);
        assert_eq!(reader.next_message().unwrap(), None);
    }
}
