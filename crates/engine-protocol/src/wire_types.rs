//! Low-level wire types and constants.
//!
//! This module defines:
//! - The magic byte and per-kind discriminator chars.
//! - The fixed on-wire size of every message kind.
//!
//! The actual encode/decode logic lives in `binary_codec`.

/// Every binary message on the wire begins with this byte.
pub const MAGIC: u8 = 0x4D; // 'M'

/// Input message kinds (client → server), tagged by their wire char.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WireInputKind {
    NewOrder = b'N',
    Cancel = b'C',
    Flush = b'F',
}

impl WireInputKind {
    pub fn as_char(self) -> char {
        self as u8 as char
    }
}

/// Output message kinds (server → client), tagged by their wire char.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WireOutputKind {
    Ack = b'A',
    CancelAck = b'X',
    Trade = b'T',
    TopOfBook = b'B',
    Reject = b'R',
}

impl WireOutputKind {
    pub fn as_char(self) -> char {
        self as u8 as char
    }

    pub fn from_byte(c: u8) -> Option<Self> {
        match c {
            b'A' => Some(WireOutputKind::Ack),
            b'X' => Some(WireOutputKind::CancelAck),
            b'T' => Some(WireOutputKind::Trade),
            b'B' => Some(WireOutputKind::TopOfBook),
            b'R' => Some(WireOutputKind::Reject),
            _ => None,
        }
    }
}

/// Fixed on-wire size of an input message, in bytes, including the 2-byte
/// magic+kind header. These sizes must be exact.
pub const NEW_ORDER_SIZE: usize = 30;
pub const CANCEL_SIZE: usize = 11;
pub const FLUSH_SIZE: usize = 2;

/// Fixed on-wire size of an output message, in bytes.
pub const ACK_SIZE: usize = 19;
pub const CANCEL_ACK_SIZE: usize = 19;
pub const TRADE_SIZE: usize = 34;
pub const TOP_OF_BOOK_SIZE: usize = 20;
/// No uniform size is standard for `Reject` across deployments; this is
/// the size this client emits/expects when it does
/// speak Reject, laid out the same way as `Ack`/`CancelAck` plus a
/// one-byte reason code.
pub const REJECT_SIZE: usize = 20;

/// Symbol field width on the wire: logical symbols are at
/// most this many bytes, null-padded.
pub const SYMBOL_LEN: usize = 8;

// Compile-time self-check that the layouts in `binary_codec` agree with
// these constants; a mismatch here is a build break, not a runtime
// surprise.
const _: () = {
    assert!(NEW_ORDER_SIZE == 2 + 4 + SYMBOL_LEN + 4 + 4 + 1 + 4 + 3);
    assert!(CANCEL_SIZE == 2 + 4 + 4 + 1);
    assert!(FLUSH_SIZE == 2);
    assert!(ACK_SIZE == 2 + SYMBOL_LEN + 4 + 4 + 1);
    assert!(CANCEL_ACK_SIZE == 2 + SYMBOL_LEN + 4 + 4 + 1);
    assert!(TRADE_SIZE == 2 + SYMBOL_LEN + 4 + 4 + 4 + 4 + 4 + 4);
    assert!(TOP_OF_BOOK_SIZE == 2 + SYMBOL_LEN + 1 + 1 + 4 + 4);
    assert!(REJECT_SIZE == 2 + SYMBOL_LEN + 4 + 4 + 1 + 1);
};
