//! Binary encoding/decoding for engine-core messages.
//!
//! Wire layout (big-endian, magic [`MAGIC`]), one message per buffer:
//!
//! ```text
//! Input (client → server)
//! -----------------------
//! NewOrder (30 B, kind 'N'):
//!   [0]      magic
//!   [1]      kind
//!   [2..6]   user_id        (u32 BE)
//!   [6..14]  symbol         ([8], NUL-padded ASCII)
//!   [14..18] price          (u32 BE, cents)
//!   [18..22] quantity       (u32 BE)
//!   [22]     side           ('B' / 'S')
//!   [23..27] user_order_id  (u32 BE)
//!   [27..30] pad
//!
//! Cancel (11 B, kind 'C'; symbol-less canonical form):
//!   [2..6]   user_id        (u32 BE)
//!   [6..10]  user_order_id  (u32 BE)
//!   [10]     pad
//!
//! Flush (2 B, kind 'F'): header only.
//!
//! Output (server → client)
//! -------------------------
//! Ack (19 B, kind 'A') / CancelAck (19 B, kind 'X'):
//!   [2..10]  symbol         ([8])
//!   [10..14] user_id        (u32 BE)
//!   [14..18] user_order_id  (u32 BE)
//!   [18]     pad
//!
//! Trade (34 B, kind 'T'):
//!   [2..10]  symbol         ([8])
//!   [10..14] buy_user_id    (u32 BE)
//!   [14..18] buy_order_id   (u32 BE)
//!   [18..22] sell_user_id   (u32 BE)
//!   [22..26] sell_order_id  (u32 BE)
//!   [26..30] price          (u32 BE)
//!   [30..34] quantity       (u32 BE)
//!
//! TopOfBook (20 B, kind 'B'):
//!   [2..10]  symbol         ([8])
//!   [10]     side           ('B' / 'S')
//!   [11]     pad
//!   [12..16] price          (u32 BE; 0 with quantity 0 means empty side)
//!   [16..20] quantity       (u32 BE)
//!
//! Reject (20 B, kind 'R'; not uniformly defined across servers):
//!   [2..10]  symbol         ([8])
//!   [10..14] user_id        (u32 BE)
//!   [14..18] user_order_id  (u32 BE)
//!   [18]     reason
//!   [19]     pad
//! ```
//!
//! Decoding never allocates beyond the `String` needed to carry the
//! logical symbol out of the fixed `[u8; 8]` field.

use engine_core::{
    Ack, Cancel, CancelAck, InputMessage, NewOrder, OutputMessage, Reject, Side, TopOfBook, Trade,
};

use crate::wire_types::{
    WireInputKind, WireOutputKind, ACK_SIZE, CANCEL_ACK_SIZE, CANCEL_SIZE, FLUSH_SIZE, MAGIC,
    NEW_ORDER_SIZE, REJECT_SIZE, SYMBOL_LEN, TOP_OF_BOOK_SIZE, TRADE_SIZE,
};

/// Errors that can arise when decoding a binary frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("first byte is not the magic 0x4D")]
    InvalidMagic,
    #[error("unknown output message kind {0:#04x}")]
    UnknownKind(u8),
    #[error("buffer too short for this message kind")]
    Truncated,
}

/// `true` iff `bytes` looks like a binary-protocol frame: non-empty and
/// starting with [`MAGIC`].
pub fn is_binary(bytes: &[u8]) -> bool {
    bytes.first() == Some(&MAGIC)
}

// -----------------------------------------------------------------------------
// INPUT: client → server
// -----------------------------------------------------------------------------

/// Encode a single input message to its fixed-size byte image.
pub fn encode_input(msg: &InputMessage) -> Vec<u8> {
    match msg {
        InputMessage::NewOrder(n) => encode_new_order(n),
        InputMessage::Cancel(c) => encode_cancel(c),
        InputMessage::Flush => encode_flush(),
    }
}

fn encode_new_order(n: &NewOrder) -> Vec<u8> {
    let mut out = Vec::with_capacity(NEW_ORDER_SIZE);
    out.push(MAGIC);
    out.push(WireInputKind::NewOrder as u8);
    out.extend_from_slice(&n.user_id.to_be_bytes());
    out.extend_from_slice(&pack_symbol(&n.symbol));
    out.extend_from_slice(&n.price.to_be_bytes());
    out.extend_from_slice(&n.quantity.to_be_bytes());
    out.push(n.side.as_char() as u8);
    out.extend_from_slice(&n.user_order_id.to_be_bytes());
    out.extend_from_slice(&[0u8; 3]);
    debug_assert_eq!(out.len(), NEW_ORDER_SIZE);
    out
}

fn encode_cancel(c: &Cancel) -> Vec<u8> {
    let mut out = Vec::with_capacity(CANCEL_SIZE);
    out.push(MAGIC);
    out.push(WireInputKind::Cancel as u8);
    out.extend_from_slice(&c.user_id.to_be_bytes());
    out.extend_from_slice(&c.user_order_id.to_be_bytes());
    out.push(0);
    debug_assert_eq!(out.len(), CANCEL_SIZE);
    out
}

fn encode_flush() -> Vec<u8> {
    let out = vec![MAGIC, WireInputKind::Flush as u8];
    debug_assert_eq!(out.len(), FLUSH_SIZE);
    out
}

// -----------------------------------------------------------------------------
// OUTPUT: server → client
// -----------------------------------------------------------------------------

/// Decode a single output message from a binary buffer.
pub fn decode_output(buf: &[u8]) -> Result<OutputMessage, DecodeError> {
    if !is_binary(buf) {
        return Err(DecodeError::InvalidMagic);
    }
    if buf.len() < 2 {
        return Err(DecodeError::Truncated);
    }

    let kind = WireOutputKind::from_byte(buf[1]).ok_or(DecodeError::UnknownKind(buf[1]))?;
    match kind {
        WireOutputKind::Ack => decode_ack(buf),
        WireOutputKind::CancelAck => decode_cancel_ack(buf),
        WireOutputKind::Trade => decode_trade(buf),
        WireOutputKind::TopOfBook => decode_top_of_book(buf),
        WireOutputKind::Reject => decode_reject(buf),
    }
}

/// Encode a single output message to its fixed-size byte image.
///
/// Exists mainly so codec round-trip properties and tests can
/// generate fixtures without a live server; production clients only ever
/// decode output messages.
pub fn encode_output(msg: &OutputMessage) -> Vec<u8> {
    match msg {
        OutputMessage::Ack(a) => encode_ack(a),
        OutputMessage::CancelAck(c) => encode_cancel_ack(c),
        OutputMessage::Trade(t) => encode_trade(t),
        OutputMessage::TopOfBook(t) => encode_top_of_book(t),
        OutputMessage::Reject(r) => encode_reject(r),
    }
}

fn decode_ack(buf: &[u8]) -> Result<OutputMessage, DecodeError> {
    if buf.len() < ACK_SIZE {
        return Err(DecodeError::Truncated);
    }
    let symbol = unpack_symbol(&buf[2..10]);
    let user_id = read_u32(&buf[10..14]);
    let user_order_id = read_u32(&buf[14..18]);
    Ok(OutputMessage::Ack(Ack {
        symbol,
        user_id,
        user_order_id,
    }))
}

fn encode_ack(a: &Ack) -> Vec<u8> {
    let mut out = Vec::with_capacity(ACK_SIZE);
    out.push(MAGIC);
    out.push(WireOutputKind::Ack as u8);
    out.extend_from_slice(&pack_symbol(&a.symbol));
    out.extend_from_slice(&a.user_id.to_be_bytes());
    out.extend_from_slice(&a.user_order_id.to_be_bytes());
    out.push(0);
    debug_assert_eq!(out.len(), ACK_SIZE);
    out
}

fn decode_cancel_ack(buf: &[u8]) -> Result<OutputMessage, DecodeError> {
    if buf.len() < CANCEL_ACK_SIZE {
        return Err(DecodeError::Truncated);
    }
    let symbol = unpack_symbol(&buf[2..10]);
    let user_id = read_u32(&buf[10..14]);
    let user_order_id = read_u32(&buf[14..18]);
    Ok(OutputMessage::CancelAck(CancelAck {
        symbol,
        user_id,
        user_order_id,
    }))
}

fn encode_cancel_ack(c: &CancelAck) -> Vec<u8> {
    let mut out = Vec::with_capacity(CANCEL_ACK_SIZE);
    out.push(MAGIC);
    out.push(WireOutputKind::CancelAck as u8);
    out.extend_from_slice(&pack_symbol(&c.symbol));
    out.extend_from_slice(&c.user_id.to_be_bytes());
    out.extend_from_slice(&c.user_order_id.to_be_bytes());
    out.push(0);
    debug_assert_eq!(out.len(), CANCEL_ACK_SIZE);
    out
}

fn decode_trade(buf: &[u8]) -> Result<OutputMessage, DecodeError> {
    if buf.len() < TRADE_SIZE {
        return Err(DecodeError::Truncated);
    }
    let symbol = unpack_symbol(&buf[2..10]);
    let buy_user_id = read_u32(&buf[10..14]);
    let buy_order_id = read_u32(&buf[14..18]);
    let sell_user_id = read_u32(&buf[18..22]);
    let sell_order_id = read_u32(&buf[22..26]);
    let price = read_u32(&buf[26..30]);
    let quantity = read_u32(&buf[30..34]);
    Ok(OutputMessage::Trade(Trade {
        symbol,
        buy_user_id,
        buy_order_id,
        sell_user_id,
        sell_order_id,
        price,
        quantity,
    }))
}

fn encode_trade(t: &Trade) -> Vec<u8> {
    let mut out = Vec::with_capacity(TRADE_SIZE);
    out.push(MAGIC);
    out.push(WireOutputKind::Trade as u8);
    out.extend_from_slice(&pack_symbol(&t.symbol));
    out.extend_from_slice(&t.buy_user_id.to_be_bytes());
    out.extend_from_slice(&t.buy_order_id.to_be_bytes());
    out.extend_from_slice(&t.sell_user_id.to_be_bytes());
    out.extend_from_slice(&t.sell_order_id.to_be_bytes());
    out.extend_from_slice(&t.price.to_be_bytes());
    out.extend_from_slice(&t.quantity.to_be_bytes());
    debug_assert_eq!(out.len(), TRADE_SIZE);
    out
}

fn decode_top_of_book(buf: &[u8]) -> Result<OutputMessage, DecodeError> {
    if buf.len() < TOP_OF_BOOK_SIZE {
        return Err(DecodeError::Truncated);
    }
    let symbol = unpack_symbol(&buf[2..10]);
    let side = Side::from_char(buf[10] as char).unwrap_or(Side::Buy);
    let price = read_u32(&buf[12..16]);
    let quantity = read_u32(&buf[16..20]);
    Ok(OutputMessage::TopOfBook(TopOfBook {
        symbol,
        side,
        price,
        quantity,
    }))
}

fn encode_top_of_book(t: &TopOfBook) -> Vec<u8> {
    let mut out = Vec::with_capacity(TOP_OF_BOOK_SIZE);
    out.push(MAGIC);
    out.push(WireOutputKind::TopOfBook as u8);
    out.extend_from_slice(&pack_symbol(&t.symbol));
    out.push(t.side.as_char() as u8);
    out.push(0);
    out.extend_from_slice(&t.price.to_be_bytes());
    out.extend_from_slice(&t.quantity.to_be_bytes());
    debug_assert_eq!(out.len(), TOP_OF_BOOK_SIZE);
    out
}

fn decode_reject(buf: &[u8]) -> Result<OutputMessage, DecodeError> {
    if buf.len() < REJECT_SIZE {
        return Err(DecodeError::Truncated);
    }
    let symbol = unpack_symbol(&buf[2..10]);
    let user_id = read_u32(&buf[10..14]);
    let user_order_id = read_u32(&buf[14..18]);
    let reason = buf[18];
    Ok(OutputMessage::Reject(Reject {
        symbol,
        user_id,
        user_order_id,
        reason,
    }))
}

fn encode_reject(r: &Reject) -> Vec<u8> {
    let mut out = Vec::with_capacity(REJECT_SIZE);
    out.push(MAGIC);
    out.push(WireOutputKind::Reject as u8);
    out.extend_from_slice(&pack_symbol(&r.symbol));
    out.extend_from_slice(&r.user_id.to_be_bytes());
    out.extend_from_slice(&r.user_order_id.to_be_bytes());
    out.push(r.reason);
    out.push(0);
    debug_assert_eq!(out.len(), REJECT_SIZE);
    out
}

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

fn read_u32(bytes: &[u8]) -> u32 {
    let arr: [u8; 4] = bytes.try_into().expect("4-byte slice");
    u32::from_be_bytes(arr)
}

/// NUL-pad `symbol` into the fixed 8-byte wire field. Symbols longer than
/// [`SYMBOL_LEN`] are truncated; callers are expected to validate length
/// up front (the engine client does, at send time).
fn pack_symbol(symbol: &str) -> [u8; SYMBOL_LEN] {
    let mut field = [0u8; SYMBOL_LEN];
    let bytes = symbol.as_bytes();
    let n = bytes.len().min(SYMBOL_LEN);
    field[..n].copy_from_slice(&bytes[..n]);
    field
}

/// The logical symbol is the prefix up to the first NUL.
/// Non-ASCII/invalid UTF-8 bytes are replaced rather than rejected --
/// decoding never fails on symbol content, only on buffer length.
fn unpack_symbol(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::NewOrder;

    #[test]
    fn encode_new_order_matches_documented_fixture() {
        let msg = InputMessage::NewOrder(NewOrder {
            user_id: 1,
            symbol: "IBM".to_string(),
            price: 10_000,
            quantity: 50,
            side: Side::Buy,
            user_order_id: 1001,
        });
        let bytes = encode_input(&msg);
        let expected: [u8; 30] = [
            0x4D, 0x4E, 0x00, 0x00, 0x00, 0x01, 0x49, 0x42, 0x4D, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x27, 0x10, 0x00, 0x00, 0x00, 0x32, 0x42, 0x00, 0x00, 0x03, 0xE9, 0x00,
            0x00, 0x00,
        ];
        assert_eq!(bytes, expected);
    }

    #[test]
    fn encode_sizes_match_wire_types_table() {
        assert_eq!(
            encode_input(&InputMessage::NewOrder(NewOrder {
                user_id: 0,
                symbol: "A".to_string(),
                price: 0,
                quantity: 1,
                side: Side::Sell,
                user_order_id: 0,
            }))
            .len(),
            NEW_ORDER_SIZE
        );
        assert_eq!(
            encode_input(&InputMessage::Cancel(Cancel {
                user_id: 0,
                symbol: "A".to_string(),
                user_order_id: 0,
            }))
            .len(),
            CANCEL_SIZE
        );
        assert_eq!(encode_input(&InputMessage::Flush).len(), FLUSH_SIZE);
    }

    #[test]
    fn decode_output_rejects_bad_magic() {
        let buf = [0x00u8, b'A'];
        assert_eq!(decode_output(&buf), Err(DecodeError::InvalidMagic));
    }

    #[test]
    fn decode_output_rejects_unknown_kind() {
        let buf = [MAGIC, b'Z'];
        assert_eq!(decode_output(&buf), Err(DecodeError::UnknownKind(b'Z')));
    }

    #[test]
    fn decode_output_rejects_truncated_ack() {
        let buf = [MAGIC, b'A', 0, 0, 0];
        assert_eq!(decode_output(&buf), Err(DecodeError::Truncated));
    }

    #[test]
    fn top_of_book_empty_side_round_trips() {
        let msg = OutputMessage::top_of_book_empty("IBM", Side::Sell);
        let bytes = encode_output(&msg);
        let decoded = decode_output(&bytes).unwrap();
        match decoded {
            OutputMessage::TopOfBook(tob) => {
                assert!(tob.is_empty_side());
                assert_eq!(tob.side, Side::Sell);
            }
            other => panic!("expected TopOfBook, got {other:?}"),
        }
    }

    #[test]
    fn output_round_trip_reproduces_original_bytes() {
        let msg = OutputMessage::trade("IBM", 1, 100, 2, 200, 10_000, 50);
        let bytes = encode_output(&msg);
        assert_eq!(bytes.len(), TRADE_SIZE);
        let decoded = decode_output(&bytes).unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(encode_output(&decoded), bytes);
    }

    #[test]
    fn is_binary_detects_magic_byte() {
        assert!(is_binary(&[MAGIC, b'A']));
        assert!(!is_binary(&[b'N']));
        assert!(!is_binary(&[]));
    }

    #[test]
    fn symbol_is_prefix_up_to_first_nul() {
        let field = [b'I', b'B', b'M', 0, 0, 0, 0, 0];
        assert_eq!(unpack_symbol(&field), "IBM");
    }
}
