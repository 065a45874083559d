//! engine-protocol
//!
//! Wire-level encoding/decoding for the matching-engine client.
//!
//! This crate is responsible for turning logical engine messages
//! (`engine_core::InputMessage` / `OutputMessage`) into bytes or text and
//! back again.
//!
//! - [`wire_types`]   : magic byte, kind discriminators, fixed sizes
//! - [`binary_codec`] : packed binary wire protocol
//! - [`csv_codec`]    : CSV compatibility protocol

pub mod binary_codec;
pub mod csv_codec;
pub mod wire_types;

pub use binary_codec::{decode_output, encode_input, encode_output, is_binary, DecodeError};
pub use csv_codec::{format_cancel, format_flush, format_new_order, parse_output, ParseError};
