//! Logical message types exchanged with the matching-engine server.
//!
//! These are **transport-agnostic**: a [`binary codec`](../../engine_protocol/binary_codec)
//! or [`CSV codec`](../../engine_protocol/csv_codec) turns these into bytes
//! and back. This crate only owns the shapes, not the wire format.
//!
//! - [`InputMessage`]: what the client sends.
//! - [`OutputMessage`]: what the server sends back.

use crate::side::Side;

/// Maximum length of a symbol, in bytes, on the wire.
pub const MAX_SYMBOL_LEN: usize = 8;

/// A request sent from the client to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMessage {
    /// New order: limit or market depending on deployment; price is always
    /// carried in cents.
    NewOrder(NewOrder),

    /// Cancel an existing order by `(user_id, user_order_id)`.
    Cancel(Cancel),

    /// Flush all books: cancels everything resting on the server.
    Flush,
}

/// An event emitted by the matching engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMessage {
    /// Acknowledgement that a new order was accepted into the book.
    Ack(Ack),

    /// Acknowledgement that a named order was cancelled.
    CancelAck(CancelAck),

    /// A trade between a buy and a sell order.
    Trade(Trade),

    /// Best bid or best ask after a book change.
    TopOfBook(TopOfBook),

    /// Some server builds reject an order instead of acking it. Not every
    /// deployment emits this kind; callers should tolerate servers
    /// that never send it.
    Reject(Reject),
}

/// New order message (input).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: u32,
    /// Instrument symbol, e.g. `"IBM"`. Logically up to
    /// [`MAX_SYMBOL_LEN`] bytes; longer values are rejected by the codec.
    pub symbol: String,
    /// Price in cents.
    pub price: u32,
    /// Quantity; must be non-zero for a valid order.
    pub quantity: u32,
    pub side: Side,
    /// Client-local order identifier, used later to cancel.
    pub user_order_id: u32,
}

/// Cancel message (input).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cancel {
    pub user_id: u32,
    pub symbol: String,
    pub user_order_id: u32,
}

/// Acknowledgement of a new order (output).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub symbol: String,
    pub user_id: u32,
    pub user_order_id: u32,
}

/// Acknowledgement of a cancel request (output).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelAck {
    pub symbol: String,
    pub user_id: u32,
    pub user_order_id: u32,
}

/// Trade event (output): a matched execution between a buy and sell order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trade {
    pub symbol: String,
    pub buy_user_id: u32,
    pub buy_order_id: u32,
    pub sell_user_id: u32,
    pub sell_order_id: u32,
    pub price: u32,
    pub quantity: u32,
}

/// Top-of-book event (output): best bid or best ask after a book change.
///
/// `price == 0 && quantity == 0` means that side of the book is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopOfBook {
    pub symbol: String,
    pub side: Side,
    pub price: u32,
    pub quantity: u32,
}

impl TopOfBook {
    /// `true` when the named side of the book has no resting orders.
    pub fn is_empty_side(&self) -> bool {
        self.price == 0 && self.quantity == 0
    }
}

/// Reject event (output). Not emitted by every server build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reject {
    pub symbol: String,
    pub user_id: u32,
    pub user_order_id: u32,
    pub reason: u8,
}

// -----------------------------------------------------------------------------
// Convenience constructors
// -----------------------------------------------------------------------------

impl OutputMessage {
    pub fn ack(symbol: impl Into<String>, user_id: u32, user_order_id: u32) -> Self {
        OutputMessage::Ack(Ack {
            symbol: symbol.into(),
            user_id,
            user_order_id,
        })
    }

    pub fn cancel_ack(symbol: impl Into<String>, user_id: u32, user_order_id: u32) -> Self {
        OutputMessage::CancelAck(CancelAck {
            symbol: symbol.into(),
            user_id,
            user_order_id,
        })
    }

    pub fn trade(
        symbol: impl Into<String>,
        buy_user_id: u32,
        buy_order_id: u32,
        sell_user_id: u32,
        sell_order_id: u32,
        price: u32,
        quantity: u32,
    ) -> Self {
        OutputMessage::Trade(Trade {
            symbol: symbol.into(),
            buy_user_id,
            buy_order_id,
            sell_user_id,
            sell_order_id,
            price,
            quantity,
        })
    }

    pub fn top_of_book(symbol: impl Into<String>, side: Side, price: u32, quantity: u32) -> Self {
        OutputMessage::TopOfBook(TopOfBook {
            symbol: symbol.into(),
            side,
            price,
            quantity,
        })
    }

    pub fn top_of_book_empty(symbol: impl Into<String>, side: Side) -> Self {
        OutputMessage::TopOfBook(TopOfBook {
            symbol: symbol.into(),
            side,
            price: 0,
            quantity: 0,
        })
    }
}
