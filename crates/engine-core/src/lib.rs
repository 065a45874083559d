//! engine-core
//!
//! Logical, transport-agnostic pieces shared by the rest of the trading
//! client:
//! - `messages`: input/output message types exchanged with the server.
//! - `side`: the `Side` (Buy/Sell) tag.
//! - `latency`: a saturating min/avg/max sample tracker used by stress
//!   scenarios.
//!
//! This crate owns no networking and no codec; see `engine-protocol` for
//! wire encoding and `engine-transport` for sockets and framing.

pub mod latency;
pub mod messages;
pub mod side;

pub use latency::{elapsed, now_ns, LatencyTracker, ScopedTimer};
pub use messages::{
    Ack, Cancel, CancelAck, InputMessage, MAX_SYMBOL_LEN, NewOrder, OutputMessage, Reject,
    TopOfBook, Trade,
};
pub use side::Side;
