//! engine-client
//!
//! The unified send/receive client (auto-discovery of transport and wire
//! format) and the stress-load scenario engine that drives it (§4.6,
//! §4.7).
//!
//! - [`config`]   : `EngineClientConfig`, transport/protocol selection.
//! - [`client`]    : `EngineClient`.
//! - [`scenario`]  : stress flows, drain primitives, response statistics.
//! - [`error`]     : `ClientError`, `ScenarioError`.

pub mod client;
pub mod config;
pub mod error;
pub mod scenario;

pub use client::{ClientStats, EngineClient, Protocol};
pub use config::{EngineClientConfig, ProtocolKind, TransportKind, MAX_CSV_LEN};
pub use error::{ClientError, ScenarioError};
