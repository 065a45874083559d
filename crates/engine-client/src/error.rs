//! Client and scenario error types.

use thiserror::Error;

use engine_protocol::{DecodeError, ParseError};
use engine_transport::TransportError;

/// Errors surfaced by [`crate::client::EngineClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid client config: {0}")]
    Config(&'static str),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("binary decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("csv parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("protocol auto-detection did not get a usable reply from the server")]
    DiscoveryFailed,

    #[error("send attempted while not connected")]
    NotConnected,
}

/// Errors surfaced by the scenario engine.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("unknown scenario id {0}")]
    UnknownScenario(u32),

    #[error("validation failed: expected {expected_acks} acks / {expected_trades} trades, observed {observed_acks} / {observed_trades}")]
    ValidationFailed {
        expected_acks: u64,
        expected_trades: u64,
        observed_acks: u64,
        observed_trades: u64,
    },

    #[error("client error during scenario: {0}")]
    Client(#[from] ClientError),
}
