//! Client configuration.
//!
//! Mirrors the shape of `engine-server::config::Config::from_env` (a
//! plain struct plus an env-override loader), but the library itself
//! never reads the environment: that is left to the stress binary, which
//! owns argument parsing (§1 scope).

use std::env;
use std::str::FromStr;

/// Which transport to use, or let the client discover one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Tcp,
    Udp,
    Auto,
}

/// Which wire protocol to use, or let the client discover one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolKind {
    Binary,
    Csv,
    Auto,
}

/// Longest plausible formatted CSV line; the client's send-staging buffer
/// is sized to this so formatting never allocates (§4.6, §9).
pub const MAX_CSV_LEN: usize = 160;

#[derive(Debug, Clone)]
pub struct EngineClientConfig {
    pub host: String,
    pub port: u16,
    pub transport: TransportKind,
    pub protocol: ProtocolKind,
    pub udp_recv_timeout_ms: u64,
}

impl EngineClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        EngineClientConfig {
            host: host.into(),
            port,
            transport: TransportKind::Auto,
            protocol: ProtocolKind::Auto,
            udp_recv_timeout_ms: 200,
        }
    }

    pub fn with_transport(mut self, transport: TransportKind) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_protocol(mut self, protocol: ProtocolKind) -> Self {
        self.protocol = protocol;
        self
    }

    /// Validates the non-empty-host / non-zero-port invariant (§4.6).
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.host.is_empty() {
            return Err("host must not be empty");
        }
        if self.port == 0 {
            return Err("port must be nonzero");
        }
        Ok(())
    }

    /// Applies `ENGINE_CLIENT_*` environment overrides on top of `self`,
    /// the same layering `engine-server::config::Config::from_env` uses
    /// (env as a base layer, explicit args/builder calls win by being
    /// applied after).
    ///
    /// - `ENGINE_CLIENT_HOST`
    /// - `ENGINE_CLIENT_PORT`
    /// - `ENGINE_CLIENT_UDP_RECV_TIMEOUT_MS`
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(host) = env::var("ENGINE_CLIENT_HOST") {
            self.host = host;
        }
        if let Some(port) = read_env("ENGINE_CLIENT_PORT") {
            self.port = port;
        }
        if let Some(timeout) = read_env("ENGINE_CLIENT_UDP_RECV_TIMEOUT_MS") {
            self.udp_recv_timeout_ms = timeout;
        }
        self
    }
}

fn read_env<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_empty_host_and_zero_port() {
        assert!(EngineClientConfig::new("", 9000).validate().is_err());
        assert!(EngineClientConfig::new("localhost", 0).validate().is_err());
        assert!(EngineClientConfig::new("localhost", 9000).validate().is_ok());
    }

    #[test]
    fn defaults_are_auto_discovery() {
        let config = EngineClientConfig::new("localhost", 9000);
        assert_eq!(config.transport, TransportKind::Auto);
        assert_eq!(config.protocol, ProtocolKind::Auto);
        assert_eq!(config.udp_recv_timeout_ms, 200);
    }

    #[test]
    fn builder_methods_override_defaults() {
        let config = EngineClientConfig::new("localhost", 9000)
            .with_transport(TransportKind::Tcp)
            .with_protocol(ProtocolKind::Binary);
        assert_eq!(config.transport, TransportKind::Tcp);
        assert_eq!(config.protocol, ProtocolKind::Binary);
    }
}
