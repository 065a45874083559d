//! Exercises the TCP protocol auto-probe (§4.6) end to end against the
//! fake matching engine, which only ever replies in binary -- enough to
//! verify the probe settles on `Binary` without needing a CSV-speaking
//! test double.

mod support;

use engine_client::config::{EngineClientConfig, ProtocolKind, TransportKind};
use engine_client::client::Protocol;
use engine_client::EngineClient;

#[test]
fn auto_discovery_detects_binary_protocol_over_tcp() {
    let port = support::spawn_fake_engine();

    let config = EngineClientConfig::new("127.0.0.1", port)
        .with_transport(TransportKind::Auto)
        .with_protocol(ProtocolKind::Auto);
    let client = EngineClient::connect(&config).expect("connect and discover");

    assert_eq!(client.protocol(), Protocol::Binary);
}

#[test]
fn explicit_protocol_skips_the_probe_entirely() {
    let port = support::spawn_fake_engine();

    let config = EngineClientConfig::new("127.0.0.1", port)
        .with_transport(TransportKind::Tcp)
        .with_protocol(ProtocolKind::Binary);
    let client = EngineClient::connect(&config).expect("connect without probing");

    assert_eq!(client.protocol(), Protocol::Binary);
}
