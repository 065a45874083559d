//! Drives the scenario engine's stress flows against the in-process fake
//! matching engine in `support`, exercising the drain/pacing logic and
//! the §8 scenario invariants without a live server.

mod support;

use engine_client::config::{EngineClientConfig, ProtocolKind, TransportKind};
use engine_client::scenario::{adaptive, batched, dual, threaded, unmatched};
use engine_client::{client::Protocol, EngineClient};

fn connect_binary(port: u16) -> EngineClient {
    let config = EngineClientConfig::new("127.0.0.1", port)
        .with_transport(TransportKind::Tcp)
        .with_protocol(ProtocolKind::Binary);
    EngineClient::connect(&config).expect("connect to fake engine")
}

#[test]
fn adaptive_matching_meets_validation_invariants() {
    let port = support::spawn_fake_engine();
    let mut client = connect_binary(port);

    let report = adaptive::run(&mut client, 25).expect("adaptive scenario");

    assert!(report.validation.passed, "{:?}", report.validation);
    assert!(report.stats.acks >= 50);
    assert!(report.stats.trades >= 25);
    assert!(report.stats.top_of_book >= 50);
}

#[test]
fn batched_matching_meets_validation_invariants() {
    let port = support::spawn_fake_engine();
    let mut client = connect_binary(port);

    let report = batched::run(&mut client, 150).expect("batched scenario");

    assert!(report.validation.passed, "{:?}", report.validation);
    assert!(report.stats.trades >= 150);
}

#[test]
fn dual_processor_doubles_expected_trades_per_input_unit() {
    let port = support::spawn_fake_engine();
    let mut client = connect_binary(port);

    let report = dual::run(&mut client, 10).expect("dual-processor scenario");

    // 10 pairs per symbol across 2 symbols = 20 total matching pairs.
    assert!(report.validation.passed, "{:?}", report.validation);
    assert!(report.stats.trades >= 20);
}

#[test]
fn unmatched_orders_produce_one_ack_and_one_top_of_book_each() {
    let port = support::spawn_fake_engine();
    let mut client = connect_binary(port);

    let report = unmatched::run(&mut client, 40).expect("unmatched scenario");

    assert!(report.validation.passed, "{:?}", report.validation);
    assert_eq!(report.stats.acks, 40);
    assert_eq!(report.stats.top_of_book, 40);
    assert_eq!(report.stats.trades, 0);
}

#[test]
fn threaded_scenario_satisfies_the_message_sum_invariant() {
    let port = support::spawn_fake_engine();

    let report = threaded::run("127.0.0.1", port, Protocol::Binary, 20).expect("threaded scenario");

    assert_eq!(report.send_errors, 0);
    assert!(report.pairs_sent >= 20);
    assert!(report.stats.trades >= 20);

    // §8: after both threads join, messages_received equals the sum of
    // every per-kind counter (the fake engine never emits an
    // undecodable frame, so parse_errors stays at zero here).
    assert_eq!(report.stats.parse_errors, 0);
    let counted = report.stats.acks
        + report.stats.cancel_acks
        + report.stats.trades
        + report.stats.top_of_book
        + report.stats.rejects;
    assert_eq!(report.messages_received, counted);
}
