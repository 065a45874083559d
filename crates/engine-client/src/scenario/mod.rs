//! Scenario engine: dispatches a stable scenario id (§6.4) to one of the
//! stress flows, or to a basic interactive exchange.
//!
//! - [`stats`]     : `ResponseStats` / `ValidationReport`.
//! - [`drain`]      : shared drain primitives.
//! - [`unmatched`]  : non-crossing order-entry throughput.
//! - [`adaptive`]   : single-threaded matching stress, deficit-gated.
//! - [`batched`]    : single-threaded matching stress, batch-gated.
//! - [`dual`]       : two shard-routed symbols interleaved.
//! - [`threaded`]   : two-thread sender/receiver variant.

pub mod adaptive;
pub mod batched;
pub mod drain;
pub mod dual;
pub mod threaded;
pub mod unmatched;
pub mod stats;

use std::time::Duration;

use tracing::info;

use crate::client::EngineClient;
use crate::error::ScenarioError;
use stats::{ResponseStats, ValidationReport};

/// Unified result shape the stress binary prints a summary from,
/// regardless of which flow ran (§7 user-visible behaviour: per-phase
/// summary plus a final validation block).
pub struct ScenarioOutcome {
    pub name: &'static str,
    pub units_sent: u64,
    pub stats: ResponseStats,
    pub validation: Option<ValidationReport>,
    pub elapsed: Duration,
}

/// Basic interactive scenario ids (`1`-`3`): send a handful of orders and
/// print what comes back. These exist mainly so the thin stress binary
/// has something to do without a full stress flow; the actual REPL that
/// drives them interactively lives outside this crate (§1).
fn run_basic(client: &mut EngineClient, flavor: u32) -> Result<ScenarioOutcome, ScenarioError> {
    let symbol = "IBM";
    let mut stats = ResponseStats::new();
    let started = std::time::Instant::now();

    match flavor {
        1 => {
            client.send_new_order(1, symbol, 100, 10, engine_core::Side::Buy, 1)?;
        }
        2 => {
            client.send_new_order(1, symbol, 100, 10, engine_core::Side::Buy, 1)?;
            client.send_new_order(1, symbol, 100, 10, engine_core::Side::Sell, 2)?;
        }
        _ => {
            client.send_new_order(1, symbol, 100, 10, engine_core::Side::Buy, 1)?;
            client.send_cancel(1, symbol, 1)?;
        }
    }

    stats.merge(drain::patient_drain(client, 1, 2_000)?);

    Ok(ScenarioOutcome {
        name: "basic",
        units_sent: 1,
        stats,
        validation: None,
        elapsed: started.elapsed(),
    })
}

/// Dispatches `scenario_id` against an already-connected, discovered
/// client. Threaded scenario ids (`40`-`45`) open their own split
/// connection (see [`threaded::run`]) using the same host/port/protocol
/// the caller already resolved.
pub fn run_scenario(
    scenario_id: u32,
    client: &mut EngineClient,
    host: &str,
    port: u16,
) -> Result<ScenarioOutcome, ScenarioError> {
    match scenario_id {
        1..=3 => run_basic(client, scenario_id),

        10..=12 => {
            let n = unmatched_size(scenario_id);
            let report = unmatched::run(client, n)?;
            Ok(ScenarioOutcome {
                name: "unmatched",
                units_sent: n as u64,
                stats: report.stats,
                validation: Some(report.validation),
                elapsed: report.elapsed,
            })
        }

        20..=25 => {
            let trades = matching_size(scenario_id);
            let report = adaptive::run(client, trades)?;
            Ok(ScenarioOutcome {
                name: "adaptive-matching",
                units_sent: trades,
                stats: report.stats,
                validation: Some(report.validation),
                elapsed: report.elapsed,
            })
        }

        30..=32 => {
            let pairs_per_symbol = dual_size(scenario_id);
            let report = dual::run(client, pairs_per_symbol)?;
            Ok(ScenarioOutcome {
                name: "dual-processor",
                units_sent: pairs_per_symbol,
                stats: report.stats,
                validation: Some(report.validation),
                elapsed: report.elapsed,
            })
        }

        40..=45 => {
            let trades = matching_size(scenario_id - 20);
            let protocol = client.protocol();
            let report = threaded::run(host, port, protocol, trades)?;
            info!("threaded scenario ran on its own split connection");
            Ok(ScenarioOutcome {
                name: "threaded-matching",
                units_sent: report.pairs_sent,
                stats: report.stats,
                validation: Some(
                    report
                        .stats
                        .validation_report(2 * report.pairs_sent, report.pairs_sent),
                ),
                elapsed: report.elapsed,
            })
        }

        _ => Err(ScenarioError::UnknownScenario(scenario_id)),
    }
}

/// Batched matching stress is offered as an explicit alternative rather
/// than dispatched by id (§9: adaptive vs batched are alternatives, not
/// layers); the stress binary exposes it via a flag.
pub fn run_batched(client: &mut EngineClient, scenario_id: u32) -> Result<ScenarioOutcome, ScenarioError> {
    let trades = matching_size(scenario_id);
    let report = batched::run(client, trades)?;
    Ok(ScenarioOutcome {
        name: "batched-matching",
        units_sent: trades,
        stats: report.stats,
        validation: Some(report.validation),
        elapsed: report.elapsed,
    })
}

fn unmatched_size(scenario_id: u32) -> u32 {
    match scenario_id {
        10 => 1_000,
        11 => 10_000,
        _ => 100_000,
    }
}

fn matching_size(scenario_id: u32) -> u64 {
    match scenario_id {
        20 => 1_000,
        21 => 10_000,
        22 => 100_000,
        23 => 250_000,
        24 => 500_000,
        _ => 250_000_000,
    }
}

fn dual_size(scenario_id: u32) -> u64 {
    match scenario_id {
        30 => 500_000,
        31 => 1_000_000,
        _ => 100_000_000,
    }
}
