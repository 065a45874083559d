//! Unmatched stress: buy orders at rotating prices that never cross,
//! exercising pure order-entry throughput without any trade matching
//! (§4.7).

use std::time::Instant;

use engine_core::Side;
use tracing::info;

use crate::client::EngineClient;
use crate::error::ScenarioError;
use crate::scenario::drain::{patient_drain, quick_drain};
use crate::scenario::stats::{ResponseStats, ValidationReport};

const SYMBOL: &str = "IBM";
const USER_ID: u32 = 1;
const PRICE_BUCKETS: u32 = 50;
const UNMATCHED_DRAIN_INTERVAL: u32 = 1_000;
const FINAL_DRAIN_TIMEOUT_MS: u64 = 30_000;

pub struct UnmatchedReport {
    pub stats: ResponseStats,
    pub validation: ValidationReport,
    pub elapsed: std::time::Duration,
}

/// Submits `n` non-crossing buy orders, interleaving `quick_drain` every
/// [`UNMATCHED_DRAIN_INTERVAL`] sends, then `patient_drain`s for the full
/// `2n` expected replies (one ack + one top-of-book per order).
pub fn run(client: &mut EngineClient, n: u32) -> Result<UnmatchedReport, ScenarioError> {
    let started = Instant::now();
    let mut stats = ResponseStats::new();

    for i in 0..n {
        let price = 100 + (i % PRICE_BUCKETS);
        client.send_new_order(USER_ID, SYMBOL, price, 10, Side::Buy, i + 1)?;

        if (i + 1) % UNMATCHED_DRAIN_INTERVAL == 0 {
            stats.merge(quick_drain(client)?);
        }
    }

    stats.merge(patient_drain(client, 2 * n as u64, FINAL_DRAIN_TIMEOUT_MS)?);

    let validation = stats.validation_report(n as u64, 0);
    let elapsed = started.elapsed();
    info!(
        sent = n,
        acks = stats.acks,
        top_of_book = stats.top_of_book,
        elapsed_ms = elapsed.as_millis() as u64,
        "unmatched stress complete"
    );

    Ok(UnmatchedReport {
        stats,
        validation,
        elapsed,
    })
}
