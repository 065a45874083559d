//! Batched matching stress: an alternative to [`crate::scenario::adaptive`]
//! that paces against a fixed batch size instead of reacting to observed
//! trade arrivals (§4.7, §9).

use std::time::Instant;

use engine_core::Side;
use tracing::info;

use crate::client::EngineClient;
use crate::error::ScenarioError;
use crate::scenario::drain::{batch_drain, patient_drain};
use crate::scenario::stats::{ResponseStats, ValidationReport};

const SYMBOL: &str = "IBM";
const USER_ID: u32 = 1;
const PRICE_BUCKETS: u32 = 50;

/// Pairs sent per batch before draining.
pub const BATCH_SIZE: u64 = 100;
/// Replies per pair: 2 acks + 1 trade + 2 top-of-book updates.
const REPLIES_PER_PAIR: u64 = 5;
const BATCH_MAX_EMPTY: u32 = 200;
const BATCH_POLL_MS: u64 = 10;
const FINAL_DRAIN_TIMEOUT_MS: u64 = 60_000;

pub struct BatchedReport {
    pub stats: ResponseStats,
    pub validation: ValidationReport,
    pub elapsed: std::time::Duration,
}

pub fn run(client: &mut EngineClient, trades: u64) -> Result<BatchedReport, ScenarioError> {
    let started = Instant::now();
    client.send_flush()?;
    let mut stats = ResponseStats::new();

    let mut pairs_sent: u64 = 0;
    let mut pairs_in_batch: u64 = 0;

    for i in 0..trades {
        let price = 100 + (i as u32 % PRICE_BUCKETS);

        client.send_new_order(USER_ID, SYMBOL, price, 10, Side::Buy, (2 * i + 1) as u32)?;
        client.send_new_order(USER_ID, SYMBOL, price, 10, Side::Sell, (2 * i + 2) as u32)?;
        pairs_sent += 1;
        pairs_in_batch += 1;

        if pairs_in_batch >= BATCH_SIZE {
            let expected = pairs_in_batch * REPLIES_PER_PAIR;
            stats.merge(batch_drain(client, expected, BATCH_MAX_EMPTY, BATCH_POLL_MS)?);
            pairs_in_batch = 0;
        }
    }

    if pairs_in_batch > 0 {
        let expected = pairs_in_batch * REPLIES_PER_PAIR;
        stats.merge(batch_drain(client, expected, BATCH_MAX_EMPTY, BATCH_POLL_MS)?);
    }

    stats.merge(patient_drain(
        client,
        pairs_sent * REPLIES_PER_PAIR,
        FINAL_DRAIN_TIMEOUT_MS,
    )?);

    let validation = stats.validation_report(2 * pairs_sent, pairs_sent);
    let elapsed = started.elapsed();
    info!(
        pairs_sent,
        acks = stats.acks,
        trades = stats.trades,
        validation_passed = validation.passed,
        elapsed_ms = elapsed.as_millis() as u64,
        "batched matching stress complete"
    );

    Ok(BatchedReport {
        stats,
        validation,
        elapsed,
    })
}
