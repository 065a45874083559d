//! Dual-processor matching stress: interleaves crossing pairs across two
//! symbols that route to different server shards by their first
//! character (§4.7 glossary: Shard/Processor).

use std::time::Instant;

use engine_core::Side;
use tracing::info;

use crate::client::EngineClient;
use crate::error::ScenarioError;
use crate::scenario::adaptive::{CATCHUP_TARGET, FINAL_DRAIN_STALL_MS, MAX_DEFICIT};
use crate::scenario::drain::{drain_until_trades, quick_drain};
use crate::scenario::stats::{ResponseStats, ValidationReport};

const SYMBOL_A: &str = "IBM";
const SYMBOL_B: &str = "NVDA";
const USER_ID: u32 = 1;
const PRICE_BUCKETS: u32 = 50;
const CATCHUP_STALL_MS: u64 = 5_000;

pub struct DualReport {
    pub stats: ResponseStats,
    pub validation: ValidationReport,
    pub elapsed: std::time::Duration,
}

/// Sends `pairs_per_symbol` crossing pairs on each of two shard-routed
/// symbols per iteration, so expected trades per input unit doubles
/// relative to [`crate::scenario::adaptive`].
pub fn run(client: &mut EngineClient, pairs_per_symbol: u64) -> Result<DualReport, ScenarioError> {
    let started = Instant::now();
    client.send_flush()?;
    let mut stats = quick_drain(client)?;

    let mut pairs_sent: u64 = 0;

    for i in 0..pairs_per_symbol {
        let price = 100 + (i as u32 % PRICE_BUCKETS);
        let buy_id = (4 * i + 1) as u32;
        let sell_id = (4 * i + 2) as u32;
        let buy_id_b = (4 * i + 3) as u32;
        let sell_id_b = (4 * i + 4) as u32;

        client.send_new_order(USER_ID, SYMBOL_A, price, 10, Side::Buy, buy_id)?;
        stats.merge(quick_drain(client)?);
        client.send_new_order(USER_ID, SYMBOL_A, price, 10, Side::Sell, sell_id)?;
        stats.merge(quick_drain(client)?);

        client.send_new_order(USER_ID, SYMBOL_B, price, 10, Side::Buy, buy_id_b)?;
        stats.merge(quick_drain(client)?);
        client.send_new_order(USER_ID, SYMBOL_B, price, 10, Side::Sell, sell_id_b)?;
        stats.merge(quick_drain(client)?);

        pairs_sent += 2;

        if pairs_sent.saturating_sub(stats.trades) > MAX_DEFICIT {
            let target = pairs_sent.saturating_sub(CATCHUP_TARGET);
            drain_until_trades(client, &mut stats, target, CATCHUP_STALL_MS)?;
        }
    }

    drain_until_trades(client, &mut stats, pairs_sent, FINAL_DRAIN_STALL_MS)?;

    let validation = stats.validation_report(2 * pairs_sent, pairs_sent);
    let elapsed = started.elapsed();
    info!(
        pairs_sent,
        acks = stats.acks,
        trades = stats.trades,
        validation_passed = validation.passed,
        elapsed_ms = elapsed.as_millis() as u64,
        "dual-processor matching stress complete"
    );

    Ok(DualReport {
        stats,
        validation,
        elapsed,
    })
}
