//! Adaptive matching stress (single-threaded): the default matching
//! scenario. Sends crossing buy/sell pairs while a deficit gate keeps the
//! TCP send path from outrunning the server's response path (§4.7).

use std::time::Instant;

use engine_core::Side;
use tracing::info;

use crate::client::EngineClient;
use crate::error::ScenarioError;
use crate::scenario::drain::{drain_until_trades, quick_drain};
use crate::scenario::stats::{ResponseStats, ValidationReport};

const SYMBOL: &str = "IBM";
const USER_ID: u32 = 1;
const PRICE_BUCKETS: u32 = 50;

/// Maximum allowed `pairs_sent - stats.trades` before the sender pauses
/// to drain.
pub const MAX_DEFICIT: u64 = 5_000;
/// Deficit target once a catch-up drain kicks in.
pub const CATCHUP_TARGET: u64 = 1_000;
/// Terminal stall budget for the final drain, once sending is done.
pub const FINAL_DRAIN_STALL_MS: u64 = 60_000;
/// Stall budget for a mid-send catch-up drain.
const CATCHUP_STALL_MS: u64 = 5_000;

pub struct AdaptiveReport {
    pub stats: ResponseStats,
    pub validation: ValidationReport,
    pub elapsed: std::time::Duration,
}

/// Sends `trades` crossing buy/sell pairs on `IBM`, adaptively draining
/// whenever the pacing deficit exceeds [`MAX_DEFICIT`].
pub fn run(client: &mut EngineClient, trades: u64) -> Result<AdaptiveReport, ScenarioError> {
    let started = Instant::now();
    client.send_flush()?;
    let mut stats = quick_drain(client)?;

    let mut pairs_sent: u64 = 0;

    for i in 0..trades {
        let price = 100 + (i as u32 % PRICE_BUCKETS);

        client.send_new_order(USER_ID, SYMBOL, price, 10, Side::Buy, (2 * i + 1) as u32)?;
        stats.merge(quick_drain(client)?);

        client.send_new_order(USER_ID, SYMBOL, price, 10, Side::Sell, (2 * i + 2) as u32)?;
        stats.merge(quick_drain(client)?);

        pairs_sent += 1;

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
        top_of_book = stats.top_of_book,
        validation_passed = validation.passed,
        elapsed_ms = elapsed.as_millis() as u64,
        "adaptive matching stress complete"
    );

    Ok(AdaptiveReport {
        stats,
        validation,
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pacing_constants_match_spec() {
        assert_eq!(MAX_DEFICIT, 5_000);
        assert_eq!(CATCHUP_TARGET, 1_000);
        assert_eq!(FINAL_DRAIN_STALL_MS, 60_000);
    }
}
