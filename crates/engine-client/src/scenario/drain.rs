//! Shared drain primitives (§4.7).
//!
//! Every drainer runs the same parse step: detect the codec by first byte
//! and parse; a parse failure increments `parse_errors` and is otherwise
//! ignored, never aborting the scenario. A transport-level failure
//! (connection closed, oversized/poisoned frame) is fatal per §7 and
//! propagates out instead.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::client::EngineClient;
use crate::error::ClientError;
use crate::scenario::stats::ResponseStats;

/// Safety cap on [`quick_drain`] iterations, so a misbehaving server that
/// never stops replying can't spin the sender loop forever.
pub const QUICK_DRAIN_LIMIT: u32 = 10_000;

/// Consecutive empty `try_recv` polls [`patient_drain`] tolerates before
/// giving up and returning what it has.
pub const MAX_CONSECUTIVE_EMPTY: u32 = 500;

/// Polls once and folds the result into `stats`. Returns `Ok(true)` if a
/// message (or a recoverable parse failure) was observed, `Ok(false)` on
/// an empty poll, `Err` only for a fatal transport failure.
fn poll_once(client: &mut EngineClient, timeout_ms: u64, stats: &mut ResponseStats) -> Result<bool, ClientError> {
    match client.try_recv(timeout_ms) {
        Ok(Some(msg)) => {
            stats.add(&msg);
            Ok(true)
        }
        Ok(None) => Ok(false),
        Err(ClientError::Decode(_)) | Err(ClientError::Parse(_)) => {
            stats.note_parse_error();
            Ok(true)
        }
        Err(fatal) => Err(fatal),
    }
}

/// Non-blocking drain: polls with `try_recv(0)` until it gets an empty
/// result or [`QUICK_DRAIN_LIMIT`] iterations have run.
pub fn quick_drain(client: &mut EngineClient) -> Result<ResponseStats, ClientError> {
    let mut stats = ResponseStats::new();
    for _ in 0..QUICK_DRAIN_LIMIT {
        if !poll_once(client, 0, &mut stats)? {
            break;
        }
    }
    Ok(stats)
}

/// Polls roughly every 10ms until `stats.total() >= expected`, the
/// `timeout_ms` wall-clock budget elapses, or [`MAX_CONSECUTIVE_EMPTY`]
/// empty polls accumulate. A non-empty receive resets the empty counter.
pub fn patient_drain(
    client: &mut EngineClient,
    expected: u64,
    timeout_ms: u64,
) -> Result<ResponseStats, ClientError> {
    let mut stats = ResponseStats::new();
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    let mut consecutive_empty = 0u32;

    while stats.total() < expected && Instant::now() < deadline {
        if poll_once(client, 10, &mut stats)? {
            consecutive_empty = 0;
        } else {
            consecutive_empty += 1;
            if consecutive_empty >= MAX_CONSECUTIVE_EMPTY {
                debug!("patient_drain giving up after {consecutive_empty} empty polls");
                break;
            }
        }
    }
    Ok(stats)
}

/// Like [`patient_drain`] but paces against a raw message count rather
/// than `ResponseStats::total()`, for callers tracking a fixed-size send
/// batch (§4.7 batched matching stress).
pub fn batch_drain(
    client: &mut EngineClient,
    expected: u64,
    max_empty: u32,
    poll_ms: u64,
) -> Result<ResponseStats, ClientError> {
    let mut stats = ResponseStats::new();
    let mut received = 0u64;
    let mut consecutive_empty = 0u32;

    while received < expected {
        if poll_once(client, poll_ms, &mut stats)? {
            received += 1;
            consecutive_empty = 0;
        } else {
            consecutive_empty += 1;
            if consecutive_empty >= max_empty {
                break;
            }
        }
    }
    Ok(stats)
}

/// Loops until `stats.trades >= target_trades` or no new trade has
/// arrived for `max_stall_ms`. The stall timer is keyed on the `trades`
/// counter changing, not on raw receive activity (§4.7).
pub fn drain_until_trades(
    client: &mut EngineClient,
    stats: &mut ResponseStats,
    target_trades: u64,
    max_stall_ms: u64,
) -> Result<(), ClientError> {
    let stall_budget = Duration::from_millis(max_stall_ms);
    let mut last_trade_progress = Instant::now();

    while stats.trades < target_trades {
        let trades_before = stats.trades;
        poll_once(client, 10, stats)?;
        if stats.trades > trades_before {
            last_trade_progress = Instant::now();
        } else if last_trade_progress.elapsed() >= stall_budget {
            debug!("drain_until_trades stalled at {} trades", stats.trades);
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quick_drain_limit_and_empty_constants_are_sane() {
        assert!(QUICK_DRAIN_LIMIT > 0);
        assert!(MAX_CONSECUTIVE_EMPTY > 0);
    }
}
