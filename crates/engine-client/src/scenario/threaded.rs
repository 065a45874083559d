//! Threaded matching stress: one sender thread, one receiver thread,
//! synchronised solely through relaxed-monotonic atomic counters and two
//! atomic booleans (§4.7, §5, §9).
//!
//! The split handle design is spelled out in `engine_transport::tcp`:
//! the sender half owns the write-capable socket clone, the receiver
//! half owns the frame reader and the read-capable clone. Neither field
//! is touched by both threads.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use engine_core::Side;
use engine_protocol::{binary_codec, csv_codec};
use engine_transport::{TcpReceiver, TcpSender, TcpTransport};
use tracing::{debug, info};

use crate::client::Protocol;
use crate::error::ClientError;
use crate::scenario::stats::ResponseStats;

const SYMBOL: &str = "IBM";
const USER_ID: u32 = 1;
const PRICE_BUCKETS: u32 = 50;
const RECEIVER_POLL_MS: u64 = 1;
const TAIL_DRAIN_POLL_MS: u64 = 10;
const TAIL_DRAIN_MAX_EMPTY: u32 = 100;
const TAIL_DRAIN_IDLE_CAP_MS: u64 = 5_000;
const MESSAGES_JOIN_TIMEOUT_MS: u64 = 10_000;

/// Shared atomic state block, reachable by both threads (§9).
struct SharedState {
    pairs_sent: AtomicU64,
    messages_received: AtomicU64,
    acks: AtomicU64,
    cancel_acks: AtomicU64,
    trades: AtomicU64,
    top_of_book: AtomicU64,
    rejects: AtomicU64,
    parse_errors: AtomicU64,
    send_errors: AtomicU64,
    recv_errors: AtomicU64,
    sender_done: AtomicBool,
    receiver_should_stop: AtomicBool,
    target_trades: u64,
    start_time_ns: AtomicU64,
    send_end_time_ns: AtomicU64,
}

impl SharedState {
    fn new(target_trades: u64) -> Self {
        SharedState {
            pairs_sent: AtomicU64::new(0),
            messages_received: AtomicU64::new(0),
            acks: AtomicU64::new(0),
            cancel_acks: AtomicU64::new(0),
            trades: AtomicU64::new(0),
            top_of_book: AtomicU64::new(0),
            rejects: AtomicU64::new(0),
            parse_errors: AtomicU64::new(0),
            send_errors: AtomicU64::new(0),
            recv_errors: AtomicU64::new(0),
            sender_done: AtomicBool::new(false),
            receiver_should_stop: AtomicBool::new(false),
            target_trades,
            start_time_ns: AtomicU64::new(engine_core::now_ns()),
            send_end_time_ns: AtomicU64::new(0),
        }
    }
}

pub struct ThreadedReport {
    pub pairs_sent: u64,
    pub messages_received: u64,
    pub stats: ResponseStats,
    pub send_errors: u64,
    pub recv_errors: u64,
    pub elapsed: Duration,
}

/// Runs the two-thread sender/receiver variant directly against a fresh
/// TCP connection (bypassing `EngineClient`, since the split socket
/// handles are a transport-level concern owned by this scenario).
pub fn run(host: &str, port: u16, protocol: Protocol, target_trades: u64) -> Result<ThreadedReport, ClientError> {
    let started = Instant::now();
    let transport = TcpTransport::connect(host, port)?;
    let (sender_half, receiver_half) = transport.split()?;

    let state = Arc::new(SharedState::new(target_trades));

    let sender_state = Arc::clone(&state);
    let sender_handle = thread::spawn(move || {
        sender_loop(sender_half, protocol, sender_state);
    });

    let receiver_state = Arc::clone(&state);
    let receiver_handle = thread::spawn(move || {
        receiver_loop(receiver_half, receiver_state);
    });

    report_progress_until_sender_done(&sender_handle, &state, target_trades);
    let _ = sender_handle.join();

    wait_for_messages_or_timeout(&state, target_trades);
    state.receiver_should_stop.store(true, Ordering::Relaxed);
    let _ = receiver_handle.join();

    let stats = ResponseStats {
        acks: state.acks.load(Ordering::Relaxed),
        cancel_acks: state.cancel_acks.load(Ordering::Relaxed),
        trades: state.trades.load(Ordering::Relaxed),
        top_of_book: state.top_of_book.load(Ordering::Relaxed),
        rejects: state.rejects.load(Ordering::Relaxed),
        parse_errors: state.parse_errors.load(Ordering::Relaxed),
    };
    let pairs_sent = state.pairs_sent.load(Ordering::Relaxed);
    let messages_received = state.messages_received.load(Ordering::Relaxed);
    let send_errors = state.send_errors.load(Ordering::Relaxed);
    let recv_errors = state.recv_errors.load(Ordering::Relaxed);
    let elapsed = started.elapsed();

    info!(
        pairs_sent,
        messages_received,
        trades = stats.trades,
        send_errors,
        recv_errors,
        elapsed_ms = elapsed.as_millis() as u64,
        "threaded matching stress complete"
    );

    Ok(ThreadedReport {
        pairs_sent,
        messages_received,
        stats,
        send_errors,
        recv_errors,
        elapsed,
    })
}

fn sender_loop(mut sender: TcpSender, protocol: Protocol, state: Arc<SharedState>) {
    let mut csv_buf = vec![0u8; crate::config::MAX_CSV_LEN];

    for i in 0..state.target_trades {
        let price = 100 + (i as u32 % PRICE_BUCKETS);
        let buy_id = (2 * i + 1) as u32;
        let sell_id = (2 * i + 2) as u32;

        let buy_ok = send_new_order(&mut sender, protocol, &mut csv_buf, buy_id, price, Side::Buy);
        let sell_ok = send_new_order(&mut sender, protocol, &mut csv_buf, sell_id, price, Side::Sell);

        if buy_ok && sell_ok {
            state.pairs_sent.fetch_add(1, Ordering::Relaxed);
        } else {
            state.send_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    state
        .send_end_time_ns
        .store(engine_core::now_ns(), Ordering::Relaxed);
    state.sender_done.store(true, Ordering::Relaxed);
}

fn send_new_order(
    sender: &mut TcpSender,
    protocol: Protocol,
    csv_buf: &mut [u8],
    order_id: u32,
    price: u32,
    side: Side,
) -> bool {
    match protocol {
        Protocol::Binary => {
            let bytes = binary_codec::encode_input(&engine_core::InputMessage::NewOrder(
                engine_core::NewOrder {
                    user_id: USER_ID,
                    symbol: SYMBOL.to_string(),
                    price,
                    quantity: 10,
                    side,
                    user_order_id: order_id,
                },
            ));
            sender.send(&bytes).is_ok()
        }
        Protocol::Csv => {
            let written =
                csv_codec::format_new_order(csv_buf, USER_ID, SYMBOL, price, 10, side, order_id);
            let len = written.len();
            sender.send(&csv_buf[..len]).is_ok()
        }
    }
}

fn receiver_loop(mut receiver: TcpReceiver, state: Arc<SharedState>) {
    loop {
        if state.receiver_should_stop.load(Ordering::Relaxed) {
            break;
        }

        match receiver.try_recv(RECEIVER_POLL_MS) {
            Ok(Some(raw)) => {
                record_message(&raw, &state);
            }
            Ok(None) => {}
            Err(_) => {
                state.recv_errors.fetch_add(1, Ordering::Relaxed);
            }
        }

        let sender_done = state.sender_done.load(Ordering::Relaxed);
        let received = state.messages_received.load(Ordering::Relaxed);
        let needed = 5 * state.target_trades;

        if sender_done && received >= needed {
            break;
        }
        if sender_done {
            tail_drain(&mut receiver, &state);
            break;
        }
    }
}

/// Once the sender is done, keep polling for stragglers until either
/// [`TAIL_DRAIN_MAX_EMPTY`] consecutive empty polls or
/// [`TAIL_DRAIN_IDLE_CAP_MS`] of total idle time has elapsed.
fn tail_drain(receiver: &mut TcpReceiver, state: &Arc<SharedState>) {
    let idle_cap = Duration::from_millis(TAIL_DRAIN_IDLE_CAP_MS);
    let idle_started = Instant::now();
    let mut consecutive_empty = 0u32;

    while consecutive_empty < TAIL_DRAIN_MAX_EMPTY && idle_started.elapsed() < idle_cap {
        if state.receiver_should_stop.load(Ordering::Relaxed) {
            return;
        }
        match receiver.try_recv(TAIL_DRAIN_POLL_MS) {
            Ok(Some(raw)) => {
                record_message(&raw, state);
                consecutive_empty = 0;
            }
            Ok(None) => consecutive_empty += 1,
            Err(_) => {
                state.recv_errors.fetch_add(1, Ordering::Relaxed);
                consecutive_empty += 1;
            }
        }
    }
}

fn record_message(raw: &[u8], state: &Arc<SharedState>) {
    let decoded = if binary_codec::is_binary(raw) {
        binary_codec::decode_output(raw).map_err(|_| ())
    } else {
        let line = String::from_utf8_lossy(raw);
        csv_codec::parse_output(&line).map_err(|_| ())
    };

    state.messages_received.fetch_add(1, Ordering::Relaxed);
    match decoded {
        Ok(engine_core::OutputMessage::Ack(_)) => {
            state.acks.fetch_add(1, Ordering::Relaxed);
        }
        Ok(engine_core::OutputMessage::CancelAck(_)) => {
            state.cancel_acks.fetch_add(1, Ordering::Relaxed);
        }
        Ok(engine_core::OutputMessage::Trade(_)) => {
            state.trades.fetch_add(1, Ordering::Relaxed);
        }
        Ok(engine_core::OutputMessage::TopOfBook(_)) => {
            state.top_of_book.fetch_add(1, Ordering::Relaxed);
        }
        Ok(engine_core::OutputMessage::Reject(_)) => {
            state.rejects.fetch_add(1, Ordering::Relaxed);
        }
        Err(()) => {
            state.parse_errors.fetch_add(1, Ordering::Relaxed);
        }
    }
}

fn report_progress_until_sender_done(
    sender_handle: &thread::JoinHandle<()>,
    state: &Arc<SharedState>,
    target_trades: u64,
) {
    let mut reported = [false; 3];
    let thresholds = [25u64, 50, 75];

    while !sender_handle.is_finished() {
        let sent = state.pairs_sent.load(Ordering::Relaxed);
        let pct = if target_trades == 0 {
            100
        } else {
            sent.saturating_mul(100) / target_trades
        };
        for (idx, threshold) in thresholds.iter().enumerate() {
            if !reported[idx] && pct >= *threshold {
                reported[idx] = true;
                debug!(pct = threshold, pairs_sent = sent, "threaded scenario progress");
            }
        }
        thread::sleep(Duration::from_millis(50));
    }
}

fn wait_for_messages_or_timeout(state: &Arc<SharedState>, _target_trades: u64) {
    let deadline = Instant::now() + Duration::from_millis(MESSAGES_JOIN_TIMEOUT_MS);
    let pairs_sent = state.pairs_sent.load(Ordering::Relaxed);
    let needed = 5 * pairs_sent;

    while Instant::now() < deadline {
        if state.messages_received.load(Ordering::Relaxed) >= needed {
            return;
        }
        thread::sleep(Duration::from_millis(20));
    }
}
