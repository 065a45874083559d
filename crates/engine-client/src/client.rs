//! Unified client: composes a transport with a wire codec behind one API.
//!
//! Construction runs transport/protocol auto-discovery (§4.6) unless the
//! caller pinned both explicitly.

use std::time::Duration;

use engine_core::{InputMessage, OutputMessage, Side};
use engine_protocol::{binary_codec, csv_codec};
use engine_transport::{TcpTransport, UdpTransport};
use tracing::{debug, info, warn};

use crate::config::{EngineClientConfig, ProtocolKind, TransportKind, MAX_CSV_LEN};
use crate::error::ClientError;

/// Two distinct probe order ids, required so the binary and CSV probes
/// never collide as duplicate keys at the server (§4.6 step 6, §9).
const PROBE_ORDER_ID_BINARY: u32 = 999_999_998;
const PROBE_ORDER_ID_CSV: u32 = 999_999_999;
const PROBE_SYMBOL: &str = "ZZPROBE";
const PROBE_WAIT_MS: u64 = 200;
const PROBE_DRAIN_LIMIT: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Binary,
    Csv,
}

enum Transport {
    Tcp(TcpTransport),
    Udp(UdpTransport),
}

/// Sent / received / send-error counters. Saturating, per §4.6.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientStats {
    pub sent: u64,
    pub received: u64,
    pub send_errors: u64,
}

impl ClientStats {
    fn note_send_ok(&mut self) {
        self.sent = self.sent.saturating_add(1);
    }

    fn note_send_err(&mut self) {
        self.send_errors = self.send_errors.saturating_add(1);
    }

    fn note_recv(&mut self) {
        self.received = self.received.saturating_add(1);
    }
}

pub struct EngineClient {
    transport: Transport,
    protocol: Protocol,
    csv_buf: Vec<u8>,
    stats: ClientStats,
}

impl EngineClient {
    /// Connects and runs discovery per the config's `transport`/`protocol`
    /// fields (§4.6).
    pub fn connect(config: &EngineClientConfig) -> Result<Self, ClientError> {
        config.validate().map_err(ClientError::Config)?;

        let (transport, protocol) = match config.transport {
            TransportKind::Tcp => {
                let tcp = TcpTransport::connect(&config.host, config.port)?;
                let protocol = discover_protocol_tcp(tcp, config.protocol)?;
                return Ok(protocol);
            }
            TransportKind::Udp => {
                let udp =
                    UdpTransport::connect(&config.host, config.port, Some(config.udp_recv_timeout_ms))?;
                let protocol = resolve_udp_protocol(config.protocol);
                (Transport::Udp(udp), protocol)
            }
            TransportKind::Auto => match TcpTransport::connect(&config.host, config.port) {
                Ok(tcp) => {
                    info!("auto-discovery selected TCP");
                    let client = discover_protocol_tcp(tcp, config.protocol)?;
                    return Ok(client);
                }
                Err(e) => {
                    warn!(error = %e, "TCP connect refused, falling back to UDP");
                    let udp = UdpTransport::connect(
                        &config.host,
                        config.port,
                        Some(config.udp_recv_timeout_ms),
                    )?;
                    let protocol = resolve_udp_protocol(config.protocol);
                    (Transport::Udp(udp), protocol)
                }
            },
        };

        Ok(EngineClient {
            transport,
            protocol,
            csv_buf: vec![0u8; MAX_CSV_LEN],
            stats: ClientStats::default(),
        })
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn stats(&self) -> ClientStats {
        self.stats
    }

    pub fn send_new_order(
        &mut self,
        user_id: u32,
        symbol: &str,
        price: u32,
        quantity: u32,
        side: Side,
        user_order_id: u32,
    ) -> Result<(), ClientError> {
        let msg = InputMessage::NewOrder(engine_core::NewOrder {
            user_id,
            symbol: symbol.to_string(),
            price,
            quantity,
            side,
            user_order_id,
        });
        self.send_input(&msg)
    }

    pub fn send_cancel(
        &mut self,
        user_id: u32,
        symbol: &str,
        user_order_id: u32,
    ) -> Result<(), ClientError> {
        let msg = InputMessage::Cancel(engine_core::Cancel {
            user_id,
            symbol: symbol.to_string(),
            user_order_id,
        });
        self.send_input(&msg)
    }

    pub fn send_flush(&mut self) -> Result<(), ClientError> {
        self.send_input(&InputMessage::Flush)
    }

    fn send_input(&mut self, msg: &InputMessage) -> Result<(), ClientError> {
        let result = match self.protocol {
            Protocol::Binary => {
                let bytes = binary_codec::encode_input(msg);
                send_bytes(&mut self.transport, &bytes)
            }
            Protocol::Csv => {
                let len = format_csv_input(&mut self.csv_buf, msg).len();
                send_bytes(&mut self.transport, &self.csv_buf[..len])
            }
        };

        match result {
            Ok(()) => {
                self.stats.note_send_ok();
                Ok(())
            }
            Err(e) => {
                self.stats.note_send_err();
                Err(e)
            }
        }
    }

    /// Blocks until one frame/datagram arrives, auto-detecting the codec
    /// on every message by its first byte (§4.6: mixed replies tolerated).
    pub fn recv(&mut self) -> Result<OutputMessage, ClientError> {
        let raw = match &mut self.transport {
            Transport::Tcp(tcp) => tcp.recv()?,
            Transport::Udp(udp) => udp.recv()?,
        };
        self.stats.note_recv();
        decode_any(&raw)
    }

    pub fn try_recv(&mut self, timeout_ms: u64) -> Result<Option<OutputMessage>, ClientError> {
        let raw = match &mut self.transport {
            Transport::Tcp(tcp) => tcp.try_recv(timeout_ms)?,
            Transport::Udp(udp) => udp.try_recv(timeout_ms)?,
        };
        match raw {
            Some(bytes) => {
                self.stats.note_recv();
                decode_any(&bytes).map(Some)
            }
            None => Ok(None),
        }
    }
}

fn resolve_udp_protocol(requested: ProtocolKind) -> Protocol {
    match requested {
        ProtocolKind::Binary => Protocol::Binary,
        // No response path to probe over UDP; default to CSV (§4.6).
        ProtocolKind::Csv | ProtocolKind::Auto => Protocol::Csv,
    }
}

fn send_bytes(transport: &mut Transport, bytes: &[u8]) -> Result<(), ClientError> {
    match transport {
        Transport::Tcp(tcp) => Ok(tcp.send(bytes)?),
        Transport::Udp(udp) => Ok(udp.send(bytes)?),
    }
}

fn format_csv_input<'a>(buf: &'a mut [u8], msg: &InputMessage) -> &'a [u8] {
    match msg {
        InputMessage::NewOrder(n) => csv_codec::format_new_order(
            buf,
            n.user_id,
            &n.symbol,
            n.price,
            n.quantity,
            n.side,
            n.user_order_id,
        ),
        InputMessage::Cancel(c) => csv_codec::format_cancel(buf, c.user_id, c.user_order_id),
        InputMessage::Flush => csv_codec::format_flush(buf),
    }
}

fn decode_any(raw: &[u8]) -> Result<OutputMessage, ClientError> {
    if binary_codec::is_binary(raw) {
        Ok(binary_codec::decode_output(raw)?)
    } else {
        let line = String::from_utf8_lossy(raw);
        Ok(csv_codec::parse_output(&line)?)
    }
}

/// Runs the TCP protocol probe (§4.6) and returns a ready `EngineClient`.
fn discover_protocol_tcp(
    mut tcp: TcpTransport,
    requested: ProtocolKind,
) -> Result<EngineClient, ClientError> {
    let protocol = match requested {
        ProtocolKind::Binary => Protocol::Binary,
        ProtocolKind::Csv => Protocol::Csv,
        ProtocolKind::Auto => probe_tcp_protocol(&mut tcp)?,
    };

    Ok(EngineClient {
        transport: Transport::Tcp(tcp),
        protocol,
        csv_buf: vec![0u8; MAX_CSV_LEN],
        stats: ClientStats::default(),
    })
}

fn probe_tcp_protocol(tcp: &mut TcpTransport) -> Result<Protocol, ClientError> {
    // Step 1-2: binary probe.
    let binary_probe = binary_codec::encode_input(&InputMessage::NewOrder(engine_core::NewOrder {
        user_id: 0,
        symbol: PROBE_SYMBOL.to_string(),
        price: 1,
        quantity: 1,
        side: Side::Buy,
        user_order_id: PROBE_ORDER_ID_BINARY,
    }));
    tcp.send(&binary_probe)?;

    if let Some(reply) = tcp.try_recv(PROBE_WAIT_MS)? {
        if binary_codec::is_binary(&reply) {
            debug!("protocol probe: server replied binary to binary probe");
            cleanup_probe_binary(tcp, PROBE_ORDER_ID_BINARY)?;
            return Ok(Protocol::Binary);
        }
    }

    // Step 4: CSV probe, distinct order id.
    let mut csv_buf = vec![0u8; MAX_CSV_LEN];
    let written = csv_codec::format_new_order(
        &mut csv_buf,
        0,
        PROBE_SYMBOL,
        1,
        1,
        Side::Buy,
        PROBE_ORDER_ID_CSV,
    );
    let len = written.len();
    tcp.send(&csv_buf[..len])?;

    match tcp.try_recv(PROBE_WAIT_MS)? {
        Some(reply) if binary_codec::is_binary(&reply) => {
            debug!("protocol probe: server replied binary to csv probe");
            cleanup_probe_binary(tcp, PROBE_ORDER_ID_CSV)?;
            Ok(Protocol::Binary)
        }
        Some(_reply) => {
            debug!("protocol probe: server replied csv to csv probe");
            cleanup_probe_csv(tcp, PROBE_ORDER_ID_CSV)?;
            Ok(Protocol::Csv)
        }
        None => Err(ClientError::DiscoveryFailed),
    }
}

fn cleanup_probe_binary(tcp: &mut TcpTransport, order_id: u32) -> Result<(), ClientError> {
    let cancel = binary_codec::encode_input(&InputMessage::Cancel(engine_core::Cancel {
        user_id: 0,
        symbol: PROBE_SYMBOL.to_string(),
        user_order_id: order_id,
    }));
    tcp.send(&cancel)?;
    drain_residual(tcp);
    Ok(())
}

fn cleanup_probe_csv(tcp: &mut TcpTransport, order_id: u32) -> Result<(), ClientError> {
    let mut buf = vec![0u8; MAX_CSV_LEN];
    let written = csv_codec::format_cancel(&mut buf, 0, order_id);
    let len = written.len();
    tcp.send(&buf[..len])?;
    drain_residual(tcp);
    Ok(())
}

/// Drains up to [`PROBE_DRAIN_LIMIT`] residual probe replies so they don't
/// pollute the scenario's first real `recv`.
fn drain_residual(tcp: &mut TcpTransport) {
    for _ in 0..PROBE_DRAIN_LIMIT {
        match tcp.try_recv(PROBE_WAIT_MS) {
            Ok(Some(_)) => continue,
            _ => break,
        }
    }
}

/// Time budget helper shared by the scenario drainers (`Duration` wrapper
/// kept here so callers don't need to import `std::time` themselves).
pub fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}
