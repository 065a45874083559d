//! A minimal in-process stand-in for the matching-engine server, used to
//! exercise the scenario engine's drain/pacing logic without a real
//! server (the actual matching engine is out of scope for this
//! workspace, per spec §1 -- it is a black box known only by its wire
//! behaviour).
//!
//! Speaks the binary protocol only and always replies in binary; the
//! handful of scenario tests that use it pin `ProtocolKind::Binary`
//! explicitly rather than exercising the TCP auto-probe, which has its
//! own dedicated test.
//!
//! Matching model: one resting order per side per symbol. Good enough
//! for the scenario flows under test, which only ever rest a single
//! crossing counterpart at a time.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

use engine_core::{Ack, CancelAck, OutputMessage, Side, TopOfBook, Trade};
use engine_protocol::binary_codec;

const MAGIC: u8 = 0x4D;

#[derive(Clone, Copy)]
struct Resting {
    price: u32,
    quantity: u32,
    user_id: u32,
    order_id: u32,
}

#[derive(Default)]
struct Book {
    buy: Option<Resting>,
    sell: Option<Resting>,
}

/// Spawns a background thread that accepts exactly one TCP connection and
/// serves it until the peer closes the socket.
pub fn spawn_fake_engine() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().unwrap().port();

    thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            serve(stream);
        }
    });

    port
}

fn serve(mut stream: TcpStream) {
    let mut books: HashMap<String, Book> = HashMap::new();

    loop {
        let mut header = [0u8; 4];
        if stream.read_exact(&mut header).is_err() {
            return;
        }
        let len = u32::from_be_bytes(header) as usize;
        let mut payload = vec![0u8; len];
        if stream.read_exact(&mut payload).is_err() {
            return;
        }
        if payload.len() < 2 || payload[0] != MAGIC {
            continue;
        }

        let replies = match payload[1] {
            b'N' if payload.len() >= 30 => handle_new_order(&mut books, &payload),
            b'C' if payload.len() >= 11 => handle_cancel(&payload),
            b'F' => {
                books.clear();
                Vec::new()
            }
            _ => Vec::new(),
        };

        for reply in replies {
            let bytes = binary_codec::encode_output(&reply);
            if write_frame(&mut stream, &bytes).is_err() {
                return;
            }
        }
    }
}

fn write_frame(stream: &mut TcpStream, payload: &[u8]) -> std::io::Result<()> {
    stream.write_all(&(payload.len() as u32).to_be_bytes())?;
    stream.write_all(payload)
}

fn decode_symbol(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

fn be_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes(bytes.try_into().unwrap())
}

fn handle_new_order(books: &mut HashMap<String, Book>, buf: &[u8]) -> Vec<OutputMessage> {
    let user_id = be_u32(&buf[2..6]);
    let symbol = decode_symbol(&buf[6..14]);
    let price = be_u32(&buf[14..18]);
    let quantity = be_u32(&buf[18..22]);
    let side = if buf[22] == b'S' { Side::Sell } else { Side::Buy };
    let order_id = be_u32(&buf[23..27]);

    let mut out = vec![OutputMessage::Ack(Ack {
        symbol: symbol.clone(),
        user_id,
        user_order_id: order_id,
    })];

    let book = books.entry(symbol.clone()).or_default();
    let incoming = Resting {
        price,
        quantity,
        user_id,
        order_id,
    };

    let opposite = match side {
        Side::Buy => &mut book.sell,
        Side::Sell => &mut book.buy,
    };

    if let Some(resting) = opposite.filter(|r| r.price == price && r.quantity == quantity) {
        *opposite = None;
        let (buy, sell) = match side {
            Side::Buy => (incoming, resting),
            Side::Sell => (resting, incoming),
        };
        out.push(OutputMessage::Trade(Trade {
            symbol: symbol.clone(),
            buy_user_id: buy.user_id,
            buy_order_id: buy.order_id,
            sell_user_id: sell.user_id,
            sell_order_id: sell.order_id,
            price,
            quantity,
        }));
        out.push(OutputMessage::TopOfBook(TopOfBook {
            symbol: symbol.clone(),
            side: Side::Buy,
            price: 0,
            quantity: 0,
        }));
        out.push(OutputMessage::TopOfBook(TopOfBook {
            symbol,
            side: Side::Sell,
            price: 0,
            quantity: 0,
        }));
    } else {
        let own = match side {
            Side::Buy => &mut book.buy,
            Side::Sell => &mut book.sell,
        };
        *own = Some(incoming);
        out.push(OutputMessage::TopOfBook(TopOfBook {
            symbol,
            side,
            price,
            quantity,
        }));
    }

    out
}

fn handle_cancel(buf: &[u8]) -> Vec<OutputMessage> {
    let user_id = be_u32(&buf[2..6]);
    let order_id = be_u32(&buf[6..10]);
    vec![OutputMessage::CancelAck(CancelAck {
        symbol: String::new(),
        user_id,
        user_order_id: order_id,
    })]
}
