//! Exercises `TcpTransport` against a real loopback socket. No matching
//! engine is involved -- the "server" side here is a bare `TcpListener`
//! that echoes length-prefixed frames back, enough to validate framing
//! and the split sender/receiver handles without a live server.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use engine_transport::TcpTransport;

fn spawn_echo_server() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().unwrap().port();

    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            loop {
                let mut header = [0u8; 4];
                if stream.read_exact(&mut header).is_err() {
                    break;
                }
                let len = u32::from_be_bytes(header) as usize;
                let mut payload = vec![0u8; len];
                if stream.read_exact(&mut payload).is_err() {
                    break;
                }
                if stream.write_all(&header).is_err() || stream.write_all(&payload).is_err() {
                    break;
                }
            }
        }
    });

    port
}

#[test]
fn send_then_recv_round_trips_a_frame() {
    let port = spawn_echo_server();
    let mut transport = TcpTransport::connect("127.0.0.1", port).expect("connect to echo server");

    transport.send(b"hello frame").unwrap();
    let reply = transport.recv().unwrap();
    assert_eq!(reply, b"hello frame");
}

#[test]
fn split_sender_and_receiver_operate_independently() {
    let port = spawn_echo_server();
    let transport = TcpTransport::connect("127.0.0.1", port).expect("connect to echo server");
    let (mut sender, mut receiver) = transport.split().expect("split transport");

    for i in 0..5u8 {
        sender.send(&[i; 3]).unwrap();
    }
    for i in 0..5u8 {
        let reply = receiver.recv().unwrap();
        assert_eq!(reply, vec![i; 3]);
    }
}

#[test]
fn try_recv_times_out_with_no_data() {
    let port = spawn_echo_server();
    let mut transport = TcpTransport::connect("127.0.0.1", port).expect("connect to echo server");
    let result = transport.try_recv(50).unwrap();
    assert!(result.is_none());
}

/// A server that writes a frame's header and half its payload immediately,
/// stalls past any short per-read timeout, then finishes the frame.
fn spawn_slow_trickle_server(payload: Vec<u8>) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().unwrap().port();

    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let header = (payload.len() as u32).to_be_bytes();
            let split = payload.len() / 2;
            let _ = stream.write_all(&header);
            let _ = stream.write_all(&payload[..split]);
            thread::sleep(Duration::from_millis(1_200));
            let _ = stream.write_all(&payload[split..]);
        }
    });

    port
}

#[test]
fn try_recv_does_not_abandon_a_frame_already_in_flight() {
    let payload = b"partial-frame-should-still-complete".to_vec();
    let port = spawn_slow_trickle_server(payload.clone());
    let mut transport = TcpTransport::connect("127.0.0.1", port).expect("connect to slow server");

    // A short timeout budget would wrongly return `None` if a partial
    // frame in flight were abandoned instead of waited out.
    let reply = transport.try_recv(50).unwrap();
    assert_eq!(reply, Some(payload));
}
