//! End-to-end scenarios (S1-S6) and cross-cutting invariants, driven over
//! an in-memory datagram pair with scripted loss/corruption so results
//! are deterministic instead of depending on the real RNG-driven shim.

use std::net::SocketAddr;
use std::time::Duration;

use gbnet::channel::Disruption;
use gbnet::packet::PAYLOAD_LEN;
use gbnet::testkit::{ChannelDatagram, ScriptedLoss};
use gbnet::{Config, Error, GbnSocket, Status};

fn addrs() -> (SocketAddr, SocketAddr) {
    ("127.0.0.1:9001".parse().unwrap(), "127.0.0.1:9002".parse().unwrap())
}

fn fast_config() -> Config {
    Config {
        timeout: Duration::from_millis(40),
        ..Config::default()
    }
}

/// S1 — Happy path: no loss, no corruption, window must reach 4.
#[test]
fn s1_happy_path_reaches_full_window() {
    let (client_addr, server_addr) = addrs();
    let (client_dgram, server_dgram) = ChannelDatagram::pair(client_addr, server_addr);
    let config = fast_config();

    let server = std::thread::spawn(move || {
        let mut socket =
            GbnSocket::with_loss_model(server_dgram, config, ScriptedLoss::always(Disruption::None));
        socket.bind("0.0.0.0:0".parse().unwrap()).unwrap();
        socket.listen(1).unwrap();
        socket.accept().unwrap();

        let mut received = Vec::new();
        let mut buf = vec![0u8; PAYLOAD_LEN];
        loop {
            let n = socket.recv(&mut buf).unwrap();
            if n == 0 && socket.status() == Status::FinRcvd {
                break;
            }
            received.extend_from_slice(&buf[..n]);
        }
        received
    });

    let mut client =
        GbnSocket::with_loss_model(client_dgram, config, ScriptedLoss::always(Disruption::None));
    client.connect(server_addr).unwrap();

    let payload: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
    client.send(&payload).unwrap();
    assert_eq!(client.window(), 4, "window must reach 4 on a clean run");
    client.close().unwrap();

    let received = server.join().unwrap();
    assert_eq!(received, payload);
}

/// S2 — Single loss recovery: the first DATAACK is dropped once.
#[test]
fn s2_single_ack_loss_recovers() {
    let (client_addr, server_addr) = addrs();
    let (client_dgram, server_dgram) = ChannelDatagram::pair(client_addr, server_addr);
    let config = fast_config();

    let server = std::thread::spawn(move || {
        let mut socket =
            GbnSocket::with_loss_model(server_dgram, config, ScriptedLoss::always(Disruption::None));
        socket.bind("0.0.0.0:0".parse().unwrap()).unwrap();
        socket.listen(1).unwrap();
        socket.accept().unwrap();

        let mut received = Vec::new();
        let mut buf = vec![0u8; PAYLOAD_LEN];
        loop {
            let n = socket.recv(&mut buf).unwrap();
            if n == 0 && socket.status() == Status::FinRcvd {
                break;
            }
            received.extend_from_slice(&buf[..n]);
        }
        received
    });

    // Client's inbound channel sees: the SYNACK, then the first DATAACK
    // (dropped), then everything else passes.
    let client_loss = ScriptedLoss::new([Disruption::None, Disruption::Lost], Disruption::None);
    let mut client = GbnSocket::with_loss_model(client_dgram, config, client_loss);
    client.connect(server_addr).unwrap();

    let payload = vec![0u8; 2048];
    client.send(&payload).unwrap();
    client.close().unwrap();

    let received = server.join().unwrap();
    assert_eq!(received, payload);
}

/// S3 — Corruption recovery: the first DATA packet is corrupted in transit.
#[test]
fn s3_corrupted_data_packet_recovers() {
    let (client_addr, server_addr) = addrs();
    let (client_dgram, server_dgram) = ChannelDatagram::pair(client_addr, server_addr);
    let config = fast_config();

    // Server's inbound channel sees: the SYN, then the first DATA
    // (corrupted), then everything else passes.
    let server_loss = ScriptedLoss::new([Disruption::None, Disruption::Corrupted], Disruption::None);
    let server = std::thread::spawn(move || {
        let mut socket = GbnSocket::with_loss_model(server_dgram, config, server_loss);
        socket.bind("0.0.0.0:0".parse().unwrap()).unwrap();
        socket.listen(1).unwrap();
        socket.accept().unwrap();

        let mut received = Vec::new();
        let mut buf = vec![0u8; PAYLOAD_LEN];
        loop {
            let n = socket.recv(&mut buf).unwrap();
            if n == 0 && socket.status() == Status::FinRcvd {
                break;
            }
            received.extend_from_slice(&buf[..n]);
        }
        received
    });

    let mut client =
        GbnSocket::with_loss_model(client_dgram, config, ScriptedLoss::always(Disruption::None));
    client.connect(server_addr).unwrap();

    let pattern = b"hello world";
    let payload: Vec<u8> = pattern.iter().cycle().take(3000).copied().collect();
    client.send(&payload).unwrap();
    client.close().unwrap();

    let received = server.join().unwrap();
    assert_eq!(received, payload);
}

/// S4 — Broken connection: the server replies to every SYN, but every
/// SYNACK the client would receive is lost in transit.
#[test]
fn s4_broken_connection_after_five_timeouts() {
    let (client_addr, server_addr) = addrs();
    let (client_dgram, server_dgram) = ChannelDatagram::pair(client_addr, server_addr);
    let config = fast_config();

    let server = std::thread::spawn(move || {
        let mut socket =
            GbnSocket::with_loss_model(server_dgram, config, ScriptedLoss::always(Disruption::None));
        socket.bind("0.0.0.0:0".parse().unwrap()).unwrap();
        socket.listen(1).unwrap();
        socket.accept().unwrap();
        // Keep the channel endpoints alive so the client's later SYN
        // retransmissions still have somewhere to land, even though every
        // SYNACK reply is dropped on the client's side.
        std::thread::sleep(Duration::from_millis(500));
    });

    let mut client =
        GbnSocket::with_loss_model(client_dgram, config, ScriptedLoss::always(Disruption::Lost));
    let err = client.connect(server_addr).unwrap_err();
    assert!(matches!(err, Error::ConnectionBroken(5)));
    assert_eq!(client.status(), Status::Broken);

    server.join().unwrap();
}

/// S5 — Handshake recovers from a dropped first attempt on
/// retransmission. The spec's literal validation-failure path (a
/// corrupt/out-of-order SYNACK) is fatal with no retry (see the unit
/// test below); this scenario's externally observable shape — first
/// attempt silently fails, the next retransmission succeeds — is
/// reached here by losing the first SYN in flight to the server, so the
/// responder's single blocking `accept` never sees it and only answers
/// the client's retransmission.
#[test]
fn s5_handshake_recovers_after_lost_first_syn() {
    let (client_addr, server_addr) = addrs();
    let (client_dgram, server_dgram) = ChannelDatagram::pair(client_addr, server_addr);
    let config = fast_config();

    let server_loss = ScriptedLoss::new([Disruption::Lost], Disruption::None);
    let server = std::thread::spawn(move || {
        let mut socket = GbnSocket::with_loss_model(server_dgram, config, server_loss);
        socket.bind("0.0.0.0:0".parse().unwrap()).unwrap();
        socket.listen(1).unwrap();
        socket.accept().unwrap();
        socket
    });

    let mut client =
        GbnSocket::with_loss_model(client_dgram, config, ScriptedLoss::always(Disruption::None));
    client.connect(server_addr).unwrap();
    assert_eq!(client.status(), Status::Established);

    server.join().unwrap();
}

/// Direct unit coverage of §4.4's "no additional retries" rule: a
/// corrupted SYNACK fails the connect call immediately.
#[test]
fn connect_fails_immediately_on_corrupt_synack() {
    let (client_addr, server_addr) = addrs();
    let (client_dgram, server_dgram) = ChannelDatagram::pair(client_addr, server_addr);
    let config = fast_config();

    let server = std::thread::spawn(move || {
        let mut socket =
            GbnSocket::with_loss_model(server_dgram, config, ScriptedLoss::always(Disruption::None));
        socket.bind("0.0.0.0:0".parse().unwrap()).unwrap();
        socket.listen(1).unwrap();
        let _ = socket.accept();
    });

    let client_loss = ScriptedLoss::new([Disruption::Corrupted], Disruption::None);
    let mut client = GbnSocket::with_loss_model(client_dgram, config, client_loss);
    let err = client.connect(server_addr).unwrap_err();
    assert!(matches!(err, Error::HandshakeCorrupt));

    server.join().unwrap();
}

/// S6 — Orderly close: after a successful send, the server's next recv
/// call observes FIN_RCVD and the client's close succeeds.
#[test]
fn s6_orderly_close() {
    let (client_addr, server_addr) = addrs();
    let (client_dgram, server_dgram) = ChannelDatagram::pair(client_addr, server_addr);
    let config = fast_config();

    let server = std::thread::spawn(move || {
        let mut socket =
            GbnSocket::with_loss_model(server_dgram, config, ScriptedLoss::always(Disruption::None));
        socket.bind("0.0.0.0:0".parse().unwrap()).unwrap();
        socket.listen(1).unwrap();
        socket.accept().unwrap();

        let mut buf = vec![0u8; PAYLOAD_LEN];
        let n = socket.recv(&mut buf).unwrap();
        assert_eq!(n, 1024);

        let n = socket.recv(&mut buf).unwrap();
        assert_eq!(n, 0);
        assert_eq!(socket.status(), Status::FinRcvd);
    });

    let mut client =
        GbnSocket::with_loss_model(client_dgram, config, ScriptedLoss::always(Disruption::None));
    client.connect(server_addr).unwrap();
    client.send(&vec![7u8; 1024]).unwrap();
    client.close().unwrap();
    assert_eq!(client.status(), Status::Closed);

    server.join().unwrap();
}

/// Boundary: len=0 submits nothing and returns 0 without touching state.
#[test]
fn send_zero_bytes_is_a_no_op() {
    let (client_addr, server_addr) = addrs();
    let (client_dgram, _server_dgram) = ChannelDatagram::pair(client_addr, server_addr);
    let config = fast_config();
    let mut client =
        GbnSocket::with_loss_model(client_dgram, config, ScriptedLoss::always(Disruption::None));
    // No handshake performed: CLOSED is not in {BOUND, BROKEN}, and an
    // empty buffer short-circuits before the peer address is ever needed.
    assert_eq!(client.send(&[]).unwrap(), 0);
    assert_eq!(client.status(), Status::Closed);
}

/// Boundary: a length that is an exact multiple of the segment size keeps
/// the final segment's payload length at 1024, not 0.
#[test]
fn exact_multiple_segment_keeps_full_final_payload() {
    use gbnet::Packet;
    let payload = vec![9u8; PAYLOAD_LEN];
    let pkt = Packet::data(0, &payload);
    assert_eq!(pkt.payload().len(), PAYLOAD_LEN);
}

/// Sequence wraparound: sending more than 256 segments' worth of data
/// still delivers everything in order.
#[test]
fn sequence_number_wraparound_preserves_order() {
    let (client_addr, server_addr) = addrs();
    let (client_dgram, server_dgram) = ChannelDatagram::pair(client_addr, server_addr);
    let config = fast_config();

    let total_len = PAYLOAD_LEN * 300;
    let payload: Vec<u8> = (0..total_len).map(|i| (i % 256) as u8).collect();
    let expected = payload.clone();

    let server = std::thread::spawn(move || {
        let mut socket =
            GbnSocket::with_loss_model(server_dgram, config, ScriptedLoss::always(Disruption::None));
        socket.bind("0.0.0.0:0".parse().unwrap()).unwrap();
        socket.listen(1).unwrap();
        socket.accept().unwrap();

        let mut received = Vec::new();
        let mut buf = vec![0u8; PAYLOAD_LEN];
        loop {
            let n = socket.recv(&mut buf).unwrap();
            if n == 0 && socket.status() == Status::FinRcvd {
                break;
            }
            received.extend_from_slice(&buf[..n]);
        }
        received
    });

    let mut client =
        GbnSocket::with_loss_model(client_dgram, config, ScriptedLoss::always(Disruption::None));
    client.connect(server_addr).unwrap();
    client.send(&payload).unwrap();
    client.close().unwrap();

    let received = server.join().unwrap();
    assert_eq!(received, expected);
}
