//! End-to-end tests for the full connection: two engines wired back to back
//! in memory, segments shuttled by hand, time advanced by virtual ticks.
//! Nothing here touches a socket or a clock, so every scenario is exact and
//! repeatable.

use bytes::Bytes;
use riptide::{Config, Connection, Segment, SeqNum, State};

const ISN_A: u32 = 0;
const ISN_B: u32 = 1 << 20;
const RTO: u64 = 1_000;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn cfg(isn: u32) -> Config {
    Config {
        fixed_isn: Some(SeqNum::new(isn)),
        ..Config::default()
    }
}

/// A fresh pair of connections with known ISNs, not yet connected.
fn pair() -> (Connection, Connection) {
    (Connection::new(cfg(ISN_A)), Connection::new(cfg(ISN_B)))
}

/// Shuttle segments between the two ends until both queues stay empty.
fn exchange(a: &mut Connection, b: &mut Connection) {
    loop {
        let mut moved = false;
        while let Some(seg) = a.segments_out().pop_front() {
            moved = true;
            b.segment_received(seg);
        }
        while let Some(seg) = b.segments_out().pop_front() {
            moved = true;
            a.segment_received(seg);
        }
        if !moved {
            break;
        }
    }
}

/// Handshake a pair into the established state.
fn established() -> (Connection, Connection) {
    let (mut a, mut b) = pair();
    a.connect();
    exchange(&mut a, &mut b);
    assert_eq!(a.state(), State::Estab, "initiator should be established");
    assert_eq!(b.state(), State::Estab, "acceptor should be established");
    (a, b)
}

// ---------------------------------------------------------------------------
// Handshake
// ---------------------------------------------------------------------------

#[test]
fn three_way_handshake_establishes_both_sides() {
    let (mut a, mut b) = pair();
    a.connect();

    // the initial segment is a bare SYN, no ack yet
    let syn = a.segments_out().front().expect("a SYN").clone();
    assert!(syn.header.syn && !syn.header.ack && !syn.header.rst);
    assert_eq!(syn.seqno(), SeqNum::new(ISN_A));

    exchange(&mut a, &mut b);
    assert_eq!(a.state(), State::Estab);
    assert_eq!(b.state(), State::Estab);
    assert_eq!(a.bytes_in_flight(), 0);
    assert_eq!(b.bytes_in_flight(), 0);
}

#[test]
fn simultaneous_open_converges() {
    let (mut a, mut b) = pair();
    a.connect();
    b.connect();

    // the two SYNs cross on the wire
    let syn_a = a.segments_out().pop_front().expect("a's SYN");
    let syn_b = b.segments_out().pop_front().expect("b's SYN");
    a.segment_received(syn_b);
    b.segment_received(syn_a);
    exchange(&mut a, &mut b);

    assert_eq!(a.state(), State::Estab);
    assert_eq!(b.state(), State::Estab);
}

#[test]
fn a_stray_syn_after_establishment_gets_only_an_ack() {
    let (mut a, _b) = established();

    let mut stray = Segment::new(SeqNum::new(ISN_B), Bytes::new());
    stray.header.syn = true;
    a.segment_received(stray);

    let reply = a.segments_out().pop_front().expect("an ack");
    assert!(reply.header.ack && !reply.header.syn);
    assert!(a.segments_out().is_empty());
    assert_eq!(a.state(), State::Estab);
}

// ---------------------------------------------------------------------------
// Data transfer
// ---------------------------------------------------------------------------

#[test]
fn data_flows_in_both_directions() {
    let (mut a, mut b) = established();

    assert_eq!(a.write(b"ping over a noisy sea"), 21);
    exchange(&mut a, &mut b);
    assert_eq!(b.inbound_stream().read(100), b"ping over a noisy sea");
    assert_eq!(a.bytes_in_flight(), 0, "b's ack should cover everything");

    assert_eq!(b.write(b"pong"), 4);
    exchange(&mut a, &mut b);
    assert_eq!(a.inbound_stream().read(100), b"pong");
    assert_eq!(b.bytes_in_flight(), 0);
}

#[test]
fn a_small_receive_window_throttles_and_then_recovers() {
    let a_cfg = cfg(ISN_A);
    let b_cfg = Config {
        recv_capacity: 4,
        ..cfg(ISN_B)
    };
    let mut a = Connection::new(a_cfg);
    let mut b = Connection::new(b_cfg);
    a.connect();
    exchange(&mut a, &mut b);

    a.write(b"abcdefgh");
    exchange(&mut a, &mut b);

    let mut collected = b.inbound_stream().read(100);
    assert_eq!(collected, b"abcd", "only a window's worth arrives at once");

    // the reader drains, the sender probes and refills, repeat
    for _ in 0..20 {
        if collected.len() == 8 {
            break;
        }
        a.tick(RTO);
        assert!(a.bytes_in_flight() <= 4, "sender overran the peer's window");
        exchange(&mut a, &mut b);
        collected.extend(b.inbound_stream().read(100));
    }
    assert_eq!(collected, b"abcdefgh");
    assert!(a.active() && b.active());
}

#[test]
fn every_data_segment_provokes_an_ack() {
    let (mut a, mut b) = established();
    a.write(b"x");
    let data = a.segments_out().pop_front().expect("data");
    b.segment_received(data);
    let ack = b.segments_out().pop_front().expect("an ack");
    assert!(ack.header.ack);
    assert_eq!(ack.seq_len(), 0);
}

// ---------------------------------------------------------------------------
// Keep-alive
// ---------------------------------------------------------------------------

#[test]
fn a_keep_alive_probe_is_answered() {
    let (mut a, _b) = established();

    // a zero-length segment one below the ackno is the keep-alive form
    let mut probe = Segment::new(SeqNum::new(ISN_B), Bytes::new());
    probe.header.ack = true;
    probe.header.acknowledgment_number = SeqNum::wrap(1, SeqNum::new(ISN_A)).raw();
    a.segment_received(probe);

    let reply = a.segments_out().pop_front().expect("keep-alive reply");
    assert!(reply.header.ack);
    assert_eq!(reply.seq_len(), 0);
    assert!(a.segments_out().is_empty());
}

#[test]
fn an_ordinary_pure_ack_is_not_answered() {
    let (mut a, _b) = established();

    let mut ack = Segment::new(SeqNum::new(ISN_B + 1), Bytes::new());
    ack.header.ack = true;
    ack.header.acknowledgment_number = SeqNum::wrap(1, SeqNum::new(ISN_A)).raw();
    a.segment_received(ack);
    assert!(a.segments_out().is_empty(), "acking an ack loops forever");
}

// ---------------------------------------------------------------------------
// Clean shutdown
// ---------------------------------------------------------------------------

#[test]
fn both_directions_close_cleanly_without_rst() {
    let (mut a, mut b) = established();

    a.write(b"last words");
    exchange(&mut a, &mut b);
    assert_eq!(b.inbound_stream().read(100), b"last words");

    // a closes first
    a.end_input_stream();
    exchange(&mut a, &mut b);
    assert!(b.inbound_stream().eof(), "b should see a's end of stream");

    // b closes second
    b.end_input_stream();
    exchange(&mut a, &mut b);
    assert!(a.inbound_stream().eof());

    // b received a's FIN before sending its own, so it need not linger
    b.tick(1);
    assert!(!b.active());
    assert_eq!(b.state(), State::Closed, "clean close, not a reset");

    // a closed first, so it lingers for ten timeouts
    a.tick(1);
    assert!(a.active());
    assert!(a.lingering());
    a.tick(10 * RTO);
    assert!(!a.active());
    assert_eq!(a.state(), State::Closed);
}

#[test]
fn lingering_ends_only_after_ten_timeouts_of_silence() {
    let (mut a, mut b) = established();
    a.end_input_stream();
    exchange(&mut a, &mut b);
    b.end_input_stream();
    exchange(&mut a, &mut b);

    a.tick(10 * RTO - 1);
    assert!(a.active(), "one millisecond too early");
    a.tick(1);
    assert!(!a.active());
}

// ---------------------------------------------------------------------------
// Resets
// ---------------------------------------------------------------------------

#[test]
fn receiving_rst_kills_the_connection_silently() {
    let (_a, mut b) = established();

    let mut rst = Segment::new(SeqNum::new(ISN_A + 1), Bytes::new());
    rst.header.rst = true;
    b.segment_received(rst);

    assert!(!b.active());
    assert_eq!(b.state(), State::Reset);
    assert!(b.segments_out().is_empty(), "a RST is never answered");

    // and the connection stays silent from here on
    b.tick(100 * RTO);
    let mut late = Segment::new(SeqNum::new(ISN_A + 1), Bytes::from_static(b"?"));
    late.header.ack = true;
    b.segment_received(late);
    assert!(b.segments_out().is_empty());
}

#[test]
fn exhausting_retransmissions_aborts_with_rst() {
    let mut a = Connection::new(cfg(ISN_A));
    a.connect();
    a.segments_out().clear(); // the SYN vanishes into the void, repeatedly

    let mut saw_rst = false;
    for _ in 0..30 {
        a.tick(1 << 20);
        while let Some(seg) = a.segments_out().pop_front() {
            saw_rst |= seg.header.rst;
        }
        if !a.active() {
            break;
        }
    }
    assert!(!a.active());
    assert!(saw_rst, "the abort should tell the peer");
    assert_eq!(a.state(), State::Reset);
}

// ---------------------------------------------------------------------------
// Stream errors after shutdown
// ---------------------------------------------------------------------------

#[test]
fn writes_after_a_reset_are_refused() {
    let (mut a, mut b) = established();
    let mut rst = Segment::new(SeqNum::new(ISN_B + 1), Bytes::new());
    rst.header.rst = true;
    a.segment_received(rst);

    assert_eq!(a.write(b"too late"), 0);
    assert_eq!(a.inbound_stream().read(10), b"");
    exchange(&mut a, &mut b);
    assert!(!a.active());
}
