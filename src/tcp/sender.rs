use std::collections::VecDeque;

use bytes::Bytes;

use crate::seq::SeqNum;
use crate::segment::Segment;
use crate::stream::ByteStream;
use crate::tcp::timer::RetxTimer;

/// The outbound half of a connection.
///
/// Reads application bytes from its stream, cuts them into segments sized to
/// the peer's advertised window, and keeps every unacknowledged segment in a
/// backup queue for retransmission. One timer covers the whole queue; when it
/// fires, the oldest unacknowledged segment goes out again and the timeout
/// doubles, unless the peer advertised a zero window — then the stall is the
/// peer's doing, not the network's, and backoff would only slow the probe.
pub struct Sender {
    isn: SeqNum,
    stream: ByteStream,
    segments_out: VecDeque<Segment>,
    backup: VecDeque<Segment>,
    timer: RetxTimer,
    initial_rto: u64,
    rto: u64,
    consecutive_retransmissions: u32,
    /// absolute seqno of the next byte (or SYN/FIN) to send
    next_seqno: u64,
    /// highest absolute seqno the peer has confirmed
    abs_ackno: u64,
    /// peer's last advertised window; a sender that has heard nothing yet
    /// assumes 1 so the SYN can go out
    window_size: u16,
    syn_sent: bool,
    fin_sent: bool,
    max_payload: usize,
}

impl Sender {
    pub fn new(
        capacity: usize,
        retx_timeout: u64,
        max_payload: usize,
        fixed_isn: Option<SeqNum>,
    ) -> Self {
        Sender {
            isn: fixed_isn.unwrap_or_else(|| SeqNum::new(rand::random())),
            stream: ByteStream::new(capacity),
            segments_out: VecDeque::new(),
            backup: VecDeque::new(),
            timer: RetxTimer::Closed,
            initial_rto: retx_timeout,
            rto: retx_timeout,
            consecutive_retransmissions: 0,
            next_seqno: 0,
            abs_ackno: 0,
            window_size: 1,
            syn_sent: false,
            fin_sent: false,
            max_payload,
        }
    }

    fn make_segment(&self, abs_seqno: u64, syn: bool, fin: bool, payload: Bytes) -> Segment {
        let mut seg = Segment::new(SeqNum::wrap(abs_seqno, self.isn), payload);
        seg.header.syn = syn;
        seg.header.fin = fin;
        seg
    }

    /// Queue a segment for transmission and for retransmission bookkeeping.
    fn transmit(&mut self, seg: Segment) {
        let len = seg.seq_len();
        self.segments_out.push_back(seg.clone());
        self.backup.push_back(seg);
        if self.timer.is_closed() {
            self.timer.start(self.rto);
        }
        self.next_seqno += len;
    }

    /// Send as much as the peer's window allows. The first call emits the
    /// SYN and nothing else; later calls cut stream bytes into
    /// `max_payload`-sized segments, tacking FIN onto the last one if the
    /// stream has ended and the window still has room for it.
    pub fn fill_window(&mut self) {
        if !self.syn_sent {
            let seg = self.make_segment(self.next_seqno, true, false, Bytes::new());
            self.transmit(seg);
            self.syn_sent = true;
            return;
        }

        // an advertised window of zero still gets a one-byte probe
        let window = u64::from(std::cmp::max(self.window_size, 1));
        while !self.fin_sent {
            let in_flight = self.bytes_in_flight();
            if window <= in_flight {
                break;
            }
            let usable = window - in_flight;
            let take = std::cmp::min(usable, self.max_payload as u64) as usize;
            let payload = Bytes::from(self.stream.read(take));
            let fin = usable > payload.len() as u64 && self.stream.eof();
            let seg = self.make_segment(self.next_seqno, false, fin, payload);
            if seg.seq_len() == 0 {
                break;
            }
            if fin {
                self.fin_sent = true;
            }
            self.transmit(seg);
        }
    }

    fn fully_acked(&self, seg: &Segment) -> bool {
        let abs = seg.seqno().unwrap(self.isn, self.abs_ackno);
        abs + seg.seq_len() <= self.abs_ackno
    }

    /// Take note of the peer's ackno and window. An ackno that is no advance
    /// or that lies beyond anything we sent changes nothing; the window is
    /// adopted either way.
    pub fn ack_received(&mut self, ackno: SeqNum, window_size: u16) {
        let abs = ackno.unwrap(self.isn, self.abs_ackno);
        if abs > self.abs_ackno && abs <= self.next_seqno {
            self.abs_ackno = abs;
        }
        self.window_size = window_size;

        let mut newly_acked = false;
        while let Some(front) = self.backup.front() {
            if !self.fully_acked(front) {
                break;
            }
            self.backup.pop_front();
            newly_acked = true;
        }
        if newly_acked {
            self.rto = self.initial_rto;
            self.consecutive_retransmissions = 0;
        }
        if self.backup.is_empty() {
            self.timer.stop();
        } else if newly_acked {
            self.timer.start(self.rto);
        }
    }

    /// Advance the timer; on expiry, retransmit the oldest unacknowledged
    /// segment and back off (unless the peer's window is zero).
    pub fn tick(&mut self, ms: u64) {
        self.timer.tick(ms);
        if !self.timer.is_expired() {
            return;
        }
        if let Some(oldest) = self.backup.front() {
            log::debug!(
                "retransmitting seqno {} ({} consecutive so far)",
                oldest.seqno(),
                self.consecutive_retransmissions,
            );
            self.segments_out.push_back(oldest.clone());
        }
        if self.window_size != 0 {
            self.consecutive_retransmissions += 1;
            self.rto *= 2;
        }
        self.timer.start(self.rto);
    }

    /// Emit a zero-length segment (optionally RST-flagged). It occupies no
    /// sequence space, so it is never backed up for retransmission.
    pub fn send_empty_segment(&mut self, rst: bool) {
        let mut seg = self.make_segment(self.next_seqno, false, false, Bytes::new());
        seg.header.rst = rst;
        self.segments_out.push_back(seg);
    }

    pub fn bytes_in_flight(&self) -> u64 {
        self.next_seqno - self.abs_ackno
    }

    pub fn next_seqno_absolute(&self) -> u64 {
        self.next_seqno
    }

    pub fn acked_seqno(&self) -> u64 {
        self.abs_ackno
    }

    pub fn consecutive_retransmissions(&self) -> u32 {
        self.consecutive_retransmissions
    }

    pub fn syn_sent(&self) -> bool {
        self.syn_sent
    }

    pub fn fin_sent(&self) -> bool {
        self.fin_sent
    }

    pub fn stream_in(&self) -> &ByteStream {
        &self.stream
    }

    pub fn stream_in_mut(&mut self) -> &mut ByteStream {
        &mut self.stream
    }

    pub fn segments_out(&mut self) -> &mut VecDeque<Segment> {
        &mut self.segments_out
    }
}
