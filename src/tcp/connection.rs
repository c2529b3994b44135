use std::collections::VecDeque;

use crate::config::Config;
use crate::segment::Segment;
use crate::stream::ByteStream;
use crate::tcp::receiver::Receiver;
use crate::tcp::sender::Sender;
use crate::tcp::shutdown::Shutdown;
use crate::tcp::state::State;

/// A full-duplex TCP session: one [`Sender`] for the outbound stream, one
/// [`Receiver`] for the inbound one, and the glue that makes them a single
/// self-terminating connection.
///
/// The owner drives it with four events — `write`, `segment_received`,
/// `end_input_stream`, `tick` — and drains `segments_out` after each. Every
/// outbound segment is stamped with the receiver's current ackno and window
/// at the moment it leaves, so acknowledgments always reflect the latest
/// inbound state no matter which event produced the segment.
pub struct Connection {
    cfg: Config,
    sender: Sender,
    receiver: Receiver,
    segments_out: VecDeque<Segment>,
    time_since_last_segment: u64,
    /// whether a clean close must wait out a quiet period; cleared if the
    /// peer's stream ends before we ever send a FIN, since the peer then
    /// cannot be waiting on anything of ours
    linger_after_streams_finish: bool,
    lingering: bool,
    active: bool,
}

impl Connection {
    pub fn new(cfg: Config) -> Self {
        let sender = Sender::new(
            cfg.send_capacity,
            cfg.rt_timeout,
            cfg.max_payload_size,
            cfg.fixed_isn,
        );
        let receiver = Receiver::new(cfg.recv_capacity);
        Connection {
            cfg,
            sender,
            receiver,
            segments_out: VecDeque::new(),
            time_since_last_segment: 0,
            linger_after_streams_finish: true,
            lingering: false,
            active: true,
        }
    }

    /// Kick off the handshake by sending the SYN.
    pub fn connect(&mut self) {
        self.sender.fill_window();
        self.flush();
    }

    /// Queue application bytes for transmission; returns how many the
    /// outbound stream accepted.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let written = self.sender.stream_in_mut().write(data);
        self.sender.fill_window();
        self.flush();
        written
    }

    /// No more application bytes will be written; sends the FIN as soon as
    /// the window permits.
    pub fn end_input_stream(&mut self) {
        self.sender.stream_in_mut().end_input();
        self.sender.fill_window();
        self.flush();
    }

    pub fn segment_received(&mut self, seg: Segment) {
        if !self.active {
            return;
        }
        self.time_since_last_segment = 0;

        self.receiver.segment_received(&seg);

        if seg.header.rst {
            // the peer already gave up; answering with our own RST would
            // only echo back and forth
            self.unclean_shutdown(false);
            return;
        }
        if let Some(ackno) = seg.ackno() {
            self.sender.ack_received(ackno, seg.header.window_size);
        }

        self.poll_shutdown();

        if seg.seq_len() == 0 {
            // a pure ack or probe; answer only the keep-alive form
            if let Some(ackno) = self.receiver.ackno() {
                if seg.seqno() == ackno - 1 {
                    self.sender.send_empty_segment(false);
                }
            }
            self.flush();
            return;
        }

        if seg.header.syn && !seg.header.ack && self.state().is_handshaking() {
            // simultaneous open: answer the bare SYN with our own side
            self.sender.fill_window();
        }

        // every sequence-space-consuming segment provokes at least an ack
        if self.sender.segments_out().is_empty() {
            self.sender.send_empty_segment(false);
        }
        self.flush();
    }

    /// Advance virtual time. Drives retransmission, the fatal-retransmission
    /// abort, and both clean-shutdown paths.
    pub fn tick(&mut self, ms: u64) {
        if !self.active {
            return;
        }
        self.sender.tick(ms);
        self.time_since_last_segment += ms;

        if self.sender.consecutive_retransmissions() > self.cfg.max_retx_attempts {
            log::debug!(
                "giving up after {} consecutive retransmissions",
                self.sender.consecutive_retransmissions(),
            );
            self.unclean_shutdown(true);
            return;
        }

        if self.sender.syn_sent() {
            self.sender.fill_window();
        }
        self.flush();

        if self.poll_shutdown() {
            if self.linger_after_streams_finish {
                self.lingering = true;
                if self.time_since_last_segment >= 10 * self.cfg.rt_timeout {
                    self.lingering = false;
                    self.active = false;
                }
            } else {
                self.active = false;
            }
        }
    }

    /// The three clean-close conditions, as independent flags.
    fn shutdown_status(&self) -> Shutdown {
        let mut status = Shutdown::empty();
        if self.receiver.stream_out().input_ended() {
            status |= Shutdown::INBOUND_DONE;
        }
        if self.sender.stream_in().eof()
            && self.sender.next_seqno_absolute() == self.sender.stream_in().bytes_written() + 2
        {
            status |= Shutdown::OUTBOUND_SENT;
        }
        if self.sender.bytes_in_flight() == 0 {
            status |= Shutdown::NOTHING_IN_FLIGHT;
        }
        status
    }

    /// Evaluate the close conditions; called from both the segment path and
    /// the tick path so the two can never disagree. Also notices when the
    /// peer finished first and lingering became unnecessary.
    fn poll_shutdown(&mut self) -> bool {
        if self.receiver.stream_out().eof() && !self.sender.fin_sent() {
            self.linger_after_streams_finish = false;
        }
        self.shutdown_status().is_all()
    }

    fn unclean_shutdown(&mut self, send_rst: bool) {
        if send_rst {
            self.sender.fill_window();
            if let Some(front) = self.sender.segments_out().front_mut() {
                front.header.rst = true;
            } else {
                self.sender.send_empty_segment(true);
            }
            self.flush();
        }
        log::debug!("connection torn down (rst sent: {})", send_rst);
        self.receiver.stream_out_mut().set_error();
        self.sender.stream_in_mut().set_error();
        self.active = false;
    }

    /// Move everything the sender produced onto the outbound queue, stamping
    /// each segment with the current ackno and the 16-bit-capped window.
    fn flush(&mut self) {
        while let Some(mut seg) = self.sender.segments_out().pop_front() {
            if let Some(ackno) = self.receiver.ackno() {
                seg.header.ack = true;
                seg.header.acknowledgment_number = ackno.raw();
            }
            seg.header.window_size =
                u16::try_from(self.receiver.window_size()).unwrap_or(u16::MAX);
            self.segments_out.push_back(seg);
        }
    }

    /// Segments waiting to be handed to the network.
    pub fn segments_out(&mut self) -> &mut VecDeque<Segment> {
        &mut self.segments_out
    }

    /// The reassembled inbound stream, for the application to read.
    pub fn inbound_stream(&mut self) -> &mut ByteStream {
        self.receiver.stream_out_mut()
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn lingering(&self) -> bool {
        self.lingering
    }

    pub fn bytes_in_flight(&self) -> u64 {
        self.sender.bytes_in_flight()
    }

    pub fn unassembled_bytes(&self) -> usize {
        self.receiver.unassembled_bytes()
    }

    pub fn time_since_last_segment_received(&self) -> u64 {
        self.time_since_last_segment
    }

    pub fn remaining_outbound_capacity(&self) -> usize {
        self.sender.stream_in().remaining_capacity()
    }

    /// Coarse phase summary, derived from component state.
    pub fn state(&self) -> State {
        if self.sender.stream_in().error() || self.receiver.stream_out().error() {
            return State::Reset;
        }
        if !self.active {
            return State::Closed;
        }
        if !self.sender.syn_sent() {
            return State::Listen;
        }
        if self.receiver.ackno().is_none() {
            return State::SynSent;
        }
        if self.sender.acked_seqno() == 0 {
            return State::SynRcvd;
        }
        let inbound_done = self.receiver.stream_out().input_ended();
        if !self.sender.fin_sent() {
            return if inbound_done {
                State::CloseWait
            } else {
                State::Estab
            };
        }
        let fin_acked = self.sender.bytes_in_flight() == 0;
        match (inbound_done, fin_acked) {
            (false, false) => State::FinWait1,
            (false, true) => State::FinWait2,
            (true, false) => {
                if self.linger_after_streams_finish {
                    State::Closing
                } else {
                    State::LastAck
                }
            }
            (true, true) => State::TimeWait,
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        // best effort: the owner may never see these segments, but a peer
        // that does will stop waiting on us
        if self.active {
            log::warn!("connection dropped while active; resetting the peer");
            self.unclean_shutdown(true);
        }
    }
}
