use crate::reassembler::Reassembler;
use crate::seq::SeqNum;
use crate::segment::Segment;
use crate::stream::ByteStream;

/// The inbound half of a connection.
///
/// Latches the peer's ISN off the first SYN, translates each later segment's
/// wire seqno into a stream index, and feeds the reassembler. The ackno it
/// reports is the first byte it still needs — offset by one for the SYN, and
/// by one more once the FIN's position has been fully assembled.
pub struct Receiver {
    reassembler: Reassembler,
    isn: Option<SeqNum>,
    ackno: Option<SeqNum>,
}

impl Receiver {
    pub fn new(capacity: usize) -> Self {
        Receiver {
            reassembler: Reassembler::new(ByteStream::new(capacity)),
            isn: None,
            ackno: None,
        }
    }

    pub fn segment_received(&mut self, seg: &Segment) {
        let isn = match self.isn {
            None => {
                // nothing counts until the peer's SYN arrives
                if !seg.header.syn {
                    return;
                }
                let isn = seg.seqno();
                self.isn = Some(isn);
                self.reassembler
                    .push_substring(&seg.payload, 0, seg.header.fin);
                self.ackno = Some(SeqNum::wrap(
                    1 + self.reassembler.first_unassembled() + u64::from(seg.header.fin),
                    isn,
                ));
                return;
            }
            Some(isn) => isn,
        };

        let abs = seg
            .seqno()
            .unwrap(isn, self.reassembler.first_unassembled());
        if abs == 0 {
            // a retransmitted SYN; its contents were handled the first time
            return;
        }
        // stream index 0 sits at absolute seqno 1, the SYN occupying 0
        self.reassembler
            .push_substring(&seg.payload, abs - 1, seg.header.fin);
        let complete = u64::from(self.reassembler.stream_out().input_ended());
        self.ackno = Some(SeqNum::wrap(
            self.reassembler.first_unassembled() + 1 + complete,
            isn,
        ));
    }

    /// Empty until the peer's SYN has been seen.
    pub fn ackno(&self) -> Option<SeqNum> {
        self.ackno
    }

    /// Free space in the inbound stream — shrinks as delivered-but-unread
    /// bytes pile up. The connection caps this to 16 bits when stamping
    /// outbound segments.
    pub fn window_size(&self) -> usize {
        self.reassembler.stream_out().remaining_capacity()
    }

    pub fn unassembled_bytes(&self) -> usize {
        self.reassembler.unassembled_bytes()
    }

    pub fn stream_out(&self) -> &ByteStream {
        self.reassembler.stream_out()
    }

    pub fn stream_out_mut(&mut self) -> &mut ByteStream {
        self.reassembler.stream_out_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    const ISN: u32 = 1_000;

    fn syn(payload: &'static [u8], fin: bool) -> Segment {
        let mut seg = Segment::new(SeqNum::new(ISN), Bytes::from_static(payload));
        seg.header.syn = true;
        seg.header.fin = fin;
        seg
    }

    fn data(abs: u64, payload: &'static [u8], fin: bool) -> Segment {
        let mut seg = Segment::new(
            SeqNum::wrap(abs, SeqNum::new(ISN)),
            Bytes::from_static(payload),
        );
        seg.header.fin = fin;
        seg
    }

    #[test]
    fn segments_before_the_syn_are_ignored() {
        let mut r = Receiver::new(100);
        r.segment_received(&data(1, b"hello", false));
        assert_eq!(r.ackno(), None);
        assert!(r.stream_out().is_empty());
    }

    #[test]
    fn the_syn_sets_the_ackno_one_past_itself() {
        let mut r = Receiver::new(100);
        r.segment_received(&syn(b"", false));
        assert_eq!(r.ackno(), Some(SeqNum::new(ISN + 1)));
        assert_eq!(r.window_size(), 100);
    }

    #[test]
    fn in_order_data_advances_the_ackno() {
        let mut r = Receiver::new(100);
        r.segment_received(&syn(b"", false));
        r.segment_received(&data(1, b"ab", false));
        assert_eq!(r.ackno(), Some(SeqNum::new(ISN + 3)));
        assert_eq!(r.stream_out_mut().read(10), b"ab");
        r.segment_received(&data(3, b"cd", false));
        assert_eq!(r.ackno(), Some(SeqNum::new(ISN + 5)));
    }

    #[test]
    fn out_of_order_data_waits_without_moving_the_ackno() {
        let mut r = Receiver::new(100);
        r.segment_received(&syn(b"", false));
        r.segment_received(&data(3, b"cd", false));
        assert_eq!(r.ackno(), Some(SeqNum::new(ISN + 1)));
        assert_eq!(r.unassembled_bytes(), 2);
        r.segment_received(&data(1, b"ab", false));
        assert_eq!(r.ackno(), Some(SeqNum::new(ISN + 5)));
        assert_eq!(r.stream_out_mut().read(10), b"abcd");
    }

    #[test]
    fn the_fin_counts_only_once_assembly_reaches_it() {
        let mut r = Receiver::new(100);
        r.segment_received(&syn(b"", false));
        // FIN arrives with a gap in front of it: not yet acknowledged
        r.segment_received(&data(3, b"cd", true));
        assert_eq!(r.ackno(), Some(SeqNum::new(ISN + 1)));
        r.segment_received(&data(1, b"ab", false));
        // gap filled: ackno covers the data and the FIN
        assert_eq!(r.ackno(), Some(SeqNum::new(ISN + 6)));
        assert!(r.stream_out().input_ended());
    }

    #[test]
    fn a_lone_syn_fin_closes_the_stream_immediately() {
        let mut r = Receiver::new(100);
        r.segment_received(&syn(b"", true));
        assert_eq!(r.ackno(), Some(SeqNum::new(ISN + 2)));
        assert!(r.stream_out().eof());
    }

    #[test]
    fn a_retransmitted_syn_changes_nothing() {
        let mut r = Receiver::new(100);
        r.segment_received(&syn(b"", false));
        r.segment_received(&data(1, b"ab", false));
        let before = r.ackno();
        r.segment_received(&syn(b"", false));
        assert_eq!(r.ackno(), before);
        assert_eq!(r.stream_out().len(), 2);
    }

    #[test]
    fn the_window_shrinks_with_unread_bytes() {
        let mut r = Receiver::new(4);
        r.segment_received(&syn(b"", false));
        r.segment_received(&data(1, b"abcd", false));
        assert_eq!(r.window_size(), 0);
        assert_eq!(r.stream_out_mut().read(2), b"ab");
        assert_eq!(r.window_size(), 2);
    }

    #[test]
    fn data_beyond_the_window_is_clipped() {
        let mut r = Receiver::new(4);
        r.segment_received(&syn(b"", false));
        r.segment_received(&data(1, b"abcdef", false));
        assert_eq!(r.ackno(), Some(SeqNum::new(ISN + 5)));
        assert_eq!(r.stream_out_mut().read(10), b"abcd");
    }
}
