use bytes::Bytes;

use crate::seq::SeqNum;

/// One TCP segment in logical form: the header fields the engine cares about
/// plus an owned payload. Wire form (the enclosing IPv4 datagram, checksums)
/// lives in [`crate::wire`]; the engine itself never sees raw bytes.
///
/// The payload is a [`Bytes`] so the same segment can sit in the outbound
/// queue and the retransmission backup queue without copying.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub header: etherparse::TcpHeader,
    pub payload: Bytes,
}

impl Segment {
    /// A plain segment: no flags, no ack, zero window. Callers flip header
    /// bits directly, the same way they would on any etherparse header.
    pub fn new(seqno: SeqNum, payload: Bytes) -> Self {
        Segment {
            header: etherparse::TcpHeader::new(0, 0, seqno.raw(), 0),
            payload,
        }
    }

    pub fn seqno(&self) -> SeqNum {
        SeqNum::new(self.header.sequence_number)
    }

    pub fn ackno(&self) -> Option<SeqNum> {
        if self.header.ack {
            Some(SeqNum::new(self.header.acknowledgment_number))
        } else {
            None
        }
    }

    /// Length in sequence space: the payload plus one virtual byte each for
    /// SYN and FIN.
    pub fn seq_len(&self) -> u64 {
        self.payload.len() as u64 + u64::from(self.header.syn) + u64::from(self.header.fin)
    }
}
