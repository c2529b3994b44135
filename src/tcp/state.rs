/// Coarse connection phase, derived on demand from sender and receiver
/// state. The engine itself runs on the component flags; this summary exists
/// for logging, for tests, and to decide whether a bare SYN still deserves a
/// handshake response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// no SYN sent or received yet
    Listen,
    /// our SYN is out, nothing heard back
    SynSent,
    /// peer's SYN seen, our SYN not yet acknowledged
    SynRcvd,
    Estab,
    /// peer closed its side first; our side still open
    CloseWait,
    /// peer closed first and our FIN is out, awaiting its ack
    LastAck,
    /// our FIN is out, unacknowledged, peer still open
    FinWait1,
    /// our FIN acknowledged, peer still open
    FinWait2,
    /// both sides closed, our FIN not yet acknowledged
    Closing,
    /// both sides closed and acknowledged, lingering for stray segments
    TimeWait,
    Closed,
    /// torn down by RST or a fatal retransmission failure
    Reset,
}

impl State {
    /// True while the three-way handshake could still be in progress —
    /// the only phases in which a bare SYN merits a SYN of our own.
    pub fn is_handshaking(self) -> bool {
        matches!(self, State::Listen | State::SynSent | State::SynRcvd)
    }
}
