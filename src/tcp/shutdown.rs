use bitflags::bitflags;

bitflags! {
    /// The three independent conditions that must all hold before a
    /// connection may close cleanly.
    pub(crate) struct Shutdown: u8 {
        /// inbound stream fully assembled and its input side closed
        const INBOUND_DONE = 0b001;
        /// outbound stream hit end-of-input and everything through FIN
        /// has been sent
        const OUTBOUND_SENT = 0b010;
        /// the peer has acknowledged every outstanding byte
        const NOTHING_IN_FLIGHT = 0b100;
    }
}
