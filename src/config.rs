use crate::seq::SeqNum;

/// Construction-time knobs for a connection. Nothing here changes after the
/// connection is built.
#[derive(Clone, Debug)]
pub struct Config {
    /// capacity of the inbound (peer-to-local) byte stream
    pub recv_capacity: usize,
    /// capacity of the outbound (local-to-peer) byte stream
    pub send_capacity: usize,
    /// initial retransmission timeout, in milliseconds
    pub rt_timeout: u64,
    /// consecutive retransmissions tolerated before the connection aborts
    pub max_retx_attempts: u32,
    /// largest payload carried by a single segment
    pub max_payload_size: usize,
    /// fix the initial sequence number instead of drawing one at random
    pub fixed_isn: Option<SeqNum>,
}

impl Config {
    pub const DEFAULT_CAPACITY: usize = 64_000;
    pub const TIMEOUT_DEFAULT: u64 = 1_000;
    pub const MAX_RETX_ATTEMPTS: u32 = 8;
    pub const MAX_PAYLOAD_SIZE: usize = 1_452;
}

impl Default for Config {
    fn default() -> Self {
        Config {
            recv_capacity: Config::DEFAULT_CAPACITY,
            send_capacity: Config::DEFAULT_CAPACITY,
            rt_timeout: Config::TIMEOUT_DEFAULT,
            max_retx_attempts: Config::MAX_RETX_ATTEMPTS,
            max_payload_size: Config::MAX_PAYLOAD_SIZE,
            fixed_isn: None,
        }
    }
}
