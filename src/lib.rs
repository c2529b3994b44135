//! A user-space TCP engine: reliable, ordered, flow-controlled byte streams
//! over an unreliable datagram network. Sans-IO — the owner feeds in received
//! segments and elapsed time, and drains segments to transmit.

mod config;
mod reassembler;
mod segment;
mod seq;
mod stream;
mod tcp;
pub mod wire;

pub use config::Config;
pub use reassembler::Reassembler;
pub use segment::Segment;
pub use seq::SeqNum;
pub use stream::ByteStream;
pub use tcp::connection::Connection;
pub use tcp::receiver::Receiver;
pub use tcp::sender::Sender;
pub use tcp::state::State;
