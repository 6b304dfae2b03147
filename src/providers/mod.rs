//! Datagram sources
//!
//! - [`UdpSource`]: the game's UDP broadcast
//! - [`ReplaySource`]: a framed capture re-emitted at a fixed rate

mod replay;
mod udp;

pub use replay::ReplaySource;
pub use udp::{MAX_DATAGRAM_SIZE, UdpSource};
