//! Project CARS UDP packet layouts and decoding.
//!
//! The broadcast carries three packet shapes, told apart by their exact byte
//! length:
//!
//! | Kind | Length | Tag |
//! |------|--------|-----|
//! | [`TelemetryPacket`] | 1367 | 0 |
//! | [`ParticipantPacket`] | 1347 | 1 |
//! | [`AdditionalParticipantPacket`] | 1028 | 2 |
//!
//! Integers are big-endian and floats little-endian. [`decode`] is pure: the
//! same bytes always produce an equal [`Packet`].

mod header;
mod packet;
mod participant;
mod telemetry;

pub use header::{PacketHeader, PacketKind};
pub use packet::{Packet, decode};
pub use participant::{
    AdditionalParticipantPacket, NAME_WIDTH, NAMES_PER_PACKET, ParticipantPacket,
};
pub use telemetry::{
    CarState, Motion, PARTICIPANT_SLOTS, ParticipantInfo, TelemetryPacket, Timings, Weather,
    Wheels,
};
