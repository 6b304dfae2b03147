//! Length-dispatched packet decoding

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::header::{PacketHeader, PacketKind};
use super::participant::{AdditionalParticipantPacket, ParticipantPacket};
use super::telemetry::TelemetryPacket;
use crate::error::DecodeError;
use crate::types::ByteCursor;

/// One decoded datagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum Packet {
    Telemetry(Box<TelemetryPacket>),
    Participant(ParticipantPacket),
    AdditionalParticipant(AdditionalParticipantPacket),
}

impl Packet {
    pub fn kind(&self) -> PacketKind {
        match self {
            Packet::Telemetry(_) => PacketKind::Telemetry,
            Packet::Participant(_) => PacketKind::Participant,
            Packet::AdditionalParticipant(_) => PacketKind::AdditionalParticipant,
        }
    }

    pub fn header(&self) -> &PacketHeader {
        match self {
            Packet::Telemetry(packet) => &packet.header,
            Packet::Participant(packet) => &packet.header,
            Packet::AdditionalParticipant(packet) => &packet.header,
        }
    }

    pub fn as_telemetry(&self) -> Option<&TelemetryPacket> {
        match self {
            Packet::Telemetry(packet) => Some(packet),
            _ => None,
        }
    }

    /// Roster offset and driver names, for identity packets.
    pub fn names(&self) -> Option<(usize, &[String])> {
        match self {
            Packet::Participant(packet) => Some((packet.offset(), &packet.names)),
            Packet::AdditionalParticipant(packet) => Some((packet.offset(), &packet.names)),
            Packet::Telemetry(_) => None,
        }
    }
}

impl From<TelemetryPacket> for Packet {
    fn from(packet: TelemetryPacket) -> Self {
        Packet::Telemetry(Box::new(packet))
    }
}

impl From<ParticipantPacket> for Packet {
    fn from(packet: ParticipantPacket) -> Self {
        Packet::Participant(packet)
    }
}

impl From<AdditionalParticipantPacket> for Packet {
    fn from(packet: AdditionalParticipantPacket) -> Self {
        Packet::AdditionalParticipant(packet)
    }
}

/// Decode one datagram.
///
/// The packet kind is chosen by the exact buffer length before any field is
/// read; the header tag must then agree with it.
pub fn decode(buffer: &[u8]) -> Result<Packet, DecodeError> {
    let kind = PacketKind::from_length(buffer.len())
        .ok_or(DecodeError::UnknownLength(buffer.len()))?;

    let mut cursor = ByteCursor::new(buffer);
    let packet = match kind {
        PacketKind::Telemetry => Packet::Telemetry(Box::new(TelemetryPacket::read(&mut cursor)?)),
        PacketKind::Participant => Packet::Participant(ParticipantPacket::read(&mut cursor)?),
        PacketKind::AdditionalParticipant => {
            Packet::AdditionalParticipant(AdditionalParticipantPacket::read(&mut cursor)?)
        }
    };

    trace!(kind = ?kind, build = packet.header().build_version, "Decoded packet");
    Ok(packet)
}
