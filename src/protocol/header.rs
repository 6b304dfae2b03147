//! Packet header and the length-keyed packet kinds

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::types::{ByteCursor, flags};

/// The three packet shapes of the broadcast.
///
/// The kind is fully determined by the datagram length; the header tag only
/// confirms it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum PacketKind {
    Telemetry,
    Participant,
    AdditionalParticipant,
}

impl PacketKind {
    pub const ALL: [PacketKind; 3] =
        [PacketKind::Telemetry, PacketKind::Participant, PacketKind::AdditionalParticipant];

    /// Exact datagram length of this kind.
    pub const fn length(self) -> usize {
        match self {
            PacketKind::Telemetry => 1367,
            PacketKind::Participant => 1347,
            PacketKind::AdditionalParticipant => 1028,
        }
    }

    /// Two-bit type tag carried in the header.
    pub const fn tag(self) -> u8 {
        match self {
            PacketKind::Telemetry => 0,
            PacketKind::Participant => 1,
            PacketKind::AdditionalParticipant => 2,
        }
    }

    /// Kind whose layout is exactly `len` bytes long.
    pub fn from_length(len: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.length() == len)
    }
}

/// Header shared by every packet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct PacketHeader {
    /// Protocol build version.
    pub build_version: u16,
    /// Raw packed type byte.
    pub packet_type: u8,
}

impl PacketHeader {
    pub const SIZE: usize = 3;

    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let build_version = cursor.read_u16()?;
        let packet_type = cursor.read_u8()?;
        Ok(Self { build_version, packet_type })
    }

    /// Two-bit packet kind tag.
    pub fn tag(&self) -> u8 {
        self.packet_type & flags::header::TYPE_MASK
    }

    /// Six-bit sequence count.
    pub fn count(&self) -> u8 {
        self.packet_type >> flags::header::COUNT_SHIFT
    }

    /// Verify the tag agrees with the length-dispatched kind.
    pub fn expect_kind(&self, expected: PacketKind) -> Result<(), DecodeError> {
        if self.tag() == expected.tag() {
            Ok(())
        } else {
            Err(DecodeError::TypeMismatch { expected, found: self.tag() })
        }
    }
}
