//! Participant identity packets (1347 and 1028 bytes)

use serde::{Deserialize, Serialize};

use super::header::{PacketHeader, PacketKind};
use crate::error::DecodeError;
use crate::types::ByteCursor;

/// Width of every string slot.
pub const NAME_WIDTH: usize = 64;
/// Driver name slots per identity packet.
pub const NAMES_PER_PACKET: usize = 16;

fn read_names(cursor: &mut ByteCursor<'_>) -> Result<Vec<String>, DecodeError> {
    (0..NAMES_PER_PACKET).map(|_| cursor.read_string(NAME_WIDTH)).collect()
}

/// Names of the first sixteen participants plus car and track identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct ParticipantPacket {
    pub header: PacketHeader,
    pub car_name: String,
    pub car_class_name: String,
    pub track_location: String,
    pub track_variation: String,
    /// Always sixteen slots; unused slots are empty strings.
    pub names: Vec<String>,
    pub fastest_lap_times: [f32; NAMES_PER_PACKET],
}

impl ParticipantPacket {
    pub const LENGTH: usize = 1347;

    pub(crate) fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let header = PacketHeader::read(cursor)?;
        header.expect_kind(PacketKind::Participant)?;

        Ok(Self {
            header,
            car_name: cursor.read_string(NAME_WIDTH)?,
            car_class_name: cursor.read_string(NAME_WIDTH)?,
            track_location: cursor.read_string(NAME_WIDTH)?,
            track_variation: cursor.read_string(NAME_WIDTH)?,
            names: read_names(cursor)?,
            fastest_lap_times: cursor.read_array(ByteCursor::read_f32)?,
        })
    }

    /// Roster offset of the first name slot.
    pub fn offset(&self) -> usize {
        0
    }
}

/// Names of participants beyond the first sixteen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct AdditionalParticipantPacket {
    pub header: PacketHeader,
    /// Roster index of the first name in this packet.
    pub offset: u8,
    /// Always sixteen slots; unused slots are empty strings.
    pub names: Vec<String>,
}

impl AdditionalParticipantPacket {
    pub const LENGTH: usize = 1028;

    pub(crate) fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let header = PacketHeader::read(cursor)?;
        header.expect_kind(PacketKind::AdditionalParticipant)?;

        Ok(Self { header, offset: cursor.read_u8()?, names: read_names(cursor)? })
    }

    pub fn offset(&self) -> usize {
        self.offset as usize
    }
}
