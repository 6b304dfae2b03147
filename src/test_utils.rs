//! Synthetic packet fixtures for tests and benchmarks
//!
//! The encoders here write every field at its exact protocol offset, mirroring
//! the decoder, so tests can build packets from typed values instead of
//! hand-assembled byte arrays.

#![cfg(any(test, feature = "benchmark"))]

use std::path::PathBuf;
use std::sync::Arc;

use crate::protocol::{
    AdditionalParticipantPacket, NAME_WIDTH, NAMES_PER_PACKET, PARTICIPANT_SLOTS, Packet,
    PacketKind, ParticipantInfo, ParticipantPacket, TelemetryPacket,
};
use crate::race::LifecycleState;
use crate::types::{CurrentSector, GameState, RaceState, SessionState, flags};

/// Big-endian integer, little-endian float writer matching `ByteCursor`.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: Vec::with_capacity(capacity) }
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    pub fn i8(&mut self, value: i8) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn i16(&mut self, value: i16) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn f32(&mut self, value: f32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn u8s(&mut self, values: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(values);
        self
    }

    pub fn i16s(&mut self, values: &[i16]) -> &mut Self {
        values.iter().for_each(|v| {
            self.i16(*v);
        });
        self
    }

    pub fn u16s(&mut self, values: &[u16]) -> &mut Self {
        values.iter().for_each(|v| {
            self.u16(*v);
        });
        self
    }

    pub fn f32s(&mut self, values: &[f32]) -> &mut Self {
        values.iter().for_each(|v| {
            self.f32(*v);
        });
        self
    }

    /// NUL-padded string slot; longer text is cut to the slot width.
    pub fn string(&mut self, value: &str, width: usize) -> &mut Self {
        let bytes = value.as_bytes();
        let len = bytes.len().min(width);
        self.buf.extend_from_slice(&bytes[..len]);
        self.buf.resize(self.buf.len() + (width - len), 0);
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Encode a telemetry packet into its 1367-byte wire form.
///
/// Missing participant slots are written as zeroed entries.
pub fn encode_telemetry(packet: &TelemetryPacket) -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(TelemetryPacket::LENGTH);
    w.u16(packet.header.build_version).u8(packet.header.packet_type);
    w.u8(packet.game_session_state)
        .i8(packet.viewed_participant_index)
        .i8(packet.num_participants)
        .u8(packet.unfiltered_throttle)
        .u8(packet.unfiltered_brake)
        .i8(packet.unfiltered_steering)
        .u8(packet.unfiltered_clutch)
        .u8(packet.race_state_flags)
        .u8(packet.laps_in_event);

    let t = &packet.timings;
    w.f32(t.best_lap_time)
        .f32(t.last_lap_time)
        .f32(t.current_time)
        .f32(t.split_time_ahead)
        .f32(t.split_time_behind)
        .f32(t.split_time)
        .f32(t.event_time_remaining)
        .f32(t.personal_fastest_lap_time)
        .f32(t.world_fastest_lap_time)
        .f32s(&t.current_sector_times)
        .f32s(&t.fastest_sector_times)
        .f32s(&t.personal_fastest_sector_times)
        .f32s(&t.world_fastest_sector_times);

    w.u16(packet.joypad).u8(packet.highest_flag).u8(packet.pit_mode_schedule);

    let c = &packet.car;
    w.i16(c.oil_temp_celsius)
        .u16(c.oil_pressure_kpa)
        .i16(c.water_temp_celsius)
        .u16(c.water_pressure_kpa)
        .u16(c.fuel_pressure_kpa)
        .u8(c.car_flags)
        .u8(c.fuel_capacity)
        .u8(c.brake)
        .u8(c.throttle)
        .u8(c.clutch)
        .i8(c.steering)
        .f32(c.fuel_level)
        .f32(c.speed)
        .u16(c.rpm)
        .u16(c.max_rpm)
        .u8(c.gear_num_gears)
        .u8(c.boost_amount)
        .i8(c.enforced_pit_stop_lap)
        .u8(c.crash_state)
        .f32(c.odometer_km);

    let m = &packet.motion;
    w.f32s(&m.orientation)
        .f32s(&m.local_velocity)
        .f32s(&m.world_velocity)
        .f32s(&m.angular_velocity)
        .f32s(&m.local_acceleration)
        .f32s(&m.world_acceleration)
        .f32s(&m.extents_centre);

    let wh = &packet.wheels;
    w.u8s(&wh.tyre_flags)
        .u8s(&wh.terrain)
        .f32s(&wh.tyre_y)
        .f32s(&wh.tyre_rps)
        .f32s(&wh.tyre_slip_speed)
        .u8s(&wh.tyre_temp)
        .u8s(&wh.tyre_grip)
        .f32s(&wh.tyre_height_above_ground)
        .f32s(&wh.tyre_lateral_stiffness)
        .u8s(&wh.tyre_wear)
        .u8s(&wh.brake_damage)
        .u8s(&wh.suspension_damage)
        .i16s(&wh.brake_temp_celsius)
        .u16s(&wh.tyre_tread_temp)
        .u16s(&wh.tyre_layer_temp)
        .u16s(&wh.tyre_carcass_temp)
        .u16s(&wh.tyre_rim_temp)
        .u16s(&wh.tyre_internal_air_temp)
        .f32s(&wh.wheel_local_position_y)
        .f32s(&wh.ride_height)
        .f32s(&wh.suspension_travel)
        .f32s(&wh.suspension_velocity)
        .u16s(&wh.air_pressure);

    w.f32(packet.engine_speed)
        .f32(packet.engine_torque)
        .u8(packet.aero_damage)
        .u8(packet.engine_damage);

    let we = &packet.weather;
    w.i8(we.ambient_temperature)
        .i8(we.track_temperature)
        .u8(we.rain_density)
        .i8(we.wind_speed)
        .i8(we.wind_direction_x)
        .i8(we.wind_direction_y);

    let blank = ParticipantInfo::default();
    for slot in 0..PARTICIPANT_SLOTS {
        let info = packet.participants.get(slot).unwrap_or(&blank);
        w.i16s(&info.world_position)
            .u16(info.current_lap_distance)
            .u8(info.race_position)
            .u8(info.laps_completed)
            .u8(info.current_lap)
            .u8(info.sector)
            .f32(info.last_sector_time);
    }

    w.f32(packet.track_length).u8s(&packet.wings).u8(packet.dpad);
    w.finish()
}

fn names_slots(w: &mut ByteWriter, names: &[String]) {
    for slot in 0..NAMES_PER_PACKET {
        w.string(names.get(slot).map(String::as_str).unwrap_or(""), NAME_WIDTH);
    }
}

/// Encode a participant packet into its 1347-byte wire form.
pub fn encode_participant(packet: &ParticipantPacket) -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(ParticipantPacket::LENGTH);
    w.u16(packet.header.build_version).u8(packet.header.packet_type);
    w.string(&packet.car_name, NAME_WIDTH)
        .string(&packet.car_class_name, NAME_WIDTH)
        .string(&packet.track_location, NAME_WIDTH)
        .string(&packet.track_variation, NAME_WIDTH);
    names_slots(&mut w, &packet.names);
    w.f32s(&packet.fastest_lap_times);
    w.finish()
}

/// Encode an additional participant packet into its 1028-byte wire form.
pub fn encode_additional(packet: &AdditionalParticipantPacket) -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(AdditionalParticipantPacket::LENGTH);
    w.u16(packet.header.build_version).u8(packet.header.packet_type).u8(packet.offset);
    names_slots(&mut w, &packet.names);
    w.finish()
}

pub fn encode(packet: &Packet) -> Vec<u8> {
    match packet {
        Packet::Telemetry(telemetry) => encode_telemetry(telemetry),
        Packet::Participant(participant) => encode_participant(participant),
        Packet::AdditionalParticipant(additional) => encode_additional(additional),
    }
}

/// Telemetry packet with the given state triple and 56 empty participant slots.
pub fn telemetry_with_state(game: GameState, session: SessionState, race: RaceState) -> TelemetryPacket {
    let mut packet = TelemetryPacket {
        game_session_state: game.code() | (session.code() << flags::game_session::SESSION_SHIFT),
        race_state_flags: race.code(),
        participants: vec![ParticipantInfo::default(); PARTICIPANT_SLOTS],
        ..Default::default()
    };
    packet.header.packet_type = PacketKind::Telemetry.tag();
    packet
}

/// State triple that derives each lifecycle state.
pub fn state_triple(state: LifecycleState) -> (GameState, SessionState, RaceState) {
    match state {
        LifecycleState::Loading => (GameState::Max, SessionState::Invalid, RaceState::Invalid),
        LifecycleState::PreRacePaused => (GameState::Paused, SessionState::Race, RaceState::NotStarted),
        LifecycleState::PreRace => (GameState::Playing, SessionState::Race, RaceState::NotStarted),
        LifecycleState::Racing => (GameState::Playing, SessionState::Race, RaceState::Racing),
        LifecycleState::Finished => (GameState::Playing, SessionState::Race, RaceState::Finished),
        LifecycleState::Undefined => (GameState::FrontEnd, SessionState::Invalid, RaceState::Invalid),
    }
}

/// Telemetry packet that derives `state`, reporting `num_participants` drivers.
pub fn telemetry_in(state: LifecycleState, num_participants: i8) -> TelemetryPacket {
    let (game, session, race) = state_triple(state);
    let mut packet = telemetry_with_state(game, session, race);
    packet.num_participants = num_participants;
    packet
}

/// Mark `slot` active and report a last sector time for it.
pub fn set_sector_time(
    packet: &mut TelemetryPacket,
    slot: usize,
    time: f32,
    sector: CurrentSector,
) {
    if let Some(info) = packet.participants.get_mut(slot) {
        info.race_position = flags::participant::ACTIVE | (slot as u8 + 1);
        info.sector = (info.sector & !flags::participant::SECTOR_MASK) | sector.code();
        info.last_sector_time = time;
    }
}

pub fn participant_packet(names: &[&str]) -> ParticipantPacket {
    let mut packet = ParticipantPacket {
        car_name: "Formula Rookie".to_string(),
        car_class_name: "FR".to_string(),
        track_location: "Brands Hatch".to_string(),
        track_variation: "Indy".to_string(),
        names: padded_names(names),
        ..Default::default()
    };
    packet.header.packet_type = PacketKind::Participant.tag();
    packet
}

pub fn additional_packet(offset: u8, names: &[&str]) -> AdditionalParticipantPacket {
    let mut packet = AdditionalParticipantPacket { offset, names: padded_names(names), ..Default::default() };
    packet.header.packet_type = PacketKind::AdditionalParticipant.tag();
    packet
}

fn padded_names(names: &[&str]) -> Vec<String> {
    (0..NAMES_PER_PACKET).map(|i| names.get(i).copied().unwrap_or("").to_string()).collect()
}

pub fn shared(packet: impl Into<Packet>) -> Arc<Packet> {
    Arc::new(packet.into())
}

/// Frame raw datagrams the way a capture file stores them.
pub fn framed_capture<B: AsRef<[u8]>>(datagrams: &[B]) -> Vec<u8> {
    let mut out = Vec::new();
    for datagram in datagrams {
        let bytes = datagram.as_ref();
        out.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
        out.extend_from_slice(bytes);
    }
    out
}

/// Frame a sequence of packets into capture bytes.
pub fn capture_of(packets: &[Packet]) -> Vec<u8> {
    let datagrams: Vec<Vec<u8>> = packets.iter().map(encode).collect();
    framed_capture(&datagrams)
}

/// Lifecycle walk of one race with `drivers` named participants.
///
/// Loading, pre-race paused, pre-race, `racing_ticks` racing packets, then two
/// finished packets.
pub fn race_packets(drivers: &[&str], racing_ticks: usize) -> Vec<Packet> {
    let count = drivers.len() as i8;
    let mut packets = vec![
        telemetry_in(LifecycleState::Loading, 0).into(),
        telemetry_in(LifecycleState::PreRacePaused, count).into(),
        telemetry_in(LifecycleState::PreRace, count).into(),
        participant_packet(drivers).into(),
    ];
    packets.extend((0..racing_ticks).map(|_| telemetry_in(LifecycleState::Racing, count).into()));
    packets.push(telemetry_in(LifecycleState::Finished, count).into());
    packets.push(telemetry_in(LifecycleState::Finished, count).into());
    packets
}

/// Unique scratch path under the system temp directory.
pub fn temp_capture_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("paddock-{}-{}.capture", std::process::id(), name))
}
