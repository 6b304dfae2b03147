//! Telemetry snapshot packet (1367 bytes)
//!
//! Fields are decoded positionally in wire order. Packed bytes are kept raw on
//! the struct and split by accessor methods so that a decoded packet carries
//! exactly the information that was on the wire.

use serde::{Deserialize, Serialize};

use super::header::{PacketHeader, PacketKind};
use crate::error::DecodeError;
use crate::types::{
    BitField, ByteCursor, CrashDamageState, CurrentSector, FlagColour, FlagReason, GameState,
    PitMode, PitSchedule, RaceState, SessionState, TerrainMaterial, dpad_buttons, flags,
};

/// Participant slots carried by every telemetry packet.
pub const PARTICIPANT_SLOTS: usize = 56;

fn pedal(raw: u8) -> f32 {
    raw as f32 / 255.0
}

fn steer(raw: i8) -> f32 {
    raw as f32 / 127.0
}

fn ratios(raw: [u8; 4]) -> [f32; 4] {
    raw.map(pedal)
}

/// Per-tick race and car state of the viewed participant, plus the position and
/// timing of every participant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct TelemetryPacket {
    pub header: PacketHeader,
    pub game_session_state: u8,
    pub viewed_participant_index: i8,
    pub num_participants: i8,
    pub unfiltered_throttle: u8,
    pub unfiltered_brake: u8,
    pub unfiltered_steering: i8,
    pub unfiltered_clutch: u8,
    pub race_state_flags: u8,
    pub laps_in_event: u8,
    pub timings: Timings,
    pub joypad: u16,
    pub highest_flag: u8,
    pub pit_mode_schedule: u8,
    pub car: CarState,
    pub motion: Motion,
    pub wheels: Wheels,
    pub engine_speed: f32,
    pub engine_torque: f32,
    pub aero_damage: u8,
    pub engine_damage: u8,
    pub weather: Weather,
    /// Always [`PARTICIPANT_SLOTS`] entries once decoded.
    pub participants: Vec<ParticipantInfo>,
    pub track_length: f32,
    pub wings: [u8; 2],
    pub dpad: u8,
}

/// Lap, split and sector timings in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct Timings {
    pub best_lap_time: f32,
    pub last_lap_time: f32,
    pub current_time: f32,
    pub split_time_ahead: f32,
    pub split_time_behind: f32,
    pub split_time: f32,
    pub event_time_remaining: f32,
    pub personal_fastest_lap_time: f32,
    pub world_fastest_lap_time: f32,
    pub current_sector_times: [f32; 3],
    pub fastest_sector_times: [f32; 3],
    pub personal_fastest_sector_times: [f32; 3],
    pub world_fastest_sector_times: [f32; 3],
}

/// Engine, fluids and driver inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct CarState {
    pub oil_temp_celsius: i16,
    pub oil_pressure_kpa: u16,
    pub water_temp_celsius: i16,
    pub water_pressure_kpa: u16,
    pub fuel_pressure_kpa: u16,
    pub car_flags: u8,
    pub fuel_capacity: u8,
    pub brake: u8,
    pub throttle: u8,
    pub clutch: u8,
    pub steering: i8,
    pub fuel_level: f32,
    pub speed: f32,
    pub rpm: u16,
    pub max_rpm: u16,
    pub gear_num_gears: u8,
    pub boost_amount: u8,
    pub enforced_pit_stop_lap: i8,
    pub crash_state: u8,
    pub odometer_km: f32,
}

/// Body orientation and motion vectors (x, y, z).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct Motion {
    pub orientation: [f32; 3],
    pub local_velocity: [f32; 3],
    pub world_velocity: [f32; 3],
    pub angular_velocity: [f32; 3],
    pub local_acceleration: [f32; 3],
    pub world_acceleration: [f32; 3],
    pub extents_centre: [f32; 3],
}

/// Per-wheel data, front-left, front-right, rear-left, rear-right.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct Wheels {
    pub tyre_flags: [u8; 4],
    pub terrain: [u8; 4],
    pub tyre_y: [f32; 4],
    pub tyre_rps: [f32; 4],
    pub tyre_slip_speed: [f32; 4],
    pub tyre_temp: [u8; 4],
    pub tyre_grip: [u8; 4],
    pub tyre_height_above_ground: [f32; 4],
    pub tyre_lateral_stiffness: [f32; 4],
    pub tyre_wear: [u8; 4],
    pub brake_damage: [u8; 4],
    pub suspension_damage: [u8; 4],
    pub brake_temp_celsius: [i16; 4],
    pub tyre_tread_temp: [u16; 4],
    pub tyre_layer_temp: [u16; 4],
    pub tyre_carcass_temp: [u16; 4],
    pub tyre_rim_temp: [u16; 4],
    pub tyre_internal_air_temp: [u16; 4],
    pub wheel_local_position_y: [f32; 4],
    pub ride_height: [f32; 4],
    pub suspension_travel: [f32; 4],
    pub suspension_velocity: [f32; 4],
    pub air_pressure: [u16; 4],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct Weather {
    pub ambient_temperature: i8,
    pub track_temperature: i8,
    pub rain_density: u8,
    pub wind_speed: i8,
    pub wind_direction_x: i8,
    pub wind_direction_y: i8,
}

/// Position and timing of one participant slot (16 bytes on the wire).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct ParticipantInfo {
    pub world_position: [i16; 3],
    pub current_lap_distance: u16,
    pub race_position: u8,
    pub laps_completed: u8,
    pub current_lap: u8,
    pub sector: u8,
    pub last_sector_time: f32,
}

impl TelemetryPacket {
    pub const LENGTH: usize = 1367;

    /// Decode a full telemetry buffer. The caller guarantees the length.
    pub(crate) fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let header = PacketHeader::read(cursor)?;
        header.expect_kind(PacketKind::Telemetry)?;

        let game_session_state = cursor.read_u8()?;
        let viewed_participant_index = cursor.read_i8()?;
        let num_participants = cursor.read_i8()?;
        let unfiltered_throttle = cursor.read_u8()?;
        let unfiltered_brake = cursor.read_u8()?;
        let unfiltered_steering = cursor.read_i8()?;
        let unfiltered_clutch = cursor.read_u8()?;
        let race_state_flags = cursor.read_u8()?;
        let laps_in_event = cursor.read_u8()?;
        let timings = Timings::read(cursor)?;
        let joypad = cursor.read_u16()?;
        let highest_flag = cursor.read_u8()?;
        let pit_mode_schedule = cursor.read_u8()?;
        let car = CarState::read(cursor)?;
        let motion = Motion::read(cursor)?;
        let wheels = Wheels::read(cursor)?;
        let engine_speed = cursor.read_f32()?;
        let engine_torque = cursor.read_f32()?;
        let aero_damage = cursor.read_u8()?;
        let engine_damage = cursor.read_u8()?;
        let weather = Weather::read(cursor)?;

        let mut participants = Vec::with_capacity(PARTICIPANT_SLOTS);
        for _ in 0..PARTICIPANT_SLOTS {
            participants.push(ParticipantInfo::read(cursor)?);
        }

        let track_length = cursor.read_f32()?;
        let wings = cursor.read_array(ByteCursor::read_u8)?;
        let dpad = cursor.read_u8()?;

        Ok(Self {
            header,
            game_session_state,
            viewed_participant_index,
            num_participants,
            unfiltered_throttle,
            unfiltered_brake,
            unfiltered_steering,
            unfiltered_clutch,
            race_state_flags,
            laps_in_event,
            timings,
            joypad,
            highest_flag,
            pit_mode_schedule,
            car,
            motion,
            wheels,
            engine_speed,
            engine_torque,
            aero_damage,
            engine_damage,
            weather,
            participants,
            track_length,
            wings,
            dpad,
        })
    }

    pub fn game_state(&self) -> Option<GameState> {
        GameState::from_code(self.game_session_state & flags::game_session::GAME_MASK)
    }

    pub fn session_state(&self) -> Option<SessionState> {
        SessionState::from_code(self.game_session_state >> flags::game_session::SESSION_SHIFT)
    }

    pub fn race_state(&self) -> Option<RaceState> {
        RaceState::from_code(self.race_state_flags & flags::race_state::STATE_MASK)
    }

    pub fn lap_invalidated(&self) -> bool {
        self.race_state_flags & flags::race_state::LAP_INVALIDATED != 0
    }

    pub fn anti_lock_active(&self) -> bool {
        self.race_state_flags & flags::race_state::ANTI_LOCK_ACTIVE != 0
    }

    pub fn boost_active(&self) -> bool {
        self.race_state_flags & flags::race_state::BOOST_ACTIVE != 0
    }

    pub fn unfiltered_throttle_ratio(&self) -> f32 {
        pedal(self.unfiltered_throttle)
    }

    pub fn unfiltered_brake_ratio(&self) -> f32 {
        pedal(self.unfiltered_brake)
    }

    pub fn unfiltered_steering_ratio(&self) -> f32 {
        steer(self.unfiltered_steering)
    }

    pub fn unfiltered_clutch_ratio(&self) -> f32 {
        pedal(self.unfiltered_clutch)
    }

    pub fn joypad_buttons(&self) -> BitField {
        BitField::new(self.joypad)
    }

    pub fn highest_flag_colour(&self) -> Option<FlagColour> {
        FlagColour::from_code(self.highest_flag & flags::nibble::LOW_MASK)
    }

    pub fn highest_flag_reason(&self) -> Option<FlagReason> {
        FlagReason::from_code(self.highest_flag >> flags::nibble::HIGH_SHIFT)
    }

    pub fn pit_mode(&self) -> Option<PitMode> {
        PitMode::from_code(self.pit_mode_schedule & flags::nibble::LOW_MASK)
    }

    pub fn pit_schedule(&self) -> Option<PitSchedule> {
        PitSchedule::from_code(self.pit_mode_schedule >> flags::nibble::HIGH_SHIFT)
    }

    /// All eight d-pad buttons, gathered from the two bytes that carry them.
    pub fn dpad_buttons(&self) -> BitField {
        dpad_buttons(self.dpad, self.car.crash_state)
    }

    pub fn aero_damage_ratio(&self) -> f32 {
        pedal(self.aero_damage)
    }

    pub fn engine_damage_ratio(&self) -> f32 {
        pedal(self.engine_damage)
    }

    /// Participant slots that are currently in use, with their slot index.
    pub fn active_participants(&self) -> impl Iterator<Item = (usize, &ParticipantInfo)> {
        self.participants.iter().enumerate().filter(|(_, info)| info.is_active())
    }
}

impl Timings {
    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            best_lap_time: cursor.read_f32()?,
            last_lap_time: cursor.read_f32()?,
            current_time: cursor.read_f32()?,
            split_time_ahead: cursor.read_f32()?,
            split_time_behind: cursor.read_f32()?,
            split_time: cursor.read_f32()?,
            event_time_remaining: cursor.read_f32()?,
            personal_fastest_lap_time: cursor.read_f32()?,
            world_fastest_lap_time: cursor.read_f32()?,
            current_sector_times: cursor.read_array(ByteCursor::read_f32)?,
            fastest_sector_times: cursor.read_array(ByteCursor::read_f32)?,
            personal_fastest_sector_times: cursor.read_array(ByteCursor::read_f32)?,
            world_fastest_sector_times: cursor.read_array(ByteCursor::read_f32)?,
        })
    }
}

impl CarState {
    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            oil_temp_celsius: cursor.read_i16()?,
            oil_pressure_kpa: cursor.read_u16()?,
            water_temp_celsius: cursor.read_i16()?,
            water_pressure_kpa: cursor.read_u16()?,
            fuel_pressure_kpa: cursor.read_u16()?,
            car_flags: cursor.read_u8()?,
            fuel_capacity: cursor.read_u8()?,
            brake: cursor.read_u8()?,
            throttle: cursor.read_u8()?,
            clutch: cursor.read_u8()?,
            steering: cursor.read_i8()?,
            fuel_level: cursor.read_f32()?,
            speed: cursor.read_f32()?,
            rpm: cursor.read_u16()?,
            max_rpm: cursor.read_u16()?,
            gear_num_gears: cursor.read_u8()?,
            boost_amount: cursor.read_u8()?,
            enforced_pit_stop_lap: cursor.read_i8()?,
            crash_state: cursor.read_u8()?,
            odometer_km: cursor.read_f32()?,
        })
    }

    pub fn car_flags(&self) -> BitField {
        BitField::from(self.car_flags)
    }

    pub fn brake_ratio(&self) -> f32 {
        pedal(self.brake)
    }

    pub fn throttle_ratio(&self) -> f32 {
        pedal(self.throttle)
    }

    pub fn clutch_ratio(&self) -> f32 {
        pedal(self.clutch)
    }

    pub fn steering_ratio(&self) -> f32 {
        steer(self.steering)
    }

    pub fn gear(&self) -> u8 {
        self.gear_num_gears & flags::gear::GEAR_MASK
    }

    pub fn num_gears(&self) -> u8 {
        self.gear_num_gears >> flags::gear::NUM_GEARS_SHIFT
    }

    pub fn crash_damage_state(&self) -> Option<CrashDamageState> {
        CrashDamageState::from_code(self.crash_state & flags::dpad::CRASH_STATE_MASK)
    }
}

impl Motion {
    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            orientation: cursor.read_array(ByteCursor::read_f32)?,
            local_velocity: cursor.read_array(ByteCursor::read_f32)?,
            world_velocity: cursor.read_array(ByteCursor::read_f32)?,
            angular_velocity: cursor.read_array(ByteCursor::read_f32)?,
            local_acceleration: cursor.read_array(ByteCursor::read_f32)?,
            world_acceleration: cursor.read_array(ByteCursor::read_f32)?,
            extents_centre: cursor.read_array(ByteCursor::read_f32)?,
        })
    }
}

impl Wheels {
    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            tyre_flags: cursor.read_array(ByteCursor::read_u8)?,
            terrain: cursor.read_array(ByteCursor::read_u8)?,
            tyre_y: cursor.read_array(ByteCursor::read_f32)?,
            tyre_rps: cursor.read_array(ByteCursor::read_f32)?,
            tyre_slip_speed: cursor.read_array(ByteCursor::read_f32)?,
            tyre_temp: cursor.read_array(ByteCursor::read_u8)?,
            tyre_grip: cursor.read_array(ByteCursor::read_u8)?,
            tyre_height_above_ground: cursor.read_array(ByteCursor::read_f32)?,
            tyre_lateral_stiffness: cursor.read_array(ByteCursor::read_f32)?,
            tyre_wear: cursor.read_array(ByteCursor::read_u8)?,
            brake_damage: cursor.read_array(ByteCursor::read_u8)?,
            suspension_damage: cursor.read_array(ByteCursor::read_u8)?,
            brake_temp_celsius: cursor.read_array(ByteCursor::read_i16)?,
            tyre_tread_temp: cursor.read_array(ByteCursor::read_u16)?,
            tyre_layer_temp: cursor.read_array(ByteCursor::read_u16)?,
            tyre_carcass_temp: cursor.read_array(ByteCursor::read_u16)?,
            tyre_rim_temp: cursor.read_array(ByteCursor::read_u16)?,
            tyre_internal_air_temp: cursor.read_array(ByteCursor::read_u16)?,
            wheel_local_position_y: cursor.read_array(ByteCursor::read_f32)?,
            ride_height: cursor.read_array(ByteCursor::read_f32)?,
            suspension_travel: cursor.read_array(ByteCursor::read_f32)?,
            suspension_velocity: cursor.read_array(ByteCursor::read_f32)?,
            air_pressure: cursor.read_array(ByteCursor::read_u16)?,
        })
    }

    pub fn tyre_flags(&self) -> [BitField; 4] {
        self.tyre_flags.map(BitField::from)
    }

    pub fn terrain(&self) -> [Option<TerrainMaterial>; 4] {
        self.terrain.map(TerrainMaterial::from_code)
    }

    pub fn tyre_grip_ratio(&self) -> [f32; 4] {
        ratios(self.tyre_grip)
    }

    pub fn tyre_wear_ratio(&self) -> [f32; 4] {
        ratios(self.tyre_wear)
    }

    pub fn brake_damage_ratio(&self) -> [f32; 4] {
        ratios(self.brake_damage)
    }

    pub fn suspension_damage_ratio(&self) -> [f32; 4] {
        ratios(self.suspension_damage)
    }
}

impl Weather {
    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            ambient_temperature: cursor.read_i8()?,
            track_temperature: cursor.read_i8()?,
            rain_density: cursor.read_u8()?,
            wind_speed: cursor.read_i8()?,
            wind_direction_x: cursor.read_i8()?,
            wind_direction_y: cursor.read_i8()?,
        })
    }

    pub fn rain_density_ratio(&self) -> f32 {
        pedal(self.rain_density)
    }
}

impl ParticipantInfo {
    pub const SIZE: usize = 16;

    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            world_position: cursor.read_array(ByteCursor::read_i16)?,
            current_lap_distance: cursor.read_u16()?,
            race_position: cursor.read_u8()?,
            laps_completed: cursor.read_u8()?,
            current_lap: cursor.read_u8()?,
            sector: cursor.read_u8()?,
            last_sector_time: cursor.read_f32()?,
        })
    }

    /// Whether this slot holds a participant in the session.
    pub fn is_active(&self) -> bool {
        self.race_position & flags::participant::ACTIVE != 0
    }

    pub fn position(&self) -> u8 {
        self.race_position & flags::participant::POSITION_MASK
    }

    pub fn lap_invalidated(&self) -> bool {
        self.laps_completed & flags::participant::LAP_INVALIDATED != 0
    }

    pub fn completed_laps(&self) -> u8 {
        self.laps_completed & flags::participant::LAPS_COMPLETED_MASK
    }

    pub fn current_sector(&self) -> Option<CurrentSector> {
        CurrentSector::from_code(self.sector & flags::participant::SECTOR_MASK)
    }

    pub fn same_class(&self) -> bool {
        self.sector & flags::participant::SAME_CLASS != 0
    }

    /// World position with X and Z refined to quarter units by the sector byte.
    pub fn refined_world_position(&self) -> [f32; 3] {
        use flags::participant::{X_REFINE_SHIFT, Z_REFINE_MASK, Z_REFINE_SHIFT};

        let [x, y, z] = self.world_position;
        let x_quarters = (self.sector >> X_REFINE_SHIFT) as f32;
        let z_quarters = ((self.sector & Z_REFINE_MASK) >> Z_REFINE_SHIFT) as f32;
        [x as f32 + x_quarters / 4.0, y as f32, z as f32 + z_quarters / 4.0]
    }

    /// Last sector time, or `None` while the slot still reports the
    /// no-time-yet sentinel.
    pub fn sector_time(&self) -> Option<f32> {
        (self.last_sector_time != flags::participant::NO_SECTOR_TIME)
            .then_some(self.last_sector_time)
    }
}
