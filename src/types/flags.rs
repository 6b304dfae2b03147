//! Bit masks and shifts for the packed telemetry bytes
//!
//! These masks are part of the wire contract and must stay bit-exact.

// Header packet-type byte: tag (low 2 bits) + sequence count
pub mod header {
    pub const TYPE_MASK: u8 = 0x03;
    pub const COUNT_SHIFT: u8 = 2;
}

// Game/session state byte
pub mod game_session {
    pub const GAME_MASK: u8 = 0x0F;
    pub const SESSION_SHIFT: u8 = 4;
}

// Race state flags byte
pub mod race_state {
    pub const STATE_MASK: u8 = 0x07;
    pub const LAP_INVALIDATED: u8 = 0x08;
    pub const ANTI_LOCK_ACTIVE: u8 = 0x10;
    pub const BOOST_ACTIVE: u8 = 0x20;
}

// Highest flag and pit mode bytes share the nibble split
pub mod nibble {
    pub const LOW_MASK: u8 = 0x0F;
    pub const HIGH_SHIFT: u8 = 4;
}

// Car flags byte
pub mod car {
    pub const HEADLIGHT: u16 = 0x01;
    pub const ENGINE_ACTIVE: u16 = 0x02;
    pub const ENGINE_WARNING: u16 = 0x04;
    pub const SPEED_LIMITER: u16 = 0x08;
    pub const ABS: u16 = 0x10;
    pub const HANDBRAKE: u16 = 0x20;
    pub const STABILITY: u16 = 0x40;
    pub const TRACTION_CONTROL: u16 = 0x80;
}

// Per-wheel tyre flags
pub mod tyre {
    pub const ATTACHED: u16 = 0x01;
    pub const INFLATED: u16 = 0x02;
    pub const IS_ON_GROUND: u16 = 0x04;
}

// Joypad word: one bit per button
pub mod joypad {
    pub const LEFT: u16 = 0x0001;
    pub const RIGHT: u16 = 0x0002;
    pub const UP: u16 = 0x0004;
    pub const DOWN: u16 = 0x0008;
    pub const A: u16 = 0x0010;
    pub const B: u16 = 0x0020;
    pub const X: u16 = 0x0040;
    pub const Y: u16 = 0x0080;
    pub const START: u16 = 0x0100;
    pub const BACK: u16 = 0x0200;
    pub const LEFT_STICK: u16 = 0x0400;
    pub const RIGHT_STICK: u16 = 0x0800;
    pub const LEFT_SHOULDER: u16 = 0x1000;
    pub const RIGHT_SHOULDER: u16 = 0x2000;
    pub const LEFT_TRIGGER: u16 = 0x4000;
    pub const RIGHT_TRIGGER: u16 = 0x8000;
}

// D-pad: buttons 1-4 ride in the high nibble of the trailing d-pad byte,
// buttons 5-8 in the high nibble of the crash state byte.
pub mod dpad {
    pub const CRASH_STATE_MASK: u8 = 0x0F;
    pub const BUTTONS_SHIFT: u8 = 4;
}

// Gear byte
pub mod gear {
    pub const GEAR_MASK: u8 = 0x0F;
    pub const NUM_GEARS_SHIFT: u8 = 4;
}

// Participant info packed bytes
pub mod participant {
    pub const ACTIVE: u8 = 0x80;
    pub const POSITION_MASK: u8 = 0x7F;
    pub const LAP_INVALIDATED: u8 = 0x80;
    pub const LAPS_COMPLETED_MASK: u8 = 0x7F;
    pub const SECTOR_MASK: u8 = 0x07;
    pub const SAME_CLASS: u8 = 0x08;
    pub const Z_REFINE_MASK: u8 = 0x30;
    pub const Z_REFINE_SHIFT: u8 = 4;
    pub const X_REFINE_SHIFT: u8 = 6;
    /// Last sector time reported before a participant has set one.
    pub const NO_SECTOR_TIME: f32 = -123.0;
}
