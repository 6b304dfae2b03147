//! Core value types shared by the packet decoder and race logic.
//!
//! ## Architecture
//!
//! - [`ByteCursor`] performs bounds-checked, offset-advancing reads with the
//!   protocol's mixed byte order (big-endian integers, little-endian floats)
//! - The code tables ([`GameState`], [`RaceState`], [`CurrentSector`], ...) map
//!   raw wire codes to closed enums, yielding `None` for unknown codes
//! - [`flags`] holds the bit-exact masks for every packed byte
//! - [`BitField`] wraps flag words with set/flag queries
//!
//! ## Usage Example
//!
//! ```rust
//! use paddock::types::{ByteCursor, RaceState};
//!
//! let data = [0x00, 0x02, 0x00, 0x00, 0x20, 0x41];
//! let mut cursor = ByteCursor::new(&data);
//!
//! let state = RaceState::from_code(cursor.read_u16().unwrap() as u8);
//! assert_eq!(state, Some(RaceState::Racing));
//! assert_eq!(cursor.read_f32().unwrap(), 10.0);
//! ```

mod bitfield;
mod cursor;
mod enums;
pub mod flags;

pub use bitfield::{BitField, abs_enabled, dpad_buttons, engine_running, tyre_in_contact};
pub use cursor::ByteCursor;
pub use enums::{
    CrashDamageState, CurrentSector, FlagColour, FlagReason, GameState, PitMode, PitSchedule,
    RaceState, SessionState, TerrainMaterial,
};
