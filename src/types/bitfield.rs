//! BitField type for the packed flag bytes of the telemetry packet

use serde::{Deserialize, Serialize};

use super::flags;

/// Flag word read from the wire (car flags, tyre flags, joypad, d-pad).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct BitField(pub u16);

impl BitField {
    /// Create a new BitField from a raw value.
    pub fn new(value: u16) -> Self {
        Self(value)
    }

    /// Check if a specific bit is set.
    pub fn is_set(&self, bit: u16) -> bool {
        bit < 16 && (self.0 & (1 << bit)) != 0
    }

    /// Check if a specific flag is set using a bitmask.
    pub fn has_flag(&self, flag: u16) -> bool {
        (self.0 & flag) != 0
    }

    /// Get the raw value.
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl From<u8> for BitField {
    fn from(value: u8) -> Self {
        Self(value as u16)
    }
}

/// Convenience: ABS assist active in the car flags.
pub fn abs_enabled(car_flags: BitField) -> bool {
    car_flags.has_flag(flags::car::ABS)
}

/// Convenience: engine running in the car flags.
pub fn engine_running(car_flags: BitField) -> bool {
    car_flags.has_flag(flags::car::ENGINE_ACTIVE)
}

/// Convenience: tyre attached, inflated and touching the ground.
pub fn tyre_in_contact(tyre_flags: BitField) -> bool {
    let required = flags::tyre::ATTACHED | flags::tyre::INFLATED | flags::tyre::IS_ON_GROUND;
    tyre_flags.value() & required == required
}

/// Combine the two d-pad nibbles into one eight-button field.
///
/// Buttons 1-4 come from the high nibble of the d-pad byte and buttons 5-8 from
/// the high nibble of the crash state byte.
pub fn dpad_buttons(dpad: u8, crash_state: u8) -> BitField {
    let low = (dpad >> flags::dpad::BUTTONS_SHIFT) as u16;
    let high = (crash_state >> flags::dpad::BUTTONS_SHIFT) as u16;
    BitField(low | (high << 4))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn bitfield_flag_operations_basic() {
        let bitfield = BitField::new(0b1010);
        assert!(bitfield.is_set(1));
        assert!(!bitfield.is_set(0));
        assert!(bitfield.is_set(3));
        assert!(bitfield.has_flag(0b0010));
        assert!(!bitfield.has_flag(0b0100));
        assert!(!bitfield.is_set(40));
    }

    #[test]
    fn car_flag_helpers() {
        let flags = BitField::from(0x12u8);
        assert!(abs_enabled(flags));
        assert!(engine_running(flags));
        assert!(!abs_enabled(BitField::default()));
    }

    #[test]
    fn tyre_contact_needs_all_three_bits() {
        assert!(tyre_in_contact(BitField::new(0x07)));
        assert!(!tyre_in_contact(BitField::new(0x03)));
    }

    #[test]
    fn dpad_nibbles_combine() {
        let buttons = dpad_buttons(0b1001_0000, 0b0110_0011);
        assert_eq!(buttons.value(), 0b0110_1001);
    }

    proptest! {
        #[test]
        fn prop_bitfield_flag_operations(value in any::<u16>(), bit_index in 0..16u16) {
            let bitfield = BitField::new(value);
            let expected = (value & (1 << bit_index)) != 0;
            prop_assert_eq!(bitfield.is_set(bit_index), expected);
            prop_assert_eq!(bitfield.has_flag(1 << bit_index), expected);
        }

        #[test]
        fn prop_dpad_extraction_over_all_bytes(dpad in any::<u8>(), crash in any::<u8>()) {
            let buttons = dpad_buttons(dpad, crash);
            for button in 0..4u16 {
                prop_assert_eq!(buttons.is_set(button), dpad & (0x10 << button) != 0);
                prop_assert_eq!(buttons.is_set(button + 4), crash & (0x10 << button) != 0);
            }
        }
    }
}
