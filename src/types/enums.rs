//! Closed code tables for the enumerated telemetry fields
//!
//! Each enum maps a small wire code to a named variant and back. Lookup of an
//! unrecognised code yields `None`; the broadcast is known to emit transient
//! garbage in these fields, so decoding never fails on them.

use serde::{Deserialize, Serialize};

macro_rules! code_table {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident = $code:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[cfg_attr(feature = "tauri", derive(specta::Type))]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every variant in code order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Look up the variant carrying `code`.
            pub fn from_code(code: u8) -> Option<Self> {
                match code {
                    $($code => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// Wire code of this variant.
            pub fn code(self) -> u8 {
                match self {
                    $($name::$variant => $code),+
                }
            }
        }
    };
}

code_table! {
    /// Top-level state of the game client.
    pub enum GameState {
        Exited = 0,
        FrontEnd = 1,
        Playing = 2,
        Paused = 3,
        Max = 4,
    }
}

code_table! {
    /// Kind of session currently loaded.
    pub enum SessionState {
        Invalid = 0,
        Practice = 1,
        Test = 2,
        Qualify = 3,
        FormationLap = 4,
        Race = 5,
        TimeAttack = 6,
        Max = 7,
    }
}

code_table! {
    /// Race progress of the viewed participant.
    pub enum RaceState {
        Invalid = 0,
        NotStarted = 1,
        Racing = 2,
        Finished = 3,
        Disqualified = 4,
        Retired = 5,
        Dnf = 6,
        Max = 7,
    }
}

code_table! {
    /// Track sector a participant is currently in.
    pub enum CurrentSector {
        Invalid = 0,
        Start = 1,
        Sector1 = 2,
        Sector2 = 3,
        Finish = 4,
        Stop = 5,
        Max = 6,
    }
}

code_table! {
    pub enum FlagColour {
        None = 0,
        Green = 1,
        Blue = 2,
        White = 3,
        Yellow = 4,
        DoubleYellow = 5,
        Black = 6,
        Chequered = 7,
        Max = 8,
    }
}

code_table! {
    pub enum FlagReason {
        None = 0,
        SoloCrash = 1,
        VehicleCrash = 2,
        VehicleObstruction = 3,
        Max = 4,
    }
}

code_table! {
    pub enum PitMode {
        None = 0,
        DrivingIntoPits = 1,
        InPit = 2,
        DrivingOutOfPits = 3,
        InGarage = 4,
        Max = 5,
    }
}

code_table! {
    pub enum PitSchedule {
        None = 0,
        Standard = 1,
        DriveThrough = 2,
        StopGo = 3,
        Max = 4,
    }
}

code_table! {
    pub enum CrashDamageState {
        None = 0,
        OffTrack = 1,
        LargeProp = 2,
        Spinning = 3,
        Rolling = 4,
        Max = 5,
    }
}

code_table! {
    /// Surface under a tyre.
    pub enum TerrainMaterial {
        Road = 0,
        LowGripRoad = 1,
        BumpyRoad1 = 2,
        BumpyRoad2 = 3,
        BumpyRoad3 = 4,
        Marbles = 5,
        GrassyBerms = 6,
        Grass = 7,
        Gravel = 8,
        BumpyGravel = 9,
        RumbleStrips = 10,
        Drains = 11,
        Tyrewalls = 12,
        Cementwalls = 13,
        Guardrails = 14,
        Sand = 15,
        BumpySand = 16,
        Dirt = 17,
        BumpyDirt = 18,
        DirtRoad = 19,
        BumpyDirtRoad = 20,
        Pavement = 21,
        DirtBank = 22,
        Wood = 23,
        DryVerge = 24,
        ExitRumbleStrips = 25,
        Grasscrete = 26,
        LongGrass = 27,
        SlopeGrass = 28,
        Cobbles = 29,
        SandRoad = 30,
        BakedClay = 31,
        Astroturf = 32,
        SnowHalf = 33,
        SnowFull = 34,
        Max = 35,
    }
}
