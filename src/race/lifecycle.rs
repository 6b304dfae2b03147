//! Race lifecycle derived from the per-tick state triple

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::protocol::TelemetryPacket;
use crate::types::{GameState, RaceState, SessionState};

/// Lifecycle phase of a session, derived from game, session and race state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum LifecycleState {
    Loading,
    PreRacePaused,
    PreRace,
    Racing,
    Finished,
    #[default]
    Undefined,
}

impl LifecycleState {
    /// Classify a raw state triple. Unrecognised codes arrive as `None`.
    pub fn classify(
        game: Option<GameState>,
        session: Option<SessionState>,
        race: Option<RaceState>,
    ) -> Self {
        match (game, session, race) {
            (Some(GameState::Paused), _, Some(RaceState::NotStarted)) => {
                LifecycleState::PreRacePaused
            }
            (Some(GameState::Playing), _, Some(RaceState::NotStarted)) => LifecycleState::PreRace,
            (_, _, Some(RaceState::Racing)) => LifecycleState::Racing,
            (_, _, Some(RaceState::Finished)) => LifecycleState::Finished,
            (Some(GameState::Max), Some(SessionState::Invalid), Some(RaceState::Invalid)) => {
                LifecycleState::Loading
            }
            _ => LifecycleState::Undefined,
        }
    }

    /// Lifecycle state of one telemetry tick.
    pub fn of(packet: &TelemetryPacket) -> Self {
        let state = Self::classify(packet.game_state(), packet.session_state(), packet.race_state());
        if state == LifecycleState::Undefined {
            debug!(
                game_session = packet.game_session_state,
                race_flags = packet.race_state_flags,
                "Undefined lifecycle state: game={:?} session={:?} race={:?}",
                packet.game_state(),
                packet.session_state(),
                packet.race_state()
            );
        }
        state
    }

    /// Whether entering this state closes a race that was last seen in
    /// `previous`.
    pub fn finishes_race(self, previous: LifecycleState) -> bool {
        match self {
            LifecycleState::Loading => previous == LifecycleState::Racing,
            LifecycleState::Finished => false,
            _ => previous == LifecycleState::Finished,
        }
    }

    /// Whether a race ends when the stream runs dry in this state.
    pub fn closes_on_exhaustion(self) -> bool {
        matches!(self, LifecycleState::Finished | LifecycleState::Undefined)
    }

    /// Whether this state opens a race.
    pub fn starts_race(self) -> bool {
        self == LifecycleState::PreRace
    }
}
