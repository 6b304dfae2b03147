//! Sector history and lap reconstruction

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::roster::Driver;
use crate::protocol::{Packet, ParticipantInfo};
use crate::types::CurrentSector;

/// Sector a reported time belongs to.
///
/// A participant reports the time of the sector it just completed alongside
/// the sector it is now in, so the completed sector is one behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum TimedSector {
    Sector1,
    Sector2,
    Sector3,
    Invalid,
    Other,
}

impl TimedSector {
    /// Sector completed by a participant now in `current`.
    pub fn completed_before(current: Option<CurrentSector>) -> Self {
        match current {
            Some(CurrentSector::Sector1) => TimedSector::Sector1,
            Some(CurrentSector::Sector2) => TimedSector::Sector2,
            Some(CurrentSector::Start) => TimedSector::Sector3,
            Some(CurrentSector::Invalid) => TimedSector::Invalid,
            _ => TimedSector::Other,
        }
    }
}

/// One completed sector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct SectorTime {
    pub time: f32,
    pub sector: TimedSector,
    pub invalidated: bool,
}

impl SectorTime {
    /// Sector time reported by a participant slot, unless it still carries
    /// the no-time-yet sentinel.
    pub fn from_participant(info: &ParticipantInfo) -> Option<Self> {
        Some(Self {
            time: info.sector_time()?,
            sector: TimedSector::completed_before(info.current_sector()),
            invalidated: info.lap_invalidated(),
        })
    }
}

impl Driver {
    /// Append a sector time unless it repeats the last one.
    ///
    /// Every tick re-reports the last completed sector, so consecutive ticks
    /// with the same time and sector collapse into one entry.
    pub fn add_sector_time(&mut self, sector_time: SectorTime) -> bool {
        let repeated = self
            .sector_times
            .last()
            .is_some_and(|last| last.time == sector_time.time && last.sector == sector_time.sector);
        if !repeated {
            self.sector_times.push(sector_time);
        }
        !repeated
    }

    /// Complete laps as groups of three sector times, starting at the first
    /// sector one. A trailing partial lap is ignored.
    pub fn laps(&self) -> impl Iterator<Item = &[SectorTime]> {
        let start = self
            .sector_times
            .iter()
            .position(|s| s.sector == TimedSector::Sector1)
            .unwrap_or(self.sector_times.len());
        self.sector_times[start..].chunks_exact(3)
    }

    pub fn lap_times(&self) -> Vec<f32> {
        self.laps().map(|lap| lap.iter().map(|s| s.time).sum()).collect()
    }

    pub fn laps_complete(&self) -> usize {
        self.laps().count()
    }

    pub fn best_lap(&self) -> Option<f32> {
        self.lap_times().into_iter().reduce(f32::min)
    }

    /// Fastest time recorded in `sector` across the whole race.
    pub fn best_sector(&self, sector: TimedSector) -> Option<f32> {
        self.sector_times.iter().filter(|s| s.sector == sector).map(|s| s.time).reduce(f32::min)
    }

    /// Total of all complete laps.
    pub fn race_time(&self) -> Option<f32> {
        let laps = self.lap_times();
        (!laps.is_empty()).then(|| laps.iter().sum())
    }
}

/// Event-wide figures gathered while timing a race.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EventTotals {
    /// Laps in event as last reported.
    pub laps_in_event: u8,
    /// Largest event time remaining seen, never negative.
    pub event_time_remaining: f32,
}

/// Walk the race packets and record every driver's sector history.
///
/// Participant slot `i` belongs to the driver with index `i`; inactive slots
/// are skipped.
pub fn record_sector_times<I>(drivers: &mut [Driver], packets: I) -> EventTotals
where
    I: IntoIterator<Item = Arc<Packet>>,
{
    let slots: HashMap<usize, usize> =
        drivers.iter().enumerate().map(|(position, driver)| (driver.index, position)).collect();
    let mut totals = EventTotals::default();

    for packet in packets {
        let Some(telemetry) = packet.as_telemetry() else { continue };
        totals.laps_in_event = telemetry.laps_in_event;
        totals.event_time_remaining =
            totals.event_time_remaining.max(telemetry.timings.event_time_remaining);

        for (slot, info) in telemetry.active_participants() {
            let Some(&position) = slots.get(&slot) else { continue };
            if let Some(sector_time) = SectorTime::from_participant(info) {
                let driver = &mut drivers[position];
                if driver.add_sector_time(sector_time) {
                    trace!("{} {:?} {:.3}", driver.name, sector_time.sector, sector_time.time);
                }
            }
        }
    }
    totals
}
