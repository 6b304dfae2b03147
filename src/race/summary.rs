//! Serializable race summaries and the index of races read from a capture

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::Race;
use super::roster::Driver;
use super::timing::{SectorTime, TimedSector};
use crate::config::Settings;
use crate::{Result, TelemetryError};

/// One driver's result, with lap figures derived from the sector history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct DriverSummary {
    pub index: usize,
    pub name: String,
    pub sector_times: Vec<SectorTime>,
    pub lap_times: Vec<f32>,
    pub laps_complete: usize,
    pub best_lap: Option<f32>,
    /// Best sector one, two and three.
    pub best_sectors: [Option<f32>; 3],
    pub race_time: Option<f32>,
}

impl DriverSummary {
    fn new(driver: &Driver, settings: Option<&Settings>) -> Self {
        let name = match settings {
            Some(settings) => settings.display_name(&driver.name).to_string(),
            None => driver.name.clone(),
        };
        Self {
            index: driver.index,
            name,
            sector_times: driver.sector_times.clone(),
            lap_times: driver.lap_times(),
            laps_complete: driver.laps_complete(),
            best_lap: driver.best_lap(),
            best_sectors: [TimedSector::Sector1, TimedSector::Sector2, TimedSector::Sector3]
                .map(|sector| driver.best_sector(sector)),
            race_time: driver.race_time(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct RaceSummary {
    /// Position of the race within its capture.
    pub id: usize,
    pub drivers: Vec<DriverSummary>,
    pub packet_count: usize,
    pub complete_race: bool,
    pub laps: u8,
    /// Event time remaining at its largest, in seconds.
    pub time: f32,
}

impl RaceSummary {
    pub fn new(id: usize, race: &Race, settings: Option<&Settings>) -> Self {
        Self {
            id,
            drivers: race.drivers().iter().map(|d| DriverSummary::new(d, settings)).collect(),
            packet_count: race.packet_count(),
            complete_race: race.is_complete(),
            laps: race.laps_in_event(),
            time: race.event_time_remaining(),
        }
    }
}

/// Races of one capture, in capture order.
#[derive(Debug, Clone, Default)]
pub struct RaceIndex {
    races: Vec<Race>,
}

impl RaceIndex {
    pub fn from_races(races: Vec<Race>) -> Self {
        Self { races }
    }

    /// Read the capture named by `source_telemetry` in the settings.
    pub fn load(settings: &Settings) -> Result<Self> {
        let path = settings.source_telemetry().ok_or_else(|| {
            TelemetryError::config_error("source_telemetry", "no capture file configured")
        })?;
        let index = Self::from_races(super::read_races(path)?);
        info!(
            "Indexed {} races ({} complete) from {}",
            index.len(),
            index.complete().count(),
            path.display()
        );
        Ok(index)
    }

    /// Append a race, returning its id.
    pub fn push(&mut self, race: Race) -> usize {
        self.races.push(race);
        self.races.len() - 1
    }

    pub fn get(&self, id: usize) -> Option<&Race> {
        self.races.get(id)
    }

    pub fn len(&self) -> usize {
        self.races.len()
    }

    pub fn is_empty(&self) -> bool {
        self.races.is_empty()
    }

    /// Races with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Race)> {
        self.races.iter().enumerate()
    }

    /// Races the feed followed through to the finish.
    pub fn complete(&self) -> impl Iterator<Item = (usize, &Race)> {
        self.iter().filter(|(_, race)| race.is_complete())
    }

    /// Summaries of the indexed races.
    ///
    /// With settings, display names are overridden and incomplete races are
    /// left out unless `include_incomplete_races` is set.
    pub fn summaries(&self, settings: Option<&Settings>) -> Vec<RaceSummary> {
        let include_incomplete = settings.is_none_or(Settings::include_incomplete_races);
        let summaries: Vec<RaceSummary> = self
            .iter()
            .filter(|(_, race)| include_incomplete || race.is_complete())
            .map(|(id, race)| RaceSummary::new(id, race, settings))
            .collect();
        debug!("Summarised {} of {} races", summaries.len(), self.len());
        summaries
    }
}
