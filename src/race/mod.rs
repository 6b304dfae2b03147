//! Race reconstruction from a packet stream.
//!
//! Building a [`Race`] takes three passes over the telemetry:
//!
//! 1. [`capture_segment`] walks the stream once, deriving a [`LifecycleState`]
//!    per telemetry tick, and buffers the packets between the race start and
//!    the tick that closes it.
//! 2. [`build_roster`] replays the buffered packets to settle driver names
//!    and participant indices.
//! 3. [`record_sector_times`] replays them again to collect every driver's
//!    sector history, from which laps and bests are derived.
//!
//! ```rust
//! use paddock::race::races_from_stream;
//! use paddock::stream::PacketStream;
//!
//! let mut stream = PacketStream::from_bytes(Vec::new());
//! let races = races_from_stream(&mut stream).unwrap();
//! assert!(races.is_empty());
//! ```

mod lifecycle;
mod roster;
mod segment;
mod summary;
mod timing;

pub use lifecycle::LifecycleState;
pub use roster::{Driver, build_roster};
pub use segment::{RaceSegment, capture_segment};
pub use summary::{DriverSummary, RaceIndex, RaceSummary};
pub use timing::{EventTotals, SectorTime, TimedSector, record_sector_times};

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::Result;
use crate::protocol::Packet;
use crate::stream::PacketStream;

/// One reconstructed race session.
#[derive(Debug, Clone)]
pub struct Race {
    packets: Arc<[Arc<Packet>]>,
    complete: bool,
    totals: EventTotals,
    drivers: Vec<Driver>,
}

impl Race {
    /// Read the next race from `stream`.
    ///
    /// Returns `None` when the stream ran out, or hit a closing transition,
    /// before any race packet was retained.
    pub fn from_stream(stream: &mut PacketStream) -> Option<Race> {
        Self::from_segment(capture_segment(stream))
    }

    /// Assemble a race from an already captured segment.
    pub fn from_segment(segment: RaceSegment) -> Option<Race> {
        if segment.packets.is_empty() {
            return None;
        }
        let complete = segment.is_complete();
        let packets: Arc<[Arc<Packet>]> = segment.packets.into();

        let mut drivers = build_roster(PacketStream::from_shared(Arc::clone(&packets)));
        let totals =
            record_sector_times(&mut drivers, PacketStream::from_shared(Arc::clone(&packets)));

        info!(
            "Race reconstructed: {} drivers, {} packets, {} laps, complete={}",
            drivers.len(),
            packets.len(),
            totals.laps_in_event,
            complete
        );
        Some(Race { packets, complete, totals, drivers })
    }

    /// Fresh stream over the packets of this race.
    pub fn replay(&self) -> PacketStream {
        PacketStream::from_shared(Arc::clone(&self.packets))
    }

    pub fn packets(&self) -> &[Arc<Packet>] {
        &self.packets
    }

    pub fn packet_count(&self) -> usize {
        self.packets.len()
    }

    /// Whether the feed followed the race through to the finish.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Laps in event as last reported during the race.
    pub fn laps_in_event(&self) -> u8 {
        self.totals.laps_in_event
    }

    /// Largest event time remaining reported, never negative.
    pub fn event_time_remaining(&self) -> f32 {
        self.totals.event_time_remaining
    }

    /// Drivers ordered by name.
    pub fn drivers(&self) -> &[Driver] {
        &self.drivers
    }

    /// Driver occupying participant slot `index`.
    pub fn driver(&self, index: usize) -> Option<&Driver> {
        self.drivers.iter().find(|driver| driver.index == index)
    }
}

/// Read every race from `stream` until it is exhausted.
///
/// A framing fault in the underlying capture aborts the read.
pub fn races_from_stream(stream: &mut PacketStream) -> Result<Vec<Race>> {
    let mut races = Vec::new();
    while stream.has_next() {
        match Race::from_stream(stream) {
            Some(race) => races.push(race),
            None => debug!("Segment held no race packets"),
        }
    }

    if let Some(fault) = stream.take_fault() {
        warn!("Capture unreadable after {} races: {}", races.len(), fault);
        return Err(fault);
    }

    let stats = stream.stats();
    info!(
        "Read {} races from {} frames ({} undecodable)",
        races.len(),
        stats.frames_read,
        stats.decode_failures()
    );
    Ok(races)
}

/// Read every race from a capture file.
pub fn read_races<P: AsRef<Path>>(path: P) -> Result<Vec<Race>> {
    let mut stream = PacketStream::open(path)?;
    races_from_stream(&mut stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TelemetryError;
    use crate::test_utils::{
        capture_of, participant_packet, race_packets, set_sector_time, telemetry_in,
    };
    use crate::types::CurrentSector;
    use anyhow::{Context, ensure};

    fn timed_race() -> Vec<Packet> {
        let mut packets = vec![
            telemetry_in(LifecycleState::Loading, 0).into(),
            telemetry_in(LifecycleState::PreRace, 3).into(),
            participant_packet(&["Zed", "Amy"]).into(),
        ];
        let sectors = [
            (10.0, CurrentSector::Sector1),
            (11.0, CurrentSector::Sector2),
            (12.0, CurrentSector::Start),
            (9.0, CurrentSector::Sector1),
            (10.0, CurrentSector::Sector2),
        ];
        for (time, sector) in sectors {
            for _ in 0..2 {
                let mut tick = telemetry_in(LifecycleState::Racing, 3);
                tick.laps_in_event = 2;
                tick.timings.event_time_remaining = 100.0 - time;
                set_sector_time(&mut tick, 1, time, sector);
                set_sector_time(&mut tick, 0, -123.0, CurrentSector::Sector1);
                packets.push(tick.into());
            }
        }
        packets.push(telemetry_in(LifecycleState::Finished, 3).into());
        packets
    }

    #[test]
    fn reconstructs_drivers_and_laps() -> anyhow::Result<()> {
        let mut stream = PacketStream::from_bytes(capture_of(&timed_race()));
        let race = Race::from_stream(&mut stream).context("race")?;

        ensure!(race.is_complete());
        ensure!(race.packet_count() == 1 + 1 + 10);
        ensure!(race.laps_in_event() == 2);
        ensure!(race.event_time_remaining() == 91.0);

        let names: Vec<&str> = race.drivers().iter().map(|d| d.name.as_str()).collect();
        ensure!(names == ["Amy", "Driver 2", "Zed"]);

        let amy = race.driver(1).context("Amy")?;
        ensure!(amy.sector_times.len() == 5);
        ensure!(amy.lap_times() == [33.0]);
        ensure!(amy.race_time() == Some(33.0));
        ensure!(race.driver(0).is_some_and(|zed| zed.sector_times.is_empty()));
        Ok(())
    }

    #[test]
    fn reads_consecutive_races() -> anyhow::Result<()> {
        let mut packets = race_packets(&["Amy", "Bob"], 4);
        packets.push(telemetry_in(LifecycleState::Undefined, 0).into());
        packets.extend(race_packets(&["Cy"], 2));
        packets.pop();

        let mut stream = PacketStream::from_bytes(capture_of(&packets));
        let races = races_from_stream(&mut stream)?;

        ensure!(races.len() == 2, "found {} races", races.len());
        // Leaving Finished for Undefined closes the first race as incomplete.
        ensure!(!races[0].is_complete() && races[0].drivers().len() == 2);
        ensure!(races[1].is_complete() && races[1].drivers().len() == 1);
        ensure!(races[1].packet_count() == 1 + 1 + 2);
        Ok(())
    }

    #[test]
    fn race_replay_yields_its_packets() -> anyhow::Result<()> {
        let mut stream = PacketStream::from_packets(
            race_packets(&["Amy"], 2).into_iter().map(Arc::new).collect(),
        );
        let race = Race::from_stream(&mut stream).context("race")?;
        ensure!(race.replay().count() == race.packet_count());
        ensure!(race.replay().zip(race.packets()).all(|(a, b)| Arc::ptr_eq(&a, b)));
        Ok(())
    }

    #[test]
    fn capture_without_race_start_has_no_races() -> anyhow::Result<()> {
        let packets: Vec<Packet> = vec![
            telemetry_in(LifecycleState::Loading, 0).into(),
            telemetry_in(LifecycleState::Undefined, 0).into(),
        ];
        let races = races_from_stream(&mut PacketStream::from_bytes(capture_of(&packets)))?;
        ensure!(races.is_empty());
        Ok(())
    }

    #[test]
    fn framing_fault_aborts_reading() {
        let mut bytes = capture_of(&race_packets(&["Amy"], 2));
        bytes.extend_from_slice(&[0x05, 0x57, 0x01, 0x02]);

        let result = races_from_stream(&mut PacketStream::from_bytes(bytes));
        assert!(matches!(result, Err(TelemetryError::Framing { declared: 1367, remaining: 2, .. })));
    }

    #[test]
    fn read_races_from_file() -> anyhow::Result<()> {
        let path = crate::test_utils::temp_capture_path("read-races");
        std::fs::write(&path, capture_of(&race_packets(&["Amy", "Bob"], 3)))?;
        let races = read_races(&path);
        std::fs::remove_file(&path)?;

        let races = races?;
        ensure!(races.len() == 1);
        ensure!(races[0].drivers()[1].name == "Bob");
        Ok(())
    }
}
