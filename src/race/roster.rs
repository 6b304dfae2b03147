//! Establishing who drove in a race

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::timing::SectorTime;
use crate::protocol::Packet;

/// One participant of a race.
///
/// The index is the participant slot the driver occupies in every telemetry
/// tick of the race and never changes once assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct Driver {
    pub index: usize,
    pub name: String,
    pub sector_times: Vec<SectorTime>,
}

impl Driver {
    pub fn new(index: usize, name: impl Into<String>) -> Self {
        Self { index, name: name.into(), sector_times: Vec::new() }
    }

    /// Placeholder for a participant whose name never arrived.
    pub fn placeholder(index: usize) -> Self {
        Self::new(index, format!("Driver {index}"))
    }
}

/// Longest common prefix of two names, compared by character.
fn common_prefix(a: &str, b: &str) -> String {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).map(|(x, _)| x).collect()
}

fn record_name(names: &mut BTreeMap<usize, String>, index: usize, name: &str) {
    if names.iter().any(|(other, known)| *other != index && known == name) {
        return;
    }
    match names.get_mut(&index) {
        Some(known) if known != name => {
            let prefix = common_prefix(known, name);
            if !prefix.is_empty() {
                debug!("Reconciled driver {} name {:?} and {:?} to {:?}", index, known, name, prefix);
                *known = prefix;
            }
        }
        Some(_) => {}
        None => {
            names.insert(index, name.to_string());
        }
    }
}

/// Build the driver roster of a race from its packets.
///
/// The first telemetry tick fixes the expected number of participants. Names
/// are then collected from identity packets until the roster is full or the
/// reported participant count changes. Participants still unnamed at that point
/// get a placeholder name. Drivers are returned ordered by name.
pub fn build_roster<I>(packets: I) -> Vec<Driver>
where
    I: IntoIterator<Item = Arc<Packet>>,
{
    let mut packets = packets.into_iter();

    let Some(expected) =
        packets.by_ref().find_map(|packet| packet.as_telemetry().map(|t| t.num_participants))
    else {
        debug!("No telemetry in race; roster is empty");
        return Vec::new();
    };
    let size = expected.max(0) as usize;

    let mut names = BTreeMap::new();
    let mut reported = expected;
    while reported == expected && names.len() < size {
        let Some(packet) = packets.next() else { break };
        if let Some(telemetry) = packet.as_telemetry() {
            reported = telemetry.num_participants;
        } else if let Some((offset, slots)) = packet.names() {
            let present = slots.iter().filter(|name| !name.is_empty());
            for (index, name) in (offset..).zip(present) {
                if index < size {
                    record_name(&mut names, index, name);
                }
            }
        }
    }

    if reported != expected {
        debug!("Participant count changed from {} to {} while naming", expected, reported);
    }

    let missing = size - names.len();
    if missing > 0 {
        warn!("{} of {} drivers unnamed; using placeholders", missing, size);
    }

    let mut drivers: Vec<Driver> = (0..size)
        .map(|index| match names.remove(&index) {
            Some(name) => Driver::new(index, name),
            None => Driver::placeholder(index),
        })
        .collect();
    drivers.sort_by(|a, b| a.name.cmp(&b.name).then(a.index.cmp(&b.index)));
    drivers
}
