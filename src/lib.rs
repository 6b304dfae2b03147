//! Project CARS UDP telemetry decoding and race reconstruction.
//!
//! Paddock turns a recorded stream of Project CARS broadcast datagrams into
//! structured race results: who drove, every sector they completed, and the
//! laps and bests derived from them.
//!
//! # Features
//!
//! - **Decoding**: bounds-checked parsing of the three broadcast packet layouts
//! - **Race segmentation**: lifecycle tracking that cuts races out of a
//!   continuous capture
//! - **Rosters and timing**: driver names reconciled from identity packets,
//!   sector histories folded into laps
//! - **Capture**: async recording of the live UDP broadcast to a framed file
//!
//! # Quick Start
//!
//! ## Example (reading races from a capture)
//!
//! ```rust,no_run
//! use paddock::read_races;
//!
//! fn main() -> paddock::Result<()> {
//!     for race in read_races("/path/to/session.capture")? {
//!         println!("{} drivers, complete: {}", race.drivers().len(), race.is_complete());
//!         for driver in race.drivers() {
//!             println!("  {}: {:?}", driver.name, driver.best_lap());
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Example (capturing the broadcast)
//!
//! ```rust,no_run
//! use paddock::providers::UdpSource;
//! use paddock::recorder::Recorder;
//!
//! #[tokio::main]
//! async fn main() -> paddock::Result<()> {
//!     let source = UdpSource::bind_default().await?;
//!     let file = std::fs::File::create("session.capture")?;
//!     let handle = Recorder::spawn(source, std::io::BufWriter::new(file));
//!
//!     tokio::time::sleep(std::time::Duration::from_secs(60)).await;
//!     handle.stop();
//!     let (stats, _) = handle.finish().await?;
//!     println!("captured {} datagrams", stats.datagrams);
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Wire format and streams
pub mod protocol;
pub mod stream;

// Race reconstruction
pub mod config;
pub mod race;

// Capture
pub mod provider;
pub mod providers;
pub mod recorder;

// Core exports
pub use error::*;

pub use config::{ParticipantConfig, Settings};
pub use protocol::{Packet, PacketKind, decode};
pub use provider::DatagramSource;
pub use race::{Driver, Race, RaceIndex, RaceSummary, races_from_stream, read_races};
pub use recorder::{CaptureStats, Recorder, RecorderHandle};
pub use stream::PacketStream;
