//! Replay source for capture files

use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;

use tokio::time::{Duration, Interval, interval};
use tracing::{debug, info, trace};

use crate::config::Settings;
use crate::provider::DatagramSource;
use crate::stream::FrameReader;
use crate::{Result, TelemetryError};

/// Re-emits the datagrams of a framed capture at a steady rate.
pub struct ReplaySource {
    /// Framed capture reader
    reader: FrameReader<Box<dyn BufRead + Send>>,

    /// Datagrams per second
    rate_hz: f64,

    /// Datagram pacing interval
    interval: Interval,

    name: String,
    emitted: u64,
}

impl ReplaySource {
    /// Open a capture file for replay at `rate_hz` datagrams per second.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open<P: AsRef<Path>>(path: P, rate_hz: f64) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| TelemetryError::file_error(path.to_path_buf(), e))?;
        info!("Replaying {} at {}Hz", path.display(), rate_hz);
        Self::new(Box::new(BufReader::new(file)), rate_hz, path.display().to_string())
    }

    /// Replay the capture named in the settings at the configured rate.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let path = settings.source_telemetry().ok_or_else(|| {
            TelemetryError::config_error("source_telemetry", "no capture file configured")
        })?;
        Self::open(path, settings.replay_rate_hz())
    }

    /// Replay an in-memory capture.
    pub fn from_bytes(bytes: Vec<u8>, rate_hz: f64) -> Result<Self> {
        Self::new(Box::new(Cursor::new(bytes)), rate_hz, "memory".to_string())
    }

    fn new(reader: Box<dyn BufRead + Send>, rate_hz: f64, name: String) -> Result<Self> {
        Ok(Self {
            reader: FrameReader::new(reader),
            rate_hz,
            interval: interval(Self::period(rate_hz)?),
            name,
            emitted: 0,
        })
    }

    fn period(rate_hz: f64) -> Result<Duration> {
        if !(rate_hz.is_finite() && rate_hz > 0.0) {
            return Err(TelemetryError::config_error(
                "replay rate",
                format!("must be a positive rate, got {rate_hz}"),
            ));
        }
        Ok(Duration::from_secs_f64(1.0 / rate_hz))
    }

    /// Change the replay rate.
    pub fn set_rate(&mut self, rate_hz: f64) -> Result<()> {
        self.interval = interval(Self::period(rate_hz)?);
        self.rate_hz = rate_hz;
        debug!("Replay rate set to {}Hz", rate_hz);
        Ok(())
    }

    pub fn rate_hz(&self) -> f64 {
        self.rate_hz
    }

    /// Datagrams emitted so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

#[async_trait::async_trait]
impl DatagramSource for ReplaySource {
    async fn next_datagram(&mut self) -> Result<Option<Vec<u8>>> {
        let Some(datagram) = self.reader.read_frame()? else {
            debug!("Reached end of replay after {} datagrams", self.emitted);
            return Ok(None);
        };

        self.interval.tick().await;
        self.emitted += 1;
        trace!("Replayed datagram {}: {} bytes", self.emitted, datagram.len());
        Ok(Some(datagram))
    }

    fn source_name(&self) -> String {
        format!("replay:{}", self.name)
    }
}
