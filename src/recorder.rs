//! Recorder spawns and manages the capture task
//!
//! The task owns a [`DatagramSource`] and a [`FrameWriter`], appending every
//! datagram it receives as one frame. Progress is published on a `watch`
//! channel; a [`CancellationToken`] stops the task between or during reads.

use std::io::Write;
use std::time::Duration;

use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, trace, warn};

use crate::protocol::PacketKind;
use crate::provider::DatagramSource;
use crate::stream::FrameWriter;
use crate::{Result, TelemetryError};

const MAX_ERRORS: u32 = 10;
const DEFAULT_BACKOFF: Duration = Duration::from_millis(50);

/// Running totals of a capture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct CaptureStats {
    /// Datagrams written to the capture.
    pub datagrams: u64,
    /// Bytes written, including length prefixes.
    pub bytes: u64,
    pub telemetry: u64,
    pub participant: u64,
    pub additional_participant: u64,
    /// Written datagrams whose length matches no packet layout.
    pub unrecognised: u64,
    /// Datagrams too long to frame.
    pub oversized: u64,
    /// Source errors seen, including retried ones.
    pub source_errors: u64,
}

impl CaptureStats {
    fn count(&mut self, len: usize) {
        match PacketKind::from_length(len) {
            Some(PacketKind::Telemetry) => self.telemetry += 1,
            Some(PacketKind::Participant) => self.participant += 1,
            Some(PacketKind::AdditionalParticipant) => self.additional_participant += 1,
            None => self.unrecognised += 1,
        }
    }
}

/// Capture task configuration.
///
/// Frames are written from the async task itself, on whichever runtime worker
/// polls it. Give it an in-memory or buffered writer such as
/// `BufWriter<File>`; the writer is flushed when the task ends.
pub struct Recorder<S, W> {
    source: S,
    writer: W,
    backoff: Duration,
}

impl<S, W> Recorder<S, W>
where
    S: DatagramSource,
    W: Write + Send + 'static,
{
    pub fn new(source: S, writer: W) -> Self {
        Self { source, writer, backoff: DEFAULT_BACKOFF }
    }

    /// Base delay before retrying after a source error. Doubles with every
    /// consecutive error.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Spawn a capture task with default settings.
    pub fn spawn(source: S, writer: W) -> RecorderHandle<W> {
        Self::new(source, writer).start()
    }

    /// Spawn the capture task. Must be called from within a tokio runtime.
    pub fn start(self) -> RecorderHandle<W> {
        let (stats_tx, stats_rx) = watch::channel(CaptureStats::default());
        let cancel = CancellationToken::new();
        let cancel_task = cancel.clone();

        let Recorder { source, writer, backoff } = self;
        let writer = FrameWriter::new(writer);
        let task = tokio::spawn(async move {
            Self::capture_task(source, writer, backoff, stats_tx, cancel_task).await
        });

        let guard = cancel.clone().drop_guard();
        RecorderHandle { stats: stats_rx, cancel, task, _guard: guard }
    }

    async fn capture_task(
        mut source: S,
        mut writer: FrameWriter<W>,
        backoff: Duration,
        stats_tx: watch::Sender<CaptureStats>,
        cancel: CancellationToken,
    ) -> Result<(CaptureStats, W)> {
        let name = source.source_name();
        info!("Capture from {} started", name);
        let mut stats = CaptureStats::default();
        let mut error_count = 0u32;

        let outcome = loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Capture from {} cancelled", name);
                    break Ok(());
                }
                result = source.next_datagram() => result,
            };

            match result {
                Ok(Some(datagram)) => {
                    error_count = 0;
                    if datagram.len() > u16::MAX as usize {
                        warn!("Skipping {}-byte datagram: too long to frame", datagram.len());
                        stats.oversized += 1;
                        stats_tx.send_replace(stats);
                        continue;
                    }
                    if let Err(e) = writer.write_frame(&datagram) {
                        error!("Capture write failed: {}", e);
                        break Err(e);
                    }
                    stats.datagrams += 1;
                    stats.bytes = writer.bytes_written();
                    stats.count(datagram.len());
                    trace!("Captured datagram {}: {} bytes", stats.datagrams, datagram.len());
                    stats_tx.send_replace(stats);
                }
                Ok(None) => {
                    info!("{} ended after {} datagrams", name, stats.datagrams);
                    break Ok(());
                }
                Err(e) => {
                    error_count += 1;
                    stats.source_errors += 1;
                    stats_tx.send_replace(stats);
                    error!("Source error ({}/{}): {}", error_count, MAX_ERRORS, e);

                    if !e.is_retryable() || error_count >= MAX_ERRORS {
                        error!("Giving up on {}", name);
                        break Err(TelemetryError::Capture {
                            reason: format!("{name} failed after {error_count} consecutive errors"),
                            source: Some(Box::new(e)),
                        });
                    }

                    // 2x, 4x, 8x ... 32x the base delay
                    let delay = backoff * (1 << error_count.min(5));
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            info!("Capture from {} cancelled during backoff", name);
                            break Ok(());
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        };

        let writer = writer.into_inner();
        info!(
            "Capture from {} ended: {} datagrams, {} bytes",
            name, stats.datagrams, stats.bytes
        );
        outcome?;
        Ok((stats, writer?))
    }
}

/// Handle to a running capture task. Dropping it stops the task.
pub struct RecorderHandle<W> {
    stats: watch::Receiver<CaptureStats>,
    cancel: CancellationToken,
    task: JoinHandle<Result<(CaptureStats, W)>>,
    _guard: DropGuard,
}

impl<W> RecorderHandle<W> {
    /// Latest published totals.
    pub fn stats(&self) -> CaptureStats {
        *self.stats.borrow()
    }

    /// Receiver that sees every update of the totals.
    pub fn subscribe(&self) -> watch::Receiver<CaptureStats> {
        self.stats.clone()
    }

    /// Stream of totals, starting with the current value.
    pub fn progress(&self) -> impl Stream<Item = CaptureStats> + Send + Unpin + use<W> {
        WatchStream::new(self.stats.clone())
    }

    /// Ask the task to stop; [`finish`](Self::finish) then returns promptly.
    pub fn stop(&self) {
        debug!("Capture stop requested");
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the task to end and take back the writer.
    pub async fn finish(self) -> Result<(CaptureStats, W)> {
        let RecorderHandle { task, _guard, .. } = self;
        task.await
            .map_err(|e| TelemetryError::capture_failed(format!("capture task failed: {e}")))?
    }

    /// Like [`finish`](Self::finish), but stops the task and reports a
    /// timeout if it has not ended within `duration`.
    pub async fn finish_within(self, duration: Duration) -> Result<(CaptureStats, W)> {
        let cancel = self.cancel.clone();
        match tokio::time::timeout(duration, self.finish()).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Capture did not end within {:?}; stopping it", duration);
                cancel.cancel();
                Err(TelemetryError::Timeout { duration })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ReplaySource;
    use crate::race::LifecycleState;
    use crate::stream::PacketStream;
    use crate::test_utils::{capture_of, encode, race_packets, telemetry_in, temp_capture_path};
    use anyhow::{Result, ensure};
    use futures::StreamExt;
    use std::collections::VecDeque;

    /// Source that plays back a fixed script, then ends or hangs.
    struct ScriptedSource {
        script: VecDeque<crate::Result<Option<Vec<u8>>>>,
        hang_at_end: bool,
    }

    impl ScriptedSource {
        fn new(script: Vec<crate::Result<Option<Vec<u8>>>>) -> Self {
            Self { script: script.into(), hang_at_end: false }
        }

        fn hanging(mut self) -> Self {
            self.hang_at_end = true;
            self
        }
    }

    #[async_trait::async_trait]
    impl DatagramSource for ScriptedSource {
        async fn next_datagram(&mut self) -> crate::Result<Option<Vec<u8>>> {
            match self.script.pop_front() {
                Some(step) => step,
                None if self.hang_at_end => std::future::pending().await,
                None => Ok(None),
            }
        }

        fn source_name(&self) -> String {
            "scripted".to_string()
        }
    }

    fn flaky() -> crate::Result<Option<Vec<u8>>> {
        Err(TelemetryError::capture_failed("socket hiccup"))
    }

    #[tokio::test]
    async fn records_a_replayed_capture() -> Result<()> {
        let _ = tracing_subscriber::fmt::try_init();
        let packets = race_packets(&["Amy", "Bob"], 3);
        let source = ReplaySource::from_bytes(capture_of(&packets), 1000.0)?;

        let (stats, bytes) = Recorder::spawn(source, Vec::new()).finish().await?;

        ensure!(stats.datagrams == packets.len() as u64);
        ensure!(stats.telemetry == packets.len() as u64 - 1);
        ensure!(stats.participant == 1);
        ensure!(stats.bytes == bytes.len() as u64);
        ensure!(bytes == capture_of(&packets));

        let mut stream = PacketStream::from_bytes(bytes);
        ensure!(stream.by_ref().count() == packets.len());
        Ok(())
    }

    #[tokio::test]
    async fn records_into_a_buffered_file() -> Result<()> {
        let packets = race_packets(&["Amy"], 2);
        let source = ReplaySource::from_bytes(capture_of(&packets), 1000.0)?;
        let path = temp_capture_path("buffered-recorder");
        let file = std::io::BufWriter::new(std::fs::File::create(&path)?);

        let (stats, writer) = Recorder::spawn(source, file).finish().await?;
        ensure!(writer.buffer().is_empty());
        drop(writer);

        let written = std::fs::read(&path);
        std::fs::remove_file(&path)?;
        let written = written?;
        ensure!(stats.bytes == written.len() as u64);
        ensure!(written == capture_of(&packets));
        Ok(())
    }

    #[tokio::test]
    async fn oversized_and_unrecognised_datagrams() -> Result<()> {
        let telemetry = encode(&telemetry_in(LifecycleState::Racing, 1).into());
        let source = ScriptedSource::new(vec![
            Ok(Some(vec![0; 70_000])),
            Ok(Some(vec![1, 2, 3])),
            Ok(Some(telemetry.clone())),
        ]);

        let (stats, bytes) = Recorder::spawn(source, Vec::new()).finish().await?;
        ensure!(stats.oversized == 1);
        ensure!(stats.unrecognised == 1);
        ensure!(stats.telemetry == 1);
        ensure!(stats.datagrams == 2);
        ensure!(bytes.len() == 2 + 3 + 2 + telemetry.len());
        Ok(())
    }

    #[tokio::test]
    async fn transient_errors_are_retried() -> Result<()> {
        let _ = tracing_subscriber::fmt::try_init();
        let source = ScriptedSource::new(vec![
            flaky(),
            Ok(Some(vec![9])),
            flaky(),
            flaky(),
            Ok(Some(vec![8])),
        ]);

        let (stats, bytes) = Recorder::new(source, Vec::new())
            .with_backoff(Duration::from_millis(1))
            .start()
            .finish()
            .await?;
        ensure!(stats.source_errors == 3);
        ensure!(stats.datagrams == 2);
        ensure!(bytes == [0, 1, 9, 0, 1, 8]);
        Ok(())
    }

    #[tokio::test]
    async fn gives_up_after_repeated_errors() {
        let source = ScriptedSource::new((0..MAX_ERRORS).map(|_| flaky()).collect());
        let result = Recorder::new(source, Vec::new())
            .with_backoff(Duration::from_millis(1))
            .start()
            .finish()
            .await;
        assert!(matches!(result, Err(TelemetryError::Capture { .. })));
    }

    #[tokio::test]
    async fn unretryable_errors_stop_at_once() {
        let source = ScriptedSource::new(vec![
            Err(TelemetryError::framing_error(0, 10, 2)),
            Ok(Some(vec![1])),
        ]);
        let handle = Recorder::spawn(source, Vec::new());
        let result = handle.finish().await;
        assert!(matches!(result, Err(TelemetryError::Capture { .. })));
    }

    #[tokio::test]
    async fn stop_ends_a_waiting_capture() -> Result<()> {
        let source = ScriptedSource::new(vec![Ok(Some(vec![1, 2]))]).hanging();
        let handle = Recorder::spawn(source, Vec::new());

        let mut updates = handle.subscribe();
        updates.wait_for(|stats| stats.datagrams == 1).await?;
        ensure!(!handle.is_finished());

        handle.stop();
        let (stats, bytes) = handle.finish().await?;
        ensure!(stats.datagrams == 1);
        ensure!(bytes == [0, 2, 1, 2]);
        Ok(())
    }

    #[tokio::test]
    async fn progress_reports_running_totals() -> Result<()> {
        let source = ScriptedSource::new(vec![Ok(Some(vec![1])), Ok(Some(vec![2]))]).hanging();
        let handle = Recorder::spawn(source, Vec::new());

        let mut progress = handle.progress();
        let mut last = CaptureStats::default();
        while last.datagrams < 2 {
            match progress.next().await {
                Some(stats) => last = stats,
                None => break,
            }
        }
        ensure!(last.datagrams == 2 && last.bytes == 6);
        ensure!(handle.stats() == last);
        Ok(())
    }

    #[tokio::test]
    async fn finish_within_times_out_on_a_silent_source() {
        let source = ScriptedSource::new(Vec::new()).hanging();
        let handle = Recorder::spawn(source, Vec::new());
        let result = handle.finish_within(Duration::from_millis(20)).await;
        assert!(matches!(result, Err(TelemetryError::Timeout { .. })));
    }
}
