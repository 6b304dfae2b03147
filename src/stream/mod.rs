//! Pull-based packet streams over capture data.
//!
//! A [`PacketStream`] yields decoded packets in capture order. It has two
//! origins:
//!
//! - **Framed**: reads length-prefixed frames from any byte source and decodes
//!   them on demand. Nothing is retained unless the stream was built with
//!   [`PacketStream::recording`].
//! - **Buffered**: walks an in-memory packet sequence with its own cursor.
//!
//! [`PacketStream::replay`] turns whatever a stream has recorded into a fresh
//! buffered stream, so later passes never re-read or re-decode the origin.
//!
//! Packets that fail to decode are skipped (logged and counted); only a framing
//! fault stops a framed stream.
//!
//! ```rust
//! use paddock::stream::PacketStream;
//!
//! let mut stream = PacketStream::from_bytes(vec![0x00, 0x03, 1, 2, 3]);
//! assert!(stream.has_next());
//! assert!(stream.next_packet().is_none()); // 3 bytes is no known packet layout
//! assert!(!stream.has_next());
//! assert_eq!(stream.stats().unknown_length, 1);
//! ```

mod frame;

pub use frame::{FrameReader, FrameWriter};

use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::DecodeError;
use crate::protocol::{Packet, decode};
use crate::{Result, TelemetryError};

/// Counters describing what a stream has consumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct StreamStats {
    pub frames_read: u64,
    pub packets_decoded: u64,
    pub unknown_length: u64,
    pub type_mismatch: u64,
    pub truncated: u64,
}

impl StreamStats {
    pub fn decode_failures(&self) -> u64 {
        self.unknown_length + self.type_mismatch + self.truncated
    }

    fn record_failure(&mut self, error: &DecodeError) {
        match error {
            DecodeError::UnknownLength(_) => self.unknown_length += 1,
            DecodeError::TypeMismatch { .. } => self.type_mismatch += 1,
            DecodeError::Truncated { .. } => self.truncated += 1,
        }
    }
}

enum Origin {
    Framed { reader: FrameReader<Box<dyn BufRead + Send>>, produced: Option<Vec<Arc<Packet>>> },
    Buffered { packets: Arc<[Arc<Packet>]>, position: usize },
}

/// Ordered source of decoded packets.
pub struct PacketStream {
    origin: Origin,
    fault: Option<TelemetryError>,
    stats: StreamStats,
}

impl std::fmt::Debug for PacketStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let origin = match &self.origin {
            Origin::Framed { reader, produced } => match produced {
                Some(produced) => format!("framed@{} recorded {}", reader.offset(), produced.len()),
                None => format!("framed@{}", reader.offset()),
            },
            Origin::Buffered { packets, position } => {
                format!("buffered {}/{}", position, packets.len())
            }
        };
        f.debug_struct("PacketStream")
            .field("origin", &origin)
            .field("fault", &self.fault)
            .field("stats", &self.stats)
            .finish()
    }
}

impl PacketStream {
    /// Stream over framed capture bytes from any reader.
    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        Self::framed(Box::new(BufReader::new(reader)))
    }

    /// Stream over an in-memory framed capture.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::framed(Box::new(Cursor::new(bytes)))
    }

    /// Open a capture file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| TelemetryError::file_error(path.to_path_buf(), e))?;
        debug!("Opened capture {}", path.display());
        Ok(Self::from_reader(file))
    }

    /// Keep every decoded packet so [`replay`](Self::replay) can revisit it.
    ///
    /// Framed streams retain nothing by default; buffered streams already
    /// hold their packets and are unaffected.
    pub fn recording(mut self) -> Self {
        if let Origin::Framed { produced, .. } = &mut self.origin {
            produced.get_or_insert_with(Vec::new);
        }
        self
    }

    /// Stream over packets that are already decoded.
    pub fn from_packets(packets: Vec<Arc<Packet>>) -> Self {
        Self::from_shared(packets.into())
    }

    /// Stream over a shared packet sequence without copying it.
    pub fn from_shared(packets: Arc<[Arc<Packet>]>) -> Self {
        Self {
            origin: Origin::Buffered { packets, position: 0 },
            fault: None,
            stats: StreamStats::default(),
        }
    }

    fn framed(reader: Box<dyn BufRead + Send>) -> Self {
        Self {
            origin: Origin::Framed { reader: FrameReader::new(reader), produced: None },
            fault: None,
            stats: StreamStats::default(),
        }
    }

    /// Whether another frame is available.
    ///
    /// False once the source is exhausted or a framing fault has occurred.
    pub fn has_next(&mut self) -> bool {
        if self.fault.is_some() {
            return false;
        }
        match &mut self.origin {
            Origin::Buffered { packets, position } => *position < packets.len(),
            Origin::Framed { reader, .. } => match reader.has_remaining() {
                Ok(remaining) => remaining,
                Err(e) => {
                    warn!("Capture read failed at byte {}: {}", reader.offset(), e);
                    self.fault = Some(e);
                    false
                }
            },
        }
    }

    /// Pull the next packet.
    ///
    /// Returns `None` when the frame could not be decoded or the stream is
    /// exhausted; use [`has_next`](Self::has_next) to tell the two apart.
    pub fn next_packet(&mut self) -> Option<Arc<Packet>> {
        if self.fault.is_some() {
            return None;
        }
        match &mut self.origin {
            Origin::Buffered { packets, position } => {
                let packet = packets.get(*position).cloned()?;
                *position += 1;
                self.stats.frames_read += 1;
                self.stats.packets_decoded += 1;
                Some(packet)
            }
            Origin::Framed { reader, produced } => {
                let offset = reader.offset();
                let bytes = match reader.read_frame() {
                    Ok(Some(bytes)) => bytes,
                    Ok(None) => return None,
                    Err(e) => {
                        warn!("Stopping packet stream: {}", e);
                        self.fault = Some(e);
                        return None;
                    }
                };
                self.stats.frames_read += 1;

                match decode(&bytes) {
                    Ok(packet) => {
                        let packet = Arc::new(packet);
                        if let Some(produced) = produced {
                            produced.push(Arc::clone(&packet));
                        }
                        self.stats.packets_decoded += 1;
                        Some(packet)
                    }
                    Err(e) => {
                        debug!("Dropping frame at byte {}: {}", offset, e);
                        self.stats.record_failure(&e);
                        None
                    }
                }
            }
        }
    }

    /// Fresh, independent stream over the packets recorded so far.
    ///
    /// A buffered stream replays from its first packet. A framed stream that
    /// is not [`recording`](Self::recording) replays nothing.
    pub fn replay(&self) -> PacketStream {
        let packets: Arc<[Arc<Packet>]> = match &self.origin {
            Origin::Framed { produced, .. } => produced.as_deref().unwrap_or_default().into(),
            Origin::Buffered { packets, .. } => Arc::clone(packets),
        };
        PacketStream::from_shared(packets)
    }

    /// Take the framing fault that stopped this stream, if any.
    pub fn take_fault(&mut self) -> Option<TelemetryError> {
        self.fault.take()
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }
}

/// Decoded packets in order; undecodable frames are skipped.
impl Iterator for PacketStream {
    type Item = Arc<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.has_next() {
            if let Some(packet) = self.next_packet() {
                return Some(packet);
            }
        }
        None
    }
}
