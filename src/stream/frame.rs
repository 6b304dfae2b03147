//! Length-prefixed capture framing
//!
//! A capture file is a plain sequence of frames: a big-endian `u16` byte count
//! followed by exactly that many datagram bytes. The end of the file is the end
//! of the capture.

use std::io::{BufRead, ErrorKind, Read, Write};

use tracing::trace;

use crate::{Result, TelemetryError};

const LENGTH_PREFIX: usize = 2;

/// Reads frames from a buffered byte source.
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: R,
    offset: u64,
}

impl<R: BufRead> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, offset: 0 }
    }

    /// Bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Whether any bytes remain in the source.
    pub fn has_remaining(&mut self) -> Result<bool> {
        loop {
            match self.inner.fill_buf() {
                Ok(buf) => return Ok(!buf.is_empty()),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Read the next frame.
    ///
    /// Returns `Ok(None)` at a clean end of source. A frame cut short by the
    /// end of the source is a [`TelemetryError::Framing`] fault.
    pub fn read_frame(&mut self) -> Result<Option<Vec<u8>>> {
        let start = self.offset;

        let mut prefix = Vec::with_capacity(LENGTH_PREFIX);
        (&mut self.inner).take(LENGTH_PREFIX as u64).read_to_end(&mut prefix)?;
        self.offset += prefix.len() as u64;
        match prefix.len() {
            0 => return Ok(None),
            LENGTH_PREFIX => {}
            short => return Err(TelemetryError::framing_error(start, LENGTH_PREFIX, short)),
        }

        let declared = u16::from_be_bytes([prefix[0], prefix[1]]) as usize;
        let mut datagram = Vec::with_capacity(declared);
        (&mut self.inner).take(declared as u64).read_to_end(&mut datagram)?;
        self.offset += datagram.len() as u64;
        if datagram.len() < declared {
            return Err(TelemetryError::framing_error(start, declared, datagram.len()));
        }

        trace!("Read {}-byte frame at offset {}", declared, start);
        Ok(Some(datagram))
    }
}

/// Writes datagrams as frames.
#[derive(Debug)]
pub struct FrameWriter<W> {
    inner: W,
    bytes_written: u64,
    frames_written: u64,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, bytes_written: 0, frames_written: 0 }
    }

    /// Append one datagram. Datagrams longer than `u16::MAX` cannot be framed.
    pub fn write_frame(&mut self, datagram: &[u8]) -> Result<()> {
        let len = u16::try_from(datagram.len()).map_err(|_| {
            TelemetryError::framing_error(self.bytes_written, datagram.len(), u16::MAX as usize)
        })?;

        self.inner.write_all(&len.to_be_bytes())?;
        self.inner.write_all(datagram)?;
        self.bytes_written += (LENGTH_PREFIX + datagram.len()) as u64;
        self.frames_written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}
