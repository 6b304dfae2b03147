//! Datagram source trait for capture

use crate::Result;

/// Trait for raw telemetry datagram sources
///
/// Sources abstract over where datagrams come from (the game's UDP broadcast,
/// a capture being replayed) and handle their own timing internally.
#[async_trait::async_trait]
pub trait DatagramSource: Send + 'static {
    /// Get the next datagram
    ///
    /// Returns:
    /// - `Ok(Some(bytes))` - Datagram received
    /// - `Ok(None)` - Source ended (normal termination)
    /// - `Err(e)` - Error occurred; the caller decides whether to retry
    async fn next_datagram(&mut self) -> Result<Option<Vec<u8>>>;

    /// Human-readable name for logging
    fn source_name(&self) -> String;
}
