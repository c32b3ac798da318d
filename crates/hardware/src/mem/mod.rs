//! Memory collaborator interface.
//!
//! This module provides:
//! 1. **MemoryPort:** The contract a cache engine drives on a miss (burst reads,
//!    writebacks, and their acknowledgements).
//! 2. **BurstMemory:** A reference implementation with configurable latency and
//!    backpressure, used by the simulator driver and the tests.
//!
//! The engine assumes in-order, lossless delivery of beats; anything the
//! memory sends that the engine did not ask for is reported as a protocol
//! violation and dropped.

/// Reference burst memory.
pub mod burst;

pub use burst::{BurstMemory, MemoryEvent};

/// One beat of a burst response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Beat {
    /// Word or pixel payload.
    pub data: u32,
    /// Set on the final beat of a burst.
    pub last: bool,
}

/// Backing storage as seen by a cache engine.
///
/// The engine calls at most one of these per tick, except for the polls it
/// uses to detect unsolicited beats and acknowledgements.
pub trait MemoryPort: Send {
    /// Requests `len` consecutive words starting at byte address `base`.
    ///
    /// Fire-and-forget: beats arrive later through [`MemoryPort::poll_beat`].
    fn read_burst(&mut self, base: u64, len: usize);

    /// Takes the next beat if one is available this tick.
    fn poll_beat(&mut self) -> Option<Beat>;

    /// Offers a line for writing at byte address `addr`.
    ///
    /// Returns `false` if the memory cannot accept it this tick; the caller
    /// retries on a later tick.
    fn write(&mut self, addr: u64, data: &[u32]) -> bool;

    /// Takes the acknowledgement of an accepted write if one is available.
    fn poll_write_ack(&mut self) -> bool;
}
