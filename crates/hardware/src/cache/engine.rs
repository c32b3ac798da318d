//! Cache Engine.
//!
//! Façade over the miss controller seen by the requester and the memory
//! collaborator:
//! 1. **Admission:** `submit` / `read` / `write` / `flush` capture one request at a
//!    time and return its id; a second submission while one is in flight is
//!    rejected, never merged.
//! 2. **Clocking:** `tick` advances the controller one step against a [`MemoryPort`].
//! 3. **Delivery:** Completed responses are polled with `take_response`.
//! 4. **Inspection:** Accessors expose tags, recency, payloads, and statistics
//!    so tests never reach into private state.

use std::collections::VecDeque;

use super::controller::{MissController, MissState};
use super::hit;
use crate::common::{
    CacheError, CacheKey, ConfigError, ProtocolViolation, Request, RequestId, ResolvedKey,
    Response, SubmitError,
};
use crate::config::{CacheConfig, Geometry};
use crate::mem::MemoryPort;
use crate::stats::CacheStats;

/// Snapshot of one way's metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WayState {
    /// Stored tag.
    pub tag: u64,
    /// Way holds a filled line.
    pub valid: bool,
    /// Line differs from memory.
    pub dirty: bool,
    /// Policy recency; larger is more recent.
    pub recency: u64,
}

/// One cache unit.
///
/// # Examples
///
/// ```
/// use accel_cache_core::cache::CacheEngine;
/// use accel_cache_core::common::{CacheKey, Request};
/// use accel_cache_core::config::{CacheConfig, MemoryConfig};
/// use accel_cache_core::mem::BurstMemory;
///
/// let mut engine = CacheEngine::new(&CacheConfig::set_assoc()).unwrap();
/// let mut memory = BurstMemory::new(&MemoryConfig::default(), 4);
/// memory.preload(0x100, &[42]);
///
/// let id = engine.submit(Request::read(CacheKey::linear(0x100))).unwrap();
/// let response = loop {
///     memory.tick();
///     engine.tick(&mut memory).unwrap();
///     if let Some(r) = engine.take_response() {
///         break r;
///     }
/// };
/// assert_eq!(response.id(), id);
/// assert_eq!(response.data(), Some(42));
/// assert!(!response.is_hit());
/// ```
#[derive(Debug)]
pub struct CacheEngine {
    controller: MissController,
    next_id: u64,
    responses: VecDeque<Response>,
}

impl CacheEngine {
    /// Builds an engine with every way invalid.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the configuration does not validate.
    pub fn new(config: &CacheConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            controller: MissController::new(config)?,
            next_id: 0,
            responses: VecDeque::new(),
        })
    }

    fn admit_check(&self) -> Result<RequestId, SubmitError> {
        if let Some(in_flight) = self.controller.in_flight() {
            return Err(SubmitError::Busy { in_flight });
        }
        Ok(RequestId(self.next_id))
    }

    /// Captures a request; it is checked on the next tick.
    ///
    /// # Errors
    ///
    /// [`SubmitError::Busy`] while another request is in flight, and
    /// [`SubmitError::KeyMismatch`] if the key kind does not match the
    /// addressing mode.
    pub fn submit(&mut self, request: Request) -> Result<RequestId, SubmitError> {
        if !self.controller.resolver().accepts(&request.key) {
            return Err(SubmitError::KeyMismatch {
                expected: self.controller.geometry().addressing.name(),
            });
        }
        let id = self.admit_check()?;
        self.next_id += 1;
        self.controller.admit(id, request);
        Ok(id)
    }

    /// Submits a read.
    ///
    /// # Errors
    ///
    /// As [`CacheEngine::submit`].
    pub fn read(&mut self, key: CacheKey) -> Result<RequestId, SubmitError> {
        self.submit(Request::read(key))
    }

    /// Submits a write.
    ///
    /// # Errors
    ///
    /// As [`CacheEngine::submit`].
    pub fn write(&mut self, key: CacheKey, data: u32) -> Result<RequestId, SubmitError> {
        self.submit(Request::write(key, data))
    }

    /// Starts writing back every dirty line. Lines stay resident and clean.
    ///
    /// # Errors
    ///
    /// [`SubmitError::Busy`] while another request is in flight.
    pub fn flush(&mut self) -> Result<RequestId, SubmitError> {
        let id = self.admit_check()?;
        self.next_id += 1;
        self.controller.admit_flush(id);
        Ok(id)
    }

    /// Advances the engine by one step.
    ///
    /// # Errors
    ///
    /// Returns a [`CacheError`] on a broken metadata invariant; the engine
    /// should be discarded.
    pub fn tick<M: MemoryPort + ?Sized>(&mut self, mem: &mut M) -> Result<(), CacheError> {
        if let Some(response) = self.controller.step(mem)? {
            self.responses.push_back(response);
        }
        Ok(())
    }

    /// Takes the oldest undelivered response.
    pub fn take_response(&mut self) -> Option<Response> {
        self.responses.pop_front()
    }

    /// Current controller state.
    pub const fn state(&self) -> MissState {
        self.controller.state()
    }

    /// Returns `true` while a request or flush is in flight.
    pub fn is_busy(&self) -> bool {
        self.controller.in_flight().is_some()
    }

    /// Id of the request in flight.
    pub fn in_flight(&self) -> Option<RequestId> {
        self.controller.in_flight()
    }

    /// Checked geometry.
    pub const fn geometry(&self) -> &Geometry {
        self.controller.geometry()
    }

    /// Resolves a key without touching any state.
    pub fn resolve(&self, key: CacheKey) -> Option<ResolvedKey> {
        self.controller.resolver().resolve(&key)
    }

    /// Way holding `key`, if resident. Does not update recency.
    ///
    /// Reports `None` for a set whose tags are duplicated; `tick` surfaces
    /// that as an error.
    pub fn probe(&self, key: CacheKey) -> Option<usize> {
        let resolved = self.resolve(key)?;
        hit::find(self.controller.tags(), resolved.set, resolved.tag)
            .ok()
            .flatten()
    }

    /// Metadata of one way.
    pub fn way_state(&self, set: usize, way: usize) -> WayState {
        let meta = self.controller.tags().way(set, way);
        WayState {
            tag: meta.tag,
            valid: meta.valid,
            dirty: meta.dirty,
            recency: self.controller.policy().recency(set, way),
        }
    }

    /// Payload of one way.
    pub fn line(&self, set: usize, way: usize) -> &[u32] {
        self.controller.data().line(set, way)
    }

    /// Number of valid ways.
    pub fn occupancy(&self) -> usize {
        self.controller.tags().occupancy()
    }

    /// Statistics.
    pub const fn stats(&self) -> &CacheStats {
        self.controller.stats()
    }

    /// Protocol violations seen so far.
    pub fn diagnostics(&self) -> &[ProtocolViolation] {
        self.controller.diagnostics()
    }

    /// Drains the protocol violation log.
    pub fn take_diagnostics(&mut self) -> Vec<ProtocolViolation> {
        self.controller.take_diagnostics()
    }

    /// Underlying controller.
    pub const fn controller(&self) -> &MissController {
        &self.controller
    }
}
