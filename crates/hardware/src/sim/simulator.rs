//! Simulator: owns a cache engine and its backing memory side-by-side.
//!
//! Each tick advances the memory clock first, then the engine, so a beat
//! scheduled for tick `n` is visible to the engine on tick `n`.

use thiserror::Error;
use tracing::info;

use super::trace::{TraceAction, TraceEntry, TraceError};
use crate::cache::CacheEngine;
use crate::common::{CacheError, ConfigError, Request, RequestId, Response, SubmitError};
use crate::config::Config;
use crate::mem::BurstMemory;

/// Ticks a single request may take before the driver gives up.
const DEFAULT_TICK_BUDGET: u64 = 10_000;

/// Failure while driving the engine.
#[derive(Debug, Error)]
pub enum SimError {
    /// The engine rejected a request.
    #[error(transparent)]
    Submit(#[from] SubmitError),

    /// The engine hit a fatal error.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A trace entry was malformed.
    #[error(transparent)]
    Trace(#[from] TraceError),

    /// A request did not complete within the tick budget.
    #[error("request {id} did not complete within {ticks} ticks")]
    Timeout {
        /// Request that stalled.
        id: RequestId,
        /// Budget that was exhausted.
        ticks: u64,
    },
}

/// Top-level simulator: one cache engine and one burst memory.
#[derive(Debug)]
pub struct Simulator {
    /// Cache under test.
    pub engine: CacheEngine,
    /// Backing memory.
    pub memory: BurstMemory,
    tick_budget: u64,
}

impl Simulator {
    /// Creates a simulator from a root configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the cache configuration does not validate.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let engine = CacheEngine::new(&config.cache)?;
        let memory = BurstMemory::new(&config.memory, engine.geometry().word_bytes);
        Ok(Self {
            engine,
            memory,
            tick_budget: DEFAULT_TICK_BUDGET,
        })
    }

    /// Overrides the per-request tick budget.
    #[must_use]
    pub fn with_tick_budget(mut self, ticks: u64) -> Self {
        self.tick_budget = ticks;
        self
    }

    /// Advances memory and engine by one tick.
    ///
    /// # Errors
    ///
    /// Propagates a fatal [`CacheError`] from the engine.
    pub fn tick(&mut self) -> Result<(), CacheError> {
        self.memory.tick();
        self.engine.tick(&mut self.memory)
    }

    /// Submits a request and ticks until its response arrives.
    ///
    /// # Errors
    ///
    /// [`SimError::Submit`] if the engine is busy or the key kind is wrong,
    /// [`SimError::Timeout`] if the budget runs out.
    pub fn run_request(&mut self, request: Request) -> Result<Response, SimError> {
        let id = self.engine.submit(request)?;
        self.wait_for(id)
    }

    /// Flushes the cache and ticks until it completes.
    ///
    /// # Errors
    ///
    /// As [`Simulator::run_request`].
    pub fn run_flush(&mut self) -> Result<Response, SimError> {
        let id = self.engine.flush()?;
        self.wait_for(id)
    }

    fn wait_for(&mut self, id: RequestId) -> Result<Response, SimError> {
        for _ in 0..self.tick_budget {
            self.tick()?;
            while let Some(response) = self.engine.take_response() {
                if response.id() == id {
                    return Ok(response);
                }
            }
        }
        Err(SimError::Timeout {
            id,
            ticks: self.tick_budget,
        })
    }

    /// Replays a trace, one request at a time.
    ///
    /// # Errors
    ///
    /// Stops at the first failing entry.
    pub fn run_trace(&mut self, trace: &[TraceEntry]) -> Result<Vec<Response>, SimError> {
        info!(entries = trace.len(), "replaying trace");
        let mut responses = Vec::with_capacity(trace.len());
        for entry in trace {
            let response = match entry.action()? {
                TraceAction::Access(request) => self.run_request(request)?,
                TraceAction::Flush => self.run_flush()?,
            };
            responses.push(response);
        }
        let stats = self.engine.stats();
        info!(
            ticks = stats.ticks,
            hits = stats.hits(),
            misses = stats.misses(),
            writebacks = stats.writebacks,
            "trace complete"
        );
        Ok(responses)
    }
}
