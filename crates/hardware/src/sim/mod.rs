//! Simulation driver and request traces.
//!
//! Pairs a cache engine with the reference burst memory and replays
//! request traces against it.

/// Engine + memory driver.
pub mod simulator;

/// JSON Lines request traces.
pub mod trace;

pub use simulator::{SimError, Simulator};
pub use trace::{TraceAction, TraceEntry, TraceError, TraceOp};
