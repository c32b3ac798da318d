//! Set-Associative Cache Engine.
//!
//! This module implements the cache shared by the accelerator's linear,
//! texture, and GPU pixel caches. The instances differ only in addressing
//! and replacement policy; all three share tag/valid/dirty metadata per
//! way, a linear-scan hit detector, cold-fill-first victim selection, and a
//! cycle-stepped miss controller that writes back dirty victims and fills
//! lines by burst.
//!
//! Components, leaves first: [`resolver`], [`data`], [`tag_store`],
//! [`hit`], [`victim`], [`policies`], [`controller`], [`engine`].

/// Key to `(set, tag, offset)` resolution.
pub mod resolver;

/// Per-way payload buffers.
pub mod data;

/// Per-way tag, valid, and dirty bits.
pub mod tag_store;

/// Hit detection.
pub mod hit;

/// Victim selection.
pub mod victim;

/// Cache replacement policy implementations (ordered-list LRU, epoch stamps).
pub mod policies;

/// Miss-handling state machine.
pub mod controller;

/// Requester-facing façade.
pub mod engine;

pub use controller::{MissController, MissState, VictimContext, WritebackJob};
pub use engine::{CacheEngine, WayState};
pub use resolver::AddressResolver;
