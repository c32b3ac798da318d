//! Accelerator cache model.
//!
//! This crate implements a cycle-stepped simulation of the set-associative
//! cache engine used three times in the accelerator pipeline:
//! 1. **Linear cache:** Byte addresses sliced into tag, index, and offset.
//! 2. **Texture cache:** 2D pixel coordinates grouped into tiles, hashed to sets.
//! 3. **GPU pixel cache:** Tile cache with mip levels in the tag and epoch-stamp replacement.
//!
//! All share the same hit detection, victim selection, and miss state machine
//! (writeback, burst fetch, fill, respond). The memory behind the cache is an
//! external collaborator reached through [`mem::MemoryPort`].

/// Common types (keys, requests, responses, errors).
pub mod common;
/// Cache configuration (defaults, presets, validation).
pub mod config;
/// Cache engine (resolver, tag/data stores, policies, miss controller).
pub mod cache;
/// Memory collaborator interface and reference burst memory.
pub mod mem;
/// Simulation driver and request traces.
pub mod sim;
/// Cache statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Cache engine; construct with `CacheEngine::new`.
pub use crate::cache::CacheEngine;
/// Engine plus reference memory; construct with `Simulator::new`.
pub use crate::sim::Simulator;
