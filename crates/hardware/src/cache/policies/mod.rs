//! Cache Replacement Policies.
//!
//! Implements the two recency encodings used by the hardware caches.
//!
//! # Policies
//!
//! - `Lru`: Per-set ordered list of ways (true LRU).
//! - `Epoch`: Global monotonically increasing stamp per access (approximate LRU).
//!
//! Both are consulted only once a set is full; cold-fill preference for
//! invalid ways lives in the victim selector.

use std::fmt;

use crate::config::ReplacementPolicy as PolicyType;

/// Epoch-stamp replacement policy.
pub mod epoch;

/// Least Recently Used replacement policy.
pub mod lru;

pub use epoch::EpochPolicy;
pub use lru::LruPolicy;

/// Trait for cache replacement policies.
///
/// Defines the interface for recording accesses and selecting victim ways.
pub trait ReplacementPolicy: Send + Sync + fmt::Debug {
    /// Records an access (hit or fill) to `way` of `set`.
    ///
    /// # Arguments
    ///
    /// * `set` - The cache set index.
    /// * `way` - The way index within the set that was accessed.
    fn update(&mut self, set: usize, way: usize);

    /// Recency of a way; larger is more recent.
    fn recency(&self, set: usize, way: usize) -> u64;

    /// Associativity the policy was built for.
    fn ways(&self) -> usize;

    /// Selects the least recently used way of `set`.
    ///
    /// The default scans for the smallest recency, ties going to the lowest
    /// way index. Pure: repeated calls without an `update` agree.
    fn get_victim(&self, set: usize) -> usize {
        (0..self.ways())
            .min_by_key(|&way| (self.recency(set, way), way))
            .unwrap_or(0)
    }
}

/// Builds the configured policy.
pub fn build(kind: PolicyType, sets: usize, ways: usize) -> Box<dyn ReplacementPolicy> {
    match kind {
        PolicyType::Lru => Box::new(LruPolicy::new(sets, ways)),
        PolicyType::Epoch => Box::new(EpochPolicy::new(sets, ways)),
    }
}
