//! Epoch-Stamp Replacement Policy.
//!
//! A single counter shared by all sets is incremented on every access and
//! the new value is stamped onto the accessed way. The victim is the way
//! with the numerically smallest stamp; never-touched ways carry stamp 0 and
//! ties resolve to the lowest way index.
//!
//! Cheaper than an ordered list in hardware (one comparator tree per set)
//! at the cost of a wide stamp register per way.

use super::ReplacementPolicy;

/// Epoch policy state.
#[derive(Debug, Clone)]
pub struct EpochPolicy {
    stamps: Vec<u64>,
    ways: usize,
    epoch: u64,
}

impl EpochPolicy {
    /// Creates a policy with every stamp at zero.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            stamps: vec![0; sets * ways],
            ways,
            epoch: 0,
        }
    }

    /// Current value of the global epoch counter.
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }
}

impl ReplacementPolicy for EpochPolicy {
    fn update(&mut self, set: usize, way: usize) {
        self.epoch += 1;
        self.stamps[set * self.ways + way] = self.epoch;
    }

    fn recency(&self, set: usize, way: usize) -> u64 {
        self.stamps[set * self.ways + way]
    }

    fn ways(&self) -> usize {
        self.ways
    }
}
