//! Least Recently Used (LRU) Replacement Policy.
//!
//! This policy evicts the way that has not been accessed for the longest time.
//! It maintains a usage stack for each set. When a way is hit or filled, it is
//! moved to the top (Most Recently Used position). The bottom of the stack
//! represents the Least Recently Used way.
//!
//! # Performance
//!
//! - **Time Complexity:**
//!   - `update()`: O(W) where W is the number of ways (associativity)
//!   - `get_victim()`: O(1)
//! - **Space Complexity:** O(S × W) where S is the number of sets

use super::ReplacementPolicy;

/// LRU Policy state.
#[derive(Debug, Clone)]
pub struct LruPolicy {
    /// A vector of usage stacks (one per set).
    /// Index 0 is MRU, last index is LRU.
    usage: Vec<Vec<usize>>,
    ways: usize,
}

impl LruPolicy {
    /// Creates a new LRU policy instance.
    ///
    /// # Arguments
    ///
    /// * `sets` - The number of sets in the cache.
    /// * `ways` - The associativity (number of ways) of the cache.
    pub fn new(sets: usize, ways: usize) -> Self {
        let usage = (0..sets).map(|_| (0..ways).collect::<Vec<_>>()).collect();
        Self { usage, ways }
    }

    /// Usage stack of `set`, most recent first.
    pub fn order(&self, set: usize) -> &[usize] {
        &self.usage[set]
    }
}

impl ReplacementPolicy for LruPolicy {
    /// Moves `way` to the front of the usage stack, shifting the others down.
    fn update(&mut self, set: usize, way: usize) {
        let stack = &mut self.usage[set];
        if let Some(pos) = stack.iter().position(|&x| x == way) {
            let _ = stack.remove(pos);
        }
        stack.insert(0, way);
    }

    /// `ways` for the MRU way down to `1` for the LRU way.
    fn recency(&self, set: usize, way: usize) -> u64 {
        self.usage[set]
            .iter()
            .position(|&x| x == way)
            .map_or(0, |pos| (self.ways - pos) as u64)
    }

    fn ways(&self) -> usize {
        self.ways
    }

    /// Returns the way at the bottom of the usage stack.
    fn get_victim(&self, set: usize) -> usize {
        self.usage[set].last().copied().unwrap_or(0)
    }
}
