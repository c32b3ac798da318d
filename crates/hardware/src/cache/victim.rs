//! Victim Selector.
//!
//! Picks the way a miss will fill: the first invalid way if the set has one,
//! otherwise the policy's least recently used way. Selection is a pure
//! function of the current metadata, so it can be recomputed at any point of
//! a miss sequence and agree.

use super::policies::ReplacementPolicy;
use super::tag_store::TagStore;

/// Chooses the way of `set` to fill next.
pub fn choose(tags: &TagStore, policy: &dyn ReplacementPolicy, set: usize) -> usize {
    tags.first_invalid(set)
        .unwrap_or_else(|| policy.get_victim(set))
}
