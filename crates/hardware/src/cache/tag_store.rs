//! Tag Store.
//!
//! Per-set array of way metadata: tag, valid, and dirty bits. Recency is
//! kept by the replacement policy, not here.
//!
//! Invariants maintained by the mutators:
//! - an invalid way is never dirty;
//! - only [`TagStore::commit`] makes a way valid, and the miss controller
//!   only commits a tag that missed in that set, so no set holds a tag twice.

/// Metadata of one way.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WayMeta {
    /// Stored tag; meaningless while invalid.
    pub tag: u64,
    /// Way holds a filled line.
    pub valid: bool,
    /// Line was written since it was filled.
    pub dirty: bool,
}

/// Tag, valid, and dirty bits for every way of every set.
#[derive(Clone, Debug)]
pub struct TagStore {
    ways: Vec<WayMeta>,
    num_sets: usize,
    assoc: usize,
}

impl TagStore {
    /// Creates a store with every way invalid.
    pub fn new(num_sets: usize, ways: usize) -> Self {
        Self {
            ways: vec![WayMeta::default(); num_sets * ways],
            num_sets,
            assoc: ways,
        }
    }

    /// Number of sets.
    pub const fn num_sets(&self) -> usize {
        self.num_sets
    }

    /// Ways per set.
    pub const fn ways(&self) -> usize {
        self.assoc
    }

    #[inline(always)]
    const fn idx(&self, set: usize, way: usize) -> usize {
        set * self.assoc + way
    }

    /// Returns the metadata of all ways of `set`, in way order.
    pub fn set(&self, set: usize) -> &[WayMeta] {
        let base = self.idx(set, 0);
        &self.ways[base..base + self.assoc]
    }

    /// Returns the metadata of one way.
    pub fn way(&self, set: usize, way: usize) -> WayMeta {
        self.ways[self.idx(set, way)]
    }

    /// Index of the first invalid way of `set`, if any.
    pub fn first_invalid(&self, set: usize) -> Option<usize> {
        self.set(set).iter().position(|w| !w.valid)
    }

    /// Installs `tag` as a clean, valid line.
    pub fn commit(&mut self, set: usize, way: usize, tag: u64) {
        let i = self.idx(set, way);
        self.ways[i] = WayMeta {
            tag,
            valid: true,
            dirty: false,
        };
    }

    /// Invalidates a way, returning its previous metadata.
    pub fn invalidate(&mut self, set: usize, way: usize) -> WayMeta {
        let i = self.idx(set, way);
        std::mem::take(&mut self.ways[i])
    }

    /// Marks a valid way dirty. No effect on invalid ways.
    pub fn mark_dirty(&mut self, set: usize, way: usize) {
        let i = self.idx(set, way);
        let meta = &mut self.ways[i];
        meta.dirty = meta.valid;
    }

    /// Clears the dirty bit of a way.
    pub fn clean(&mut self, set: usize, way: usize) {
        let i = self.idx(set, way);
        self.ways[i].dirty = false;
    }

    /// First valid dirty way at or after `(set, way)` in set-major order.
    pub fn next_dirty(&self, set: usize, way: usize) -> Option<(usize, usize)> {
        let start = self.idx(set, way);
        self.ways
            .iter()
            .skip(start)
            .position(|w| w.valid && w.dirty)
            .map(|off| {
                let i = start + off;
                (i / self.assoc, i % self.assoc)
            })
    }

    /// Number of valid ways across the whole cache.
    pub fn occupancy(&self) -> usize {
        self.ways.iter().filter(|w| w.valid).count()
    }
}
