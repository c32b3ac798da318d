//! Data Store.
//!
//! Payload buffer of every way: a line of words (linear mode) or a tile of
//! pixels stored row-major (tile mode). Offsets come from the address
//! resolver and are within `payload_len` by construction. Values are masked
//! to the configured word width on write.

/// Payload storage for all ways.
#[derive(Clone, Debug)]
pub struct DataStore {
    words: Vec<u32>,
    assoc: usize,
    payload_len: usize,
    mask: u32,
}

impl DataStore {
    /// Creates a zeroed store.
    pub fn new(num_sets: usize, ways: usize, payload_len: usize, mask: u32) -> Self {
        Self {
            words: vec![0; num_sets * ways * payload_len],
            assoc: ways,
            payload_len,
            mask,
        }
    }

    /// Words per line or pixels per tile.
    pub const fn payload_len(&self) -> usize {
        self.payload_len
    }

    #[inline(always)]
    const fn base(&self, set: usize, way: usize) -> usize {
        (set * self.assoc + way) * self.payload_len
    }

    /// Reads one word.
    #[inline]
    pub fn read(&self, set: usize, way: usize, offset: usize) -> u32 {
        self.words[self.base(set, way) + offset]
    }

    /// Writes one word, truncated to the word width. Returns the stored value.
    #[inline]
    pub fn write(&mut self, set: usize, way: usize, offset: usize, value: u32) -> u32 {
        let i = self.base(set, way) + offset;
        self.words[i] = value & self.mask;
        self.words[i]
    }

    /// Zeroes the payload of one way from `offset` to the end.
    pub fn clear_from(&mut self, set: usize, way: usize, offset: usize) {
        let base = self.base(set, way);
        let start = base + offset.min(self.payload_len);
        self.words[start..base + self.payload_len].fill(0);
    }

    /// Full payload of one way.
    pub fn line(&self, set: usize, way: usize) -> &[u32] {
        let base = self.base(set, way);
        &self.words[base..base + self.payload_len]
    }
}
