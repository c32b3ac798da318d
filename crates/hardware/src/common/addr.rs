//! Request keys and resolved cache coordinates.
//!
//! This module defines the two addressing vocabularies the caches accept. It provides the following:
//! 1. **Keys:** A byte address for the linear cache, or a pixel coordinate plus mip level for tile caches.
//! 2. **Resolution Result:** The `(set, tag, offset)` triple every key reduces to before a lookup.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A request key as issued by the requester.
///
/// Which variant is accepted depends on the cache's addressing mode; a
/// linear cache rejects tile keys at submission and vice versa.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheKey {
    /// Byte address into a flat address space.
    Linear(u64),
    /// Pixel coordinate in a tiled surface, with its mip level.
    Tile {
        /// Pixel column.
        x: u32,
        /// Pixel row.
        y: u32,
        /// Mip level; ignored when the cache has no mip tag field.
        mip: u8,
    },
}

impl CacheKey {
    /// Creates a linear key from a byte address.
    #[inline(always)]
    pub const fn linear(addr: u64) -> Self {
        Self::Linear(addr)
    }

    /// Creates a tile key at mip level 0.
    #[inline(always)]
    pub const fn pixel(x: u32, y: u32) -> Self {
        Self::Tile { x, y, mip: 0 }
    }

    /// Creates a tile key at the given mip level.
    #[inline(always)]
    pub const fn texel(x: u32, y: u32, mip: u8) -> Self {
        Self::Tile { x, y, mip }
    }

    /// Returns `true` for [`CacheKey::Linear`].
    pub const fn is_linear(&self) -> bool {
        matches!(self, Self::Linear(_))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear(addr) => write!(f, "{addr:#x}"),
            Self::Tile { x, y, mip } => write!(f, "({x},{y})@mip{mip}"),
        }
    }
}

/// A key reduced to cache coordinates.
///
/// `offset` is a word index within a line, or a pixel index within a tile
/// (`row * tile_w + col`); it is always below the configured payload length.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResolvedKey {
    /// Set probed for this key.
    pub set: usize,
    /// Tag compared against each way's stored tag.
    pub tag: u64,
    /// Word or pixel index inside the payload.
    pub offset: usize,
}

impl fmt::Display for ResolvedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "set={} tag={:#x} off={}", self.set, self.tag, self.offset)
    }
}
