//! Address Resolver.
//!
//! Reduces a request key to the `(set, tag, offset)` triple used by every
//! other component, and maps a `(set, tag)` pair back to the memory address
//! of its line or tile.
//!
//! # Linear mode
//!
//! `tag | index | offset` bit slicing of the byte address. The offset is
//! reported in words.
//!
//! # Tile mode
//!
//! `tile = (x / tile_w, y / tile_h)` and
//! `offset = (y % tile_h) * tile_w + (x % tile_w)`. The tag packs
//! `{mip, tile_x, tile_y}` keeping only the low `mip_bits`, `tag_x_bits` and
//! `tag_y_bits` of each field, so distant tiles that agree in those bits
//! share a tag and alias one another. The set index XOR-folds the truncated
//! fields with the configured hash constant.

use crate::common::{CacheKey, ResolvedKey};
use crate::config::{Addressing, Geometry};

#[inline(always)]
const fn low_mask(bits: u32) -> u64 {
    if bits >= 64 { u64::MAX } else { (1 << bits) - 1 }
}

/// Key-to-coordinate mapping for one cache geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressResolver {
    /// Bit slicing of byte addresses.
    Linear {
        /// `log2(line_bytes)`.
        offset_bits: u32,
        /// `log2(word_bytes)`.
        word_shift: u32,
        /// `log2(num_sets)`.
        index_bits: u32,
        /// Mask of the configured address width.
        address_mask: u64,
    },
    /// Coordinate hashing of pixel positions.
    Tile {
        /// Tile width in pixels.
        tile_w: u32,
        /// Tile height in pixels.
        tile_h: u32,
        /// Tile-x bits kept in the tag.
        tag_x_bits: u32,
        /// Tile-y bits kept in the tag.
        tag_y_bits: u32,
        /// Mip bits kept in the tag.
        mip_bits: u32,
        /// `log2(num_sets)`.
        index_bits: u32,
        /// Constant folded into the set index.
        set_hash: u64,
        /// Size of a tile in memory.
        tile_bytes: u64,
    },
}

impl AddressResolver {
    /// Builds the resolver for a validated geometry.
    pub fn new(geometry: &Geometry) -> Self {
        match geometry.addressing {
            Addressing::Linear {
                line_bytes,
                address_bits,
            } => Self::Linear {
                offset_bits: line_bytes.trailing_zeros(),
                word_shift: geometry.word_bytes.trailing_zeros(),
                index_bits: geometry.index_bits,
                address_mask: low_mask(address_bits),
            },
            Addressing::Tile {
                tile_w,
                tile_h,
                tag_x_bits,
                tag_y_bits,
                mip_bits,
                set_hash,
            } => Self::Tile {
                tile_w,
                tile_h,
                tag_x_bits,
                tag_y_bits,
                mip_bits,
                index_bits: geometry.index_bits,
                set_hash,
                tile_bytes: geometry.line_bytes() as u64,
            },
        }
    }

    /// Returns `true` if `key` is of the kind this resolver understands.
    pub const fn accepts(&self, key: &CacheKey) -> bool {
        matches!(
            (self, key),
            (Self::Linear { .. }, CacheKey::Linear(_)) | (Self::Tile { .. }, CacheKey::Tile { .. })
        )
    }

    /// Resolves a key to its set, tag, and payload offset.
    ///
    /// Returns `None` only when the key kind does not match the addressing
    /// mode; every key of the right kind resolves.
    pub fn resolve(&self, key: &CacheKey) -> Option<ResolvedKey> {
        match (*self, *key) {
            (
                Self::Linear {
                    offset_bits,
                    word_shift,
                    index_bits,
                    address_mask,
                },
                CacheKey::Linear(addr),
            ) => {
                let addr = addr & address_mask;
                let offset = (addr & low_mask(offset_bits)) >> word_shift;
                let set = (addr >> offset_bits) & low_mask(index_bits);
                let tag = addr.checked_shr(offset_bits + index_bits).unwrap_or(0);
                Some(ResolvedKey {
                    set: set as usize,
                    tag,
                    offset: offset as usize,
                })
            }
            (
                Self::Tile {
                    tile_w,
                    tile_h,
                    tag_x_bits,
                    tag_y_bits,
                    mip_bits,
                    index_bits,
                    set_hash,
                    ..
                },
                CacheKey::Tile { x, y, mip },
            ) => {
                let tx = u64::from(x / tile_w) & low_mask(tag_x_bits);
                let ty = u64::from(y / tile_h) & low_mask(tag_y_bits);
                let m = u64::from(mip) & low_mask(mip_bits);
                let offset = (y % tile_h) as usize * tile_w as usize + (x % tile_w) as usize;

                let tag = (m.checked_shl(tag_x_bits + tag_y_bits).unwrap_or(0))
                    | (tx << tag_y_bits)
                    | ty;
                let set = xor_fold(tx ^ (ty << 1) ^ (m << 2) ^ set_hash, index_bits);
                Some(ResolvedKey { set, tag, offset })
            }
            _ => None,
        }
    }

    /// Memory address of the line or tile identified by `(set, tag)`.
    ///
    /// Used both as the burst base of a fetch and as the target of a
    /// writeback, so a line always returns to the address it came from.
    /// Tiles are stored contiguously, `tile_bytes` apart, in tag order.
    pub fn line_base(&self, set: usize, tag: u64) -> u64 {
        match *self {
            Self::Linear {
                offset_bits,
                index_bits,
                ..
            } => {
                let high = tag.checked_shl(offset_bits + index_bits).unwrap_or(0);
                high | ((set as u64) << offset_bits)
            }
            // `validate` keeps tag * tile_bytes within 64 bits.
            Self::Tile { tile_bytes, .. } => tag.checked_mul(tile_bytes).unwrap_or(u64::MAX),
        }
    }
}

/// XOR-folds `value` into `bits` bits.
fn xor_fold(mut value: u64, bits: u32) -> usize {
    if bits == 0 {
        return 0;
    }
    let mask = low_mask(bits);
    let mut folded = 0;
    while value != 0 {
        folded ^= value & mask;
        value = value.checked_shr(bits).unwrap_or(0);
    }
    folded as usize
}
