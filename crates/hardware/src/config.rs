//! Configuration system for the cache model.
//!
//! This module defines all configuration structures and enums used to parameterize
//! a cache engine and its reference memory. It provides:
//! 1. **Defaults:** Baseline geometry and memory timing constants.
//! 2. **Structures:** Cache geometry, addressing mode, and memory timing.
//! 3. **Presets:** The three hardware instances (linear set-associative, texture, GPU pixel).
//! 4. **Validation:** Reduction of a `CacheConfig` to a checked [`Geometry`].
//!
//! Configuration is supplied as JSON (`Config::from_json` / `Config::from_file`) or built
//! from `Config::default()` and the presets.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::ConfigError;

/// Default configuration constants.
///
/// These values define the baseline hardware configuration when not
/// explicitly overridden in the JSON configuration.
mod defaults {
    /// Default number of sets.
    pub const NUM_SETS: usize = 64;

    /// Default associativity.
    pub const WAYS: usize = 4;

    /// Default word / pixel width in bits.
    pub const WORD_BITS: u32 = 32;

    /// Default line size in bytes for the linear cache.
    ///
    /// One burst of sixteen 32-bit beats.
    pub const LINE_BYTES: usize = 64;

    /// Default width of linear addresses.
    pub const ADDRESS_BITS: u32 = 32;

    /// Default tile width in pixels.
    pub const TILE_W: u32 = 8;

    /// Default tile height in pixels.
    pub const TILE_H: u32 = 8;

    /// Default number of tile-x bits kept in the tag.
    pub const TAG_X_BITS: u32 = 8;

    /// Default number of tile-y bits kept in the tag.
    pub const TAG_Y_BITS: u32 = 8;

    /// Default number of mip bits kept in the tag.
    pub const MIP_BITS: u32 = 4;

    /// Constant folded into the tile set hash.
    pub const SET_HASH: u64 = 0x5A;

    /// Ticks from burst request to first beat.
    pub const READ_LATENCY: u64 = 8;

    /// Ticks between consecutive beats of a burst.
    pub const BEAT_INTERVAL: u64 = 1;

    /// Ticks from accepted write to acknowledgement.
    pub const WRITE_LATENCY: u64 = 4;
}

/// Replacement policy variants.
///
/// Both variants pick the least recently used way once a set is full; they
/// differ only in how recency is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplacementPolicy {
    /// Per-set ordered list of ways, accessed way moved to the front.
    #[default]
    #[serde(alias = "Lru")]
    Lru,
    /// Global monotonically increasing epoch stamped on each access.
    ///
    /// Victim is the way with the smallest stamp, ties to the lowest way.
    #[serde(alias = "Epoch")]
    Epoch,
}

/// How request keys map onto sets, tags, and payload offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode")]
pub enum Addressing {
    /// Byte addresses sliced into `tag | index | offset`.
    Linear {
        /// Line size in bytes (power of two).
        #[serde(default = "Addressing::default_line_bytes")]
        line_bytes: usize,
        /// Width of the address space; higher bits are ignored.
        #[serde(default = "Addressing::default_address_bits")]
        address_bits: u32,
    },
    /// Pixel coordinates grouped into `tile_w × tile_h` tiles.
    ///
    /// Only the low `tag_x_bits` / `tag_y_bits` of the tile coordinates and the
    /// low `mip_bits` of the mip level are kept. Tiles whose coordinates agree in
    /// those bits alias to the same tag.
    Tile {
        /// Tile width in pixels.
        #[serde(default = "Addressing::default_tile_w")]
        tile_w: u32,
        /// Tile height in pixels.
        #[serde(default = "Addressing::default_tile_h")]
        tile_h: u32,
        /// Tile-x bits kept in the tag.
        #[serde(default = "Addressing::default_tag_x_bits")]
        tag_x_bits: u32,
        /// Tile-y bits kept in the tag.
        #[serde(default = "Addressing::default_tag_y_bits")]
        tag_y_bits: u32,
        /// Mip bits kept in the tag; zero for caches without mip levels.
        #[serde(default)]
        mip_bits: u32,
        /// Constant XORed into the set hash.
        #[serde(default = "Addressing::default_set_hash")]
        set_hash: u64,
    },
}

impl Addressing {
    fn default_line_bytes() -> usize {
        defaults::LINE_BYTES
    }

    fn default_address_bits() -> u32 {
        defaults::ADDRESS_BITS
    }

    fn default_tile_w() -> u32 {
        defaults::TILE_W
    }

    fn default_tile_h() -> u32 {
        defaults::TILE_H
    }

    fn default_tag_x_bits() -> u32 {
        defaults::TAG_X_BITS
    }

    fn default_tag_y_bits() -> u32 {
        defaults::TAG_Y_BITS
    }

    fn default_set_hash() -> u64 {
        defaults::SET_HASH
    }

    /// Returns `"linear"` or `"tile"`.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Linear { .. } => "linear",
            Self::Tile { .. } => "tile",
        }
    }
}

impl Default for Addressing {
    fn default() -> Self {
        Self::Linear {
            line_bytes: defaults::LINE_BYTES,
            address_bits: defaults::ADDRESS_BITS,
        }
    }
}

/// Configuration for one cache engine.
///
/// # Examples
///
/// ```
/// use accel_cache_core::config::{Addressing, CacheConfig, ReplacementPolicy};
///
/// let json = r#"{
///     "num_sets": 16,
///     "ways": 2,
///     "policy": "EPOCH",
///     "addressing": { "mode": "Tile", "tile_w": 4, "tile_h": 4, "mip_bits": 3 }
/// }"#;
///
/// let config: CacheConfig = serde_json::from_str(json).unwrap();
/// assert_eq!(config.policy, ReplacementPolicy::Epoch);
/// assert!(matches!(config.addressing, Addressing::Tile { tile_w: 4, mip_bits: 3, .. }));
/// assert_eq!(config.validate().unwrap().payload_len, 16);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Number of sets (power of two).
    #[serde(default = "CacheConfig::default_num_sets")]
    pub num_sets: usize,

    /// Ways per set (power of two).
    #[serde(default = "CacheConfig::default_ways")]
    pub ways: usize,

    /// Word or pixel width in bits: 8, 16 or 32.
    #[serde(default = "CacheConfig::default_word_bits")]
    pub word_bits: u32,

    /// Replacement policy variant.
    #[serde(default)]
    pub policy: ReplacementPolicy,

    /// Addressing mode and its geometry.
    #[serde(default)]
    pub addressing: Addressing,
}

impl CacheConfig {
    fn default_num_sets() -> usize {
        defaults::NUM_SETS
    }

    fn default_ways() -> usize {
        defaults::WAYS
    }

    fn default_word_bits() -> u32 {
        defaults::WORD_BITS
    }

    /// Byte-addressed set-associative cache with ordered-list LRU.
    pub fn set_assoc() -> Self {
        Self::default()
    }

    /// 2D texture cache: 8×8 tiles, no mip field, ordered-list LRU.
    pub fn texture() -> Self {
        Self {
            num_sets: 16,
            ways: 4,
            word_bits: 32,
            policy: ReplacementPolicy::Lru,
            addressing: Addressing::Tile {
                tile_w: defaults::TILE_W,
                tile_h: defaults::TILE_H,
                tag_x_bits: defaults::TAG_X_BITS,
                tag_y_bits: defaults::TAG_Y_BITS,
                mip_bits: 0,
                set_hash: defaults::SET_HASH,
            },
        }
    }

    /// Mip-aware GPU pixel cache: 8×8 tiles, epoch-stamp replacement.
    pub fn gpu_pixel() -> Self {
        Self {
            num_sets: 32,
            ways: 4,
            word_bits: 32,
            policy: ReplacementPolicy::Epoch,
            addressing: Addressing::Tile {
                tile_w: defaults::TILE_W,
                tile_h: defaults::TILE_H,
                tag_x_bits: 6,
                tag_y_bits: 6,
                mip_bits: defaults::MIP_BITS,
                set_hash: defaults::SET_HASH,
            },
        }
    }

    /// Checks the configuration and derives the cache geometry.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for non-power-of-two set or way counts, zero
    /// line or tile dimensions, unsupported word widths, and tag or address
    /// widths that cannot describe the configured space.
    pub fn validate(&self) -> Result<Geometry, ConfigError> {
        check_pow2("num_sets", self.num_sets)?;
        check_pow2("ways", self.ways)?;
        if !matches!(self.word_bits, 8 | 16 | 32) {
            return Err(ConfigError::WordWidth(self.word_bits));
        }
        let word_bytes = (self.word_bits / 8) as usize;
        let index_bits = self.num_sets.trailing_zeros();

        let payload_len = match self.addressing {
            Addressing::Linear {
                line_bytes,
                address_bits,
            } => {
                if line_bytes == 0 {
                    return Err(ConfigError::ZeroLength {
                        field: "line_bytes",
                    });
                }
                check_pow2("line_bytes", line_bytes)?;
                if line_bytes < word_bytes {
                    return Err(ConfigError::LineTooNarrow {
                        line_bytes,
                        word_bytes,
                    });
                }
                let needed = line_bytes.trailing_zeros() + index_bits;
                if address_bits < needed || address_bits > 64 {
                    return Err(ConfigError::AddressBits {
                        address_bits,
                        needed,
                    });
                }
                line_bytes / word_bytes
            }
            Addressing::Tile {
                tile_w,
                tile_h,
                tag_x_bits,
                tag_y_bits,
                mip_bits,
                ..
            } => {
                if tile_w == 0 {
                    return Err(ConfigError::ZeroLength { field: "tile_w" });
                }
                if tile_h == 0 {
                    return Err(ConfigError::ZeroLength { field: "tile_h" });
                }
                check_tag_field("tag_x_bits", tag_x_bits, 1, 32)?;
                check_tag_field("tag_y_bits", tag_y_bits, 1, 32)?;
                check_tag_field("mip_bits", mip_bits, 0, 8)?;
                let total = tag_x_bits + tag_y_bits + mip_bits;
                if total > 64 {
                    return Err(ConfigError::TagWidth {
                        field: "tag",
                        bits: total,
                    });
                }
                let tile_bytes = u64::from(tile_w) * u64::from(tile_h) * word_bytes as u64;
                let offset_bits = tile_bytes.next_power_of_two().trailing_zeros();
                if total + offset_bits > 64 {
                    return Err(ConfigError::TileAddressBits {
                        tag_bits: total,
                        offset_bits,
                    });
                }
                (tile_w as usize) * (tile_h as usize)
            }
        };

        Ok(Geometry {
            num_sets: self.num_sets,
            ways: self.ways,
            index_bits,
            word_bits: self.word_bits,
            word_bytes,
            payload_len,
            addressing: self.addressing,
        })
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            num_sets: defaults::NUM_SETS,
            ways: defaults::WAYS,
            word_bits: defaults::WORD_BITS,
            policy: ReplacementPolicy::default(),
            addressing: Addressing::default(),
        }
    }
}

fn check_pow2(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value.is_power_of_two() {
        Ok(())
    } else {
        Err(ConfigError::NotPowerOfTwo { field, value })
    }
}

fn check_tag_field(field: &'static str, bits: u32, min: u32, max: u32) -> Result<(), ConfigError> {
    if (min..=max).contains(&bits) {
        Ok(())
    } else {
        Err(ConfigError::TagWidth { field, bits })
    }
}

/// Checked geometry derived from a [`CacheConfig`].
///
/// Every component is sized from this; once a `Geometry` exists, offsets
/// produced by the resolver are in range by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Number of sets.
    pub num_sets: usize,
    /// Ways per set.
    pub ways: usize,
    /// `log2(num_sets)`.
    pub index_bits: u32,
    /// Word or pixel width in bits.
    pub word_bits: u32,
    /// Word or pixel width in bytes.
    pub word_bytes: usize,
    /// Words per line, or pixels per tile. Also the burst length in beats.
    pub payload_len: usize,
    /// Addressing mode.
    pub addressing: Addressing,
}

impl Geometry {
    /// Mask selecting the low `word_bits` of a value.
    pub const fn word_mask(&self) -> u32 {
        if self.word_bits >= 32 {
            u32::MAX
        } else {
            (1 << self.word_bits) - 1
        }
    }

    /// Size of one line or tile in bytes.
    pub const fn line_bytes(&self) -> usize {
        self.payload_len * self.word_bytes
    }
}

/// Timing of the reference burst memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Ticks from burst request to the first beat.
    #[serde(default = "MemoryConfig::default_read_latency")]
    pub read_latency: u64,

    /// Ticks between consecutive beats; values above one pause the stream.
    #[serde(default = "MemoryConfig::default_beat_interval")]
    pub beat_interval: u64,

    /// Ticks from an accepted write to its acknowledgement.
    #[serde(default = "MemoryConfig::default_write_latency")]
    pub write_latency: u64,
}

impl MemoryConfig {
    fn default_read_latency() -> u64 {
        defaults::READ_LATENCY
    }

    fn default_beat_interval() -> u64 {
        defaults::BEAT_INTERVAL
    }

    fn default_write_latency() -> u64 {
        defaults::WRITE_LATENCY
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            read_latency: defaults::READ_LATENCY,
            beat_interval: defaults::BEAT_INTERVAL,
            write_latency: defaults::WRITE_LATENCY,
        }
    }
}

/// Root configuration: one cache plus its backing memory.
///
/// # Examples
///
/// ```
/// use accel_cache_core::config::Config;
///
/// let config = Config::from_json(r#"{ "cache": { "ways": 8 } }"#).unwrap();
/// assert_eq!(config.cache.ways, 8);
/// assert_eq!(config.cache.num_sets, 64);
/// assert_eq!(config.memory.beat_interval, 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Config {
    /// Cache geometry and policy.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Reference memory timing.
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl Config {
    /// Parses a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed JSON or unknown enum values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as [`Config::from_json`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}
