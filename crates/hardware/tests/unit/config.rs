//! # Configuration Tests
//!
//! Defaults, presets, JSON deserialization, and validation of cache geometry.

use std::io::Write;

use accel_cache_core::common::ConfigError;
use accel_cache_core::config::*;
use pretty_assertions::assert_eq;
use rstest::rstest;
use tempfile::NamedTempFile;

#[test]
fn test_cache_config_defaults() {
    let cache = CacheConfig::default();
    assert_eq!(cache.num_sets, 64);
    assert_eq!(cache.ways, 4);
    assert_eq!(cache.word_bits, 32);
    assert_eq!(cache.policy, ReplacementPolicy::Lru);
    assert_eq!(
        cache.addressing,
        Addressing::Linear {
            line_bytes: 64,
            address_bits: 32
        }
    );
}

#[test]
fn test_memory_config_defaults() {
    let memory = MemoryConfig::default();
    assert_eq!(memory.read_latency, 8);
    assert_eq!(memory.beat_interval, 1);
    assert_eq!(memory.write_latency, 4);
}

#[test]
fn test_default_geometry() {
    let geometry = CacheConfig::default().validate().unwrap();
    assert_eq!(geometry.index_bits, 6);
    assert_eq!(geometry.word_bytes, 4);
    assert_eq!(geometry.payload_len, 16);
    assert_eq!(geometry.line_bytes(), 64);
    assert_eq!(geometry.word_mask(), u32::MAX);
}

#[test]
fn test_presets_validate() {
    let set_assoc = CacheConfig::set_assoc().validate().unwrap();
    assert_eq!(set_assoc.addressing.name(), "linear");

    let texture = CacheConfig::texture();
    assert_eq!(texture.policy, ReplacementPolicy::Lru);
    let geometry = texture.validate().unwrap();
    assert_eq!(geometry.addressing.name(), "tile");
    assert_eq!(geometry.payload_len, 64);
    assert!(matches!(texture.addressing, Addressing::Tile { mip_bits: 0, .. }));

    let gpu = CacheConfig::gpu_pixel();
    assert_eq!(gpu.policy, ReplacementPolicy::Epoch);
    assert!(matches!(gpu.addressing, Addressing::Tile { mip_bits: 4, tag_x_bits: 6, .. }));
    assert_eq!(gpu.validate().unwrap().num_sets, 32);
}

#[test]
fn test_narrow_words_mask_and_shrink_lines() {
    let cache = CacheConfig {
        word_bits: 8,
        ..CacheConfig::default()
    };
    let geometry = cache.validate().unwrap();
    assert_eq!(geometry.word_mask(), 0xFF);
    assert_eq!(geometry.payload_len, 64);

    let cache = CacheConfig {
        word_bits: 16,
        ..CacheConfig::default()
    };
    assert_eq!(cache.validate().unwrap().word_mask(), 0xFFFF);
}

#[test]
fn test_empty_json_uses_defaults() {
    let config = Config::from_json("{}").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_partial_json_overrides() {
    let json = r#"{
        "cache": {
            "num_sets": 8,
            "policy": "EPOCH",
            "addressing": { "mode": "Linear", "line_bytes": 32 }
        },
        "memory": { "read_latency": 20 }
    }"#;
    let config = Config::from_json(json).unwrap();
    assert_eq!(config.cache.num_sets, 8);
    assert_eq!(config.cache.ways, 4);
    assert_eq!(config.cache.policy, ReplacementPolicy::Epoch);
    assert_eq!(
        config.cache.addressing,
        Addressing::Linear {
            line_bytes: 32,
            address_bits: 32
        }
    );
    assert_eq!(config.memory.read_latency, 20);
    assert_eq!(config.memory.write_latency, 4);
}

#[test]
fn test_tile_json_defaults() {
    let json = r#"{ "cache": { "addressing": { "mode": "Tile" } } }"#;
    let config = Config::from_json(json).unwrap();
    assert_eq!(
        config.cache.addressing,
        Addressing::Tile {
            tile_w: 8,
            tile_h: 8,
            tag_x_bits: 8,
            tag_y_bits: 8,
            mip_bits: 0,
            set_hash: 0x5A,
        }
    );
}

#[rstest]
#[case("\"LRU\"", ReplacementPolicy::Lru)]
#[case("\"Lru\"", ReplacementPolicy::Lru)]
#[case("\"EPOCH\"", ReplacementPolicy::Epoch)]
#[case("\"Epoch\"", ReplacementPolicy::Epoch)]
fn test_policy_names(#[case] json: &str, #[case] expected: ReplacementPolicy) {
    let policy: ReplacementPolicy = serde_json::from_str(json).unwrap();
    assert_eq!(policy, expected);
}

#[test]
fn test_unknown_policy_is_rejected() {
    let err = Config::from_json(r#"{ "cache": { "policy": "RANDOM" } }"#).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_config_roundtrips_through_json() {
    let config = Config {
        cache: CacheConfig::gpu_pixel(),
        memory: MemoryConfig {
            read_latency: 3,
            beat_interval: 2,
            write_latency: 5,
        },
    };
    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(Config::from_json(&json).unwrap(), config);
}

#[test]
fn test_config_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(br#"{ "cache": { "ways": 2 } }"#).unwrap();
    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.cache.ways, 2);
}

#[test]
fn test_config_from_missing_file() {
    let err = Config::from_file("/nonexistent/cache.json").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[rstest]
#[case::sets_not_pow2(CacheConfig { num_sets: 6, ..CacheConfig::default() }, "num_sets")]
#[case::sets_zero(CacheConfig { num_sets: 0, ..CacheConfig::default() }, "num_sets")]
#[case::ways_not_pow2(CacheConfig { ways: 3, ..CacheConfig::default() }, "ways")]
fn test_rejects_non_power_of_two(#[case] cache: CacheConfig, #[case] field: &str) {
    match cache.validate() {
        Err(ConfigError::NotPowerOfTwo { field: f, .. }) => assert_eq!(f, field),
        other => panic!("expected NotPowerOfTwo for {field}, got {other:?}"),
    }
}

#[test]
fn test_rejects_zero_line() {
    let cache = CacheConfig {
        addressing: Addressing::Linear {
            line_bytes: 0,
            address_bits: 32,
        },
        ..CacheConfig::default()
    };
    assert!(matches!(
        cache.validate(),
        Err(ConfigError::ZeroLength { field: "line_bytes" })
    ));
}

#[test]
fn test_rejects_zero_tile() {
    let mut cache = CacheConfig::texture();
    if let Addressing::Tile { tile_h, .. } = &mut cache.addressing {
        *tile_h = 0;
    }
    assert!(matches!(
        cache.validate(),
        Err(ConfigError::ZeroLength { field: "tile_h" })
    ));
}

#[test]
fn test_rejects_bad_word_width() {
    let cache = CacheConfig {
        word_bits: 12,
        ..CacheConfig::default()
    };
    assert!(matches!(cache.validate(), Err(ConfigError::WordWidth(12))));
}

#[test]
fn test_rejects_line_narrower_than_word() {
    let cache = CacheConfig {
        addressing: Addressing::Linear {
            line_bytes: 2,
            address_bits: 32,
        },
        ..CacheConfig::default()
    };
    assert!(matches!(
        cache.validate(),
        Err(ConfigError::LineTooNarrow {
            line_bytes: 2,
            word_bytes: 4
        })
    ));
}

#[test]
fn test_rejects_address_space_too_small() {
    // 64 sets of 64-byte lines need 12 bits before any tag bit exists.
    let cache = CacheConfig {
        addressing: Addressing::Linear {
            line_bytes: 64,
            address_bits: 10,
        },
        ..CacheConfig::default()
    };
    assert!(matches!(
        cache.validate(),
        Err(ConfigError::AddressBits {
            address_bits: 10,
            needed: 12
        })
    ));
}

#[rstest]
#[case(0, 8, 0, "tag_x_bits")]
#[case(8, 33, 0, "tag_y_bits")]
#[case(8, 8, 9, "mip_bits")]
fn test_rejects_unusable_tag_widths(
    #[case] tag_x_bits: u32,
    #[case] tag_y_bits: u32,
    #[case] mip_bits: u32,
    #[case] field: &str,
) {
    let cache = CacheConfig {
        addressing: Addressing::Tile {
            tile_w: 8,
            tile_h: 8,
            tag_x_bits,
            tag_y_bits,
            mip_bits,
            set_hash: 0,
        },
        ..CacheConfig::default()
    };
    match cache.validate() {
        Err(ConfigError::TagWidth { field: f, .. }) => assert_eq!(f, field),
        other => panic!("expected TagWidth for {field}, got {other:?}"),
    }
}

fn tile_cache(tile: (u32, u32), tag_x_bits: u32, tag_y_bits: u32, mip_bits: u32) -> CacheConfig {
    CacheConfig {
        num_sets: 1,
        ways: 1,
        addressing: Addressing::Tile {
            tile_w: tile.0,
            tile_h: tile.1,
            tag_x_bits,
            tag_y_bits,
            mip_bits,
            set_hash: 0,
        },
        ..CacheConfig::default()
    }
}

#[rstest]
// 8x8 tiles of 32-bit pixels are 256 bytes: 8 offset bits.
#[case::exactly_64((8, 8), 28, 28, 0)]
#[case::with_mip((8, 8), 24, 24, 8)]
// 3x3 tiles are 36 bytes, rounded up to 6 offset bits.
#[case::non_pow2_tile((3, 3), 29, 29, 0)]
fn test_tile_address_fits_64_bits(
    #[case] tile: (u32, u32),
    #[case] tag_x_bits: u32,
    #[case] tag_y_bits: u32,
    #[case] mip_bits: u32,
) {
    assert!(tile_cache(tile, tag_x_bits, tag_y_bits, mip_bits).validate().is_ok());
}

#[rstest]
#[case::one_bit_over((8, 8), 29, 28, 0, 57, 8)]
#[case::mip_pushes_over((8, 8), 25, 24, 8, 57, 8)]
#[case::non_pow2_tile((3, 3), 30, 29, 0, 59, 6)]
#[case::single_pixel_full_tag((1, 1), 32, 32, 0, 64, 2)]
fn test_rejects_tile_address_overflow(
    #[case] tile: (u32, u32),
    #[case] tag_x_bits: u32,
    #[case] tag_y_bits: u32,
    #[case] mip_bits: u32,
    #[case] tag_bits: u32,
    #[case] offset_bits: u32,
) {
    match tile_cache(tile, tag_x_bits, tag_y_bits, mip_bits).validate() {
        Err(ConfigError::TileAddressBits {
            tag_bits: t,
            offset_bits: o,
        }) => assert_eq!((t, o), (tag_bits, offset_bits)),
        other => panic!("expected TileAddressBits, got {other:?}"),
    }
}

#[test]
fn test_config_errors_render() {
    let err = CacheConfig {
        ways: 3,
        ..CacheConfig::default()
    }
    .validate()
    .unwrap_err();
    assert_eq!(err.to_string(), "ways must be a non-zero power of two (got 3)");
}
