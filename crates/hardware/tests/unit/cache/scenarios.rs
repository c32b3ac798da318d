//! Cache Scenario Tests.
//!
//! Worked examples on small caches, driven end to end through the reference
//! burst memory: allocation without eviction, LRU eviction and refetch, tile
//! locality, dirty writeback ordering, and epoch-stamp eviction.

use accel_cache_core::cache::CacheEngine;
use accel_cache_core::common::{CacheKey, ConfigError};
use accel_cache_core::config::{Addressing, CacheConfig, MemoryConfig, ReplacementPolicy};
use accel_cache_core::mem::MemoryEvent;
use pretty_assertions::assert_eq;

use crate::common::harness::{TestContext, linear_config, tile_config};

const A: u64 = 0x00;
const B: u64 = 0x10;
const C: u64 = 0x20;

/// 2 ways, 4 sets, one 32-bit word per line: A, B, and C all land in set 0.
fn two_way() -> TestContext {
    TestContext::new(linear_config(4, 2, 4))
}

// ══════════════════════════════════════════════════════════
// 1. Linear cache
// ══════════════════════════════════════════════════════════

#[test]
fn two_tags_share_a_set_without_eviction() {
    let mut ctx = two_way();
    for key in [A, B, C] {
        assert_eq!(ctx.engine.resolve(CacheKey::linear(key)).unwrap().set, 0);
    }

    assert!(!ctx.write(CacheKey::linear(A), 1).is_hit());
    assert!(!ctx.write(CacheKey::linear(B), 2).is_hit());
    let read = ctx.read(CacheKey::linear(A));

    assert!(read.is_hit());
    assert_eq!(read.data(), Some(1));
    assert_eq!(ctx.engine.stats().evictions, 0);
    assert_eq!(ctx.engine.occupancy(), 2);
}

#[test]
fn third_tag_evicts_least_recent_and_refetch_sees_writeback() {
    let mut ctx = two_way();
    let _ = ctx.write(CacheKey::linear(A), 1);
    let _ = ctx.write(CacheKey::linear(B), 2);
    let _ = ctx.read(CacheKey::linear(A));

    // B was touched longest ago.
    let _ = ctx.write(CacheKey::linear(C), 3);
    assert_eq!(ctx.engine.probe(CacheKey::linear(B)), None);
    assert!(ctx.engine.probe(CacheKey::linear(A)).is_some());
    assert_eq!(ctx.memory.peek(B), 2);

    let refetch = ctx.read(CacheKey::linear(B));
    assert!(!refetch.is_hit());
    assert_eq!(refetch.data(), Some(2));
    // A is now the older of A and C, so it made room for B.
    assert_eq!(ctx.engine.probe(CacheKey::linear(A)), None);
    assert_eq!(ctx.memory.peek(A), 1);
    assert_eq!(ctx.read(CacheKey::linear(C)).data(), Some(3));
}

#[test]
fn write_miss_is_visible_to_the_next_read() {
    let mut ctx = two_way().preload(C, &[0x77]);
    let _ = ctx.write(CacheKey::linear(C), 5);
    let read = ctx.read(CacheKey::linear(C));
    assert!(read.is_hit());
    assert_eq!(read.data(), Some(5));

    let way = ctx.engine.probe(CacheKey::linear(C)).unwrap();
    assert!(ctx.engine.way_state(0, way).dirty);
    // Memory keeps the old value until the line is written back.
    assert_eq!(ctx.memory.peek(C), 0x77);
}

#[test]
fn dirty_victim_is_written_back_once_before_reuse() {
    let mut ctx = TestContext::new(linear_config(4, 4, 4));
    let _ = ctx.write(CacheKey::linear(A), 0xAA);
    let _ = ctx.drain_events();

    // Four more distinct tags in set 0; the fourth displaces A.
    for tag in 1..=4u64 {
        let _ = ctx.read(CacheKey::linear(tag * 0x10));
    }
    let events = ctx.drain_events();

    let writes: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, MemoryEvent::Write { .. }))
        .collect();
    assert_eq!(
        writes,
        vec![&MemoryEvent::Write {
            addr: A,
            data: vec![0xAA]
        }]
    );

    let ack = events
        .iter()
        .position(|e| *e == MemoryEvent::WriteAck { addr: A })
        .unwrap();
    let refill = events
        .iter()
        .position(|e| *e == MemoryEvent::ReadBurst { base: 0x40, len: 1 })
        .unwrap();
    assert!(ack < refill);
    assert_eq!(ctx.memory.peek(A), 0xAA);

    // Later evictions of clean lines write nothing.
    for tag in 5..=8u64 {
        let _ = ctx.read(CacheKey::linear(tag * 0x10));
    }
    assert!(
        !ctx.drain_events()
            .iter()
            .any(|e| matches!(e, MemoryEvent::Write { .. }))
    );
    assert_eq!(ctx.engine.stats().writebacks, 1);
}

#[test]
fn slow_memory_changes_timing_not_results() {
    let slow = MemoryConfig {
        read_latency: 20,
        beat_interval: 3,
        write_latency: 15,
    };
    let mut fast = TestContext::new(linear_config(4, 2, 16));
    let mut slow = TestContext::with_memory(linear_config(4, 2, 16), slow);

    let mut fast_results = Vec::new();
    let mut slow_results = Vec::new();
    for (i, addr) in [0x00u64, 0x44, 0x80, 0xC8, 0x04, 0x100].into_iter().enumerate() {
        let value = i as u32 * 11;
        fast_results.push(fast.write(CacheKey::linear(addr), value));
        slow_results.push(slow.write(CacheKey::linear(addr), value));
        fast_results.push(fast.read(CacheKey::linear(addr)));
        slow_results.push(slow.read(CacheKey::linear(addr)));
    }
    assert_eq!(fast_results, slow_results);
    assert!(slow.engine.stats().ticks > fast.engine.stats().ticks);
    assert!(slow.engine.stats().fill_stall_ticks > fast.engine.stats().fill_stall_ticks);
}

// ══════════════════════════════════════════════════════════
// 2. Tile caches
// ══════════════════════════════════════════════════════════

#[test]
fn pixels_of_one_tile_hit_without_memory_traffic() {
    let mut ctx = TestContext::new(tile_config(16, 4, (8, 8), 0, ReplacementPolicy::Lru));
    assert!(!ctx.read(CacheKey::pixel(10, 6)).is_hit());
    let _ = ctx.drain_events();

    let second = ctx.read(CacheKey::pixel(12, 5));
    assert!(second.is_hit());
    assert!(ctx.drain_events().is_empty());
}

#[test]
fn tile_writeback_returns_to_tile_address() {
    let mut ctx = TestContext::new(tile_config(1, 1, (2, 2), 0, ReplacementPolicy::Lru));
    let _ = ctx.write(CacheKey::pixel(3, 1), 0x33);
    let _ = ctx.read(CacheKey::pixel(0, 0));

    // Tile (1, 0) has tag 0x100; its pixel (1, 1) sits at index 3.
    let base = 0x100 * 16;
    assert_eq!(ctx.memory.peek(base + 3 * 4), 0x33);
    let again = ctx.read(CacheKey::pixel(3, 1));
    assert_eq!(again.data(), Some(0x33));
}

#[test]
fn gpu_cache_evicts_smallest_epoch_stamp() {
    // One set so every tile competes for the same four ways.
    let mut ctx = TestContext::new(tile_config(1, 4, (8, 8), 4, ReplacementPolicy::Epoch));
    let tiles: Vec<CacheKey> = (0..5).map(|t| CacheKey::texel(t * 8, 0, 1)).collect();

    for &tile in &tiles[..4] {
        let _ = ctx.read(tile);
    }
    assert!(ctx.read(tiles[1]).is_hit());
    assert!(ctx.read(tiles[0]).is_hit());
    let _ = ctx.read(tiles[4]);

    // Stamps were T0=6, T1=5, T2=3, T3=4.
    assert_eq!(ctx.engine.probe(tiles[2]), None);
    for &tile in [tiles[0], tiles[1], tiles[3], tiles[4]].iter() {
        assert!(ctx.engine.probe(tile).is_some(), "{tile} evicted");
    }
}

#[test]
fn mip_levels_are_separate_lines() {
    let mut ctx = TestContext::new(tile_config(8, 2, (8, 8), 4, ReplacementPolicy::Epoch));
    let _ = ctx.write(CacheKey::texel(4, 4, 0), 1);
    let other_level = ctx.read(CacheKey::texel(4, 4, 1));
    assert!(!other_level.is_hit());
    assert_eq!(other_level.data(), Some(0));
    assert_eq!(ctx.read(CacheKey::texel(4, 4, 0)).data(), Some(1));
}

#[test]
fn truncated_tags_alias_distant_tiles() {
    let mut ctx = TestContext::new(tile_config(16, 4, (8, 8), 0, ReplacementPolicy::Lru));
    let _ = ctx.write(CacheKey::pixel(8, 0), 0x5);
    // Tile x 257 keeps only its low 8 bits, landing on tile 1's line.
    let alias = ctx.read(CacheKey::pixel(257 * 8, 0));
    assert!(alias.is_hit());
    assert_eq!(alias.data(), Some(0x5));
}

/// One-way, one-set cache of single-pixel tiles with `tag_bits` per axis.
fn wide_tag_config(tag_bits: u32) -> CacheConfig {
    CacheConfig {
        num_sets: 1,
        ways: 1,
        addressing: Addressing::Tile {
            tile_w: 1,
            tile_h: 1,
            tag_x_bits: tag_bits,
            tag_y_bits: tag_bits,
            mip_bits: 0,
            set_hash: 0,
        },
        ..tile_config(1, 1, (1, 1), 0, ReplacementPolicy::Lru)
    }
}

#[test]
fn widest_tile_tags_keep_distinct_backing_addresses() {
    // 31 + 31 tag bits and 2 offset bits fill the 64-bit address exactly.
    let mut ctx = TestContext::new(wide_tag_config(31));
    let near = CacheKey::pixel(0, 0);
    let far = CacheKey::pixel(1 << 30, 0);

    let _ = ctx.write(near, 0xA);
    let _ = ctx.write(far, 0xB);
    assert_eq!(ctx.engine.resolve(far).unwrap().tag, 1 << 61);
    assert_eq!(ctx.memory.peek(0), 0xA);

    let back = ctx.read(near);
    assert!(!back.is_hit());
    assert_eq!(back.data(), Some(0xA));
    assert_eq!(ctx.memory.peek(1 << 63), 0xB);
}

#[test]
fn tile_tags_that_overflow_addresses_are_rejected() {
    let err = CacheEngine::new(&wide_tag_config(32)).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::TileAddressBits {
            tag_bits: 64,
            offset_bits: 2
        }
    ));
}
