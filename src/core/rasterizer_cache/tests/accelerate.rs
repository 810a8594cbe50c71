// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Accelerated transfer tests

use super::*;
use crate::core::pica::{
    DisplayTransferConfig, GpuPixelFormat, MemoryFillConfig, ScalingMode, TextureCopyConfig,
};

fn fill_config(start: u32, end: u32, value: u32) -> MemoryFillConfig {
    MemoryFillConfig {
        start_address: start,
        end_address: end,
        value_32bit: value,
        fill_32bit: true,
        ..Default::default()
    }
}

fn texture_copy(input: u32, output: u32, size: u32) -> DisplayTransferConfig {
    DisplayTransferConfig {
        input_address: input,
        output_address: output,
        is_texture_copy: true,
        texture_copy: TextureCopyConfig {
            size,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn display_transfer(input: u32, output: u32, width: u32, height: u32) -> DisplayTransferConfig {
    DisplayTransferConfig {
        input_address: input,
        output_address: output,
        input_width: width,
        input_height: height,
        output_width: width,
        output_height: height,
        input_format: GpuPixelFormat::RGBA8,
        output_format: GpuPixelFormat::RGBA8,
        ..Default::default()
    }
}

#[test]
fn test_fill_flush_keeps_pattern_phase() {
    let mut cache = flat_cache();
    write_memory(&mut cache, 0x1F00, &[0x11; 0x1200]);
    assert!(cache.accelerate_fill(&fill_config(0x2000, 0x3000, 0xFF00_00FF)));

    cache.flush_region(0x2802, 0x100, None);
    let memory = read_memory(&cache, 0x2801, 6);
    assert_eq!(memory, vec![0x11, 0x00, 0xFF, 0xFF, 0x00, 0x00]);
    assert_eq!(read_memory(&cache, 0x2902, 2), vec![0x11, 0x11]);
    assert_eq!(cache.stats().fill_downloads, 1);
    assert_eq!(cache.stats().fills, 1);
}

#[test]
fn test_fill_small_cpu_read_writes_whole_fill() {
    let mut cache = flat_cache();
    assert!(cache.accelerate_fill(&fill_config(0x2000, 0x2100, 0xAABB_CCDD)));

    cache.flush_region(0x2010, 4, None);
    assert_eq!(cache.memory().read32(0x2000).unwrap(), 0xAABB_CCDD);
    assert_eq!(cache.memory().read32(0x20FC).unwrap(), 0xAABB_CCDD);
    assert_eq!(cache.dirty_owner(0x2000), None);
}

#[test]
fn test_fill_16bit_pattern() {
    let mut cache = flat_cache();
    let config = MemoryFillConfig {
        start_address: 0x2000,
        end_address: 0x2010,
        value_32bit: 0x1234,
        ..Default::default()
    };
    assert!(cache.accelerate_fill(&config));

    cache.flush_region(0x2000, 0x10, None);
    assert_eq!(read_memory(&cache, 0x2000, 4), vec![0x34, 0x12, 0x34, 0x12]);
}

#[test]
fn test_fill_rejects_empty_range() {
    let mut cache = flat_cache();
    assert!(!cache.accelerate_fill(&fill_config(0x2000, 0x2000, 0)));
    assert!(!cache.accelerate_fill(&fill_config(0x3000, 0x2000, 0)));
    assert_eq!(cache.stats().fills, 0);
}

#[test]
fn test_fill_validates_surface_by_clear() {
    let mut cache = flat_cache();
    let value = 0x8040_20FF;
    assert!(cache.accelerate_fill(&fill_config(0x10000, 0x14000, value)));

    let params = tiled_params(0x10000, 64, 64, PixelFormat::RGBA8);
    let id = cache.get_surface(&params, ScaleMatch::Ignore, true).unwrap();

    assert_eq!(cache.stats().uploads, 0);
    assert_eq!(cache.runtime().stats().clears, 2);
    assert_eq!(
        cache.surface(id).texture.texel(0, 0, 10, 20),
        Some(&value.to_le_bytes()[..])
    );
}

#[test]
fn test_fill_evicted_by_small_cpu_write() {
    let mut cache = flat_cache();
    assert!(cache.accelerate_fill(&fill_config(0x2000, 0x2100, 0x0102_0304)));
    let count = cache.surface_count();

    cache.invalidate_region(0x2080, 4, None);
    assert_eq!(cache.surface_count(), count - 1);
    assert_eq!(cache.memory().read32(0x20F0).unwrap(), 0x0102_0304);
    assert!(cache.surfaces_in_region(0x2000, 0x100).is_empty());
}

#[test]
fn test_texture_copy_rejects_bad_configs() {
    let mut cache = flat_cache();
    assert!(!cache.accelerate_texture_copy(&texture_copy(0x10000, 0x30000, 0)));
    // Less than one 16 byte unit
    assert!(!cache.accelerate_texture_copy(&texture_copy(0x10000, 0x30000, 15)));

    let mut gap_without_width = texture_copy(0x10000, 0x30000, 64);
    gap_without_width.texture_copy.input_gap = 1;
    assert!(!cache.accelerate_texture_copy(&gap_without_width));
}

#[test]
fn test_texture_copy_uncached_source_follows_setting() {
    let mut cache = flat_cache();
    assert!(!cache.accelerate_texture_copy(&texture_copy(0x10000, 0x30000, 1024)));

    let mut cache = flat_cache_with(Settings {
        skip_texture_copy: true,
        ..Default::default()
    });
    assert!(cache.accelerate_texture_copy(&texture_copy(0x10000, 0x30000, 1024)));
    assert_eq!(cache.stats().texture_copies, 0);
}

#[test]
fn test_texture_copy_between_linear_surfaces() {
    let mut cache = flat_cache();
    let data = pattern(64 * 64 * 4);
    write_memory(&mut cache, 0x10000, &data);
    let params = linear_params(0x10000, 64, 64, PixelFormat::RGBA8);
    cache.get_surface(&params, ScaleMatch::Ignore, true).unwrap();

    assert!(cache.accelerate_texture_copy(&texture_copy(0x10000, 0x30000, 1024)));
    assert_eq!(cache.stats().texture_copies, 1);
    assert_eq!(cache.runtime().stats().copies, 1);

    let dst_id = cache.dirty_owner(0x30000).unwrap();
    assert_eq!(cache.surface(dst_id).params.height, 4);

    cache.flush_region(0x30000, 1024, None);
    assert_eq!(read_memory(&cache, 0x30000, 1024), &data[..1024]);
}

#[test]
fn test_display_transfer_converts_tiling() {
    let mut cache = flat_cache();
    write_memory(&mut cache, 0x10000, &[0x5A; 64 * 64 * 4]);

    assert!(cache.accelerate_display_transfer(&display_transfer(0x10000, 0x20000, 64, 64)));
    assert_eq!(cache.stats().display_transfers, 1);
    assert_eq!(cache.runtime().stats().blits, 1);

    let dst_id = cache.dirty_owner(0x20000).unwrap();
    assert!(!cache.surface(dst_id).params.is_tiled);

    cache.flush_region(0x20000, 64 * 64 * 4, None);
    assert!(read_memory(&cache, 0x20000, 64 * 64 * 4).iter().all(|&b| b == 0x5A));
}

#[test]
fn test_display_transfer_flips_rows() {
    let mut cache = flat_cache();
    // Row y of the linear source holds the byte y
    let source: Vec<u8> = (0..8u8).flat_map(|row| [row; 32]).collect();
    write_memory(&mut cache, 0x10000, &source);

    let mut config = display_transfer(0x10000, 0x20000, 8, 8);
    config.input_linear = true;
    config.dont_swizzle = true;
    config.flip_vertically = true;
    assert!(cache.accelerate_display_transfer(&config));

    cache.flush_region(0x20000, 8 * 8 * 4, None);
    let output = read_memory(&cache, 0x20000, 8 * 8 * 4);
    for (row, bytes) in output.chunks(32).enumerate() {
        assert!(bytes.iter().all(|&b| b == 7 - row as u8), "row {row}");
    }
}

#[test]
fn test_display_transfer_rejects_overflowing_skew() {
    let mut cache = flat_cache();
    write_memory(&mut cache, 0x10000, &[0x42; 64 * 64 * 4]);

    let mut config = display_transfer(0x10000, 0xFFFF_F000, 64, 64);
    config.output_width = 32;
    config.flip_vertically = true;
    config.crop_input_lines = true;
    assert!(!cache.accelerate_display_transfer(&config));
    assert_eq!(cache.stats().display_transfers, 0);
    assert!(cache.surfaces_in_region(0, 0x1000).is_empty());
}

#[test]
fn test_display_transfer_downscales() {
    let mut cache = flat_cache();
    write_memory(&mut cache, 0x10000, &[0x42; 64 * 64 * 4]);

    let mut config = display_transfer(0x10000, 0x20000, 64, 64);
    config.scaling = ScalingMode::ScaleXY;
    assert!(cache.accelerate_display_transfer(&config));

    let dst_id = cache.dirty_owner(0x20000).unwrap();
    let params = cache.surface(dst_id).params;
    assert_eq!((params.width, params.height), (32, 32));
}

#[test]
fn test_display_transfer_null_input() {
    let mut cache = flat_cache();
    assert!(!cache.accelerate_display_transfer(&display_transfer(0, 0x20000, 64, 64)));
    assert_eq!(cache.stats().display_transfers, 0);
}

#[test]
fn test_fallback_policy_forces_software_transfers() {
    let mut cache = flat_cache();
    cache.set_fallback_policy(Box::new(AddressFallbackPolicy::new(vec![0x10000], 3)));

    let hit = display_transfer(0x10000, 0x20000, 64, 64);
    let other = display_transfer(0x50000, 0x60000, 64, 64);
    assert!(!cache.accelerate_display_transfer(&hit));
    for _ in 0..3 {
        assert!(!cache.accelerate_display_transfer(&other));
    }
    assert!(cache.accelerate_display_transfer(&other));
    assert_eq!(cache.stats().display_transfers, 1);
}
