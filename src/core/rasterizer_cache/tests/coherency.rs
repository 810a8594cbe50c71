// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Validation, flush and invalidation tests

use super::*;

/// Linear 64x64 RGBA8 surface at 0x1000 loaded with `pattern` and owning
/// its whole range, with guest memory zeroed behind its back
fn dirty_surface(cache: &mut TestCache) -> (SurfaceId, Vec<u8>) {
    let params = linear_params(0x1000, 64, 64, PixelFormat::RGBA8);
    let data = pattern(params.size as usize);
    write_memory(cache, 0x1000, &data);

    let id = cache.get_surface(&params, ScaleMatch::Ignore, true).unwrap();
    cache.invalidate_region(params.addr, params.size, Some(id));
    write_memory(cache, 0x1000, &vec![0; data.len()]);
    (id, data)
}

#[test]
fn test_validate_is_idempotent() {
    let mut cache = flat_cache();
    let params = tiled_params(0x1000, 32, 32, PixelFormat::RGBA8);
    let id = cache.get_surface(&params, ScaleMatch::Ignore, false).unwrap();
    assert!(cache.surface(id).is_fully_invalid());

    cache.validate_surface(id, params.addr, params.size);
    cache.validate_surface(id, params.addr, params.size);
    assert_eq!(cache.stats().uploads, 1);
    assert!(cache.surface(id).invalid_regions.is_empty());
}

#[test]
fn test_upload_reads_guest_memory() {
    let mut cache = flat_cache();
    let params = linear_params(0x1000, 16, 16, PixelFormat::RGBA8);
    write_memory(&mut cache, 0x1000, &[0x5C; 16 * 16 * 4]);

    let id = cache.get_surface(&params, ScaleMatch::Ignore, true).unwrap();
    assert_eq!(cache.surface(id).texture.texel(0, 0, 15, 15), Some(&[0x5C; 4][..]));
}

#[test]
fn test_flush_writes_back_owned_range() {
    let mut cache = flat_cache();
    let (id, data) = dirty_surface(&mut cache);
    assert_eq!(cache.dirty_owner(0x1000), Some(id));

    cache.flush_region(0x1000, data.len() as u32, None);
    assert_eq!(read_memory(&cache, 0x1000, data.len()), data);
    assert_eq!(cache.dirty_owner(0x1000), None);
    assert_eq!(cache.stats().downloads, 1);
}

#[test]
fn test_flush_writes_only_requested_bytes() {
    let mut cache = flat_cache();
    let (id, data) = dirty_surface(&mut cache);

    cache.flush_region(0x1104, 0x20, None);
    let memory = read_memory(&cache, 0x1100, 0x40);
    assert_eq!(&memory[..4], &[0; 4]);
    assert_eq!(&memory[4..0x24], &data[0x104..0x124]);
    assert_eq!(&memory[0x24..], &[0; 0x1C]);

    assert_eq!(cache.dirty_owner(0x1104), None);
    assert_eq!(cache.dirty_owner(0x1200), Some(id));
}

#[test]
fn test_small_flush_writes_whole_dirty_region() {
    let mut cache = flat_cache();
    let (_, data) = dirty_surface(&mut cache);

    cache.flush_region(0x1500, 4, None);
    assert_eq!(read_memory(&cache, 0x1000, data.len()), data);
    assert_eq!(cache.dirty_owner(0x1000), None);
    assert_eq!(cache.dirty_owner(0x4FFF), None);
}

#[test]
fn test_flush_with_other_owner_does_nothing() {
    let mut cache = flat_cache();
    let (id, data) = dirty_surface(&mut cache);

    cache.flush_region(0x1000, data.len() as u32, Some(NULL_SURFACE_ID));
    assert_eq!(read_memory(&cache, 0x1000, 16), vec![0; 16]);
    assert_eq!(cache.dirty_owner(0x1000), Some(id));
}

#[test]
fn test_small_cpu_write_evicts_surface() {
    let mut cache = flat_cache();
    let params = linear_params(0x1000, 32, 32, PixelFormat::RGBA8);
    let data = pattern(params.size as usize);
    write_memory(&mut cache, 0x1000, &data);

    let id = cache.get_surface(&params, ScaleMatch::Ignore, true).unwrap();
    cache.invalidate_region(0x1000, 0x1000, Some(id));
    write_memory(&mut cache, 0x1000, &vec![0; data.len()]);

    cache.invalidate_region(0x1000, 4, None);

    // The owned data reached memory before the surface was dropped
    assert_eq!(read_memory(&cache, 0x1000, data.len()), data);
    assert!(cache.surfaces_in_region(0x1000, 0x1000).is_empty());
    assert!(!cache.memory().is_cached(0x1000));
    assert_eq!(cache.dirty_owner(0x1800), None);
    assert_eq!(cache.sentenced_count(), 1);
}

#[test]
fn test_skip_cpu_write_keeps_surface() {
    let mut cache = flat_cache_with(Settings {
        skip_cpu_write: true,
        ..Default::default()
    });
    let params = linear_params(0x1000, 32, 32, PixelFormat::RGBA8);
    let id = cache.get_surface(&params, ScaleMatch::Ignore, true).unwrap();

    cache.invalidate_region(0x1000, 4, None);
    assert_eq!(cache.surfaces_in_region(0x1000, 4), vec![id]);
    assert!(cache.surface(id).invalid_regions.is_empty());
}

#[test]
fn test_large_cpu_write_marks_range_stale() {
    let mut cache = flat_cache();
    let params = linear_params(0x1000, 64, 64, PixelFormat::RGBA8);
    let id = cache.get_surface(&params, ScaleMatch::Ignore, true).unwrap();

    // First row
    write_memory(&mut cache, 0x1000, &[0xEE; 0x100]);
    cache.invalidate_region(0x1000, 0x100, None);
    assert_eq!(cache.surfaces_in_region(0x1000, 0x100), vec![id]);
    assert!(!cache.surface(id).is_region_valid(params.interval()));

    cache.validate_surface(id, params.addr, params.size);
    assert_eq!(cache.stats().uploads, 2);
    assert_eq!(cache.surface(id).texture.texel(0, 0, 0, 0), Some(&[0xEE; 4][..]));
}

#[test]
fn test_full_cpu_write_unregisters_surface() {
    let mut cache = flat_cache();
    let params = linear_params(0x1000, 64, 64, PixelFormat::RGBA8);
    cache.get_surface(&params, ScaleMatch::Ignore, true).unwrap();

    cache.invalidate_region(params.addr, params.size, None);
    assert!(cache.surfaces_in_region(params.addr, params.size).is_empty());
    assert_eq!(cache.sentenced_count(), 1);
    assert_eq!(cache.memory().cached_page_count(), 0);
}

#[test]
fn test_owner_write_validates_overlapping_surface_by_copy() {
    let mut cache = flat_cache();
    write_memory(&mut cache, 0x10000, &pattern(0x4000));
    let big = tiled_params(0x10000, 64, 64, PixelFormat::RGBA8);
    let small = tiled_params(0x10000, 64, 32, PixelFormat::RGBA8);
    let big_id = cache.get_surface(&big, ScaleMatch::Ignore, true).unwrap();
    // The smaller surface is validated from the bigger one
    let small_id = cache.get_surface(&small, ScaleMatch::Exact, true).unwrap();
    assert_ne!(big_id, small_id);
    assert_eq!(cache.stats().uploads, 1);
    assert_eq!(cache.stats().surface_copies, 1);

    cache.invalidate_region(small.addr, small.size, Some(small_id));
    assert!(!cache.surface(big_id).is_region_valid(small.interval()));
    assert_eq!(cache.dirty_owner(small.addr), Some(small_id));

    cache.validate_surface(big_id, small.addr, small.size);
    assert_eq!(cache.stats().uploads, 1);
    assert_eq!(cache.stats().surface_copies, 2);
    assert!(cache.surface(big_id).is_region_valid(big.interval()));
}

#[test]
fn test_equal_bit_depth_validates_by_reinterpretation() {
    let mut cache = flat_cache();
    write_memory(&mut cache, 0x20000, &pattern(32 * 32 * 2));
    let rgba4 = tiled_params(0x20000, 32, 32, PixelFormat::RGBA4);
    let rgba4_id = cache.get_surface(&rgba4, ScaleMatch::Ignore, true).unwrap();
    cache.invalidate_region(rgba4.addr, rgba4.size, Some(rgba4_id));

    let rgb565 = tiled_params(0x20000, 32, 32, PixelFormat::RGB565);
    let rgb565_id = cache.get_surface(&rgb565, ScaleMatch::Ignore, true).unwrap();

    assert_eq!(cache.stats().uploads, 1);
    assert_eq!(cache.stats().reinterpretations, 1);
    assert_eq!(
        cache.surface(rgb565_id).texture.texel(0, 0, 3, 5),
        cache.surface(rgba4_id).texture.texel(0, 0, 3, 5)
    );
}

#[test]
fn test_clear_all_without_flush_drops_dirty_data() {
    let mut cache = flat_cache();
    let (_, data) = dirty_surface(&mut cache);

    cache.clear_all(false);
    assert_eq!(read_memory(&cache, 0x1000, 16), vec![0; 16]);
    assert!(cache.surfaces_in_region(0x1000, data.len() as u32).is_empty());
    assert!(!cache.memory().is_cached(0x1000));
    assert_eq!(cache.dirty_owner(0x1000), None);
}

#[test]
fn test_clear_all_with_flush_writes_back() {
    let mut cache = flat_cache();
    let (_, data) = dirty_surface(&mut cache);

    cache.clear_all(true);
    assert_eq!(read_memory(&cache, 0x1000, data.len()), data);
    assert_eq!(cache.memory().cached_page_count(), 0);
}

#[test]
#[should_panic(expected = "cannot own a region")]
fn test_texture_owner_panics() {
    let mut cache = flat_cache();
    let params = tiled_params(0x1000, 8, 8, PixelFormat::I8);
    let id = cache.get_surface(&params, ScaleMatch::Ignore, false).unwrap();
    cache.invalidate_region(params.addr, params.size, Some(id));
}

#[test]
fn test_dirty_owner_with_other_stride_skips_upload() {
    let mut cache = flat_cache();
    let (owner_id, _) = dirty_surface(&mut cache);
    let uploads = cache.stats().uploads;

    // Same bytes read with half the row length
    let narrow = linear_params(0x1000, 32, 32, PixelFormat::RGBA8);
    let narrow_id = cache.get_surface(&narrow, ScaleMatch::Ignore, true).unwrap();
    assert_ne!(narrow_id, owner_id);
    assert_eq!(cache.stats().uploads, uploads);
    assert_eq!(cache.stats().reinterpretations, 0);
    assert!(cache.surface(narrow_id).is_region_valid(narrow.interval()));
    assert_eq!(cache.dirty_owner(0x1000), Some(owner_id));
}

#[test]
fn test_upscaled_mip_levels_are_regenerated() {
    let mut cache = flat_cache();
    let mut params = tiled_params(0x8000, 16, 16, PixelFormat::RGBA8);
    params.levels = 2;
    params.res_scale = 2;
    params.update_params();
    let id = cache.get_surface(&params, ScaleMatch::Ignore, false).unwrap();

    let base = params.level_interval(0);
    cache.validate_surface(id, base.lower(), base.length());
    assert_eq!(cache.runtime().stats().mipmap_generations, 0);

    let mip = params.level_interval(1);
    cache.validate_surface(id, mip.lower(), mip.length());
    assert_eq!(cache.runtime().stats().mipmap_generations, 1);
    assert!(cache.surface(id).is_region_valid(params.interval()));
}

#[test]
fn test_native_mip_levels_are_uploaded_as_is() {
    let mut cache = flat_cache();
    let mut params = tiled_params(0x8000, 16, 16, PixelFormat::RGBA8);
    params.levels = 2;
    params.update_params();

    cache.get_surface(&params, ScaleMatch::Ignore, true).unwrap();
    assert_eq!(cache.runtime().stats().mipmap_generations, 0);
    assert_eq!(cache.stats().uploads, 2);
}

#[test]
fn test_flush_all_writes_back_every_owner() {
    let mut cache = flat_cache();
    let (_, first_data) = dirty_surface(&mut cache);

    let second = linear_params(0x20000, 16, 16, PixelFormat::RGBA8);
    let second_data = vec![0xC3; second.size as usize];
    write_memory(&mut cache, second.addr, &second_data);
    let second_id = cache.get_surface(&second, ScaleMatch::Ignore, true).unwrap();
    cache.invalidate_region(second.addr, second.size, Some(second_id));
    write_memory(&mut cache, second.addr, &vec![0; second_data.len()]);

    cache.flush_all();
    assert_eq!(read_memory(&cache, 0x1000, first_data.len()), first_data);
    assert_eq!(read_memory(&cache, second.addr, second_data.len()), second_data);
    assert_eq!(cache.dirty_owner(0x1000), None);
    assert_eq!(cache.dirty_owner(second.addr), None);
}
