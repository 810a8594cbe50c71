// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Custom texture manager tests

use super::*;

fn texture_params() -> SurfaceParams {
    let mut params = SurfaceParams {
        addr: 0x1000,
        width: 8,
        height: 8,
        pixel_format: PixelFormat::RGB565,
        ..Default::default()
    };
    params.update_params();
    params
}

#[test]
fn test_solid_material() {
    let material = Material::solid(9, 2, 3, [1, 2, 3, 4]);
    assert_eq!(material.data.len(), 2 * 3 * 4);
    assert!(material.data.chunks(4).all(|pixel| pixel == [1, 2, 3, 4]));
}

#[test]
fn test_null_manager_has_nothing() {
    let mut manager = NullCustomTexManager;
    assert_eq!(manager.find_custom_textures(), 0);
    assert!(manager.get_material(0).is_none());
    assert!(manager.skip_mipmaps());
    assert!(manager.use_new_hash());
}

#[test]
fn test_inserted_material_is_found() {
    let mut manager = MemoryCustomTexManager::new();
    manager.insert(Material::solid(42, 4, 4, [0; 4]));
    assert_eq!(manager.get_material(42).map(|material| material.width), Some(4));
    assert!(manager.get_material(43).is_none());
}

#[test]
fn test_staged_material_needs_scan() {
    let mut manager = MemoryCustomTexManager::new();
    manager.stage(Material::solid(42, 4, 4, [0; 4]));
    assert!(manager.get_material(42).is_none());

    assert_eq!(manager.find_custom_textures(), 1);
    assert!(manager.get_material(42).is_some());
}

#[test]
fn test_sync_decode_is_ready() {
    let mut manager = MemoryCustomTexManager::new();
    manager.insert(Material::solid(1, 4, 4, [0; 4]));
    let material = manager.get_material(1).unwrap();

    assert_eq!(manager.decode(&material), DecodeStatus::Ready);
    assert!(manager.is_decoded(&material));
}

#[test]
fn test_async_decode_completes_on_tick() {
    let mut manager = MemoryCustomTexManager::new();
    manager.async_decode = true;
    manager.insert(Material::solid(1, 4, 4, [0; 4]));
    let material = manager.get_material(1).unwrap();

    assert_eq!(manager.decode(&material), DecodeStatus::Pending);
    assert_eq!(manager.decode(&material), DecodeStatus::Pending);
    assert!(!manager.is_decoded(&material));

    manager.tick_frame();
    assert!(manager.is_decoded(&material));
    assert_eq!(manager.decode(&material), DecodeStatus::Ready);
}

#[test]
fn test_dumps_are_deduplicated_by_hash_and_level() {
    let mut manager = MemoryCustomTexManager::new();
    let params = texture_params();
    let data = vec![7u8; params.size as usize];

    manager.dump_texture(&params, 0, &data, 0xAA);
    manager.dump_texture(&params, 0, &data, 0xAA);
    manager.dump_texture(&params, 1, &data[..32], 0xAA);
    manager.dump_texture(&params, 0, &data, 0xBB);

    let dumps = manager.dumps();
    assert_eq!(dumps.len(), 3);
    assert_eq!(dumps[0].format, PixelFormat::RGB565);
    assert_eq!((dumps[0].width, dumps[0].height), (8, 8));
    assert_eq!(dumps[1].data.len(), 32);
}
