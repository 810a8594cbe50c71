// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod common;

use common::assertions::{assert_memory_filled, assert_surfaces_in_region};
use common::fixtures::{color_target, cpu_read, cpu_write, create_cache, rgba8_texture};
use pica_cache::core::pica::MemoryFillConfig;
use pica_cache::core::PhysicalMemory;

const TEXTURE_ADDR: u32 = PhysicalMemory::FCRAM_PADDR;
const TEXTURE_SIZE: u32 = 64 * 64 * 4;
const COLOR_ADDR: u32 = PhysicalMemory::VRAM_PADDR;
const COLOR_SIZE: u32 = 64 * 64 * 4;

#[test]
fn test_cpu_write_reuploads_texture() {
    let mut cache = create_cache();
    let info = rgba8_texture(TEXTURE_ADDR, 64, 64);

    cpu_write(&mut cache, TEXTURE_ADDR, &[0x11; TEXTURE_SIZE as usize]);
    let first = cache.get_texture_surface(&info, 0);
    assert_eq!(cache.surface(first).texture.texel(0, 0, 0, 0), Some(&[0x11; 4][..]));
    assert_eq!(cache.stats().uploads, 1);

    // A second lookup is served from the cache
    assert_eq!(cache.get_texture_surface(&info, 0), first);
    assert_eq!(cache.stats().uploads, 1);

    cpu_write(&mut cache, TEXTURE_ADDR, &[0x22; TEXTURE_SIZE as usize]);
    let second = cache.get_texture_surface(&info, 0);
    assert_eq!(cache.surface(second).texture.texel(0, 0, 0, 0), Some(&[0x22; 4][..]));
    assert_eq!(cache.stats().uploads, 2);
}

#[test]
fn test_rendered_framebuffer_is_written_back() {
    let mut cache = create_cache();
    cpu_write(&mut cache, COLOR_ADDR, &[0x33; COLOR_SIZE as usize]);

    let helper = cache.get_framebuffer_surfaces(&color_target(COLOR_ADDR, 64, 64), true, false);
    cache.invalidate_framebuffer(&helper);

    // Guest memory is stale until the CPU reads the range
    cache
        .memory_mut()
        .write_block(COLOR_ADDR, &[0; COLOR_SIZE as usize])
        .unwrap();
    let data = cpu_read(&mut cache, COLOR_ADDR, COLOR_SIZE as usize);
    assert!(data.iter().all(|&b| b == 0x33));
    assert_eq!(cache.stats().downloads, 1);

    // Clean surfaces are not downloaded again
    cpu_read(&mut cache, COLOR_ADDR, COLOR_SIZE as usize);
    assert_eq!(cache.stats().downloads, 1);
}

#[test]
fn test_cached_pages_follow_surfaces() {
    let mut cache = create_cache();
    cache.get_texture_surface(&rgba8_texture(TEXTURE_ADDR, 64, 64), 0);

    assert!(cache.memory().is_cached(TEXTURE_ADDR));
    assert!(cache.memory().is_cached(TEXTURE_ADDR + TEXTURE_SIZE - 1));
    assert!(!cache.memory().is_cached(TEXTURE_ADDR + TEXTURE_SIZE));
    assert_eq!(cache.memory().cached_page_count(), 4);

    cache.unregister_all();
    assert_eq!(cache.memory().cached_page_count(), 0);
    assert_surfaces_in_region(&cache, TEXTURE_ADDR, TEXTURE_SIZE, 0);
}

#[test]
fn test_settings_change_flushes_render_targets() {
    let mut cache = create_cache();
    let empty_count = cache.surface_count();
    cpu_write(&mut cache, COLOR_ADDR, &[0x44; COLOR_SIZE as usize]);
    let helper = cache.get_framebuffer_surfaces(&color_target(COLOR_ADDR, 64, 64), true, false);
    cache.invalidate_framebuffer(&helper);
    cache
        .memory_mut()
        .write_block(COLOR_ADDR, &[0; COLOR_SIZE as usize])
        .unwrap();

    cache.settings_mut().resolution_factor = 2;
    cache.tick_frame();

    assert_memory_filled(&cache, COLOR_ADDR, COLOR_SIZE as usize, 0x44);
    assert_eq!(cache.surface_count(), empty_count);

    // New surfaces use the new scale
    let helper = cache.get_framebuffer_surfaces(&color_target(COLOR_ADDR, 64, 64), true, false);
    assert_eq!(helper.res_scale, 2);
}

#[test]
fn test_fill_reaches_memory_on_read() {
    let mut cache = create_cache();
    let config = MemoryFillConfig {
        start_address: COLOR_ADDR,
        end_address: COLOR_ADDR + COLOR_SIZE,
        value_32bit: 0x5555_5555,
        fill_32bit: true,
        ..Default::default()
    };
    assert!(cache.accelerate_fill(&config));
    assert_memory_filled(&cache, COLOR_ADDR, COLOR_SIZE as usize, 0);

    let data = cpu_read(&mut cache, COLOR_ADDR, COLOR_SIZE as usize);
    assert!(data.iter().all(|&b| b == 0x55));
}
