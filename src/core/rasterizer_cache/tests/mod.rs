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

//! Rasterizer cache tests
//!
//! Tests are organized into the following modules:
//! - `slots`: slot storage and key reuse
//! - `params`: surface geometry and interval math
//! - `lookup`: surface, texture, cube, framebuffer and sampler resolution
//! - `coherency`: validation, flush and invalidation
//! - `lifetime`: registration, page accounting and garbage collection
//! - `accelerate`: texture copies, display transfers and fills
//! - `custom`: custom texture substitution

use super::*;
use crate::core::config::Settings;
use crate::core::custom_tex::NullCustomTexManager;
use crate::core::memory::PhysicalMemory;
use crate::core::runtime::SoftwareRuntime;

mod accelerate;
mod coherency;
mod lookup;

type TestCache<C = NullCustomTexManager> = RasterizerCache<SoftwareRuntime, PhysicalMemory, C>;

/// Size of the flat test memory mapped at address 0
const MEMORY_SIZE: u32 = 0x10_0000;

/// Cache over flat memory with default settings
fn flat_cache() -> TestCache {
    flat_cache_with(Settings::default())
}

fn flat_cache_with(settings: Settings) -> TestCache {
    RasterizerCache::new(
        PhysicalMemory::flat(0, MEMORY_SIZE),
        NullCustomTexManager,
        SoftwareRuntime::new(),
        settings,
    )
}

/// Gapless linear surface
fn linear_params(addr: u32, width: u32, height: u32, format: PixelFormat) -> SurfaceParams {
    let mut params = SurfaceParams {
        addr,
        width,
        height,
        pixel_format: format,
        ..Default::default()
    };
    params.update_params();
    params
}

/// Gapless tiled surface
fn tiled_params(addr: u32, width: u32, height: u32, format: PixelFormat) -> SurfaceParams {
    let mut params = SurfaceParams {
        addr,
        width,
        height,
        is_tiled: true,
        pixel_format: format,
        ..Default::default()
    };
    params.update_params();
    params
}

/// Bytes `0, 1, 2, ...` wrapping at 251 so rows never line up
fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

fn write_memory<C: CustomTexManager>(cache: &mut TestCache<C>, addr: u32, data: &[u8]) {
    cache.memory_mut().write_block(addr, data).unwrap();
}

fn read_memory<C: CustomTexManager>(cache: &TestCache<C>, addr: u32, len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    cache.memory().read_block(addr, &mut data).unwrap();
    data
}
