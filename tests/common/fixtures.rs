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

//! Test fixtures for common cache scenarios

use pica_cache::core::pica::{
    ColorFormat, DepthFormat, FramebufferConfig, FramebufferRegs, PipelineRegs, PixelFormat,
    RasterizerRegs, TextureInfo,
};
use pica_cache::core::{
    NullCustomTexManager, PhysicalMemory, RasterizerCache, Settings, SoftwareRuntime,
};

pub type TestCache = RasterizerCache<SoftwareRuntime, PhysicalMemory, NullCustomTexManager>;

/// Create a cache over the 3DS memory map
#[allow(dead_code)]
pub fn create_cache() -> TestCache {
    create_cache_with(Settings::default())
}

/// Create a cache over the 3DS memory map with custom settings
#[allow(dead_code)]
pub fn create_cache_with(settings: Settings) -> TestCache {
    RasterizerCache::new(
        PhysicalMemory::new(),
        NullCustomTexManager,
        SoftwareRuntime::new(),
        settings,
    )
}

/// Write guest bytes as the CPU would, invalidating cached copies
#[allow(dead_code)]
pub fn cpu_write(cache: &mut TestCache, addr: u32, data: &[u8]) {
    cache
        .memory_mut()
        .write_block(addr, data)
        .expect("Failed to write to memory");
    cache.invalidate_region(addr, data.len() as u32, None);
}

/// Read guest bytes as the CPU would, flushing cached copies first
#[allow(dead_code)]
pub fn cpu_read(cache: &mut TestCache, addr: u32, len: usize) -> Vec<u8> {
    cache.flush_region(addr, len as u32, None);
    let mut out = vec![0; len];
    cache
        .memory()
        .read_block(addr, &mut out)
        .expect("Failed to read from memory");
    out
}

/// Tiled RGBA8 texture description
#[allow(dead_code)]
pub fn rgba8_texture(addr: u32, width: u32, height: u32) -> TextureInfo {
    let mut info = TextureInfo {
        physical_address: addr,
        width,
        height,
        stride: 0,
        format: PixelFormat::RGBA8,
    };
    info.set_default_stride();
    info
}

/// Pipeline registers of a full-viewport RGBA8 color buffer
#[allow(dead_code)]
pub fn color_target(addr: u32, width: u32, height: u32) -> PipelineRegs {
    PipelineRegs {
        framebuffer: FramebufferRegs {
            framebuffer: FramebufferConfig {
                width,
                height,
                color_buffer_address: addr,
                depth_buffer_address: 0,
                color_format: ColorFormat::RGBA8,
                depth_format: DepthFormat::D24S8,
            },
            shadow_rendering: false,
        },
        rasterizer: RasterizerRegs {
            viewport_width: width,
            viewport_height: height,
            ..Default::default()
        },
    }
}
