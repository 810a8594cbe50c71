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

//! PICA200 rasterizer resource cache
//!
//! The cache maps guest physical memory to GPU surfaces and keeps both
//! sides coherent. It is responsible for:
//! - Finding or creating the surfaces backing textures, render targets and
//!   transfer sources/destinations
//! - Validating surfaces from other surfaces or guest memory before use
//! - Writing GPU-modified data back to guest memory when the CPU reads it
//! - Invalidating surfaces when guest memory is written
//! - Accelerating texture copies, display transfers and memory fills
//!
//! # Ownership Model
//!
//! Each byte of guest memory is in one of three states:
//!
//! | State | Meaning |
//! |---|---|
//! | Clean | Guest memory is authoritative; surfaces may hold valid copies |
//! | Dirty | A surface owns the newest data (`dirty_regions`) |
//! | Stale | A surface's copy is out of date (`invalid_regions`) |
//!
//! A GPU write makes the writing surface the owner and marks every other
//! overlapping surface stale. A CPU read flushes the owner back to memory;
//! a CPU write invalidates every overlapping surface.
//!
//! # Surface Lifetime
//!
//! Surfaces are stored in a [`SlotVector`] and referenced by [`SurfaceId`].
//! Registered surfaces are indexed by a page table of 256KB pages.
//! Unregistered surfaces are *sentenced* and destroyed after
//! [`Runtime::remove_threshold`] frames unless a request with identical
//! params recycles them first.
//!
//! # Example
//!
//! ```
//! use pica_cache::core::config::Settings;
//! use pica_cache::core::custom_tex::NullCustomTexManager;
//! use pica_cache::core::memory::PhysicalMemory;
//! use pica_cache::core::pica::MemoryFillConfig;
//! use pica_cache::core::rasterizer_cache::RasterizerCache;
//! use pica_cache::core::runtime::SoftwareRuntime;
//!
//! let mut cache = RasterizerCache::new(
//!     PhysicalMemory::new(),
//!     NullCustomTexManager,
//!     SoftwareRuntime::new(),
//!     Settings::default(),
//! );
//!
//! let fill = MemoryFillConfig {
//!     start_address: 0x1800_0000,
//!     end_address: 0x1800_1000,
//!     value_32bit: 0xAABBCCDD,
//!     fill_32bit: true,
//!     ..Default::default()
//! };
//! assert!(cache.accelerate_fill(&fill));
//!
//! // A CPU read flushes the fill pattern to memory
//! cache.flush_region(0x1800_0000, 0x1000, None);
//! assert_eq!(cache.memory().read32(0x1800_0ffc).unwrap(), 0xAABBCCDD);
//! ```

mod accelerate;
mod coherency;
mod framebuffer;
mod lookup;
mod matcher;
mod policy;
mod registry;
mod slot_vector;
mod surface;
mod surface_params;
mod types;

#[cfg(test)]
mod tests;

pub use framebuffer::{Framebuffer, FramebufferHelper, Sampler, Viewport};
pub use policy::{
    AcceleratedOp, AddressFallbackPolicy, FallbackPolicy, NoFallback, FALLBACK_FRAMES,
    FIRE_EMBLEM_AWAKENING,
};
pub use slot_vector::{FramebufferId, SamplerId, SlotKey, SlotVector, SurfaceId};
pub use surface::Surface;
pub use surface_params::SurfaceParams;
pub use types::*;

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::config::{Settings, TextureFilterMode};
use crate::core::custom_tex::{CustomTexManager, Material};
use crate::core::interval::{Interval, IntervalCounter, IntervalMap};
use crate::core::memory::GuestMemory;
use crate::core::pica::{PixelFormat, SurfaceType, TextureFilter, TextureType, WrapMode};
use crate::core::runtime::{ClearValue, Runtime, TextureClear};

/// Custom upload waiting for its material to finish decoding
#[derive(Debug, Clone)]
pub(in crate::core::rasterizer_cache) struct PendingCustomUpload {
    pub surface_id: SurfaceId,
    pub material: Arc<Material>,
    pub level: u32,
}

/// Rasterizer resource cache
///
/// Generic over the texture backend `R`, the guest memory `M` and the
/// custom texture manager `C`, all of which it owns.
pub struct RasterizerCache<R: Runtime, M: GuestMemory, C: CustomTexManager> {
    pub(in crate::core::rasterizer_cache) memory: M,
    pub(in crate::core::rasterizer_cache) custom_tex_manager: C,
    pub(in crate::core::rasterizer_cache) runtime: R,
    pub(in crate::core::rasterizer_cache) settings: Settings,
    pub(in crate::core::rasterizer_cache) fallback: Box<dyn FallbackPolicy>,

    /// Settings captured at the last settings change
    pub(in crate::core::rasterizer_cache) resolution_scale_factor: u32,
    pub(in crate::core::rasterizer_cache) filter: TextureFilterMode,
    pub(in crate::core::rasterizer_cache) dump_textures: bool,
    pub(in crate::core::rasterizer_cache) use_custom_textures: bool,

    /// Garbage collector clock, advanced once per frame
    pub(in crate::core::rasterizer_cache) frame_tick: u64,
    /// Unregistered surfaces and the tick they were unregistered at
    pub(in crate::core::rasterizer_cache) sentenced: Vec<(SurfaceId, u64)>,

    pub(in crate::core::rasterizer_cache) slot_surfaces: SlotVector<SurfaceId, Surface<R::Texture>>,
    pub(in crate::core::rasterizer_cache) slot_samplers: SlotVector<SamplerId, Sampler<R::Sampler>>,
    pub(in crate::core::rasterizer_cache) slot_framebuffers:
        SlotVector<FramebufferId, Framebuffer<R::Framebuffer>>,
    pub(in crate::core::rasterizer_cache) samplers: HashMap<SamplerParams, SamplerId>,
    pub(in crate::core::rasterizer_cache) framebuffers: HashMap<FramebufferParams, FramebufferId>,
    pub(in crate::core::rasterizer_cache) texture_cube_cache:
        HashMap<TextureCubeConfig, TextureCube>,

    /// Registered surfaces by 256KB page
    pub(in crate::core::rasterizer_cache) page_table: HashMap<u64, Vec<SurfaceId>>,
    /// GPU-modified memory and the surface owning it
    pub(in crate::core::rasterizer_cache) dirty_regions: IntervalMap<SurfaceId>,
    /// Registered surface count of every 4KB guest page
    pub(in crate::core::rasterizer_cache) cached_pages: IntervalCounter,

    pub(in crate::core::rasterizer_cache) pending_custom_uploads: Vec<PendingCustomUpload>,
    pub(in crate::core::rasterizer_cache) stats: CacheStats,
}

impl<R: Runtime, M: GuestMemory, C: CustomTexManager> RasterizerCache<R, M, C> {
    /// Create a cache with the null surface, null cube and null sampler
    ///
    /// # Arguments
    ///
    /// * `memory` - Guest physical memory
    /// * `custom_tex_manager` - Source of replacement textures
    /// * `runtime` - Texture backend
    /// * `settings` - Settings, captured now and re-checked every frame
    pub fn new(memory: M, custom_tex_manager: C, mut runtime: R, settings: Settings) -> Self {
        let mut slot_surfaces = SlotVector::new();

        let mut null_params = SurfaceParams {
            width: 1,
            height: 1,
            stride: 1,
            texture_type: TextureType::Texture2D,
            pixel_format: PixelFormat::RGBA8,
            ..Default::default()
        };
        null_params.update_params();
        null_params.surface_type = SurfaceType::Color;

        let mut null_surface = Surface::new(null_params, runtime.create_texture(&null_params));
        runtime.clear_texture(
            &mut null_surface,
            &TextureClear {
                texture_level: 0,
                texture_rect: null_params.scaled_rect(0),
                value: ClearValue::default(),
            },
        );
        let null_id = slot_surfaces.insert(null_surface);
        debug_assert_eq!(null_id, NULL_SURFACE_ID);

        let cube_params = SurfaceParams {
            texture_type: TextureType::CubeMap,
            ..null_params
        };
        let cube_texture = runtime.create_texture(&cube_params);
        let cube_id = slot_surfaces.insert(Surface::new(cube_params, cube_texture));
        debug_assert_eq!(cube_id, NULL_SURFACE_CUBE_ID);

        let null_sampler_params = SamplerParams {
            mag_filter: TextureFilter::Linear,
            min_filter: TextureFilter::Linear,
            mip_filter: TextureFilter::Linear,
            wrap_s: WrapMode::ClampToBorder,
            wrap_t: WrapMode::ClampToBorder,
            ..Default::default()
        };
        let mut slot_samplers = SlotVector::new();
        let sampler_id = slot_samplers.insert(Sampler {
            params: null_sampler_params,
            handle: runtime.create_sampler(&null_sampler_params),
        });
        debug_assert_eq!(sampler_id, NULL_SAMPLER_ID);

        log::debug!(
            "Rasterizer cache created with resolution factor {}",
            settings.resolution_factor
        );

        Self {
            memory,
            custom_tex_manager,
            runtime,
            resolution_scale_factor: settings.resolution_factor,
            filter: settings.texture_filter,
            dump_textures: settings.dump_textures,
            use_custom_textures: settings.custom_textures,
            settings,
            fallback: Box::new(NoFallback),
            frame_tick: 0,
            sentenced: Vec::new(),
            slot_surfaces,
            slot_samplers,
            slot_framebuffers: SlotVector::new(),
            samplers: HashMap::new(),
            framebuffers: HashMap::new(),
            texture_cube_cache: HashMap::new(),
            page_table: HashMap::new(),
            dirty_regions: IntervalMap::new(),
            cached_pages: IntervalCounter::new(),
            pending_custom_uploads: Vec::new(),
            stats: CacheStats::default(),
        }
    }

    /// Install the title compatibility policy
    pub fn set_fallback_policy(&mut self, policy: Box<dyn FallbackPolicy>) {
        self.fallback = policy;
    }

    /// Current settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Mutable settings
    ///
    /// Changes of the resolution factor, texture filter or custom texture
    /// toggle take effect at the next [`tick_frame`](Self::tick_frame).
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Surface of a live id
    ///
    /// # Panics
    ///
    /// Panics if the surface was destroyed.
    pub fn surface(&self, id: SurfaceId) -> &Surface<R::Texture> {
        &self.slot_surfaces[id]
    }

    /// Surface of an id, if it is still alive
    pub fn try_surface(&self, id: SurfaceId) -> Option<&Surface<R::Texture>> {
        self.slot_surfaces.get(id)
    }

    pub fn sampler(&self, id: SamplerId) -> &Sampler<R::Sampler> {
        &self.slot_samplers[id]
    }

    pub fn framebuffer(&self, id: FramebufferId) -> &Framebuffer<R::Framebuffer> {
        &self.slot_framebuffers[id]
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut R {
        &mut self.runtime
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    /// Guest memory, for writes that bypass the cache
    ///
    /// Callers writing through this handle must invalidate the written range.
    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    pub fn custom_tex_manager(&self) -> &C {
        &self.custom_tex_manager
    }

    pub fn custom_tex_manager_mut(&mut self) -> &mut C {
        &mut self.custom_tex_manager
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Number of live surfaces, null surfaces included
    pub fn surface_count(&self) -> usize {
        self.slot_surfaces.len()
    }

    /// Number of sentenced surfaces awaiting destruction
    pub fn sentenced_count(&self) -> usize {
        self.sentenced.len()
    }

    /// Garbage collector clock
    pub fn frame_tick(&self) -> u64 {
        self.frame_tick
    }

    /// Registered surfaces overlapping `[addr, addr + size)`
    pub fn surfaces_in_region(&self, addr: u32, size: u32) -> Vec<SurfaceId> {
        self.collect_surfaces_in_region(addr, size).into_vec()
    }

    /// Owner of the dirty region containing `addr`, if any
    pub fn dirty_owner(&self, addr: u32) -> Option<SurfaceId> {
        self.dirty_regions
            .find(Interval::new(addr, addr.saturating_add(1)))
            .map(|(_, owner)| owner)
    }

    /// Per-frame housekeeping
    ///
    /// Runs the custom texture manager and the garbage collector, completes
    /// deferred custom uploads and applies settings changes. A changed
    /// resolution factor, texture filter or custom texture toggle drops
    /// every cached surface.
    pub fn tick_frame(&mut self) {
        self.custom_tex_manager.tick_frame();
        self.process_pending_custom_uploads();
        self.run_garbage_collector();

        self.dump_textures = self.settings.dump_textures;
        let scale_changed = self.resolution_scale_factor != self.settings.resolution_factor;
        let filter_changed = self.filter != self.settings.texture_filter;
        let custom_changed = self.use_custom_textures != self.settings.custom_textures;

        if scale_changed || filter_changed || custom_changed {
            log::info!(
                "Settings changed (scale {} -> {}, filter {:?} -> {:?}), dropping all surfaces",
                self.resolution_scale_factor,
                self.settings.resolution_factor,
                self.filter,
                self.settings.texture_filter
            );
            self.resolution_scale_factor = self.settings.resolution_factor;
            self.filter = self.settings.texture_filter;
            self.use_custom_textures = self.settings.custom_textures;
            if self.use_custom_textures {
                self.custom_tex_manager.find_custom_textures();
            }
            self.unregister_all();
        }
    }
}

impl<R: Runtime, M: GuestMemory, C: CustomTexManager> Drop for RasterizerCache<R, M, C> {
    fn drop(&mut self) {
        self.clear_all(false);
    }
}
