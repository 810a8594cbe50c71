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

//! Surface registration and lifetime
//!
//! Registering a surface adds it to the page table and bumps the cached
//! page counts; the guest memory is told whenever a 4KB page gains its
//! first or loses its last surface. Unregistered surfaces are sentenced
//! and erased by the garbage collector, fill surfaces right away.

use smallvec::SmallVec;

use super::matcher::pages_of;
use super::surface::Surface;
use super::surface_params::SurfaceParams;
use super::types::{SurfaceFlags, PAGE_TABLE_BITS};
use super::{RasterizerCache, SurfaceId};
use crate::core::custom_tex::CustomTexManager;
use crate::core::interval::Interval;
use crate::core::memory::{GuestMemory, PAGE_BITS};
use crate::core::pica::SurfaceType;
use crate::core::runtime::Runtime;

/// Byte range of a run of 4KB pages
pub(in crate::core::rasterizer_cache) fn page_run_bytes(pages: Interval) -> (u32, u32) {
    let start = pages.lower() << PAGE_BITS;
    let size = ((pages.length() as u64) << PAGE_BITS).min(u32::MAX as u64) as u32;
    (start, size)
}

impl<R: Runtime, M: GuestMemory, C: CustomTexManager> RasterizerCache<R, M, C> {
    /// Create a surface for `params`, fully invalid
    ///
    /// A sentenced surface with identical params is recycled instead of
    /// allocating a new texture.
    pub(in crate::core::rasterizer_cache) fn create_surface(
        &mut self,
        params: &SurfaceParams,
    ) -> SurfaceId {
        let recycled = self
            .sentenced
            .iter()
            .position(|&(surface_id, _)| self.slot_surfaces[surface_id].params == *params);

        let surface_id = match recycled {
            Some(index) => {
                let (surface_id, _) = self.sentenced.remove(index);
                self.stats.surfaces_recycled += 1;
                log::trace!("Recycled {:?} for {}", surface_id, params.debug_name());
                surface_id
            }
            None => {
                let texture = self.runtime.create_texture(params);
                self.stats.surfaces_created += 1;
                self.slot_surfaces.insert(Surface::new(*params, texture))
            }
        };

        let surface = &mut self.slot_surfaces[surface_id];
        surface.scale_up(&mut self.runtime, params.res_scale);
        let interval = surface.params.interval();
        surface.mark_invalid(interval);
        surface_id
    }

    /// Add a surface to the page table
    ///
    /// # Panics
    ///
    /// Panics if the surface is already registered.
    pub(in crate::core::rasterizer_cache) fn register_surface(&mut self, surface_id: SurfaceId) {
        let surface = &mut self.slot_surfaces[surface_id];
        assert!(
            !surface.flags.contains(SurfaceFlags::REGISTERED),
            "Trying to register an already registered surface {}",
            surface.params.debug_name()
        );

        surface.flags.insert(SurfaceFlags::REGISTERED);
        let (addr, size) = (surface.params.addr, surface.params.size);
        self.stats.registrations += 1;

        self.update_pages_cached_count(addr, size, 1);
        for page in pages_of(addr, size) {
            self.page_table.entry(page).or_default().push(surface_id);
        }
    }

    /// Remove a surface from the page table
    ///
    /// Non-fill surfaces are sentenced and detached from texture cubes;
    /// fill surfaces are erased.
    ///
    /// # Panics
    ///
    /// Panics if the surface is not registered or missing from one of its pages.
    pub(in crate::core::rasterizer_cache) fn unregister_surface(&mut self, surface_id: SurfaceId) {
        let surface = &mut self.slot_surfaces[surface_id];
        assert!(
            surface.flags.contains(SurfaceFlags::REGISTERED),
            "Trying to unregister an already unregistered surface {}",
            surface.params.debug_name()
        );

        surface.flags.remove(SurfaceFlags::REGISTERED);
        let (addr, size) = (surface.params.addr, surface.params.size);
        let surface_type = surface.params.surface_type;
        self.stats.unregistrations += 1;

        self.update_pages_cached_count(addr, size, -1);
        for page in pages_of(addr, size) {
            let Some(surfaces) = self.page_table.get_mut(&page) else {
                panic!("Unregistering unregistered page {:#x}", page << PAGE_TABLE_BITS);
            };
            let Some(position) = surfaces.iter().position(|&id| id == surface_id) else {
                panic!(
                    "Unregistering unregistered surface in page {:#x}",
                    page << PAGE_TABLE_BITS
                );
            };
            surfaces.remove(position);
            if surfaces.is_empty() {
                self.page_table.remove(&page);
            }
        }

        if surface_type == SurfaceType::Fill {
            self.slot_surfaces.erase(surface_id);
            self.stats.surfaces_erased += 1;
            return;
        }

        self.remove_texture_cube_face(surface_id);
        self.sentenced.push((surface_id, self.frame_tick));
    }

    /// Flush and unregister every surface, then collect them all
    pub fn unregister_all(&mut self) {
        self.flush_all();

        let registered: Vec<SurfaceId> = self
            .slot_surfaces
            .iter()
            .filter(|(_, surface)| surface.flags.contains(SurfaceFlags::REGISTERED))
            .map(|(surface_id, _)| surface_id)
            .collect();
        log::debug!("Unregistering {} surfaces", registered.len());
        for surface_id in registered {
            self.unregister_surface(surface_id);
        }

        self.runtime.finish();
        self.frame_tick += self.runtime.remove_threshold();
        self.run_garbage_collector();
    }

    /// Apply `delta` to the cached count of every page of `[addr, addr + size)`
    ///
    /// Pages whose count becomes non-zero are marked cached; pages whose
    /// count drops to zero are unmarked.
    ///
    /// # Panics
    ///
    /// Panics if a count would become negative.
    pub(in crate::core::rasterizer_cache) fn update_pages_cached_count(
        &mut self,
        addr: u32,
        size: u32,
        delta: i32,
    ) {
        if size == 0 {
            return;
        }

        let page_start = addr >> PAGE_BITS;
        let page_end = ((addr as u64 + size as u64 - 1) >> PAGE_BITS) as u32 + 1;
        let pages = Interval::new(page_start, page_end);

        // Counts reaching zero are dropped from the counter, so decrements
        // are applied after inspecting it
        if delta > 0 {
            self.cached_pages.add(pages, delta);
        }

        let segments: SmallVec<[(Interval, i32); 4]> = self
            .cached_pages
            .overlapping(pages)
            .map(|(interval, count)| (interval & pages, count))
            .collect();
        for (interval, count) in segments {
            let (start, size) = page_run_bytes(interval);
            if delta > 0 && count == delta {
                self.memory.rasterizer_mark_region_cached(start, size, true);
            } else if delta < 0 && count == -delta {
                self.memory.rasterizer_mark_region_cached(start, size, false);
            } else {
                assert!(count >= 0, "Negative cached count {} at {:?}", count, interval);
            }
        }

        if delta < 0 {
            self.cached_pages.add(pages, delta);
        }
    }

    /// Advance the frame clock and erase expired sentenced surfaces
    pub(in crate::core::rasterizer_cache) fn run_garbage_collector(&mut self) {
        self.frame_tick += 1;
        let threshold = self.runtime.remove_threshold();
        let frame_tick = self.frame_tick;

        let (expired, kept): (Vec<_>, Vec<_>) = self
            .sentenced
            .drain(..)
            .partition(|&(_, tick)| frame_tick - tick > threshold);
        self.sentenced = kept;

        for (surface_id, _) in expired {
            if !self.slot_surfaces.contains(surface_id) {
                continue;
            }
            self.remove_framebuffers(surface_id);
            self.remove_texture_cube_face(surface_id);
            self.slot_surfaces.erase(surface_id);
            self.stats.surfaces_erased += 1;
        }
    }

    /// Drop every framebuffer attaching `surface_id`
    pub(in crate::core::rasterizer_cache) fn remove_framebuffers(&mut self, surface_id: SurfaceId) {
        let slot_framebuffers = &mut self.slot_framebuffers;
        self.framebuffers.retain(|params, framebuffer_id| {
            let uses = params.color_id == Some(surface_id) || params.depth_id == Some(surface_id);
            if uses {
                slot_framebuffers.erase(*framebuffer_id);
            }
            !uses
        });
    }

    /// Detach a tracked surface from every texture cube using it
    ///
    /// Cubes left without any face are sentenced.
    pub(in crate::core::rasterizer_cache) fn remove_texture_cube_face(
        &mut self,
        surface_id: SurfaceId,
    ) {
        let tracked = self
            .slot_surfaces
            .get(surface_id)
            .is_some_and(|surface| surface.flags.contains(SurfaceFlags::TRACKED));
        if !tracked {
            return;
        }

        let frame_tick = self.frame_tick;
        let sentenced = &mut self.sentenced;
        self.texture_cube_cache.retain(|_, cube| {
            for face_id in cube.face_ids.iter_mut() {
                if *face_id == Some(surface_id) {
                    *face_id = None;
                }
            }
            if cube.face_ids.iter().all(Option::is_none) {
                sentenced.push((cube.surface_id, frame_tick));
                return false;
            }
            true
        });
    }
}
