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

//! Coherency between surfaces and guest memory
//!
//! # Validation
//!
//! Each invalid interval of a surface is validated one mip level at a
//! time, trying in order:
//!
//! 1. A copy (or clear) from another cached surface
//! 2. A reinterpretation of a surface with another format of equal bit depth
//! 3. An upload from guest memory, after flushing GPU-owned bytes of it,
//!    optionally replaced by a custom texture
//!
//! # Flush and invalidation
//!
//! Flushing writes dirty regions back to guest memory. Invalidation marks
//! overlapping surfaces stale, and with an owner makes that surface the
//! new owner of the range.

use std::sync::Arc;

use smallvec::SmallVec;
use xxhash_rust::xxh3::xxh3_64;

use super::registry::page_run_bytes;
use super::surface::Surface;
use super::surface_params::SurfaceParams;
use super::types::{MatchFlags, ScaleMatch, SurfaceFlags, SMALL_WRITE_THRESHOLD};
use super::{PendingCustomUpload, RasterizerCache, SurfaceId};
use crate::core::custom_tex::{CustomTexManager, DecodeStatus, Material};
use crate::core::interval::{Interval, IntervalCounter, IntervalSet};
use crate::core::memory::GuestMemory;
use crate::core::pica::SurfaceType;
use crate::core::runtime::{
    BufferTextureCopy, Extent, Offset, Runtime, TextureBlit, TextureClear, TextureCopy,
};
use crate::core::texture::{decode_texture, encode_texture};

/// Interval `[addr, addr + size)`, clamped to the address space
#[inline]
pub(in crate::core::rasterizer_cache) fn byte_interval(addr: u32, size: u32) -> Interval {
    Interval::new(addr, addr.saturating_add(size))
}

/// Content hash of uploaded guest bytes
///
/// The new hash covers the raw guest bytes; the old hash covers the
/// texels decoded to RGBA8.
fn compute_hash(load_info: &SurfaceParams, upload_data: &[u8], use_new_hash: bool) -> u64 {
    if use_new_hash {
        return xxh3_64(upload_data);
    }
    let mut decoded = vec![0u8; load_info.width as usize * load_info.height as usize * 4];
    decode_texture(&load_info.layout(), upload_data, &mut decoded, true);
    xxh3_64(&decoded)
}

impl<R: Runtime, M: GuestMemory, C: CustomTexManager> RasterizerCache<R, M, C> {
    /// Make `[addr, addr + size)` of a surface match guest memory
    ///
    /// Does nothing when the range is already valid.
    ///
    /// # Panics
    ///
    /// Panics if a fill surface is asked to validate an invalid range.
    pub fn validate_surface(&mut self, surface_id: SurfaceId, addr: u32, size: u32) {
        if size == 0 {
            return;
        }

        let validate_interval = byte_interval(addr, size);
        let surface = &self.slot_surfaces[surface_id];
        if surface.params.surface_type == SurfaceType::Fill {
            assert!(
                surface.is_region_valid(validate_interval),
                "Attempted to validate a non-valid fill surface"
            );
            return;
        }

        let mut validate_regions = surface.invalid_regions.intersection(validate_interval);
        if validate_regions.is_empty() {
            return;
        }

        log::trace!(
            "Validating {} from {:#x} to {:#x}",
            surface.params.debug_name(),
            validate_interval.lower(),
            validate_interval.upper()
        );

        let levels = surface.params.levels;
        let mut level = surface.params.level_of(addr);
        let mut level_interval = surface.params.level_interval(level);

        while let Some(first) = validate_regions.first() {
            // Work inside one level at a time
            let interval = first & level_interval;
            if interval.is_empty() {
                level += 1;
                if level >= levels {
                    break;
                }
                level_interval = self.slot_surfaces[surface_id].params.level_interval(level);
                continue;
            }

            let params = self.slot_surfaces[surface_id].params.from_interval(interval);

            let copy_match =
                self.find_match(&params, MatchFlags::COPY, ScaleMatch::Ignore, Some(interval));
            if let Some((copy_id, _)) = copy_match.filter(|&(copy_id, _)| copy_id != surface_id) {
                let copy_interval = self.slot_surfaces[copy_id].copyable_interval(&params);
                self.copy_surface(copy_id, surface_id, copy_interval);
                self.slot_surfaces[surface_id].mark_valid(copy_interval);
                validate_regions.erase(copy_interval);
                continue;
            }

            if self.validate_by_reinterpretation(surface_id, &params, interval) {
                self.slot_surfaces[surface_id].mark_valid(interval);
                validate_regions.erase(interval);
                continue;
            }

            self.flush_region(params.addr, params.size, None);
            if !self.use_custom_textures || !self.upload_custom_surface(surface_id, interval) {
                self.upload_surface(surface_id, interval);
            }
            self.slot_surfaces[surface_id].mark_valid(params.interval());
            validate_regions.erase(params.interval());
        }

        // Filtered lower levels look poor; rebuild them from the base level
        let surface = &mut self.slot_surfaces[surface_id];
        if surface.params.res_scale != 1 && level != 0 {
            self.runtime.generate_mipmaps(surface);
        }
    }

    /// Decode guest bytes covering `interval` into a surface
    pub(in crate::core::rasterizer_cache) fn upload_surface(
        &mut self,
        surface_id: SurfaceId,
        interval: Interval,
    ) {
        let surface = &self.slot_surfaces[surface_id];
        let load_info = surface.params.from_interval(interval);
        assert!(
            load_info.addr >= surface.params.addr && load_info.end <= surface.params.end,
            "Upload {} outside of {}",
            load_info.debug_name(),
            surface.params.debug_name()
        );

        let convert = self.runtime.needs_conversion(surface.params.pixel_format);
        let bytes_per_pixel = surface.params.internal_bytes_per_pixel(convert) as usize;
        let level = surface.params.level_of(load_info.addr);
        let texture_rect = surface.params.sub_rect(&load_info);
        let should_dump = !surface
            .flags
            .intersects(SurfaceFlags::CUSTOM | SurfaceFlags::RENDER_TARGET);

        let mut staging = self.runtime.find_staging(
            load_info.width as usize * load_info.height as usize * bytes_per_pixel,
            true,
        );

        let upload_size = (load_info.end - load_info.addr) as usize;
        let Some(source) = self.memory.physical_ref(load_info.addr) else {
            log::error!("Uploading {} from unmapped memory", load_info.debug_name());
            return;
        };
        let Some(upload_data) = source.get(..upload_size) else {
            log::error!("Upload {} crosses a memory region", load_info.debug_name());
            return;
        };

        decode_texture(&load_info.layout(), upload_data, &mut staging.mapped, convert);

        if self.dump_textures && should_dump {
            let use_new_hash = self.custom_tex_manager.use_new_hash();
            let hash = compute_hash(&load_info, upload_data, use_new_hash);
            self.custom_tex_manager
                .dump_texture(&load_info, level, upload_data, hash);
        }

        let upload = BufferTextureCopy {
            buffer_offset: staging.offset,
            buffer_size: staging.size,
            texture_rect,
            texture_level: level,
        };
        self.runtime
            .upload(&mut self.slot_surfaces[surface_id], &upload, &staging);
        self.stats.uploads += 1;
    }

    /// Replace the upload of `interval` with a custom texture
    ///
    /// # Returns
    ///
    /// `true` when the level is covered by a custom texture and the regular
    /// upload must be skipped. A material whose decode is still pending is
    /// queued and `false` is returned, so the guest texture is shown until
    /// the material is ready.
    pub(in crate::core::rasterizer_cache) fn upload_custom_surface(
        &mut self,
        surface_id: SurfaceId,
        interval: Interval,
    ) -> bool {
        let surface = &self.slot_surfaces[surface_id];
        let load_info = surface.params.from_interval(interval);
        assert!(
            load_info.addr >= surface.params.addr && load_info.end <= surface.params.end,
            "Custom upload {} outside of {}",
            load_info.debug_name(),
            surface.params.debug_name()
        );
        let level = surface.params.level_of(load_info.addr);

        let upload_size = (load_info.end - load_info.addr) as usize;
        let use_new_hash = self.custom_tex_manager.use_new_hash();
        let Some(upload_data) = self
            .memory
            .physical_ref(load_info.addr)
            .and_then(|source| source.get(..upload_size))
        else {
            return false;
        };
        let hash = compute_hash(&load_info, upload_data, use_new_hash);

        let Some(material) = self.custom_tex_manager.get_material(hash) else {
            return self.slot_surfaces[surface_id].is_custom();
        };
        if level != 0 && self.custom_tex_manager.skip_mipmaps() {
            return true;
        }

        self.slot_surfaces[surface_id]
            .flags
            .insert(SurfaceFlags::CUSTOM);

        match self.custom_tex_manager.decode(&material) {
            DecodeStatus::Ready => {
                self.apply_custom_upload(surface_id, &material, level);
                true
            }
            DecodeStatus::Pending => {
                log::debug!("Custom texture {:016X} is decoding", hash);
                self.pending_custom_uploads.push(PendingCustomUpload {
                    surface_id,
                    material,
                    level,
                });
                false
            }
        }
    }

    /// Upload a decoded material into a surface
    ///
    /// The first custom upload swaps the surface for one backed by a texture
    /// of the material; the previous surface is sentenced.
    fn apply_custom_upload(&mut self, surface_id: SurfaceId, material: &Arc<Material>, level: u32) {
        let surface = &self.slot_surfaces[surface_id];
        assert!(
            surface.flags.contains(SurfaceFlags::CUSTOM),
            "Surface {} is not suitable for custom upload",
            surface.params.debug_name()
        );

        if !surface.is_custom() {
            let params = surface.params;
            let texture = self.runtime.create_custom_texture(&params, material);
            let old = &self.slot_surfaces[surface_id];
            let mut custom = Surface::new(params, texture);
            custom.invalid_regions = old.invalid_regions.clone();
            custom.flags = old.flags;
            custom.modification_tick = old.modification_tick;
            custom.material = Some(Arc::clone(material));

            let old_id = self.slot_surfaces.swap_and_insert(surface_id, custom);
            self.slot_surfaces[old_id]
                .flags
                .remove(SurfaceFlags::REGISTERED);
            self.sentenced.push((old_id, self.frame_tick));
        }

        let surface = &mut self.slot_surfaces[surface_id];
        self.runtime.upload_custom(surface, material, level);
        if self.custom_tex_manager.skip_mipmaps() {
            self.runtime.generate_mipmaps(surface);
        }
        self.stats.custom_uploads += 1;
    }

    /// Complete custom uploads whose materials finished decoding
    pub(in crate::core::rasterizer_cache) fn process_pending_custom_uploads(&mut self) {
        let pending = std::mem::take(&mut self.pending_custom_uploads);
        for upload in pending {
            let alive = self
                .slot_surfaces
                .get(upload.surface_id)
                .is_some_and(|surface| surface.flags.contains(SurfaceFlags::CUSTOM));
            if !alive {
                log::debug!("Dropping custom upload of {:?}", upload.surface_id);
                continue;
            }
            if !self.custom_tex_manager.is_decoded(&upload.material) {
                self.pending_custom_uploads.push(upload);
                continue;
            }
            self.apply_custom_upload(upload.surface_id, &upload.material, upload.level);
        }
    }

    /// Encode `interval` of a surface back into guest memory
    ///
    /// Only the bytes of `interval` are written, even when the covering
    /// rectangle is larger.
    pub(in crate::core::rasterizer_cache) fn download_surface(
        &mut self,
        surface_id: SurfaceId,
        interval: Interval,
    ) {
        let surface = &self.slot_surfaces[surface_id];
        let flush_info = surface.params.from_interval(interval);
        let (flush_start, flush_end) = (interval.lower(), interval.upper());
        assert!(
            flush_start >= surface.params.addr && flush_end <= surface.params.end,
            "Download {:?} outside of {}",
            interval,
            surface.params.debug_name()
        );

        let convert = self.runtime.needs_conversion(surface.params.pixel_format);
        let bytes_per_pixel = surface.params.internal_bytes_per_pixel(convert) as usize;
        let mut staging = self.runtime.find_staging(
            flush_info.width as usize * flush_info.height as usize * bytes_per_pixel,
            false,
        );
        let download = BufferTextureCopy {
            buffer_offset: staging.offset,
            buffer_size: staging.size,
            texture_rect: surface.params.sub_rect(&flush_info),
            texture_level: surface.params.level_of(flush_start),
        };
        self.runtime.download(surface, &download, &mut staging);
        self.stats.downloads += 1;

        let region_size = (flush_info.end - flush_info.addr) as usize;
        let Some(dest) = self
            .memory
            .physical_ref(flush_info.addr)
            .and_then(|dest| dest.get_mut(..region_size))
        else {
            log::error!("Downloading {} to unmapped memory", flush_info.debug_name());
            return;
        };

        let mut encoded = dest.to_vec();
        encode_texture(&flush_info.layout(), &staging.mapped, &mut encoded, convert);

        let range =
            (flush_start - flush_info.addr) as usize..(flush_end - flush_info.addr) as usize;
        dest[range.clone()].copy_from_slice(&encoded[range]);
    }

    /// Write the fill pattern of a fill surface over `interval`
    ///
    /// The pattern phase is anchored at the start of the fill, so bytes
    /// before `interval` are left untouched.
    pub(in crate::core::rasterizer_cache) fn download_fill_surface(
        &mut self,
        surface_id: SurfaceId,
        interval: Interval,
    ) {
        let surface = &self.slot_surfaces[surface_id];
        let (flush_start, flush_end) = (interval.lower(), interval.upper());
        assert!(
            flush_start >= surface.params.addr && flush_end <= surface.params.end,
            "Fill download {:?} outside of {}",
            interval,
            surface.params.debug_name()
        );

        let fill_size = surface.fill_size.max(1) as usize;
        let fill_data = surface.fill_data;
        let start_offset = (flush_start - surface.params.addr) as usize;

        let Some(dest) = self.memory.physical_ref(flush_start) else {
            log::error!("Fill download to unmapped memory at {:#x}", flush_start);
            return;
        };
        let download_size = ((flush_end - flush_start) as usize).min(dest.len());
        for (i, byte) in dest[..download_size].iter_mut().enumerate() {
            *byte = fill_data[(start_offset + i) % fill_size];
        }
        self.stats.fill_downloads += 1;
    }

    /// Validate `interval` by reinterpreting a surface of equal bit depth
    ///
    /// Without a candidate, an interval owned by a GPU surface of a
    /// different stride is reported as validated: that pattern is texture
    /// aliasing by the guest and does not need the guest bytes.
    pub(in crate::core::rasterizer_cache) fn validate_by_reinterpretation(
        &mut self,
        surface_id: SurfaceId,
        params: &SurfaceParams,
        interval: Interval,
    ) -> bool {
        let reinterpret_match =
            self.find_match(params, MatchFlags::REINTERPRET, ScaleMatch::Ignore, Some(interval));
        if let Some((source_id, _)) = reinterpret_match.filter(|&(id, _)| id != surface_id) {
            let copy_interval = self.slot_surfaces[source_id].copyable_interval(params);
            if (copy_interval & interval).is_empty() {
                return false;
            }

            let (source, dest) = self.slot_surfaces.get_pair_mut(source_id, surface_id);
            if source.params.res_scale > dest.params.res_scale {
                dest.scale_up(&mut self.runtime, source.params.res_scale);
            }

            let addr = interval.lower();
            let copy_params = dest.params.from_interval(copy_interval);
            let src_rect = source.params.scaled_sub_rect(&copy_params);
            let dst_rect = dest.params.scaled_sub_rect(&copy_params);
            let reinterpret = TextureCopy {
                src_level: source.params.level_of(addr),
                dst_level: dest.params.level_of(addr),
                src_offset: Offset {
                    x: src_rect.left,
                    y: src_rect.bottom,
                },
                dst_offset: Offset {
                    x: dst_rect.left,
                    y: dst_rect.bottom,
                },
                extent: Extent {
                    width: src_rect.width(),
                    height: src_rect.height(),
                },
                ..Default::default()
            };
            self.stats.reinterpretations += 1;
            return self.runtime.reinterpret(source, dest, &reinterpret);
        }

        let stride = self.slot_surfaces[surface_id].params.stride;
        self.dirty_regions
            .find(interval)
            .and_then(|(_, owner_id)| self.slot_surfaces.get(owner_id))
            .is_some_and(|owner| owner.params.stride != stride)
    }

    /// Copy or clear `copy_interval` of `dest_id` from `source_id`
    ///
    /// # Panics
    ///
    /// Panics if `copy_interval` is not a sub-surface of the destination.
    pub(in crate::core::rasterizer_cache) fn copy_surface(
        &mut self,
        source_id: SurfaceId,
        dest_id: SurfaceId,
        copy_interval: Interval,
    ) {
        let copy_addr = copy_interval.lower();
        let (source, dest) = self.slot_surfaces.get_pair_mut(source_id, dest_id);
        let subrect_params = dest.params.from_interval(copy_interval);
        assert_eq!(
            subrect_params.interval(),
            copy_interval,
            "Copy interval does not describe a sub-surface of {}",
            dest.params.debug_name()
        );
        self.stats.surface_copies += 1;

        if source.params.surface_type == SurfaceType::Fill {
            let clear = TextureClear {
                texture_level: dest.params.level_of(copy_addr),
                texture_rect: dest.params.scaled_sub_rect(&subrect_params),
                value: source.make_clear_value(copy_addr, dest.params.pixel_format),
            };
            self.runtime.clear_texture(dest, &clear);
            return;
        }

        let src_scale = source.params.res_scale;
        let dst_scale = dest.params.res_scale;
        if src_scale > dst_scale {
            dest.scale_up(&mut self.runtime, src_scale);
        }

        let src_rect = source.params.scaled_sub_rect(&subrect_params);
        let dst_rect = dest.params.scaled_sub_rect(&subrect_params);
        let src_level = source.params.level_of(copy_addr);
        let dst_level = dest.params.level_of(copy_addr);

        if src_scale == dst_scale {
            let copy = TextureCopy {
                src_level,
                dst_level,
                src_offset: Offset {
                    x: src_rect.left,
                    y: src_rect.bottom,
                },
                dst_offset: Offset {
                    x: dst_rect.left,
                    y: dst_rect.bottom,
                },
                extent: Extent {
                    width: src_rect.width(),
                    height: src_rect.height(),
                },
                ..Default::default()
            };
            self.runtime.copy_textures(source, dest, &[copy]);
        } else {
            let blit = TextureBlit {
                src_level,
                dst_level,
                src_rect,
                dst_rect,
                ..Default::default()
            };
            self.runtime.blit_textures(source, dest, &blit);
        }
    }

    /// Write GPU-owned bytes of `[addr, addr + size)` back to guest memory
    ///
    /// With `owner` set, only regions owned by that surface are flushed.
    /// Requests of at most [`SMALL_WRITE_THRESHOLD`] bytes flush the whole
    /// dirty region they touch.
    ///
    /// [`SMALL_WRITE_THRESHOLD`]: super::SMALL_WRITE_THRESHOLD
    pub fn flush_region(&mut self, addr: u32, size: u32, owner: Option<SurfaceId>) {
        if size == 0 {
            return;
        }

        let flush_interval = byte_interval(addr, size);
        let regions: SmallVec<[(Interval, SurfaceId); 4]> = self
            .dirty_regions
            .overlapping(flush_interval)
            .filter(|&(_, surface_id)| owner.map_or(true, |owner| owner == surface_id))
            .collect();

        let mut flushed_intervals = IntervalSet::new();
        for (region, surface_id) in regions {
            let interval = if size <= SMALL_WRITE_THRESHOLD {
                region
            } else {
                region & flush_interval
            };

            let surface = &self.slot_surfaces[surface_id];
            assert!(
                surface.is_region_valid(interval),
                "Region owner {} has invalid regions",
                surface.params.debug_name()
            );
            log::trace!(
                "Flushing {:?} of {}",
                interval,
                surface.params.debug_name()
            );

            flushed_intervals.insert(interval);
            if surface.params.surface_type == SurfaceType::Fill {
                self.download_fill_surface(surface_id, interval);
                continue;
            }

            let start_level = surface.params.level_of(interval.lower());
            let end_level = surface.params.level_of(interval.upper());
            for level in start_level..=end_level {
                let level_interval = self.slot_surfaces[surface_id].params.level_interval(level);
                let download_interval = interval & level_interval;
                if download_interval.is_empty() {
                    continue;
                }
                self.download_surface(surface_id, download_interval);
            }
        }

        self.dirty_regions.erase_set(&flushed_intervals);
    }

    /// Write every GPU-owned byte back to guest memory
    pub fn flush_all(&mut self) {
        self.flush_region(0, u32::MAX, None);
    }

    /// Mark `[addr, addr + size)` as modified
    ///
    /// With `owner` set, the owner becomes valid over the range and owns it;
    /// every other overlapping surface becomes stale there. Without an
    /// owner the range was written by the CPU: guest memory owns it again,
    /// and writes of at most [`SMALL_WRITE_THRESHOLD`] bytes flush and evict
    /// the overlapping surfaces, unless `skip_cpu_write` is set.
    ///
    /// Surfaces left fully invalid are unregistered.
    ///
    /// # Panics
    ///
    /// Panics if the owner is a texture, does not contain the range or has
    /// a gapped layout.
    ///
    /// [`SMALL_WRITE_THRESHOLD`]: super::SMALL_WRITE_THRESHOLD
    pub fn invalidate_region(&mut self, addr: u32, size: u32, owner: Option<SurfaceId>) {
        if size == 0 {
            return;
        }

        let invalid_interval = byte_interval(addr, size);
        if let Some(owner_id) = owner {
            let region_owner = &mut self.slot_surfaces[owner_id];
            assert!(
                region_owner.params.surface_type != SurfaceType::Texture,
                "Texture surface {} cannot own a region",
                region_owner.params.debug_name()
            );
            assert!(
                invalid_interval.lower() >= region_owner.params.addr
                    && invalid_interval.upper() <= region_owner.params.end,
                "Region {:?} outside of owner {}",
                invalid_interval,
                region_owner.params.debug_name()
            );
            assert_eq!(
                region_owner.params.width, region_owner.params.stride,
                "Region owner must not have gaps"
            );
            region_owner.mark_valid(invalid_interval);
        }

        let mut remove_surfaces: SmallVec<[SurfaceId; 4]> = SmallVec::new();
        for surface_id in self.collect_surfaces_in_region(addr, size) {
            if Some(surface_id) == owner {
                continue;
            }

            // Small CPU writes evict the surface so its pages become uncached
            if owner.is_none() && size <= SMALL_WRITE_THRESHOLD {
                if self.settings.skip_cpu_write {
                    continue;
                }
                let (surface_addr, surface_size) = {
                    let params = &self.slot_surfaces[surface_id].params;
                    (params.addr, params.size)
                };
                self.flush_region(surface_addr, surface_size, Some(surface_id));
                remove_surfaces.push(surface_id);
                continue;
            }

            let surface = &mut self.slot_surfaces[surface_id];
            let interval = surface.params.interval() & invalid_interval;
            surface.mark_invalid(interval);
            if surface.is_fully_invalid() {
                remove_surfaces.push(surface_id);
            }
        }

        match owner {
            Some(owner_id) => self.dirty_regions.set(invalid_interval, owner_id),
            None => self.dirty_regions.erase(invalid_interval),
        }

        for surface_id in remove_surfaces {
            self.unregister_surface(surface_id);
        }
    }

    /// Drop every cached region
    ///
    /// With `flush` set, dirty regions are written back first. Every cached
    /// page is unmarked; registered surfaces are sentenced (fill surfaces
    /// erased) without being looked at.
    pub fn clear_all(&mut self, flush: bool) {
        if flush {
            self.flush_all();
        }

        let cached: SmallVec<[Interval; 8]> = self
            .cached_pages
            .overlapping(Interval::new(0, u32::MAX))
            .map(|(pages, _)| pages)
            .collect();
        for pages in cached {
            let (start, size) = page_run_bytes(pages);
            self.memory.rasterizer_mark_region_cached(start, size, false);
        }

        let registered: Vec<(SurfaceId, SurfaceType)> = self
            .slot_surfaces
            .iter()
            .filter(|(_, surface)| surface.flags.contains(SurfaceFlags::REGISTERED))
            .map(|(surface_id, surface)| (surface_id, surface.params.surface_type))
            .collect();
        for (surface_id, surface_type) in registered {
            if surface_type == SurfaceType::Fill {
                self.slot_surfaces.erase(surface_id);
                continue;
            }
            self.slot_surfaces[surface_id]
                .flags
                .remove(SurfaceFlags::REGISTERED);
            self.sentenced.push((surface_id, self.frame_tick));
        }

        self.cached_pages = IntervalCounter::new();
        self.dirty_regions.clear();
        self.page_table.clear();
    }
}
