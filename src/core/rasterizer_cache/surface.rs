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

//! Cached surfaces
//!
//! A surface pairs its [`SurfaceParams`] with the validity bookkeeping of
//! the cache and the backend texture holding its pixels.

use std::sync::Arc;

use super::surface_params::SurfaceParams;
use super::types::SurfaceFlags;
use crate::core::common::{align_down, align_up};
use crate::core::custom_tex::Material;
use crate::core::interval::{Interval, IntervalSet};
use crate::core::pica::{PixelFormat, SurfaceType};
use crate::core::runtime::{ClearValue, Runtime};
use crate::core::texture::lookup_texel;

/// Surface cached by the rasterizer cache
///
/// # Validity
///
/// `invalid_regions` holds the byte ranges whose texture content is stale
/// relative to guest memory. Every change to it bumps
/// `modification_tick`, which texture cubes use to detect face updates.
#[derive(Debug)]
pub struct Surface<T> {
    pub params: SurfaceParams,
    pub invalid_regions: IntervalSet,
    pub flags: SurfaceFlags,
    pub modification_tick: u64,
    /// Fill pattern, valid for `SurfaceType::Fill`
    pub fill_data: [u8; 4],
    pub fill_size: u32,
    /// Replacement material of a custom surface
    pub material: Option<Arc<Material>>,
    pub texture: T,
}

impl<T> Surface<T> {
    /// Create a surface without any invalid region
    pub fn new(params: SurfaceParams, texture: T) -> Self {
        Self {
            params,
            invalid_regions: IntervalSet::new(),
            flags: SurfaceFlags::empty(),
            modification_tick: 1,
            fill_data: [0; 4],
            fill_size: 0,
            material: None,
            texture,
        }
    }

    /// Mark `interval` as matching guest memory
    pub fn mark_valid(&mut self, interval: Interval) {
        self.invalid_regions.erase(interval);
        self.modification_tick += 1;
    }

    /// Mark `interval` as stale
    pub fn mark_invalid(&mut self, interval: Interval) {
        self.invalid_regions.insert(interval);
        self.modification_tick += 1;
    }

    /// True when no byte of `interval` is stale
    pub fn is_region_valid(&self, interval: Interval) -> bool {
        !self.invalid_regions.overlaps(interval)
    }

    /// True when the whole surface is stale
    pub fn is_fully_invalid(&self) -> bool {
        self.invalid_regions.first() == Some(self.params.interval())
    }

    /// True when the surface carries a custom replacement
    pub fn is_custom(&self) -> bool {
        self.flags.contains(SurfaceFlags::CUSTOM) && self.material.is_some()
    }

    /// True when the surface touches `[addr, addr + size)`
    pub fn overlaps(&self, addr: u32, size: u32) -> bool {
        let end = addr as u64 + size as u64;
        (self.params.addr as u64) < end && addr < self.params.end
    }

    /// Upscale the backing texture
    ///
    /// The resolution scale of a surface only ever grows; smaller or equal
    /// scales are ignored.
    pub fn scale_up<R: Runtime<Texture = T>>(&mut self, runtime: &mut R, new_scale: u32) {
        if new_scale <= self.params.res_scale {
            return;
        }
        runtime.scale_up(self, new_scale);
        self.params.res_scale = new_scale;
    }

    /// True when this fill surface can clear `dest` over `fill_interval`
    ///
    /// The fill pattern must repeat with the pixel size of the destination
    /// format, so that every destination pixel receives the same value.
    pub fn can_fill(&self, dest: &SurfaceParams, fill_interval: Interval) -> bool {
        if self.params.surface_type != SurfaceType::Fill
            || !self.is_region_valid(fill_interval)
            || fill_interval.lower() < self.params.addr
            || fill_interval.upper() > self.params.end
            || dest.from_interval(fill_interval).interval() != fill_interval
        {
            return false;
        }

        let fill_size = self.fill_size as usize;
        let dest_bpp = dest.format_bpp();
        if self.fill_size * 8 != dest_bpp {
            // Check that the fill pattern repeats every destination pixel
            let dest_bytes_per_pixel = (dest_bpp / 8).max(1) as usize;
            let mut fill_test = vec![0u8; fill_size * dest_bytes_per_pixel];
            for chunk in fill_test.chunks_exact_mut(fill_size.max(1)) {
                chunk.copy_from_slice(&self.fill_data[..fill_size]);
            }

            let first = &fill_test[..dest_bytes_per_pixel];
            for pixel in fill_test.chunks_exact(dest_bytes_per_pixel).skip(1) {
                if pixel != first {
                    return false;
                }
            }

            if dest_bpp == 4 && (fill_test[0] & 0xF) != (fill_test[0] >> 4) {
                return false;
            }
        }
        true
    }

    /// True when this surface can validate `dest` over `copy_interval`
    ///
    /// # Panics
    ///
    /// Panics if `copy_interval` is not the interval of a sub-surface of `dest`.
    pub fn can_copy(&self, dest: &SurfaceParams, copy_interval: Interval) -> bool {
        let subrect_params = dest.from_interval(copy_interval);
        assert_eq!(
            subrect_params.interval(),
            copy_interval,
            "Copy interval does not describe a sub-surface"
        );
        if self.params.can_sub_rect(&subrect_params) {
            return true;
        }
        self.can_fill(dest, copy_interval)
    }

    /// Largest valid interval of this surface that maps onto a rectangle of `params`
    ///
    /// Valid bytes are rounded inwards to whole tiles and then to whole
    /// rows. When the valid range spans parts of two rows that do not form a
    /// rectangle, the longer row is used.
    pub fn copyable_interval(&self, params: &SurfaceParams) -> Interval {
        let mut result = Interval::default();
        let tile_align = params.bytes_in_pixels(if params.is_tiled { 64 } else { 1 }).max(1);
        let stride_bytes =
            (params.bytes_in_pixels(params.stride) * if params.is_tiled { 8 } else { 1 }).max(1);

        let mut valid_regions = IntervalSet::from(params.interval() & self.params.interval());
        valid_regions.erase_set(&self.invalid_regions);

        for valid in valid_regions.iter() {
            if tile_align > valid.length() {
                continue;
            }
            let aligned_lower = params.addr + align_up(valid.lower() - params.addr, tile_align);
            let aligned_upper = params.addr + align_down(valid.upper() - params.addr, tile_align);
            if aligned_upper <= aligned_lower {
                continue;
            }
            let aligned = Interval::new(aligned_lower, aligned_upper);

            let rect_lower = params.addr + align_up(aligned_lower - params.addr, stride_bytes);
            let rect_upper = params.addr + align_down(aligned_upper - params.addr, stride_bytes);

            let rect_interval = if rect_lower > rect_upper {
                // Inside a single row
                aligned
            } else if rect_lower == rect_upper {
                // Two partial rows
                let row1 = Interval::new(aligned_lower, rect_lower);
                let row2 = Interval::new(rect_lower, aligned_upper);
                if row1.length() > row2.length() {
                    row1
                } else {
                    row2
                }
            } else {
                Interval::new(rect_lower, rect_upper)
            };

            if rect_interval.length() > result.length() {
                result = rect_interval;
            }
        }
        result
    }

    /// Fill pattern replicated over the bytes starting at `addr`
    ///
    /// The pattern phase is anchored at the start of the fill surface.
    pub fn make_fill_buffer(&self, addr: u32) -> [u8; 4] {
        let mut buffer = [0u8; 4];
        let fill_size = self.fill_size.max(1);
        let offset = addr.wrapping_sub(self.params.addr);
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = self.fill_data[((offset + i as u32) % fill_size) as usize];
        }
        buffer
    }

    /// Clear value equivalent to the fill pattern at `addr` in `dest_format`
    pub fn make_clear_value(&self, addr: u32, dest_format: PixelFormat) -> ClearValue {
        let fill_buffer = self.make_fill_buffer(addr);
        let mut value = ClearValue::default();

        match dest_format.surface_type() {
            SurfaceType::Color | SurfaceType::Texture | SurfaceType::Fill => {
                let texel = lookup_texel(dest_format, &fill_buffer, 0, 0);
                value.color = texel.map(|channel| channel as f32 / 255.0);
            }
            SurfaceType::Depth => {
                let depth = if dest_format == PixelFormat::D16 {
                    u16::from_le_bytes([fill_buffer[0], fill_buffer[1]]) as f32 / 65535.0
                } else {
                    let raw =
                        u32::from_le_bytes([fill_buffer[0], fill_buffer[1], fill_buffer[2], 0]);
                    raw as f32 / 16_777_215.0
                };
                value.depth = depth;
            }
            SurfaceType::DepthStencil => {
                let raw = u32::from_le_bytes(fill_buffer);
                value.depth = (raw & 0xFF_FFFF) as f32 / 16_777_215.0;
                value.stencil = (raw >> 24) as u8;
            }
            SurfaceType::Invalid => {
                log::error!("Unable to make clear value for {}", dest_format.name());
            }
        }
        value
    }
}
