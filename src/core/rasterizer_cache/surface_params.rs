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

//! Surface geometry
//!
//! `SurfaceParams` describes where a surface lives in guest memory and how
//! its pixels are laid out. All address arithmetic of the cache goes through
//! this type: byte sizes, mip level offsets, the rectangle covered by a byte
//! interval and the byte interval covered by a rectangle.
//!
//! # Layout
//!
//! Linear surfaces store rows bottom to top with `stride` pixels per row.
//! Tiled surfaces store 8x8 tiles, tile rows top to bottom, with the pixels
//! of a tile in Morton order. A tile row is `stride * 8` pixels long.
//!
//! Rectangles use a bottom-left origin in unscaled pixels unless the method
//! name says `scaled`.

use super::types::MAX_PICA_LEVELS;
use crate::core::common::{align_down, align_up, PAddr, Rectangle};
use crate::core::interval::Interval;
use crate::core::pica::{PixelFormat, SurfaceType, TextureType};
use crate::core::texture::{internal_bytes_per_pixel, TextureLayout};

/// Placement and layout of a surface in guest memory
///
/// Equality compares every field, including the scale. Two params compare
/// equal only when a surface created for one can serve the other verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceParams {
    pub addr: PAddr,
    /// One past the last byte, always `addr + size`
    pub end: PAddr,
    pub size: u32,
    pub width: u32,
    pub height: u32,
    /// Row length in pixels
    pub stride: u32,
    pub levels: u32,
    pub is_tiled: bool,
    pub texture_type: TextureType,
    pub pixel_format: PixelFormat,
    pub surface_type: SurfaceType,
    pub res_scale: u32,
    /// Absolute start address of every mip level
    pub mipmap_offsets: [PAddr; MAX_PICA_LEVELS],
}

impl Default for SurfaceParams {
    fn default() -> Self {
        Self {
            addr: 0,
            end: 0,
            size: 0,
            width: 0,
            height: 0,
            stride: 0,
            levels: 1,
            is_tiled: false,
            texture_type: TextureType::Texture2D,
            pixel_format: PixelFormat::Invalid,
            surface_type: SurfaceType::Invalid,
            res_scale: 1,
            mipmap_offsets: [0; MAX_PICA_LEVELS],
        }
    }
}

impl SurfaceParams {
    /// Recompute the derived fields
    ///
    /// Defaults the stride to the width, derives the surface type from the
    /// pixel format and recomputes the mip offsets, `size` and `end`.
    ///
    /// # Panics
    ///
    /// Panics if a multi-level surface has `stride != width` or more than
    /// [`MAX_PICA_LEVELS`] levels.
    ///
    /// # Example
    ///
    /// ```
    /// use pica_cache::core::pica::PixelFormat;
    /// use pica_cache::core::rasterizer_cache::SurfaceParams;
    ///
    /// let mut params = SurfaceParams {
    ///     addr: 0x1800_0000,
    ///     width: 64,
    ///     height: 64,
    ///     levels: 2,
    ///     is_tiled: true,
    ///     pixel_format: PixelFormat::RGBA8,
    ///     ..Default::default()
    /// };
    /// params.update_params();
    ///
    /// assert_eq!(params.size, 64 * 64 * 4 + 32 * 32 * 4);
    /// assert_eq!(params.mipmap_offsets[1], 0x1800_0000 + 64 * 64 * 4);
    /// ```
    pub fn update_params(&mut self) {
        if self.stride == 0 {
            self.stride = self.width;
        }
        self.surface_type = self.pixel_format.surface_type();

        if self.levels != 1 {
            assert!(
                self.stride == self.width,
                "Mipmapped surface must be tightly packed"
            );
            assert!(
                self.levels as usize <= MAX_PICA_LEVELS,
                "Surface has {} levels",
                self.levels
            );
            let mut offset = self.addr;
            let mut size = 0;
            for level in 0..self.levels {
                let level_size =
                    self.bytes_in_pixels((self.width >> level) * (self.height >> level));
                self.mipmap_offsets[level as usize] = offset;
                offset = offset.wrapping_add(level_size);
                size += level_size;
            }
            self.size = size;
        } else {
            self.mipmap_offsets[0] = self.addr;
            self.size = if self.width == 0 || self.height == 0 {
                0
            } else if self.is_tiled {
                let tile_rows = (self.height / 8).saturating_sub(1);
                self.bytes_in_pixels(self.stride * 8 * tile_rows + self.width * 8)
            } else {
                self.bytes_in_pixels(self.stride * (self.height - 1) + self.width)
            };
        }
        self.end = self.addr.wrapping_add(self.size);
    }

    /// Bits per pixel of the pixel format
    #[inline(always)]
    pub fn format_bpp(&self) -> u32 {
        self.pixel_format.bpp()
    }

    /// Guest bytes occupied by `pixels` pixels
    #[inline(always)]
    pub fn bytes_in_pixels(&self, pixels: u32) -> u32 {
        (pixels as u64 * self.format_bpp() as u64 / 8) as u32
    }

    /// Pixels stored in `bytes` guest bytes
    #[inline(always)]
    pub fn pixels_in_bytes(&self, bytes: u32) -> u32 {
        match self.format_bpp() {
            0 => 0,
            bpp => (bytes as u64 * 8 / bpp as u64) as u32,
        }
    }

    /// Guest byte range of the surface
    #[inline(always)]
    pub fn interval(&self) -> Interval {
        Interval::new(self.addr, self.end)
    }

    /// Width multiplied by the resolution scale
    #[inline(always)]
    pub fn scaled_width(&self) -> u32 {
        self.width * self.res_scale
    }

    /// Height multiplied by the resolution scale
    #[inline(always)]
    pub fn scaled_height(&self) -> u32 {
        self.height * self.res_scale
    }

    /// Unscaled rectangle of a mip level
    pub fn rect(&self, level: u32) -> Rectangle<u32> {
        Rectangle::new(0, self.height >> level, self.width >> level, 0)
    }

    /// Scaled rectangle of a mip level
    pub fn scaled_rect(&self, level: u32) -> Rectangle<u32> {
        Rectangle::new(0, self.scaled_height() >> level, self.scaled_width() >> level, 0)
    }

    /// Mip level containing `level_addr`
    ///
    /// Addresses outside the surface map to level 0.
    pub fn level_of(&self, level_addr: PAddr) -> u32 {
        if level_addr < self.addr || level_addr > self.end {
            return 0;
        }
        let mut level = self.levels.saturating_sub(1);
        while level > 0 && self.mipmap_offsets[level as usize] > level_addr {
            level -= 1;
        }
        level
    }

    /// Guest byte range of a mip level
    pub fn level_interval(&self, level: u32) -> Interval {
        let start = self.mipmap_offsets[level as usize];
        let end = if level + 1 >= self.levels {
            self.end
        } else {
            self.mipmap_offsets[level as usize + 1]
        };
        Interval::new(start, end)
    }

    /// Smallest sub-surface of this surface covering `interval`
    ///
    /// Multi-row intervals are widened to whole (tile) rows. An interval
    /// inside a single row is widened to whole tiles and described as a
    /// one-row surface. A level smaller than one tile row is returned whole
    /// with its own size. The result always has a single level and never
    /// leaves the level containing `interval`.
    ///
    /// # Arguments
    ///
    /// * `interval` - Byte range inside one mip level of this surface
    ///
    /// # Returns
    ///
    /// Params of the sub-surface, at this surface's resolution scale
    pub fn from_interval(&self, interval: Interval) -> SurfaceParams {
        let mut params = *self;
        let level = self.level_of(interval.lower());
        let level_interval = self.level_interval(level);
        let level_start = level_interval.lower();

        params.width = (self.width >> level).max(1);
        params.stride = (self.stride >> level).max(1);
        params.height = (self.height >> level).max(1);
        params.levels = 1;

        let tiled_size = if self.is_tiled { 8 } else { 1 };
        // Sub-tile mips of tiled textures
        if params.height < tiled_size {
            params.addr = level_start;
            params.update_params();
            return params;
        }

        let stride_tiled_bytes = self.bytes_in_pixels(params.stride * tiled_size).max(1);
        let start_offset = interval.lower() - level_start;
        let end_offset = interval.upper() - level_start;

        let aligned_start = level_start + align_down(start_offset, stride_tiled_bytes);
        let aligned_end = (level_start + align_up(end_offset, stride_tiled_bytes))
            .min(level_interval.upper());

        if aligned_end - aligned_start > stride_tiled_bytes {
            params.addr = aligned_start;
            params.height =
                (aligned_end - aligned_start) / self.bytes_in_pixels(params.stride).max(1);
        } else {
            let tile_alignment = self.bytes_in_pixels(if self.is_tiled { 64 } else { 1 }).max(1);
            let aligned_start = level_start + align_down(start_offset, tile_alignment);
            let aligned_end =
                (level_start + align_up(end_offset, tile_alignment)).min(level_interval.upper());
            params.addr = aligned_start;
            params.width = (self.pixels_in_bytes(aligned_end - aligned_start) / tiled_size).max(1);
            params.stride = params.width;
            params.height = tiled_size;
        }

        params.update_params();
        params
    }

    /// Byte range covered by an unscaled rectangle of a mip level
    ///
    /// Tiled surfaces round the rectangle out to whole tiles.
    pub fn sub_rect_interval(&self, rect: Rectangle<u32>, level: u32) -> Interval {
        if rect.width() == 0 || rect.height() == 0 {
            return Interval::default();
        }

        let mut rect = rect;
        if self.is_tiled {
            rect.left = align_down(rect.left, 8) * 8;
            rect.bottom = align_down(rect.bottom, 8) / 8;
            rect.right = align_up(rect.right, 8) * 8;
            rect.top = align_up(rect.top, 8) / 8;
        }

        let stride_lod = self.stride >> level;
        let stride_tiled = if self.is_tiled { stride_lod * 8 } else { stride_lod };
        let first_row = if self.is_tiled {
            ((self.height >> level) / 8).saturating_sub(rect.top)
        } else {
            rect.bottom
        };
        let pixel_offset = stride_tiled * first_row + rect.left;
        let pixels = (rect.height() - 1) * stride_tiled + rect.width();

        let level_start = self.mipmap_offsets[level as usize];
        Interval::new(
            level_start + self.bytes_in_pixels(pixel_offset),
            level_start + self.bytes_in_pixels(pixel_offset + pixels),
        )
    }

    /// Unscaled rectangle `sub_surface` occupies inside this surface
    pub fn sub_rect(&self, sub_surface: &SurfaceParams) -> Rectangle<u32> {
        let level = self.level_of(sub_surface.addr);
        let level_offset = sub_surface.addr.saturating_sub(self.mipmap_offsets[level as usize]);
        let begin_pixel_index = self.pixels_in_bytes(level_offset);
        let stride_lod = (self.stride >> level).max(1);
        let height_lod = self.height >> level;

        if self.is_tiled {
            let x0 = (begin_pixel_index % (stride_lod * 8)) / 8;
            let y0 = (begin_pixel_index / (stride_lod * 8)) * 8;
            // Tile rows run top to bottom
            return Rectangle::new(
                x0,
                height_lod.saturating_sub(y0),
                x0 + sub_surface.width,
                height_lod.saturating_sub(y0 + sub_surface.height),
            );
        }

        let x0 = begin_pixel_index % stride_lod;
        let y0 = begin_pixel_index / stride_lod;
        Rectangle::new(x0, y0 + sub_surface.height, x0 + sub_surface.width, y0)
    }

    /// [`sub_rect`](Self::sub_rect) multiplied by the resolution scale
    pub fn scaled_sub_rect(&self, sub_surface: &SurfaceParams) -> Rectangle<u32> {
        self.sub_rect(sub_surface) * self.res_scale
    }

    /// Same placement, dimensions and format, with at least as many levels
    pub fn exact_match(&self, other: &SurfaceParams) -> bool {
        other.addr == self.addr
            && other.width == self.width
            && other.height == self.height
            && other.stride == self.stride
            && other.pixel_format == self.pixel_format
            && other.is_tiled == self.is_tiled
            && self.pixel_format != PixelFormat::Invalid
            && self.levels >= other.levels
    }

    /// True when `sub_surface` is a rectangle inside one level of this surface
    pub fn can_sub_rect(&self, sub_surface: &SurfaceParams) -> bool {
        let level = self.level_of(sub_surface.addr);
        let tile_bytes = self.bytes_in_pixels(if self.is_tiled { 64 } else { 1 }).max(1);
        let row_limit = if self.is_tiled { 8 } else { 1 };

        sub_surface.addr >= self.addr
            && sub_surface.end <= self.end
            && sub_surface.pixel_format == self.pixel_format
            && self.pixel_format != PixelFormat::Invalid
            && sub_surface.is_tiled == self.is_tiled
            && (sub_surface.addr - self.mipmap_offsets[level as usize]) % tile_bytes == 0
            && (sub_surface.stride == (self.stride >> level) || sub_surface.height <= row_limit)
            && self.sub_rect(sub_surface).right <= (self.stride >> level)
    }

    /// True when `other` lies inside this surface with the same bit depth
    pub fn can_reinterpret(&self, other: &SurfaceParams) -> bool {
        let tile_bytes = self.bytes_in_pixels(if self.is_tiled { 64 } else { 1 }).max(1);
        let row_limit = if self.is_tiled { 8 } else { 1 };

        other.addr >= self.addr
            && other.end <= self.end
            && self.pixel_format != PixelFormat::Invalid
            && self.format_bpp() == other.format_bpp()
            && other.is_tiled == self.is_tiled
            && (other.addr - self.addr) % tile_bytes == 0
            && (other.stride == self.stride || other.height <= row_limit)
            && self.sub_rect(other).right <= self.stride
    }

    /// True when this surface and `expanded` can be merged into one
    pub fn can_expand(&self, expanded: &SurfaceParams) -> bool {
        let row_bytes = self.bytes_in_pixels(self.stride * if self.is_tiled { 8 } else { 1 });
        self.pixel_format != PixelFormat::Invalid
            && self.pixel_format == expanded.pixel_format
            && self.addr <= expanded.end
            && expanded.addr <= self.end
            && self.is_tiled == expanded.is_tiled
            && self.stride == expanded.stride
            && row_bytes != 0
            && (expanded.addr.max(self.addr) - expanded.addr.min(self.addr)) % row_bytes == 0
    }

    /// True when this surface can source a texture copy described in bytes
    ///
    /// `texcopy` carries byte widths and strides. A copy with
    /// `width != stride` must walk whole tiles inside one tile row; a
    /// contiguous copy must map onto a rectangle of this surface.
    pub fn can_tex_copy(&self, texcopy: &SurfaceParams) -> bool {
        if self.pixel_format == PixelFormat::Invalid
            || self.addr > texcopy.addr
            || self.end < texcopy.end
        {
            return false;
        }

        if texcopy.width != texcopy.stride {
            let tile_stride = self.bytes_in_pixels(self.stride * if self.is_tiled { 8 } else { 1 });
            let tile_bytes = self.bytes_in_pixels(if self.is_tiled { 64 } else { 1 }).max(1);
            if tile_stride == 0 {
                return false;
            }
            let offset = texcopy.addr - self.addr;
            return offset % tile_bytes == 0
                && texcopy.width % tile_bytes == 0
                && (texcopy.height == 1 || texcopy.stride == tile_stride)
                && (offset % tile_stride) + texcopy.width <= tile_stride;
        }

        let copy_interval = texcopy.interval();
        self.from_interval(copy_interval).interval() == copy_interval
    }

    /// Host bytes per pixel when stored by a backend
    pub fn internal_bytes_per_pixel(&self, convert: bool) -> u32 {
        internal_bytes_per_pixel(self.pixel_format, convert)
    }

    /// Guest layout of the surface for the texture codec
    pub fn layout(&self) -> TextureLayout {
        TextureLayout {
            width: self.width,
            height: self.height,
            stride: self.stride,
            format: self.pixel_format,
            is_tiled: self.is_tiled,
        }
    }

    /// Short description used in logs
    pub fn debug_name(&self) -> String {
        format!(
            "{:?} {}x{} {} {} levels at {:#x}-{:#x} scale {}{}",
            self.surface_type,
            self.width,
            self.height,
            self.pixel_format.name(),
            self.levels,
            self.addr,
            self.end,
            self.res_scale,
            if self.is_tiled { " tiled" } else { "" }
        )
    }
}
