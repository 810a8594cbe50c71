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

//! Accelerated memory transfers
//!
//! Texture copies, display transfers and memory fills issued by the guest
//! are performed on cached surfaces when possible. Each operation returns
//! `false` when it cannot be accelerated, in which case the caller performs
//! it in software on guest memory.
//!
//! # Texture copy units
//!
//! Texture copy sizes, widths and gaps are given in 16 byte units and the
//! copy size is aligned down to 16 bytes. A gap of zero, or a width at
//! least as large as the copy, describes a contiguous copy.

use std::mem::swap;

use super::policy::AcceleratedOp;
use super::surface::Surface;
use super::surface_params::SurfaceParams;
use super::types::ScaleMatch;
use super::{RasterizerCache, SurfaceId};
use crate::core::common::align_down;
use crate::core::custom_tex::CustomTexManager;
use crate::core::memory::GuestMemory;
use crate::core::pica::{
    check_formats_blittable, DisplayTransferConfig, MemoryFillConfig, PixelFormat, ScalingMode,
    SurfaceType,
};
use crate::core::runtime::{Extent, Offset, Runtime, TextureBlit, TextureCopy};

/// Resolution scale of fill surfaces, above every real scale
const FILL_RES_SCALE: u32 = u16::MAX as u32;

/// Destinations smaller than this stay at native scale under the upscaling hack
const UPSCALING_HACK_MIN_WIDTH: u32 = 240;
const UPSCALING_HACK_MIN_HEIGHT: u32 = 400;

/// Line width and gap of one side of a texture copy, in bytes
///
/// # Returns
///
/// `None` when the configuration cannot describe a copy of `copy_size` bytes
fn tex_copy_line(width_units: u32, gap_units: u32, copy_size: u32) -> Option<(u32, u32)> {
    let mut width = width_units * 16;
    let mut gap = gap_units * 16;
    if width == 0 && gap != 0 {
        return None;
    }
    if gap == 0 || width >= copy_size {
        width = copy_size;
        gap = 0;
    }
    (copy_size % width == 0).then_some((width, gap))
}

impl<R: Runtime, M: GuestMemory, C: CustomTexManager> RasterizerCache<R, M, C> {
    /// Perform a raw texture copy on cached surfaces
    ///
    /// # Returns
    ///
    /// `true` when the copy was performed on the GPU. A copy whose source
    /// is not cached returns the `skip_texture_copy` setting.
    pub fn accelerate_texture_copy(&mut self, config: &DisplayTransferConfig) -> bool {
        log::trace!("Texture copy {}", config.debug_name());

        let copy_size = align_down(config.texture_copy.size, 16);
        if copy_size == 0 {
            return false;
        }
        let Some((input_width, input_gap)) =
            tex_copy_line(config.texture_copy.input_width, config.texture_copy.input_gap, copy_size)
        else {
            return false;
        };
        let Some((output_width, output_gap)) = tex_copy_line(
            config.texture_copy.output_width,
            config.texture_copy.output_gap,
            copy_size,
        ) else {
            return false;
        };

        // Widths and strides of the source are in bytes
        let mut src_params = SurfaceParams {
            addr: config.input_address,
            stride: input_width + input_gap,
            width: input_width,
            height: copy_size / input_width,
            ..Default::default()
        };
        src_params.size = (src_params.height - 1) * src_params.stride + src_params.width;
        src_params.end = src_params.addr.saturating_add(src_params.size);

        let Some((src_id, src_rect)) = self.get_tex_copy_surface(&src_params) else {
            return self.settings.skip_texture_copy;
        };

        let src_info = self.slot_surfaces[src_id].params;
        let tiled_size = if src_info.is_tiled { 8 } else { 1 };
        let tile_bytes = src_info.bytes_in_pixels(if src_info.is_tiled { 64 } else { 1 }).max(1);
        if output_gap != 0
            && (output_width
                != src_info.bytes_in_pixels(src_rect.width() / src_info.res_scale) * tiled_size
                || output_gap % tile_bytes != 0)
        {
            return false;
        }

        let mut dst_params = src_info;
        dst_params.addr = config.output_address;
        dst_params.width = src_rect.width() / src_info.res_scale;
        dst_params.stride = dst_params.width
            + src_info.pixels_in_bytes(if src_info.is_tiled { output_gap / 8 } else { output_gap });
        dst_params.height = src_rect.height() / src_info.res_scale;
        dst_params.levels = 1;
        dst_params.res_scale = if self.settings.upscaling_hack
            && src_info.res_scale > 1
            && (dst_params.height < UPSCALING_HACK_MIN_HEIGHT
                || dst_params.width < UPSCALING_HACK_MIN_WIDTH)
        {
            1
        } else {
            src_info.res_scale
        };
        dst_params.update_params();

        // The gap is invalidated along with the copy, so it must be loaded first
        let load_gap = output_gap != 0;
        let Some((dst_id, dst_rect)) =
            self.get_surface_sub_rect(&dst_params, ScaleMatch::Upscale, load_gap)
        else {
            return false;
        };
        if dst_id == src_id {
            log::debug!("Texture copy inside {} is not accelerated", src_info.debug_name());
            return false;
        }

        let src_addr = self.slot_surfaces[src_id].params.addr;
        let dst_addr = self.slot_surfaces[dst_id].params.addr;
        if self
            .fallback
            .should_fall_back(AcceleratedOp::TextureCopy, src_addr, dst_addr)
        {
            return false;
        }

        let (src_surface, dst_surface) = self.slot_surfaces.get_pair_mut(src_id, dst_id);
        if dst_surface.params.surface_type == SurfaceType::Texture
            || !check_formats_blittable(
                src_surface.params.pixel_format,
                dst_surface.params.pixel_format,
            )
        {
            return false;
        }

        let src_level = src_surface.params.level_of(src_params.addr);
        let dst_level = dst_surface.params.level_of(dst_params.addr);
        if src_rect.width() == dst_rect.width() && src_rect.height() == dst_rect.height() {
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
            self.runtime.copy_textures(src_surface, dst_surface, &[copy]);
        } else {
            // The destination was matched at a higher scale
            let blit = TextureBlit {
                src_level,
                dst_level,
                src_rect,
                dst_rect,
                ..Default::default()
            };
            self.runtime.blit_textures(src_surface, dst_surface, &blit);
        }

        self.invalidate_region(dst_params.addr, dst_params.size, Some(dst_id));
        self.stats.texture_copies += 1;
        true
    }

    /// Perform a display transfer on cached surfaces
    ///
    /// Scaling, vertical flip and tiling conversion are performed by a
    /// blit. Flipping with cropped input lines skews the output; the
    /// destination address is offset the way the hardware does it.
    pub fn accelerate_display_transfer(&mut self, config: &DisplayTransferConfig) -> bool {
        log::trace!("Display transfer {}", config.debug_name());

        let mut src_params = SurfaceParams {
            addr: config.input_address,
            width: config.output_width,
            stride: config.input_width,
            height: config.output_height,
            is_tiled: !config.input_linear,
            pixel_format: PixelFormat::from_gpu_pixel_format(config.input_format),
            ..Default::default()
        };
        src_params.update_params();

        let mut dst_params = SurfaceParams {
            addr: config.output_address,
            width: if config.scaling != ScalingMode::NoScale {
                config.output_width / 2
            } else {
                config.output_width
            },
            height: if config.scaling == ScalingMode::ScaleXY {
                config.output_height / 2
            } else {
                config.output_height
            },
            is_tiled: config.input_linear != config.dont_swizzle,
            pixel_format: PixelFormat::from_gpu_pixel_format(config.output_format),
            ..Default::default()
        };
        dst_params.update_params();

        if config.flip_vertically && config.crop_input_lines {
            let skewed_addr = config
                .input_width
                .saturating_sub(config.output_width)
                .checked_mul(config.output_height.saturating_sub(1))
                .and_then(|rows| rows.checked_mul(config.output_format.bytes_per_pixel()))
                .and_then(|skew| dst_params.addr.checked_add(skew));
            let Some(addr) = skewed_addr else {
                log::debug!("Display transfer skew overflows {}", config.debug_name());
                return false;
            };
            dst_params.addr = addr;
            dst_params.update_params();
        }

        let Some((src_id, mut src_rect)) =
            self.get_surface_sub_rect(&src_params, ScaleMatch::Ignore, true)
        else {
            return false;
        };

        dst_params.res_scale = self.slot_surfaces[src_id].params.res_scale;
        let Some((dst_id, dst_rect)) =
            self.get_surface_sub_rect(&dst_params, ScaleMatch::Upscale, false)
        else {
            return false;
        };
        if dst_id == src_id {
            log::debug!("Display transfer inside one surface is not accelerated");
            return false;
        }

        let src_addr = self.slot_surfaces[src_id].params.addr;
        let dst_addr = self.slot_surfaces[dst_id].params.addr;
        if self
            .fallback
            .should_fall_back(AcceleratedOp::DisplayTransfer, src_addr, dst_addr)
        {
            return false;
        }

        let (src_surface, dst_surface) = self.slot_surfaces.get_pair_mut(src_id, dst_id);
        if src_surface.params.is_tiled != dst_surface.params.is_tiled {
            swap(&mut src_rect.top, &mut src_rect.bottom);
        }
        if config.flip_vertically {
            swap(&mut src_rect.top, &mut src_rect.bottom);
        }
        let (src_format, dst_format) =
            (src_surface.params.pixel_format, dst_surface.params.pixel_format);
        if !check_formats_blittable(src_format, dst_format) {
            return false;
        }

        let blit = TextureBlit {
            src_level: src_surface.params.level_of(src_params.addr),
            dst_level: dst_surface.params.level_of(dst_params.addr),
            src_rect,
            dst_rect,
            ..Default::default()
        };
        self.runtime.blit_textures(src_surface, dst_surface, &blit);

        self.invalidate_region(dst_params.addr, dst_params.size, Some(dst_id));
        self.stats.display_transfers += 1;
        true
    }

    /// Record a memory fill as a fill surface
    ///
    /// The fill surface owns its range until it is flushed or overwritten.
    /// Pattern sizes are 4, 3 or 2 bytes for 32, 24 and 16 bit fills.
    pub fn accelerate_fill(&mut self, config: &MemoryFillConfig) -> bool {
        log::trace!("Memory fill {}", config.debug_name());

        if config.end_address <= config.start_address {
            return false;
        }

        let mut params = SurfaceParams {
            addr: config.start_address,
            end: config.end_address,
            size: config.end_address - config.start_address,
            surface_type: SurfaceType::Fill,
            res_scale: FILL_RES_SCALE,
            ..Default::default()
        };
        params.mipmap_offsets[0] = params.addr;

        let mut fill_surface = Surface::new(params, self.runtime.create_texture(&params));
        fill_surface.fill_data = config.value_32bit.to_le_bytes();
        fill_surface.fill_size = if config.fill_32bit {
            4
        } else if config.fill_24bit {
            3
        } else {
            2
        };

        let fill_id: SurfaceId = self.slot_surfaces.insert(fill_surface);
        self.stats.surfaces_created += 1;
        self.register_surface(fill_id);
        self.invalidate_region(params.addr, params.size, Some(fill_id));
        self.stats.fills += 1;
        true
    }
}
