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

//! Surface lookup
//!
//! Resolves the surfaces used by draws and transfers: textures, texture
//! cubes, render targets and texture copy sources. Each lookup finds a
//! matching surface or creates and registers a new one, and validates it
//! when asked to.

use smallvec::SmallVec;

use super::framebuffer::{Framebuffer, FramebufferHelper, Sampler};
use super::surface_params::SurfaceParams;
use super::types::{
    FramebufferParams, MatchFlags, SamplerParams, ScaleMatch, SurfaceFlags, TextureCube,
    TextureCubeConfig, NULL_SURFACE_CUBE_ID, NULL_SURFACE_ID,
};
use super::{RasterizerCache, SamplerId, SurfaceId};
use crate::core::common::{align_up, Rectangle};
use crate::core::config::{TextureFilterMode, TextureSampling};
use crate::core::custom_tex::CustomTexManager;
use crate::core::memory::GuestMemory;
use crate::core::pica::{
    mip_levels, PipelineRegs, PixelFormat, SurfaceType, TextureConfig, TextureFilter, TextureInfo,
    TextureType,
};
use crate::core::runtime::{Extent, Runtime, TextureBlit, TextureCopy};

impl<R: Runtime, M: GuestMemory, C: CustomTexManager> RasterizerCache<R, M, C> {
    /// Find or create a surface exactly matching `params`
    ///
    /// # Arguments
    ///
    /// * `params` - Gapless surface to look up
    /// * `scale_match` - Resolution scale policy of the search
    /// * `load_if_create` - Validate the whole surface before returning
    ///
    /// # Returns
    ///
    /// `None` for a null address or an empty surface
    ///
    /// # Panics
    ///
    /// Panics if `params` has gaps or a tiled size that is not a multiple of 8.
    pub fn get_surface(
        &mut self,
        params: &SurfaceParams,
        scale_match: ScaleMatch,
        load_if_create: bool,
    ) -> Option<SurfaceId> {
        if params.addr == 0 || params.width * params.height == 0 {
            return None;
        }
        assert_eq!(params.width, params.stride, "Surface {} has gaps", params.debug_name());
        assert!(
            !params.is_tiled || (params.width % 8 == 0 && params.height % 8 == 0),
            "Tiled surface {} is not tile aligned",
            params.debug_name()
        );

        let surface_id = match self.find_match(params, MatchFlags::EXACT, scale_match, None) {
            Some((surface_id, _)) => surface_id,
            None => {
                let surface_id = self.create_surface(params);
                self.register_surface(surface_id);
                surface_id
            }
        };

        if load_if_create {
            self.validate_surface(surface_id, params.addr, params.size);
        }
        Some(surface_id)
    }

    /// Find or create a surface containing the rectangle described by `params`
    ///
    /// When a containing surface only fails the scale policy, a surface
    /// with its dimensions is created at the requested scale so that the
    /// low resolution one stops being picked.
    ///
    /// # Returns
    ///
    /// The surface and the scaled rectangle of `params` inside it, or
    /// `None` for a null address or an empty rectangle
    pub fn get_surface_sub_rect(
        &mut self,
        params: &SurfaceParams,
        scale_match: ScaleMatch,
        load_if_create: bool,
    ) -> Option<(SurfaceId, Rectangle<u32>)> {
        if params.addr == 0 || params.width * params.height == 0 {
            return None;
        }

        let mut surface_id = self
            .find_match(params, MatchFlags::SUB_RECT, scale_match, None)
            .map(|(surface_id, _)| surface_id);

        if surface_id.is_none() && scale_match != ScaleMatch::Ignore {
            if let Some((low_res_id, _)) =
                self.find_match(params, MatchFlags::SUB_RECT, ScaleMatch::Ignore, None)
            {
                let mut new_params = self.slot_surfaces[low_res_id].params;
                new_params.res_scale = params.res_scale;
                let new_id = self.create_surface(&new_params);
                self.register_surface(new_id);
                surface_id = Some(new_id);
            }
        }

        let mut aligned_params = *params;
        if params.is_tiled {
            aligned_params.width = align_up(params.width, 8);
            aligned_params.height = align_up(params.height, 8);
            aligned_params.stride = align_up(params.stride, 8);
            aligned_params.update_params();
        }

        let surface_id = match surface_id {
            Some(surface_id) => {
                if load_if_create {
                    self.validate_surface(surface_id, aligned_params.addr, aligned_params.size);
                }
                surface_id
            }
            None => {
                let mut new_params = aligned_params;
                new_params.width = aligned_params.stride;
                new_params.update_params();
                self.get_surface(&new_params, scale_match, load_if_create)?
            }
        };

        let rect = self.slot_surfaces[surface_id].params.scaled_sub_rect(params);
        Some((surface_id, rect))
    }

    /// Find a validated source for a texture copy
    ///
    /// `params` describes the copy in bytes: `width` and `stride` are byte
    /// counts and `height` the number of lines.
    ///
    /// # Returns
    ///
    /// The source surface and the scaled rectangle of the copy inside it
    pub fn get_tex_copy_surface(
        &mut self,
        params: &SurfaceParams,
    ) -> Option<(SurfaceId, Rectangle<u32>)> {
        let (match_id, _) =
            self.find_match(params, MatchFlags::TEX_COPY, ScaleMatch::Ignore, None)?;
        self.validate_surface(match_id, params.addr, params.size);

        let match_surface = &self.slot_surfaces[match_id];
        let match_subrect = if params.width != params.stride {
            let tiled_size = if match_surface.params.is_tiled { 8 } else { 1 };
            SurfaceParams {
                width: match_surface.params.pixels_in_bytes(params.width) / tiled_size,
                stride: match_surface.params.pixels_in_bytes(params.stride) / tiled_size,
                height: params.height * tiled_size,
                ..*params
            }
        } else {
            let subrect = match_surface.params.from_interval(params.interval());
            assert_eq!(
                subrect.interval(),
                params.interval(),
                "Texture copy does not map onto {}",
                match_surface.params.debug_name()
            );
            subrect
        };

        Some((match_id, match_surface.params.scaled_sub_rect(&match_subrect)))
    }

    /// Resolve the surface of a texture unit
    ///
    /// `max_level` is derived from the LOD registers.
    pub fn get_texture_surface_for_config(&mut self, config: &TextureConfig) -> SurfaceId {
        let info = TextureInfo::from_config(config);
        let max_level = mip_levels(info.width, info.height, config.lod.max_level) - 1;
        self.get_texture_surface(&info, max_level)
    }

    /// Resolve and validate the surface of a texture
    ///
    /// Textures whose smallest level is not a multiple of 8 are blitted
    /// into a temporary surface, sentenced right away. Blitted levels of the
    /// temporary surface are valid; the others load from guest memory.
    ///
    /// # Returns
    ///
    /// [`NULL_SURFACE_ID`] for a null address or an unsupported size
    pub fn get_texture_surface(&mut self, info: &TextureInfo, max_level: u32) -> SurfaceId {
        // A null texture samples transparent black and hides the geometry
        if info.physical_address == 0 {
            return NULL_SURFACE_ID;
        }

        let mut params = SurfaceParams {
            addr: info.physical_address,
            width: info.width,
            height: info.height,
            levels: max_level + 1,
            is_tiled: true,
            pixel_format: info.format,
            res_scale: if self.filter != TextureFilterMode::NoFilter {
                self.resolution_scale_factor
            } else {
                1
            },
            ..Default::default()
        };
        params.update_params();

        let min_width = info.width >> max_level;
        let min_height = info.height >> max_level;
        if min_width % 8 != 0 || min_height % 8 != 0 {
            if min_width % 4 != 0 || min_height % 4 != 0 {
                log::error!("Texture size ({}x{}) is not a multiple of 4", min_width, min_height);
                return NULL_SURFACE_ID;
            }
            let Some((src_id, rect)) =
                self.get_surface_sub_rect(&params, ScaleMatch::Ignore, true)
            else {
                return NULL_SURFACE_ID;
            };

            params.res_scale = self.slot_surfaces[src_id].params.res_scale;
            let tmp_id = self.create_surface(&params);
            self.sentenced.push((tmp_id, self.frame_tick));

            let (src_surface, tmp_surface) = self.slot_surfaces.get_pair_mut(src_id, tmp_id);
            let blit = TextureBlit {
                src_level: src_surface.params.level_of(params.addr),
                dst_level: 0,
                src_rect: rect,
                dst_rect: tmp_surface.params.scaled_rect(0),
                ..Default::default()
            };
            self.runtime.blit_textures(src_surface, tmp_surface, &blit);
            tmp_surface.mark_valid(params.level_interval(0));

            // Lower levels only line up with a source of the same layout
            let same_layout = src_surface.params.addr == params.addr
                && src_surface.params.width == params.width
                && src_surface.params.height == params.height
                && src_surface.params.levels >= params.levels;
            if same_layout {
                for level in 1..params.levels {
                    let blit = TextureBlit {
                        src_level: level,
                        dst_level: level,
                        src_rect: src_surface.params.scaled_rect(level),
                        dst_rect: tmp_surface.params.scaled_rect(level),
                        ..Default::default()
                    };
                    self.runtime.blit_textures(src_surface, tmp_surface, &blit);
                    tmp_surface.mark_valid(params.level_interval(level));
                }
            }
            return tmp_id;
        }

        if info.width != min_width << max_level || info.height != min_height << max_level {
            log::error!(
                "Texture size ({}x{}) does not support required mipmap level ({})",
                info.width,
                info.height,
                max_level
            );
            return NULL_SURFACE_ID;
        }

        self.get_surface(&params, ScaleMatch::Ignore, true)
            .unwrap_or(NULL_SURFACE_ID)
    }

    /// Resolve a cube map from six face textures
    ///
    /// Faces are validated on every call and re-copied into the cube when
    /// their modification tick changed. Faces that cannot be resolved are
    /// left unset and retried on the next call.
    ///
    /// # Panics
    ///
    /// Panics if a face surface has fewer levels than the cube.
    pub fn get_texture_cube(&mut self, config: &TextureCubeConfig) -> SurfaceId {
        if config.width == 0 {
            return NULL_SURFACE_CUBE_ID;
        }

        let levels = config.levels.max(1);
        let addresses = config.addresses();
        let mut info = TextureInfo {
            width: config.width,
            height: config.width,
            format: PixelFormat::from_texture_format(config.format),
            ..Default::default()
        };
        info.set_default_stride();

        let mut cube = self.texture_cube_cache.get(config).copied().unwrap_or(TextureCube {
            surface_id: NULL_SURFACE_CUBE_ID,
            face_ids: [None; 6],
            ticks: [0; 6],
        });

        let mut res_scale = 1;
        for (face, &addr) in addresses.iter().enumerate() {
            if addr == 0 {
                continue;
            }
            let face_id = match cube.face_ids[face] {
                Some(face_id) => {
                    let params = self.slot_surfaces[face_id].params;
                    self.validate_surface(face_id, params.addr, params.size);
                    face_id
                }
                None => {
                    info.physical_address = addr;
                    let face_id = self.get_texture_surface(&info, levels - 1);
                    if face_id == NULL_SURFACE_ID {
                        continue;
                    }
                    let surface = &mut self.slot_surfaces[face_id];
                    assert!(
                        surface.params.levels >= levels,
                        "Texture cube face {} has fewer than {} levels",
                        surface.params.debug_name(),
                        levels
                    );
                    surface.flags.insert(SurfaceFlags::TRACKED);
                    cube.face_ids[face] = Some(face_id);
                    cube.ticks[face] = 0;
                    face_id
                }
            };
            res_scale = res_scale.max(self.slot_surfaces[face_id].params.res_scale);
        }

        if cube.surface_id == NULL_SURFACE_CUBE_ID {
            let mut cube_params = SurfaceParams {
                addr: config.px,
                width: config.width,
                height: config.width,
                stride: config.width,
                levels,
                res_scale,
                texture_type: TextureType::CubeMap,
                pixel_format: PixelFormat::from_texture_format(config.format),
                ..Default::default()
            };
            cube_params.update_params();
            cube_params.surface_type = SurfaceType::Texture;
            cube.surface_id = self.create_surface(&cube_params);
        } else {
            let cube_surface = &mut self.slot_surfaces[cube.surface_id];
            cube_surface.scale_up(&mut self.runtime, res_scale);
        }

        for face in 0..addresses.len() {
            let Some(face_id) = cube.face_ids[face] else {
                continue;
            };
            let (surface, cube_surface) = self.slot_surfaces.get_pair_mut(face_id, cube.surface_id);
            if cube.ticks[face] == surface.modification_tick {
                continue;
            }
            cube.ticks[face] = surface.modification_tick;

            let copies: SmallVec<[TextureCopy; 8]> = (0..levels)
                .map(|level| {
                    let width_lod = surface.params.scaled_width() >> level;
                    TextureCopy {
                        src_level: level,
                        dst_level: level,
                        src_layer: 0,
                        dst_layer: face as u32,
                        extent: Extent {
                            width: width_lod,
                            height: width_lod,
                        },
                        ..Default::default()
                    }
                })
                .collect();
            self.runtime.copy_textures(surface, cube_surface, &copies);
        }

        self.texture_cube_cache.insert(*config, cube);
        cube.surface_id
    }

    /// Resolve the render targets of a draw
    ///
    /// Targets are looked up at the current resolution factor and
    /// validated over the viewport. Color and depth attached together must
    /// sit at the same offset; otherwise both are re-resolved as whole
    /// surfaces.
    ///
    /// # Arguments
    ///
    /// * `regs` - Framebuffer, viewport and scissor registers
    /// * `using_color` - The draw writes color
    /// * `using_depth` - The draw reads or writes depth
    pub fn get_framebuffer_surfaces(
        &mut self,
        regs: &PipelineRegs,
        using_color: bool,
        using_depth: bool,
    ) -> FramebufferHelper {
        let config = &regs.framebuffer.framebuffer;
        let (fb_width, fb_height) = (config.width as i32, config.height as i32);
        let viewport_rect = regs.rasterizer.viewport_rect();
        let viewport_clamped = Rectangle::new(
            viewport_rect.left.clamp(0, fb_width) as u32,
            viewport_rect.top.clamp(0, fb_height) as u32,
            viewport_rect.right.clamp(0, fb_width) as u32,
            viewport_rect.bottom.clamp(0, fb_height) as u32,
        );

        let base_params = SurfaceParams {
            is_tiled: true,
            res_scale: self.resolution_scale_factor,
            width: config.width,
            height: config.height,
            ..Default::default()
        };
        let mut color_params = SurfaceParams {
            addr: config.color_buffer_address,
            pixel_format: PixelFormat::from_color_format(config.color_format),
            ..base_params
        };
        color_params.update_params();
        let mut depth_params = SurfaceParams {
            addr: config.depth_buffer_address,
            pixel_format: PixelFormat::from_depth_format(config.depth_format),
            ..base_params
        };
        depth_params.update_params();

        let color_vp_interval = color_params.sub_rect_interval(viewport_clamped, 0);
        let depth_vp_interval = depth_params.sub_rect_interval(viewport_clamped, 0);

        let mut color = using_color
            .then(|| self.get_surface_sub_rect(&color_params, ScaleMatch::Exact, false))
            .flatten();
        let mut depth = using_depth
            .then(|| self.get_surface_sub_rect(&depth_params, ScaleMatch::Exact, false))
            .flatten();

        // Color and depth must share offsets inside their surfaces
        let whole_surfaces = matches!((color, depth), (Some((_, c)), Some((_, d))) if c != d);
        if whole_surfaces {
            log::debug!("Color and depth offsets differ, using whole surfaces");
            color = self
                .get_surface(&color_params, ScaleMatch::Exact, false)
                .map(|id| (id, Rectangle::default()));
            depth = self
                .get_surface(&depth_params, ScaleMatch::Exact, false)
                .map(|id| (id, Rectangle::default()));
        }

        let color_id = color.map(|(id, _)| id);
        let depth_id = depth.map(|(id, _)| id);
        let mut color_level = 0;
        let mut depth_level = 0;

        if let Some(id) = color_id {
            let surface = &mut self.slot_surfaces[id];
            color_level = surface.params.level_of(color_params.addr);
            surface.flags.insert(SurfaceFlags::RENDER_TARGET);
            if regs.framebuffer.shadow_rendering {
                surface.flags.insert(SurfaceFlags::SHADOW_MAP);
            }
            self.validate_surface(id, color_vp_interval.lower(), color_vp_interval.length());
        }
        if let Some(id) = depth_id {
            let surface = &mut self.slot_surfaces[id];
            depth_level = surface.params.level_of(depth_params.addr);
            surface.flags.insert(SurfaceFlags::RENDER_TARGET);
            self.validate_surface(id, depth_vp_interval.lower(), depth_vp_interval.length());
        }

        let fb_params = FramebufferParams {
            color_id,
            depth_id,
            color_level,
            depth_level,
            shadow_rendering: regs.framebuffer.shadow_rendering,
        };

        // Validation may have upscaled an attachment after the lookup
        let fb_rect = match (color_id, depth_id) {
            (Some(id), _) if whole_surfaces => self.slot_surfaces[id].params.scaled_rect(0),
            (Some(id), _) => self.slot_surfaces[id].params.scaled_sub_rect(&color_params),
            (None, Some(id)) => self.slot_surfaces[id].params.scaled_sub_rect(&depth_params),
            (None, None) => Rectangle::default(),
        };
        let res_scale = color_id
            .or(depth_id)
            .map_or(1, |id| self.slot_surfaces[id].params.res_scale);

        let existing = self
            .framebuffers
            .get(&fb_params)
            .copied()
            .filter(|&id| self.slot_framebuffers[id].res_scale == res_scale);
        let framebuffer_id = match existing {
            Some(id) => id,
            None => {
                if let Some(stale_id) = self.framebuffers.remove(&fb_params) {
                    self.slot_framebuffers.erase(stale_id);
                }
                let color_surface = color_id.map(|id| &self.slot_surfaces[id]);
                let depth_surface = depth_id.map(|id| &self.slot_surfaces[id]);
                let handle = self
                    .runtime
                    .create_framebuffer(&fb_params, color_surface, depth_surface);
                let id = self.slot_framebuffers.insert(Framebuffer {
                    params: fb_params,
                    res_scale,
                    handle,
                });
                self.framebuffers.insert(fb_params, id);
                id
            }
        };

        FramebufferHelper::new(framebuffer_id, fb_params, res_scale, &regs.rasterizer, fb_rect)
    }

    /// Mark the drawn rectangle of every attachment as GPU owned
    ///
    /// Must be called after the draw described by `helper` was issued.
    pub fn invalidate_framebuffer(&mut self, helper: &FramebufferHelper) {
        let draw_rect = helper.draw_rect_unscaled();
        let attachments = [
            (helper.params.color_id, helper.params.color_level),
            (helper.params.depth_id, helper.params.depth_level),
        ];
        for (surface_id, level) in attachments {
            let Some(surface_id) = surface_id else {
                continue;
            };
            let Some(surface) = self.slot_surfaces.get(surface_id) else {
                continue;
            };
            let interval = surface.params.sub_rect_interval(draw_rect, level);
            self.invalidate_region(interval.lower(), interval.length(), Some(surface_id));
        }
    }

    /// Find or create the sampler of a texture unit
    ///
    /// Filters follow the `texture_sampling` setting.
    pub fn get_sampler(&mut self, config: &TextureConfig) -> SamplerId {
        let sampling = self.settings.texture_sampling;
        let filter = |filter: TextureFilter| match sampling {
            TextureSampling::GameControlled => filter,
            TextureSampling::NearestNeighbor => TextureFilter::Nearest,
            TextureSampling::Linear => TextureFilter::Linear,
        };

        let params = SamplerParams {
            mag_filter: filter(config.mag_filter),
            min_filter: filter(config.min_filter),
            mip_filter: filter(config.mip_filter),
            wrap_s: config.wrap_s,
            wrap_t: config.wrap_t,
            border_color: config.border_color,
            lod_min: config.lod.min_level,
            lod_max: config.lod.max_level,
            lod_bias: config.lod.bias,
        };

        if let Some(&sampler_id) = self.samplers.get(&params) {
            return sampler_id;
        }
        let handle = self.runtime.create_sampler(&params);
        let sampler_id = self.slot_samplers.insert(Sampler { params, handle });
        self.samplers.insert(params, sampler_id);
        sampler_id
    }
}
