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

//! Host memory texture runtime
//!
//! Textures are plain byte vectors, one per mip level, holding every layer
//! at the scaled resolution. Formats that need conversion are stored as
//! RGBA8 (`[r, g, b, a]`), all others keep their guest byte layout. All
//! transfers are bounds checked: pixels outside a texture are skipped.

use super::{
    BufferTextureCopy, ClearValue, Runtime, RuntimeStats, StagingData, TextureBlit, TextureClear,
    TextureCopy,
};
use crate::core::custom_tex::Material;
use crate::core::pica::{PixelFormat, SurfaceType, TextureType};
use crate::core::rasterizer_cache::{
    FramebufferParams, SamplerParams, Surface, SurfaceId, SurfaceParams,
};
use crate::core::texture::{decode_pixel, encode_pixel, internal_bytes_per_pixel};

/// Default number of frames a sentenced surface is kept
pub const DEFAULT_REMOVE_THRESHOLD: u64 = 3;

/// Texture stored in host memory
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SoftwareTexture {
    pub format: PixelFormat,
    /// Pixels are stored as RGBA8 instead of the guest layout
    pub converted: bool,
    pub bytes_per_pixel: u32,
    /// Scaled width of level 0
    pub width: u32,
    /// Scaled height of level 0
    pub height: u32,
    pub layers: u32,
    /// Per-level storage, layers back to back, rows bottom to top
    pub levels: Vec<Vec<u8>>,
}

impl SoftwareTexture {
    fn allocate(
        format: PixelFormat,
        converted: bool,
        width: u32,
        height: u32,
        levels: u32,
        layers: u32,
    ) -> Self {
        let bytes_per_pixel = if format == PixelFormat::Invalid {
            0
        } else {
            internal_bytes_per_pixel(format, converted)
        };
        let mut texture = Self {
            format,
            converted,
            bytes_per_pixel,
            width,
            height,
            layers,
            levels: Vec::with_capacity(levels as usize),
        };
        for level in 0..levels {
            let (level_width, level_height) = texture.level_size(level);
            let len = level_width as usize * level_height as usize * bytes_per_pixel as usize;
            texture.levels.push(vec![0; len * layers as usize]);
        }
        texture
    }

    /// Scaled size of a level
    pub fn level_size(&self, level: u32) -> (u32, u32) {
        if self.width == 0 || self.height == 0 {
            return (0, 0);
        }
        ((self.width >> level).max(1), (self.height >> level).max(1))
    }

    fn offset(&self, level: u32, layer: u32, x: u32, y: u32) -> Option<usize> {
        let (level_width, level_height) = self.level_size(level);
        if x >= level_width || y >= level_height || layer >= self.layers {
            return None;
        }
        let bpp = self.bytes_per_pixel as usize;
        let layer_size = level_width as usize * level_height as usize * bpp;
        Some(layer as usize * layer_size + (y as usize * level_width as usize + x as usize) * bpp)
    }

    /// Stored bytes of a pixel
    pub fn texel(&self, level: u32, layer: u32, x: u32, y: u32) -> Option<&[u8]> {
        let offset = self.offset(level, layer, x, y)?;
        let bpp = self.bytes_per_pixel as usize;
        self.levels.get(level as usize)?.get(offset..offset + bpp)
    }

    fn texel_mut(&mut self, level: u32, layer: u32, x: u32, y: u32) -> Option<&mut [u8]> {
        let offset = self.offset(level, layer, x, y)?;
        let bpp = self.bytes_per_pixel as usize;
        self.levels.get_mut(level as usize)?.get_mut(offset..offset + bpp)
    }

    /// Color of a pixel as `[r, g, b, a]`
    pub fn read_rgba(&self, level: u32, layer: u32, x: u32, y: u32) -> Option<[u8; 4]> {
        let texel = self.texel(level, layer, x, y)?;
        Some(if self.converted {
            [texel[0], texel[1], texel[2], texel[3]]
        } else {
            decode_pixel(self.format, texel)
        })
    }

    fn write_rgba(&mut self, level: u32, layer: u32, x: u32, y: u32, rgba: [u8; 4]) -> bool {
        let converted = self.converted;
        let format = self.format;
        match self.texel_mut(level, layer, x, y) {
            Some(texel) if converted => {
                texel.copy_from_slice(&rgba);
                true
            }
            Some(texel) => encode_pixel(format, rgba, texel),
            None => false,
        }
    }

    fn is_color(&self) -> bool {
        matches!(
            self.format.surface_type(),
            SurfaceType::Color | SurfaceType::Texture
        )
    }
}

/// Copy one pixel between textures, converting through RGBA when needed
fn transfer_pixel(
    source: &SoftwareTexture,
    dest: &mut SoftwareTexture,
    src: (u32, u32, u32, u32),
    dst: (u32, u32, u32, u32),
) -> bool {
    let (src_level, src_layer, sx, sy) = src;
    let (dst_level, dst_layer, dx, dy) = dst;

    let raw = source.format == dest.format && source.converted == dest.converted;
    if raw || (!source.is_color() && source.bytes_per_pixel == dest.bytes_per_pixel) {
        let Some(texel) = source.texel(src_level, src_layer, sx, sy) else {
            return false;
        };
        let texel: [u8; 4] = {
            let mut bytes = [0u8; 4];
            bytes[..texel.len()].copy_from_slice(texel);
            bytes
        };
        let bpp = dest.bytes_per_pixel as usize;
        return match dest.texel_mut(dst_level, dst_layer, dx, dy) {
            Some(out) => {
                out.copy_from_slice(&texel[..bpp]);
                true
            }
            None => false,
        };
    }

    if source.is_color() && dest.is_color() {
        return match source.read_rgba(src_level, src_layer, sx, sy) {
            Some(rgba) => dest.write_rgba(dst_level, dst_layer, dx, dy, rgba),
            None => false,
        };
    }
    false
}

/// Pixel row of the `index`-th row of a possibly flipped rectangle edge pair
#[inline]
fn rect_row(bottom: u32, top: u32, index: u32) -> u32 {
    if top >= bottom {
        bottom + index
    } else {
        (bottom - 1).wrapping_sub(index)
    }
}

/// Framebuffer created by [`SoftwareRuntime`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftwareFramebuffer {
    pub color: Option<SurfaceId>,
    pub depth: Option<SurfaceId>,
    /// Scaled size of the attachments
    pub width: u32,
    pub height: u32,
}

/// Sampler created by [`SoftwareRuntime`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftwareSampler {
    pub params: SamplerParams,
}

/// Texture runtime backed by host memory
///
/// # Example
///
/// ```
/// use pica_cache::core::pica::PixelFormat;
/// use pica_cache::core::runtime::{Runtime, SoftwareRuntime};
///
/// let runtime = SoftwareRuntime::new();
/// assert!(runtime.needs_conversion(PixelFormat::IA8));
/// assert!(!runtime.needs_conversion(PixelFormat::RGBA8));
/// ```
#[derive(Debug, Clone)]
pub struct SoftwareRuntime {
    remove_threshold: u64,
    stats: RuntimeStats,
}

impl SoftwareRuntime {
    /// Create a runtime with the default remove threshold
    pub fn new() -> Self {
        Self::with_remove_threshold(DEFAULT_REMOVE_THRESHOLD)
    }

    /// Create a runtime keeping sentenced surfaces for `frames` frames
    pub fn with_remove_threshold(frames: u64) -> Self {
        Self {
            remove_threshold: frames,
            stats: RuntimeStats::default(),
        }
    }

    /// Work counters
    pub fn stats(&self) -> &RuntimeStats {
        &self.stats
    }

    fn allocate(&mut self, params: &SurfaceParams) -> SoftwareTexture {
        self.stats.textures_created += 1;
        let layers = match params.texture_type {
            TextureType::CubeMap => 6,
            TextureType::Texture2D => 1,
        };
        let (width, height, levels) = if params.surface_type == SurfaceType::Fill {
            (0, 0, 0)
        } else {
            (params.scaled_width(), params.scaled_height(), params.levels)
        };
        SoftwareTexture::allocate(
            params.pixel_format,
            self.needs_conversion(params.pixel_format),
            width,
            height,
            levels,
            layers,
        )
    }
}

impl Default for SoftwareRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime for SoftwareRuntime {
    type Texture = SoftwareTexture;
    type Framebuffer = SoftwareFramebuffer;
    type Sampler = SoftwareSampler;

    fn create_texture(&mut self, params: &SurfaceParams) -> SoftwareTexture {
        self.allocate(params)
    }

    fn create_custom_texture(
        &mut self,
        params: &SurfaceParams,
        material: &Material,
    ) -> SoftwareTexture {
        log::debug!(
            "Creating custom texture {:016X} ({}x{}) for {}",
            material.hash,
            material.width,
            material.height,
            params.debug_name()
        );
        let mut texture = self.allocate(params);
        texture.converted = true;
        texture.format = PixelFormat::RGBA8;
        texture.bytes_per_pixel = 4;
        let levels = texture.levels.len() as u32;
        texture.levels = (0..levels)
            .map(|level| {
                let (w, h) = texture.level_size(level);
                vec![0; w as usize * h as usize * 4 * texture.layers as usize]
            })
            .collect();
        texture
    }

    fn find_staging(&mut self, size: usize, _upload: bool) -> StagingData {
        StagingData {
            size,
            offset: 0,
            mapped: vec![0; size],
        }
    }

    fn needs_conversion(&self, format: PixelFormat) -> bool {
        format.surface_type() == SurfaceType::Texture
    }

    fn remove_threshold(&self) -> u64 {
        self.remove_threshold
    }

    fn finish(&mut self) {
        self.stats.finishes += 1;
    }

    fn upload(
        &mut self,
        surface: &mut Surface<SoftwareTexture>,
        upload: &BufferTextureCopy,
        staging: &StagingData,
    ) {
        self.stats.uploads += 1;
        let scale = surface.params.res_scale;
        let texture = &mut surface.texture;
        let bpp = texture.bytes_per_pixel as usize;
        let rect = upload.texture_rect;
        let data = staging
            .mapped
            .get(upload.buffer_offset..)
            .unwrap_or(&[]);

        for y in 0..rect.height() {
            for x in 0..rect.width() {
                let index = (y as usize * rect.width() as usize + x as usize) * bpp;
                let Some(pixel) = data.get(index..index + bpp) else {
                    continue;
                };
                // Replicate into the scale x scale block
                for sy in 0..scale {
                    for sx in 0..scale {
                        let tx = (rect.left + x) * scale + sx;
                        let ty = (rect.bottom + y) * scale + sy;
                        if let Some(out) = texture.texel_mut(upload.texture_level, 0, tx, ty) {
                            out.copy_from_slice(pixel);
                        }
                    }
                }
            }
        }
    }

    fn download(
        &mut self,
        surface: &Surface<SoftwareTexture>,
        download: &BufferTextureCopy,
        staging: &mut StagingData,
    ) {
        self.stats.downloads += 1;
        let scale = surface.params.res_scale;
        let texture = &surface.texture;
        let bpp = texture.bytes_per_pixel as usize;
        let rect = download.texture_rect;

        for y in 0..rect.height() {
            for x in 0..rect.width() {
                let pixel = y as usize * rect.width() as usize + x as usize;
                let index = download.buffer_offset + pixel * bpp;
                let tx = (rect.left + x) * scale;
                let ty = (rect.bottom + y) * scale;
                let (Some(texel), Some(out)) = (
                    texture.texel(download.texture_level, 0, tx, ty),
                    staging.mapped.get_mut(index..index + bpp),
                ) else {
                    continue;
                };
                out.copy_from_slice(texel);
            }
        }
    }

    fn upload_custom(
        &mut self,
        surface: &mut Surface<SoftwareTexture>,
        material: &Material,
        level: u32,
    ) {
        self.stats.uploads += 1;
        let texture = &mut surface.texture;
        let (width, height) = texture.level_size(level);
        if width == 0 || height == 0 || material.width == 0 || material.height == 0 {
            return;
        }
        for y in 0..height {
            for x in 0..width {
                let mx = (x as u64 * material.width as u64 / width as u64) as usize;
                let my = (y as u64 * material.height as u64 / height as u64) as usize;
                let index = (my * material.width as usize + mx) * 4;
                let Some(pixel) = material.data.get(index..index + 4) else {
                    continue;
                };
                if let Some(out) = texture.texel_mut(level, 0, x, y) {
                    out.copy_from_slice(pixel);
                }
            }
        }
    }

    fn clear_texture(
        &mut self,
        surface: &mut Surface<SoftwareTexture>,
        clear: &TextureClear,
    ) -> bool {
        self.stats.clears += 1;
        let texture = &mut surface.texture;
        let value: &ClearValue = &clear.value;

        let mut pixel = [0u8; 4];
        match texture.format.surface_type() {
            SurfaceType::Color | SurfaceType::Texture => {
                let rgba = value.color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
                if texture.converted {
                    pixel = rgba;
                } else if !encode_pixel(texture.format, rgba, &mut pixel) {
                    return false;
                }
            }
            SurfaceType::Depth => {
                if texture.format == PixelFormat::D16 {
                    let depth = (value.depth.clamp(0.0, 1.0) * 65535.0).round() as u16;
                    pixel[..2].copy_from_slice(&depth.to_le_bytes());
                } else {
                    let depth = (value.depth.clamp(0.0, 1.0) * 16_777_215.0).round() as u32;
                    pixel = depth.to_le_bytes();
                }
            }
            SurfaceType::DepthStencil => {
                let depth = (value.depth.clamp(0.0, 1.0) * 16_777_215.0).round() as u32;
                pixel = (depth | (value.stencil as u32) << 24).to_le_bytes();
            }
            SurfaceType::Fill | SurfaceType::Invalid => return false,
        }

        let bpp = texture.bytes_per_pixel as usize;
        let rect = clear.texture_rect;
        let bottom = rect.bottom.min(rect.top);
        let left = rect.left.min(rect.right);
        for y in bottom..bottom + rect.height() {
            for x in left..left + rect.width() {
                for layer in 0..texture.layers {
                    if let Some(out) = texture.texel_mut(clear.texture_level, layer, x, y) {
                        out.copy_from_slice(&pixel[..bpp]);
                    }
                }
            }
        }
        true
    }

    fn copy_textures(
        &mut self,
        source: &Surface<SoftwareTexture>,
        dest: &mut Surface<SoftwareTexture>,
        copies: &[TextureCopy],
    ) -> bool {
        self.stats.copies += 1;
        for copy in copies {
            for y in 0..copy.extent.height {
                for x in 0..copy.extent.width {
                    transfer_pixel(
                        &source.texture,
                        &mut dest.texture,
                        (
                            copy.src_level,
                            copy.src_layer,
                            copy.src_offset.x + x,
                            copy.src_offset.y + y,
                        ),
                        (
                            copy.dst_level,
                            copy.dst_layer,
                            copy.dst_offset.x + x,
                            copy.dst_offset.y + y,
                        ),
                    );
                }
            }
        }
        true
    }

    fn blit_textures(
        &mut self,
        source: &Surface<SoftwareTexture>,
        dest: &mut Surface<SoftwareTexture>,
        blit: &TextureBlit,
    ) -> bool {
        self.stats.blits += 1;
        let src = blit.src_rect;
        let dst = blit.dst_rect;
        let (src_width, src_height) = (src.width(), src.height());
        let (dst_width, dst_height) = (dst.width(), dst.height());
        if src_width == 0 || src_height == 0 || dst_width == 0 || dst_height == 0 {
            return true;
        }

        let src_left = src.left.min(src.right);
        let dst_left = dst.left.min(dst.right);
        for row in 0..dst_height {
            let src_row = (row as u64 * src_height as u64 / dst_height as u64) as u32;
            let dy = rect_row(dst.bottom, dst.top, row);
            let sy = rect_row(src.bottom, src.top, src_row);
            for column in 0..dst_width {
                let sx = src_left + (column as u64 * src_width as u64 / dst_width as u64) as u32;
                transfer_pixel(
                    &source.texture,
                    &mut dest.texture,
                    (blit.src_level, blit.src_layer, sx, sy),
                    (blit.dst_level, blit.dst_layer, dst_left + column, dy),
                );
            }
        }
        true
    }

    fn reinterpret(
        &mut self,
        source: &Surface<SoftwareTexture>,
        dest: &mut Surface<SoftwareTexture>,
        copy: &TextureCopy,
    ) -> bool {
        let src_format = source.params.pixel_format;
        let dst_format = dest.params.pixel_format;
        if src_format.bpp() != dst_format.bpp()
            || src_format.bpp() < 8
            || src_format.is_compressed()
        {
            return false;
        }
        self.stats.reinterpretations += 1;

        let guest_bpp = (src_format.bpp() / 8) as usize;
        let (src_level, src_layer) = (copy.src_level, copy.src_layer);
        let (dst_level, dst_layer) = (copy.dst_level, copy.dst_layer);
        for y in 0..copy.extent.height {
            for x in 0..copy.extent.width {
                let (sx, sy) = (copy.src_offset.x + x, copy.src_offset.y + y);
                let (dx, dy) = (copy.dst_offset.x + x, copy.dst_offset.y + y);

                let mut bits = [0u8; 4];
                if source.texture.converted {
                    let Some(rgba) = source.texture.read_rgba(src_level, src_layer, sx, sy) else {
                        continue;
                    };
                    if !encode_pixel(src_format, rgba, &mut bits) {
                        return false;
                    }
                } else {
                    let Some(texel) = source.texture.texel(src_level, src_layer, sx, sy) else {
                        continue;
                    };
                    bits[..texel.len()].copy_from_slice(texel);
                }

                let texture = &mut dest.texture;
                if texture.converted {
                    let rgba = decode_pixel(dst_format, &bits[..guest_bpp]);
                    texture.write_rgba(dst_level, dst_layer, dx, dy, rgba);
                } else if let Some(out) = texture.texel_mut(dst_level, dst_layer, dx, dy) {
                    out.copy_from_slice(&bits[..guest_bpp]);
                }
            }
        }
        true
    }

    fn generate_mipmaps(&mut self, surface: &mut Surface<SoftwareTexture>) {
        self.stats.mipmap_generations += 1;
        let texture = &mut surface.texture;
        let box_filter = texture.is_color();

        for level in 1..texture.levels.len() as u32 {
            let (width, height) = texture.level_size(level);
            for layer in 0..texture.layers {
                for y in 0..height {
                    for x in 0..width {
                        if box_filter {
                            let mut sum = [0u32; 4];
                            let mut count = 0;
                            for (ox, oy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                                let (sx, sy) = (2 * x + ox, 2 * y + oy);
                                if let Some(rgba) = texture.read_rgba(level - 1, layer, sx, sy) {
                                    for (total, channel) in sum.iter_mut().zip(rgba) {
                                        *total += channel as u32;
                                    }
                                    count += 1;
                                }
                            }
                            if count > 0 {
                                let rgba = sum.map(|total| (total / count) as u8);
                                texture.write_rgba(level, layer, x, y, rgba);
                            }
                        } else {
                            let texel = texture
                                .texel(level - 1, layer, 2 * x, 2 * y)
                                .map(|bytes| bytes.to_vec());
                            let out = texture.texel_mut(level, layer, x, y);
                            if let (Some(texel), Some(out)) = (texel, out) {
                                out.copy_from_slice(&texel);
                            }
                        }
                    }
                }
            }
        }
    }

    fn scale_up(&mut self, surface: &mut Surface<SoftwareTexture>, new_scale: u32) {
        self.stats.scale_ups += 1;
        let old_scale = surface.params.res_scale.max(1);
        let old = &surface.texture;
        let mut scaled = SoftwareTexture::allocate(
            old.format,
            old.converted,
            surface.params.width * new_scale,
            surface.params.height * new_scale,
            old.levels.len() as u32,
            old.layers,
        );

        for level in 0..scaled.levels.len() as u32 {
            let (width, height) = scaled.level_size(level);
            for layer in 0..scaled.layers {
                for y in 0..height {
                    for x in 0..width {
                        let sx = x * old_scale / new_scale;
                        let sy = y * old_scale / new_scale;
                        let Some(texel) = old.texel(level, layer, sx, sy) else {
                            continue;
                        };
                        let texel = texel.to_vec();
                        if let Some(out) = scaled.texel_mut(level, layer, x, y) {
                            out.copy_from_slice(&texel);
                        }
                    }
                }
            }
        }
        surface.texture = scaled;
    }

    fn create_framebuffer(
        &mut self,
        params: &FramebufferParams,
        color: Option<&Surface<SoftwareTexture>>,
        depth: Option<&Surface<SoftwareTexture>>,
    ) -> SoftwareFramebuffer {
        self.stats.framebuffers_created += 1;
        let (width, height) = color
            .or(depth)
            .map(|surface| surface.texture.level_size(0))
            .unwrap_or((0, 0));
        SoftwareFramebuffer {
            color: params.color_id,
            depth: params.depth_id,
            width,
            height,
        }
    }

    fn create_sampler(&mut self, params: &SamplerParams) -> SoftwareSampler {
        self.stats.samplers_created += 1;
        SoftwareSampler { params: *params }
    }
}
