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

//! Texture runtime abstraction
//!
//! The rasterizer cache decides *what* has to happen to surfaces; a
//! [`Runtime`] decides *how*. It owns the backend textures, framebuffers
//! and samplers and performs every pixel transfer:
//! - Uploads from and downloads to staging memory
//! - Clears, copies and scaled blits between textures
//! - Reinterpretation between formats of equal bit depth
//! - Mipmap generation and resolution upscaling
//!
//! [`SoftwareRuntime`] keeps textures in host memory and is used by the
//! tests, the benchmarks and the command line driver.
//!
//! # Coordinates
//!
//! All rectangles, offsets and extents passed to a runtime are in scaled
//! texture pixels with a bottom-left origin, except the rectangle of a
//! [`BufferTextureCopy`], which is unscaled: the runtime scales staging data
//! to the texture resolution itself.

mod software;


pub use software::{SoftwareFramebuffer, SoftwareRuntime, SoftwareSampler, SoftwareTexture};

use serde::Serialize;

use crate::core::common::Rectangle;
use crate::core::custom_tex::Material;
use crate::core::pica::PixelFormat;
use crate::core::rasterizer_cache::{FramebufferParams, SamplerParams, Surface, SurfaceParams};

/// Clear value of a texture clear
///
/// Color channels are normalized to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClearValue {
    pub color: [f32; 4],
    pub depth: f32,
    pub stencil: u8,
}

/// Texel offset inside a texture level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Offset {
    pub x: u32,
    pub y: u32,
}

/// Texel extent of a copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

/// Clear of a rectangle of one level
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextureClear {
    pub texture_level: u32,
    pub texture_rect: Rectangle<u32>,
    pub value: ClearValue,
}

/// Unscaled copy of a region between two textures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextureCopy {
    pub src_level: u32,
    pub dst_level: u32,
    pub src_layer: u32,
    pub dst_layer: u32,
    pub src_offset: Offset,
    pub dst_offset: Offset,
    pub extent: Extent,
}

/// Scaled copy between two rectangles
///
/// A rectangle with `top < bottom` is read or written upside down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextureBlit {
    pub src_level: u32,
    pub dst_level: u32,
    pub src_layer: u32,
    pub dst_layer: u32,
    pub src_rect: Rectangle<u32>,
    pub dst_rect: Rectangle<u32>,
}

/// Transfer between staging memory and one level of a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferTextureCopy {
    pub buffer_offset: usize,
    pub buffer_size: usize,
    /// Unscaled rectangle of the texture level
    pub texture_rect: Rectangle<u32>,
    pub texture_level: u32,
}

/// Staging memory handed out by [`Runtime::find_staging`]
///
/// Pixels are laid out row by row, bottom row first, with the internal
/// bytes per pixel of the surface.
#[derive(Debug, Clone, Default)]
pub struct StagingData {
    pub size: usize,
    pub offset: usize,
    pub mapped: Vec<u8>,
}

/// Counters of the work a runtime performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RuntimeStats {
    pub textures_created: u64,
    pub uploads: u64,
    pub downloads: u64,
    pub clears: u64,
    pub copies: u64,
    pub blits: u64,
    pub reinterpretations: u64,
    pub mipmap_generations: u64,
    pub scale_ups: u64,
    pub framebuffers_created: u64,
    pub samplers_created: u64,
    pub finishes: u64,
}

/// Backend capability set of the rasterizer cache
///
/// Transfers report `false` when the backend cannot perform them, in which
/// case the cache falls back to a slower path.
pub trait Runtime {
    /// Backend texture stored inside every [`Surface`]
    type Texture;
    /// Backend framebuffer object
    type Framebuffer;
    /// Backend sampler object
    type Sampler;

    /// Allocate a texture for `params` at its resolution scale
    fn create_texture(&mut self, params: &SurfaceParams) -> Self::Texture;

    /// Allocate a texture holding a custom replacement of `params`
    fn create_custom_texture(
        &mut self,
        params: &SurfaceParams,
        material: &Material,
    ) -> Self::Texture;

    /// Staging memory of at least `size` bytes
    ///
    /// `upload` tells whether the memory will be written by the CPU or read
    /// back from the GPU.
    fn find_staging(&mut self, size: usize, upload: bool) -> StagingData;

    /// True when `format` has to be converted to RGBA8 on upload
    fn needs_conversion(&self, format: PixelFormat) -> bool;

    /// Frames a sentenced surface survives before it is destroyed
    fn remove_threshold(&self) -> u64;

    /// Wait for all submitted work
    fn finish(&mut self);

    /// Upload decoded staging data into a level of `surface`
    fn upload(
        &mut self,
        surface: &mut Surface<Self::Texture>,
        upload: &BufferTextureCopy,
        staging: &StagingData,
    );

    /// Download a level region of `surface` into staging memory
    fn download(
        &mut self,
        surface: &Surface<Self::Texture>,
        download: &BufferTextureCopy,
        staging: &mut StagingData,
    );

    /// Upload one level of a custom material into `surface`
    fn upload_custom(
        &mut self,
        surface: &mut Surface<Self::Texture>,
        material: &Material,
        level: u32,
    );

    fn clear_texture(&mut self, surface: &mut Surface<Self::Texture>, clear: &TextureClear) -> bool;

    fn copy_textures(
        &mut self,
        source: &Surface<Self::Texture>,
        dest: &mut Surface<Self::Texture>,
        copies: &[TextureCopy],
    ) -> bool;

    fn blit_textures(
        &mut self,
        source: &Surface<Self::Texture>,
        dest: &mut Surface<Self::Texture>,
        blit: &TextureBlit,
    ) -> bool;

    /// Copy the bits of `source` into `dest`, reading them in the pixel
    /// format of `dest`
    fn reinterpret(
        &mut self,
        source: &Surface<Self::Texture>,
        dest: &mut Surface<Self::Texture>,
        copy: &TextureCopy,
    ) -> bool;

    /// Regenerate every level above 0 from level 0
    fn generate_mipmaps(&mut self, surface: &mut Surface<Self::Texture>);

    /// Reallocate the texture of `surface` at `new_scale`, keeping its content
    ///
    /// `surface.params.res_scale` still holds the old scale when called.
    fn scale_up(&mut self, surface: &mut Surface<Self::Texture>, new_scale: u32);

    fn create_framebuffer(
        &mut self,
        params: &FramebufferParams,
        color: Option<&Surface<Self::Texture>>,
        depth: Option<&Surface<Self::Texture>>,
    ) -> Self::Framebuffer;

    fn create_sampler(&mut self, params: &SamplerParams) -> Self::Sampler;
}
