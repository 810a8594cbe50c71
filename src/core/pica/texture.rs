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

//! Texture unit configuration

use crate::core::common::PAddr;

use super::pixel_format::{PixelFormat, TextureFormat};

/// Texture filtering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFilter {
    #[default]
    Nearest,
    Linear,
}

/// Texture coordinate wrapping mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    #[default]
    ClampToEdge,
    ClampToBorder,
    Repeat,
    MirroredRepeat,
}

/// Texture unit level of detail configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LodConfig {
    pub min_level: u32,
    pub max_level: u32,
    /// Raw fixed point bias register value
    pub bias: u32,
}

/// Texture unit configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureConfig {
    pub physical_address: PAddr,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub mag_filter: TextureFilter,
    pub min_filter: TextureFilter,
    pub mip_filter: TextureFilter,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
    pub border_color: u32,
    pub lod: LodConfig,
}

/// Location and layout of a texture in guest memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureInfo {
    pub physical_address: PAddr,
    pub width: u32,
    pub height: u32,
    /// Row stride in bytes
    pub stride: u32,
    pub format: PixelFormat,
}

impl TextureInfo {
    /// Build texture info from a texture unit configuration
    ///
    /// # Examples
    ///
    /// ```
    /// use pica_cache::core::pica::{TextureConfig, TextureFormat, TextureInfo};
    ///
    /// let config = TextureConfig {
    ///     physical_address: 0x1800_0000,
    ///     width: 64,
    ///     height: 32,
    ///     format: TextureFormat::RGB565,
    ///     ..Default::default()
    /// };
    /// let info = TextureInfo::from_config(&config);
    /// assert_eq!(info.stride, 128);
    /// ```
    pub fn from_config(config: &TextureConfig) -> Self {
        let mut info = Self {
            physical_address: config.physical_address,
            width: config.width,
            height: config.height,
            stride: 0,
            format: PixelFormat::from_texture_format(config.format),
        };
        info.set_default_stride();
        info
    }

    /// Stride of a tightly packed texture
    pub fn set_default_stride(&mut self) {
        self.stride = self.width * self.format.bpp() / 8;
    }
}

/// Number of mipmap levels the cache allocates for a texture
///
/// Levels stop before either side reaches the 8x8 tile size.
///
/// # Examples
///
/// ```
/// use pica_cache::core::pica::mip_levels;
///
/// assert_eq!(mip_levels(256, 256, 10), 6);
/// assert_eq!(mip_levels(256, 256, 2), 3);
/// assert_eq!(mip_levels(8, 512, 10), 1);
/// ```
pub fn mip_levels(mut width: u32, mut height: u32, max_level: u32) -> u32 {
    let mut levels = 1;
    while width > 8 && height > 8 {
        levels += 1;
        width >>= 1;
        height >>= 1;
    }
    levels.min(max_level + 1)
}
