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

//! Pixel formats and surface categories
//!
//! The cache uses a single `PixelFormat` enumeration that unifies the
//! framebuffer color formats, the texture formats and the depth formats of
//! the PICA. The numbering follows the texture format register, with depth
//! formats placed after the texture formats.

use crate::core::error::{CacheError, Result};

/// Unified pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum PixelFormat {
    // Color formats
    #[default]
    RGBA8 = 0,
    RGB8 = 1,
    RGB5A1 = 2,
    RGB565 = 3,
    RGBA4 = 4,
    // Texture-only formats
    IA8 = 5,
    RG8 = 6,
    I8 = 7,
    A8 = 8,
    IA4 = 9,
    I4 = 10,
    A4 = 11,
    ETC1 = 12,
    ETC1A4 = 13,
    // Depth formats
    D16 = 14,
    D24 = 16,
    D24S8 = 17,
    Invalid = 255,
}

/// What a surface is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SurfaceType {
    #[default]
    Color,
    Texture,
    Depth,
    DepthStencil,
    /// Constant fill pattern without a realized image
    Fill,
    Invalid,
}

/// Dimensionality of the backing texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureType {
    #[default]
    Texture2D,
    CubeMap,
}

impl PixelFormat {
    /// Bits per pixel in guest memory
    ///
    /// # Examples
    ///
    /// ```
    /// use pica_cache::core::pica::PixelFormat;
    ///
    /// assert_eq!(PixelFormat::RGBA8.bpp(), 32);
    /// assert_eq!(PixelFormat::ETC1.bpp(), 4);
    /// assert_eq!(PixelFormat::D24.bpp(), 24);
    /// ```
    pub const fn bpp(self) -> u32 {
        match self {
            PixelFormat::RGBA8 | PixelFormat::D24S8 => 32,
            PixelFormat::RGB8 | PixelFormat::D24 => 24,
            PixelFormat::RGB5A1
            | PixelFormat::RGB565
            | PixelFormat::RGBA4
            | PixelFormat::IA8
            | PixelFormat::RG8
            | PixelFormat::D16 => 16,
            PixelFormat::I8 | PixelFormat::A8 | PixelFormat::IA4 | PixelFormat::ETC1A4 => 8,
            PixelFormat::I4 | PixelFormat::A4 | PixelFormat::ETC1 => 4,
            PixelFormat::Invalid => 0,
        }
    }

    /// Surface category of the format
    pub const fn surface_type(self) -> SurfaceType {
        match self {
            PixelFormat::RGBA8
            | PixelFormat::RGB8
            | PixelFormat::RGB5A1
            | PixelFormat::RGB565
            | PixelFormat::RGBA4 => SurfaceType::Color,
            PixelFormat::IA8
            | PixelFormat::RG8
            | PixelFormat::I8
            | PixelFormat::A8
            | PixelFormat::IA4
            | PixelFormat::I4
            | PixelFormat::A4
            | PixelFormat::ETC1
            | PixelFormat::ETC1A4 => SurfaceType::Texture,
            PixelFormat::D16 | PixelFormat::D24 => SurfaceType::Depth,
            PixelFormat::D24S8 => SurfaceType::DepthStencil,
            PixelFormat::Invalid => SurfaceType::Invalid,
        }
    }

    /// Formats that can only be decoded into RGBA8, never sampled natively
    pub const fn is_always_decoded(self) -> bool {
        matches!(
            self,
            PixelFormat::I4 | PixelFormat::A4 | PixelFormat::ETC1 | PixelFormat::ETC1A4
        )
    }

    /// Block-compressed formats
    pub const fn is_compressed(self) -> bool {
        matches!(self, PixelFormat::ETC1 | PixelFormat::ETC1A4)
    }

    /// Human readable name
    pub const fn name(self) -> &'static str {
        match self {
            PixelFormat::RGBA8 => "RGBA8",
            PixelFormat::RGB8 => "RGB8",
            PixelFormat::RGB5A1 => "RGB5A1",
            PixelFormat::RGB565 => "RGB565",
            PixelFormat::RGBA4 => "RGBA4",
            PixelFormat::IA8 => "IA8",
            PixelFormat::RG8 => "RG8",
            PixelFormat::I8 => "I8",
            PixelFormat::A8 => "A8",
            PixelFormat::IA4 => "IA4",
            PixelFormat::I4 => "I4",
            PixelFormat::A4 => "A4",
            PixelFormat::ETC1 => "ETC1",
            PixelFormat::ETC1A4 => "ETC1A4",
            PixelFormat::D16 => "D16",
            PixelFormat::D24 => "D24",
            PixelFormat::D24S8 => "D24S8",
            PixelFormat::Invalid => "Invalid",
        }
    }

    /// Pixel format of a texture unit format register value
    pub fn from_texture_format(format: TextureFormat) -> Self {
        Self::try_from(format as u32).unwrap_or(PixelFormat::Invalid)
    }

    /// Pixel format of a framebuffer color format register value
    pub fn from_color_format(format: ColorFormat) -> Self {
        Self::try_from(format as u32).unwrap_or(PixelFormat::Invalid)
    }

    /// Pixel format of a framebuffer depth format register value
    pub fn from_depth_format(format: DepthFormat) -> Self {
        Self::try_from(format as u32 + 14).unwrap_or(PixelFormat::Invalid)
    }

    /// Pixel format of a display transfer format register value
    pub const fn from_gpu_pixel_format(format: GpuPixelFormat) -> Self {
        // RGB565 and RGB5A1 are swapped relative to the texture numbering
        match format {
            GpuPixelFormat::RGBA8 => PixelFormat::RGBA8,
            GpuPixelFormat::RGB8 => PixelFormat::RGB8,
            GpuPixelFormat::RGB565 => PixelFormat::RGB565,
            GpuPixelFormat::RGB5A1 => PixelFormat::RGB5A1,
            GpuPixelFormat::RGBA4 => PixelFormat::RGBA4,
        }
    }
}

impl TryFrom<u32> for PixelFormat {
    type Error = CacheError;

    fn try_from(value: u32) -> Result<Self> {
        Ok(match value {
            0 => PixelFormat::RGBA8,
            1 => PixelFormat::RGB8,
            2 => PixelFormat::RGB5A1,
            3 => PixelFormat::RGB565,
            4 => PixelFormat::RGBA4,
            5 => PixelFormat::IA8,
            6 => PixelFormat::RG8,
            7 => PixelFormat::I8,
            8 => PixelFormat::A8,
            9 => PixelFormat::IA4,
            10 => PixelFormat::I4,
            11 => PixelFormat::A4,
            12 => PixelFormat::ETC1,
            13 => PixelFormat::ETC1A4,
            14 => PixelFormat::D16,
            16 => PixelFormat::D24,
            17 => PixelFormat::D24S8,
            _ => return Err(CacheError::InvalidPixelFormat { raw: value }),
        })
    }
}

/// Texture unit format register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum TextureFormat {
    #[default]
    RGBA8 = 0,
    RGB8 = 1,
    RGB5A1 = 2,
    RGB565 = 3,
    RGBA4 = 4,
    IA8 = 5,
    RG8 = 6,
    I8 = 7,
    A8 = 8,
    IA4 = 9,
    I4 = 10,
    A4 = 11,
    ETC1 = 12,
    ETC1A4 = 13,
}

/// Framebuffer color format register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum ColorFormat {
    #[default]
    RGBA8 = 0,
    RGB8 = 1,
    RGB5A1 = 2,
    RGB565 = 3,
    RGBA4 = 4,
}

/// Framebuffer depth format register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum DepthFormat {
    #[default]
    D16 = 0,
    D24 = 2,
    D24S8 = 3,
}

/// Display transfer input/output format register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum GpuPixelFormat {
    #[default]
    RGBA8 = 0,
    RGB8 = 1,
    RGB565 = 2,
    RGB5A1 = 3,
    RGBA4 = 4,
}

impl GpuPixelFormat {
    /// Bytes per pixel of the display transfer format
    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            GpuPixelFormat::RGBA8 => 4,
            GpuPixelFormat::RGB8 => 3,
            GpuPixelFormat::RGB565 | GpuPixelFormat::RGB5A1 | GpuPixelFormat::RGBA4 => 2,
        }
    }
}

/// Check whether a blit between two formats is allowed
///
/// Color and texture formats blit between each other; depth formats only
/// blit to depth formats of the same category.
pub fn check_formats_blittable(source: PixelFormat, dest: PixelFormat) -> bool {
    let source_type = source.surface_type();
    let dest_type = dest.surface_type();

    let is_color = |ty: SurfaceType| matches!(ty, SurfaceType::Color | SurfaceType::Texture);
    if is_color(source_type) && is_color(dest_type) {
        return true;
    }
    if source_type == SurfaceType::Depth && dest_type == SurfaceType::Depth {
        return true;
    }
    if source_type == SurfaceType::DepthStencil && dest_type == SurfaceType::DepthStencil {
        return true;
    }

    log::warn!(
        "Unblittable format pair detected {} and {}",
        source.name(),
        dest.name()
    );
    false
}
