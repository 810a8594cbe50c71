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

//! External and pipeline register configurations
//!
//! Addresses are stored as physical byte addresses. The hardware registers
//! hold most addresses in 8-byte units; the command processor converts them
//! before building these structs.

use crate::core::common::{PAddr, Rectangle};

use super::pixel_format::{ColorFormat, DepthFormat, GpuPixelFormat};

/// Display transfer downscaling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScalingMode {
    #[default]
    NoScale,
    /// Halve the horizontal resolution
    ScaleX,
    /// Halve both resolutions
    ScaleXY,
}

/// Texture copy line layout, in 16-byte units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureCopyConfig {
    /// Total number of bytes to copy
    pub size: u32,
    /// Bytes copied per input line (16-byte units)
    pub input_width: u32,
    /// Bytes skipped after each input line (16-byte units)
    pub input_gap: u32,
    /// Bytes written per output line (16-byte units)
    pub output_width: u32,
    /// Bytes skipped after each output line (16-byte units)
    pub output_gap: u32,
}

/// Display transfer engine configuration (GPU external registers)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DisplayTransferConfig {
    pub input_address: PAddr,
    pub output_address: PAddr,
    pub input_width: u32,
    pub input_height: u32,
    pub output_width: u32,
    pub output_height: u32,
    pub input_format: GpuPixelFormat,
    pub output_format: GpuPixelFormat,
    pub flip_vertically: bool,
    /// Input is linear and output tiled; otherwise both are tiled
    pub input_linear: bool,
    /// Drop the trailing input lines so that input and output agree
    pub crop_input_lines: bool,
    /// Skip tiling conversion between input and output
    pub dont_swizzle: bool,
    /// Perform a raw texture copy instead of a formatted transfer
    pub is_texture_copy: bool,
    pub scaling: ScalingMode,
    pub texture_copy: TextureCopyConfig,
}

impl DisplayTransferConfig {
    /// Short description used in logs
    pub fn debug_name(&self) -> String {
        format!(
            "from {:#x} to {:#x} with {:?} scaling and stride {}, width {}",
            self.input_address,
            self.output_address,
            self.scaling,
            self.input_width,
            self.output_width
        )
    }
}

/// Memory fill engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MemoryFillConfig {
    pub start_address: PAddr,
    pub end_address: PAddr,
    /// Fill value as written to the register
    pub value_32bit: u32,
    pub fill_24bit: bool,
    pub fill_32bit: bool,
}

impl MemoryFillConfig {
    /// Fill value as 16-bit pattern
    pub const fn value_16bit(&self) -> u16 {
        self.value_32bit as u16
    }

    /// Fill value as 24-bit pattern bytes
    pub const fn value_24bit(&self) -> [u8; 3] {
        let bytes = self.value_32bit.to_le_bytes();
        [bytes[0], bytes[1], bytes[2]]
    }

    pub fn debug_name(&self) -> String {
        format!(
            "from {:#x} to {:#x} with {}-bit value {:#x}",
            self.start_address,
            self.end_address,
            if self.fill_32bit {
                32
            } else if self.fill_24bit {
                24
            } else {
                16
            },
            self.value_32bit
        )
    }
}

/// Framebuffer configuration of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FramebufferConfig {
    pub width: u32,
    pub height: u32,
    pub color_buffer_address: PAddr,
    pub depth_buffer_address: PAddr,
    pub color_format: ColorFormat,
    pub depth_format: DepthFormat,
}

/// Framebuffer block of the pipeline registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FramebufferRegs {
    pub framebuffer: FramebufferConfig,
    /// Shadow rendering writes to the color buffer through image stores
    pub shadow_rendering: bool,
}

/// Scissor test configuration, in framebuffer pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScissorConfig {
    pub enabled: bool,
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

/// Rasterizer block of the pipeline registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RasterizerRegs {
    pub viewport_corner_x: i32,
    pub viewport_corner_y: i32,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub scissor: ScissorConfig,
}

impl RasterizerRegs {
    /// Viewport rectangle with a bottom-left origin
    pub fn viewport_rect(&self) -> Rectangle<i32> {
        Rectangle::new(
            self.viewport_corner_x,
            self.viewport_corner_y + self.viewport_height as i32,
            self.viewport_corner_x + self.viewport_width as i32,
            self.viewport_corner_y,
        )
    }
}

/// Pipeline register state used for framebuffer selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PipelineRegs {
    pub framebuffer: FramebufferRegs,
    pub rasterizer: RasterizerRegs,
}
