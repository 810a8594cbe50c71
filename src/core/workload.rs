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

//! Recorded cache workloads
//!
//! A workload is a JSON list of guest operations: CPU reads and writes,
//! accelerated transfers, texture lookups, draws and frame ends. Replaying
//! one against a cache exercises the same paths an emulator would.
//!
//! # Workload Format
//!
//! ```text
//! {
//!   "commands": [
//!     { "op": "write", "addr": 402653184, "len": 16384, "value": 90 },
//!     { "op": "draw", "color": 402653184, "width": 64, "height": 64 },
//!     { "op": "display_transfer", "src": 402653184, "dst": 404750336,
//!       "width": 64, "height": 64 },
//!     { "op": "read", "addr": 404750336, "size": 16384 },
//!     { "op": "frame" }
//!   ]
//! }
//! ```
//!
//! Formats are raw register values: `PixelFormat` numbering for textures
//! and framebuffers, with depth formats starting at 14.
//!
//! # Example
//!
//! ```
//! use pica_cache::core::config::Settings;
//! use pica_cache::core::custom_tex::NullCustomTexManager;
//! use pica_cache::core::memory::PhysicalMemory;
//! use pica_cache::core::rasterizer_cache::RasterizerCache;
//! use pica_cache::core::runtime::SoftwareRuntime;
//! use pica_cache::core::workload::Workload;
//!
//! let mut cache = RasterizerCache::new(
//!     PhysicalMemory::new(),
//!     NullCustomTexManager,
//!     SoftwareRuntime::new(),
//!     Settings::default(),
//! );
//!
//! let report = Workload::demo().replay(&mut cache).unwrap();
//! assert!(report.accelerated > 0);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::custom_tex::CustomTexManager;
use crate::core::error::{CacheError, Result};
use crate::core::memory::PhysicalMemory;
use crate::core::pica::{
    ColorFormat, DepthFormat, DisplayTransferConfig, FramebufferConfig, FramebufferRegs,
    GpuPixelFormat, MemoryFillConfig, PipelineRegs, PixelFormat, RasterizerRegs, ScalingMode,
    TextureCopyConfig, TextureInfo,
};
use crate::core::rasterizer_cache::{CacheStats, RasterizerCache};
use crate::core::runtime::Runtime;

/// Display transfer downscaling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Downscale {
    #[default]
    None,
    X,
    Xy,
}

/// One recorded guest operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    /// CPU write of `len` bytes of `value`
    Write { addr: u32, len: u32, value: u8 },
    /// CPU read
    Read { addr: u32, size: u32 },
    /// Memory fill of `[start, end)` with a 16, 24 or 32 bit pattern
    Fill {
        start: u32,
        end: u32,
        value: u32,
        #[serde(default = "default_fill_bits")]
        bits: u32,
    },
    /// Texture copy; sizes, widths and gaps in bytes
    TextureCopy {
        src: u32,
        dst: u32,
        size: u32,
        #[serde(default)]
        input_width: u32,
        #[serde(default)]
        input_gap: u32,
        #[serde(default)]
        output_width: u32,
        #[serde(default)]
        output_gap: u32,
    },
    /// Tiled to linear display transfer
    DisplayTransfer {
        src: u32,
        dst: u32,
        width: u32,
        height: u32,
        #[serde(default)]
        format: u32,
        #[serde(default)]
        flip: bool,
        #[serde(default)]
        downscale: Downscale,
    },
    /// Texture lookup
    Texture {
        addr: u32,
        width: u32,
        height: u32,
        #[serde(default)]
        format: u32,
        #[serde(default)]
        max_level: u32,
    },
    /// Draw covering the whole framebuffer
    Draw {
        color: u32,
        #[serde(default)]
        depth: u32,
        width: u32,
        height: u32,
        #[serde(default)]
        color_format: u32,
        #[serde(default = "default_depth_format")]
        depth_format: u32,
    },
    /// End of `count` frames
    Frame {
        #[serde(default = "default_frame_count")]
        count: u32,
    },
}

fn default_fill_bits() -> u32 {
    32
}

fn default_depth_format() -> u32 {
    PixelFormat::D24S8 as u32
}

fn default_frame_count() -> u32 {
    1
}

/// Outcome of a replay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ReplayReport {
    pub commands: usize,
    /// Transfers and fills performed on cached surfaces
    pub accelerated: usize,
    /// Transfers left to the software path
    pub rejected: usize,
    pub cache: CacheStats,
}

/// List of recorded guest operations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    pub commands: Vec<Command>,
}

impl Workload {
    /// Load a workload from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a workload.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading workload from {}", path.display());
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    /// Parse a workload from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize the workload to pretty JSON
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Short frame of a typical title
    ///
    /// Clears the render targets with fills, uploads a texture, draws,
    /// transfers the color buffer to a linear display buffer and lets the
    /// CPU read it back.
    pub fn demo() -> Self {
        const COLOR: u32 = 0x1800_0000;
        const DEPTH: u32 = 0x1806_0000;
        const TEXTURE: u32 = 0x2000_0000;
        const DISPLAY: u32 = 0x2010_0000;
        const WIDTH: u32 = 240;
        const HEIGHT: u32 = 400;

        let commands = vec![
            Command::Fill {
                start: COLOR,
                end: COLOR + WIDTH * HEIGHT * 4,
                value: 0x0000_00FF,
                bits: 32,
            },
            Command::Fill {
                start: DEPTH,
                end: DEPTH + WIDTH * HEIGHT * 4,
                value: 0x00FF_FFFF,
                bits: 32,
            },
            Command::Write {
                addr: TEXTURE,
                len: 128 * 128 * 2,
                value: 0x5A,
            },
            Command::Texture {
                addr: TEXTURE,
                width: 128,
                height: 128,
                format: PixelFormat::RGB565 as u32,
                max_level: 0,
            },
            Command::Draw {
                color: COLOR,
                depth: DEPTH,
                width: WIDTH,
                height: HEIGHT,
                color_format: PixelFormat::RGBA8 as u32,
                depth_format: PixelFormat::D24S8 as u32,
            },
            Command::DisplayTransfer {
                src: COLOR,
                dst: DISPLAY,
                width: WIDTH,
                height: HEIGHT,
                format: PixelFormat::RGBA8 as u32,
                flip: false,
                downscale: Downscale::None,
            },
            Command::TextureCopy {
                src: DISPLAY,
                dst: DISPLAY + 0x10_0000,
                size: WIDTH * 4 * 8,
                input_width: 0,
                input_gap: 0,
                output_width: 0,
                output_gap: 0,
            },
            Command::Read {
                addr: DISPLAY,
                size: WIDTH * HEIGHT * 4,
            },
            Command::Frame { count: 1 },
        ];
        Self { commands }
    }

    /// Replay every command against `cache`
    ///
    /// # Errors
    ///
    /// Returns an error if a command names an invalid pixel format or
    /// writes outside guest memory. Commands before the failing one stay
    /// applied.
    pub fn replay<R: Runtime, C: CustomTexManager>(
        &self,
        cache: &mut RasterizerCache<R, PhysicalMemory, C>,
    ) -> Result<ReplayReport> {
        let mut report = ReplayReport::default();

        for (index, command) in self.commands.iter().enumerate() {
            log::trace!("Command {}: {:?}", index, command);
            if let Some(accelerated) = replay_command(cache, command)? {
                if accelerated {
                    report.accelerated += 1;
                } else {
                    report.rejected += 1;
                }
            }
            report.commands += 1;
        }

        report.cache = *cache.stats();
        log::info!(
            "Replayed {} commands: {} accelerated, {} rejected",
            report.commands,
            report.accelerated,
            report.rejected
        );
        Ok(report)
    }
}

/// Apply one command
///
/// # Returns
///
/// Whether the command was accelerated, for transfers and fills
fn replay_command<R: Runtime, C: CustomTexManager>(
    cache: &mut RasterizerCache<R, PhysicalMemory, C>,
    command: &Command,
) -> Result<Option<bool>> {
    match *command {
        Command::Write { addr, len, value } => {
            let data = vec![value; len as usize];
            cache.memory_mut().write_block(addr, &data)?;
            cache.invalidate_region(addr, len, None);
            Ok(None)
        }
        Command::Read { addr, size } => {
            cache.flush_region(addr, size, None);
            Ok(None)
        }
        Command::Fill {
            start,
            end,
            value,
            bits,
        } => {
            let config = MemoryFillConfig {
                start_address: start,
                end_address: end,
                value_32bit: value,
                fill_24bit: bits == 24,
                fill_32bit: bits == 32,
            };
            Ok(Some(cache.accelerate_fill(&config)))
        }
        Command::TextureCopy {
            src,
            dst,
            size,
            input_width,
            input_gap,
            output_width,
            output_gap,
        } => {
            let config = DisplayTransferConfig {
                input_address: src,
                output_address: dst,
                is_texture_copy: true,
                texture_copy: TextureCopyConfig {
                    size,
                    input_width: input_width / 16,
                    input_gap: input_gap / 16,
                    output_width: output_width / 16,
                    output_gap: output_gap / 16,
                },
                ..Default::default()
            };
            Ok(Some(cache.accelerate_texture_copy(&config)))
        }
        Command::DisplayTransfer {
            src,
            dst,
            width,
            height,
            format,
            flip,
            downscale,
        } => {
            let format = gpu_pixel_format(PixelFormat::try_from(format)?)?;
            let config = DisplayTransferConfig {
                input_address: src,
                output_address: dst,
                input_width: width,
                input_height: height,
                output_width: width,
                output_height: height,
                input_format: format,
                output_format: format,
                flip_vertically: flip,
                scaling: match downscale {
                    Downscale::None => ScalingMode::NoScale,
                    Downscale::X => ScalingMode::ScaleX,
                    Downscale::Xy => ScalingMode::ScaleXY,
                },
                ..Default::default()
            };
            Ok(Some(cache.accelerate_display_transfer(&config)))
        }
        Command::Texture {
            addr,
            width,
            height,
            format,
            max_level,
        } => {
            let mut info = TextureInfo {
                physical_address: addr,
                width,
                height,
                stride: 0,
                format: PixelFormat::try_from(format)?,
            };
            info.set_default_stride();
            cache.get_texture_surface(&info, max_level);
            Ok(None)
        }
        Command::Draw {
            color,
            depth,
            width,
            height,
            color_format,
            depth_format,
        } => {
            let regs = PipelineRegs {
                framebuffer: FramebufferRegs {
                    framebuffer: FramebufferConfig {
                        width,
                        height,
                        color_buffer_address: color,
                        depth_buffer_address: depth,
                        color_format: color_format_of(PixelFormat::try_from(color_format)?)?,
                        depth_format: depth_format_of(PixelFormat::try_from(depth_format)?)?,
                    },
                    shadow_rendering: false,
                },
                rasterizer: RasterizerRegs {
                    viewport_width: width,
                    viewport_height: height,
                    ..Default::default()
                },
            };
            let helper = cache.get_framebuffer_surfaces(&regs, color != 0, depth != 0);
            cache.invalidate_framebuffer(&helper);
            Ok(None)
        }
        Command::Frame { count } => {
            for _ in 0..count {
                cache.tick_frame();
            }
            Ok(None)
        }
    }
}

fn gpu_pixel_format(format: PixelFormat) -> Result<GpuPixelFormat> {
    Ok(match format {
        PixelFormat::RGBA8 => GpuPixelFormat::RGBA8,
        PixelFormat::RGB8 => GpuPixelFormat::RGB8,
        PixelFormat::RGB565 => GpuPixelFormat::RGB565,
        PixelFormat::RGB5A1 => GpuPixelFormat::RGB5A1,
        PixelFormat::RGBA4 => GpuPixelFormat::RGBA4,
        _ => return Err(unsupported(format, "display transfers")),
    })
}

fn color_format_of(format: PixelFormat) -> Result<ColorFormat> {
    Ok(match format {
        PixelFormat::RGBA8 => ColorFormat::RGBA8,
        PixelFormat::RGB8 => ColorFormat::RGB8,
        PixelFormat::RGB5A1 => ColorFormat::RGB5A1,
        PixelFormat::RGB565 => ColorFormat::RGB565,
        PixelFormat::RGBA4 => ColorFormat::RGBA4,
        _ => return Err(unsupported(format, "color buffers")),
    })
}

fn depth_format_of(format: PixelFormat) -> Result<DepthFormat> {
    Ok(match format {
        PixelFormat::D16 => DepthFormat::D16,
        PixelFormat::D24 => DepthFormat::D24,
        PixelFormat::D24S8 => DepthFormat::D24S8,
        _ => return Err(unsupported(format, "depth buffers")),
    })
}

fn unsupported(format: PixelFormat, usage: &str) -> CacheError {
    CacheError::Workload(format!("{} cannot be used for {}", format.name(), usage))
}
