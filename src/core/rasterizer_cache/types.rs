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

//! Rasterizer cache type definitions
//!
//! Keys, flags and the value types the cache deduplicates by hashing.

use bitflags::bitflags;
use serde::Serialize;

use super::slot_vector::{SamplerId, SurfaceId};
use crate::core::common::PAddr;
use crate::core::pica::{TextureFilter, TextureFormat, WrapMode};

/// Maximum number of mipmap levels of a PICA texture
pub const MAX_PICA_LEVELS: usize = 8;

/// 1x1 transparent RGBA8 surface returned when a texture cannot be resolved
pub const NULL_SURFACE_ID: SurfaceId = SurfaceId(0);

/// 1x1 cube map returned for unconfigured texture cubes
pub const NULL_SURFACE_CUBE_ID: SurfaceId = SurfaceId(1);

/// Linear, clamp-to-border sampler
pub const NULL_SAMPLER_ID: SamplerId = SamplerId(0);

/// Writes of at most this many bytes are assumed to come from the CPU
///
/// Flushes of that size download the whole dirty region of the owning
/// surface, and owner-less invalidations of that size evict the overlapping
/// surfaces instead of marking them invalid. Larger accesses come from
/// system services and are handled exactly.
pub const SMALL_WRITE_THRESHOLD: u32 = 8;

/// Page size of the surface page table (256KB)
pub const PAGE_TABLE_BITS: u32 = 18;

/// Resolution scale policy of a surface search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScaleMatch {
    /// Only surfaces with exactly the requested scale
    Exact,
    /// Surfaces with the requested scale or higher
    Upscale,
    /// Any scale
    Ignore,
}

bitflags! {
    /// Kinds of surface matches a search accepts
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MatchFlags: u32 {
        /// Same address, dimensions and format
        const EXACT = 1 << 0;
        /// Candidate contains the requested rectangle
        const SUB_RECT = 1 << 1;
        /// Candidate can fill part of the requested interval by copy or clear
        const COPY = 1 << 2;
        /// Candidate has the same bit depth and can be reinterpreted
        const REINTERPRET = 1 << 3;
        /// Candidate can source a raw texture copy
        const TEX_COPY = 1 << 4;
    }
}

bitflags! {
    /// Surface state flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SurfaceFlags: u32 {
        /// Present in the page table
        const REGISTERED = 1 << 0;
        /// Used as a face of a texture cube
        const TRACKED = 1 << 1;
        /// Bound as a color or depth target
        const RENDER_TARGET = 1 << 2;
        /// Replaced by a custom texture
        const CUSTOM = 1 << 3;
        /// Written by shadow rendering
        const SHADOW_MAP = 1 << 4;
    }
}

/// Key of a cached framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FramebufferParams {
    pub color_id: Option<SurfaceId>,
    pub depth_id: Option<SurfaceId>,
    pub color_level: u32,
    pub depth_level: u32,
    pub shadow_rendering: bool,
}

/// Key of a cached sampler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SamplerParams {
    pub mag_filter: TextureFilter,
    pub min_filter: TextureFilter,
    pub mip_filter: TextureFilter,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
    pub border_color: u32,
    pub lod_min: u32,
    pub lod_max: u32,
    pub lod_bias: u32,
}

/// Texture cube configuration
///
/// A face address of zero means the face is unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureCubeConfig {
    pub px: PAddr,
    pub nx: PAddr,
    pub py: PAddr,
    pub ny: PAddr,
    pub pz: PAddr,
    pub nz: PAddr,
    pub width: u32,
    pub levels: u32,
    pub format: TextureFormat,
}

impl TextureCubeConfig {
    /// Face addresses in layer order
    pub fn addresses(&self) -> [PAddr; 6] {
        [self.px, self.nx, self.py, self.ny, self.pz, self.nz]
    }
}

/// Cube map composed from six face surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureCube {
    pub surface_id: SurfaceId,
    pub face_ids: [Option<SurfaceId>; 6],
    /// Face modification ticks at the time of the last copy
    pub ticks: [u64; 6],
}

/// Runtime counters of the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    pub surfaces_created: u64,
    pub surfaces_recycled: u64,
    pub surfaces_erased: u64,
    pub registrations: u64,
    pub unregistrations: u64,
    pub uploads: u64,
    pub custom_uploads: u64,
    pub downloads: u64,
    pub fill_downloads: u64,
    pub surface_copies: u64,
    pub reinterpretations: u64,
    pub texture_copies: u64,
    pub display_transfers: u64,
    pub fills: u64,
}
