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

//! Custom texture replacement
//!
//! Uploaded textures are identified by a 64-bit content hash. A custom
//! texture manager maps hashes to replacement [`Material`]s, decodes them
//! (possibly in the background) and receives dumps of uploaded textures.
//!
//! The cache only talks to the [`CustomTexManager`] trait:
//! - [`NullCustomTexManager`]: no replacements, dumps are dropped
//! - [`MemoryCustomTexManager`]: replacements registered in memory, with an
//!   optional deferred decode that completes on the next frame tick

#[cfg(test)]
mod tests;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::core::pica::PixelFormat;
use crate::core::rasterizer_cache::SurfaceParams;

/// Replacement texture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Material {
    /// Hash of the texture this material replaces
    pub hash: u64,
    pub width: u32,
    pub height: u32,
    /// RGBA8 pixels, rows bottom to top
    pub data: Vec<u8>,
}

impl Material {
    /// Create a material filled with one color
    ///
    /// # Example
    ///
    /// ```
    /// use pica_cache::core::custom_tex::Material;
    ///
    /// let material = Material::solid(0xDEAD_BEEF, 4, 4, [255, 0, 0, 255]);
    /// assert_eq!(material.data.len(), 4 * 4 * 4);
    /// ```
    pub fn solid(hash: u64, width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            hash,
            width,
            height,
            data,
        }
    }
}

/// Result of asking a manager to decode a material
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// Pixels are available, upload now
    Ready,
    /// Decode is in flight; poll [`CustomTexManager::is_decoded`]
    Pending,
}

/// Texture dumped by [`MemoryCustomTexManager`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpedTexture {
    pub hash: u64,
    pub level: u32,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

/// Collaborator that supplies replacement textures
pub trait CustomTexManager {
    /// Advance background work by one frame
    fn tick_frame(&mut self);

    /// Scan for replacement textures, returning how many are available
    fn find_custom_textures(&mut self) -> usize;

    /// Replacement for the texture with content hash `hash`
    fn get_material(&mut self, hash: u64) -> Option<Arc<Material>>;

    /// Store an uploaded texture
    ///
    /// `data` holds the raw guest bytes of the level.
    fn dump_texture(&mut self, params: &SurfaceParams, level: u32, data: &[u8], hash: u64);

    /// Start decoding `material`
    fn decode(&mut self, material: &Arc<Material>) -> DecodeStatus;

    /// True once a pending decode of `material` has completed
    fn is_decoded(&self, material: &Material) -> bool;

    /// Replacements only provide level 0; lower levels are generated
    fn skip_mipmaps(&self) -> bool;

    /// Hash raw guest bytes instead of decoded texels
    fn use_new_hash(&self) -> bool;
}

/// Manager without any replacement textures
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCustomTexManager;

impl CustomTexManager for NullCustomTexManager {
    fn tick_frame(&mut self) {}

    fn find_custom_textures(&mut self) -> usize {
        0
    }

    fn get_material(&mut self, _hash: u64) -> Option<Arc<Material>> {
        None
    }

    fn dump_texture(&mut self, _params: &SurfaceParams, _level: u32, _data: &[u8], _hash: u64) {}

    fn decode(&mut self, _material: &Arc<Material>) -> DecodeStatus {
        DecodeStatus::Ready
    }

    fn is_decoded(&self, _material: &Material) -> bool {
        true
    }

    fn skip_mipmaps(&self) -> bool {
        true
    }

    fn use_new_hash(&self) -> bool {
        true
    }
}

/// Manager holding replacement textures in memory
///
/// With `async_decode` set, [`decode`](CustomTexManager::decode) reports
/// [`DecodeStatus::Pending`] and the material becomes decoded on the next
/// [`tick_frame`](CustomTexManager::tick_frame).
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use pica_cache::core::custom_tex::{
///     CustomTexManager, DecodeStatus, Material, MemoryCustomTexManager,
/// };
///
/// let mut manager = MemoryCustomTexManager::new();
/// manager.async_decode = true;
/// manager.insert(Material::solid(7, 8, 8, [0, 255, 0, 255]));
///
/// let material = manager.get_material(7).unwrap();
/// assert_eq!(manager.decode(&material), DecodeStatus::Pending);
/// manager.tick_frame();
/// assert!(manager.is_decoded(&material));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryCustomTexManager {
    materials: HashMap<u64, Arc<Material>>,
    /// Materials registered but not yet published by `find_custom_textures`
    staged: Vec<Material>,
    decoded: HashSet<u64>,
    pending: Vec<u64>,
    dumps: Vec<DumpedTexture>,
    pub async_decode: bool,
    pub skip_mipmaps: bool,
    pub use_new_hash: bool,
}

impl MemoryCustomTexManager {
    pub fn new() -> Self {
        Self {
            skip_mipmaps: true,
            use_new_hash: true,
            ..Default::default()
        }
    }

    /// Make a replacement available immediately
    pub fn insert(&mut self, material: Material) {
        self.materials.insert(material.hash, Arc::new(material));
    }

    /// Register a replacement that becomes visible on the next scan
    pub fn stage(&mut self, material: Material) {
        self.staged.push(material);
    }

    /// Textures dumped so far
    pub fn dumps(&self) -> &[DumpedTexture] {
        &self.dumps
    }
}

impl CustomTexManager for MemoryCustomTexManager {
    fn tick_frame(&mut self) {
        for hash in self.pending.drain(..) {
            self.decoded.insert(hash);
        }
    }

    fn find_custom_textures(&mut self) -> usize {
        for material in self.staged.drain(..) {
            self.materials.insert(material.hash, Arc::new(material));
        }
        log::info!("Found {} custom textures", self.materials.len());
        self.materials.len()
    }

    fn get_material(&mut self, hash: u64) -> Option<Arc<Material>> {
        self.materials.get(&hash).cloned()
    }

    fn dump_texture(&mut self, params: &SurfaceParams, level: u32, data: &[u8], hash: u64) {
        if self.dumps.iter().any(|dump| dump.hash == hash && dump.level == level) {
            return;
        }
        log::debug!("Dumping texture {:016X} level {}", hash, level);
        self.dumps.push(DumpedTexture {
            hash,
            level,
            width: params.width,
            height: params.height,
            format: params.pixel_format,
            data: data.to_vec(),
        });
    }

    fn decode(&mut self, material: &Arc<Material>) -> DecodeStatus {
        if !self.async_decode || self.decoded.contains(&material.hash) {
            self.decoded.insert(material.hash);
            return DecodeStatus::Ready;
        }
        if !self.pending.contains(&material.hash) {
            self.pending.push(material.hash);
        }
        DecodeStatus::Pending
    }

    fn is_decoded(&self, material: &Material) -> bool {
        self.decoded.contains(&material.hash)
    }

    fn skip_mipmaps(&self) -> bool {
        self.skip_mipmaps
    }

    fn use_new_hash(&self) -> bool {
        self.use_new_hash
    }
}
