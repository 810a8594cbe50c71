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

//! PICA texture layouts and texel formats
//!
//! Guest surfaces are either linear (rows bottom to top) or tiled in 8x8
//! blocks whose texels follow a Morton (Z-order) curve, with tile rows
//! stored top to bottom. Host-side buffers are always linear and bottom to
//! top, so decoding a tiled surface also flips it vertically.
//!
//! - `morton`: Morton interleaving inside an 8x8 tile
//! - `texel`: Per-texel decode/encode of every pixel format
//! - `etc1`: ETC1 block decoding
//! - `codec`: Whole-surface decode (upload) and encode (download)
//!
//! # References
//!
//! - [3DBrew: GPU/Textures](https://www.3dbrew.org/wiki/GPU/Textures)

mod codec;
mod etc1;
mod morton;
mod texel;

#[cfg(test)]
mod tests;

pub use codec::{decode_texture, encode_texture, internal_bytes_per_pixel, TextureLayout};
pub use etc1::sample_etc1_subtile;
pub use morton::morton_interleave;
pub use texel::{decode_pixel, encode_pixel, lookup_texel};
