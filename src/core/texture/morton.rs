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

//! Morton order inside an 8x8 tile

/// Index of texel (x, y) inside an 8x8 tile
///
/// The low three bits of each coordinate are interleaved with x in the
/// even bit positions.
///
/// # Examples
///
/// ```
/// use pica_cache::core::texture::morton_interleave;
///
/// assert_eq!(morton_interleave(0, 0), 0);
/// assert_eq!(morton_interleave(1, 0), 1);
/// assert_eq!(morton_interleave(0, 1), 2);
/// assert_eq!(morton_interleave(7, 7), 63);
/// ```
#[inline]
pub const fn morton_interleave(x: u32, y: u32) -> u32 {
    const XLUT: [u32; 8] = [0x00, 0x01, 0x04, 0x05, 0x10, 0x11, 0x14, 0x15];
    const YLUT: [u32; 8] = [0x00, 0x02, 0x08, 0x0A, 0x20, 0x22, 0x28, 0x2A];
    XLUT[(x % 8) as usize] + YLUT[(y % 8) as usize]
}
