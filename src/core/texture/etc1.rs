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

//! ETC1 block decoding
//!
//! A 64-bit ETC1 block covers 4x4 texels. The block is split in two halves
//! (left/right, or top/bottom when flipped), each with its own base color
//! and modifier table.

const MODIFIER_TABLE: [[i32; 2]; 8] = [
    [2, 8],
    [5, 17],
    [9, 29],
    [13, 42],
    [18, 60],
    [24, 80],
    [33, 106],
    [47, 183],
];

#[inline]
fn bits(value: u64, offset: u32, count: u32) -> u64 {
    (value >> offset) & ((1u64 << count) - 1)
}

/// Sign-extended 3-bit field
#[inline]
fn signed3(value: u64, offset: u32) -> i32 {
    let raw = bits(value, offset, 3) as i32;
    if raw & 0x4 != 0 {
        raw - 8
    } else {
        raw
    }
}

#[inline]
fn expand4(value: i32) -> i32 {
    (value << 4) | value
}

#[inline]
fn expand5(value: i32) -> i32 {
    (value << 3) | (value >> 2)
}

/// Decode one texel of an ETC1 block
///
/// # Arguments
///
/// * `block` - The 64-bit block value (little-endian in memory)
/// * `x` - Column inside the block (0-3)
/// * `y` - Row inside the block (0-3), top to bottom
///
/// # Returns
///
/// The texel color as `[r, g, b]`
pub fn sample_etc1_subtile(block: u64, x: u32, y: u32) -> [u8; 3] {
    let texel = 4 * x + y;
    let flip = bits(block, 32, 1) != 0;
    let differential = bits(block, 33, 1) != 0;

    // Half selection uses the flipped coordinate
    let half_x = if flip { y } else { x };
    let second_half = half_x >= 2;

    let base = if differential {
        let mut r = bits(block, 59, 5) as i32;
        let mut g = bits(block, 51, 5) as i32;
        let mut b = bits(block, 43, 5) as i32;
        if second_half {
            r += signed3(block, 56);
            g += signed3(block, 48);
            b += signed3(block, 40);
        }
        [expand5(r & 0x1F), expand5(g & 0x1F), expand5(b & 0x1F)]
    } else if second_half {
        [
            expand4(bits(block, 56, 4) as i32),
            expand4(bits(block, 48, 4) as i32),
            expand4(bits(block, 40, 4) as i32),
        ]
    } else {
        [
            expand4(bits(block, 60, 4) as i32),
            expand4(bits(block, 52, 4) as i32),
            expand4(bits(block, 44, 4) as i32),
        ]
    };

    let table_index = if second_half {
        bits(block, 34, 3)
    } else {
        bits(block, 37, 3)
    } as usize;

    let subindex = bits(block, texel, 1) as usize;
    let mut modifier = MODIFIER_TABLE[table_index][subindex];
    if bits(block, 16 + texel, 1) != 0 {
        modifier = -modifier;
    }

    base.map(|channel| (channel + modifier).clamp(0, 255) as u8)
}
