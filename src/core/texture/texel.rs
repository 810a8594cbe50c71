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

//! Per-texel decode and encode

use super::etc1::sample_etc1_subtile;
use super::morton::morton_interleave;
use crate::core::pica::PixelFormat;

#[inline]
const fn expand1(value: u16) -> u8 {
    if value != 0 {
        255
    } else {
        0
    }
}

#[inline]
const fn expand4(value: u16) -> u8 {
    ((value << 4) | value) as u8
}

#[inline]
const fn expand5(value: u16) -> u8 {
    ((value << 3) | (value >> 2)) as u8
}

#[inline]
const fn expand6(value: u16) -> u8 {
    ((value << 2) | (value >> 4)) as u8
}

/// Read bytes from a slice, padding past its end with zeros
#[inline]
fn byte_at(bytes: &[u8], index: usize) -> u8 {
    bytes.get(index).copied().unwrap_or(0)
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([byte_at(bytes, offset), byte_at(bytes, offset + 1)])
}

fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    let mut raw = [0u8; 8];
    for (i, byte) in raw.iter_mut().enumerate() {
        *byte = byte_at(bytes, offset + i);
    }
    u64::from_le_bytes(raw)
}

/// Decode one pixel stored at the start of `bytes`
///
/// 4-bit formats read the low nibble. Depth formats and compressed formats
/// have no color meaning; their raw bytes are returned as-is.
///
/// # Examples
///
/// ```
/// use pica_cache::core::pica::PixelFormat;
/// use pica_cache::core::texture::decode_pixel;
///
/// // RGBA8 is stored as ABGR in memory
/// let rgba = decode_pixel(PixelFormat::RGBA8, &[0x40, 0x30, 0x20, 0x10]);
/// assert_eq!(rgba, [0x10, 0x20, 0x30, 0x40]);
/// // Pure red in RGB565
/// assert_eq!(decode_pixel(PixelFormat::RGB565, &0xF800u16.to_le_bytes()), [255, 0, 0, 255]);
/// ```
pub fn decode_pixel(format: PixelFormat, bytes: &[u8]) -> [u8; 4] {
    let b = |i| byte_at(bytes, i);
    match format {
        PixelFormat::RGBA8 => [b(3), b(2), b(1), b(0)],
        PixelFormat::RGB8 => [b(2), b(1), b(0), 255],
        PixelFormat::RGB5A1 => {
            let pixel = read_u16(bytes, 0);
            [
                expand5(pixel >> 11),
                expand5((pixel >> 6) & 0x1F),
                expand5((pixel >> 1) & 0x1F),
                expand1(pixel & 0x1),
            ]
        }
        PixelFormat::RGB565 => {
            let pixel = read_u16(bytes, 0);
            [
                expand5(pixel >> 11),
                expand6((pixel >> 5) & 0x3F),
                expand5(pixel & 0x1F),
                255,
            ]
        }
        PixelFormat::RGBA4 => {
            let pixel = read_u16(bytes, 0);
            [
                expand4(pixel >> 12),
                expand4((pixel >> 8) & 0xF),
                expand4((pixel >> 4) & 0xF),
                expand4(pixel & 0xF),
            ]
        }
        PixelFormat::IA8 => [b(1), b(1), b(1), b(0)],
        PixelFormat::RG8 => [b(1), b(0), 0, 255],
        PixelFormat::I8 => [b(0), b(0), b(0), 255],
        PixelFormat::A8 => [0, 0, 0, b(0)],
        PixelFormat::IA4 => {
            let intensity = expand4((b(0) >> 4) as u16);
            [intensity, intensity, intensity, expand4((b(0) & 0xF) as u16)]
        }
        PixelFormat::I4 => {
            let intensity = expand4((b(0) & 0xF) as u16);
            [intensity, intensity, intensity, 255]
        }
        PixelFormat::A4 => [0, 0, 0, expand4((b(0) & 0xF) as u16)],
        _ => [b(0), b(1), b(2), b(3)],
    }
}

/// Encode one RGBA pixel into `out`
///
/// Only formats with a byte-aligned color layout can be encoded. Returns
/// `false` (leaving `out` untouched) for 4-bit, compressed and depth formats.
pub fn encode_pixel(format: PixelFormat, rgba: [u8; 4], out: &mut [u8]) -> bool {
    let [r, g, b, a] = rgba;
    let pack16 = |value: u16, out: &mut [u8]| {
        out[..2].copy_from_slice(&value.to_le_bytes());
    };
    match format {
        PixelFormat::RGBA8 => out[..4].copy_from_slice(&[a, b, g, r]),
        PixelFormat::RGB8 => out[..3].copy_from_slice(&[b, g, r]),
        PixelFormat::RGB5A1 => pack16(
            ((r as u16 >> 3) << 11)
                | ((g as u16 >> 3) << 6)
                | ((b as u16 >> 3) << 1)
                | (a as u16 >> 7),
            out,
        ),
        PixelFormat::RGB565 => pack16(
            ((r as u16 >> 3) << 11) | ((g as u16 >> 2) << 5) | (b as u16 >> 3),
            out,
        ),
        PixelFormat::RGBA4 => pack16(
            ((r as u16 >> 4) << 12)
                | ((g as u16 >> 4) << 8)
                | ((b as u16 >> 4) << 4)
                | (a as u16 >> 4),
            out,
        ),
        PixelFormat::IA8 => out[..2].copy_from_slice(&[a, r]),
        PixelFormat::RG8 => out[..2].copy_from_slice(&[g, r]),
        PixelFormat::I8 => out[0] = r,
        PixelFormat::A8 => out[0] = a,
        PixelFormat::IA4 => out[0] = (r & 0xF0) | (a >> 4),
        _ => return false,
    }
    true
}

/// Decode texel (x, y) of an 8x8 tile
///
/// # Arguments
///
/// * `format` - Pixel format of the tile
/// * `tile` - Tile data, starting at the first byte of the tile
/// * `x` - Column inside the tile (0-7)
/// * `y` - Row inside the tile (0-7), top to bottom
///
/// # Returns
///
/// The texel color as `[r, g, b, a]`
pub fn lookup_texel(format: PixelFormat, tile: &[u8], x: u32, y: u32) -> [u8; 4] {
    match format {
        PixelFormat::ETC1 | PixelFormat::ETC1A4 => {
            let has_alpha = format == PixelFormat::ETC1A4;
            let subtile_size = if has_alpha { 16 } else { 8 };

            // Each 8x8 tile holds four 4x4 blocks in row-major order
            let subtile_index = (x / 4 + 2 * (y / 4)) as usize;
            let (x, y) = (x % 4, y % 4);
            let mut offset = subtile_index * subtile_size;

            let mut alpha = 255;
            if has_alpha {
                let packed_alpha = read_u64(tile, offset);
                offset += 8;
                alpha = expand4(((packed_alpha >> (4 * (x * 4 + y))) & 0xF) as u16);
            }

            let [r, g, b] = sample_etc1_subtile(read_u64(tile, offset), x, y);
            [r, g, b, alpha]
        }
        PixelFormat::I4 | PixelFormat::A4 => {
            let morton = morton_interleave(x, y) as usize;
            let byte = byte_at(tile, morton / 2);
            let nibble = if morton % 2 == 1 { byte >> 4 } else { byte & 0xF };
            decode_pixel(format, &[nibble])
        }
        _ => {
            let bytes_per_pixel = (format.bpp() / 8) as usize;
            let offset = morton_interleave(x, y) as usize * bytes_per_pixel;
            decode_pixel(format, tile.get(offset..).unwrap_or(&[]))
        }
    }
}
