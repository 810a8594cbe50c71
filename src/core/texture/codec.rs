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

//! Whole-surface decode and encode
//!
//! Decoding turns guest bytes into a host buffer of `width * height` pixels,
//! rows bottom to top. Encoding is the inverse used when flushing. With
//! `convert` set (always for 4-bit and ETC formats) host pixels are RGBA8,
//! otherwise they keep the guest byte layout.

use super::morton::morton_interleave;
use super::texel::{decode_pixel, encode_pixel, lookup_texel};
use crate::core::pica::PixelFormat;

/// Layout of a guest image region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureLayout {
    pub width: u32,
    pub height: u32,
    /// Row length in pixels
    pub stride: u32,
    pub format: PixelFormat,
    pub is_tiled: bool,
}

/// Bytes per host pixel of a format
///
/// # Examples
///
/// ```
/// use pica_cache::core::pica::PixelFormat;
/// use pica_cache::core::texture::internal_bytes_per_pixel;
///
/// assert_eq!(internal_bytes_per_pixel(PixelFormat::RGB565, false), 2);
/// assert_eq!(internal_bytes_per_pixel(PixelFormat::RGB565, true), 4);
/// assert_eq!(internal_bytes_per_pixel(PixelFormat::ETC1, false), 4);
/// ```
pub fn internal_bytes_per_pixel(format: PixelFormat, convert: bool) -> u32 {
    if convert || format.is_always_decoded() {
        4
    } else {
        (format.bpp() / 8).max(1)
    }
}

/// Byte offset of a guest pixel index
#[inline]
fn bytes_in_pixels(format: PixelFormat, pixels: u64) -> usize {
    (pixels * format.bpp() as u64 / 8) as usize
}

/// Guest byte offset of the 8x8 tile containing (x, top-down y)
#[inline]
fn tile_offset(layout: &TextureLayout, x: u32, y: u32) -> usize {
    let tile_row = (y / 8) as u64;
    let tile_col = (x / 8) as u64;
    bytes_in_pixels(
        layout.format,
        tile_row * layout.stride as u64 * 8 + tile_col * 64,
    )
}

/// Visit every guest pixel as (host buffer index, guest byte offset, fine x, fine y)
///
/// For tiled layouts the guest offset is the start of the tile; for
/// linear layouts it is the pixel itself.
fn for_each_pixel(layout: &TextureLayout, mut visit: impl FnMut(usize, usize, u32, u32)) {
    // A single partial tile holds the low mips of small textures
    let partial_tile = layout.width <= 8 && layout.height <= 8;
    if layout.is_tiled && !partial_tile && (layout.width % 8 != 0 || layout.height % 8 != 0) {
        log::warn!(
            "Tiled layout {}x{} is not tile aligned",
            layout.width,
            layout.height
        );
        return;
    }

    for y in 0..layout.height {
        // Host rows run bottom to top; tiled rows are stored top to bottom
        let host_row = if layout.is_tiled {
            layout.height - 1 - y
        } else {
            y
        };
        for x in 0..layout.width {
            let host_index = (host_row * layout.width + x) as usize;
            if layout.is_tiled {
                visit(host_index, tile_offset(layout, x, y), x % 8, y % 8);
            } else {
                let pixel = y as u64 * layout.stride as u64 + x as u64;
                visit(host_index, bytes_in_pixels(layout.format, pixel), x, y);
            }
        }
    }
}

fn linear_texel(format: PixelFormat, source: &[u8], offset: usize, x: u32) -> [u8; 4] {
    match format {
        PixelFormat::I4 | PixelFormat::A4 => {
            let byte = source.get(offset).copied().unwrap_or(0);
            let nibble = if x % 2 == 1 { byte >> 4 } else { byte & 0xF };
            decode_pixel(format, &[nibble])
        }
        _ => decode_pixel(format, source.get(offset..).unwrap_or(&[])),
    }
}

/// Decode guest bytes into a host buffer
///
/// # Arguments
///
/// * `layout` - Layout of the region described by `source`
/// * `source` - Guest bytes starting at the first byte of the region
/// * `dest` - Host buffer with room for `width * height` pixels
/// * `convert` - Decode into RGBA8 instead of keeping the guest layout
pub fn decode_texture(layout: &TextureLayout, source: &[u8], dest: &mut [u8], convert: bool) {
    let format = layout.format;
    let convert = convert || format.is_always_decoded();
    let out_bpp = internal_bytes_per_pixel(format, convert) as usize;
    let guest_bpp = (format.bpp() / 8) as usize;

    for_each_pixel(layout, |host_index, offset, x, y| {
        let Some(out) = dest.get_mut(host_index * out_bpp..(host_index + 1) * out_bpp) else {
            return;
        };
        if convert {
            let rgba = if layout.is_tiled {
                lookup_texel(format, source.get(offset..).unwrap_or(&[]), x, y)
            } else {
                linear_texel(format, source, offset, x)
            };
            out.copy_from_slice(&rgba);
            return;
        }

        let pixel = if layout.is_tiled {
            offset + morton_interleave(x, y) as usize * guest_bpp
        } else {
            offset
        };
        if let Some(bytes) = source.get(pixel..pixel + guest_bpp) {
            out.copy_from_slice(bytes);
        }
    });
}

/// Encode a host buffer back into guest bytes
///
/// The inverse of [`decode_texture`]. Converted buffers can only be encoded
/// into byte-aligned color formats; other formats are left untouched.
pub fn encode_texture(layout: &TextureLayout, source: &[u8], dest: &mut [u8], convert: bool) {
    let format = layout.format;
    let convert = convert || format.is_always_decoded();
    let in_bpp = internal_bytes_per_pixel(format, convert) as usize;
    let guest_bpp = (format.bpp() / 8) as usize;

    if convert && (format.is_always_decoded() || format == PixelFormat::Invalid) {
        log::warn!("Unable to encode {} surfaces to guest memory", format.name());
        return;
    }

    for_each_pixel(layout, |host_index, offset, x, y| {
        let Some(pixel) = source.get(host_index * in_bpp..(host_index + 1) * in_bpp) else {
            return;
        };
        let target = if layout.is_tiled {
            offset + morton_interleave(x, y) as usize * guest_bpp
        } else {
            offset
        };
        let Some(out) = dest.get_mut(target..target + guest_bpp) else {
            return;
        };
        if convert {
            encode_pixel(format, [pixel[0], pixel[1], pixel[2], pixel[3]], out);
        } else {
            out.copy_from_slice(pixel);
        }
    });
}
