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

//! Custom assertions for cache tests

use super::fixtures::TestCache;

/// Assert that every byte of guest memory in a range equals `value`
///
/// Reads memory directly, without flushing the cache.
#[allow(dead_code)]
pub fn assert_memory_filled(cache: &TestCache, addr: u32, len: usize, value: u8) {
    let mut out = vec![0; len];
    cache
        .memory()
        .read_block(addr, &mut out)
        .expect("Failed to read from memory");
    if let Some(offset) = out.iter().position(|&b| b != value) {
        panic!(
            "Memory at 0x{:08X} is 0x{:02X}, expected 0x{:02X}",
            addr + offset as u32,
            out[offset],
            value
        );
    }
}

/// Assert the number of registered surfaces covering a range
#[allow(dead_code)]
pub fn assert_surfaces_in_region(cache: &TestCache, addr: u32, size: u32, expected: usize) {
    let surfaces = cache.surfaces_in_region(addr, size);
    assert_eq!(
        surfaces.len(),
        expected,
        "Expected {} surfaces at 0x{:08X}, found {:?}",
        expected,
        addr,
        surfaces
    );
}
