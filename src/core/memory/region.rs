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

//! Memory region identification

use super::PhysicalMemory;
use crate::core::common::PAddr;

/// Memory region identification
///
/// Used to identify which memory region an address belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryRegion {
    /// Video RAM (6MB)
    Vram,
    /// DSP shared RAM (512KB)
    DspRam,
    /// Main application RAM (128MB)
    Fcram,
    /// Single flat region created with `PhysicalMemory::flat`
    Flat,
    /// Unmapped region
    Unmapped,
}

impl PhysicalMemory {
    /// Identify memory region for a physical address
    ///
    /// # Example
    ///
    /// ```
    /// use pica_cache::core::memory::{MemoryRegion, PhysicalMemory};
    ///
    /// let memory = PhysicalMemory::new();
    ///
    /// assert_eq!(memory.identify_region(0x1800_0000), MemoryRegion::Vram);
    /// assert_eq!(memory.identify_region(0x1FF0_0000), MemoryRegion::DspRam);
    /// assert_eq!(memory.identify_region(0x2000_0000), MemoryRegion::Fcram);
    /// assert_eq!(memory.identify_region(0x1860_0000), MemoryRegion::Unmapped);
    /// ```
    pub fn identify_region(&self, addr: PAddr) -> MemoryRegion {
        self.block(addr)
            .map(|block| block.kind)
            .unwrap_or(MemoryRegion::Unmapped)
    }
}
