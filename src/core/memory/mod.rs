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

//! Guest physical memory
//!
//! The rasterizer cache reads and writes guest memory through the
//! [`GuestMemory`] trait. [`PhysicalMemory`] is the in-process
//! implementation used by the binary and the tests; an emulator plugs in its
//! own memory system instead.
//!
//! # Memory Map
//!
//! | Physical Address Range | Region   | Size   |
//! |------------------------|----------|--------|
//! | 0x18000000-0x185FFFFF  | VRAM     | 6MB    |
//! | 0x1FF00000-0x1FF7FFFF  | DSP RAM  | 512KB  |
//! | 0x20000000-0x27FFFFFF  | FCRAM    | 128MB  |
//!
//! # Example
//!
//! ```
//! use pica_cache::core::memory::{GuestMemory, PhysicalMemory};
//!
//! let mut memory = PhysicalMemory::new();
//! memory.write32(0x1800_0000, 0x1234_5678).unwrap();
//! assert_eq!(memory.read32(0x1800_0000).unwrap(), 0x1234_5678);
//!
//! // Physical references run to the end of the containing region
//! let bytes = memory.physical_ref(0x185F_FFFC).unwrap();
//! assert_eq!(bytes.len(), 4);
//! ```

mod region;

#[cfg(test)]
mod tests;

pub use region::MemoryRegion;

use crate::core::common::PAddr;
use crate::core::error::{CacheError, Result};
use crate::core::interval::{Interval, IntervalSet};

/// Page granularity of cached-region notifications (4KB)
pub const PAGE_BITS: u32 = 12;

/// Page size of cached-region notifications
pub const PAGE_SIZE: u32 = 1 << PAGE_BITS;

/// Guest physical memory as seen by the rasterizer cache
pub trait GuestMemory {
    /// Mutable view of guest memory starting at `addr`
    ///
    /// The slice extends to the end of the memory region containing `addr`.
    /// Returns `None` if the address is not backed by memory.
    fn physical_ref(&mut self, addr: PAddr) -> Option<&mut [u8]>;

    /// Notification that a region gained or lost its last rasterizer surface
    ///
    /// Called with whole 4KB pages whenever the number of registered
    /// surfaces covering them changes between zero and non-zero.
    fn rasterizer_mark_region_cached(&mut self, addr: PAddr, size: u32, cached: bool);
}

/// One contiguous block of backed memory
struct Block {
    base: PAddr,
    kind: MemoryRegion,
    data: Vec<u8>,
}

impl Block {
    fn end(&self) -> u64 {
        self.base as u64 + self.data.len() as u64
    }

    fn contains(&self, addr: PAddr) -> bool {
        addr >= self.base && (addr as u64) < self.end()
    }
}

/// In-process guest physical memory
///
/// Holds the backed regions and a ledger of the pages the cache has
/// marked as cached.
pub struct PhysicalMemory {
    blocks: Vec<Block>,

    /// Page indices currently marked as cached
    cached_pages: IntervalSet,

    /// Number of mark/unmark notifications received
    mark_events: u64,
}

impl PhysicalMemory {
    /// VRAM physical address range
    pub const VRAM_PADDR: PAddr = 0x1800_0000;
    pub const VRAM_SIZE: u32 = 0x0060_0000;

    /// DSP RAM physical address range
    pub const DSP_RAM_PADDR: PAddr = 0x1FF0_0000;
    pub const DSP_RAM_SIZE: u32 = 0x0008_0000;

    /// FCRAM physical address range
    pub const FCRAM_PADDR: PAddr = 0x2000_0000;
    pub const FCRAM_SIZE: u32 = 0x0800_0000;

    /// Create memory with the 3DS physical map
    ///
    /// # Returns
    ///
    /// A new memory with VRAM, DSP RAM and FCRAM initialized to zero
    pub fn new() -> Self {
        Self::from_blocks(vec![
            Block {
                base: Self::VRAM_PADDR,
                kind: MemoryRegion::Vram,
                data: vec![0u8; Self::VRAM_SIZE as usize],
            },
            Block {
                base: Self::DSP_RAM_PADDR,
                kind: MemoryRegion::DspRam,
                data: vec![0u8; Self::DSP_RAM_SIZE as usize],
            },
            Block {
                base: Self::FCRAM_PADDR,
                kind: MemoryRegion::Fcram,
                data: vec![0u8; Self::FCRAM_SIZE as usize],
            },
        ])
    }

    /// Create memory with a single flat region
    ///
    /// # Arguments
    ///
    /// * `base` - First backed physical address
    /// * `size` - Size of the region in bytes
    ///
    /// # Example
    ///
    /// ```
    /// use pica_cache::core::memory::{MemoryRegion, PhysicalMemory};
    ///
    /// let memory = PhysicalMemory::flat(0x1000, 0x10000);
    /// assert_eq!(memory.identify_region(0x1000), MemoryRegion::Flat);
    /// assert_eq!(memory.identify_region(0x0FFF), MemoryRegion::Unmapped);
    /// ```
    pub fn flat(base: PAddr, size: u32) -> Self {
        Self::from_blocks(vec![Block {
            base,
            kind: MemoryRegion::Flat,
            data: vec![0u8; size as usize],
        }])
    }

    fn from_blocks(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            cached_pages: IntervalSet::new(),
            mark_events: 0,
        }
    }

    fn block(&self, addr: PAddr) -> Option<&Block> {
        self.blocks.iter().find(|block| block.contains(addr))
    }

    fn block_mut(&mut self, addr: PAddr) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|block| block.contains(addr))
    }

    /// Read a byte range that lies inside one region
    ///
    /// # Errors
    ///
    /// Returns `CacheError::UnmappedAddress` if any byte of the range is
    /// not backed by the region containing `addr`.
    pub fn read_block(&self, addr: PAddr, out: &mut [u8]) -> Result<()> {
        let block = self
            .block(addr)
            .ok_or(CacheError::UnmappedAddress { address: addr })?;
        let offset = (addr - block.base) as usize;
        let bytes = block
            .data
            .get(offset..offset + out.len())
            .ok_or(CacheError::UnmappedAddress {
                address: addr.wrapping_add(out.len() as u32),
            })?;
        out.copy_from_slice(bytes);
        Ok(())
    }

    /// Write a byte range that lies inside one region
    ///
    /// This models a raw CPU store; the caller is responsible for
    /// invalidating the rasterizer cache afterwards.
    pub fn write_block(&mut self, addr: PAddr, data: &[u8]) -> Result<()> {
        let block = self
            .block_mut(addr)
            .ok_or(CacheError::UnmappedAddress { address: addr })?;
        let offset = (addr - block.base) as usize;
        let bytes = block
            .data
            .get_mut(offset..offset + data.len())
            .ok_or(CacheError::UnmappedAddress {
                address: addr.wrapping_add(data.len() as u32),
            })?;
        bytes.copy_from_slice(data);
        Ok(())
    }

    /// Read 32-bit little-endian value
    pub fn read32(&self, addr: PAddr) -> Result<u32> {
        let mut bytes = [0u8; 4];
        self.read_block(addr, &mut bytes)?;
        Ok(u32::from_le_bytes(bytes))
    }

    /// Write 32-bit little-endian value
    pub fn write32(&mut self, addr: PAddr, value: u32) -> Result<()> {
        self.write_block(addr, &value.to_le_bytes())
    }

    /// Check whether the page containing `addr` is marked as cached
    pub fn is_cached(&self, addr: PAddr) -> bool {
        let page = addr >> PAGE_BITS;
        self.cached_pages.contains(Interval::new(page, page + 1))
    }

    /// Number of pages currently marked as cached
    pub fn cached_page_count(&self) -> u64 {
        self.cached_pages.total_length()
    }

    /// Number of mark/unmark notifications received so far
    pub fn mark_events(&self) -> u64 {
        self.mark_events
    }
}

impl Default for PhysicalMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl GuestMemory for PhysicalMemory {
    fn physical_ref(&mut self, addr: PAddr) -> Option<&mut [u8]> {
        let block = self.block_mut(addr)?;
        let offset = (addr - block.base) as usize;
        Some(&mut block.data[offset..])
    }

    fn rasterizer_mark_region_cached(&mut self, addr: PAddr, size: u32, cached: bool) {
        if size == 0 {
            return;
        }

        let first_page = addr >> PAGE_BITS;
        let last_page = ((addr as u64 + size as u64 - 1) >> PAGE_BITS) as u32;
        let pages = Interval::new(first_page, last_page + 1);

        self.mark_events += 1;
        if cached {
            if self.cached_pages.overlaps(pages) {
                log::warn!(
                    "Region 0x{:08X}+0x{:X} marked cached while already cached",
                    addr,
                    size
                );
            }
            self.cached_pages.insert(pages);
        } else {
            self.cached_pages.erase(pages);
        }

        log::trace!(
            "Rasterizer {} region 0x{:08X}+0x{:X}",
            if cached { "cached" } else { "uncached" },
            addr,
            size
        );
    }
}
