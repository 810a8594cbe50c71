// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Memory region boundary tests

use super::*;

#[test]
fn test_region_boundaries() {
    let memory = PhysicalMemory::new();

    assert_eq!(memory.identify_region(0x17FF_FFFF), MemoryRegion::Unmapped);
    assert_eq!(memory.identify_region(0x1800_0000), MemoryRegion::Vram);
    assert_eq!(memory.identify_region(0x185F_FFFF), MemoryRegion::Vram);
    assert_eq!(memory.identify_region(0x1860_0000), MemoryRegion::Unmapped);

    assert_eq!(memory.identify_region(0x1FF7_FFFF), MemoryRegion::DspRam);
    assert_eq!(memory.identify_region(0x1FF8_0000), MemoryRegion::Unmapped);

    assert_eq!(memory.identify_region(0x2000_0000), MemoryRegion::Fcram);
    assert_eq!(memory.identify_region(0x27FF_FFFF), MemoryRegion::Fcram);
    assert_eq!(memory.identify_region(0x2800_0000), MemoryRegion::Unmapped);
}

#[test]
fn test_flat_region_at_top_of_address_space() {
    let memory = PhysicalMemory::flat(0xFFFF_F000, 0x1000);
    assert_eq!(memory.identify_region(0xFFFF_FFFF), MemoryRegion::Flat);
    assert_eq!(memory.identify_region(0xFFFF_EFFF), MemoryRegion::Unmapped);
}
