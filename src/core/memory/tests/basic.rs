// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Basic guest memory tests

use super::*;

#[test]
fn test_read_write_roundtrip() {
    let mut memory = PhysicalMemory::new();
    memory.write32(PhysicalMemory::FCRAM_PADDR + 0x100, 0xDEAD_BEEF).unwrap();
    assert_eq!(
        memory.read32(PhysicalMemory::FCRAM_PADDR + 0x100).unwrap(),
        0xDEAD_BEEF
    );

    let mut bytes = [0u8; 4];
    memory
        .read_block(PhysicalMemory::FCRAM_PADDR + 0x100, &mut bytes)
        .unwrap();
    // Little-endian layout
    assert_eq!(bytes, [0xEF, 0xBE, 0xAD, 0xDE]);
}

#[test]
fn test_unmapped_access_fails() {
    let mut memory = PhysicalMemory::new();
    assert!(memory.read32(0x0000_1000).is_err());
    assert!(memory.write32(0x1000_0000, 0).is_err());
    assert!(memory.physical_ref(0x0000_1000).is_none());
}

#[test]
fn test_access_crossing_region_end_fails() {
    let mut memory = PhysicalMemory::new();
    let last = PhysicalMemory::VRAM_PADDR + PhysicalMemory::VRAM_SIZE - 2;
    assert!(memory.write32(last, 0x1234_5678).is_err());
    assert!(memory.write_block(last, &[1, 2]).is_ok());
}

#[test]
fn test_physical_ref_extends_to_region_end() {
    let mut memory = PhysicalMemory::flat(0x1000, 0x2000);
    memory.write_block(0x1800, &[0xAA; 16]).unwrap();

    let bytes = memory.physical_ref(0x1800).unwrap();
    assert_eq!(bytes.len(), 0x1800);
    assert_eq!(&bytes[..16], &[0xAA; 16]);

    // Writes through the reference are visible to reads
    bytes[0] = 0x55;
    assert_eq!(memory.read32(0x1800).unwrap() & 0xFF, 0x55);
}
