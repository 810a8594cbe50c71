// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Interval set tests

use super::super::*;

fn iv(lower: u32, upper: u32) -> Interval {
    Interval::new(lower, upper)
}

#[test]
fn test_interval_basics() {
    let a = iv(0x10, 0x20);
    assert_eq!(a.length(), 0x10);
    assert!(a.overlaps(&iv(0x1F, 0x30)));
    assert!(!a.overlaps(&iv(0x20, 0x30)));
    assert!(a.contains(&iv(0x12, 0x20)));
    assert!((a & iv(0x20, 0x30)).is_empty());
    assert_eq!(a & iv(0x18, 0x30), iv(0x18, 0x20));

    // Reversed bounds collapse to an empty interval
    assert!(iv(0x30, 0x10).is_empty());
}

#[test]
fn test_insert_joins_overlapping_and_touching() {
    let mut set = IntervalSet::new();
    set.insert(iv(0x100, 0x200));
    set.insert(iv(0x300, 0x400));
    assert_eq!(set.len(), 2);

    set.insert(iv(0x200, 0x300));
    assert_eq!(set.len(), 1);
    assert_eq!(set.first(), Some(iv(0x100, 0x400)));

    set.insert(iv(0x50, 0x150));
    assert_eq!(set.first(), Some(iv(0x50, 0x400)));
}

#[test]
fn test_erase_splits_interval() {
    let mut set = IntervalSet::from(iv(0x1000, 0x2000));
    set.erase(iv(0x1400, 0x1800));

    let parts: Vec<_> = set.iter().collect();
    assert_eq!(parts, vec![iv(0x1000, 0x1400), iv(0x1800, 0x2000)]);

    set.erase(iv(0x0, 0x1200));
    assert_eq!(set.first(), Some(iv(0x1200, 0x1400)));

    set.erase(iv(0x0, 0x3000));
    assert!(set.is_empty());
}

#[test]
fn test_find_and_contains() {
    let mut set = IntervalSet::new();
    set.insert(iv(0x100, 0x200));
    set.insert(iv(0x400, 0x500));

    assert_eq!(set.find(iv(0x180, 0x190)), Some(iv(0x100, 0x200)));
    assert_eq!(set.find(iv(0x200, 0x400)), None);
    assert_eq!(set.find(iv(0x300, 0x401)), Some(iv(0x400, 0x500)));

    assert!(set.contains(iv(0x100, 0x200)));
    assert!(!set.contains(iv(0x100, 0x201)));
    assert!(set.overlaps(iv(0x1FF, 0x400)));
}

#[test]
fn test_intersection_and_difference() {
    let mut set = IntervalSet::new();
    set.insert(iv(0x0, 0x100));
    set.insert(iv(0x200, 0x300));

    let clipped = &set & iv(0x80, 0x280);
    let parts: Vec<_> = clipped.iter().collect();
    assert_eq!(parts, vec![iv(0x80, 0x100), iv(0x200, 0x280)]);
    assert_eq!(clipped.total_length(), 0x100);

    let remaining = IntervalSet::from(iv(0x0, 0x300)) - &set;
    assert_eq!(remaining.first(), Some(iv(0x100, 0x200)));
    assert_eq!(remaining.len(), 1);
}
