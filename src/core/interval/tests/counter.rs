// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Interval counter tests

use super::super::*;

fn iv(lower: u32, upper: u32) -> Interval {
    Interval::new(lower, upper)
}

#[test]
fn test_add_overlapping_ranges() {
    let mut counter = IntervalCounter::new();
    counter.add(iv(0, 4), 1);
    counter.add(iv(2, 6), 1);

    assert_eq!(counter.count_at(0), 1);
    assert_eq!(counter.count_at(2), 2);
    assert_eq!(counter.count_at(3), 2);
    assert_eq!(counter.count_at(5), 1);
    assert_eq!(counter.count_at(6), 0);

    let segments: Vec<_> = counter.overlapping(iv(0, 6)).collect();
    assert_eq!(segments, vec![(iv(0, 2), 1), (iv(2, 4), 2), (iv(4, 6), 1)]);
}

#[test]
fn test_zero_counts_are_removed() {
    let mut counter = IntervalCounter::new();
    counter.add(iv(0, 4), 1);
    counter.add(iv(2, 6), 1);
    counter.add(iv(0, 4), -1);

    let segments: Vec<_> = counter.overlapping(iv(0, 10)).collect();
    assert_eq!(segments, vec![(iv(2, 6), 1)]);

    counter.add(iv(2, 6), -1);
    assert!(counter.is_empty());
}

#[test]
fn test_equal_neighbours_join() {
    let mut counter = IntervalCounter::new();
    counter.add(iv(0, 2), 1);
    counter.add(iv(2, 4), 1);
    let segments: Vec<_> = counter.overlapping(iv(0, 4)).collect();
    assert_eq!(segments, vec![(iv(0, 4), 1)]);
}

#[test]
fn test_erase_range() {
    let mut counter = IntervalCounter::new();
    counter.add(iv(0, 100), 3);
    counter.erase(iv(10, 20));
    assert_eq!(counter.count_at(15), 0);
    assert_eq!(counter.count_at(9), 3);
    assert_eq!(counter.count_at(20), 3);
}
