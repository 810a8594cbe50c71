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

//! Additive interval counter

use super::{Interval, IntervalMap};

/// Map from intervals to signed reference counts
///
/// `add` sums `delta` into every element of the interval. Elements whose
/// count returns to zero are dropped from the map, so only covered ranges
/// are ever stored.
#[derive(Debug, Clone, Default)]
pub struct IntervalCounter {
    map: IntervalMap<i32>,
}

impl IntervalCounter {
    /// Create an empty counter
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no element has a non-zero count
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Add `delta` to every element of `interval`
    pub fn add(&mut self, interval: Interval, delta: i32) {
        if interval.is_empty() || delta == 0 {
            return;
        }

        self.map.split_at(interval.lower());
        self.map.split_at(interval.upper());

        let segments = self.map.segments_mut();
        let existing: Vec<(u32, u32, i32)> = segments
            .range(interval.lower()..interval.upper())
            .map(|(&lower, &(upper, count))| (lower, upper, count))
            .collect();

        let mut cursor = interval.lower();
        for (lower, upper, count) in existing {
            if cursor < lower {
                segments.insert(cursor, (lower, delta));
            }
            let sum = count + delta;
            if sum == 0 {
                segments.remove(&lower);
            } else {
                segments.insert(lower, (upper, sum));
            }
            cursor = upper;
        }
        if cursor < interval.upper() {
            segments.insert(cursor, (interval.upper(), delta));
        }

        self.map.join_around(interval);
    }

    /// Count segments overlapping `interval`, unclipped
    pub fn overlapping(&self, interval: Interval) -> impl Iterator<Item = (Interval, i32)> + '_ {
        self.map.overlapping(interval)
    }

    /// Count of a single element, zero when uncovered
    pub fn count_at(&self, point: u32) -> i32 {
        self.map
            .find(Interval::new(point, point.saturating_add(1)))
            .map(|(_, count)| count)
            .unwrap_or(0)
    }

    /// Drop every count inside `interval`
    pub fn erase(&mut self, interval: Interval) {
        self.map.erase(interval);
    }
}
