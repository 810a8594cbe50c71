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

//! Joined interval set

use super::Interval;
use std::collections::BTreeMap;
use std::ops::{BitAnd, Sub};

/// Set of disjoint, non-touching intervals
///
/// Inserting an interval that overlaps or touches stored intervals merges
/// them into one. Stored as `lower -> upper` in a `BTreeMap`, so lookups are
/// `O(log n + k)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalSet {
    ranges: BTreeMap<u32, u32>,
}

impl IntervalSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of disjoint intervals stored
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// True when the set holds no elements
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Remove every interval
    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// Lowest stored interval
    pub fn first(&self) -> Option<Interval> {
        self.ranges
            .iter()
            .next()
            .map(|(&lower, &upper)| Interval::new(lower, upper))
    }

    /// Iterate stored intervals in ascending order
    pub fn iter(&self) -> impl Iterator<Item = Interval> + '_ {
        self.ranges
            .iter()
            .map(|(&lower, &upper)| Interval::new(lower, upper))
    }

    /// Add an interval, joining it with overlapping and touching neighbours
    pub fn insert(&mut self, interval: Interval) {
        if interval.is_empty() {
            return;
        }

        let mut lower = interval.lower();
        let mut upper = interval.upper();

        // A predecessor reaching our lower bound is absorbed
        if let Some((&prev_lower, &prev_upper)) = self.ranges.range(..lower).next_back() {
            if prev_upper >= lower {
                lower = prev_lower;
                upper = upper.max(prev_upper);
            }
        }

        let absorbed: Vec<u32> = self
            .ranges
            .range(lower..=upper)
            .map(|(&start, _)| start)
            .collect();
        for start in absorbed {
            if let Some(end) = self.ranges.remove(&start) {
                upper = upper.max(end);
            }
        }

        self.ranges.insert(lower, upper);
    }

    /// Remove all elements of `interval` from the set
    pub fn erase(&mut self, interval: Interval) {
        if interval.is_empty() {
            return;
        }

        let lower = interval.lower();
        let upper = interval.upper();

        if let Some((&prev_lower, &prev_upper)) = self.ranges.range(..lower).next_back() {
            if prev_upper > lower {
                self.ranges.insert(prev_lower, lower);
                if prev_upper > upper {
                    self.ranges.insert(upper, prev_upper);
                    return;
                }
            }
        }

        let inside: Vec<(u32, u32)> = self
            .ranges
            .range(lower..upper)
            .map(|(&start, &end)| (start, end))
            .collect();
        for (start, end) in inside {
            self.ranges.remove(&start);
            if end > upper {
                self.ranges.insert(upper, end);
            }
        }
    }

    /// Remove every interval of `other` from the set
    pub fn erase_set(&mut self, other: &IntervalSet) {
        for interval in other.iter() {
            self.erase(interval);
        }
    }

    /// First stored interval overlapping `interval`
    pub fn find(&self, interval: Interval) -> Option<Interval> {
        if interval.is_empty() {
            return None;
        }
        if let Some((&lower, &upper)) = self.ranges.range(..interval.lower()).next_back() {
            if upper > interval.lower() {
                return Some(Interval::new(lower, upper));
            }
        }
        self.ranges
            .range(interval.lower()..interval.upper())
            .next()
            .map(|(&lower, &upper)| Interval::new(lower, upper))
    }

    /// True when any element of `interval` is in the set
    pub fn overlaps(&self, interval: Interval) -> bool {
        self.find(interval).is_some()
    }

    /// True when every element of `interval` is in the set
    pub fn contains(&self, interval: Interval) -> bool {
        match self.find(interval) {
            Some(stored) => stored.contains(&interval),
            None => interval.is_empty(),
        }
    }

    /// Elements of the set that fall inside `interval`
    pub fn intersection(&self, interval: Interval) -> IntervalSet {
        let mut result = IntervalSet::new();
        if interval.is_empty() {
            return result;
        }
        if let Some((&lower, &upper)) = self.ranges.range(..interval.lower()).next_back() {
            let clipped = Interval::new(lower, upper) & interval;
            if !clipped.is_empty() {
                result.ranges.insert(clipped.lower(), clipped.upper());
            }
        }
        for (&lower, &upper) in self.ranges.range(interval.lower()..interval.upper()) {
            let clipped = Interval::new(lower, upper) & interval;
            result.ranges.insert(clipped.lower(), clipped.upper());
        }
        result
    }

    /// Total number of elements across all intervals
    pub fn total_length(&self) -> u64 {
        self.ranges
            .iter()
            .map(|(&lower, &upper)| u64::from(upper - lower))
            .sum()
    }
}

impl From<Interval> for IntervalSet {
    fn from(interval: Interval) -> Self {
        let mut set = IntervalSet::new();
        set.insert(interval);
        set
    }
}

impl BitAnd<Interval> for &IntervalSet {
    type Output = IntervalSet;

    fn bitand(self, rhs: Interval) -> IntervalSet {
        self.intersection(rhs)
    }
}

impl Sub<&IntervalSet> for IntervalSet {
    type Output = IntervalSet;

    fn sub(mut self, rhs: &IntervalSet) -> IntervalSet {
        self.erase_set(rhs);
        self
    }
}
