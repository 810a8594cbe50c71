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

//! Interval map with overwrite semantics

use super::{Interval, IntervalSet};
use std::collections::BTreeMap;

/// Map from disjoint intervals to values
///
/// `set` overwrites whatever was stored over the interval. Adjacent segments
/// holding equal values are joined, so a segment is always a maximal run.
#[derive(Debug, Clone)]
pub struct IntervalMap<V> {
    /// `lower -> (upper, value)`
    segments: BTreeMap<u32, (u32, V)>,
}

impl<V> Default for IntervalMap<V> {
    fn default() -> Self {
        Self {
            segments: BTreeMap::new(),
        }
    }
}

impl<V: Copy + PartialEq> IntervalMap<V> {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True when nothing is stored
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Remove every segment
    pub fn clear(&mut self) {
        self.segments.clear();
    }

    /// Iterate all segments in ascending order
    pub fn iter(&self) -> impl Iterator<Item = (Interval, V)> + '_ {
        self.segments
            .iter()
            .map(|(&lower, &(upper, value))| (Interval::new(lower, upper), value))
    }

    /// Segments overlapping `interval`, unclipped, in ascending order
    pub fn overlapping(&self, interval: Interval) -> impl Iterator<Item = (Interval, V)> + '_ {
        let head = if interval.is_empty() {
            None
        } else {
            self.segments
                .range(..interval.lower())
                .next_back()
                .filter(|(_, (upper, _))| *upper > interval.lower())
                .map(|(&lower, &(upper, value))| (Interval::new(lower, upper), value))
        };
        let tail = self
            .segments
            .range(interval.lower()..interval.upper().max(interval.lower()))
            .map(|(&lower, &(upper, value))| (Interval::new(lower, upper), value));
        head.into_iter().chain(tail)
    }

    /// First segment overlapping `interval`
    pub fn find(&self, interval: Interval) -> Option<(Interval, V)> {
        self.overlapping(interval).next()
    }

    /// Store `value` over `interval`, replacing previous values
    pub fn set(&mut self, interval: Interval, value: V) {
        if interval.is_empty() {
            return;
        }
        self.erase(interval);
        self.segments
            .insert(interval.lower(), (interval.upper(), value));
        self.join_around(interval);
    }

    /// Remove every mapping inside `interval`
    pub fn erase(&mut self, interval: Interval) {
        if interval.is_empty() {
            return;
        }
        self.split_at(interval.lower());
        self.split_at(interval.upper());
        let inside: Vec<u32> = self
            .segments
            .range(interval.lower()..interval.upper())
            .map(|(&lower, _)| lower)
            .collect();
        for lower in inside {
            self.segments.remove(&lower);
        }
    }

    /// Remove every interval of `set` from the map
    pub fn erase_set(&mut self, set: &IntervalSet) {
        for interval in set.iter() {
            self.erase(interval);
        }
    }

    /// Ensure a segment boundary exists at `point`
    pub(super) fn split_at(&mut self, point: u32) {
        let Some((&lower, &(upper, value))) = self.segments.range(..point).next_back() else {
            return;
        };
        if upper > point {
            self.segments.insert(lower, (point, value));
            self.segments.insert(point, (upper, value));
        }
    }

    /// Join equal-valued neighbours touching the edges of `interval`
    pub(super) fn join_around(&mut self, interval: Interval) {
        let from = self
            .segments
            .range(..interval.lower())
            .next_back()
            .map(|(&lower, _)| lower)
            .unwrap_or(interval.lower());
        let keys: Vec<u32> = self
            .segments
            .range(from..=interval.upper())
            .map(|(&lower, _)| lower)
            .collect();

        let mut current: Option<u32> = None;
        for key in keys {
            let Some(&(upper, value)) = self.segments.get(&key) else {
                continue;
            };
            if let Some(run) = current {
                let (run_upper, run_value) = self.segments[&run];
                if run_upper == key && run_value == value {
                    self.segments.remove(&key);
                    self.segments.insert(run, (upper, value));
                    continue;
                }
            }
            current = Some(key);
        }
    }

    pub(super) fn segments_mut(&mut self) -> &mut BTreeMap<u32, (u32, V)> {
        &mut self.segments
    }
}
