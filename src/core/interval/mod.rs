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

//! Interval algebra over the guest physical address space
//!
//! The cache keeps three kinds of interval containers:
//! - `IntervalSet`: joined set of byte ranges (invalid regions of a surface)
//! - `IntervalMap<V>`: byte ranges mapped to a value with overwrite semantics
//!   (which surface owns GPU-modified memory)
//! - `IntervalCounter`: page ranges mapped to a reference count, where
//!   segments reaching zero disappear (how many surfaces cover a page)
//!
//! All intervals are right-open: `[lower, upper)`.
//!
//! # Example
//!
//! ```
//! use pica_cache::core::interval::{Interval, IntervalSet};
//!
//! let mut set = IntervalSet::new();
//! set.insert(Interval::new(0x1000, 0x2000));
//! set.insert(Interval::new(0x2000, 0x2800));
//!
//! // Touching ranges are joined
//! assert_eq!(set.len(), 1);
//! assert_eq!(set.first(), Some(Interval::new(0x1000, 0x2800)));
//! ```

mod counter;
mod map;
mod set;

#[cfg(test)]
mod tests;

pub use counter::IntervalCounter;
pub use map::IntervalMap;
pub use set::IntervalSet;

use std::fmt;
use std::ops::BitAnd;

/// Right-open interval `[lower, upper)`
///
/// An interval with `lower >= upper` is empty. Empty results of an
/// intersection are normalised to `[x, x)`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Interval {
    lower: u32,
    upper: u32,
}

impl Interval {
    /// Create the interval `[lower, upper)`
    ///
    /// Reversed bounds produce an empty interval anchored at `lower`.
    #[inline(always)]
    pub const fn new(lower: u32, upper: u32) -> Self {
        if upper < lower {
            Self {
                lower,
                upper: lower,
            }
        } else {
            Self { lower, upper }
        }
    }

    /// Create the interval starting at `addr` spanning `size` units
    #[inline(always)]
    pub const fn with_size(addr: u32, size: u32) -> Self {
        Self::new(addr, addr + size)
    }

    /// First element of the interval
    #[inline(always)]
    pub const fn lower(&self) -> u32 {
        self.lower
    }

    /// One past the last element of the interval
    #[inline(always)]
    pub const fn upper(&self) -> u32 {
        self.upper
    }

    /// Number of elements in the interval
    #[inline(always)]
    pub const fn length(&self) -> u32 {
        self.upper - self.lower
    }

    /// True when the interval has no elements
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.upper <= self.lower
    }

    /// Intersection of two intervals
    pub fn intersect(&self, other: &Interval) -> Interval {
        let lower = self.lower.max(other.lower);
        let upper = self.upper.min(other.upper);
        if lower >= upper {
            Interval {
                lower,
                upper: lower,
            }
        } else {
            Interval { lower, upper }
        }
    }

    /// True when both intervals share at least one element
    #[inline(always)]
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.lower.max(other.lower) < self.upper.min(other.upper)
    }

    /// True when `other` lies entirely inside `self`
    #[inline(always)]
    pub fn contains(&self, other: &Interval) -> bool {
        other.lower >= self.lower && other.upper <= self.upper
    }
}

impl BitAnd for Interval {
    type Output = Interval;

    fn bitand(self, rhs: Interval) -> Interval {
        self.intersect(&rhs)
    }
}

impl fmt::Debug for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#x}, {:#x})", self.lower, self.upper)
    }
}
