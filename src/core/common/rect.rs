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

//! Rectangle type used for surface coordinates
//!
//! Surfaces use a bottom-left origin. For linear surfaces `top > bottom`,
//! while callers may swap `top` and `bottom` to express a vertical flip, so
//! width and height are always computed as absolute differences.

use std::ops::{Div, Mul};

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rectangle<T> {
    pub left: T,
    pub top: T,
    pub right: T,
    pub bottom: T,
}

impl<T> Rectangle<T> {
    /// Create a rectangle from its four edges
    pub const fn new(left: T, top: T, right: T, bottom: T) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

impl Rectangle<u32> {
    /// Horizontal extent in pixels
    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.right.abs_diff(self.left)
    }

    /// Vertical extent in pixels
    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.top.abs_diff(self.bottom)
    }

    /// True when the rectangle covers no pixels
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

impl Rectangle<i32> {
    /// Horizontal extent in pixels
    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.right.abs_diff(self.left)
    }

    /// Vertical extent in pixels
    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.top.abs_diff(self.bottom)
    }
}

impl Mul<u32> for Rectangle<u32> {
    type Output = Self;

    fn mul(self, scale: u32) -> Self {
        Self {
            left: self.left * scale,
            top: self.top * scale,
            right: self.right * scale,
            bottom: self.bottom * scale,
        }
    }
}

impl Div<u32> for Rectangle<u32> {
    type Output = Self;

    fn div(self, scale: u32) -> Self {
        Self {
            left: self.left / scale,
            top: self.top / scale,
            right: self.right / scale,
            bottom: self.bottom / scale,
        }
    }
}
