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

//! Integer alignment helpers

/// Round `value` up to the next multiple of `align`
///
/// # Examples
///
/// ```
/// use pica_cache::core::common::align_up;
///
/// assert_eq!(align_up(13, 8), 16);
/// assert_eq!(align_up(16, 8), 16);
/// ```
#[inline(always)]
pub fn align_up(value: u32, align: u32) -> u32 {
    debug_assert!(align != 0);
    value.div_ceil(align) * align
}

/// Round `value` down to the previous multiple of `align`
///
/// # Examples
///
/// ```
/// use pica_cache::core::common::align_down;
///
/// assert_eq!(align_down(13, 8), 8);
/// assert_eq!(align_down(7, 16), 0);
/// ```
#[inline(always)]
pub fn align_down(value: u32, align: u32) -> u32 {
    debug_assert!(align != 0);
    (value / align) * align
}

/// Integer division rounding towards positive infinity
#[inline(always)]
pub fn div_ceil(value: u64, divisor: u64) -> u64 {
    value.div_ceil(divisor)
}
