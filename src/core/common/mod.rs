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

//! Shared helpers for the cache core
//!
//! This module contains the small value types used throughout the cache:
//! - `Rectangle`: pixel rectangles in surface coordinates
//! - Alignment helpers for byte and pixel arithmetic

mod align;
mod rect;


pub use align::{align_down, align_up, div_ceil};
pub use rect::Rectangle;

/// Guest physical address
pub type PAddr = u32;
