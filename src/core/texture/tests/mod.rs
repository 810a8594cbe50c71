// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Texture codec tests
//!
//! - `texel`: Single texel formats and Morton order
//! - `etc1`: ETC1/ETC1A4 block decoding
//! - `codec`: Whole-surface decode and encode

use super::*;
use crate::core::pica::PixelFormat;
