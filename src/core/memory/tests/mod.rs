// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Guest memory tests
//!
//! - `basic`: Reads, writes and physical references
//! - `regions`: Region identification and boundaries
//! - `cached`: Cached-page ledger driven by the rasterizer notifications

use super::*;

mod basic;
mod regions;
