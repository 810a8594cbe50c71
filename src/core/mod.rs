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

//! Rasterizer cache components
//!
//! This module contains the surface cache of the PICA200 rasterizer and
//! everything it is built from:
//! - Guest physical memory and the PICA register views
//! - Interval containers for dirty and cached ranges
//! - Texture codecs for the tiled guest formats
//! - The texture runtime backend and custom texture replacement
//! - Workload replay for driving the cache outside an emulator

pub mod common;
pub mod config;
pub mod custom_tex;
pub mod error;
pub mod interval;
pub mod memory;
pub mod pica;
pub mod rasterizer_cache;
pub mod runtime;
pub mod texture;
pub mod workload;

// Re-export commonly used types
pub use config::Settings;
pub use custom_tex::{CustomTexManager, MemoryCustomTexManager, NullCustomTexManager};
pub use error::{CacheError, Result};
pub use memory::{GuestMemory, PhysicalMemory};
pub use rasterizer_cache::{CacheStats, RasterizerCache, SurfaceId};
pub use runtime::{Runtime, SoftwareRuntime};
pub use workload::Workload;
