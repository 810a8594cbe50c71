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

//! PICA200 rasterizer surface cache
//!
//! This library tracks guest framebuffers and textures as host surfaces,
//! keeps them coherent with guest memory and accelerates memory fills,
//! texture copies and display transfers on cached surfaces.
//!
//! # Example
//!
//! ```
//! use pica_cache::core::memory::PhysicalMemory;
//! use pica_cache::core::pica::MemoryFillConfig;
//! use pica_cache::core::{NullCustomTexManager, RasterizerCache, Settings, SoftwareRuntime};
//!
//! let mut cache = RasterizerCache::new(
//!     PhysicalMemory::new(),
//!     NullCustomTexManager,
//!     SoftwareRuntime::new(),
//!     Settings::default(),
//! );
//!
//! let fill = MemoryFillConfig {
//!     start_address: PhysicalMemory::VRAM_PADDR,
//!     end_address: PhysicalMemory::VRAM_PADDR + 0x1000,
//!     value_32bit: 0xFF00_00FF,
//!     fill_32bit: true,
//!     ..Default::default()
//! };
//! assert!(cache.accelerate_fill(&fill));
//!
//! // Reading the range back writes the fill to guest memory
//! cache.flush_region(PhysicalMemory::VRAM_PADDR, 0x1000, None);
//! assert_eq!(cache.memory().read32(PhysicalMemory::VRAM_PADDR).unwrap(), 0xFF00_00FF);
//! ```

pub mod core;
