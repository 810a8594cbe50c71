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

//! PICA200 register-level types consumed by the cache
//!
//! The cache never decodes raw GPU command lists. The command processor
//! decodes register writes into the plain configuration structs of this
//! module and hands them to the cache:
//! - Pixel formats and their surface categories
//! - Display transfer / texture copy / memory fill configurations
//! - Framebuffer and rasterizer (viewport, scissor) state
//! - Texture unit configuration
//!
//! # References
//!
//! - [3DBrew: GPU/External Registers](https://www.3dbrew.org/wiki/GPU/External_Registers)
//! - [3DBrew: GPU/Internal Registers](https://www.3dbrew.org/wiki/GPU/Internal_Registers)

mod pixel_format;
mod regs;
mod texture;


pub use pixel_format::*;
pub use regs::*;
pub use texture::*;
