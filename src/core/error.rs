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

//! Rasterizer cache error types

use thiserror::Error;

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Main error type for the cache
///
/// Guest-visible cache operations never fail: misses and unsupported
/// requests are reported through `Option`/`bool` results. Errors are
/// limited to host-side concerns such as configuration and data files.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Invalid pixel format value: {raw}")]
    InvalidPixelFormat { raw: u32 },

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Failed to parse settings: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to serialize settings: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Guest address 0x{address:08X} is not backed by memory")]
    UnmappedAddress { address: u32 },

    #[error("Workload error: {0}")]
    Workload(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
