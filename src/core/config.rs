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

//! Cache settings
//!
//! Settings are read from a TOML file and can be overridden with
//! `PICA_CACHE_*` environment variables:
//!
//! | Variable | Field |
//! |---|---|
//! | `PICA_CACHE_RESOLUTION_FACTOR` | `resolution_factor` |
//! | `PICA_CACHE_TEXTURE_FILTER` | `texture_filter` |
//! | `PICA_CACHE_TEXTURE_SAMPLING` | `texture_sampling` |
//! | `PICA_CACHE_CUSTOM_TEXTURES` | `custom_textures` |
//! | `PICA_CACHE_DUMP_TEXTURES` | `dump_textures` |
//! | `PICA_CACHE_SKIP_TEXTURE_COPY` | `skip_texture_copy` |
//! | `PICA_CACHE_SKIP_CPU_WRITE` | `skip_cpu_write` |
//! | `PICA_CACHE_UPSCALING_HACK` | `upscaling_hack` |
//!
//! # Example
//!
//! ```
//! use pica_cache::core::config::{Settings, TextureFilterMode};
//!
//! let settings = Settings::from_toml_str(
//!     r#"
//!     resolution_factor = 2
//!     texture_filter = "bicubic"
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(settings.resolution_factor, 2);
//! assert_eq!(settings.texture_filter, TextureFilterMode::Bicubic);
//! assert!(!settings.dump_textures);
//! ```

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::{CacheError, Result};

/// Largest supported internal resolution factor
pub const MAX_RESOLUTION_FACTOR: u32 = 10;

/// Environment variable prefix of setting overrides
pub const ENV_PREFIX: &str = "PICA_CACHE_";

/// Texture post-processing filter
///
/// Any filter other than `NoFilter` uploads textures at the resolution
/// factor so that the filter output has room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureFilterMode {
    #[default]
    NoFilter,
    #[serde(rename = "anime4k")]
    Anime4K,
    Bicubic,
    ScaleForce,
    #[serde(rename = "xbrz")]
    XBrz,
    Mmpx,
}

impl FromStr for TextureFilterMode {
    type Err = CacheError;

    fn from_str(value: &str) -> Result<Self> {
        Ok(match value.to_ascii_lowercase().as_str() {
            "none" | "no_filter" => Self::NoFilter,
            "anime4k" => Self::Anime4K,
            "bicubic" => Self::Bicubic,
            "scale_force" | "scaleforce" => Self::ScaleForce,
            "xbrz" => Self::XBrz,
            "mmpx" => Self::Mmpx,
            _ => {
                return Err(CacheError::InvalidSettings(format!(
                    "unknown texture filter '{}'",
                    value
                )))
            }
        })
    }
}

/// Sampler filter override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureSampling {
    /// Use the filters programmed by the game
    #[default]
    GameControlled,
    NearestNeighbor,
    Linear,
}

impl FromStr for TextureSampling {
    type Err = CacheError;

    fn from_str(value: &str) -> Result<Self> {
        Ok(match value.to_ascii_lowercase().as_str() {
            "game_controlled" => Self::GameControlled,
            "nearest_neighbor" | "nearest" => Self::NearestNeighbor,
            "linear" => Self::Linear,
            _ => {
                return Err(CacheError::InvalidSettings(format!(
                    "unknown texture sampling '{}'",
                    value
                )))
            }
        })
    }
}

/// Settings consumed by the rasterizer cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Internal resolution multiplier for render targets
    pub resolution_factor: u32,
    pub texture_filter: TextureFilterMode,
    pub texture_sampling: TextureSampling,
    /// Replace textures with custom materials
    pub custom_textures: bool,
    /// Hand uploaded textures to the custom texture manager
    pub dump_textures: bool,
    /// Report texture copies without a cached source as handled
    pub skip_texture_copy: bool,
    /// Ignore small CPU writes to cached surfaces
    pub skip_cpu_write: bool,
    /// Keep small texture copy destinations at native resolution
    pub upscaling_hack: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            resolution_factor: 1,
            texture_filter: TextureFilterMode::NoFilter,
            texture_sampling: TextureSampling::GameControlled,
            custom_textures: false,
            dump_textures: false,
            skip_texture_copy: false,
            skip_cpu_write: false,
            upscaling_hack: false,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file and apply environment overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, if an override
    /// has an invalid value, or if the resulting settings are invalid.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading settings from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        let mut settings = Self::from_toml_str(&text)?;
        settings.apply_env_overrides()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from TOML text
    ///
    /// Missing keys take their default value.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serialize settings to TOML text
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Write settings to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// Apply `PICA_CACHE_*` variables of the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(std::env::vars())
    }

    /// Apply `PICA_CACHE_*` overrides from `vars`
    ///
    /// Variables without the prefix are ignored; unknown names are logged.
    pub fn apply_overrides<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.as_ref().trim();
            match name {
                "RESOLUTION_FACTOR" => {
                    self.resolution_factor = value.parse().map_err(|_| {
                        CacheError::InvalidSettings(format!("resolution factor '{}'", value))
                    })?
                }
                "TEXTURE_FILTER" => self.texture_filter = value.parse()?,
                "TEXTURE_SAMPLING" => self.texture_sampling = value.parse()?,
                "CUSTOM_TEXTURES" => self.custom_textures = parse_bool(name, value)?,
                "DUMP_TEXTURES" => self.dump_textures = parse_bool(name, value)?,
                "SKIP_TEXTURE_COPY" => self.skip_texture_copy = parse_bool(name, value)?,
                "SKIP_CPU_WRITE" => self.skip_cpu_write = parse_bool(name, value)?,
                "UPSCALING_HACK" => self.upscaling_hack = parse_bool(name, value)?,
                _ => log::warn!("Ignoring unknown setting override {}{}", ENV_PREFIX, name),
            }
        }
        self.validate()
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.resolution_factor == 0 || self.resolution_factor > MAX_RESOLUTION_FACTOR {
            return Err(CacheError::InvalidSettings(format!(
                "resolution factor {} is outside 1..={}",
                self.resolution_factor, MAX_RESOLUTION_FACTOR
            )));
        }
        Ok(())
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(CacheError::InvalidSettings(format!(
            "{}{} expects a boolean, got '{}'",
            ENV_PREFIX, name, value
        ))),
    }
}
