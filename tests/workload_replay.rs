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

mod common;

use std::io::Write;

use common::fixtures::{create_cache, create_cache_with};
use pica_cache::core::error::{CacheError, Result};
use pica_cache::core::workload::{Command, Workload};
use pica_cache::core::{PhysicalMemory, Settings};

const WORKLOAD: &str = r#"{
    "commands": [
        { "op": "write", "addr": 536870912, "len": 16384, "value": 90 },
        { "op": "texture", "addr": 536870912, "width": 64, "height": 64 },
        { "op": "texture", "addr": 536870912, "width": 64, "height": 64 },
        { "op": "draw", "color": 402653184, "width": 64, "height": 64 },
        { "op": "display_transfer", "src": 402653184, "dst": 537919488,
          "width": 64, "height": 64, "flip": true },
        { "op": "read", "addr": 537919488, "size": 16384 },
        { "op": "frame", "count": 2 }
    ]
}"#;

#[test]
fn test_replay_from_file() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(WORKLOAD.as_bytes())?;

    let workload = Workload::load(file.path())?;
    assert_eq!(workload.commands.len(), 7);

    let mut cache = create_cache();
    let report = workload.replay(&mut cache)?;
    assert_eq!(report.commands, 7);
    assert_eq!(report.accelerated, 1);
    assert_eq!(report.rejected, 0);
    assert_eq!(report.cache.uploads, 2);
    assert_eq!(cache.frame_tick(), 2);
    Ok(())
}

#[test]
fn test_replay_with_settings_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("settings.toml");
    std::fs::write(&path, "resolution_factor = 3\n")?;

    let settings = Settings::load(&path)?;
    assert_eq!(settings.resolution_factor, 3);

    let mut cache = create_cache_with(settings);
    let report = Workload::from_json_str(WORKLOAD)?.replay(&mut cache)?;
    assert_eq!(report.accelerated, 1);

    let display = cache.surfaces_in_region(0x2010_0000, 4);
    assert_eq!(display.len(), 1);
    assert_eq!(cache.surface(display[0]).params.res_scale, 3);
    Ok(())
}

#[test]
fn test_saved_workload_loads_back() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("demo.json");
    let demo = Workload::demo();
    std::fs::write(&path, demo.to_json_string()?)?;

    assert_eq!(Workload::load(&path)?, demo);
    Ok(())
}

#[test]
fn test_missing_workload_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = Workload::load(dir.path().join("missing.json"));
    assert!(matches!(result, Err(CacheError::Io(_))));
}

#[test]
fn test_write_command_invalidates_texture() -> Result<()> {
    let mut cache = create_cache();
    let texture = Command::Texture {
        addr: PhysicalMemory::FCRAM_PADDR,
        width: 8,
        height: 8,
        format: 0,
        max_level: 0,
    };
    let workload = Workload {
        commands: vec![
            texture.clone(),
            Command::Write {
                addr: PhysicalMemory::FCRAM_PADDR,
                len: 256,
                value: 0xEE,
            },
            texture,
        ],
    };

    let report = workload.replay(&mut cache)?;
    assert_eq!(report.cache.uploads, 2);
    let id = cache.surfaces_in_region(PhysicalMemory::FCRAM_PADDR, 4)[0];
    assert_eq!(cache.surface(id).texture.texel(0, 0, 0, 0), Some(&[0xEE; 4][..]));
    Ok(())
}
