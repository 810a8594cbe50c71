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

use std::path::PathBuf;

use clap::Parser;
use log::{error, info};
use serde::Serialize;

use pica_cache::core::error::{CacheError, Result};
use pica_cache::core::rasterizer_cache::AddressFallbackPolicy;
use pica_cache::core::runtime::RuntimeStats;
use pica_cache::core::workload::{ReplayReport, Workload};
use pica_cache::core::{
    MemoryCustomTexManager, PhysicalMemory, RasterizerCache, Settings, SoftwareRuntime,
};

/// PICA200 rasterizer cache workload player
#[derive(Parser)]
#[command(name = "pica-cache")]
#[command(about = "Replay rasterizer cache workloads", long_about = None)]
struct Args {
    /// Path to a JSON workload (the built-in demo frame is used if omitted)
    workload: Option<PathBuf>,

    /// Path to a TOML settings file
    #[arg(short = 's', long)]
    settings: Option<PathBuf>,

    /// Title program id in hex, selects per-title accuracy fallbacks
    #[arg(short = 'p', long, value_parser = parse_program_id)]
    program_id: Option<u64>,

    /// Number of times the workload is replayed
    #[arg(short = 'n', long, default_value = "1")]
    repeat: usize,

    /// Print the statistics as JSON
    #[arg(long)]
    json: bool,
}

/// Statistics printed at exit
#[derive(Serialize)]
struct Summary {
    replays: Vec<ReplayReport>,
    runtime: RuntimeStats,
    surfaces: usize,
}

fn parse_program_id(text: &str) -> std::result::Result<u64, String> {
    let digits = text.trim_start_matches("0x").trim_start_matches("0X");
    u64::from_str_radix(digits, 16).map_err(|e| format!("invalid program id {}: {}", text, e))
}

fn main() -> Result<()> {
    // Settings may come from a .env file
    dotenvy::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("pica-cache v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => {
            info!("Loading settings from: {}", path.display());
            Settings::load(path)?
        }
        None => {
            let mut settings = Settings::default();
            settings.apply_env_overrides()?;
            settings
        }
    };

    let workload = match &args.workload {
        Some(path) => Workload::load(path).inspect_err(|e| {
            error!("Failed to load workload: {}", e);
        })?,
        None => {
            info!("No workload given, replaying the demo frame");
            Workload::demo()
        }
    };
    if workload.commands.is_empty() {
        return Err(CacheError::Workload("workload has no commands".to_string()));
    }

    let mut cache = RasterizerCache::new(
        PhysicalMemory::new(),
        MemoryCustomTexManager::new(),
        SoftwareRuntime::new(),
        settings,
    );

    if let Some(program_id) = args.program_id {
        match AddressFallbackPolicy::for_title(program_id) {
            Some(policy) => {
                info!("Using accuracy fallbacks of title {:016X}", program_id);
                cache.set_fallback_policy(Box::new(policy));
            }
            None => info!("No accuracy fallbacks for title {:016X}", program_id),
        }
    }

    let mut replays = Vec::with_capacity(args.repeat);
    for i in 0..args.repeat {
        let report = workload.replay(&mut cache)?;
        info!(
            "Replay {}/{}: {} accelerated, {} rejected",
            i + 1,
            args.repeat,
            report.accelerated,
            report.rejected
        );
        replays.push(report);
    }

    let summary = Summary {
        replays,
        runtime: *cache.runtime().stats(),
        surfaces: cache.surface_count(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        let stats = cache.stats();
        info!("Surfaces: {}", summary.surfaces);
        info!("Uploads: {} | Downloads: {}", stats.uploads, stats.downloads);
        info!(
            "Fills: {} | Texture copies: {} | Display transfers: {}",
            stats.fills, stats.texture_copies, stats.display_transfers
        );
        info!(
            "Runtime: {} textures, {} blits, {} copies",
            summary.runtime.textures_created, summary.runtime.blits, summary.runtime.copies
        );
    }

    Ok(())
}
