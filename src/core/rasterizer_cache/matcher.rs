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

//! Surface matching
//!
//! Candidates are gathered from the page table and scored against the
//! requested params. The whole candidate set is always scanned; the best
//! candidate is chosen by, in order:
//!
//! 1. Resolution scale policy (fill surfaces always pass)
//! 2. Higher resolution scale
//! 3. Valid over the requested interval
//! 4. Longer matched interval

use std::collections::HashSet;
use std::ops::Range;

use smallvec::SmallVec;

use super::surface::Surface;
use super::surface_params::SurfaceParams;
use super::types::{MatchFlags, ScaleMatch, PAGE_TABLE_BITS};
use super::{RasterizerCache, SurfaceId};
use crate::core::custom_tex::CustomTexManager;
use crate::core::interval::Interval;
use crate::core::memory::GuestMemory;
use crate::core::pica::SurfaceType;
use crate::core::runtime::Runtime;

/// Match kinds in evaluation order
const MATCH_KINDS: [MatchFlags; 5] = [
    MatchFlags::EXACT,
    MatchFlags::SUB_RECT,
    MatchFlags::COPY,
    MatchFlags::REINTERPRET,
    MatchFlags::TEX_COPY,
];

/// Page table pages touched by `[addr, addr + size)`
pub(in crate::core::rasterizer_cache) fn pages_of(addr: u32, size: u32) -> Range<u64> {
    if size == 0 {
        return 0..0;
    }
    let first = addr as u64 >> PAGE_TABLE_BITS;
    let last = (addr as u64 + size as u64 - 1) >> PAGE_TABLE_BITS;
    first..last + 1
}

/// Interval of `surface` matched by one match kind, if it matches
fn match_interval<T>(
    kind: MatchFlags,
    surface: &Surface<T>,
    params: &SurfaceParams,
    validate_interval: Option<Interval>,
) -> Option<Interval> {
    let copy_interval = |validate: Interval| {
        let copy_interval = surface.copyable_interval(&params.from_interval(validate));
        (!(copy_interval & validate).is_empty()).then_some(copy_interval)
    };

    if kind == MatchFlags::EXACT {
        surface.params.exact_match(params).then(|| surface.params.interval())
    } else if kind == MatchFlags::SUB_RECT {
        surface.params.can_sub_rect(params).then(|| surface.params.interval())
    } else if kind == MatchFlags::COPY {
        let Some(validate) = validate_interval else {
            panic!("Copy match requires a validate interval");
        };
        copy_interval(validate).filter(|&interval| surface.can_copy(params, interval))
    } else if kind == MatchFlags::REINTERPRET {
        let Some(validate) = validate_interval else {
            panic!("Reinterpret match requires a validate interval");
        };
        copy_interval(validate).filter(|_| surface.params.can_reinterpret(params))
    } else if kind == MatchFlags::TEX_COPY {
        surface.params.can_tex_copy(params).then(|| surface.params.interval())
    } else {
        None
    }
}

impl<R: Runtime, M: GuestMemory, C: CustomTexManager> RasterizerCache<R, M, C> {
    /// Registered surfaces overlapping `[addr, addr + size)`
    ///
    /// Each surface appears once, in page order, even when it spans
    /// several pages.
    pub(in crate::core::rasterizer_cache) fn collect_surfaces_in_region(
        &self,
        addr: u32,
        size: u32,
    ) -> SmallVec<[SurfaceId; 8]> {
        let mut visited = HashSet::new();
        let mut surfaces = SmallVec::new();

        for page in pages_of(addr, size) {
            let Some(page_surfaces) = self.page_table.get(&page) else {
                continue;
            };
            for &surface_id in page_surfaces {
                if !self.slot_surfaces[surface_id].overlaps(addr, size) {
                    continue;
                }
                if visited.insert(surface_id) {
                    surfaces.push(surface_id);
                }
            }
        }
        surfaces
    }

    /// Find the best surface for `params`
    ///
    /// # Arguments
    ///
    /// * `params` - Requested surface
    /// * `flags` - Match kinds to accept
    /// * `scale_match` - Resolution scale policy
    /// * `validate_interval` - Interval that must be valid, required by
    ///   `COPY` and `REINTERPRET`; defaults to the interval of `params`
    ///
    /// # Returns
    ///
    /// The winning surface and the interval that justified the match
    pub(in crate::core::rasterizer_cache) fn find_match(
        &self,
        params: &SurfaceParams,
        flags: MatchFlags,
        scale_match: ScaleMatch,
        validate_interval: Option<Interval>,
    ) -> Option<(SurfaceId, Interval)> {
        let mut best: Option<(SurfaceId, Interval)> = None;
        let mut best_valid = false;
        let mut best_scale = 0;

        for surface_id in self.collect_surfaces_in_region(params.addr, params.size) {
            let surface = &self.slot_surfaces[surface_id];
            let res_scale = surface.params.res_scale;
            let res_scale_matched = match scale_match {
                ScaleMatch::Exact => params.res_scale == res_scale,
                _ => params.res_scale <= res_scale,
            };
            let is_valid = flags.contains(MatchFlags::COPY)
                || surface.is_region_valid(validate_interval.unwrap_or_else(|| params.interval()));

            for kind in MATCH_KINDS {
                if !flags.contains(kind) {
                    continue;
                }
                let Some(surface_interval) =
                    match_interval(kind, surface, params, validate_interval)
                else {
                    continue;
                };
                if !res_scale_matched
                    && scale_match != ScaleMatch::Ignore
                    && surface.params.surface_type != SurfaceType::Fill
                {
                    continue;
                }

                let better = if res_scale != best_scale {
                    res_scale > best_scale
                } else if is_valid != best_valid {
                    is_valid
                } else {
                    best.map_or(true, |(_, interval)| surface_interval.length() > interval.length())
                };
                if better {
                    best = Some((surface_id, surface_interval));
                    best_valid = is_valid;
                    best_scale = res_scale;
                }
            }
        }

        if let Some((surface_id, interval)) = best {
            log::trace!(
                "Matched {:?} for {} ({:?}) over {:?}",
                surface_id,
                params.debug_name(),
                flags,
                interval
            );
        }
        best
    }
}
