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

//! Title compatibility hooks
//!
//! Some titles depend on accelerated transfers being performed by the
//! software path. A [`FallbackPolicy`] is consulted before texture copies
//! and display transfers and can force the slow path.

use crate::core::common::PAddr;

/// Program id of Fire Emblem: Awakening (USA)
pub const FIRE_EMBLEM_AWAKENING: u64 = 0x0004_0000_000A_0500;

/// Transfers whose source or destination hit one of these addresses fall back
const FIRE_EMBLEM_ADDRESSES: [PAddr; 4] = [0x1836_8000, 0x183E_8000, 0x1840_8000, 0x1841_0000];

/// Display transfers forced to fall back after an address match
pub const FALLBACK_FRAMES: u32 = 100;

/// Accelerated operation asking for permission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceleratedOp {
    TextureCopy,
    DisplayTransfer,
}

/// Decides whether an accelerated transfer must use the software path
pub trait FallbackPolicy {
    /// Returns `true` when the transfer must not be accelerated
    fn should_fall_back(&mut self, op: AcceleratedOp, src_addr: PAddr, dst_addr: PAddr) -> bool;
}

/// Policy that never falls back
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFallback;

impl FallbackPolicy for NoFallback {
    fn should_fall_back(&mut self, _op: AcceleratedOp, _src_addr: PAddr, _dst_addr: PAddr) -> bool {
        false
    }
}

/// Address triggered fallback
///
/// A transfer touching one of the listed addresses logs an error and
/// arms a counter. While the counter is non-zero every transfer falls back;
/// each display transfer consumes one count.
///
/// # Example
///
/// ```
/// use pica_cache::core::rasterizer_cache::{AcceleratedOp, AddressFallbackPolicy, FallbackPolicy};
///
/// let mut policy = AddressFallbackPolicy::new(vec![0x1836_8000], 2);
/// assert!(!policy.should_fall_back(AcceleratedOp::DisplayTransfer, 0x1800_0000, 0x1810_0000));
/// assert!(policy.should_fall_back(AcceleratedOp::DisplayTransfer, 0x1836_8000, 0x1810_0000));
/// assert!(policy.should_fall_back(AcceleratedOp::DisplayTransfer, 0x1800_0000, 0x1810_0000));
/// assert!(policy.should_fall_back(AcceleratedOp::DisplayTransfer, 0x1800_0000, 0x1810_0000));
/// assert!(!policy.should_fall_back(AcceleratedOp::DisplayTransfer, 0x1800_0000, 0x1810_0000));
/// ```
#[derive(Debug, Clone)]
pub struct AddressFallbackPolicy {
    addresses: Vec<PAddr>,
    frames: u32,
    counter: u32,
}

impl AddressFallbackPolicy {
    /// Policy triggered by `addresses`, forcing `frames` display transfers
    pub fn new(addresses: Vec<PAddr>, frames: u32) -> Self {
        Self {
            addresses,
            frames,
            counter: 0,
        }
    }

    /// Policy for a title, if it needs one
    pub fn for_title(program_id: u64) -> Option<Self> {
        (program_id == FIRE_EMBLEM_AWAKENING)
            .then(|| Self::new(FIRE_EMBLEM_ADDRESSES.to_vec(), FALLBACK_FRAMES))
    }

    /// Remaining forced fallbacks
    pub fn counter(&self) -> u32 {
        self.counter
    }

    fn matches(&self, src_addr: PAddr, dst_addr: PAddr) -> bool {
        self.addresses
            .iter()
            .any(|&addr| addr == src_addr || addr == dst_addr)
    }
}

impl FallbackPolicy for AddressFallbackPolicy {
    fn should_fall_back(&mut self, op: AcceleratedOp, src_addr: PAddr, dst_addr: PAddr) -> bool {
        match op {
            AcceleratedOp::TextureCopy => {
                if self.counter > 0 {
                    return true;
                }
                if self.matches(src_addr, dst_addr) {
                    log::error!(
                        "Texture copy {:#x} -> {:#x} needs the software fallback",
                        src_addr,
                        dst_addr
                    );
                    return true;
                }
                false
            }
            AcceleratedOp::DisplayTransfer => {
                if self.counter > 0 {
                    self.counter -= 1;
                    return true;
                }
                if self.matches(src_addr, dst_addr) {
                    log::error!(
                        "Display transfer {:#x} -> {:#x} needs the software fallback",
                        src_addr,
                        dst_addr
                    );
                    self.counter = self.frames;
                    return true;
                }
                false
            }
        }
    }
}
