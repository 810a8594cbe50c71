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

//! Framebuffers and draw state
//!
//! A [`FramebufferHelper`] is returned for every draw. It carries the
//! scaled draw rectangle, viewport and scissor of the draw, and must be
//! handed back to [`RasterizerCache::invalidate_framebuffer`] once the draw
//! has been issued so that the drawn region becomes GPU owned.
//!
//! [`RasterizerCache::invalidate_framebuffer`]: super::RasterizerCache::invalidate_framebuffer

use super::slot_vector::{FramebufferId, SurfaceId};
use super::types::{FramebufferParams, SamplerParams};
use crate::core::common::Rectangle;
use crate::core::pica::RasterizerRegs;

/// Cached framebuffer object
#[derive(Debug)]
pub struct Framebuffer<F> {
    pub params: FramebufferParams,
    /// Resolution scale of the attachments
    pub res_scale: u32,
    pub handle: F,
}

impl<F> Framebuffer<F> {
    /// Resolution scale of the attachments
    #[inline(always)]
    pub fn scale(&self) -> u32 {
        self.res_scale
    }

    /// True when `surface_id` is one of the attachments
    pub fn uses(&self, surface_id: SurfaceId) -> bool {
        self.params.color_id == Some(surface_id) || self.params.depth_id == Some(surface_id)
    }
}

/// Cached sampler object
#[derive(Debug)]
pub struct Sampler<S> {
    pub params: SamplerParams,
    pub handle: S,
}

/// Viewport in scaled framebuffer pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Draw state of one draw call
#[derive(Debug, Clone, Copy, PartialEq)]
#[must_use = "the helper must be passed to invalidate_framebuffer after drawing"]
pub struct FramebufferHelper {
    pub framebuffer_id: FramebufferId,
    pub params: FramebufferParams,
    pub res_scale: u32,
    /// Render area clipped to the attachments, scaled pixels
    pub draw_rect: Rectangle<u32>,
    pub viewport: Viewport,
    pub scissor_rect: Rectangle<i32>,
}

impl FramebufferHelper {
    /// Compute the draw state
    ///
    /// # Arguments
    ///
    /// * `framebuffer_id` - Framebuffer the draw renders into
    /// * `params` - Attachments of the framebuffer
    /// * `res_scale` - Resolution scale of the attachments
    /// * `regs` - Viewport and scissor state
    /// * `surfaces_rect` - Scaled rectangle of the attachments inside their surfaces
    pub fn new(
        framebuffer_id: FramebufferId,
        params: FramebufferParams,
        res_scale: u32,
        regs: &RasterizerRegs,
        surfaces_rect: Rectangle<u32>,
    ) -> Self {
        let scale = res_scale as i32;
        let viewport_rect = regs.viewport_rect();
        let (left, right) = (surfaces_rect.left as i32, surfaces_rect.right as i32);
        let (bottom, top) = (surfaces_rect.bottom as i32, surfaces_rect.top as i32);

        let draw_rect = Rectangle::new(
            (left + viewport_rect.left * scale).clamp(left, right) as u32,
            (bottom + viewport_rect.top * scale).clamp(bottom, top) as u32,
            (left + viewport_rect.right * scale).clamp(left, right) as u32,
            (bottom + viewport_rect.bottom * scale).clamp(bottom, top) as u32,
        );

        let viewport = Viewport {
            x: (left + viewport_rect.left * scale) as f32,
            y: (bottom + viewport_rect.bottom * scale) as f32,
            width: (viewport_rect.width() * res_scale) as f32,
            height: (viewport_rect.height() * res_scale) as f32,
        };

        // Scissor bounds are inclusive; x2/y2 cover the whole last pixel
        let scissor = &regs.scissor;
        let scissor_rect = Rectangle::new(
            left + scissor.x1 as i32 * scale,
            bottom + (scissor.y2 as i32 + 1) * scale,
            left + (scissor.x2 as i32 + 1) * scale,
            bottom + scissor.y1 as i32 * scale,
        );

        Self {
            framebuffer_id,
            params,
            res_scale,
            draw_rect,
            viewport,
            scissor_rect,
        }
    }

    /// Unscaled draw rectangle
    pub fn draw_rect_unscaled(&self) -> Rectangle<u32> {
        self.draw_rect / self.res_scale.max(1)
    }
}
