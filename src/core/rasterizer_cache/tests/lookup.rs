// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Surface resolution tests

use super::*;
use crate::core::common::Rectangle;
use crate::core::config::{TextureFilterMode, TextureSampling};
use crate::core::interval::Interval;
use crate::core::pica::{
    ColorFormat, DepthFormat, FramebufferConfig, FramebufferRegs, LodConfig, PipelineRegs,
    RasterizerRegs, TextureConfig, TextureFormat, TextureInfo,
};

fn texture_info(addr: u32, width: u32, height: u32) -> TextureInfo {
    let mut info = TextureInfo {
        physical_address: addr,
        width,
        height,
        format: PixelFormat::RGBA8,
        ..Default::default()
    };
    info.set_default_stride();
    info
}

fn framebuffer_regs(color_addr: u32, depth_addr: u32, width: u32, height: u32) -> PipelineRegs {
    PipelineRegs {
        framebuffer: FramebufferRegs {
            framebuffer: FramebufferConfig {
                width,
                height,
                color_buffer_address: color_addr,
                depth_buffer_address: depth_addr,
                color_format: ColorFormat::RGBA8,
                depth_format: DepthFormat::D24S8,
            },
            shadow_rendering: false,
        },
        rasterizer: RasterizerRegs {
            viewport_width: width,
            viewport_height: height,
            ..Default::default()
        },
    }
}

fn cube_config(base: u32) -> TextureCubeConfig {
    TextureCubeConfig {
        px: base,
        nx: base + 0x100,
        py: base + 0x200,
        ny: base + 0x300,
        pz: base + 0x400,
        nz: base + 0x500,
        width: 8,
        levels: 1,
        format: TextureFormat::RGBA8,
    }
}

#[test]
fn test_null_surfaces_exist_at_startup() {
    let cache = flat_cache();
    assert_eq!(cache.surface_count(), 2);
    assert_eq!(cache.surface(NULL_SURFACE_ID).params.width, 1);
    assert_eq!(
        cache.surface(NULL_SURFACE_CUBE_ID).params.texture_type,
        TextureType::CubeMap
    );
    assert_eq!(
        cache.sampler(NULL_SAMPLER_ID).params.wrap_s,
        WrapMode::ClampToBorder
    );
}

#[test]
fn test_get_surface_null_address_or_empty() {
    let mut cache = flat_cache();
    let null = linear_params(0, 16, 16, PixelFormat::RGBA8);
    assert!(cache.get_surface(&null, ScaleMatch::Ignore, true).is_none());

    let empty = linear_params(0x1000, 0, 16, PixelFormat::RGBA8);
    assert!(cache.get_surface_sub_rect(&empty, ScaleMatch::Ignore, true).is_none());
}

#[test]
#[should_panic(expected = "has gaps")]
fn test_get_surface_with_gaps_panics() {
    let mut cache = flat_cache();
    let mut params = SurfaceParams {
        addr: 0x1000,
        width: 16,
        height: 16,
        stride: 32,
        pixel_format: PixelFormat::RGBA8,
        ..Default::default()
    };
    params.update_params();
    let _ = cache.get_surface(&params, ScaleMatch::Ignore, false);
}

#[test]
fn test_sub_rect_creates_surface_covering_request() {
    let mut cache = flat_cache();
    let params = linear_params(0x1000, 64, 64, PixelFormat::RGBA8);

    let (id, rect) = cache
        .get_surface_sub_rect(&params, ScaleMatch::Ignore, true)
        .unwrap();
    assert_eq!(rect, Rectangle::new(0, 64, 64, 0));
    assert_eq!(
        cache.surface(id).params.interval(),
        Interval::new(0x1000, 0x1000 + 64 * 64 * 4)
    );
    assert!(cache.memory().is_cached(0x1000));
}

#[test]
fn test_sub_rect_reuses_containing_surface() {
    let mut cache = flat_cache();
    let whole = linear_params(0x1000, 64, 64, PixelFormat::RGBA8);
    let (whole_id, _) = cache
        .get_surface_sub_rect(&whole, ScaleMatch::Ignore, true)
        .unwrap();

    // Rows 16..32 of the surface
    let band = linear_params(0x1000 + 16 * 256, 64, 16, PixelFormat::RGBA8);
    let (id, rect) = cache
        .get_surface_sub_rect(&band, ScaleMatch::Ignore, true)
        .unwrap();
    assert_eq!(id, whole_id);
    assert_eq!(rect, Rectangle::new(0, 32, 64, 16));
}

#[test]
fn test_exact_lookup_hits_same_surface() {
    let mut cache = flat_cache();
    let params = tiled_params(0x4000, 32, 32, PixelFormat::RGB565);

    let first = cache.get_surface(&params, ScaleMatch::Exact, true).unwrap();
    let second = cache.get_surface(&params, ScaleMatch::Exact, true).unwrap();
    assert_eq!(first, second);
    assert_eq!(cache.stats().surfaces_created, 1);
    assert_eq!(cache.stats().uploads, 1);
}

#[test]
fn test_upscale_match_accepts_higher_scale() {
    let mut cache = flat_cache();
    let mut high = tiled_params(0x4000, 32, 32, PixelFormat::RGBA8);
    high.res_scale = 2;
    let high_id = cache.get_surface(&high, ScaleMatch::Exact, false).unwrap();

    let low = tiled_params(0x4000, 32, 32, PixelFormat::RGBA8);
    assert_eq!(cache.get_surface(&low, ScaleMatch::Upscale, false), Some(high_id));
    assert_eq!(cache.get_surface(&low, ScaleMatch::Ignore, false), Some(high_id));

    // An exact request at scale 1 gets its own surface
    let exact_id = cache.get_surface(&low, ScaleMatch::Exact, false).unwrap();
    assert_ne!(exact_id, high_id);
}

#[test]
fn test_sub_rect_supersedes_low_resolution_surface() {
    let mut cache = flat_cache();
    let low = tiled_params(0x4000, 32, 32, PixelFormat::RGBA8);
    let low_id = cache.get_surface(&low, ScaleMatch::Exact, false).unwrap();

    let mut high = tiled_params(0x4000, 32, 32, PixelFormat::RGBA8);
    high.res_scale = 3;
    let (high_id, rect) = cache
        .get_surface_sub_rect(&high, ScaleMatch::Upscale, false)
        .unwrap();
    assert_ne!(high_id, low_id);
    assert_eq!(cache.surface(high_id).params.res_scale, 3);
    assert_eq!(rect, Rectangle::new(0, 96, 96, 0));
}

#[test]
fn test_scale_up_never_shrinks() {
    let mut runtime = SoftwareRuntime::new();
    let mut params = tiled_params(0x4000, 16, 16, PixelFormat::RGBA8);
    params.res_scale = 2;
    let mut surface = Surface::new(params, runtime.create_texture(&params));

    surface.scale_up(&mut runtime, 1);
    surface.scale_up(&mut runtime, 2);
    assert_eq!(surface.params.res_scale, 2);
    assert_eq!(runtime.stats().scale_ups, 0);

    surface.scale_up(&mut runtime, 4);
    assert_eq!(surface.params.res_scale, 4);
    assert_eq!(surface.texture.width, 64);
    assert_eq!(runtime.stats().scale_ups, 1);
}

#[test]
fn test_texture_null_address_returns_null_surface() {
    let mut cache = flat_cache();
    let info = texture_info(0, 64, 64);
    assert_eq!(cache.get_texture_surface(&info, 0), NULL_SURFACE_ID);
}

#[test]
fn test_texture_unsupported_sizes_return_null_surface() {
    let mut cache = flat_cache();

    // Smallest level is not a multiple of 4
    let odd = texture_info(0x8000, 6, 6);
    assert_eq!(cache.get_texture_surface(&odd, 0), NULL_SURFACE_ID);

    // 136 >> 4 is 8, but 8 << 4 is not 136
    let uneven = texture_info(0x8000, 136, 136);
    assert_eq!(cache.get_texture_surface(&uneven, 4), NULL_SURFACE_ID);
    assert_eq!(cache.stats().surfaces_created, 0);
}

#[test]
fn test_texture_lookup_is_cached() {
    let mut cache = flat_cache();
    write_memory(&mut cache, 0x8000, &pattern(64 * 64 * 4));
    let info = texture_info(0x8000, 64, 64);

    let first = cache.get_texture_surface(&info, 0);
    let uploads = cache.stats().uploads;
    let second = cache.get_texture_surface(&info, 0);

    assert_ne!(first, NULL_SURFACE_ID);
    assert_eq!(first, second);
    assert_eq!(cache.stats().uploads, uploads);
    assert_eq!(cache.surface(first).params.surface_type, SurfaceType::Color);
}

#[test]
fn test_texture_config_allocates_mip_levels() {
    let mut cache = flat_cache();
    let config = TextureConfig {
        physical_address: 0x8000,
        width: 64,
        height: 64,
        format: TextureFormat::RGBA8,
        lod: LodConfig {
            min_level: 0,
            max_level: 10,
            bias: 0,
        },
        ..Default::default()
    };

    let id = cache.get_texture_surface_for_config(&config);
    let params = cache.surface(id).params;
    assert_eq!(params.levels, 4);
    assert_eq!(params.size, (64 * 64 + 32 * 32 + 16 * 16 + 8 * 8) * 4);
}

#[test]
fn test_texture_with_sub_tile_mip_is_blitted() {
    let mut cache = flat_cache();
    // 8x8 base level followed by a 4x4 mip
    write_memory(&mut cache, 0x10000, &[0x11; 256]);
    write_memory(&mut cache, 0x10100, &[0x22; 64]);

    let id = cache.get_texture_surface(&texture_info(0x10000, 8, 8), 1);
    assert_ne!(id, NULL_SURFACE_ID);

    let surface = cache.surface(id);
    assert_eq!(surface.params.levels, 2);
    assert_eq!(surface.params.end, 0x10140);
    assert!(surface.is_region_valid(surface.params.interval()));
    assert_eq!(surface.texture.read_rgba(0, 0, 7, 7), Some([0x11; 4]));
    assert_eq!(surface.texture.read_rgba(1, 0, 0, 0), Some([0x22; 4]));
    assert_eq!(surface.texture.read_rgba(1, 0, 3, 3), Some([0x22; 4]));
    assert_eq!(cache.sentenced_count(), 1);
}

#[test]
fn test_small_texture_is_blitted_to_temporary_surface() {
    let mut cache = flat_cache();
    write_memory(&mut cache, 0x8000, &[0x33; 256]);
    let info = texture_info(0x8000, 4, 4);

    let id = cache.get_texture_surface(&info, 0);
    assert_ne!(id, NULL_SURFACE_ID);
    assert_eq!(cache.surface(id).params.width, 4);
    assert_eq!(cache.sentenced_count(), 1);
    assert_eq!(cache.runtime().stats().blits, 1);
    assert_eq!(
        cache.surface(id).texture.read_rgba(0, 0, 0, 0),
        Some([0x33; 4])
    );
}

#[test]
fn test_texture_filter_uploads_at_resolution_factor() {
    let mut cache = flat_cache_with(Settings {
        resolution_factor: 2,
        texture_filter: TextureFilterMode::Bicubic,
        ..Default::default()
    });
    let info = texture_info(0x8000, 32, 32);
    let id = cache.get_texture_surface(&info, 0);
    assert_eq!(cache.surface(id).params.res_scale, 2);

    let mut cache = flat_cache_with(Settings {
        resolution_factor: 2,
        ..Default::default()
    });
    let id = cache.get_texture_surface(&info, 0);
    assert_eq!(cache.surface(id).params.res_scale, 1);
}

#[test]
fn test_texture_cube_copies_faces_once() {
    let mut cache = flat_cache();
    let config = cube_config(0x10000);

    let cube_id = cache.get_texture_cube(&config);
    assert_ne!(cube_id, NULL_SURFACE_CUBE_ID);
    assert_eq!(cache.runtime().stats().copies, 6);
    assert_eq!(cache.surface(cube_id).params.texture_type, TextureType::CubeMap);

    // Unchanged faces are not copied again
    assert_eq!(cache.get_texture_cube(&config), cube_id);
    assert_eq!(cache.runtime().stats().copies, 6);
}

#[test]
fn test_texture_cube_of_blitted_faces_is_stable() {
    let mut cache = flat_cache();
    let config = TextureCubeConfig {
        px: 0x10000,
        nx: 0x10200,
        py: 0x10400,
        ny: 0x10600,
        pz: 0x10800,
        nz: 0x10a00,
        width: 8,
        levels: 2,
        format: TextureFormat::RGBA8,
    };
    write_memory(&mut cache, config.px + 0x100, &[0x5A; 64]);

    let cube_id = cache.get_texture_cube(&config);
    assert_ne!(cube_id, NULL_SURFACE_CUBE_ID);
    assert_eq!(cache.runtime().stats().copies, 6);
    assert_eq!(
        cache.surface(cube_id).texture.read_rgba(1, 0, 0, 0),
        Some([0x5A; 4])
    );

    let uploads = cache.runtime().stats().uploads;
    let blits = cache.runtime().stats().blits;
    assert_eq!(cache.get_texture_cube(&config), cube_id);
    assert_eq!(cache.runtime().stats().copies, 6);
    assert_eq!(cache.runtime().stats().uploads, uploads);
    assert_eq!(cache.runtime().stats().blits, blits);
}

#[test]
fn test_texture_cube_recopies_modified_face() {
    let mut cache = flat_cache();
    let config = cube_config(0x10000);
    let cube_id = cache.get_texture_cube(&config);

    write_memory(&mut cache, config.py, &[0xAB; 256]);
    cache.invalidate_region(config.py, 64, None);

    assert_eq!(cache.get_texture_cube(&config), cube_id);
    assert_eq!(cache.runtime().stats().copies, 7);
    assert_eq!(
        cache.surface(cube_id).texture.read_rgba(0, 2, 0, 0),
        Some([0xAB; 4])
    );
}

#[test]
fn test_texture_cube_faces_are_tracked() {
    let mut cache = flat_cache();
    let config = cube_config(0x10000);
    cache.get_texture_cube(&config);

    let faces = cache.surfaces_in_region(config.px, 0x600);
    assert_eq!(faces.len(), 6);
    for face in faces {
        assert!(cache.surface(face).flags.contains(SurfaceFlags::TRACKED));
    }
}

#[test]
fn test_texture_cube_zero_width_is_null() {
    let mut cache = flat_cache();
    let config = TextureCubeConfig {
        width: 0,
        ..cube_config(0x10000)
    };
    assert_eq!(cache.get_texture_cube(&config), NULL_SURFACE_CUBE_ID);
}

#[test]
fn test_framebuffer_is_deduplicated() {
    let mut cache = flat_cache();
    let regs = framebuffer_regs(0x10000, 0x40000, 64, 32);

    let first = cache.get_framebuffer_surfaces(&regs, true, true);
    let second = cache.get_framebuffer_surfaces(&regs, true, true);
    assert_eq!(first.framebuffer_id, second.framebuffer_id);
    assert_eq!(cache.runtime().stats().framebuffers_created, 1);

    let color_id = first.params.color_id.unwrap();
    let depth_id = first.params.depth_id.unwrap();
    assert!(cache.surface(color_id).flags.contains(SurfaceFlags::RENDER_TARGET));
    assert_eq!(cache.surface(depth_id).params.surface_type, SurfaceType::DepthStencil);
    assert_eq!(first.draw_rect, Rectangle::new(0, 32, 64, 0));
}

#[test]
fn test_framebuffer_without_depth() {
    let mut cache = flat_cache();
    let regs = framebuffer_regs(0x10000, 0x40000, 64, 32);

    let helper = cache.get_framebuffer_surfaces(&regs, true, false);
    assert!(helper.params.color_id.is_some());
    assert!(helper.params.depth_id.is_none());
    assert!(cache.surfaces_in_region(0x40000, 0x100).is_empty());
}

#[test]
fn test_framebuffer_mismatched_offsets_use_whole_surfaces() {
    let mut cache = flat_cache();
    let big = tiled_params(0x10000, 64, 64, PixelFormat::RGBA8);
    let big_id = cache.get_surface(&big, ScaleMatch::Exact, false).unwrap();

    // Color sits one tile row into the big surface; depth is new
    let regs = framebuffer_regs(0x10800, 0x40000, 64, 32);
    let helper = cache.get_framebuffer_surfaces(&regs, true, true);

    let color_id = helper.params.color_id.unwrap();
    assert_ne!(color_id, big_id);
    assert_eq!(cache.surface(color_id).params.addr, 0x10800);
    assert_eq!(helper.draw_rect, Rectangle::new(0, 32, 64, 0));
}

#[test]
fn test_framebuffer_follows_resolution_factor() {
    let mut cache = flat_cache_with(Settings {
        resolution_factor: 2,
        ..Default::default()
    });
    let regs = framebuffer_regs(0x10000, 0x40000, 64, 32);

    let helper = cache.get_framebuffer_surfaces(&regs, true, true);
    assert_eq!(helper.res_scale, 2);
    assert_eq!(helper.draw_rect, Rectangle::new(0, 64, 128, 0));
    assert_eq!(helper.draw_rect_unscaled(), Rectangle::new(0, 32, 64, 0));
    assert_eq!(cache.framebuffer(helper.framebuffer_id).scale(), 2);
}

#[test]
fn test_invalidate_framebuffer_marks_targets_dirty() {
    let mut cache = flat_cache();
    let regs = framebuffer_regs(0x10000, 0x40000, 64, 32);
    let helper = cache.get_framebuffer_surfaces(&regs, true, true);
    cache.invalidate_framebuffer(&helper);

    assert_eq!(cache.dirty_owner(0x10000), helper.params.color_id);
    assert_eq!(cache.dirty_owner(0x40000), helper.params.depth_id);
    assert_eq!(cache.dirty_owner(0x30000), None);
}

#[test]
fn test_shadow_rendering_marks_shadow_map() {
    let mut cache = flat_cache();
    let mut regs = framebuffer_regs(0x10000, 0x40000, 64, 32);
    regs.framebuffer.shadow_rendering = true;

    let helper = cache.get_framebuffer_surfaces(&regs, true, false);
    let color_id = helper.params.color_id.unwrap();
    assert!(cache.surface(color_id).flags.contains(SurfaceFlags::SHADOW_MAP));
    assert!(helper.params.shadow_rendering);
}

#[test]
fn test_sampler_is_deduplicated() {
    let mut cache = flat_cache();
    let config = TextureConfig {
        mag_filter: TextureFilter::Linear,
        wrap_s: WrapMode::Repeat,
        ..Default::default()
    };

    let first = cache.get_sampler(&config);
    let second = cache.get_sampler(&config);
    assert_eq!(first, second);
    assert_ne!(first, NULL_SAMPLER_ID);
    assert_eq!(cache.sampler(first).params.mag_filter, TextureFilter::Linear);

    let other = cache.get_sampler(&TextureConfig {
        wrap_s: WrapMode::MirroredRepeat,
        ..config
    });
    assert_ne!(other, first);
}

#[test]
fn test_sampler_filter_override() {
    let mut cache = flat_cache_with(Settings {
        texture_sampling: TextureSampling::NearestNeighbor,
        ..Default::default()
    });
    let config = TextureConfig {
        mag_filter: TextureFilter::Linear,
        min_filter: TextureFilter::Linear,
        ..Default::default()
    };

    let id = cache.get_sampler(&config);
    let params = cache.sampler(id).params;
    assert_eq!(params.mag_filter, TextureFilter::Nearest);
    assert_eq!(params.min_filter, TextureFilter::Nearest);
}
