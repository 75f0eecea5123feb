use penumbra_gpu::prelude::*;

use crate::utils;

#[allow(clippy::too_many_arguments)]
#[spirv(compute(threads(8, 4)))]
pub fn trace(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(workgroup_id)] workgroup_id: UVec3,
    #[spirv(local_invocation_id)] local_id: UVec3,
    #[spirv(local_invocation_index)] local_idx: u32,
    #[spirv(push_constant)] params: &ShadowTracePassParams,
    #[spirv(workgroup)] stack: BvhStack,
    #[spirv(workgroup)] mask: &mut u32,
    #[spirv(descriptor_set = 0, binding = 0, storage_buffer)]
    triangles: &[Triangle],
    #[spirv(descriptor_set = 0, binding = 1, storage_buffer)] bvh: &[Vec4],
    #[spirv(descriptor_set = 0, binding = 2, storage_buffer)] sobol: &[u32],
    #[spirv(descriptor_set = 0, binding = 3, storage_buffer)]
    scrambling_tile: &[u32],
    #[spirv(descriptor_set = 0, binding = 4, storage_buffer)]
    ranking_tile: &[u32],
    #[spirv(descriptor_set = 1, binding = 0, uniform)] camera: &Camera,
    #[spirv(descriptor_set = 1, binding = 1)] normal_roughness: TexRgba16,
    #[spirv(descriptor_set = 1, binding = 2)] position: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 3)] linear_z: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 4)] tiles: TexR32u,
) {
    let pos = global_id.xy();

    let tables = BlueNoiseTables {
        sobol,
        scrambling_tile,
        ranking_tile,
    };

    if local_idx == 0 {
        *mask = 0;
    }

    utils::barrier();

    // Threads past the image's edge must still reach the barriers below, so
    // they just don't contribute any bits
    if pos.x < params.size.x && pos.y < params.size.y {
        let surface = LinearZ::unpack(linear_z.read(pos));

        let is_visible = if surface.is_some() {
            let normal = normal_roughness.read(pos).xyz();
            let point = position.read(pos).xyz();
            let mut noise = BlueNoise::new(tables, pos, params.frame);

            let (dir, distance) =
                camera.light.sample_direction(point, noise.sample2());

            if normal.dot(dir) <= 0.0 {
                false
            } else {
                let ray = Ray::new(point + normal * params.bias, dir);

                !ray.trace_any(
                    local_idx,
                    TrianglesView::new(triangles),
                    BvhView::new(bvh),
                    stack,
                    distance,
                )
            }
        } else {
            // Sky is lit; that keeps tiles at silhouettes uniform more often
            true
        };

        if is_visible {
            utils::workgroup_or(mask, TileMask::bit(local_id.xy()));
        }
    }

    utils::barrier();

    if local_idx == 0 {
        unsafe {
            tiles.write(workgroup_id.xy(), UVec4::new(*mask, 0, 0, 0));
        }
    }
}

/// Accumulates visibility over time, classifying tiles into the ones that
/// need filtering and the ones that are uniformly lit or shadowed.
#[allow(clippy::too_many_arguments)]
#[spirv(compute(threads(8, 4)))]
pub fn temporal(
    #[spirv(workgroup_id)] workgroup_id: UVec3,
    #[spirv(local_invocation_id)] local_id: UVec3,
    #[spirv(local_invocation_index)] local_idx: u32,
    #[spirv(push_constant)] params: &ShadowTemporalPassParams,
    #[spirv(descriptor_set = 0, binding = 0, uniform)] camera: &Camera,
    #[spirv(descriptor_set = 0, binding = 1)] albedo_metallic: TexRgba8,
    #[spirv(descriptor_set = 0, binding = 2)] normal_roughness: TexRgba16,
    #[spirv(descriptor_set = 0, binding = 3)] position: TexRgba32,
    #[spirv(descriptor_set = 0, binding = 4)] linear_z: TexRgba32,
    #[spirv(descriptor_set = 0, binding = 5)] prev_normal_roughness: TexRgba16,
    #[spirv(descriptor_set = 0, binding = 6)] prev_linear_z: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 0)] tiles: TexR32u,
    #[spirv(descriptor_set = 1, binding = 1)] prev_shadow: TexRgba16,
    #[spirv(descriptor_set = 1, binding = 2)] prev_moments: TexRgba16,
    #[spirv(descriptor_set = 1, binding = 3)] shadow: TexRgba16,
    #[spirv(descriptor_set = 1, binding = 4)] moments: TexRgba16,
    #[spirv(descriptor_set = 2, binding = 0, storage_buffer)]
    denoise_tiles: &mut [u32],
    #[spirv(descriptor_set = 2, binding = 1, storage_buffer)]
    denoise_args: &mut [u32],
    #[spirv(descriptor_set = 2, binding = 2, storage_buffer)]
    fast_tiles: &mut [u32],
    #[spirv(descriptor_set = 2, binding = 3, storage_buffer)]
    fast_args: &mut [u32],
) {
    let tile = workgroup_id.xy();
    let local = local_id.xy();
    let pos = TileCoord::new(tile).pixel(local);
    let size = params.size;

    let bits: UVec4 = tiles.read(tile);
    let bits = TileMask::new(bits.x);
    let class = bits.classify(TileMask::valid_pixels(tile, size));

    if local_idx == 0 {
        if class.is_uniform() {
            utils::push_tile(fast_tiles, fast_args, tile);
        } else {
            utils::push_tile(denoise_tiles, denoise_args, tile);
        }
    }

    if pos.x >= size.x || pos.y >= size.y {
        return;
    }

    // -------------------------------------------------------------------------

    let entry =
        GBuffer::new(albedo_metallic, normal_roughness, position, linear_z)
            .get(pos);

    let sample = if class.is_uniform() || entry.is_none() {
        ShadowSample::uniform(bits.visibility(local))
    } else {
        let reprojection = Reprojection::new(camera, &entry, size);

        let prev_surface = |pos: UVec2| {
            let normal: Vec4 = prev_normal_roughness.read(pos);

            (normal.xyz(), LinearZ::unpack(prev_linear_z.read(pos)))
        };

        let (history_shadow, weight) =
            reprojection.fetch(&entry, size, prev_surface, |pos| {
                prev_shadow.read(pos)
            });

        let (history_moments, _) =
            reprojection.fetch(&entry, size, prev_surface, |pos| {
                prev_moments.read(pos)
            });

        let history = ShadowSample {
            visibility: history_shadow.x,
            variance: history_shadow.y,
            moments: Moments::unpack(history_moments.xy()),
            history_length: if weight > 0.0 {
                history_moments.z
            } else {
                0.0
            },
        };

        let spatial_variance = spatial_variance(|offset| {
            let tap = pos.as_ivec2() + offset;

            if utils::contains(tap, size) {
                let tap = tap.as_uvec2();
                let bits: UVec4 = tiles.read(tap / TILE_SIZE);

                Some(TileMask::new(bits.x).visibility(tap % TILE_SIZE))
            } else {
                None
            }
        });

        let temporal = ShadowTemporal {
            alpha: params.alpha,
            moments_alpha: params.moments_alpha,
        };

        temporal.resolve(bits.visibility(local), history, spatial_variance)
    };

    let [d0, d1] = sample.pack();

    unsafe {
        shadow.write(pos, d0);
        moments.write(pos, d1);
    }
}

/// Expands the packed visibility bits into an image, for when the shadows
/// are not denoised.
#[spirv(compute(threads(8, 8)))]
pub fn unpack(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &CopyTilesPassParams,
    #[spirv(descriptor_set = 0, binding = 0)] tiles: TexR32u,
    #[spirv(descriptor_set = 0, binding = 1)] output: TexRgba16,
) {
    let pos = global_id.xy();

    if pos.x >= params.size.x || pos.y >= params.size.y {
        return;
    }

    let bits: UVec4 = tiles.read(pos / TILE_SIZE);
    let visibility = TileMask::new(bits.x).visibility(pos % TILE_SIZE);

    unsafe {
        output.write(pos, vec4(visibility, 0.0, 0.0, 0.0));
    }
}

/// Copies fast-path tiles straight into the filter's output.
#[spirv(compute(threads(8, 4)))]
pub fn copy_tiles(
    #[spirv(workgroup_id)] workgroup_id: UVec3,
    #[spirv(local_invocation_id)] local_id: UVec3,
    #[spirv(push_constant)] params: &CopyTilesPassParams,
    #[spirv(descriptor_set = 0, binding = 0, storage_buffer)] tiles: &[u32],
    #[spirv(descriptor_set = 0, binding = 1)] input: TexRgba16,
    #[spirv(descriptor_set = 0, binding = 2)] output: TexRgba16,
) {
    if !utils::is_listed(tiles, workgroup_id) {
        return;
    }

    let pos = utils::listed_tile(tiles, workgroup_id).pixel(local_id.xy());

    if pos.x >= params.size.x || pos.y >= params.size.y {
        return;
    }

    let texel: Vec4 = input.read(pos);

    unsafe {
        output.write(pos, texel);
    }
}

/// Single iteration of the edge-aware à-trous wavelet filter, run over the
/// tiles that need denoising.
#[allow(clippy::too_many_arguments)]
#[spirv(compute(threads(8, 4)))]
pub fn atrous(
    #[spirv(workgroup_id)] workgroup_id: UVec3,
    #[spirv(local_invocation_id)] local_id: UVec3,
    #[spirv(push_constant)] params: &ShadowAtrousPassParams,
    #[spirv(descriptor_set = 0, binding = 0)] normal_roughness: TexRgba16,
    #[spirv(descriptor_set = 0, binding = 1)] linear_z: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 0, storage_buffer)] tiles: &[u32],
    #[spirv(descriptor_set = 1, binding = 1)] input: TexRgba16,
    #[spirv(descriptor_set = 1, binding = 2)] output: TexRgba16,
) {
    if !utils::is_listed(tiles, workgroup_id) {
        return;
    }

    let pos = utils::listed_tile(tiles, workgroup_id).pixel(local_id.xy());
    let size = params.size;

    if pos.x >= size.x || pos.y >= size.y {
        return;
    }

    let center: Vec4 = input.read(pos);
    let center_surface = LinearZ::unpack(linear_z.read(pos));

    if !center_surface.is_some() {
        unsafe {
            output.write(pos, center);
        }

        return;
    }

    // -------------------------------------------------------------------------

    let mut variance = 0.0;
    let mut y = -1;

    while y <= 1 {
        let mut x = -1;

        while x <= 1 {
            let offset = ivec2(x, y);
            let tap_pos = utils::clamp_pos(pos.as_ivec2() + offset, size);
            let tap: Vec4 = input.read(tap_pos);

            variance += tap.y * variance_prefilter_kernel(offset);
            x += 1;
        }

        y += 1;
    }

    let center_normal: Vec4 = normal_roughness.read(pos);

    let filter = AtrousFilter {
        center: AtrousTap {
            value: center.x,
            variance: center.y,
            depth: center_surface.depth,
            normal: center_normal.xyz(),
        },
        slope: center_surface.slope,
        std_dev: variance.max(0.0).sqrt(),
        phi_value: params.phi_visibility,
        phi_normal: params.phi_normal,
        sigma_depth: params.sigma_depth,
    };

    let mut acc = AtrousAccumulator::default();
    let step = params.step as i32;
    let mut y = -2;

    while y <= 2 {
        let mut x = -2;

        while x <= 2 {
            let offset = ivec2(x, y);
            let tap_pos = pos.as_ivec2() + offset * step;

            if utils::contains(tap_pos, size) {
                let tap_pos = tap_pos.as_uvec2();
                let value: Vec4 = input.read(tap_pos);
                let normal: Vec4 = normal_roughness.read(tap_pos);

                let tap = AtrousTap {
                    value: value.x,
                    variance: value.y,
                    depth: LinearZ::unpack(linear_z.read(tap_pos)).depth,
                    normal: normal.xyz(),
                };

                let weight =
                    filter.weight(&tap, offset * step) * atrous_kernel(offset);

                acc.add(&tap, weight);
            }

            x += 1;
        }

        y += 1;
    }

    let (visibility, variance) = acc.finish();

    unsafe {
        output.write(pos, vec4(visibility, variance, 0.0, 0.0));
    }
}
