use penumbra_gpu::prelude::*;

use crate::utils;

#[allow(clippy::too_many_arguments)]
#[spirv(compute(threads(8, 4)))]
pub fn trace(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(workgroup_id)] workgroup_id: UVec3,
    #[spirv(local_invocation_id)] local_id: UVec3,
    #[spirv(local_invocation_index)] local_idx: u32,
    #[spirv(push_constant)] params: &AoTracePassParams,
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

    if pos.x < params.size.x && pos.y < params.size.y {
        let surface = LinearZ::unpack(linear_z.read(pos));

        let is_unoccluded = if surface.is_some() && camera.is_ao_enabled() {
            let normal: Vec4 = normal_roughness.read(pos);
            let point: Vec4 = position.read(pos);

            let entry = GBufferEntry {
                normal: normal.xyz(),
                position: point.xyz(),
                ..Default::default()
            };

            let origin = entry.position + entry.normal * params.bias;
            let mut unoccluded = 0;
            let mut ray_idx = 0;

            while ray_idx < params.rays_per_pixel {
                let mut noise = BlueNoise::new(
                    tables,
                    pos,
                    params.frame * params.rays_per_pixel + ray_idx,
                );

                let dir = DiffuseBrdf::new(&entry).sample(noise.sample2());

                let is_occluded = Ray::new(origin, dir).trace_any(
                    local_idx,
                    TrianglesView::new(triangles),
                    BvhView::new(bvh),
                    stack,
                    params.ray_length,
                );

                if !is_occluded {
                    unoccluded += 1;
                }

                ray_idx += 1;
            }

            ao_bit(unoccluded, params.rays_per_pixel)
        } else {
            true
        };

        if is_unoccluded {
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

/// Accumulates the per-pixel bits over time and sorts tiles into the blur
/// and disocclusion lists; tiles that are unoccluded (or occluded) as a whole
/// go straight into the final image instead.
///
/// Output: x - ambient occlusion, y - history length.
#[allow(clippy::too_many_arguments)]
#[spirv(compute(threads(8, 4)))]
pub fn temporal(
    #[spirv(workgroup_id)] workgroup_id: UVec3,
    #[spirv(local_invocation_id)] local_id: UVec3,
    #[spirv(local_invocation_index)] local_idx: u32,
    #[spirv(push_constant)] params: &AoTemporalPassParams,
    #[spirv(workgroup)] blur_flag: &mut u32,
    #[spirv(workgroup)] disocclusion_flag: &mut u32,
    #[spirv(descriptor_set = 0, binding = 0, uniform)] camera: &Camera,
    #[spirv(descriptor_set = 0, binding = 1)] albedo_metallic: TexRgba8,
    #[spirv(descriptor_set = 0, binding = 2)] normal_roughness: TexRgba16,
    #[spirv(descriptor_set = 0, binding = 3)] position: TexRgba32,
    #[spirv(descriptor_set = 0, binding = 4)] linear_z: TexRgba32,
    #[spirv(descriptor_set = 0, binding = 5)] prev_normal_roughness: TexRgba16,
    #[spirv(descriptor_set = 0, binding = 6)] prev_linear_z: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 0)] tiles: TexR32u,
    #[spirv(descriptor_set = 1, binding = 1)] prev_ao: TexRgba16,
    #[spirv(descriptor_set = 1, binding = 2)] ao: TexRgba16,
    #[spirv(descriptor_set = 1, binding = 3)] output: TexRgba16,
    #[spirv(descriptor_set = 2, binding = 0, storage_buffer)]
    blur_tiles: &mut [u32],
    #[spirv(descriptor_set = 2, binding = 1, storage_buffer)]
    blur_args: &mut [u32],
    #[spirv(descriptor_set = 2, binding = 2, storage_buffer)]
    disocclusion_tiles: &mut [u32],
    #[spirv(descriptor_set = 2, binding = 3, storage_buffer)]
    disocclusion_args: &mut [u32],
) {
    let tile = workgroup_id.xy();
    let local = local_id.xy();
    let pos = TileCoord::new(tile).pixel(local);
    let size = params.size;

    let bits: UVec4 = tiles.read(tile);
    let bits = TileMask::new(bits.x);
    let class = bits.classify(TileMask::valid_pixels(tile, size));

    if let Some(value) = uniform_ao(class) {
        if pos.x < size.x && pos.y < size.y {
            let value = vec4(value, 1.0, 0.0, 0.0);

            unsafe {
                ao.write(pos, value);
                output.write(pos, value);
            }
        }

        return;
    }

    // -------------------------------------------------------------------------

    if local_idx == 0 {
        *blur_flag = 0;
        *disocclusion_flag = 0;
    }

    utils::barrier();

    if pos.x < size.x && pos.y < size.y {
        let current = bits.visibility(local);

        let entry =
            GBuffer::new(albedo_metallic, normal_roughness, position, linear_z)
                .get(pos);

        let (value, history_length) = if entry.is_some() {
            let reprojection = Reprojection::new(camera, &entry, size);

            let prev_surface = |pos: UVec2| {
                let normal: Vec4 = prev_normal_roughness.read(pos);

                (normal.xyz(), LinearZ::unpack(prev_linear_z.read(pos)))
            };

            let (history, weight) = reprojection
                .fetch(&entry, size, prev_surface, |pos| prev_ao.read(pos));

            let history_length = if weight > 0.0 { history.y } else { 0.0 };

            AoTemporal {
                alpha: params.alpha,
            }
            .resolve(current, history.x, history_length)
        } else {
            (1.0, 0.0)
        };

        if entry.is_some() {
            if needs_blur(value) {
                utils::workgroup_or(blur_flag, 1);
            }

            if is_disoccluded(history_length, params.disocclusion_threshold)
            {
                utils::workgroup_or(disocclusion_flag, 1);
            }
        }

        unsafe {
            ao.write(pos, vec4(value, history_length, 0.0, 0.0));
        }
    }

    utils::barrier();

    if local_idx == 0 {
        if *blur_flag != 0 {
            utils::push_tile(blur_tiles, blur_args, tile);
        }

        if *disocclusion_flag != 0 {
            utils::push_tile(disocclusion_tiles, disocclusion_args, tile);
        }
    }
}

/// Expands the packed bits into an image, for when ambient occlusion is not
/// denoised.
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
    let value = TileMask::new(bits.x).visibility(pos % TILE_SIZE);

    unsafe {
        output.write(pos, vec4(value, 0.0, 0.0, 0.0));
    }
}

/// One direction of the separable, depth- and normal-aware blur; runs only
/// over tiles that contain occluded pixels.
#[allow(clippy::too_many_arguments)]
#[spirv(compute(threads(8, 4)))]
pub fn blur(
    #[spirv(workgroup_id)] workgroup_id: UVec3,
    #[spirv(local_invocation_id)] local_id: UVec3,
    #[spirv(push_constant)] params: &AoBlurPassParams,
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
    let surface = LinearZ::unpack(linear_z.read(pos));

    if !surface.is_some() {
        unsafe {
            output.write(pos, center);
        }

        return;
    }

    let normal: Vec4 = normal_roughness.read(pos);
    let radius = params.radius.min(MAX_BLUR_RADIUS);

    let filter = BilateralFilter {
        center: BilateralTap {
            depth: surface.depth,
            normal: normal.xyz(),
            roughness: 0.0,
        },
        slope: surface.slope,
        sigma: BilateralFilter::sigma_for_radius(radius),
        phi_normal: 32.0,
        depth_weight: true,
        normal_weight: true,
        roughness_weight: false,
    };

    let direction = params.direction();
    let mut acc = BilateralAccumulator::default();
    let radius = radius as i32;
    let mut i = -radius;

    while i <= radius {
        let offset = direction.offset(i);
        let tap_pos = pos.as_ivec2() + offset;

        if utils::contains(tap_pos, size) {
            let tap_pos = tap_pos.as_uvec2();
            let value: Vec4 = input.read(tap_pos);
            let normal: Vec4 = normal_roughness.read(tap_pos);

            let tap = BilateralTap {
                depth: LinearZ::unpack(linear_z.read(tap_pos)).depth,
                normal: normal.xyz(),
                roughness: 0.0,
            };

            acc.add(vec4(value.x, 0.0, 0.0, 0.0), filter.weight(&tap, offset));
        }

        i += 1;
    }

    let value = acc.finish(center).x;

    unsafe {
        output.write(pos, vec4(value, center.y, 0.0, 0.0));
    }
}

/// Wide, single-pass blur applied to pixels whose history has just been
/// (re)started; overwrites the regular blur's result for those pixels.
#[allow(clippy::too_many_arguments)]
#[spirv(compute(threads(8, 4)))]
pub fn disocclusion_blur(
    #[spirv(workgroup_id)] workgroup_id: UVec3,
    #[spirv(local_invocation_id)] local_id: UVec3,
    #[spirv(push_constant)] params: &AoDisocclusionPassParams,
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
    let surface = LinearZ::unpack(linear_z.read(pos));

    if !surface.is_some() || !is_disoccluded(center.y, params.threshold) {
        return;
    }

    let normal: Vec4 = normal_roughness.read(pos);
    let radius = params.radius.min(MAX_DISOCCLUSION_RADIUS);

    let filter = BilateralFilter {
        center: BilateralTap {
            depth: surface.depth,
            normal: normal.xyz(),
            roughness: 0.0,
        },
        slope: surface.slope,
        sigma: BilateralFilter::sigma_for_radius(radius),
        phi_normal: 32.0,
        depth_weight: true,
        normal_weight: true,
        roughness_weight: false,
    };

    let mut acc = BilateralAccumulator::default();
    let radius = radius as i32;
    let mut y = -radius;

    while y <= radius {
        let mut x = -radius;

        while x <= radius {
            let offset = ivec2(x, y);
            let tap_pos = pos.as_ivec2() + offset;

            if utils::contains(tap_pos, size) {
                let tap_pos = tap_pos.as_uvec2();
                let value: Vec4 = input.read(tap_pos);
                let normal: Vec4 = normal_roughness.read(tap_pos);

                let tap = BilateralTap {
                    depth: LinearZ::unpack(linear_z.read(tap_pos)).depth,
                    normal: normal.xyz(),
                    roughness: 0.0,
                };

                acc.add(
                    vec4(value.x, 0.0, 0.0, 0.0),
                    filter.weight(&tap, offset),
                );
            }

            x += 1;
        }

        y += 1;
    }

    let value = acc.finish(center).x;

    unsafe {
        output.write(pos, vec4(value, center.y, 0.0, 0.0));
    }
}
