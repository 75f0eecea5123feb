use penumbra_gpu::prelude::*;

use crate::utils;

/// Traces one GGX-sampled ray per half-resolution pixel.
///
/// Output: rgb - incoming radiance, a - hit distance (`MISS_DISTANCE` for
/// rays that escaped into the environment).
#[allow(clippy::too_many_arguments)]
#[spirv(compute(threads(8, 8)))]
pub fn trace(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(local_invocation_index)] local_idx: u32,
    #[spirv(push_constant)] params: &ReflectionTracePassParams,
    #[spirv(workgroup)] stack: BvhStack,
    #[spirv(descriptor_set = 0, binding = 0, storage_buffer)]
    triangles: &[Triangle],
    #[spirv(descriptor_set = 0, binding = 1, storage_buffer)] bvh: &[Vec4],
    #[spirv(descriptor_set = 0, binding = 2, storage_buffer)]
    materials: &[Material],
    #[spirv(descriptor_set = 0, binding = 3, storage_buffer)] sobol: &[u32],
    #[spirv(descriptor_set = 0, binding = 4, storage_buffer)]
    scrambling_tile: &[u32],
    #[spirv(descriptor_set = 0, binding = 5, storage_buffer)]
    ranking_tile: &[u32],
    #[spirv(descriptor_set = 0, binding = 6, uniform)] world: &World,
    #[spirv(descriptor_set = 0, binding = 7)] env_map: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 0, uniform)] camera: &Camera,
    #[spirv(descriptor_set = 1, binding = 1)] albedo_metallic: TexRgba8,
    #[spirv(descriptor_set = 1, binding = 2)] normal_roughness: TexRgba16,
    #[spirv(descriptor_set = 1, binding = 3)] position: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 4)] linear_z: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 5)] output: TexRgba16,
) {
    let pos = global_id.xy();

    if pos.x >= params.size.x || pos.y >= params.size.y {
        return;
    }

    let entry =
        GBuffer::new(albedo_metallic, normal_roughness, position, linear_z)
            .get(pos);

    if entry.is_none() {
        unsafe {
            output.write(pos, Vec4::ZERO);
        }

        return;
    }

    let tables = BlueNoiseTables {
        sobol,
        scrambling_tile,
        ranking_tile,
    };

    let mut noise = BlueNoise::new(tables, pos, params.frame);
    let v = (camera.origin() - entry.position).normalize();

    let (dir, _) =
        SpecularBrdf::new(&entry).sample(v, noise.sample2(), params.trim);

    let dir = if entry.normal.dot(dir) <= 0.0 {
        (-v).reflect(entry.normal)
    } else {
        dir
    };

    let ray = Ray::new(entry.position + entry.normal * params.bias, dir);
    let triangles = TrianglesView::new(triangles);
    let bvh = BvhView::new(bvh);
    let hit = ray.trace_nearest(local_idx, triangles, bvh, stack);

    let sample = if hit.is_some() {
        let material = MaterialsView::new(materials).get(hit.material_id);

        utils::hit_radiance(
            local_idx,
            triangles,
            bvh,
            stack,
            &camera.light,
            &hit,
            material,
            -dir,
        )
        .extend(hit.distance)
    } else {
        Environment::new(world, env_map)
            .sample(dir)
            .extend(MISS_DISTANCE)
    };

    unsafe {
        output.write(pos, sample);
    }
}

/// Reconstructs full-resolution reflections out of the half-resolution rays,
/// reusing each neighbour's ray through a ratio estimator weighted by this
/// pixel's BRDF.
#[allow(clippy::too_many_arguments)]
#[spirv(compute(threads(8, 8)))]
pub fn reconstruct(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &ReflectionReconstructPassParams,
    #[spirv(descriptor_set = 0, binding = 0, uniform)] camera: &Camera,
    #[spirv(descriptor_set = 0, binding = 1)] albedo_metallic: TexRgba8,
    #[spirv(descriptor_set = 0, binding = 2)] normal_roughness: TexRgba16,
    #[spirv(descriptor_set = 0, binding = 3)] position: TexRgba32,
    #[spirv(descriptor_set = 0, binding = 4)] linear_z: TexRgba32,
    #[spirv(descriptor_set = 0, binding = 5)] half_normal_roughness: TexRgba16,
    #[spirv(descriptor_set = 0, binding = 6)] half_position: TexRgba32,
    #[spirv(descriptor_set = 0, binding = 7)] half_linear_z: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 0)] input: TexRgba16,
    #[spirv(descriptor_set = 1, binding = 1)] output: TexRgba16,
) {
    let pos = global_id.xy();

    if pos.x >= params.size.x || pos.y >= params.size.y {
        return;
    }

    let entry =
        GBuffer::new(albedo_metallic, normal_roughness, position, linear_z)
            .get(pos);

    if entry.is_none() {
        unsafe {
            output.write(pos, Vec4::ZERO);
        }

        return;
    }

    let half_pos = (pos / 2).min(params.input_size - 1);
    let center: Vec4 = input.read(half_pos);

    if is_mirror(entry.roughness) {
        unsafe {
            output.write(pos, center);
        }

        return;
    }

    // -------------------------------------------------------------------------

    let v = (camera.origin() - entry.position).normalize();
    let brdf = SpecularBrdf::new(&entry);
    let count = reconstruction_samples(entry.roughness);

    let radius =
        reconstruction_radius(entry.roughness, center.w, entry.depth());

    let rotation = WhiteNoise::new(params.frame, pos).sample_angle();

    let mut estimator = RatioEstimator::default();
    let mut hit_distance = 0.0;
    let mut hit_weight = 0.0;
    let mut i = 0;

    while i < count {
        let offset = reconstruction_offset(i, count, rotation, radius);
        let tap_pos = (half_pos.as_vec2() + 0.5 + offset).floor().as_ivec2();

        if utils::contains(tap_pos, params.input_size) {
            let tap_pos = tap_pos.as_uvec2();
            let tap_surface = LinearZ::unpack(half_linear_z.read(tap_pos));

            if tap_surface.is_some()
                && tap_surface.object_id == entry.object_id()
            {
                let tap_normal: Vec4 = half_normal_roughness.read(tap_pos);
                let tap_position: Vec4 = half_position.read(tap_pos);
                let tap: Vec4 = input.read(tap_pos);

                // Neighbours don't store their ray's direction, so the hit
                // point is rebuilt along their mirror direction
                let tap_view =
                    (tap_position.xyz() - camera.origin()).normalize();

                let tap_hit = tap_position.xyz()
                    + tap_view.reflect(tap_normal.xyz()) * tap.w;

                let l = (tap_hit - entry.position).normalize();

                let weight = brdf.eval_f(l, v)
                    * entry.normal.dot(tap_normal.xyz()).max(0.0);

                estimator.add(tap.xyz(), weight);
                hit_distance += tap.w * weight;
                hit_weight += weight;
            }
        }

        i += 1;
    }

    let hit_distance = if hit_weight > 0.0 {
        hit_distance / hit_weight
    } else {
        center.w
    };

    let color = estimator.finish(center.xyz());

    unsafe {
        output.write(pos, color.extend(hit_distance));
    }
}
