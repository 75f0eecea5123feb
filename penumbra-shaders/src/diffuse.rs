use penumbra_gpu::prelude::*;

use crate::utils;

/// Traces one cosine-weighted ray per pixel, producing a single-sample
/// estimate of the incoming (diffuse) radiance.
#[allow(clippy::too_many_arguments)]
#[spirv(compute(threads(8, 8)))]
pub fn trace(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(local_invocation_index)] local_idx: u32,
    #[spirv(push_constant)] params: &GiTracePassParams,
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
    #[spirv(descriptor_set = 1, binding = 1)] normal_roughness: TexRgba16,
    #[spirv(descriptor_set = 1, binding = 2)] position: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 3)] linear_z: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 4)] output: TexRgba16,
) {
    let pos = global_id.xy();

    if pos.x >= params.size.x || pos.y >= params.size.y {
        return;
    }

    if !LinearZ::unpack(linear_z.read(pos)).is_some() {
        unsafe {
            output.write(pos, Vec4::ZERO);
        }

        return;
    }

    let normal: Vec4 = normal_roughness.read(pos);
    let point: Vec4 = position.read(pos);

    let entry = GBufferEntry {
        normal: normal.xyz(),
        position: point.xyz(),
        ..Default::default()
    };

    let tables = BlueNoiseTables {
        sobol,
        scrambling_tile,
        ranking_tile,
    };

    let mut noise = BlueNoise::new(tables, pos, params.frame);
    let dir = DiffuseBrdf::new(&entry).sample(noise.sample2());
    let ray = Ray::new(entry.position + entry.normal * params.bias, dir);
    let triangles = TrianglesView::new(triangles);
    let bvh = BvhView::new(bvh);
    let hit = ray.trace_nearest(local_idx, triangles, bvh, stack);

    let radiance = if hit.is_some() {
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
    } else {
        Environment::new(world, env_map).sample(dir)
    };

    unsafe {
        output.write(pos, radiance.extend(1.0));
    }
}
