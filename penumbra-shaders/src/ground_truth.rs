use penumbra_gpu::prelude::*;

/// Reference path tracer: one path per pixel per frame, progressively
/// averaged for as long as nothing in the scene changes.
#[allow(clippy::too_many_arguments)]
#[spirv(compute(threads(8, 8)))]
pub fn main(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(local_invocation_index)] local_idx: u32,
    #[spirv(push_constant)] params: &GroundTruthPassParams,
    #[spirv(workgroup)] stack: BvhStack,
    #[spirv(descriptor_set = 0, binding = 0, storage_buffer)]
    triangles: &[Triangle],
    #[spirv(descriptor_set = 0, binding = 1, storage_buffer)] bvh: &[Vec4],
    #[spirv(descriptor_set = 0, binding = 2, storage_buffer)]
    materials: &[Material],
    #[spirv(descriptor_set = 0, binding = 3, uniform)] world: &World,
    #[spirv(descriptor_set = 0, binding = 4)] env_map: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 0, uniform)] camera: &Camera,
    #[spirv(descriptor_set = 1, binding = 1)] prev_accum: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 2)] accum: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 3)] output: TexRgba16,
) {
    let pos = global_id.xy();
    let size = params.size;

    if pos.x >= size.x || pos.y >= size.y {
        return;
    }

    let triangles = TrianglesView::new(triangles);
    let bvh = BvhView::new(bvh);
    let materials = MaterialsView::new(materials);
    let env = Environment::new(world, env_map);
    let light = &camera.light;
    let mut noise = WhiteNoise::new(params.seed, pos);

    let mut ray = camera.ray(pos.as_vec2() + noise.sample2() - 0.5, size);
    let mut throughput = Vec3::ONE;
    let mut radiance = Vec3::ZERO;
    let mut bounce = 0;

    loop {
        let hit = ray.trace_nearest(local_idx, triangles, bvh, stack);

        if hit.is_none() {
            radiance += throughput * env.sample(ray.direction());
            break;
        }

        let material = materials.get(hit.material_id);
        let entry = hit.as_gbuffer(material);
        let v = -ray.direction();
        let origin = hit.point + hit.normal * Hit::NUDGE_OFFSET;

        radiance += throughput * material.emission();

        // Next-event estimation
        let (l, distance) = light.sample_direction(hit.point, noise.sample2());

        let is_lit = hit.normal.dot(l) > 0.0
            && !Ray::new(origin, l)
                .trace_any(local_idx, triangles, bvh, stack, distance);

        if is_lit {
            radiance += throughput * direct_lighting(light, &entry, v, 1.0);
        }

        if bounce >= params.max_bounces {
            break;
        }

        // Picks either lobe, favouring the specular one for metals
        let specular_chance = 0.5 + 0.25 * entry.metallic;

        let (l, weight) = if noise.sample() < specular_chance {
            let brdf = SpecularBrdf::new(&entry);
            let (l, pdf) = brdf.sample(v, noise.sample2(), 1.0);
            let n_o_l = entry.normal.dot(l);

            let weight = if n_o_l > 0.0 && pdf > 0.0 {
                brdf.eval(l, v) * n_o_l / (pdf * specular_chance)
            } else {
                Vec3::ZERO
            };

            (l, weight)
        } else {
            let brdf = DiffuseBrdf::new(&entry);
            let l = brdf.sample(noise.sample2());

            // Cosine-weighted pdf cancels out with the cosine term
            let weight = brdf.eval(l, v) * PI / (1.0 - specular_chance);

            (l, weight)
        };

        if weight == Vec3::ZERO {
            break;
        }

        throughput *= weight;
        ray = Ray::new(origin, l);
        bounce += 1;
    }

    let history: Vec4 = prev_accum.read(pos);
    let color = progressive_average(history.xyz(), radiance, params.frame_idx);

    unsafe {
        accum.write(pos, color.extend(1.0));
        output.write(pos, color.extend(1.0));
    }
}
