use penumbra_gpu::prelude::*;

#[allow(clippy::too_many_arguments)]
#[spirv(compute(threads(8, 8)))]
pub fn main(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &ShadingPassParams,
    #[spirv(descriptor_set = 0, binding = 0, uniform)] camera: &Camera,
    #[spirv(descriptor_set = 0, binding = 1, uniform)] world: &World,
    #[spirv(descriptor_set = 0, binding = 2)] env_map: TexRgba32,
    #[spirv(descriptor_set = 0, binding = 3)] albedo_metallic: TexRgba8,
    #[spirv(descriptor_set = 0, binding = 4)] normal_roughness: TexRgba16,
    #[spirv(descriptor_set = 0, binding = 5)] position: TexRgba32,
    #[spirv(descriptor_set = 0, binding = 6)] linear_z: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 0)] shadows: TexRgba16,
    #[spirv(descriptor_set = 1, binding = 1)] ao: TexRgba16,
    #[spirv(descriptor_set = 1, binding = 2)] reflections: TexRgba16,
    #[spirv(descriptor_set = 1, binding = 3)] gi: TexRgba16,
    #[spirv(descriptor_set = 1, binding = 4)] output: TexRgba16,
) {
    let pos = global_id.xy();
    let size = params.size;

    if pos.x >= size.x || pos.y >= size.y {
        return;
    }

    let env = Environment::new(world, env_map);

    let entry =
        GBuffer::new(albedo_metallic, normal_roughness, position, linear_z)
            .get(pos);

    if entry.is_none() {
        let color = if params.visualization
            == ShadingPassParams::VISUALIZATION_FINAL
        {
            env.sample(camera.ray(pos.as_vec2(), size).direction())
        } else {
            Vec3::ZERO
        };

        unsafe {
            output.write(pos, color.extend(1.0));
        }

        return;
    }

    // -------------------------------------------------------------------------

    let v = (camera.origin() - entry.position).normalize();

    let visibility = if params.is_enabled(ShadingPassParams::EFFECT_SHADOWS) {
        let texel: Vec4 = shadows.read(pos);

        texel.x
    } else {
        1.0
    };

    let ambient_occlusion = if params.is_enabled(ShadingPassParams::EFFECT_AO)
    {
        let texel: Vec4 = ao.read(pos);

        texel.x
    } else {
        1.0
    };

    let reflection =
        if params.is_enabled(ShadingPassParams::EFFECT_REFLECTIONS) {
            let texel: Vec4 = reflections.read(pos);

            texel.xyz()
        } else {
            env.sample((-v).reflect(entry.normal))
        };

    let irradiance = if params.is_enabled(ShadingPassParams::EFFECT_GI) {
        let texel: Vec4 = gi.read(pos);

        texel.xyz()
    } else {
        env.sample(entry.normal)
    };

    let color = match params.visualization {
        ShadingPassParams::VISUALIZATION_SHADOWS => Vec3::splat(visibility),
        ShadingPassParams::VISUALIZATION_AO => Vec3::splat(ambient_occlusion),
        ShadingPassParams::VISUALIZATION_REFLECTIONS => reflection,
        ShadingPassParams::VISUALIZATION_GI => irradiance,
        _ => {
            let direct =
                direct_lighting(&camera.light, &entry, v, visibility);

            compose(
                &entry,
                v,
                direct,
                ambient_occlusion,
                irradiance,
                reflection,
            )
        }
    };

    unsafe {
        output.write(pos, color.extend(1.0));
    }
}
