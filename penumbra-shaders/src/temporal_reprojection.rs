use penumbra_gpu::prelude::*;

use crate::utils;

/// Generic temporal accumulation of a color signal, shared by reflections
/// and diffuse illumination.
///
/// History and output carry the history length in their alpha channel.
#[allow(clippy::too_many_arguments)]
#[spirv(compute(threads(8, 8)))]
pub fn main(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &TemporalPassParams,
    #[spirv(descriptor_set = 0, binding = 0, uniform)] camera: &Camera,
    #[spirv(descriptor_set = 0, binding = 1)] albedo_metallic: TexRgba8,
    #[spirv(descriptor_set = 0, binding = 2)] normal_roughness: TexRgba16,
    #[spirv(descriptor_set = 0, binding = 3)] position: TexRgba32,
    #[spirv(descriptor_set = 0, binding = 4)] linear_z: TexRgba32,
    #[spirv(descriptor_set = 0, binding = 5)] prev_normal_roughness: TexRgba16,
    #[spirv(descriptor_set = 0, binding = 6)] prev_linear_z: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 0)] input: TexRgba16,
    #[spirv(descriptor_set = 1, binding = 1)] history: TexRgba16,
    #[spirv(descriptor_set = 1, binding = 2)] output: TexRgba16,
) {
    let pos = global_id.xy();
    let size = params.size;

    if pos.x >= size.x || pos.y >= size.y {
        return;
    }

    let current: Vec4 = input.read(pos);

    let entry =
        GBuffer::new(albedo_metallic, normal_roughness, position, linear_z)
            .get(pos);

    if entry.is_none() {
        unsafe {
            output.write(pos, current.xyz().extend(0.0));
        }

        return;
    }

    let mut samples = [Vec3::ZERO; 9];
    let mut y = -1;

    while y <= 1 {
        let mut x = -1;

        while x <= 1 {
            let tap_pos = utils::clamp_pos(pos.as_ivec2() + ivec2(x, y), size);
            let tap: Vec4 = input.read(tap_pos);

            samples[((y + 1) * 3 + x + 1) as usize] = tap.xyz();
            x += 1;
        }

        y += 1;
    }

    let prev_surface = |pos: UVec2| {
        let normal: Vec4 = prev_normal_roughness.read(pos);

        (normal.xyz(), LinearZ::unpack(prev_linear_z.read(pos)))
    };

    let (prev, weight) = Reprojection::new(camera, &entry, size).fetch(
        &entry,
        size,
        prev_surface,
        |pos| history.read(pos),
    );

    let history_length = if weight > 0.0 { prev.w } else { 0.0 };

    let resolve = TemporalResolve {
        alpha: params.alpha,
        neighbourhood_scale: params.neighbourhood_scale,
        tonemap: params.tonemap(),
    };

    let (color, history_length) =
        resolve.resolve(samples, prev.xyz(), history_length);

    unsafe {
        output.write(pos, color.extend(history_length));
    }
}
