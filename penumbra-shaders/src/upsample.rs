use penumbra_gpu::prelude::*;

use crate::utils;

/// Upsamples a scalar signal (shadows, ambient occlusion), raising it to
/// `power` afterwards; output is splatted into rgb.
#[allow(clippy::too_many_arguments)]
#[spirv(compute(threads(8, 8)))]
pub fn scalar(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &UpsamplePassParams,
    #[spirv(descriptor_set = 0, binding = 0)] normal_roughness: TexRgba16,
    #[spirv(descriptor_set = 0, binding = 1)] linear_z: TexRgba32,
    #[spirv(descriptor_set = 0, binding = 2)] low_normal_roughness: TexRgba16,
    #[spirv(descriptor_set = 0, binding = 3)] low_linear_z: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 0)] input: TexRgba16,
    #[spirv(descriptor_set = 1, binding = 1)] output: TexRgba16,
) {
    let pos = global_id.xy();

    if pos.x >= params.size.x || pos.y >= params.size.y {
        return;
    }

    let value = upsample(
        pos,
        params,
        normal_roughness,
        linear_z,
        low_normal_roughness,
        low_linear_z,
        input,
    )
    .x
    .max(0.0)
    .powf(params.power);

    unsafe {
        output.write(pos, Vec3::splat(value).extend(1.0));
    }
}

/// Upsamples a color signal (diffuse illumination).
#[allow(clippy::too_many_arguments)]
#[spirv(compute(threads(8, 8)))]
pub fn color(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &UpsamplePassParams,
    #[spirv(descriptor_set = 0, binding = 0)] normal_roughness: TexRgba16,
    #[spirv(descriptor_set = 0, binding = 1)] linear_z: TexRgba32,
    #[spirv(descriptor_set = 0, binding = 2)] low_normal_roughness: TexRgba16,
    #[spirv(descriptor_set = 0, binding = 3)] low_linear_z: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 0)] input: TexRgba16,
    #[spirv(descriptor_set = 1, binding = 1)] output: TexRgba16,
) {
    let pos = global_id.xy();

    if pos.x >= params.size.x || pos.y >= params.size.y {
        return;
    }

    let value = upsample(
        pos,
        params,
        normal_roughness,
        linear_z,
        low_normal_roughness,
        low_linear_z,
        input,
    );

    unsafe {
        output.write(pos, value.xyz().extend(1.0));
    }
}

fn upsample(
    pos: UVec2,
    params: &UpsamplePassParams,
    normal_roughness: TexRgba16,
    linear_z: TexRgba32,
    low_normal_roughness: TexRgba16,
    low_linear_z: TexRgba32,
    input: TexRgba16,
) -> Vec4 {
    let normal: Vec4 = normal_roughness.read(pos);

    let upsample = Upsample {
        depth: LinearZ::unpack(linear_z.read(pos)).depth,
        normal: normal.xyz(),
    };

    let (coords, uv) = Upsample::footprint(pos, params.scale.max(1));

    if upsample.depth <= 0.0 {
        // Sky; nearest tap is as good as any
        return input.read(utils::clamp_pos(coords[0], params.input_size));
    }

    let mut taps = [UpsampleTap::default(); 4];
    let mut i = 0;

    while i < 4 {
        let coord = coords[i];

        if utils::contains(coord, params.input_size) {
            let coord = coord.as_uvec2();
            let normal: Vec4 = low_normal_roughness.read(coord);

            taps[i] = UpsampleTap {
                value: input.read(coord),
                depth: LinearZ::unpack(low_linear_z.read(coord)).depth,
                normal: normal.xyz(),
            };
        }

        i += 1;
    }

    upsample.eval(taps, uv)
}
