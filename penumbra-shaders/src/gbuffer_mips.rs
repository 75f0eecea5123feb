//! Nearest-filter downsampling of the G-Buffer into its mip chain; linear
//! filtering would blend unrelated surfaces together.

use penumbra_gpu::prelude::*;

#[spirv(compute(threads(8, 8)))]
pub fn rgba8(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &MipPassParams,
    #[spirv(descriptor_set = 0, binding = 0)] input: TexRgba8,
    #[spirv(descriptor_set = 0, binding = 1)] output: TexRgba8,
) {
    let pos = global_id.xy();

    if pos.x >= params.size.x || pos.y >= params.size.y {
        return;
    }

    let texel: Vec4 = input.read(pos * 2);

    unsafe {
        output.write(pos, texel);
    }
}

#[spirv(compute(threads(8, 8)))]
pub fn rgba16(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &MipPassParams,
    #[spirv(descriptor_set = 0, binding = 0)] input: TexRgba16,
    #[spirv(descriptor_set = 0, binding = 1)] output: TexRgba16,
) {
    let pos = global_id.xy();

    if pos.x >= params.size.x || pos.y >= params.size.y {
        return;
    }

    let texel: Vec4 = input.read(pos * 2);

    unsafe {
        output.write(pos, texel);
    }
}

#[spirv(compute(threads(8, 8)))]
pub fn rgba32(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &MipPassParams,
    #[spirv(descriptor_set = 0, binding = 0)] input: TexRgba32,
    #[spirv(descriptor_set = 0, binding = 1)] output: TexRgba32,
) {
    let pos = global_id.xy();

    if pos.x >= params.size.x || pos.y >= params.size.y {
        return;
    }

    let texel: Vec4 = input.read(pos * 2);

    unsafe {
        output.write(pos, texel);
    }
}

#[spirv(compute(threads(8, 8)))]
pub fn linear_z(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &MipPassParams,
    #[spirv(descriptor_set = 0, binding = 0)] input: TexRgba32,
    #[spirv(descriptor_set = 0, binding = 1)] output: TexRgba32,
) {
    let pos = global_id.xy();

    if pos.x >= params.size.x || pos.y >= params.size.y {
        return;
    }

    let texel = LinearZ::unpack(input.read(pos * 2)).downsample();

    unsafe {
        output.write(pos, texel.pack());
    }
}

#[spirv(compute(threads(8, 8)))]
pub fn r32(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &MipPassParams,
    #[spirv(descriptor_set = 0, binding = 0)] input: TexR32,
    #[spirv(descriptor_set = 0, binding = 1)] output: TexR32,
) {
    let pos = global_id.xy();

    if pos.x >= params.size.x || pos.y >= params.size.y {
        return;
    }

    let depth: Vec4 = input.read(pos * 2);

    unsafe {
        output.write(pos, depth);
    }
}
