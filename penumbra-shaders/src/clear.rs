use penumbra_gpu::prelude::*;

#[spirv(compute(threads(8, 8)))]
pub fn rgba16(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &ClearPassParams,
    #[spirv(descriptor_set = 0, binding = 0)] output: TexRgba16,
) {
    let pos = global_id.xy();

    if pos.x >= params.size.x || pos.y >= params.size.y {
        return;
    }

    unsafe {
        output.write(pos, params.value);
    }
}

#[spirv(compute(threads(8, 8)))]
pub fn rgba32(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &ClearPassParams,
    #[spirv(descriptor_set = 0, binding = 0)] output: TexRgba32,
) {
    let pos = global_id.xy();

    if pos.x >= params.size.x || pos.y >= params.size.y {
        return;
    }

    unsafe {
        output.write(pos, params.value);
    }
}
