use penumbra_gpu::prelude::*;

/// Empties both tile lists of an effect, before the temporal pass starts
/// pushing tiles onto them.
#[spirv(compute(threads(1)))]
pub fn reset_args(
    #[spirv(descriptor_set = 0, binding = 0, storage_buffer)]
    list_a: &mut [u32],
    #[spirv(descriptor_set = 0, binding = 1, storage_buffer)]
    args_a: &mut [u32],
    #[spirv(descriptor_set = 0, binding = 2, storage_buffer)]
    list_b: &mut [u32],
    #[spirv(descriptor_set = 0, binding = 3, storage_buffer)]
    args_b: &mut [u32],
) {
    reset(list_a, args_a);
    reset(list_b, args_b);
}

fn reset(list: &mut [u32], args: &mut [u32]) {
    let reset = DispatchIndirectArgs::reset();

    unsafe {
        *list.index_unchecked_mut(0) = 0;
        *args.index_unchecked_mut(0) = reset.x;
        *args.index_unchecked_mut(1) = reset.y;
        *args.index_unchecked_mut(2) = reset.z;
    }
}
