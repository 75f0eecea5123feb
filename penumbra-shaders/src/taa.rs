use penumbra_gpu::prelude::*;

use crate::utils;

#[allow(clippy::too_many_arguments)]
#[spirv(compute(threads(8, 8)))]
pub fn main(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &TaaPassParams,
    #[spirv(descriptor_set = 0, binding = 0, uniform)] camera: &Camera,
    #[spirv(descriptor_set = 0, binding = 1)] position: TexRgba32,
    #[spirv(descriptor_set = 0, binding = 2)] depth: TexR32,
    #[spirv(descriptor_set = 1, binding = 0)] input: TexRgba16,
    #[spirv(descriptor_set = 1, binding = 1)] history: TexRgba16,
    #[spirv(descriptor_set = 1, binding = 2)] output: TexRgba16,
) {
    let pos = global_id.xy();
    let size = params.size;

    if pos.x >= size.x || pos.y >= size.y {
        return;
    }

    let mut samples = [Vec3::ZERO; 9];
    let mut closest_pos = pos;
    let mut closest_depth = f32::MAX;
    let mut y = -1;

    while y <= 1 {
        let mut x = -1;

        while x <= 1 {
            let tap_pos = utils::clamp_pos(pos.as_ivec2() + ivec2(x, y), size);
            let tap: Vec4 = input.read(tap_pos);
            let tap_depth: Vec4 = depth.read(tap_pos);

            samples[((y + 1) * 3 + x + 1) as usize] = tap.xyz();

            if tap_depth.x < closest_depth {
                closest_depth = tap_depth.x;
                closest_pos = tap_pos;
            }

            x += 1;
        }

        y += 1;
    }

    if params.is_reset() {
        unsafe {
            output.write(pos, samples[4].extend(1.0));
        }

        return;
    }

    // -------------------------------------------------------------------------

    // Velocity comes from the closest surface around the pixel, so that
    // edges of moving objects carry their object's motion
    let point = if closest_depth < 1.0 {
        let point: Vec4 = position.read(closest_pos);

        point.xyz()
    } else {
        camera.ray(closest_pos.as_vec2(), size).at(MISS_DISTANCE)
    };

    let motion = camera.world_to_prev_uv(point) - camera.world_to_uv(point);
    let uv = (pos.as_vec2() + 0.5) / size.as_vec2();
    let prev_uv = uv + motion;
    let velocity = (motion * size.as_vec2()).length();

    let is_offscreen = prev_uv.x < 0.0
        || prev_uv.y < 0.0
        || prev_uv.x > 1.0
        || prev_uv.y > 1.0;

    let color = if is_offscreen {
        samples[4]
    } else {
        let (prev_color, _) =
            BilinearFilter::gather(prev_uv * size.as_vec2(), size, |pos| {
                (history.read(pos), true)
            })
            .eval();

        let taa = Taa {
            feedback_min: params.feedback_min,
            feedback_max: params.feedback_max,
            sharpen: params.sharpen(),
        };

        taa.resolve(samples, prev_color.xyz(), velocity)
    };

    unsafe {
        output.write(pos, color.extend(1.0));
    }
}
