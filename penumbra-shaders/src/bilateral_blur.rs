use penumbra_gpu::prelude::*;

use crate::utils;

/// Single-pass, edge-aware blur of a color signal; which edges it respects
/// is chosen through `BilateralPassParams::flags`.
///
/// Alpha (history length) is passed through untouched.
#[spirv(compute(threads(8, 8)))]
pub fn main(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(push_constant)] params: &BilateralPassParams,
    #[spirv(descriptor_set = 0, binding = 0)] normal_roughness: TexRgba16,
    #[spirv(descriptor_set = 0, binding = 1)] linear_z: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 0)] input: TexRgba16,
    #[spirv(descriptor_set = 1, binding = 1)] output: TexRgba16,
) {
    let pos = global_id.xy();
    let size = params.size;

    if pos.x >= size.x || pos.y >= size.y {
        return;
    }

    let center: Vec4 = input.read(pos);
    let surface = LinearZ::unpack(linear_z.read(pos));
    let normal: Vec4 = normal_roughness.read(pos);
    let roughness = normal.w;

    let is_mirror = params.has(BilateralPassParams::FLAG_ROUGHNESS_SIGMA)
        && is_mirror(roughness);

    if !surface.is_some() || is_mirror {
        unsafe {
            output.write(pos, center);
        }

        return;
    }

    let radius = params.radius.clamp(1, MAX_BLUR_RADIUS);

    let sigma = if params.has(BilateralPassParams::FLAG_ROUGHNESS_SIGMA) {
        BilateralFilter::sigma_for_roughness(
            roughness,
            params.sigma_min,
            params.sigma_max,
            size.y,
        )
        .max(0.5)
    } else {
        BilateralFilter::sigma_for_radius(radius)
    };

    let filter = BilateralFilter {
        center: BilateralTap {
            depth: surface.depth,
            normal: normal.xyz(),
            roughness,
        },
        slope: surface.slope,
        sigma,
        phi_normal: params.phi_normal,
        depth_weight: params.has(BilateralPassParams::FLAG_DEPTH),
        normal_weight: params.has(BilateralPassParams::FLAG_NORMAL),
        roughness_weight: params.has(BilateralPassParams::FLAG_ROUGHNESS),
    };

    let mut acc = BilateralAccumulator::default();
    let radius = radius as i32;
    let mut y = -radius;

    while y <= radius {
        let mut x = -radius;

        while x <= radius {
            let offset = ivec2(x, y);
            let tap_pos = pos.as_ivec2() + offset;

            if utils::contains(tap_pos, size) {
                let tap_pos = tap_pos.as_uvec2();
                let value: Vec4 = input.read(tap_pos);
                let normal: Vec4 = normal_roughness.read(tap_pos);

                let tap = BilateralTap {
                    depth: LinearZ::unpack(linear_z.read(tap_pos)).depth,
                    normal: normal.xyz(),
                    roughness: normal.w,
                };

                let weight = filter.weight(&tap, offset)
                    * color_weight(center.xyz(), value.xyz(), params.phi_color);

                acc.add(value.xyz().extend(0.0), weight);
            }

            x += 1;
        }

        y += 1;
    }

    let color = acc.finish(center).xyz();

    unsafe {
        output.write(pos, color.extend(center.w));
    }
}
