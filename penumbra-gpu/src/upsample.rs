use glam::{ivec2, IVec2, UVec2, Vec2, Vec3, Vec4};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::PENUMBRA_EPSILON;

/// Low-resolution sample taking part in the upsampling.
#[derive(Clone, Copy, Default)]
pub struct UpsampleTap {
    pub value: Vec4,
    pub depth: f32,
    pub normal: Vec3,
}

/// Depth- and normal-guided bilinear upsampling of a signal traced at a
/// lower resolution.
#[derive(Clone, Copy)]
pub struct Upsample {
    /// Full-resolution depth
    pub depth: f32,

    /// Full-resolution normal
    pub normal: Vec3,
}

impl Upsample {
    pub const PHI_NORMAL: f32 = 32.0;

    /// Returns the 2x2 low-resolution footprint of given full-resolution
    /// pixel, together with the bilinear weights' fractional position.
    pub fn footprint(pixel: UVec2, scale: u32) -> ([IVec2; 4], Vec2) {
        let pos = (pixel.as_vec2() + 0.5) / scale as f32 - 0.5;
        let p00 = pos.floor();
        let uv = pos - p00;
        let p00 = p00.as_ivec2();

        (
            [p00, p00 + ivec2(1, 0), p00 + ivec2(0, 1), p00 + ivec2(1, 1)],
            uv,
        )
    }

    /// Filters the footprint (ordered as returned from `footprint()`; taps
    /// outside of the image should have zero depth).
    pub fn eval(&self, taps: [UpsampleTap; 4], uv: Vec2) -> Vec4 {
        let bilinear = [
            (1.0 - uv.x) * (1.0 - uv.y),
            uv.x * (1.0 - uv.y),
            (1.0 - uv.x) * uv.y,
            uv.x * uv.y,
        ];

        let mut value = Vec4::ZERO;
        let mut weight_sum = 0.0;
        let mut nearest = taps[0].value;
        let mut nearest_weight = -1.0;
        let mut i = 0;

        while i < 4 {
            let tap = taps[i];

            if tap.depth > 0.0 {
                let w_depth = 1.0
                    / (0.01
                        + (self.depth - tap.depth).abs()
                            / self.depth.max(PENUMBRA_EPSILON));

                let w_normal = self
                    .normal
                    .dot(tap.normal)
                    .max(0.0)
                    .powf(Self::PHI_NORMAL);

                let weight = bilinear[i] * w_depth * w_normal;

                value += tap.value * weight;
                weight_sum += weight;

                if bilinear[i] > nearest_weight {
                    nearest = tap.value;
                    nearest_weight = bilinear[i];
                }
            }

            i += 1;
        }

        if weight_sum <= PENUMBRA_EPSILON {
            nearest
        } else {
            value / weight_sum
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{uvec2, vec2, vec3};

    use super::*;

    fn tap(value: f32, depth: f32) -> UpsampleTap {
        UpsampleTap {
            value: Vec4::splat(value),
            depth,
            normal: vec3(0.0, 1.0, 0.0),
        }
    }

    fn upsample() -> Upsample {
        Upsample {
            depth: 10.0,
            normal: vec3(0.0, 1.0, 0.0),
        }
    }

    #[test]
    fn footprint() {
        let (taps, uv) = Upsample::footprint(uvec2(3, 3), 2);

        assert_eq!(ivec2(1, 1), taps[0]);
        assert_eq!(ivec2(2, 2), taps[3]);
        assert_relative_eq!(0.25, uv.x);
        assert_relative_eq!(0.25, uv.y);
    }

    #[test]
    fn smooth_surface_is_bilinear() {
        let taps = [
            tap(0.0, 10.0),
            tap(1.0, 10.0),
            tap(0.0, 10.0),
            tap(1.0, 10.0),
        ];
        let actual = upsample().eval(taps, vec2(0.25, 0.5));

        assert_relative_eq!(0.25, actual.x);
    }

    #[test]
    fn taps_from_other_surfaces_are_rejected() {
        let taps = [
            tap(0.0, 10.0),
            tap(1.0, 50.0),
            tap(0.0, 10.0),
            tap(1.0, 50.0),
        ];
        let actual = upsample().eval(taps, vec2(0.5, 0.5));

        assert!(actual.x < 0.05);
    }

    #[test]
    fn no_valid_taps() {
        let taps = [
            tap(0.3, 0.0),
            tap(1.0, 0.0),
            tap(0.0, 0.0),
            tap(1.0, 0.0),
        ];
        let actual = upsample().eval(taps, vec2(0.5, 0.5));

        assert_eq!(Vec4::splat(0.3), actual);
    }
}
