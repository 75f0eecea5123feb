use glam::{IVec2, Vec3};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::PENUMBRA_EPSILON;

/// One-dimensional B3-spline kernel of the à-trous filter, indexed by the
/// distance from center (in taps).
pub const ATROUS_KERNEL: [f32; 3] = [3.0 / 8.0, 1.0 / 4.0, 1.0 / 16.0];

/// Returns the kernel's weight for a tap at given (unstrided) offset in
/// `-2..=2`.
pub fn atrous_kernel(offset: IVec2) -> f32 {
    let offset = offset.abs();

    ATROUS_KERNEL[offset.x as usize] * ATROUS_KERNEL[offset.y as usize]
}

/// Returns the weight of a tap at given offset in `-1..=1` of the 3x3
/// gaussian used to prefilter variance before it drives the edge-stopping
/// function.
pub fn variance_prefilter_kernel(offset: IVec2) -> f32 {
    const KERNEL: [f32; 2] = [1.0 / 2.0, 1.0 / 4.0];

    let offset = offset.abs();

    KERNEL[offset.x as usize] * KERNEL[offset.y as usize]
}

#[derive(Clone, Copy, Default)]
pub struct AtrousTap {
    pub value: f32,
    pub variance: f32,
    pub depth: f32,
    pub normal: Vec3,
}

/// Edge-stopping weights of a single à-trous iteration around one pixel.
#[derive(Clone, Copy)]
pub struct AtrousFilter {
    pub center: AtrousTap,

    /// Depth change per pixel at the center
    pub slope: f32,

    /// Square root of the prefiltered variance at the center
    pub std_dev: f32,

    pub phi_value: f32,
    pub phi_normal: f32,
    pub sigma_depth: f32,
}

impl AtrousFilter {
    /// Returns the weight of a tap at given (strided) offset, excluding the
    /// kernel's weight.
    pub fn weight(&self, tap: &AtrousTap, offset: IVec2) -> f32 {
        if tap.depth <= 0.0 {
            return 0.0;
        }

        let distance = offset.as_vec2().length();

        let w_depth = -(self.center.depth - tap.depth).abs()
            / (self.sigma_depth * self.slope * distance + PENUMBRA_EPSILON);

        let w_value = -(self.center.value - tap.value).abs()
            / (self.phi_value * self.std_dev + PENUMBRA_EPSILON);

        let w_normal = self
            .center
            .normal
            .dot(tap.normal)
            .max(0.0)
            .powf(self.phi_normal);

        (w_depth + w_value).exp() * w_normal
    }
}

/// Weighted sum of taps; variance is accumulated with squared weights.
#[derive(Clone, Copy, Default)]
pub struct AtrousAccumulator {
    value: f32,
    variance: f32,
    weight: f32,
}

impl AtrousAccumulator {
    pub fn add(&mut self, tap: &AtrousTap, weight: f32) {
        self.value += tap.value * weight;
        self.variance += tap.variance * weight * weight;
        self.weight += weight;
    }

    /// Returns filtered `(value, variance)`.
    pub fn finish(self) -> (f32, f32) {
        if self.weight <= 0.0 {
            (0.0, 0.0)
        } else {
            (
                self.value / self.weight,
                self.variance / (self.weight * self.weight),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{ivec2, vec3};

    use super::*;

    fn tap(value: f32, depth: f32) -> AtrousTap {
        AtrousTap {
            value,
            variance: 0.1,
            depth,
            normal: vec3(0.0, 1.0, 0.0),
        }
    }

    fn filter(center: AtrousTap) -> AtrousFilter {
        AtrousFilter {
            center,
            slope: 0.05,
            std_dev: 0.1f32.sqrt(),
            phi_value: 10.0,
            phi_normal: 128.0,
            sigma_depth: 1.0,
        }
    }

    #[test]
    fn kernels_are_normalized() {
        let mut atrous = 0.0;
        let mut prefilter = 0.0;

        for y in -2..=2 {
            for x in -2..=2 {
                atrous += atrous_kernel(ivec2(x, y));

                if x.abs() <= 1 && y.abs() <= 1 {
                    prefilter += variance_prefilter_kernel(ivec2(x, y));
                }
            }
        }

        assert_relative_eq!(1.0, atrous);
        assert_relative_eq!(1.0, prefilter);
    }

    #[test]
    fn center_has_full_weight() {
        let center = tap(0.5, 10.0);

        assert_relative_eq!(1.0, filter(center).weight(&center, IVec2::ZERO));
    }

    #[test]
    fn depth_discontinuity_stops_filter() {
        let center = tap(0.5, 10.0);

        let weight = filter(center).weight(&tap(0.5, 12.0), ivec2(2, 0));

        assert!(weight < 1e-6);
    }

    #[test]
    fn normal_discontinuity_stops_filter() {
        let center = tap(0.5, 10.0);

        let other = AtrousTap {
            normal: vec3(1.0, 0.0, 0.0),
            ..center
        };

        assert_eq!(0.0, filter(center).weight(&other, ivec2(1, 0)));
    }

    #[test]
    fn sky_is_ignored() {
        let center = tap(0.5, 10.0);

        assert_eq!(0.0, filter(center).weight(&tap(0.5, 0.0), ivec2(1, 0)));
    }

    #[test]
    fn variance_uses_squared_weights() {
        let mut acc = AtrousAccumulator::default();

        acc.add(&tap(1.0, 1.0), 0.5);
        acc.add(&tap(0.0, 1.0), 0.5);

        let (value, variance) = acc.finish();

        assert_relative_eq!(0.5, value);
        assert_relative_eq!(0.05, variance);
    }

    #[test]
    fn fully_shadowed_neighbourhood_stays_shadowed() {
        let center = AtrousTap {
            variance: 0.0,
            ..tap(0.0, 10.0)
        };

        let filter = filter(center);
        let mut acc = AtrousAccumulator::default();

        for y in -2..=2 {
            for x in -2..=2 {
                let offset = ivec2(x, y) * 8;
                let weight = filter.weight(&center, offset)
                    * atrous_kernel(ivec2(x, y));

                acc.add(&center, weight);
            }
        }

        assert_eq!((0.0, 0.0), acc.finish());
    }
}
