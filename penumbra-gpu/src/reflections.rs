use glam::{vec2, Vec2, Vec3};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::{F32Ext, GOLDEN_ANGLE, PENUMBRA_EPSILON};

/// Surfaces smoother than this are treated as perfect mirrors: their
/// reflections are neither reconstructed from neighbours nor blurred.
pub const MIRROR_ROUGHNESS: f32 = 0.05;

/// Hit distance stored for rays that escaped into the environment; fits
/// `f16`.
pub const MISS_DISTANCE: f32 = 10000.0;

/// Largest radius of the reconstruction kernel, in half-resolution pixels.
pub const MAX_RECONSTRUCTION_RADIUS: f32 = 4.0;

pub fn is_mirror(roughness: f32) -> bool {
    roughness < MIRROR_ROUGHNESS
}

/// Returns how many neighbours the reconstruction gathers for a surface of
/// given roughness.
pub fn reconstruction_samples(roughness: f32) -> u32 {
    if roughness < 0.25 {
        8
    } else {
        16
    }
}

/// Returns the radius of the reconstruction kernel; rougher surfaces and
/// farther hits spread the reflection wider.
pub fn reconstruction_radius(
    roughness: f32,
    hit_distance: f32,
    depth: f32,
) -> f32 {
    let spread = (hit_distance / (hit_distance + depth).max(PENUMBRA_EPSILON))
        .saturate();

    1.0 + (MAX_RECONSTRUCTION_RADIUS - 1.0) * roughness.sqrt() * spread
}

/// Returns the offset of `i`-th (out of `count`) reconstruction sample,
/// distributed on a golden-angle spiral rotated by `rotation`.
pub fn reconstruction_offset(
    i: u32,
    count: u32,
    rotation: f32,
    radius: f32,
) -> Vec2 {
    let r = ((i as f32 + 0.5) / count as f32).sqrt() * radius;
    let angle = i as f32 * GOLDEN_ANGLE + rotation;

    vec2(angle.cos(), angle.sin()) * r
}

/// Ratio estimator combining neighbouring rays: `Σ Lᵢ·BRDFᵢ / Σ BRDFᵢ`,
/// where `BRDFᵢ` is the center pixel's BRDF evaluated for the neighbour's
/// ray; the noise of the BRDF cancels out in the ratio.
#[derive(Clone, Copy, Default)]
pub struct RatioEstimator {
    numerator: Vec3,
    denominator: f32,
}

impl RatioEstimator {
    pub fn add(&mut self, radiance: Vec3, brdf: f32) {
        self.numerator += radiance * brdf;
        self.denominator += brdf;
    }

    pub fn is_empty(&self) -> bool {
        self.denominator <= PENUMBRA_EPSILON
    }

    pub fn finish(self, fallback: Vec3) -> Vec3 {
        if self.is_empty() {
            fallback
        } else {
            self.numerator / self.denominator
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::vec3;

    use super::*;

    #[test]
    fn estimator_of_uniform_radiance() {
        let mut estimator = RatioEstimator::default();

        estimator.add(Vec3::splat(0.5), 0.1);
        estimator.add(Vec3::splat(0.5), 3.0);
        estimator.add(Vec3::splat(0.5), 0.7);

        assert_relative_eq!(
            0.5,
            estimator.finish(Vec3::ZERO).x,
            epsilon = 1e-6
        );
    }

    #[test]
    fn estimator_favours_brdf() {
        let mut estimator = RatioEstimator::default();

        estimator.add(vec3(1.0, 0.0, 0.0), 9.0);
        estimator.add(vec3(0.0, 1.0, 0.0), 1.0);

        let actual = estimator.finish(Vec3::ZERO);

        assert_relative_eq!(0.9, actual.x, epsilon = 1e-6);
        assert_relative_eq!(0.1, actual.y, epsilon = 1e-6);
    }

    #[test]
    fn empty_estimator() {
        assert_eq!(Vec3::ONE, RatioEstimator::default().finish(Vec3::ONE));
    }

    #[test]
    fn radius() {
        assert_relative_eq!(1.0, reconstruction_radius(0.0, 5.0, 5.0));

        assert!(
            reconstruction_radius(1.0, 100.0, 1.0)
                > reconstruction_radius(1.0, 1.0, 100.0)
        );

        assert!(
            reconstruction_radius(1.0, MISS_DISTANCE, 1.0)
                <= MAX_RECONSTRUCTION_RADIUS
        );
    }

    #[test]
    fn offsets_stay_inside_radius() {
        for count in [8, 16] {
            for i in 0..count {
                let offset = reconstruction_offset(i, count, 1.3, 3.0);

                assert!(offset.length() <= 3.0 + 1e-5);
            }
        }
    }

    #[test]
    fn mirrors() {
        assert!(is_mirror(0.0));
        assert!(!is_mirror(0.5));
    }
}
