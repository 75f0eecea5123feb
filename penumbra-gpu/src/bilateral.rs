use glam::{IVec2, Vec3, Vec4};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::{lerp, Vec3Ext, PENUMBRA_EPSILON};

/// Maximum radius of the bilateral blur, in pixels.
pub const MAX_BLUR_RADIUS: u32 = 7;

pub fn gaussian(distance_sqr: f32, sigma: f32) -> f32 {
    (-distance_sqr / (2.0 * sigma * sigma).max(PENUMBRA_EPSILON)).exp()
}

/// Returns how similar a tap's color is to the center's; colors are compared
/// by luminance, relative to their brightness.
pub fn color_weight(center: Vec3, tap: Vec3, phi_color: f32) -> f32 {
    if phi_color <= 0.0 {
        return 1.0;
    }

    let center = center.luma();
    let tap = tap.luma();
    let diff = (center - tap).abs() / (center + tap + PENUMBRA_EPSILON);

    (-diff * phi_color).exp()
}

/// Surface at a bilateral-filter tap.
#[derive(Clone, Copy, Default)]
pub struct BilateralTap {
    pub depth: f32,
    pub normal: Vec3,
    pub roughness: f32,
}

/// Edge-aware weights of a bilateral blur around one pixel.
#[derive(Clone, Copy)]
pub struct BilateralFilter {
    pub center: BilateralTap,

    /// Depth change per pixel at the center
    pub slope: f32,

    /// Standard deviation of the spatial kernel, in pixels
    pub sigma: f32,

    pub phi_normal: f32,
    pub depth_weight: bool,
    pub normal_weight: bool,
    pub roughness_weight: bool,
}

impl BilateralFilter {
    /// How quickly taps with different roughness get rejected.
    pub const ROUGHNESS_SHARPNESS: f32 = 16.0;

    /// Returns the spatial standard deviation matching a kernel radius.
    pub fn sigma_for_radius(radius: u32) -> f32 {
        (radius as f32 * 0.5).max(0.5)
    }

    /// Returns the spatial standard deviation (in pixels) for a surface of
    /// given roughness; `sigma_min` and `sigma_max` are relative to the
    /// image's height.
    pub fn sigma_for_roughness(
        roughness: f32,
        sigma_min: f32,
        sigma_max: f32,
        height: u32,
    ) -> f32 {
        lerp(sigma_min, sigma_max, roughness) * height as f32
    }

    pub fn weight(&self, tap: &BilateralTap, offset: IVec2) -> f32 {
        if tap.depth <= 0.0 {
            return 0.0;
        }

        let distance_sqr = offset.as_vec2().length_squared();
        let mut weight = gaussian(distance_sqr, self.sigma);

        if self.depth_weight {
            let distance = distance_sqr.sqrt();

            weight *= (-(self.center.depth - tap.depth).abs()
                / (self.slope * distance + PENUMBRA_EPSILON))
                .exp();
        }

        if self.normal_weight {
            weight *= self
                .center
                .normal
                .dot(tap.normal)
                .max(0.0)
                .powf(self.phi_normal);
        }

        if self.roughness_weight {
            weight *= (-(self.center.roughness - tap.roughness).abs()
                * Self::ROUGHNESS_SHARPNESS)
                .exp();
        }

        weight
    }
}

#[derive(Clone, Copy, Default)]
pub struct BilateralAccumulator {
    value: Vec4,
    weight: f32,
}

impl BilateralAccumulator {
    pub fn add(&mut self, value: Vec4, weight: f32) {
        self.value += value * weight;
        self.weight += weight;
    }

    /// Returns the filtered value, or `fallback` if no tap contributed.
    pub fn finish(self, fallback: Vec4) -> Vec4 {
        if self.weight <= PENUMBRA_EPSILON {
            fallback
        } else {
            self.value / self.weight
        }
    }
}

/// Direction of a separable blur pass.
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub enum BlurDirection {
    Horizontal,
    Vertical,
}

impl BlurDirection {
    pub fn from_u32(d0: u32) -> Self {
        if d0 == 0 {
            Self::Horizontal
        } else {
            Self::Vertical
        }
    }

    pub fn as_u32(self) -> u32 {
        match self {
            Self::Horizontal => 0,
            Self::Vertical => 1,
        }
    }

    pub fn offset(self, i: i32) -> IVec2 {
        match self {
            Self::Horizontal => IVec2::new(i, 0),
            Self::Vertical => IVec2::new(0, i),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{ivec2, vec3};

    use super::*;

    #[test]
    fn color_weight_rejects_fireflies() {
        let center = vec3(0.5, 0.5, 0.5);

        assert_relative_eq!(1.0, color_weight(center, center, 10.0));
        assert_relative_eq!(1.0, color_weight(center, Vec3::splat(50.0), 0.0));
        assert!(color_weight(center, Vec3::splat(50.0), 10.0) < 0.001);
    }

    fn filter() -> BilateralFilter {
        BilateralFilter {
            center: BilateralTap {
                depth: 10.0,
                normal: vec3(0.0, 1.0, 0.0),
                roughness: 0.5,
            },
            slope: 0.05,
            sigma: 2.0,
            phi_normal: 32.0,
            depth_weight: true,
            normal_weight: true,
            roughness_weight: true,
        }
    }

    #[test]
    fn weight_falls_off_with_distance() {
        let filter = filter();
        let w1 = filter.weight(&filter.center, ivec2(1, 0));
        let w2 = filter.weight(&filter.center, ivec2(3, 0));

        assert_relative_eq!(1.0, filter.weight(&filter.center, IVec2::ZERO));
        assert!(w1 > w2);
    }

    #[test]
    fn roughness_weight() {
        let filter = filter();

        let tap = BilateralTap {
            roughness: 0.9,
            ..filter.center
        };

        assert!(filter.weight(&tap, ivec2(1, 0)) < 0.01);

        let filter = BilateralFilter {
            roughness_weight: false,
            ..filter
        };

        assert!(filter.weight(&tap, ivec2(1, 0)) > 0.5);
    }

    #[test]
    fn depth_weight() {
        let filter = filter();

        let tap = BilateralTap {
            depth: 11.0,
            ..filter.center
        };

        assert!(filter.weight(&tap, ivec2(1, 0)) < 1e-6);
    }

    #[test]
    fn sigma_for_roughness() {
        assert_relative_eq!(
            1.0,
            BilateralFilter::sigma_for_roughness(0.0, 0.001, 0.01, 1000),
            epsilon = 1e-5
        );

        assert_relative_eq!(
            10.0,
            BilateralFilter::sigma_for_roughness(1.0, 0.001, 0.01, 1000),
            epsilon = 1e-5
        );
    }

    #[test]
    fn accumulator_fallback() {
        let acc = BilateralAccumulator::default();

        assert_eq!(Vec4::ONE, acc.finish(Vec4::ONE));
    }

    #[test]
    fn directions() {
        assert_eq!(ivec2(3, 0), BlurDirection::Horizontal.offset(3));
        assert_eq!(ivec2(0, -2), BlurDirection::Vertical.offset(-2));

        assert_eq!(
            BlurDirection::Vertical,
            BlurDirection::from_u32(BlurDirection::Vertical.as_u32())
        );
    }
}
