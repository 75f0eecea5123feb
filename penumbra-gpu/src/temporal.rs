use glam::{vec2, vec3, Vec2, Vec3};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::{lerp, Vec3Ext, PENUMBRA_EPSILON};

/// Maximum number of frames a temporal accumulator remembers.
pub const MAX_HISTORY_LENGTH: f32 = 32.0;

/// Blending weights for a single step of temporal accumulation.
#[derive(Clone, Copy)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct TemporalBlend {
    /// Weight of the current sample
    pub alpha: f32,

    /// History length after this step
    pub history_length: f32,
}

impl TemporalBlend {
    /// Prepares blending for a history of given length; rejected (or
    /// cleared) history has length zero, which makes the current sample win
    /// completely.
    pub fn new(alpha: f32, history_length: f32) -> Self {
        let history_length = history_length.clamp(0.0, MAX_HISTORY_LENGTH);

        Self {
            alpha: alpha.max(1.0 / (history_length + 1.0)),
            history_length: (history_length + 1.0).min(MAX_HISTORY_LENGTH),
        }
    }

    pub fn blend(self, history: f32, current: f32) -> f32 {
        lerp(history, current, self.alpha)
    }

    pub fn blend_vec3(self, history: Vec3, current: Vec3) -> Vec3 {
        lerp(history, current, self.alpha)
    }
}

/// First and second raw moment of a signal's luminance.
#[derive(Clone, Copy, Default)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct Moments {
    pub m1: f32,
    pub m2: f32,
}

impl Moments {
    pub fn new(value: f32) -> Self {
        Self {
            m1: value,
            m2: value * value,
        }
    }

    pub fn pack(self) -> Vec2 {
        vec2(self.m1, self.m2)
    }

    pub fn unpack(d0: Vec2) -> Self {
        Self { m1: d0.x, m2: d0.y }
    }

    /// Blends this (history) moments towards `current`.
    pub fn blend(self, current: Self, alpha: f32) -> Self {
        Self {
            m1: lerp(self.m1, current.m1, alpha),
            m2: lerp(self.m2, current.m2, alpha),
        }
    }

    pub fn variance(self) -> f32 {
        (self.m2 - self.m1 * self.m1).max(0.0)
    }
}

/// Statistics of a pixel's neighbourhood, used to clip history into the
/// range of colors currently visible around the pixel.
#[derive(Clone, Copy, Default)]
pub struct Neighbourhood {
    m1: Vec3,
    m2: Vec3,
    count: f32,
}

impl Neighbourhood {
    pub fn add(&mut self, sample: Vec3) {
        self.m1 += sample;
        self.m2 += sample * sample;
        self.count += 1.0;
    }

    pub fn mean(&self) -> Vec3 {
        self.m1 / self.count.max(1.0)
    }

    pub fn std_dev(&self) -> Vec3 {
        let mean = self.mean();
        let var = self.m2 / self.count.max(1.0) - mean * mean;
        let var = var.max(Vec3::ZERO);

        vec3(var.x.sqrt(), var.y.sqrt(), var.z.sqrt())
    }

    /// Returns the box spanning `mean ± scale * std_dev`.
    pub fn aabb(&self, scale: f32) -> (Vec3, Vec3) {
        let mean = self.mean();
        let extent = self.std_dev() * scale;

        (mean - extent, mean + extent)
    }

    pub fn clip(&self, history: Vec3, scale: f32) -> Vec3 {
        let (aabb_min, aabb_max) = self.aabb(scale);

        history.clip(aabb_min, aabb_max)
    }
}

/// Compresses a HDR color so that outliers don't dominate the filters.
pub fn tonemap(color: Vec3) -> Vec3 {
    color / (1.0 + color.luma())
}

/// Inverse of `tonemap()`.
pub fn untonemap(color: Vec3) -> Vec3 {
    color / (1.0 - color.luma()).max(PENUMBRA_EPSILON)
}

/// Generic temporal accumulation of a color signal.
#[derive(Clone, Copy)]
pub struct TemporalResolve {
    pub alpha: f32,

    /// Scale of the clipping box, in standard deviations; non-positive
    /// disables clipping
    pub neighbourhood_scale: f32,

    pub tonemap: bool,
}

impl TemporalResolve {
    /// Blends `history` (of given length, zero if rejected) with the current
    /// sample, which is the center of the 3x3 `samples`.
    ///
    /// Returns the new color and history length.
    pub fn resolve(
        self,
        samples: [Vec3; 9],
        history: Vec3,
        history_length: f32,
    ) -> (Vec3, f32) {
        let mut neighbourhood = Neighbourhood::default();
        let mut i = 0;

        while i < 9 {
            neighbourhood.add(self.encode(samples[i]));
            i += 1;
        }

        let current = self.encode(samples[4]);
        let mut history = self.encode(history);

        if self.neighbourhood_scale > 0.0 {
            history = neighbourhood.clip(history, self.neighbourhood_scale);
        }

        let blend = TemporalBlend::new(self.alpha, history_length);
        let color = self.decode(blend.blend_vec3(history, current));

        (color, blend.history_length)
    }

    fn encode(self, color: Vec3) -> Vec3 {
        if self.tonemap {
            tonemap(color)
        } else {
            color
        }
    }

    fn decode(self, color: Vec3) -> Vec3 {
        if self.tonemap {
            untonemap(color)
        } else {
            color
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn first_frame_returns_current_sample() {
        let blend = TemporalBlend::new(0.01, 0.0);

        assert_eq!(1.0, blend.alpha);
        assert_eq!(1.0, blend.history_length);
        assert_relative_eq!(0.7, blend.blend(0.2, 0.7));
    }

    #[test]
    fn history_length_is_capped() {
        let mut length = 0.0;

        for _ in 0..100 {
            length = TemporalBlend::new(0.01, length).history_length;
        }

        assert_eq!(MAX_HISTORY_LENGTH, length);
        assert_relative_eq!(1.0 / 33.0, TemporalBlend::new(0.01, length).alpha);
    }

    #[test]
    fn alpha_floor() {
        assert_eq!(0.2, TemporalBlend::new(0.2, 32.0).alpha);
    }

    #[test]
    fn accumulation_averages_early_frames() {
        // with the 1 / (n + 1) schedule, the first frames are averaged evenly
        let samples = [1.0, 0.0, 1.0, 0.0];
        let mut value = 0.0;
        let mut length = 0.0;

        for sample in samples {
            let blend = TemporalBlend::new(0.01, length);

            value = blend.blend(value, sample);
            length = blend.history_length;
        }

        assert_relative_eq!(0.5, value);
    }

    #[test]
    fn moments() {
        let moments = Moments::new(1.0).blend(Moments::new(0.0), 0.5);

        assert_relative_eq!(0.5, moments.m1);
        assert_relative_eq!(0.5, moments.m2);
        assert_relative_eq!(0.25, moments.variance());
    }

    #[test]
    fn moments_of_constant_signal() {
        assert_eq!(0.0, Moments::new(0.3).variance());
    }

    #[test]
    fn tonemap_round_trip() {
        let color = vec3(4.0, 2.0, 1.0);
        let actual = untonemap(tonemap(color));

        assert_relative_eq!(color.x, actual.x, epsilon = 1e-4);
        assert_relative_eq!(color.y, actual.y, epsilon = 1e-4);
        assert_relative_eq!(color.z, actual.z, epsilon = 1e-4);
    }

    #[test]
    fn resolve_clips_history_into_neighbourhood() {
        let resolve = TemporalResolve {
            alpha: 0.01,
            neighbourhood_scale: 3.5,
            tonemap: false,
        };

        let samples = [
            vec3(0.1, 0.2, 0.3),
            vec3(0.2, 0.2, 0.2),
            vec3(0.15, 0.25, 0.3),
            vec3(0.3, 0.1, 0.2),
            vec3(0.2, 0.3, 0.1),
            vec3(0.1, 0.1, 0.1),
            vec3(0.25, 0.2, 0.15),
            vec3(0.2, 0.15, 0.3),
            vec3(0.3, 0.3, 0.3),
        ];

        let mut neighbourhood = Neighbourhood::default();

        for sample in samples {
            neighbourhood.add(sample);
        }

        let (aabb_min, aabb_max) = neighbourhood.aabb(3.5);

        for history in [Vec3::splat(10.0), Vec3::ZERO, vec3(-4.0, 0.2, 9.0)] {
            let (color, length) = resolve.resolve(samples, history, 20.0);

            assert_eq!(21.0, length);

            assert!(color.cmpge(aabb_min - 1e-5).all());
            assert!(color.cmple(aabb_max + 1e-5).all());
        }
    }

    #[test]
    fn resolve_without_history() {
        let resolve = TemporalResolve {
            alpha: 0.01,
            neighbourhood_scale: 3.5,
            tonemap: true,
        };

        let (color, length) =
            resolve.resolve([vec3(2.0, 1.0, 0.5); 9], Vec3::splat(100.0), 0.0);

        assert_eq!(1.0, length);
        assert_relative_eq!(2.0, color.x, epsilon = 1e-4);
        assert_relative_eq!(1.0, color.y, epsilon = 1e-4);
        assert_relative_eq!(0.5, color.z, epsilon = 1e-4);
    }
}
