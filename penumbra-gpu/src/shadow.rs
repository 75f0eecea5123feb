use glam::{ivec2, vec4, IVec2, Vec4, Vec4Swizzles};

use crate::{Moments, TemporalBlend, MAX_HISTORY_LENGTH};

/// History length below which variance estimated from the temporal moments
/// is unreliable and gets replaced with a spatial estimate.
pub const SPATIAL_VARIANCE_THRESHOLD: f32 = 4.0;

/// Temporally accumulated shadow of a single pixel.
#[derive(Clone, Copy, Default)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct ShadowSample {
    pub visibility: f32,
    pub variance: f32,
    pub moments: Moments,
    pub history_length: f32,
}

impl ShadowSample {
    /// Returns a sample for tiles that are lit (or occluded) as a whole;
    /// those skip the filters, so there's no variance to carry.
    pub fn uniform(visibility: f32) -> Self {
        Self {
            visibility,
            variance: 0.0,
            moments: Moments::new(visibility),
            history_length: 1.0,
        }
    }

    /// Returns `[visibility+variance, moments+history length]`.
    pub fn pack(self) -> [Vec4; 2] {
        [
            vec4(self.visibility, self.variance, 0.0, 0.0),
            self.moments.pack().extend(self.history_length).extend(0.0),
        ]
    }

    pub fn unpack([d0, d1]: [Vec4; 2]) -> Self {
        Self {
            visibility: d0.x,
            variance: d0.y,
            moments: Moments::unpack(d1.xy()),
            history_length: d1.z,
        }
    }
}

#[derive(Clone, Copy)]
pub struct ShadowTemporal {
    pub alpha: f32,
    pub moments_alpha: f32,
}

impl ShadowTemporal {
    /// Accumulates the current (binary) visibility into reprojected history;
    /// `history.history_length` is zero when history got rejected.
    pub fn resolve(
        self,
        visibility: f32,
        history: ShadowSample,
        spatial_variance: f32,
    ) -> ShadowSample {
        let blend = TemporalBlend::new(self.alpha, history.history_length);

        let moments_alpha = self.moments_alpha.max(
            1.0 / (history.history_length.clamp(0.0, MAX_HISTORY_LENGTH)
                + 1.0),
        );

        let moments = history
            .moments
            .blend(Moments::new(visibility), moments_alpha);

        let variance = if blend.history_length < SPATIAL_VARIANCE_THRESHOLD {
            spatial_variance
        } else {
            moments.variance()
        };

        ShadowSample {
            visibility: blend.blend(history.visibility, visibility),
            variance,
            moments,
            history_length: blend.history_length,
        }
    }
}

/// Estimates variance of the visibility in the 3x3 neighbourhood of a pixel;
/// `visibility` returns `None` for taps outside of the image.
pub fn spatial_variance(visibility: impl Fn(IVec2) -> Option<f32>) -> f32 {
    let mut m1 = 0.0;
    let mut m2 = 0.0;
    let mut count = 0.0;
    let mut y = -1;

    while y <= 1 {
        let mut x = -1;

        while x <= 1 {
            if let Some(value) = visibility(ivec2(x, y)) {
                m1 += value;
                m2 += value * value;
                count += 1.0;
            }

            x += 1;
        }

        y += 1;
    }

    if count == 0.0 {
        return 0.0;
    }

    Moments {
        m1: m1 / count,
        m2: m2 / count,
    }
    .variance()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    const TEMPORAL: ShadowTemporal = ShadowTemporal {
        alpha: 0.01,
        moments_alpha: 0.2,
    };

    #[test]
    fn rejected_history_is_replaced() {
        let history = ShadowSample {
            visibility: 0.0,
            variance: 0.1,
            moments: Moments { m1: 0.0, m2: 0.0 },
            history_length: 0.0,
        };

        let sample = TEMPORAL.resolve(1.0, history, 0.25);

        assert_eq!(1.0, sample.visibility);
        assert_eq!(1.0, sample.history_length);
        assert_eq!(0.25, sample.variance);
        assert_eq!(Moments::new(1.0), sample.moments);
    }

    #[test]
    fn long_history_uses_temporal_variance() {
        let history = ShadowSample {
            visibility: 0.5,
            variance: 0.0,
            moments: Moments { m1: 0.5, m2: 0.5 },
            history_length: 10.0,
        };

        let sample = TEMPORAL.resolve(1.0, history, 0.0);

        assert_eq!(11.0, sample.history_length);
        assert_relative_eq!(0.6, sample.moments.m1);
        assert_relative_eq!(0.6, sample.moments.m2);
        assert_relative_eq!(0.24, sample.variance, epsilon = 1e-6);
        assert!(sample.visibility > 0.5);
        assert!(sample.visibility < 0.6);
    }

    #[test]
    fn uniform_tiles_carry_no_variance() {
        let lit = ShadowSample::uniform(1.0);
        let shadowed = ShadowSample::uniform(0.0);

        assert_eq!(1.0, lit.visibility);
        assert_eq!(0.0, lit.variance);
        assert_eq!(0.0, shadowed.visibility);
        assert_eq!(0.0, shadowed.moments.variance());
        assert_eq!(lit, ShadowSample::unpack(lit.pack()));
    }

    #[test]
    fn spatial_variance_of_checkerboard() {
        let checkerboard =
            |pos: IVec2| Some(((pos.x + pos.y).rem_euclid(2)) as f32);

        // 4 ones out of 9 taps
        let mean = 4.0 / 9.0;

        assert_relative_eq!(
            mean - mean * mean,
            spatial_variance(checkerboard),
            epsilon = 1e-6
        );

        assert_eq!(0.0, spatial_variance(|_| Some(1.0)));
        assert_eq!(0.0, spatial_variance(|_| None));
    }
}
