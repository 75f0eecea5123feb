use glam::Vec3;

use crate::{lerp, rgb_to_ycocg, ycocg_to_rgb, F32Ext, Vec3Ext};

/// Temporal anti-aliasing resolve.
#[derive(Clone, Copy)]
pub struct Taa {
    /// History weight for quickly moving pixels
    pub feedback_min: f32,

    /// History weight for static pixels
    pub feedback_max: f32,

    pub sharpen: bool,
}

impl Taa {
    /// Velocity (in pixels per frame) at which the feedback drops to
    /// `feedback_min`.
    pub const MAX_VELOCITY: f32 = 2.0;

    pub const SHARPEN_STRENGTH: f32 = 0.25;

    pub fn feedback(&self, velocity: f32) -> f32 {
        lerp(
            self.feedback_max,
            self.feedback_min,
            (velocity / Self::MAX_VELOCITY).saturate(),
        )
    }

    /// Resolves the current pixel, being the center of the 3x3 `samples`,
    /// against `history` that has already been reprojected.
    pub fn resolve(
        &self,
        samples: [Vec3; 9],
        history: Vec3,
        velocity: f32,
    ) -> Vec3 {
        let current = if self.sharpen {
            sharpen(samples)
        } else {
            samples[4]
        };

        let mut aabb_min = Vec3::splat(f32::MAX);
        let mut aabb_max = Vec3::splat(f32::MIN);
        let mut i = 0;

        while i < 9 {
            let sample = rgb_to_ycocg(samples[i]);

            aabb_min = aabb_min.min(sample);
            aabb_max = aabb_max.max(sample);
            i += 1;
        }

        let history =
            ycocg_to_rgb(rgb_to_ycocg(history).clip(aabb_min, aabb_max));

        lerp(current, history, self.feedback(velocity))
    }
}

/// Sharpens the center of the 3x3 `samples` with an unsharp mask over its
/// direct neighbours.
pub fn sharpen(samples: [Vec3; 9]) -> Vec3 {
    let center = samples[4];
    let blurred = (samples[1] + samples[3] + samples[5] + samples[7]) * 0.25;

    (center + (center - blurred) * Taa::SHARPEN_STRENGTH).max(Vec3::ZERO)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::vec3;

    use super::*;

    fn taa() -> Taa {
        Taa {
            feedback_min: 0.88,
            feedback_max: 0.97,
            sharpen: false,
        }
    }

    #[test]
    fn feedback() {
        assert_relative_eq!(0.97, taa().feedback(0.0));
        assert_relative_eq!(0.88, taa().feedback(10.0));
        assert!(taa().feedback(1.0) < 0.97);
    }

    #[test]
    fn converged_history_is_kept() {
        let color = vec3(0.2, 0.4, 0.6);
        let actual = taa().resolve([color; 9], color, 0.0);

        assert_relative_eq!(color.x, actual.x, epsilon = 1e-5);
        assert_relative_eq!(color.y, actual.y, epsilon = 1e-5);
        assert_relative_eq!(color.z, actual.z, epsilon = 1e-5);
    }

    #[test]
    fn ghosting_history_is_clipped() {
        let color = vec3(0.2, 0.4, 0.6);
        let actual = taa().resolve([color; 9], Vec3::splat(10.0), 0.0);

        assert!((actual - color).length() < 1e-3);
    }

    #[test]
    fn sharpen_flat_area() {
        let color = vec3(0.2, 0.4, 0.6);

        let actual = sharpen([color; 9]);

        assert!((actual - color).abs().max_element() < 1e-6);
    }

    #[test]
    fn sharpen_increases_contrast() {
        let mut samples = [Vec3::splat(0.5); 9];

        samples[4] = Vec3::splat(0.6);

        assert!(sharpen(samples).x > 0.6);
    }
}
