use glam::{UVec2, Vec2, Vec3, Vec4};

use crate::{BilinearFilter, Camera, GBufferEntry, LinearZ};

/// Where a pixel's surface was visible on the previous frame.
#[derive(Clone, Copy, Default)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct Reprojection {
    /// Continuous position in the history image, in pixels
    pub prev_pos: Vec2,

    /// Whether the surface was on screen at all
    pub is_valid: bool,
}

impl Reprojection {
    /// Minimum dot product between current and previous normal for history
    /// to be accepted.
    pub const NORMAL_THRESHOLD: f32 = 0.9;

    /// Maximum difference between expected and stored previous depth, in
    /// units of the depth slope.
    pub const DEPTH_THRESHOLD: f32 = 10.0;

    /// Reprojects given surface into the history image of size `size`.
    pub fn new(camera: &Camera, entry: &GBufferEntry, size: UVec2) -> Self {
        if entry.is_none() {
            return Self::default();
        }

        let prev_uv = camera.world_to_prev_uv(entry.position);

        let is_valid = prev_uv.x >= 0.0
            && prev_uv.y >= 0.0
            && prev_uv.x <= 1.0
            && prev_uv.y <= 1.0;

        Self {
            prev_pos: prev_uv * size.as_vec2(),
            is_valid,
        }
    }

    /// Returns whether a surface stored in the history G-Buffer is the same
    /// surface as the current one.
    pub fn accepts(
        curr_normal: Vec3,
        curr: LinearZ,
        prev_normal: Vec3,
        prev: LinearZ,
    ) -> bool {
        if !prev.is_some() || curr.object_id != prev.object_id {
            return false;
        }

        if curr_normal.dot(prev_normal) < Self::NORMAL_THRESHOLD {
            return false;
        }

        let depth_diff = (curr.prev_depth - prev.depth).abs();
        let depth_slope = curr.slope.max(prev.slope) + 0.01;

        depth_diff / depth_slope <= Self::DEPTH_THRESHOLD
    }

    /// Fetches history through a bilinear filter, rejecting taps that belong
    /// to a different surface.
    ///
    /// Returns the history and the sum of weights of accepted taps; zero
    /// means the history has been rejected completely.
    pub fn fetch(
        self,
        curr: &GBufferEntry,
        size: UVec2,
        prev_surface: impl Fn(UVec2) -> (Vec3, LinearZ),
        history: impl Fn(UVec2) -> Vec4,
    ) -> (Vec4, f32) {
        if !self.is_valid {
            return (Vec4::ZERO, 0.0);
        }

        BilinearFilter::gather(self.prev_pos, size, |pos| {
            let (prev_normal, prev_linear_z) = prev_surface(pos);

            let is_valid = Self::accepts(
                curr.normal,
                curr.linear_z,
                prev_normal,
                prev_linear_z,
            );

            (history(pos), is_valid)
        })
        .eval()
    }
}

#[cfg(test)]
mod tests {
    use glam::{uvec2, vec2, vec3};

    use super::*;

    fn surface(object_id: u32, depth: f32) -> LinearZ {
        LinearZ {
            depth,
            slope: 0.1,
            prev_depth: depth,
            object_id,
        }
    }

    #[test]
    fn accepts_same_surface() {
        let n = vec3(0.0, 1.0, 0.0);

        assert!(Reprojection::accepts(n, surface(1, 5.0), n, surface(1, 5.0)));
    }

    #[test]
    fn rejects_different_object() {
        let n = vec3(0.0, 1.0, 0.0);

        assert!(!Reprojection::accepts(
            n,
            surface(1, 5.0),
            n,
            surface(2, 5.0)
        ));
    }

    #[test]
    fn rejects_different_normal() {
        assert!(!Reprojection::accepts(
            vec3(0.0, 1.0, 0.0),
            surface(1, 5.0),
            vec3(1.0, 0.0, 0.0),
            surface(1, 5.0)
        ));
    }

    #[test]
    fn rejects_depth_discontinuity() {
        let n = vec3(0.0, 1.0, 0.0);

        assert!(!Reprojection::accepts(
            n,
            surface(1, 5.0),
            n,
            surface(1, 8.0)
        ));
    }

    #[test]
    fn rejects_sky() {
        let n = vec3(0.0, 1.0, 0.0);

        assert!(!Reprojection::accepts(
            n,
            surface(0, 5.0),
            n,
            LinearZ::default()
        ));
    }

    #[test]
    fn fetch_with_mismatching_object() {
        let curr = GBufferEntry {
            normal: vec3(0.0, 1.0, 0.0),
            linear_z: surface(1, 5.0),
            ..Default::default()
        };

        let reprojection = Reprojection {
            prev_pos: vec2(2.0, 2.0),
            is_valid: true,
        };

        let (_, weight) = reprojection.fetch(
            &curr,
            uvec2(4, 4),
            |_| (vec3(0.0, 1.0, 0.0), surface(2, 5.0)),
            |_| Vec4::ONE,
        );

        assert_eq!(0.0, weight);
    }

    #[test]
    fn fetch_with_matching_object() {
        let curr = GBufferEntry {
            normal: vec3(0.0, 1.0, 0.0),
            linear_z: surface(1, 5.0),
            ..Default::default()
        };

        let reprojection = Reprojection {
            prev_pos: vec2(2.0, 2.0),
            is_valid: true,
        };

        let (value, weight) = reprojection.fetch(
            &curr,
            uvec2(4, 4),
            |_| (vec3(0.0, 1.0, 0.0), surface(1, 5.0)),
            |_| Vec4::splat(0.25),
        );

        assert_eq!(1.0, weight);
        assert_eq!(Vec4::splat(0.25), value);
    }
}
