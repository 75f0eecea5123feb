use glam::{Mat4, UVec2, Vec2, Vec4Swizzles};

use crate::gpu;

/// Point of view of a renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    /// Size of the rendered image, in pixels
    pub size: UVec2,

    /// World-to-view transformation
    pub view: Mat4,

    /// View-to-clip transformation (right-handed, without any jitter; TAA
    /// applies its own)
    pub projection: Mat4,
}

impl Camera {
    pub fn new(size: UVec2, view: Mat4, projection: Mat4) -> Self {
        Self {
            size,
            view,
            projection,
        }
    }

    pub(crate) fn describe(&self) -> String {
        format!("size={}x{}", self.size.x, self.size.y)
    }

    /// Returns whether switching from `self` to `other` requires for the
    /// renderer's images to be reallocated.
    pub(crate) fn is_invalidated_by(&self, other: &Self) -> bool {
        self.size != other.size
    }

    /// Returns whether the camera has moved (or changed its projection);
    /// any such change restarts ground-truth accumulation.
    pub(crate) fn has_moved(&self, other: &Self) -> bool {
        self.view != other.view || self.projection != other.projection
    }

    pub(crate) fn view_proj(&self) -> Mat4 {
        self.projection * self.view
    }

    /// Serializes camera for the shaders.
    ///
    /// `prev` is what's been serialized on the previous frame; when missing
    /// (first frame), the camera reprojects onto itself.
    pub(crate) fn serialize(
        &self,
        prev: Option<&gpu::Camera>,
        light: gpu::Light,
        jitter: Vec2,
        is_ao_enabled: bool,
    ) -> gpu::Camera {
        let view_inverse = self.view.inverse();
        let view_proj = self.view_proj();
        let size = self.size.max(UVec2::ONE).as_vec2();

        let (prev_view_proj, prev_jitter) = match prev {
            Some(prev) => (prev.view_proj, prev.jitter.xy()),
            None => (view_proj, jitter),
        };

        gpu::Camera {
            view_inverse,
            proj_inverse: self.projection.inverse(),
            view_proj_inverse: view_proj.inverse(),
            prev_view_proj,
            view_proj,
            position: view_inverse
                .w_axis
                .xyz()
                .extend(f32::from_bits(is_ao_enabled as u32)),
            jitter: jitter.extend(prev_jitter.x).extend(prev_jitter.y),
            screen: size.extend(1.0 / size.x).extend(1.0 / size.y),
            light,
        }
    }
}

/// Returns the projection offset (in NDC) for given frame, cycling through
/// `samples` points of the Halton sequence; it's at most half a pixel in
/// each direction.
pub(crate) fn jitter(frame: u32, samples: u32, size: UVec2) -> Vec2 {
    gpu::halton_jitter(frame, samples) / size.max(UVec2::ONE).as_vec2()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{uvec2, vec2, vec3, Vec3};

    use super::*;

    fn camera() -> Camera {
        Camera::new(
            uvec2(320, 200),
            Mat4::look_at_rh(vec3(1.0, 2.0, 3.0), Vec3::ZERO, Vec3::Y),
            Mat4::perspective_rh(1.0, 1.6, 0.1, 100.0),
        )
    }

    #[test]
    fn invalidation() {
        let a = camera();

        let mut b = camera();
        b.view = Mat4::IDENTITY;

        let mut c = camera();
        c.size = uvec2(640, 400);

        assert!(!a.is_invalidated_by(&b));
        assert!(a.is_invalidated_by(&c));
        assert!(a.has_moved(&b));
        assert!(!a.has_moved(&c));
    }

    #[test]
    fn serialize_first_frame() {
        let camera = camera();
        let light = gpu::Light::default();
        let actual = camera.serialize(None, light, vec2(0.001, 0.0), true);

        assert_eq!(actual.view_proj, actual.prev_view_proj);
        assert!(actual.is_ao_enabled());
        assert_eq!(uvec2(320, 200), actual.screen_size());
        assert_relative_eq!(0.001, actual.jitter.z);
        assert_relative_eq!(1.0, actual.origin().x, epsilon = 1e-5);
        assert_relative_eq!(2.0, actual.origin().y, epsilon = 1e-5);
        assert_relative_eq!(3.0, actual.origin().z, epsilon = 1e-5);
    }

    #[test]
    fn serialize_next_frame() {
        let camera = camera();
        let light = gpu::Light::default();
        let prev = camera.serialize(None, light, vec2(0.5, 0.25), false);

        let mut moved = camera.clone();
        moved.view = Mat4::IDENTITY;

        let actual = moved.serialize(Some(&prev), light, Vec2::ZERO, false);

        assert_eq!(prev.view_proj, actual.prev_view_proj);
        assert_ne!(actual.view_proj, actual.prev_view_proj);
        assert_eq!(vec2(0.5, 0.25), actual.jitter.zw());
        assert!(!actual.is_ao_enabled());
    }

    #[test]
    fn jitter_is_sub_pixel() {
        let size = uvec2(320, 200);

        for frame in 0..16 {
            let jitter = jitter(frame, 16, size) * size.as_vec2();

            assert!(jitter.abs().max_element() <= 1.0);
        }
    }
}
