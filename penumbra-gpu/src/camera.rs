use bytemuck::{Pod, Zeroable};
use glam::{vec2, Mat4, UVec2, Vec2, Vec3, Vec4, Vec4Swizzles};

use crate::{Light, Ray};

/// Per-frame uniform shared by every pass.
#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct Camera {
    pub view_inverse: Mat4,
    pub proj_inverse: Mat4,
    pub view_proj_inverse: Mat4,
    pub prev_view_proj: Mat4,
    pub view_proj: Mat4,

    /// x - position x
    /// y - position y
    /// z - position z
    /// w - (as u32) whether ambient occlusion is enabled
    pub position: Vec4,

    /// xy - current jitter (in NDC units)
    /// zw - previous jitter (in NDC units)
    pub jitter: Vec4,

    /// xy - screen size (in pixels)
    /// zw - reciprocal of the screen size
    pub screen: Vec4,

    pub light: Light,
}

impl Camera {
    pub fn origin(&self) -> Vec3 {
        self.position.xyz()
    }

    pub fn is_ao_enabled(&self) -> bool {
        self.position.w.to_bits() == 1
    }

    pub fn screen_size(&self) -> UVec2 {
        self.screen.xy().as_uvec2()
    }

    pub fn jitter(&self) -> Vec2 {
        self.jitter.xy()
    }

    /// Given a point in world-coordinates, returns it in clip-coordinates.
    pub fn world_to_clip(&self, pos: Vec3) -> Vec4 {
        self.view_proj * pos.extend(1.0)
    }

    /// Given a point in world-coordinates, returns where it was on the
    /// previous frame, in uv-coordinates (`<0.0, 1.0>` for visible points).
    pub fn world_to_prev_uv(&self, pos: Vec3) -> Vec2 {
        clip_to_uv(self.prev_view_proj * pos.extend(1.0))
    }

    /// Given a point in world-coordinates, returns it in uv-coordinates.
    pub fn world_to_uv(&self, pos: Vec3) -> Vec2 {
        clip_to_uv(self.world_to_clip(pos))
    }

    /// Returns the view-space depth (distance along the view axis) of given
    /// point.
    pub fn linear_depth(&self, pos: Vec3) -> f32 {
        self.world_to_clip(pos).w
    }

    /// Casts a ray from camera's position through the center of given pixel
    /// of an image sized `size`.
    pub fn ray(&self, pixel: Vec2, size: UVec2) -> Ray {
        let ndc = uv_to_ndc((pixel + 0.5) / size.as_vec2());
        let far = self.view_proj_inverse.project_point3(ndc.extend(1.0));
        let origin = self.origin();

        Ray::new(origin, (far - origin).normalize())
    }

    /// Returns the angle covered by a single pixel; used to estimate depth
    /// derivatives without rasterization.
    pub fn pixel_angle(&self) -> f32 {
        let p = self.proj_inverse.project_point3(Vec3::new(0.0, 1.0, 1.0));
        let tan_half_fov = (p.y / p.z).abs();

        2.0 * tan_half_fov * self.screen.w
    }
}

pub fn clip_to_uv(clip: Vec4) -> Vec2 {
    let ndc = clip.xy() / clip.w;

    vec2(ndc.x, -ndc.y) * 0.5 + 0.5
}

pub fn uv_to_ndc(uv: Vec2) -> Vec2 {
    let ndc = uv * 2.0 - 1.0;

    vec2(ndc.x, -ndc.y)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{uvec2, vec3, vec4};

    use super::*;

    fn camera() -> Camera {
        let view = Mat4::look_at_rh(vec3(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);

        let proj = Mat4::perspective_rh(
            core::f32::consts::FRAC_PI_2,
            1.0,
            0.1,
            100.0,
        );

        let view_proj = proj * view;

        Camera {
            view_inverse: view.inverse(),
            proj_inverse: proj.inverse(),
            view_proj_inverse: view_proj.inverse(),
            prev_view_proj: view_proj,
            view_proj,
            position: vec4(0.0, 0.0, 5.0, 0.0),
            screen: vec4(100.0, 100.0, 0.01, 0.01),
            ..Default::default()
        }
    }

    #[test]
    fn world_to_uv() {
        let uv = camera().world_to_uv(Vec3::ZERO);

        assert_relative_eq!(0.5, uv.x);
        assert_relative_eq!(0.5, uv.y);
    }

    #[test]
    fn up_is_top() {
        let uv = camera().world_to_uv(vec3(0.0, 1.0, 0.0));

        assert!(uv.y < 0.5);
    }

    #[test]
    fn linear_depth() {
        assert_relative_eq!(
            5.0,
            camera().linear_depth(Vec3::ZERO),
            epsilon = 1e-4
        );
    }

    #[test]
    fn ray_through_center() {
        let ray = camera().ray(vec2(49.5, 49.5), uvec2(100, 100));

        assert_relative_eq!(-1.0, ray.direction().z, epsilon = 1e-4);
    }

    #[test]
    fn pixel_angle() {
        // fov = 90 deg, so tan(fov / 2) = 1.0 and the screen spans 2.0 units
        assert_relative_eq!(0.02, camera().pixel_angle(), epsilon = 1e-4);
    }

    #[test]
    fn static_camera_reprojects_onto_itself() {
        let camera = camera();
        let point = vec3(0.3, -0.2, 1.0);

        let uv = camera.world_to_uv(point);
        let prev_uv = camera.world_to_prev_uv(point);

        assert_relative_eq!(uv.x, prev_uv.x);
        assert_relative_eq!(uv.y, prev_uv.y);
    }
}
