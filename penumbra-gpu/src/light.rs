use core::f32::consts::PI;

use bytemuck::{Pod, Zeroable};
use glam::{vec3, vec4, Vec2, Vec3, Vec4, Vec4Swizzles};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::{F32Ext, Vec3Ext};

/// The scene's active light.
#[repr(C)]
#[derive(Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct Light {
    /// x - direction x (the direction light travels in)
    /// y - direction y
    /// z - direction z
    /// w - intensity
    pub d0: Vec4,

    /// x - position x
    /// y - position y
    /// z - position z
    /// w - radius (for directional lights: angular radius, in radians)
    pub d1: Vec4,

    /// x - color r
    /// y - color g
    /// z - color b
    pub d2: Vec4,

    /// x - (as u32) light type, see `Light::TYPE_*`
    /// y - if it's a spot light: cosine of the outer cone angle
    /// z - if it's a spot light: cosine of the inner cone angle
    pub d3: Vec4,
}

impl Light {
    pub const TYPE_DIRECTIONAL: u32 = 0;
    pub const TYPE_POINT: u32 = 1;
    pub const TYPE_SPOT: u32 = 2;

    pub fn directional(
        direction: Vec3,
        color: Vec3,
        intensity: f32,
        angular_radius: f32,
    ) -> Self {
        Self {
            d0: direction.normalize().extend(intensity),
            d1: Vec3::ZERO.extend(angular_radius),
            d2: color.extend(0.0),
            d3: vec4(f32::from_bits(Self::TYPE_DIRECTIONAL), 0.0, 0.0, 0.0),
        }
    }

    pub fn point(
        position: Vec3,
        color: Vec3,
        intensity: f32,
        radius: f32,
    ) -> Self {
        Self {
            d0: Vec3::ZERO.extend(intensity),
            d1: position.extend(radius),
            d2: color.extend(0.0),
            d3: vec4(f32::from_bits(Self::TYPE_POINT), 0.0, 0.0, 0.0),
        }
    }

    pub fn spot(
        position: Vec3,
        direction: Vec3,
        color: Vec3,
        intensity: f32,
        radius: f32,
        inner_angle: f32,
        outer_angle: f32,
    ) -> Self {
        Self {
            d0: direction.normalize().extend(intensity),
            d1: position.extend(radius),
            d2: color.extend(0.0),
            d3: vec4(
                f32::from_bits(Self::TYPE_SPOT),
                outer_angle.cos(),
                inner_angle.min(outer_angle).cos(),
                0.0,
            ),
        }
    }

    pub fn kind(&self) -> u32 {
        self.d3.x.to_bits()
    }

    pub fn is_directional(&self) -> bool {
        self.kind() == Self::TYPE_DIRECTIONAL
    }

    pub fn direction(&self) -> Vec3 {
        self.d0.xyz()
    }

    pub fn intensity(&self) -> f32 {
        self.d0.w
    }

    pub fn position(&self) -> Vec3 {
        self.d1.xyz()
    }

    pub fn radius(&self) -> f32 {
        self.d1.w
    }

    pub fn color(&self) -> Vec3 {
        self.d2.xyz()
    }

    /// Returns the direction towards the light's center and the distance to
    /// it (`f32::MAX` for directional lights).
    pub fn to_light(&self, point: Vec3) -> (Vec3, f32) {
        if self.is_directional() {
            (-self.direction(), f32::MAX)
        } else {
            let delta = self.position() - point;

            (delta.normalize(), delta.length())
        }
    }

    /// Samples a direction towards the light's surface, for soft shadows;
    /// the cone of sampled directions grows with the light's radius.
    pub fn sample_direction(&self, point: Vec3, sample: Vec2) -> (Vec3, f32) {
        let (axis, distance) = self.to_light(point);

        if self.is_directional() {
            let cos_max = self.radius().cos();
            let cos_theta = 1.0 - sample.x * (1.0 - cos_max);
            let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
            let phi = 2.0 * PI * sample.y;

            let local =
                vec3(phi.cos() * sin_theta, phi.sin() * sin_theta, cos_theta);

            (axis.to_world(local), distance)
        } else {
            let (t, b) = axis.basis();
            let r = sample.x.sqrt() * self.radius();
            let phi = 2.0 * PI * sample.y;

            let target =
                self.position() + t * (r * phi.cos()) + b * (r * phi.sin());

            let delta = target - point;

            (delta.normalize(), delta.length())
        }
    }

    /// Returns radiance arriving at given point, ignoring visibility.
    pub fn radiance(&self, point: Vec3) -> Vec3 {
        let color = self.color() * self.intensity();

        if self.is_directional() {
            return color;
        }

        let (l, distance) = self.to_light(point);
        let falloff = 1.0 / distance.sqr().max(0.0001);

        if self.kind() == Self::TYPE_SPOT {
            let cos_angle = (-l).dot(self.direction());
            let cone = cos_angle.smoothstep(self.d3.y, self.d3.z);

            color * falloff * cone
        } else {
            color * falloff
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{vec2, Vec3Swizzles};

    use super::*;

    #[test]
    fn directional_without_radius_is_hard() {
        let light =
            Light::directional(vec3(0.0, -1.0, 0.0), Vec3::ONE, 1.0, 0.0);

        let (dir, distance) =
            light.sample_direction(Vec3::ZERO, vec2(0.7, 0.3));

        assert_relative_eq!(1.0, dir.y, epsilon = 1e-5);
        assert_eq!(f32::MAX, distance);
    }

    #[test]
    fn directional_samples_stay_inside_cone() {
        let radius = 0.1;
        let light =
            Light::directional(vec3(0.0, -1.0, 0.0), Vec3::ONE, 1.0, radius);

        for i in 0..16 {
            for j in 0..16 {
                let sample = vec2(i as f32 / 16.0, j as f32 / 16.0);
                let (dir, _) = light.sample_direction(Vec3::ZERO, sample);

                assert!(dir.y >= radius.cos() - 1e-5);
            }
        }
    }

    #[test]
    fn point_samples_hit_the_disk() {
        let light = Light::point(vec3(0.0, 10.0, 0.0), Vec3::ONE, 1.0, 1.0);
        let (dir, distance) =
            light.sample_direction(Vec3::ZERO, vec2(1.0, 0.0));
        let target = dir * distance;

        assert_relative_eq!(10.0, target.y, epsilon = 1e-4);
        assert_relative_eq!(1.0, target.xz().length(), epsilon = 1e-4);
    }

    #[test]
    fn point_falloff() {
        let light = Light::point(vec3(0.0, 2.0, 0.0), Vec3::ONE, 8.0, 0.0);

        assert_relative_eq!(2.0, light.radiance(Vec3::ZERO).x);
    }

    #[test]
    fn spot_cone() {
        let light = Light::spot(
            vec3(0.0, 1.0, 0.0),
            vec3(0.0, -1.0, 0.0),
            Vec3::ONE,
            1.0,
            0.0,
            0.2,
            0.4,
        );

        assert_relative_eq!(1.0, light.radiance(Vec3::ZERO).x);
        assert_eq!(0.0, light.radiance(vec3(5.0, 0.0, 0.0)).x);
    }
}
