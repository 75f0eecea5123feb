use core::f32::consts::PI;

use bytemuck::{Pod, Zeroable};
use glam::{vec2, vec3, UVec2, Vec2, Vec3, Vec4, Vec4Swizzles};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::{lerp, F32Ext, TexRgba32};

/// Per-scene uniform describing what's visible when rays escape the scene.
#[repr(C)]
#[derive(Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct World {
    /// x - (as u32) environment kind, see `World::ENV_*`
    /// y - environment intensity
    /// z - (as u32) width of the environment map
    /// w - (as u32) height of the environment map
    pub env: Vec4,

    /// xyz - direction towards the sun (for the procedural sky)
    /// w - sun intensity
    pub sun: Vec4,
}

impl World {
    pub const ENV_PROCEDURAL_SKY: u32 = 0;
    pub const ENV_HDR: u32 = 1;

    pub fn procedural_sky(sun_direction: Vec3, sun_intensity: f32) -> Self {
        Self {
            env: Vec4::new(
                f32::from_bits(Self::ENV_PROCEDURAL_SKY),
                1.0,
                f32::from_bits(0),
                f32::from_bits(0),
            ),
            sun: sun_direction.normalize().extend(sun_intensity),
        }
    }

    pub fn hdr(size: UVec2, intensity: f32) -> Self {
        Self {
            env: Vec4::new(
                f32::from_bits(Self::ENV_HDR),
                intensity,
                f32::from_bits(size.x),
                f32::from_bits(size.y),
            ),
            sun: Vec4::ZERO,
        }
    }

    pub fn env_kind(&self) -> u32 {
        self.env.x.to_bits()
    }

    pub fn env_size(&self) -> UVec2 {
        UVec2::new(self.env.z.to_bits(), self.env.w.to_bits())
    }
}

/// Maps a direction onto uv-coordinates of an equirectangular image.
pub fn equirect_uv(dir: Vec3) -> Vec2 {
    let u = dir.z.atan2(dir.x) / (2.0 * PI) + 0.5;
    let v = dir.y.clamp(-1.0, 1.0).acos() / PI;

    vec2(u, v)
}

/// Simple analytic sky: a gradient from the horizon up to zenith, a dim
/// ground and a sun disk.
pub fn procedural_sky(dir: Vec3, sun_dir: Vec3, sun_intensity: f32) -> Vec3 {
    let horizon = vec3(0.85, 0.9, 1.0);
    let zenith = vec3(0.25, 0.45, 0.85);
    let ground = vec3(0.2, 0.18, 0.16);

    let sky = if dir.y >= 0.0 {
        lerp(horizon, zenith, dir.y.sqrt())
    } else {
        lerp(horizon, ground, (-dir.y * 4.0).saturate())
    };

    let sun = dir.dot(sun_dir).max(0.0).powf(512.0) * sun_intensity;

    sky + Vec3::splat(sun)
}

#[derive(Clone, Copy)]
pub struct Environment<'a> {
    world: &'a World,
    map: TexRgba32<'a>,
}

impl<'a> Environment<'a> {
    pub fn new(world: &'a World, map: TexRgba32<'a>) -> Self {
        Self { world, map }
    }

    pub fn sample(self, dir: Vec3) -> Vec3 {
        if self.world.env_kind() == World::ENV_HDR {
            let size = self.world.env_size();
            let pos = (equirect_uv(dir) * size.as_vec2()).as_uvec2();
            let pos = pos.min(size - 1);
            let color: Vec4 = self.map.read(pos);

            color.xyz() * self.world.env.y
        } else {
            procedural_sky(dir, self.world.sun.xyz(), self.world.sun.w)
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn equirect() {
        let up = equirect_uv(vec3(0.0, 1.0, 0.0));
        let down = equirect_uv(vec3(0.0, -1.0, 0.0));
        let side = equirect_uv(vec3(-1.0, 0.0, 0.0));

        assert_relative_eq!(0.0, up.y);
        assert_relative_eq!(1.0, down.y);
        assert_relative_eq!(0.5, side.y);
        assert_relative_eq!(1.0, side.x);
    }

    #[test]
    fn world_round_trip() {
        let world = World::hdr(UVec2::new(2048, 1024), 1.5);

        assert_eq!(World::ENV_HDR, world.env_kind());
        assert_eq!(UVec2::new(2048, 1024), world.env_size());
    }

    #[test]
    fn sun_is_bright() {
        let sun = vec3(0.0, 1.0, 1.0).normalize();
        let at_sun = procedural_sky(sun, sun, 50.0);
        let away = procedural_sky(-sun, sun, 50.0);

        assert!(at_sun.x > 10.0);
        assert!(away.x < 1.0);
    }
}
