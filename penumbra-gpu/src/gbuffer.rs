use glam::{vec4, UVec2, Vec3, Vec4, Vec4Swizzles};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::{TexRgba16, TexRgba32, TexRgba8};

/// Surface rasterized into a single pixel of the G-Buffer.
#[derive(Clone, Copy, Default)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct GBufferEntry {
    pub albedo: Vec3,
    pub metallic: f32,
    pub normal: Vec3,
    pub roughness: f32,
    pub position: Vec3,
    pub linear_z: LinearZ,
}

impl GBufferEntry {
    /// Minimum roughness used when evaluating specular lobes; perfect mirrors
    /// cause the distribution to collapse into a delta.
    pub const MIN_ROUGHNESS: f32 = 0.045;

    /// Returns `[albedo+metallic, normal+roughness, position, linear-z]`.
    pub fn pack(self) -> [Vec4; 4] {
        [
            self.albedo.extend(self.metallic),
            self.normal.extend(self.roughness),
            self.position.extend(1.0),
            self.linear_z.pack(),
        ]
    }

    pub fn unpack([d0, d1, d2, d3]: [Vec4; 4]) -> Self {
        Self {
            albedo: d0.xyz(),
            metallic: d0.w,
            normal: d1.xyz(),
            roughness: d1.w,
            position: d2.xyz(),
            linear_z: LinearZ::unpack(d3),
        }
    }

    /// Returns whether this pixel contains any geometry (as opposed to sky).
    pub fn is_some(&self) -> bool {
        self.linear_z.is_some()
    }

    pub fn is_none(&self) -> bool {
        !self.is_some()
    }

    pub fn depth(&self) -> f32 {
        self.linear_z.depth
    }

    pub fn object_id(&self) -> u32 {
        self.linear_z.object_id
    }

    pub fn clamped_roughness(&self) -> f32 {
        self.roughness.max(Self::MIN_ROUGHNESS)
    }
}

/// Contents of the G-Buffer's LinearZ channel.
#[derive(Clone, Copy, Default)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct LinearZ {
    /// View-space depth; zero for pixels with no geometry
    pub depth: f32,

    /// Maximum change of `depth` between neighbouring pixels
    pub slope: f32,

    /// View-space depth of this surface point as seen by the previous frame's
    /// camera
    pub prev_depth: f32,

    pub object_id: u32,
}

impl LinearZ {
    pub fn pack(self) -> Vec4 {
        vec4(
            self.depth,
            self.slope,
            self.prev_depth,
            f32::from_bits(self.object_id),
        )
    }

    pub fn unpack(d0: Vec4) -> Self {
        Self {
            depth: d0.x,
            slope: d0.y,
            prev_depth: d0.z,
            object_id: d0.w.to_bits(),
        }
    }

    pub fn is_some(&self) -> bool {
        self.depth > 0.0
    }

    /// Returns this texel as stored one mip level lower, where neighbouring
    /// pixels lie twice as far apart.
    pub fn downsample(self) -> Self {
        Self {
            slope: self.slope * 2.0,
            ..self
        }
    }

    /// Estimates how much the depth changes per pixel for a surface seen at
    /// given angle; `pixel_angle` comes from `Camera::pixel_angle()`.
    pub fn estimate_slope(
        depth: f32,
        normal: Vec3,
        view_dir: Vec3,
        pixel_angle: f32,
    ) -> f32 {
        let cos_theta = normal.dot(-view_dir).abs().clamp(0.05, 1.0);
        let tan_theta = (1.0 - cos_theta * cos_theta).sqrt() / cos_theta;

        depth * pixel_angle * tan_theta
    }
}

/// Read-only view into the G-Buffer images at a single mip level.
#[derive(Clone, Copy)]
pub struct GBuffer<'a> {
    pub albedo_metallic: TexRgba8<'a>,
    pub normal_roughness: TexRgba16<'a>,
    pub position: TexRgba32<'a>,
    pub linear_z: TexRgba32<'a>,
}

impl<'a> GBuffer<'a> {
    pub fn new(
        albedo_metallic: TexRgba8<'a>,
        normal_roughness: TexRgba16<'a>,
        position: TexRgba32<'a>,
        linear_z: TexRgba32<'a>,
    ) -> Self {
        Self {
            albedo_metallic,
            normal_roughness,
            position,
            linear_z,
        }
    }

    pub fn get(self, pos: UVec2) -> GBufferEntry {
        GBufferEntry::unpack([
            self.albedo_metallic.read(pos),
            self.normal_roughness.read(pos),
            self.position.read(pos),
            self.linear_z.read(pos),
        ])
    }

    pub fn linear_z(self, pos: UVec2) -> LinearZ {
        LinearZ::unpack(self.linear_z.read(pos))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{ivec2, vec3};

    use super::*;
    use crate::{BilateralFilter, BilateralTap};

    #[test]
    fn pack_and_unpack() {
        let entry = GBufferEntry {
            albedo: vec3(0.1, 0.2, 0.3),
            metallic: 0.4,
            normal: vec3(0.0, 1.0, 0.0),
            roughness: 0.5,
            position: vec3(1.0, 2.0, 3.0),
            linear_z: LinearZ {
                depth: 12.0,
                slope: 0.25,
                prev_depth: 12.5,
                object_id: 1234,
            },
        };

        assert_eq!(entry, GBufferEntry::unpack(entry.pack()));
    }

    #[test]
    fn cleared_pixel_is_sky() {
        assert!(GBufferEntry::unpack([Vec4::ZERO; 4]).is_none());
    }

    #[test]
    fn slope() {
        let facing = LinearZ::estimate_slope(
            10.0,
            vec3(0.0, 0.0, 1.0),
            vec3(0.0, 0.0, -1.0),
            0.01,
        );

        let grazing = LinearZ::estimate_slope(
            10.0,
            vec3(0.0, 1.0, 0.0),
            vec3(0.0, -0.1, -1.0).normalize(),
            0.01,
        );

        assert_relative_eq!(0.0, facing);
        assert!(grazing > 0.5);
    }

    #[test]
    fn downsampled_slope_follows_pixel_spacing() {
        // Plane whose depth grows by 0.1 per full-resolution pixel
        let depth = |x: u32| 10.0 + 0.1 * x as f32;

        let mip0 = LinearZ {
            depth: depth(0),
            slope: 0.1,
            prev_depth: depth(0),
            object_id: 7,
        };

        let mip1 = mip0.downsample();

        assert_relative_eq!(0.2, mip1.slope);
        assert_eq!(mip0.depth, mip1.depth);
        assert_eq!(mip0.object_id, mip1.object_id);

        let filter = |center: LinearZ| BilateralFilter {
            center: BilateralTap {
                depth: center.depth,
                normal: Vec3::Z,
                roughness: 0.0,
            },
            slope: center.slope,
            sigma: 1.0,
            phi_normal: 1.0,
            depth_weight: true,
            normal_weight: false,
            roughness_weight: false,
        };

        let tap = |depth| BilateralTap {
            depth,
            normal: Vec3::Z,
            roughness: 0.0,
        };

        let offset = ivec2(1, 0);

        // Neighbour at mip 1 lies two full-resolution pixels away
        let w0 = filter(mip0).weight(&tap(depth(1)), offset);
        let w1 = filter(mip1).weight(&tap(depth(2)), offset);

        assert_relative_eq!(w0, w1, epsilon = 1e-3);

        // Full-resolution slope would treat the same plane as an edge
        assert!(w1 > filter(mip0).weight(&tap(depth(2)), offset) * 2.0);
    }
}
