use glam::Vec3;

use crate::{GBufferEntry, LinearZ, Material};

#[derive(Clone, Copy)]
pub struct Hit {
    pub distance: f32,
    pub point: Vec3,
    pub normal: Vec3,
    pub triangle_id: u32,
    pub material_id: u32,
}

impl Hit {
    /// How far to move a hit point away from its surface to avoid
    /// self-intersection when casting secondary rays
    pub const NUDGE_OFFSET: f32 = 0.01;

    pub fn none() -> Self {
        Self {
            distance: f32::MAX,
            point: Vec3::ZERO,
            normal: Vec3::ZERO,
            triangle_id: 0,
            material_id: 0,
        }
    }

    pub fn is_some(&self) -> bool {
        self.distance < f32::MAX
    }

    pub fn is_none(&self) -> bool {
        !self.is_some()
    }

    /// Returns the hit surface in the same shape as G-Buffer's pixels, so
    /// that it can be shaded with the same functions.
    pub fn as_gbuffer(&self, material: Material) -> GBufferEntry {
        GBufferEntry {
            albedo: material.albedo(),
            metallic: material.metallic,
            normal: self.normal,
            roughness: material.roughness,
            position: self.point,
            linear_z: LinearZ {
                depth: self.distance,
                ..Default::default()
            },
        }
    }
}
