use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4, Vec4Swizzles};
use spirv_std::arch::IndexUnchecked;
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::{Hit, Ray};

/// World-space triangle; the triangle buffer doubles as the rasterizer's
/// vertex stream, so each vertex spans two `Vec4`s.
#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct Triangle {
    /// xyz - position of the first vertex
    pub d0: Vec4,

    /// xyz - normal of the first vertex
    pub d1: Vec4,

    pub d2: Vec4,
    pub d3: Vec4,
    pub d4: Vec4,
    pub d5: Vec4,
}

impl Triangle {
    /// Size of a single vertex, in bytes.
    pub const VERTEX_STRIDE: u64 = 2 * 16;

    pub fn new(positions: [Vec3; 3], normals: [Vec3; 3]) -> Self {
        Self {
            d0: positions[0].extend(1.0),
            d1: normals[0].extend(0.0),
            d2: positions[1].extend(1.0),
            d3: normals[1].extend(0.0),
            d4: positions[2].extend(1.0),
            d5: normals[2].extend(0.0),
        }
    }

    pub fn position0(&self) -> Vec3 {
        self.d0.xyz()
    }

    pub fn normal0(&self) -> Vec3 {
        self.d1.xyz()
    }

    pub fn position1(&self) -> Vec3 {
        self.d2.xyz()
    }

    pub fn normal1(&self) -> Vec3 {
        self.d3.xyz()
    }

    pub fn position2(&self) -> Vec3 {
        self.d4.xyz()
    }

    pub fn normal2(&self) -> Vec3 {
        self.d5.xyz()
    }

    pub fn positions(&self) -> [Vec3; 3] {
        [self.position0(), self.position1(), self.position2()]
    }

    /// Möller-Trumbore intersection; updates `hit` if this triangle is
    /// closer than what's already there.
    pub fn hit(&self, ray: Ray, hit: &mut Hit) -> bool {
        let v0v1 = self.position1() - self.position0();
        let v0v2 = self.position2() - self.position0();

        // ---

        let pvec = ray.direction().cross(v0v2);
        let det = v0v1.dot(pvec);

        if det.abs() < f32::EPSILON {
            return false;
        }

        // ---

        let inv_det = 1.0 / det;
        let tvec = ray.origin() - self.position0();
        let u = tvec.dot(pvec) * inv_det;
        let qvec = tvec.cross(v0v1);
        let v = ray.direction().dot(qvec) * inv_det;
        let distance = v0v2.dot(qvec) * inv_det;

        if (u < 0.0)
            | (u > 1.0)
            | (v < 0.0)
            | (u + v > 1.0)
            | (distance <= 0.0)
            | (distance >= hit.distance)
        {
            return false;
        }

        let normal = u * self.normal1()
            + v * self.normal2()
            + (1.0 - u - v) * self.normal0();

        let mut normal = normal.normalize();

        // Shading normals of one-sided geometry can face away from the ray;
        // flip them so that the secondary rays leave on the correct side
        if normal.dot(ray.direction()) > 0.0 {
            normal = -normal;
        }

        hit.distance = distance;
        hit.point = ray.at(distance) + normal * Hit::NUDGE_OFFSET;
        hit.normal = normal;

        true
    }
}

#[derive(Clone, Copy)]
pub struct TrianglesView<'a> {
    buffer: &'a [Triangle],
}

impl<'a> TrianglesView<'a> {
    pub fn new(buffer: &'a [Triangle]) -> Self {
        Self { buffer }
    }

    pub fn get(self, id: u32) -> Triangle {
        unsafe { *self.buffer.index_unchecked(id as usize) }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::vec3;

    use super::*;

    fn triangle() -> Triangle {
        Triangle::new(
            [
                vec3(-1.0, 0.0, -1.0),
                vec3(1.0, 0.0, -1.0),
                vec3(0.0, 0.0, 1.0),
            ],
            [Vec3::Y; 3],
        )
    }

    #[test]
    fn hit() {
        let ray = Ray::new(vec3(0.0, 2.0, 0.0), vec3(0.0, -1.0, 0.0));
        let mut hit = Hit::none();

        assert!(triangle().hit(ray, &mut hit));
        assert_relative_eq!(2.0, hit.distance);
        assert_relative_eq!(1.0, hit.normal.y);
        assert!(hit.point.y > 0.0);
    }

    #[test]
    fn hit_from_below_flips_normal() {
        let ray = Ray::new(vec3(0.0, -2.0, 0.0), vec3(0.0, 1.0, 0.0));
        let mut hit = Hit::none();

        assert!(triangle().hit(ray, &mut hit));
        assert_relative_eq!(-1.0, hit.normal.y);
        assert!(hit.point.y < 0.0);
    }

    #[test]
    fn miss() {
        let ray = Ray::new(vec3(5.0, 2.0, 0.0), vec3(0.0, -1.0, 0.0));
        let mut hit = Hit::none();

        assert!(!triangle().hit(ray, &mut hit));
        assert!(hit.is_none());
    }

    #[test]
    fn farther_than_current_hit() {
        let ray = Ray::new(vec3(0.0, 2.0, 0.0), vec3(0.0, -1.0, 0.0));

        let mut hit = Hit {
            distance: 1.0,
            ..Hit::none()
        };

        assert!(!triangle().hit(ray, &mut hit));
    }

    #[test]
    fn degenerate_triangle_is_never_hit() {
        let ray = Ray::new(Vec3::ONE, -Vec3::ONE.normalize());
        let mut hit = Hit::none();

        assert!(!Triangle::default().hit(ray, &mut hit));
    }
}
