use glam::{vec3, Vec3};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

pub trait Vec3Ext
where
    Self: Sized,
{
    /// Reflects this direction-vector around `other`.
    fn reflect(self, other: Self) -> Self;

    /// Clips this color-vector into given bounding box, moving it towards the
    /// box's center.
    ///
    /// See:
    /// - https://s3.amazonaws.com/arena-attachments/655504/c5c71c5507f0f8bf344252958254fb7d.pdf?1468341463
    fn clip(self, aabb_min: Self, aabb_max: Self) -> Self;

    /// Returns luminance of this color-vector.
    fn luma(self) -> f32;

    /// Returns an orthonormal basis with this vector as its third axis.
    fn basis(self) -> (Self, Self);

    /// Transforms a tangent-space vector into the world-space basis whose
    /// third axis is `self`.
    fn to_world(self, local: Self) -> Self;
}

impl Vec3Ext for Vec3 {
    fn reflect(self, other: Self) -> Self {
        self - 2.0 * other.dot(self) * other
    }

    fn clip(self, aabb_min: Self, aabb_max: Self) -> Self {
        let p_clip = 0.5 * (aabb_max + aabb_min);
        let e_clip = (0.5 * (aabb_max - aabb_min)).max(Vec3::splat(1e-6));
        let v_clip = self - p_clip;
        let v_unit = v_clip / e_clip;
        let a_unit = v_unit.abs();
        let ma_unit = a_unit.max_element();

        if ma_unit > 1.0 {
            p_clip + v_clip / ma_unit
        } else {
            self
        }
    }

    fn luma(self) -> f32 {
        self.dot(vec3(0.2126, 0.7152, 0.0722))
    }

    fn basis(self) -> (Self, Self) {
        self.any_orthonormal_pair()
    }

    fn to_world(self, local: Self) -> Self {
        let (t, b) = self.basis();

        (t * local.x + b * local.y + self * local.z).normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_inside() {
        let color = vec3(0.5, 0.5, 0.5);

        assert_eq!(color, color.clip(Vec3::ZERO, Vec3::ONE));
    }

    #[test]
    fn clip_outside() {
        let clipped = vec3(3.0, 0.5, 0.5).clip(Vec3::ZERO, Vec3::ONE);

        assert_eq!(vec3(1.0, 0.5, 0.5), clipped);
    }

    #[test]
    fn clip_degenerate_box() {
        let clipped = vec3(3.0, 1.0, 1.0).clip(Vec3::ONE, Vec3::ONE);

        assert!((clipped - Vec3::ONE).abs().max_element() < 1e-4);
    }

    #[test]
    fn to_world() {
        let n = vec3(0.0, 1.0, 0.0);
        let actual = n.to_world(vec3(0.0, 0.0, 1.0));

        assert!((actual - n).length() < 1e-6);
    }
}
