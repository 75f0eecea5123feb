use glam::{Vec3, Vec4};
use spirv_std::arch::IndexUnchecked;

/// Flattened BVH, as provided by the scene.
///
/// Each node starts with a `Vec4` whose `w` component tells its kind:
///
/// - internal node (`w` has bits `0`) spans four `Vec4`s:
///   - `d0.xyz` / `d1.xyz` - bounding box of the left child, which
///     immediately follows this node,
///   - `d1.w` - (as u32) pointer to the right child,
///   - `d2.xyz` / `d3.xyz` - bounding box of the right child;
///
/// - leaf node (`w` has bits `1`) spans a single `Vec4`:
///   - `x` - (as u32) `1` if the next `Vec4` is another leaf of the same
///     group, `0` otherwise,
///   - `y` - (as u32) triangle id,
///   - `z` - (as u32) material id.
#[derive(Clone, Copy)]
pub struct BvhView<'a> {
    buffer: &'a [Vec4],
}

impl<'a> BvhView<'a> {
    pub fn new(buffer: &'a [Vec4]) -> Self {
        Self { buffer }
    }

    pub fn get(self, ptr: u32) -> Vec4 {
        unsafe { *self.buffer.index_unchecked(ptr as usize) }
    }
}

/// Encoders of the node layout described at `BvhView`.
pub struct BvhNode;

impl BvhNode {
    pub fn internal(
        left: (Vec3, Vec3),
        right: (Vec3, Vec3),
        right_ptr: u32,
    ) -> [Vec4; 4] {
        [
            left.0.extend(f32::from_bits(0)),
            left.1.extend(f32::from_bits(right_ptr)),
            right.0.extend(0.0),
            right.1.extend(0.0),
        ]
    }

    pub fn leaf(triangle_id: u32, material_id: u32, has_more: bool) -> Vec4 {
        Vec4::new(
            f32::from_bits(has_more as u32),
            f32::from_bits(triangle_id),
            f32::from_bits(material_id),
            f32::from_bits(1),
        )
    }
}
