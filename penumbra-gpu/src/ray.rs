use core::mem;

use glam::{Vec3, Vec4Swizzles};

use crate::{BvhStack, BvhView, Hit, TrianglesView, BVH_STACK_SIZE};

#[derive(Copy, Clone, Default)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
    inv_direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            inv_direction: 1.0 / direction,
        }
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    /// Traces this ray and returns its nearest hit.
    pub fn trace_nearest(
        self,
        local_idx: u32,
        triangles: TrianglesView,
        bvh: BvhView,
        stack: BvhStack,
    ) -> Hit {
        let mut hit = Hit::none();

        self.trace(
            local_idx,
            triangles,
            bvh,
            stack,
            TracingMode::Nearest,
            &mut hit,
        );

        hit
    }

    /// Traces this ray and returns whether it hits anything up to the given
    /// distance.
    pub fn trace_any(
        self,
        local_idx: u32,
        triangles: TrianglesView,
        bvh: BvhView,
        stack: BvhStack,
        max_distance: f32,
    ) -> bool {
        let mut hit = Hit {
            distance: max_distance,
            ..Hit::none()
        };

        self.trace(
            local_idx,
            triangles,
            bvh,
            stack,
            TracingMode::Any,
            &mut hit,
        );

        hit.distance < max_distance
    }

    fn trace(
        self,
        local_idx: u32,
        triangles: TrianglesView,
        bvh: BvhView,
        stack: BvhStack,
        mode: TracingMode,
        hit: &mut Hit,
    ) {
        // Index into the `bvh` array; points at the currently processed node
        let mut bvh_ptr = 0;

        // Where this particular thread's stack starts at; see `BvhStack`
        let stack_begins_at = (local_idx as usize) * BVH_STACK_SIZE;

        // Index into the `stack` array; our stack spans from here up to +
        // BVH_STACK_SIZE items
        let mut stack_ptr = stack_begins_at;

        loop {
            let d0 = bvh.get(bvh_ptr);
            let is_internal_node = d0.w.to_bits() == 0;

            if is_internal_node {
                let d1 = bvh.get(bvh_ptr + 1);
                let d2 = bvh.get(bvh_ptr + 2);
                let d3 = bvh.get(bvh_ptr + 3);

                let mut near_ptr = bvh_ptr + 4;
                let mut far_ptr = d1.w.to_bits();

                let mut near_distance =
                    self.distance_to_node(d0.xyz(), d1.xyz());

                let mut far_distance =
                    self.distance_to_node(d2.xyz(), d3.xyz());

                if far_distance < near_distance {
                    mem::swap(&mut near_ptr, &mut far_ptr);
                    mem::swap(&mut near_distance, &mut far_distance);
                }

                // If the nearest child is closer than our current best shot,
                // let's check that child first; use stack to save the other
                // node for later.
                if far_distance < hit.distance {
                    unsafe {
                        *stack.get_unchecked_mut(stack_ptr) = far_ptr;
                        stack_ptr += 1;
                    }
                }

                if near_distance < hit.distance {
                    bvh_ptr = near_ptr;
                    continue;
                }
            } else {
                let has_more_triangles = d0.x.to_bits() & 1 == 1;
                let triangle_id = d0.y.to_bits();
                let material_id = d0.z.to_bits();

                if triangles.get(triangle_id).hit(self, hit) {
                    hit.triangle_id = triangle_id;
                    hit.material_id = material_id;

                    if let TracingMode::Any = mode {
                        break;
                    }
                }

                if has_more_triangles {
                    bvh_ptr += 1;
                    continue;
                }
            }

            // If the control flow got here, then it means we either tested a
            // leaf-node or tested an internal-node and got a miss.
            //
            // In any case, now it's the time to pop the next node from the
            // stack and investigate it; if the stack is empty, then we've
            // tested all nodes and we can safely bail out.
            if stack_ptr > stack_begins_at {
                unsafe {
                    stack_ptr -= 1;
                    bvh_ptr = *stack.get_unchecked(stack_ptr);
                }
            } else {
                break;
            }
        }
    }

    fn distance_to_node(self, aabb_min: Vec3, aabb_max: Vec3) -> f32 {
        let hit_min = (aabb_min - self.origin) * self.inv_direction;
        let hit_max = (aabb_max - self.origin) * self.inv_direction;

        let tmin = hit_min.min(hit_max).max_element();
        let tmax = hit_min.max(hit_max).min_element();

        if tmax >= tmin && tmax >= 0.0 {
            tmin
        } else {
            f32::MAX
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum TracingMode {
    Nearest,
    Any,
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{vec3, Vec4};

    use super::*;
    use crate::{BvhNode, Triangle};

    /// Two quads (of two triangles each) stacked above each other, at y = 0
    /// and y = 1.
    fn scene() -> (Vec<Triangle>, Vec<Vec4>) {
        let quad = |y: f32| {
            let a = vec3(-1.0, y, -1.0);
            let b = vec3(1.0, y, -1.0);
            let c = vec3(1.0, y, 1.0);
            let d = vec3(-1.0, y, 1.0);

            [
                Triangle::new([a, b, c], [Vec3::Y; 3]),
                Triangle::new([a, c, d], [Vec3::Y; 3]),
            ]
        };

        let triangles: Vec<_> =
            quad(0.0).into_iter().chain(quad(1.0)).collect();

        let lower = (vec3(-1.0, -0.01, -1.0), vec3(1.0, 0.01, 1.0));
        let upper = (vec3(-1.0, 0.99, -1.0), vec3(1.0, 1.01, 1.0));

        let mut bvh = Vec::new();

        bvh.extend(BvhNode::internal(lower, upper, 6));
        bvh.push(BvhNode::leaf(0, 10, true));
        bvh.push(BvhNode::leaf(1, 10, false));
        bvh.push(BvhNode::leaf(2, 20, true));
        bvh.push(BvhNode::leaf(3, 20, false));

        (triangles, bvh)
    }

    #[test]
    fn nearest_from_above() {
        let (triangles, bvh) = scene();
        let mut stack = [0; BVH_STACK_SIZE * 8 * 8];

        let hit = Ray::new(vec3(0.2, 5.0, 0.3), vec3(0.0, -1.0, 0.0))
            .trace_nearest(
                3,
                TrianglesView::new(&triangles),
                BvhView::new(&bvh),
                &mut stack,
            );

        assert!(hit.is_some());
        assert_eq!(20, hit.material_id);
        assert_relative_eq!(4.0, hit.distance);
    }

    #[test]
    fn nearest_from_below() {
        let (triangles, bvh) = scene();
        let mut stack = [0; BVH_STACK_SIZE * 8 * 8];

        let hit = Ray::new(vec3(-0.5, -5.0, 0.5), vec3(0.0, 1.0, 0.0))
            .trace_nearest(
                0,
                TrianglesView::new(&triangles),
                BvhView::new(&bvh),
                &mut stack,
            );

        assert_eq!(10, hit.material_id);
        assert_relative_eq!(5.0, hit.distance);
    }

    #[test]
    fn any_respects_max_distance() {
        let (triangles, bvh) = scene();
        let mut stack = [0; BVH_STACK_SIZE * 8 * 8];
        let ray = Ray::new(vec3(0.2, 5.0, 0.3), vec3(0.0, -1.0, 0.0));

        assert!(!ray.trace_any(
            0,
            TrianglesView::new(&triangles),
            BvhView::new(&bvh),
            &mut stack,
            3.0,
        ));

        assert!(ray.trace_any(
            0,
            TrianglesView::new(&triangles),
            BvhView::new(&bvh),
            &mut stack,
            4.5,
        ));
    }

    #[test]
    fn miss() {
        let (triangles, bvh) = scene();
        let mut stack = [0; BVH_STACK_SIZE * 8 * 8];

        let hit = Ray::new(vec3(5.0, 5.0, 0.0), vec3(0.0, -1.0, 0.0))
            .trace_nearest(
                0,
                TrianglesView::new(&triangles),
                BvhView::new(&bvh),
                &mut stack,
            );

        assert!(hit.is_none());
    }

    #[test]
    fn empty_scene() {
        let triangles = vec![Triangle::default()];
        let bvh = vec![BvhNode::leaf(0, 0, false)];
        let mut stack = [0; BVH_STACK_SIZE * 8 * 8];

        let hit = Ray::new(Vec3::ZERO, vec3(0.0, -1.0, 0.0)).trace_nearest(
            0,
            TrianglesView::new(&triangles),
            BvhView::new(&bvh),
            &mut stack,
        );

        assert!(hit.is_none());
    }
}
