use std::ops::Range;

use glam::{Vec3, Vec4};
use log::{info, warn};

use crate::{gpu, Bindable, StorageBuffer};

/// Geometry, acceleration structure and materials of the rendered world.
///
/// Triangles are stored in world-space and serve both as the raster vertex
/// stream and as the ray tracers' primitives; the BVH is expected to be
/// already flattened into the layout described by [`gpu::BvhNode`].
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub id: u64,
    pub triangles: Vec<gpu::Triangle>,
    pub bvh: Vec<Vec4>,
    pub materials: Vec<gpu::Material>,
    pub instances: Vec<Instance>,
    pub min_extents: Vec3,
    pub max_extents: Vec3,
}

impl Scene {
    pub fn new(
        id: u64,
        triangles: Vec<gpu::Triangle>,
        bvh: Vec<Vec4>,
        materials: Vec<gpu::Material>,
        instances: Vec<Instance>,
    ) -> Self {
        let (min_extents, max_extents) = extents(&triangles);

        Self {
            id,
            triangles,
            bvh,
            materials,
            instances,
            min_extents,
            max_extents,
        }
    }

    /// Builds a "BVH" consisting of a single leaf that lists every
    /// triangle; traversing it is linear, but it's handy for small scenes
    /// and tests.
    pub fn linear_bvh(instances: &[Instance]) -> Vec<Vec4> {
        let leaves: Vec<_> = instances
            .iter()
            .flat_map(|instance| {
                instance
                    .triangles
                    .clone()
                    .map(|triangle_id| (triangle_id, instance.material_id))
            })
            .collect();

        let len = leaves.len();

        leaves
            .into_iter()
            .enumerate()
            .map(|(idx, (triangle_id, material_id))| {
                gpu::BvhNode::leaf(triangle_id, material_id, idx + 1 < len)
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty() || self.bvh.is_empty()
    }
}

/// Object drawn by the G-Buffer pass: a range of the scene's triangles
/// sharing a material.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instance {
    /// Identifier stored in the G-Buffer; reprojection rejects history
    /// whose object id doesn't match
    pub object_id: u32,
    pub material_id: u32,
    pub triangles: Range<u32>,
}

/// GPU-side copy of a [`Scene`].
#[derive(Debug)]
pub(crate) struct SceneBuffers {
    pub id: u64,
    pub triangles: StorageBuffer<gpu::Triangle>,
    pub bvh: StorageBuffer<Vec4>,
    pub materials: StorageBuffer<gpu::Material>,
    pub instances: Vec<Instance>,
}

impl SceneBuffers {
    pub fn new(device: &wgpu::Device, scene: &Scene) -> Self {
        info!(
            "Uploading scene #{}; triangles={}, bvh={}, materials={}, \
             instances={}",
            scene.id,
            scene.triangles.len(),
            scene.bvh.len(),
            scene.materials.len(),
            scene.instances.len(),
        );

        // An empty scene still needs something to traverse, so it gets a
        // single leaf pointing at a degenerate (never hit) triangle
        let (triangles, bvh) = if scene.is_empty() {
            (
                vec![gpu::Triangle::default()],
                vec![gpu::BvhNode::leaf(0, 0, false)],
            )
        } else {
            (scene.triangles.clone(), scene.bvh.clone())
        };

        let materials = if scene.materials.is_empty() {
            vec![gpu::Material::default()]
        } else {
            scene.materials.clone()
        };

        let instances = scene
            .instances
            .iter()
            .filter(|instance| {
                let is_valid = instance.triangles.end as usize
                    <= scene.triangles.len()
                    && (instance.material_id as usize)
                        < scene.materials.len();

                if !is_valid {
                    warn!("Skipping invalid instance: {instance:?}");
                }

                is_valid
            })
            .cloned()
            .collect();

        Self {
            id: scene.id,
            triangles: StorageBuffer::new_with_usage(
                device,
                "triangles",
                &triangles,
                wgpu::BufferUsages::VERTEX,
            ),
            bvh: StorageBuffer::new(device, "bvh", &bvh),
            materials: StorageBuffer::new(device, "materials", &materials),
            instances,
        }
    }

    pub fn bind_triangles(&self) -> impl Bindable + '_ {
        self.triangles.bind_readable()
    }

    pub fn bind_bvh(&self) -> impl Bindable + '_ {
        self.bvh.bind_readable()
    }

    pub fn bind_materials(&self) -> impl Bindable + '_ {
        self.materials.bind_readable()
    }
}

fn extents(triangles: &[gpu::Triangle]) -> (Vec3, Vec3) {
    let mut points = triangles.iter().flat_map(|triangle| triangle.positions());

    let Some(first) = points.next() else {
        return (Vec3::ZERO, Vec3::ZERO);
    };

    points.fold((first, first), |(min, max), point| {
        (min.min(point), max.max(point))
    })
}

#[cfg(test)]
mod tests {
    use glam::vec3;

    use super::*;

    fn triangle(offset: Vec3) -> gpu::Triangle {
        gpu::Triangle::new(
            [
                offset,
                offset + vec3(1.0, 0.0, 0.0),
                offset + vec3(0.0, 1.0, 0.0),
            ],
            [Vec3::Z; 3],
        )
    }

    #[test]
    fn computes_extents() {
        let scene = Scene::new(
            1,
            vec![triangle(Vec3::ZERO), triangle(vec3(-2.0, 3.0, 5.0))],
            Default::default(),
            Default::default(),
            Default::default(),
        );

        assert_eq!(vec3(-2.0, 0.0, 0.0), scene.min_extents);
        assert_eq!(vec3(1.0, 4.0, 5.0), scene.max_extents);
    }

    #[test]
    fn empty_scene() {
        let scene = Scene::default();

        assert!(scene.is_empty());
        assert_eq!(Vec3::ZERO, scene.min_extents);
        assert_eq!(Vec3::ZERO, scene.max_extents);
    }

    #[test]
    fn linear_bvh() {
        let instances = [
            Instance {
                object_id: 1,
                material_id: 7,
                triangles: 0..2,
            },
            Instance {
                object_id: 2,
                material_id: 9,
                triangles: 2..3,
            },
        ];

        let bvh = Scene::linear_bvh(&instances);

        assert_eq!(
            vec![
                gpu::BvhNode::leaf(0, 7, true),
                gpu::BvhNode::leaf(1, 7, true),
                gpu::BvhNode::leaf(2, 9, false),
            ],
            bvh
        );
    }
}
