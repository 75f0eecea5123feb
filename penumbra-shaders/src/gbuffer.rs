use penumbra_gpu::prelude::*;

#[spirv(vertex)]
pub fn main_vs(
    // Params
    #[spirv(descriptor_set = 0, binding = 0, uniform)] camera: &Camera,

    // Inputs
    vertex_d0: Vec4,
    vertex_d1: Vec4,

    // Outputs
    #[spirv(position)] out_vertex: &mut Vec4,
    out_point: &mut Vec3,
    out_normal: &mut Vec3,
) {
    let point = vertex_d0.xyz();
    let clip = camera.world_to_clip(point);

    // Sub-pixel jitter for TAA; reprojection uses the unjittered matrices
    *out_vertex = clip + (camera.jitter() * clip.w).extend(0.0).extend(0.0);
    *out_point = point;
    *out_normal = vertex_d1.xyz();
}

#[allow(clippy::too_many_arguments)]
#[spirv(fragment)]
pub fn main_fs(
    // Params
    #[spirv(push_constant)] params: &GBufferPassParams,
    #[spirv(descriptor_set = 0, binding = 0, uniform)] camera: &Camera,
    #[spirv(descriptor_set = 0, binding = 1, storage_buffer)]
    materials: &[Material],
    #[spirv(front_facing)] front_facing: bool,
    #[spirv(frag_coord)] frag_coord: Vec4,

    // Inputs
    point: Vec3,
    normal: Vec3,

    // Outputs
    out_albedo_metallic: &mut Vec4,
    out_normal_roughness: &mut Vec4,
    out_position: &mut Vec4,
    out_linear_z: &mut Vec4,
    out_depth: &mut f32,
) {
    let material = MaterialsView::new(materials).get(params.material_id);

    let normal = {
        let normal = normal.normalize();

        if front_facing {
            normal
        } else {
            -normal
        }
    };

    let view_dir = (point - camera.origin()).normalize();
    let depth = camera.linear_depth(point);

    let entry = GBufferEntry {
        albedo: material.albedo(),
        metallic: material.metallic,
        normal,
        roughness: material.roughness,
        position: point,
        linear_z: LinearZ {
            depth,
            slope: LinearZ::estimate_slope(
                depth,
                normal,
                view_dir,
                camera.pixel_angle(),
            ),
            prev_depth: (camera.prev_view_proj * point.extend(1.0)).w,
            object_id: params.object_id,
        },
    };

    let [d0, d1, d2, d3] = entry.pack();

    *out_albedo_metallic = d0;
    *out_normal_roughness = d1;
    *out_position = d2;
    *out_linear_z = d3;
    *out_depth = frag_coord.z;
}
