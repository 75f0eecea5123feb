use penumbra_gpu::prelude::*;
use spirv_std::arch;
use spirv_std::memory::{Scope, Semantics};

pub fn barrier() {
    unsafe {
        arch::workgroup_memory_barrier_with_group_sync();
    }
}

/// Atomically ORs `value` into a workgroup-shared variable.
pub fn workgroup_or(ptr: &mut u32, value: u32) {
    unsafe {
        arch::atomic_or::<
            u32,
            { Scope::Workgroup as u32 },
            { Semantics::WORKGROUP_MEMORY.bits() },
        >(ptr, value);
    }
}

/// Appends a tile to a tile list, growing the list's indirect-dispatch
/// arguments to cover it.
pub fn push_tile(list: &mut [u32], args: &mut [u32], tile: UVec2) {
    unsafe {
        let idx = arch::atomic_i_increment::<
            u32,
            { Scope::Device as u32 },
            { Semantics::UNIFORM_MEMORY.bits() },
        >(list.index_unchecked_mut(0));

        *list.index_unchecked_mut((TILE_LIST_HEADER + idx) as usize) =
            TileCoord::new(tile).pack();

        let required = DispatchIndirectArgs::for_list(idx + 1);

        arch::atomic_u_max::<
            u32,
            { Scope::Device as u32 },
            { Semantics::UNIFORM_MEMORY.bits() },
        >(args.index_unchecked_mut(0), required.x);

        arch::atomic_u_max::<
            u32,
            { Scope::Device as u32 },
            { Semantics::UNIFORM_MEMORY.bits() },
        >(args.index_unchecked_mut(1), required.y);
    }
}

/// Returns whether the current workgroup of an indirect, tile-list-driven
/// dispatch has a tile to process.
pub fn is_listed(list: &[u32], workgroup_id: UVec3) -> bool {
    let len = unsafe { *list.index_unchecked(0) };

    DispatchIndirectArgs::list_entry(workgroup_id.xy()) < len
}

/// Returns the tile processed by the current workgroup of an indirect,
/// tile-list-driven dispatch; see [`is_listed()`].
pub fn listed_tile(list: &[u32], workgroup_id: UVec3) -> TileCoord {
    let idx = TILE_LIST_HEADER
        + DispatchIndirectArgs::list_entry(workgroup_id.xy());

    TileCoord::unpack(unsafe { *list.index_unchecked(idx as usize) })
}

pub fn contains(pos: IVec2, size: UVec2) -> bool {
    pos.x >= 0 && pos.y >= 0 && pos.x < size.x as i32 && pos.y < size.y as i32
}

pub fn clamp_pos(pos: IVec2, size: UVec2) -> UVec2 {
    pos.clamp(IVec2::ZERO, size.as_ivec2() - 1).as_uvec2()
}

/// Returns radiance leaving a ray's hit point towards `v` (the direction
/// back to the ray's origin): its emission plus hard-shadowed direct light.
#[allow(clippy::too_many_arguments)]
pub fn hit_radiance(
    local_idx: u32,
    triangles: TrianglesView,
    bvh: BvhView,
    stack: BvhStack,
    light: &Light,
    hit: &Hit,
    mut material: Material,
    v: Vec3,
) -> Vec3 {
    material.adjust_for_indirect();

    let entry = hit.as_gbuffer(material);
    let origin = hit.point + hit.normal * Hit::NUDGE_OFFSET;
    let (l, distance) = light.to_light(hit.point);

    let is_lit = hit.normal.dot(l) > 0.0
        && !Ray::new(origin, l)
            .trace_any(local_idx, triangles, bvh, stack, distance);

    let visibility = if is_lit { 1.0 } else { 0.0 };

    material.emission() + direct_lighting(light, &entry, v, visibility)
}
