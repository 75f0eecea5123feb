use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4, Vec4Swizzles};
use spirv_std::arch::IndexUnchecked;

#[repr(C)]
#[derive(Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct Material {
    pub base_color: Vec4,
    pub emissive: Vec4,
    pub roughness: f32,
    pub metallic: f32,
    pub _pad0: f32,
    pub _pad1: f32,
}

impl Material {
    pub fn albedo(&self) -> Vec3 {
        self.base_color.xyz()
    }

    pub fn emission(&self) -> Vec3 {
        self.emissive.xyz()
    }

    /// Adjusts material so that it's ready for computing indirect lighting.
    pub fn adjust_for_indirect(&mut self) {
        // When an indirect ray hits a specular highlight, it causes lots of
        // random pixels to turn white - that's almost impossible to denoise.
        //
        // So, following the typical advice, let's clamp the roughness:
        self.roughness = self.roughness.max(0.75 * 0.75);
    }
}

#[derive(Clone, Copy)]
pub struct MaterialsView<'a> {
    buffer: &'a [Material],
}

impl<'a> MaterialsView<'a> {
    pub fn new(buffer: &'a [Material]) -> Self {
        Self { buffer }
    }

    pub fn get(self, id: u32) -> Material {
        unsafe { *self.buffer.index_unchecked(id as usize) }
    }
}
