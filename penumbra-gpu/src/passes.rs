//! Push constants of all the passes.
//!
//! Each struct here is filled on the host from the renderer's configuration
//! and read by the corresponding entry point in `penumbra-shaders`.

use bytemuck::{Pod, Zeroable};
use glam::{UVec2, Vec4};

use crate::BlurDirection;

#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct GBufferPassParams {
    pub object_id: u32,
    pub material_id: u32,
}

/// Downsamples mip `n` into mip `n + 1`.
#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct MipPassParams {
    /// Size of the destination mip
    pub size: UVec2,
}

/// Fills an image with a constant value.
#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct ClearPassParams {
    pub value: Vec4,
    pub size: UVec2,
    pub _pad: UVec2,
}

#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct ShadowTracePassParams {
    pub size: UVec2,
    pub frame: u32,
    pub bias: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct ShadowTemporalPassParams {
    pub size: UVec2,
    pub alpha: f32,
    pub moments_alpha: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct ShadowAtrousPassParams {
    pub size: UVec2,
    pub step: u32,
    pub phi_visibility: f32,
    pub phi_normal: f32,
    pub sigma_depth: f32,
}

/// Copies fast-path tiles (the ones that don't need filtering) from the
/// temporal output into the filter's output.
#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct CopyTilesPassParams {
    pub size: UVec2,
}

#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct UpsamplePassParams {
    /// Size of the full-resolution output
    pub size: UVec2,

    /// Size of the low-resolution input
    pub input_size: UVec2,

    /// Ratio between both sizes (1, 2 or 4)
    pub scale: u32,

    /// Exponent applied to the upsampled value (scalar signals only)
    pub power: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct AoTracePassParams {
    pub size: UVec2,
    pub frame: u32,
    pub rays_per_pixel: u32,
    pub ray_length: f32,
    pub bias: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct AoTemporalPassParams {
    pub size: UVec2,
    pub alpha: f32,

    /// History length below which a pixel is considered disoccluded
    pub disocclusion_threshold: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct AoBlurPassParams {
    pub size: UVec2,
    pub radius: u32,
    pub direction: u32,
}

impl AoBlurPassParams {
    pub fn direction(&self) -> BlurDirection {
        BlurDirection::from_u32(self.direction)
    }
}

#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct AoDisocclusionPassParams {
    pub size: UVec2,
    pub radius: u32,
    pub threshold: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct ReflectionTracePassParams {
    /// Size of the (half-resolution) output
    pub size: UVec2,
    pub frame: u32,
    pub bias: f32,
    pub trim: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct ReflectionReconstructPassParams {
    /// Size of the (full-resolution) output
    pub size: UVec2,

    /// Size of the ray-traced input
    pub input_size: UVec2,

    pub frame: u32,
}

/// Generic temporal accumulation of a color signal.
#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct TemporalPassParams {
    pub size: UVec2,
    pub alpha: f32,

    /// Non-positive disables clipping
    pub neighbourhood_scale: f32,

    pub tonemap: u32,
}

impl TemporalPassParams {
    pub fn tonemap(&self) -> bool {
        self.tonemap == 1
    }
}

/// Generic bilateral blur of a color signal.
#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct BilateralPassParams {
    pub size: UVec2,
    pub radius: u32,

    /// Bitset of `BilateralPassParams::FLAG_*`
    pub flags: u32,

    pub sigma_min: f32,
    pub sigma_max: f32,
    pub phi_normal: f32,

    /// Non-positive disables the color weight
    pub phi_color: f32,
}

impl BilateralPassParams {
    pub const FLAG_DEPTH: u32 = 1;
    pub const FLAG_NORMAL: u32 = 2;
    pub const FLAG_ROUGHNESS: u32 = 4;

    /// Derive the spatial sigma from the surface's roughness instead of from
    /// the radius.
    pub const FLAG_ROUGHNESS_SIGMA: u32 = 8;

    pub fn has(&self, flag: u32) -> bool {
        self.flags & flag == flag
    }
}

#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct GiTracePassParams {
    pub size: UVec2,
    pub frame: u32,
    pub bias: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct ShadingPassParams {
    pub size: UVec2,

    /// See `ShadingPassParams::VISUALIZATION_*`
    pub visualization: u32,

    /// Bitset of `ShadingPassParams::EFFECT_*`
    pub effects: u32,
}

impl ShadingPassParams {
    pub const VISUALIZATION_FINAL: u32 = 0;
    pub const VISUALIZATION_SHADOWS: u32 = 1;
    pub const VISUALIZATION_AO: u32 = 2;
    pub const VISUALIZATION_REFLECTIONS: u32 = 3;
    pub const VISUALIZATION_GI: u32 = 4;

    pub const EFFECT_SHADOWS: u32 = 1;
    pub const EFFECT_AO: u32 = 2;
    pub const EFFECT_REFLECTIONS: u32 = 4;
    pub const EFFECT_GI: u32 = 8;

    pub fn is_enabled(&self, effect: u32) -> bool {
        self.effects & effect == effect
    }
}

#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct TaaPassParams {
    pub size: UVec2,
    pub feedback_min: f32,
    pub feedback_max: f32,
    pub sharpen: u32,

    /// Whether history should be ignored (e.g. just after enabling TAA)
    pub reset: u32,
}

impl TaaPassParams {
    pub fn sharpen(&self) -> bool {
        self.sharpen == 1
    }

    pub fn is_reset(&self) -> bool {
        self.reset == 1
    }
}

#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct GroundTruthPassParams {
    pub size: UVec2,

    /// Number of frames accumulated so far
    pub frame_idx: u32,

    pub seed: u32,
    pub max_bounces: u32,
}

#[cfg(test)]
mod tests {
    use std::mem;

    use super::*;

    #[test]
    fn push_constants_fit_into_the_guaranteed_limit() {
        // wgpu requests `max_push_constant_size = 128`
        let sizes = [
            mem::size_of::<GBufferPassParams>(),
            mem::size_of::<MipPassParams>(),
            mem::size_of::<ClearPassParams>(),
            mem::size_of::<ShadowTracePassParams>(),
            mem::size_of::<ShadowTemporalPassParams>(),
            mem::size_of::<ShadowAtrousPassParams>(),
            mem::size_of::<CopyTilesPassParams>(),
            mem::size_of::<UpsamplePassParams>(),
            mem::size_of::<AoTracePassParams>(),
            mem::size_of::<AoTemporalPassParams>(),
            mem::size_of::<AoBlurPassParams>(),
            mem::size_of::<AoDisocclusionPassParams>(),
            mem::size_of::<ReflectionTracePassParams>(),
            mem::size_of::<ReflectionReconstructPassParams>(),
            mem::size_of::<TemporalPassParams>(),
            mem::size_of::<BilateralPassParams>(),
            mem::size_of::<GiTracePassParams>(),
            mem::size_of::<ShadingPassParams>(),
            mem::size_of::<TaaPassParams>(),
            mem::size_of::<GroundTruthPassParams>(),
        ];

        for size in sizes {
            assert!(size <= 128);
            assert_eq!(0, size % 4);
        }
    }

    #[test]
    fn bilateral_flags() {
        let params = BilateralPassParams {
            flags: BilateralPassParams::FLAG_DEPTH
                | BilateralPassParams::FLAG_ROUGHNESS_SIGMA,
            ..Default::default()
        };

        assert!(params.has(BilateralPassParams::FLAG_DEPTH));
        assert!(params.has(BilateralPassParams::FLAG_ROUGHNESS_SIGMA));
        assert!(!params.has(BilateralPassParams::FLAG_NORMAL));
    }
}
