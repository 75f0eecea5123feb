//! Common structs, algorithms etc. used by Penumbra's shaders and renderer.
//!
//! Everything that happens per pixel lives here as plain functions over
//! `glam` types, so that it can be exercised on the CPU; shaders only glue
//! those functions to images and buffers.

#![cfg_attr(target_arch = "spirv", no_std)]
#![allow(clippy::len_without_is_empty)]
#![allow(clippy::manual_range_contains)]
#![allow(clippy::too_many_arguments)]

mod accumulation;
mod ao;
mod atrous;
mod bilateral;
mod brdf;
mod bvh;
mod camera;
mod environment;
mod frame;
mod gbuffer;
mod halton;
mod hit;
mod light;
mod material;
mod noise;
mod passes;
mod ray;
mod reflections;
mod reprojection;
mod shading;
mod shadow;
mod taa;
mod temporal;
mod tile;
mod triangle;
mod upsample;
mod utils;

pub use self::accumulation::*;
pub use self::ao::*;
pub use self::atrous::*;
pub use self::bilateral::*;
pub use self::brdf::*;
pub use self::bvh::*;
pub use self::camera::*;
pub use self::environment::*;
pub use self::frame::*;
pub use self::gbuffer::*;
pub use self::halton::*;
pub use self::hit::*;
pub use self::light::*;
pub use self::material::*;
pub use self::noise::*;
pub use self::passes::*;
pub use self::ray::*;
pub use self::reflections::*;
pub use self::reprojection::*;
pub use self::shading::*;
pub use self::shadow::*;
pub use self::taa::*;
pub use self::temporal::*;
pub use self::tile::*;
pub use self::triangle::*;
pub use self::upsample::*;
pub use self::utils::*;

pub mod prelude {
    pub use core::f32::consts::PI;

    pub use spirv_std::arch::IndexUnchecked;
    pub use spirv_std::glam::*;
    #[cfg(target_arch = "spirv")]
    pub use spirv_std::num_traits::Float;
    pub use spirv_std::{spirv, Image, Sampler};

    pub use crate::*;
}

/// Stack for nodes yet-to-be-visited when traversing the BVH.
///
/// For performance reasons, we use a per-workgroup shared-memory array where
/// each workgroup-thread simply indexes into a different slice of this memory.
pub type BvhStack<'a> = &'a mut [u32; BVH_STACK_SIZE * 8 * 8];

/// Maximum stack size per each workgroup-thread when traversing the BVH.
///
/// Affects the maximum size of BVH tree (it must not grow larger than
/// `2 ^ BVH_STACK_SIZE`).
pub const BVH_STACK_SIZE: usize = 24;

/// Golden angle, used for spatial filters.
pub const GOLDEN_ANGLE: f32 = 2.39996;

/// Small value used to keep divisions and logarithms away from zero.
pub const PENUMBRA_EPSILON: f32 = 0.0001;
