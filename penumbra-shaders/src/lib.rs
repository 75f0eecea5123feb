#![cfg_attr(target_arch = "spirv", no_std)]

pub mod ao;
pub mod bilateral_blur;
pub mod clear;
pub mod deferred_shading;
pub mod diffuse;
pub mod gbuffer;
pub mod gbuffer_mips;
pub mod ground_truth;
pub mod reflections;
pub mod shadows;
pub mod taa;
pub mod temporal_reprojection;
pub mod tiles;
pub mod upsample;

mod utils;
