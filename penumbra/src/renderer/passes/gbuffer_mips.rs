use glam::UVec2;

use crate::{
    gpu, mip_size, workgroups_8x8, Config, DoubleBuffered, Engine, Renderer,
    RendererBuffers, RendererComputePass, Shader, Texture,
};

/// Builds the mip pyramid of each G-Buffer image, so that effects traced at
/// lower resolutions can read a matching G-Buffer.
///
/// Downsampling picks the nearest texel; averaging normals or depths across
/// an edge would produce surfaces that don't exist. LinearZ's slope gets
/// rescaled, since neighbouring pixels of each mip lie twice as far apart.
#[derive(Debug)]
pub struct GBufferMipsPass {
    passes: Vec<(RendererComputePass<gpu::MipPassParams>, UVec2)>,
}

impl GBufferMipsPass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        _: &Config,
        buffers: &RendererBuffers,
    ) -> Self {
        let shaders = &engine.shaders;

        let images: [(&str, &DoubleBuffered<Texture>, &Shader); 5] = [
            (
                "albedo_metallic",
                &buffers.albedo_metallic,
                &shaders.gbuffer_mips_rgba8,
            ),
            (
                "normal_roughness",
                &buffers.normal_roughness,
                &shaders.gbuffer_mips_rgba16,
            ),
            ("position", &buffers.position, &shaders.gbuffer_mips_rgba32),
            (
                "linear_z",
                &buffers.linear_z,
                &shaders.gbuffer_mips_linear_z,
            ),
            ("depth", &buffers.depth, &shaders.gbuffer_mips_r32),
        ];

        let mut passes = Vec::new();

        for (label, image, shader) in images {
            let size = image.get(false).size();
            let mips = image.get(false).mips();

            for mip in 1..mips {
                let pass = RendererComputePass::builder(format!(
                    "gbuffer_mips_{label}_{mip}"
                ))
                .bind([
                    &image.curr().bind_readable_mip(mip - 1),
                    &image.curr().bind_writable_mip(mip),
                ])
                .build(device, shader);

                passes.push((pass, mip_size(size, mip)));
            }
        }

        Self { passes }
    }

    pub fn run(&self, renderer: &Renderer, encoder: &mut wgpu::CommandEncoder) {
        for (pass, size) in &self.passes {
            pass.run(
                renderer,
                encoder,
                workgroups_8x8(*size),
                gpu::MipPassParams { size: *size },
            );
        }
    }
}
