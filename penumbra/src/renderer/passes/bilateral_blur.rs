use glam::UVec2;

use crate::{
    gpu, mip_size, workgroups_8x8, DoubleBufferedBindable, Engine, Renderer,
    RendererBuffers, RendererComputePass,
};

/// Generic single-pass bilateral blur, shared by the reflection and diffuse
/// denoisers; which edges stop it is up to the caller's flags.
#[derive(Debug)]
pub struct BilateralBlurPass {
    pass: RendererComputePass<gpu::BilateralPassParams>,
    size: UVec2,
}

impl BilateralBlurPass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        label: &str,
        buffers: &RendererBuffers,
        mip: u32,
        input: &dyn DoubleBufferedBindable,
        output: &dyn DoubleBufferedBindable,
    ) -> Self {
        let pass = RendererComputePass::builder(label)
            .bind([&buffers.bind_gbuffer_edges(mip)])
            .bind([input, output])
            .build(device, &engine.shaders.bilateral_blur);

        Self {
            pass,
            size: mip_size(buffers.full.size, mip),
        }
    }

    /// Runs the blur; `params.size` gets filled in automatically.
    pub fn run(
        &self,
        renderer: &Renderer,
        encoder: &mut wgpu::CommandEncoder,
        params: gpu::BilateralPassParams,
    ) {
        self.pass.run(
            renderer,
            encoder,
            workgroups_8x8(self.size),
            gpu::BilateralPassParams {
                size: self.size,
                ..params
            },
        );
    }
}
