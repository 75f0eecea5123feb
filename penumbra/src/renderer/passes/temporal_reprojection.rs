use glam::UVec2;

use crate::{
    gpu, mip_size, workgroups_8x8, DoubleBufferedBindable, Engine, Renderer,
    RendererBuffers, RendererComputePass,
};

/// Generic temporal accumulation of a color signal, shared by the
/// reflection and diffuse denoisers.
#[derive(Debug)]
pub struct TemporalReprojectionPass {
    pass: RendererComputePass<gpu::TemporalPassParams>,
    size: UVec2,
}

impl TemporalReprojectionPass {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        label: &str,
        buffers: &RendererBuffers,
        mip: u32,
        input: &dyn DoubleBufferedBindable,
        history: &dyn DoubleBufferedBindable,
        output: &dyn DoubleBufferedBindable,
    ) -> Self {
        let pass = RendererComputePass::builder(label)
            .bind([&buffers.bind_gbuffer_temporal(mip)])
            .bind([input, history, output])
            .build(device, &engine.shaders.temporal_reprojection);

        Self {
            pass,
            size: mip_size(buffers.full.size, mip),
        }
    }

    pub fn run(
        &self,
        renderer: &Renderer,
        encoder: &mut wgpu::CommandEncoder,
        alpha: f32,
        neighbourhood_scale: f32,
    ) {
        self.pass.run(
            renderer,
            encoder,
            workgroups_8x8(self.size),
            gpu::TemporalPassParams {
                size: self.size,
                alpha,
                neighbourhood_scale,
                tonemap: 1,
            },
        );
    }
}
