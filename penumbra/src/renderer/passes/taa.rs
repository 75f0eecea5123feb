use crate::{
    gpu, workgroups_8x8, Config, Engine, Renderer, RendererBuffers,
    RendererComputePass,
};

#[derive(Debug)]
pub struct TaaPass {
    pass: RendererComputePass<gpu::TaaPassParams>,
}

impl TaaPass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        _: &Config,
        buffers: &RendererBuffers,
    ) -> Self {
        let pass = RendererComputePass::builder("taa")
            .bind([
                &buffers.camera.bind_readable(),
                &buffers.position.curr().bind_readable(),
                &buffers.depth.curr().bind_readable(),
            ])
            .bind([
                &buffers.hdr.bind_readable(),
                &buffers.taa.prev().bind_readable(),
                &buffers.taa.curr().bind_writable(),
            ])
            .build(device, &engine.shaders.taa);

        Self { pass }
    }

    pub fn run(&self, renderer: &Renderer, encoder: &mut wgpu::CommandEncoder) {
        let config = &renderer.config.taa;
        let size = renderer.buffers.full.size;

        self.pass.run(
            renderer,
            encoder,
            workgroups_8x8(size),
            gpu::TaaPassParams {
                size,
                feedback_min: config.feedback_min,
                feedback_max: config.feedback_max,
                sharpen: config.sharpen as u32,
                reset: renderer.taa.needs_reset() as u32,
            },
        );
    }
}
