use crate::{
    gpu, workgroups_8x8, Config, Engine, ReflectionsPass, Renderer,
    RendererBuffers, RendererComputePass,
};

/// Combines G-Buffer with all of the effects into the HDR image (or into a
/// single effect's image, depending on the visualization).
#[derive(Debug)]
pub struct DeferredShadingPass {
    pass: RendererComputePass<gpu::ShadingPassParams>,
}

impl DeferredShadingPass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        config: &Config,
        buffers: &RendererBuffers,
    ) -> Self {
        let reflections = ReflectionsPass::bind_output(config, buffers);

        let pass = RendererComputePass::builder("deferred_shading")
            .bind([
                &buffers.camera.bind_readable(),
                &engine.world.bind_readable(),
                &engine.env_map.bind_readable(),
                &buffers.albedo_metallic.curr().bind_readable(),
                &buffers.normal_roughness.curr().bind_readable(),
                &buffers.position.curr().bind_readable(),
                &buffers.linear_z.curr().bind_readable(),
            ])
            .bind([
                &buffers.shadows.bind_readable(),
                &buffers.ao.bind_readable(),
                &*reflections,
                &buffers.gi.bind_readable(),
                &buffers.hdr.bind_writable(),
            ])
            .build(device, &engine.shaders.deferred_shading);

        Self { pass }
    }

    pub fn run(&self, renderer: &Renderer, encoder: &mut wgpu::CommandEncoder) {
        let size = renderer.buffers.full.size;

        self.pass.run(
            renderer,
            encoder,
            workgroups_8x8(size),
            gpu::ShadingPassParams {
                size,
                visualization: renderer.config.visualization.serialize(),
                effects: renderer.config.effects(),
            },
        );
    }
}
