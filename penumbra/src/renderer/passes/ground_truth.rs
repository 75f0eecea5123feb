use rand::Rng;

use crate::{
    gpu, workgroups_8x8, Config, Engine, Renderer, RendererBuffers,
    RendererComputePass,
};

/// Progressive path tracer, used as the reference image the real-time
/// effects can be compared against.
#[derive(Debug)]
pub struct GroundTruthPass {
    pass: RendererComputePass<gpu::GroundTruthPassParams>,
}

impl GroundTruthPass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        _: &Config,
        buffers: &RendererBuffers,
    ) -> Self {
        let pass = RendererComputePass::builder("ground_truth")
            .bind([
                &engine.scene.bind_triangles(),
                &engine.scene.bind_bvh(),
                &engine.scene.bind_materials(),
                &engine.world.bind_readable(),
                &engine.env_map.bind_readable(),
            ])
            .bind([
                &buffers.camera.bind_readable(),
                &buffers.gt_accum.prev().bind_readable(),
                &buffers.gt_accum.curr().bind_writable(),
                &buffers.gt_output.bind_writable(),
            ])
            .build(device, &engine.shaders.ground_truth);

        Self { pass }
    }

    pub fn run(&self, renderer: &Renderer, encoder: &mut wgpu::CommandEncoder) {
        let size = renderer.buffers.full.size;

        self.pass.run(
            renderer,
            encoder,
            workgroups_8x8(size),
            gpu::GroundTruthPassParams {
                size,
                frame_idx: renderer.ground_truth.frame_idx(),
                seed: rand::thread_rng().gen(),
                max_bounces: renderer.config.ground_truth.max_ray_bounces,
            },
        );
    }
}
