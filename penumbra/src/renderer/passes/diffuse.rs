use crate::{
    gpu, workgroups_8x8, BilateralBlurPass, Config, Engine, Renderer,
    RendererBuffers, RendererComputePass, TemporalReprojectionPass,
};

/// Ray-traced diffuse illumination, denoised with the generic temporal
/// reprojection followed by the bilateral blur.
#[derive(Debug)]
pub struct DiffusePass {
    trace_pass: RendererComputePass<gpu::GiTracePassParams>,
    temporal_pass: TemporalReprojectionPass,
    blur_pass: BilateralBlurPass,
    upsample_pass: RendererComputePass<gpu::UpsamplePassParams>,
}

impl DiffusePass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        config: &Config,
        buffers: &RendererBuffers,
    ) -> Self {
        let extent = buffers.diffuse_extent;

        let trace_pass = RendererComputePass::builder("diffuse_trace")
            .bind([
                &engine.scene.bind_triangles(),
                &engine.scene.bind_bvh(),
                &engine.scene.bind_materials(),
                &engine.noise.bind_sobol(),
                &engine.noise.bind_scrambling_tile(),
                &engine.noise.bind_ranking_tile(),
                &engine.world.bind_readable(),
                &engine.env_map.bind_readable(),
            ])
            .bind([
                &buffers.camera.bind_readable(),
                &buffers.normal_roughness.curr().bind_readable_mip(extent.mip),
                &buffers.position.curr().bind_readable_mip(extent.mip),
                &buffers.linear_z.curr().bind_readable_mip(extent.mip),
                &buffers.gi_trace.bind_writable(),
            ])
            .build(device, &engine.shaders.diffuse_trace);

        let history = if config.diffuse.use_blur_as_temporal_input {
            &buffers.gi_blur
        } else {
            &buffers.gi_temporal
        };

        let temporal_pass = TemporalReprojectionPass::new(
            engine,
            device,
            "diffuse_temporal",
            buffers,
            extent.mip,
            &buffers.gi_trace.bind_readable(),
            &history.prev().bind_readable(),
            &buffers.gi_temporal.curr().bind_writable(),
        );

        let blur_pass = BilateralBlurPass::new(
            engine,
            device,
            "diffuse_blur",
            buffers,
            extent.mip,
            &buffers.gi_temporal.curr().bind_readable(),
            &buffers.gi_blur.curr().bind_writable(),
        );

        let upsample_pass = RendererComputePass::builder("diffuse_upsample")
            .bind([&buffers.bind_gbuffer_upsample(extent)])
            .bind([
                &buffers.gi_blur.curr().bind_readable(),
                &buffers.gi.bind_writable(),
            ])
            .build(device, &engine.shaders.upsample_color);

        Self {
            trace_pass,
            temporal_pass,
            blur_pass,
            upsample_pass,
        }
    }

    pub fn run(&self, renderer: &Renderer, encoder: &mut wgpu::CommandEncoder) {
        let config = &renderer.config.diffuse;
        let buffers = &renderer.buffers;
        let extent = buffers.diffuse_extent;

        self.trace_pass.run(
            renderer,
            encoder,
            workgroups_8x8(extent.size),
            gpu::GiTracePassParams {
                size: extent.size,
                frame: renderer.frame.get(),
                bias: config.bias,
            },
        );

        self.temporal_pass.run(
            renderer,
            encoder,
            config.alpha,
            config.neighborhood_scale,
        );

        // Irradiance is smooth, so it's enough to respect geometric edges
        self.blur_pass.run(
            renderer,
            encoder,
            gpu::BilateralPassParams {
                radius: config.blur_radius,
                flags: gpu::BilateralPassParams::FLAG_DEPTH
                    | gpu::BilateralPassParams::FLAG_NORMAL,
                phi_normal: 32.0,
                ..Default::default()
            },
        );

        self.upsample_pass.run(
            renderer,
            encoder,
            workgroups_8x8(buffers.full.size),
            gpu::UpsamplePassParams {
                size: buffers.full.size,
                input_size: extent.size,
                scale: extent.scale(),
                power: 1.0,
            },
        );
    }
}
