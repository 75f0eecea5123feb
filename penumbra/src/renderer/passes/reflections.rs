use crate::{
    gpu, workgroups_8x8, BilateralBlurPass, Config, DoubleBuffered,
    DoubleBufferedBindable, Engine, ReflectionsFeedback, Renderer,
    RendererBuffers, RendererComputePass, TemporalReprojectionPass, Texture,
};

/// Ray-traced glossy reflections.
///
/// Rays are traced at half resolution and reconstructed to full one with a
/// ratio estimator; the result is then accumulated by two temporal passes
/// (a fast one and a slow one) and blurred.
#[derive(Debug)]
pub struct ReflectionsPass {
    trace_pass: RendererComputePass<gpu::ReflectionTracePassParams>,
    reconstruct_pass: RendererComputePass<gpu::ReflectionReconstructPassParams>,
    temporal_pre_pass: TemporalReprojectionPass,
    temporal_main_pass: TemporalReprojectionPass,
    blur_pass: BilateralBlurPass,
}

impl ReflectionsPass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        config: &Config,
        buffers: &RendererBuffers,
    ) -> Self {
        let config = &config.reflections;
        let half = buffers.reflections_extent;

        let trace_pass = RendererComputePass::builder("reflections_trace")
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
                &buffers.albedo_metallic.curr().bind_readable_mip(half.mip),
                &buffers.normal_roughness.curr().bind_readable_mip(half.mip),
                &buffers.position.curr().bind_readable_mip(half.mip),
                &buffers.linear_z.curr().bind_readable_mip(half.mip),
                &buffers.refl_trace.bind_writable(),
            ])
            .build(device, &engine.shaders.reflections_trace);

        let reconstruct_pass =
            RendererComputePass::builder("reflections_reconstruct")
                .bind([
                    &buffers.camera.bind_readable(),
                    &buffers.albedo_metallic.curr().bind_readable(),
                    &buffers.normal_roughness.curr().bind_readable(),
                    &buffers.position.curr().bind_readable(),
                    &buffers.linear_z.curr().bind_readable(),
                    &buffers
                        .normal_roughness
                        .curr()
                        .bind_readable_mip(half.mip),
                    &buffers.position.curr().bind_readable_mip(half.mip),
                    &buffers.linear_z.curr().bind_readable_mip(half.mip),
                ])
                .bind([
                    &buffers.refl_trace.bind_readable(),
                    &buffers.refl_reconstructed.bind_writable(),
                ])
                .build(device, &engine.shaders.reflections_reconstruct);

        // Both temporal passes blend with whatever gets fed back
        let history: &DoubleBuffered<Texture> =
            match config.effective_feedback() {
                ReflectionsFeedback::TemporalMain => &buffers.refl_main,
                ReflectionsFeedback::Blur => &buffers.refl_blur,
            };

        let temporal_pre_pass = TemporalReprojectionPass::new(
            engine,
            device,
            "reflections_temporal_pre",
            buffers,
            0,
            &buffers.refl_reconstructed.bind_readable(),
            &history.prev().bind_readable(),
            &buffers.refl_pre.bind_writable(),
        );

        let main_input = if config.pre_pass {
            &buffers.refl_pre
        } else {
            &buffers.refl_reconstructed
        };

        let temporal_main_pass = TemporalReprojectionPass::new(
            engine,
            device,
            "reflections_temporal_main",
            buffers,
            0,
            &main_input.bind_readable(),
            &history.prev().bind_readable(),
            &buffers.refl_main.curr().bind_writable(),
        );

        let blur_pass = BilateralBlurPass::new(
            engine,
            device,
            "reflections_blur",
            buffers,
            0,
            &buffers.refl_main.curr().bind_readable(),
            &buffers.refl_blur.curr().bind_writable(),
        );

        Self {
            trace_pass,
            reconstruct_pass,
            temporal_pre_pass,
            temporal_main_pass,
            blur_pass,
        }
    }

    /// Returns the image that contains final reflections, as determined by
    /// the configuration.
    pub fn bind_output<'a>(
        config: &Config,
        buffers: &'a RendererBuffers,
    ) -> Box<dyn DoubleBufferedBindable + 'a> {
        let config = &config.reflections;

        if !config.denoise {
            Box::new(buffers.refl_reconstructed.bind_readable())
        } else if config.blur {
            Box::new(buffers.refl_blur.curr().bind_readable())
        } else {
            Box::new(buffers.refl_main.curr().bind_readable())
        }
    }

    pub fn run(&self, renderer: &Renderer, encoder: &mut wgpu::CommandEncoder) {
        let config = &renderer.config.reflections;
        let buffers = &renderer.buffers;
        let half = buffers.reflections_extent;
        let full = buffers.full;

        self.trace_pass.run(
            renderer,
            encoder,
            workgroups_8x8(half.size),
            gpu::ReflectionTracePassParams {
                size: half.size,
                frame: renderer.frame.get(),
                bias: config.bias,
                trim: config.trim,
            },
        );

        self.reconstruct_pass.run(
            renderer,
            encoder,
            workgroups_8x8(full.size),
            gpu::ReflectionReconstructPassParams {
                size: full.size,
                input_size: half.size,
                frame: renderer.frame.get(),
            },
        );

        if !config.denoise {
            return;
        }

        if config.pre_pass {
            self.temporal_pre_pass.run(
                renderer,
                encoder,
                config.pre_alpha,
                config.neighborhood_scale,
            );
        }

        self.temporal_main_pass.run(
            renderer,
            encoder,
            config.main_alpha,
            config.neighborhood_scale,
        );

        if config.blur {
            self.blur_pass.run(
                renderer,
                encoder,
                gpu::BilateralPassParams {
                    radius: config.blur_radius,
                    flags: gpu::BilateralPassParams::FLAG_DEPTH
                        | gpu::BilateralPassParams::FLAG_NORMAL
                        | gpu::BilateralPassParams::FLAG_ROUGHNESS_SIGMA,
                    sigma_min: config.sigma_min,
                    sigma_max: config.sigma_max,
                    phi_normal: config.phi_normal,
                    phi_color: config.phi_color,
                    ..Default::default()
                },
            );
        }
    }
}
