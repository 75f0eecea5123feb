use glam::{UVec2, Vec4};

use crate::{
    gpu, workgroups_8x8, ClearPass, Config, Engine, Renderer,
    RendererBuffers, RendererComputePass,
};

/// Ray-traced shadows of the scene's light, denoised with a tile-indirect
/// variant of SVGF.
///
/// Tracing packs visibility into one bit per pixel; the temporal pass then
/// splits tiles into uniform ones (which skip filtering and get copied as
/// they are) and the rest, which go through the à-trous iterations.
#[derive(Debug)]
pub struct ShadowsPass {
    trace_pass: RendererComputePass<gpu::ShadowTracePassParams>,
    reset_args_pass: RendererComputePass<()>,
    temporal_pass: RendererComputePass<gpu::ShadowTemporalPassParams>,
    iterations: Vec<AtrousIteration>,
    unpack_pass: RendererComputePass<gpu::CopyTilesPassParams>,
    upsample_pass: RendererComputePass<gpu::UpsamplePassParams>,
}

#[derive(Debug)]
struct AtrousIteration {
    /// Which of the ping-pong images this iteration writes to
    target: usize,
    clear_pass: ClearPass,
    copy_tiles_pass: RendererComputePass<gpu::CopyTilesPassParams>,
    atrous_pass: RendererComputePass<gpu::ShadowAtrousPassParams>,
}

impl ShadowsPass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        config: &Config,
        buffers: &RendererBuffers,
    ) -> Self {
        let extent = buffers.shadows_extent;
        let lists = &buffers.shadow_lists;

        let trace_pass = RendererComputePass::builder("shadows_trace")
            .bind([
                &engine.scene.bind_triangles(),
                &engine.scene.bind_bvh(),
                &engine.noise.bind_sobol(),
                &engine.noise.bind_scrambling_tile(),
                &engine.noise.bind_ranking_tile(),
            ])
            .bind([
                &buffers.camera.bind_readable(),
                &buffers.normal_roughness.curr().bind_readable_mip(extent.mip),
                &buffers.position.curr().bind_readable_mip(extent.mip),
                &buffers.linear_z.curr().bind_readable_mip(extent.mip),
                &buffers.shadow_tiles.bind_writable(),
            ])
            .build(device, &engine.shaders.shadows_trace);

        let reset_args_pass =
            RendererComputePass::builder("shadows_reset_args")
                .bind([
                    &lists.a_tiles.bind_writable(),
                    &lists.a_args.bind_writable(),
                    &lists.b_tiles.bind_writable(),
                    &lists.b_args.bind_writable(),
                ])
                .build(device, &engine.shaders.tiles_reset_args);

        let temporal_pass = RendererComputePass::builder("shadows_temporal")
            .bind([&buffers.bind_gbuffer_temporal(extent.mip)])
            .bind([
                &buffers.shadow_tiles.bind_readable(),
                &buffers.shadow_history.prev().bind_readable(),
                &buffers.shadow_moments.prev().bind_readable(),
                &buffers.shadow_temporal.bind_writable(),
                &buffers.shadow_moments.curr().bind_writable(),
            ])
            .bind([
                &lists.a_tiles.bind_writable(),
                &lists.a_args.bind_writable(),
                &lists.b_tiles.bind_writable(),
                &lists.b_args.bind_writable(),
            ])
            .build(device, &engine.shaders.shadows_temporal);

        let iterations = (0..config.shadows.iterations)
            .map(|iteration| {
                let input = match iteration {
                    0 => &buffers.shadow_temporal,
                    n => &buffers.shadow_atrous[(n as usize - 1) % 2],
                };

                let target = iteration as usize % 2;
                let output = &buffers.shadow_atrous[target];

                let clear_pass = ClearPass::new(
                    engine,
                    device,
                    &format!("shadows_atrous_{iteration}"),
                    &output.bind_writable(),
                    output.format(),
                    extent.size,
                );

                let copy_tiles_pass = RendererComputePass::builder(format!(
                    "shadows_copy_tiles_{iteration}"
                ))
                .bind([
                    &lists.b_tiles.bind_readable(),
                    &input.bind_readable(),
                    &output.bind_writable(),
                ])
                .build(device, &engine.shaders.shadows_copy_tiles);

                let atrous_pass = RendererComputePass::builder(format!(
                    "shadows_atrous_{iteration}"
                ))
                .bind([&buffers.bind_gbuffer_edges(extent.mip)])
                .bind([
                    &lists.a_tiles.bind_readable(),
                    &input.bind_readable(),
                    &output.bind_writable(),
                ])
                .build(device, &engine.shaders.shadows_atrous);

                AtrousIteration {
                    target,
                    clear_pass,
                    copy_tiles_pass,
                    atrous_pass,
                }
            })
            .collect::<Vec<_>>();

        let unpack_pass = RendererComputePass::builder("shadows_unpack")
            .bind([
                &buffers.shadow_tiles.bind_readable(),
                &buffers.shadow_atrous[0].bind_writable(),
            ])
            .build(device, &engine.shaders.shadows_unpack);

        let upsample_input = match iterations.last() {
            Some(iteration) if config.shadows.denoise => iteration.target,
            _ => 0,
        };

        let upsample_pass = RendererComputePass::builder("shadows_upsample")
            .bind([&buffers.bind_gbuffer_upsample(extent)])
            .bind([
                &buffers.shadow_atrous[upsample_input].bind_readable(),
                &buffers.shadows.bind_writable(),
            ])
            .build(device, &engine.shaders.upsample_scalar);

        Self {
            trace_pass,
            reset_args_pass,
            temporal_pass,
            iterations,
            unpack_pass,
            upsample_pass,
        }
    }

    pub fn run(&self, renderer: &Renderer, encoder: &mut wgpu::CommandEncoder) {
        let config = &renderer.config.shadows;
        let buffers = &renderer.buffers;
        let extent = buffers.shadows_extent;
        let lists = &buffers.shadow_lists;
        let tiles = gpu::tile_count(extent.size);

        self.trace_pass.run(
            renderer,
            encoder,
            tiles,
            gpu::ShadowTracePassParams {
                size: extent.size,
                frame: renderer.frame.get(),
                bias: config.bias,
            },
        );

        if config.denoise {
            self.reset_args_pass.run(renderer, encoder, UVec2::ONE, ());

            self.temporal_pass.run(
                renderer,
                encoder,
                tiles,
                gpu::ShadowTemporalPassParams {
                    size: extent.size,
                    alpha: config.alpha,
                    moments_alpha: config.moments_alpha,
                },
            );

            for (nth, iteration) in self.iterations.iter().enumerate() {
                let size = extent.size;

                iteration.clear_pass.run(renderer, encoder, Vec4::ONE);

                iteration.copy_tiles_pass.run_indirect(
                    renderer,
                    encoder,
                    lists.b_args.buffer(),
                    gpu::CopyTilesPassParams { size },
                );

                iteration.atrous_pass.run_indirect(
                    renderer,
                    encoder,
                    lists.a_args.buffer(),
                    gpu::ShadowAtrousPassParams {
                        size,
                        step: 1 << nth,
                        phi_visibility: config.phi_visibility,
                        phi_normal: config.phi_normal,
                        sigma_depth: config.sigma_depth,
                    },
                );

                if nth as u32 == config.feedback_iteration {
                    buffers.shadow_atrous[iteration.target].copy_to(
                        encoder,
                        buffers.shadow_history.get(renderer.is_alternate()),
                    );
                }
            }
        } else {
            self.unpack_pass.run(
                renderer,
                encoder,
                workgroups_8x8(extent.size),
                gpu::CopyTilesPassParams { size: extent.size },
            );
        }

        self.upsample_pass.run(
            renderer,
            encoder,
            workgroups_8x8(buffers.full.size),
            gpu::UpsamplePassParams {
                size: buffers.full.size,
                input_size: extent.size,
                scale: extent.scale(),
                power: config.power,
            },
        );
    }
}
