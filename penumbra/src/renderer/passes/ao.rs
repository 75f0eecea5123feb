use glam::{UVec2, Vec4};

use crate::{
    gpu, workgroups_8x8, ClearPass, Config, Engine, Renderer,
    RendererBuffers, RendererComputePass,
};

/// Ray-traced ambient occlusion.
///
/// Tiles that are unoccluded (or occluded) as a whole get written straight
/// into the output; output of the temporal pass goes through a separable
/// blur, but only within tiles that contain at least one occluded pixel.
/// Pixels whose history has just been restarted additionally go through a
/// wider blur.
#[derive(Debug)]
pub struct AoPass {
    trace_pass: RendererComputePass<gpu::AoTracePassParams>,
    reset_args_pass: RendererComputePass<()>,
    temporal_pass: RendererComputePass<gpu::AoTemporalPassParams>,
    clear_passes: [ClearPass; 2],
    blur_passes: [RendererComputePass<gpu::AoBlurPassParams>; 2],
    disocclusion_pass: RendererComputePass<gpu::AoDisocclusionPassParams>,
    unpack_pass: RendererComputePass<gpu::CopyTilesPassParams>,
    upsample_pass: RendererComputePass<gpu::UpsamplePassParams>,
}

impl AoPass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        _: &Config,
        buffers: &RendererBuffers,
    ) -> Self {
        let extent = buffers.ao_extent;
        let lists = &buffers.ao_lists;

        let trace_pass = RendererComputePass::builder("ao_trace")
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
                &buffers.ao_tiles.bind_writable(),
            ])
            .build(device, &engine.shaders.ao_trace);

        let reset_args_pass = RendererComputePass::builder("ao_reset_args")
            .bind([
                &lists.a_tiles.bind_writable(),
                &lists.a_args.bind_writable(),
                &lists.b_tiles.bind_writable(),
                &lists.b_args.bind_writable(),
            ])
            .build(device, &engine.shaders.tiles_reset_args);

        let [blur_a, blur_b] = &buffers.ao_blur;

        let temporal_pass = RendererComputePass::builder("ao_temporal")
            .bind([&buffers.bind_gbuffer_temporal(extent.mip)])
            .bind([
                &buffers.ao_tiles.bind_readable(),
                &buffers.ao_temporal.prev().bind_readable(),
                &buffers.ao_temporal.curr().bind_writable(),
                &blur_b.bind_writable(),
            ])
            .bind([
                &lists.a_tiles.bind_writable(),
                &lists.a_args.bind_writable(),
                &lists.b_tiles.bind_writable(),
                &lists.b_args.bind_writable(),
            ])
            .build(device, &engine.shaders.ao_temporal);

        let clear_passes = [("a", blur_a), ("b", blur_b)].map(|(label, blur)| {
            ClearPass::new(
                engine,
                device,
                &format!("ao_blur_{label}"),
                &blur.bind_writable(),
                blur.format(),
                extent.size,
            )
        });

        let horizontal_blur_pass =
            RendererComputePass::builder("ao_blur_horizontal")
                .bind([&buffers.bind_gbuffer_edges(extent.mip)])
                .bind([
                    &lists.a_tiles.bind_readable(),
                    &buffers.ao_temporal.curr().bind_readable(),
                    &blur_a.bind_writable(),
                ])
                .build(device, &engine.shaders.ao_blur);

        let vertical_blur_pass =
            RendererComputePass::builder("ao_blur_vertical")
                .bind([&buffers.bind_gbuffer_edges(extent.mip)])
                .bind([
                    &lists.a_tiles.bind_readable(),
                    &blur_a.bind_readable(),
                    &blur_b.bind_writable(),
                ])
                .build(device, &engine.shaders.ao_blur);

        let disocclusion_pass =
            RendererComputePass::builder("ao_disocclusion_blur")
                .bind([&buffers.bind_gbuffer_edges(extent.mip)])
                .bind([
                    &lists.b_tiles.bind_readable(),
                    &buffers.ao_temporal.curr().bind_readable(),
                    &blur_b.bind_writable(),
                ])
                .build(device, &engine.shaders.ao_disocclusion_blur);

        let unpack_pass = RendererComputePass::builder("ao_unpack")
            .bind([&buffers.ao_tiles.bind_readable(), &blur_b.bind_writable()])
            .build(device, &engine.shaders.ao_unpack);

        let upsample_pass = RendererComputePass::builder("ao_upsample")
            .bind([&buffers.bind_gbuffer_upsample(extent)])
            .bind([&blur_b.bind_readable(), &buffers.ao.bind_writable()])
            .build(device, &engine.shaders.upsample_scalar);

        Self {
            trace_pass,
            reset_args_pass,
            temporal_pass,
            clear_passes,
            blur_passes: [horizontal_blur_pass, vertical_blur_pass],
            disocclusion_pass,
            unpack_pass,
            upsample_pass,
        }
    }

    pub fn run(&self, renderer: &Renderer, encoder: &mut wgpu::CommandEncoder) {
        let config = &renderer.config.ao;
        let buffers = &renderer.buffers;
        let extent = buffers.ao_extent;
        let lists = &buffers.ao_lists;
        let size = extent.size;
        let tiles = gpu::tile_count(size);

        self.trace_pass.run(
            renderer,
            encoder,
            tiles,
            gpu::AoTracePassParams {
                size,
                frame: renderer.frame.get(),
                rays_per_pixel: config.rays_per_pixel,
                ray_length: config.ray_length,
                bias: config.bias,
            },
        );

        if config.denoise {
            self.reset_args_pass.run(renderer, encoder, UVec2::ONE, ());

            // Tiles that don't get blurred are either uniform (written by the
            // temporal pass) or have no occluded pixels
            for pass in &self.clear_passes {
                pass.run(renderer, encoder, Vec4::ONE);
            }

            self.temporal_pass.run(
                renderer,
                encoder,
                tiles,
                gpu::AoTemporalPassParams {
                    size,
                    alpha: config.alpha,
                    disocclusion_threshold: config.disocclusion_threshold,
                },
            );

            let directions =
                [gpu::BlurDirection::Horizontal, gpu::BlurDirection::Vertical];

            for (pass, direction) in self.blur_passes.iter().zip(directions) {
                pass.run_indirect(
                    renderer,
                    encoder,
                    lists.a_args.buffer(),
                    gpu::AoBlurPassParams {
                        size,
                        radius: config.blur_radius,
                        direction: direction.as_u32(),
                    },
                );
            }

            if config.disocclusion_blur {
                self.disocclusion_pass.run_indirect(
                    renderer,
                    encoder,
                    lists.b_args.buffer(),
                    gpu::AoDisocclusionPassParams {
                        size,
                        radius: config.disocclusion_radius,
                        threshold: config.disocclusion_threshold,
                    },
                );
            }
        } else {
            self.unpack_pass.run(
                renderer,
                encoder,
                workgroups_8x8(size),
                gpu::CopyTilesPassParams { size },
            );
        }

        self.upsample_pass.run(
            renderer,
            encoder,
            workgroups_8x8(buffers.full.size),
            gpu::UpsamplePassParams {
                size: buffers.full.size,
                input_size: size,
                scale: extent.scale(),
                power: config.upsample_power,
            },
        );
    }
}
