use glam::{UVec2, Vec4};

use crate::{
    gpu, workgroups_8x8, DoubleBufferedBindable, Engine, Renderer,
    RendererComputePass,
};

/// Fills an image (or one of its mips) with a constant value.
#[derive(Debug)]
pub struct ClearPass {
    pass: RendererComputePass<gpu::ClearPassParams>,
    size: UVec2,
}

impl ClearPass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        label: &str,
        target: &dyn DoubleBufferedBindable,
        format: wgpu::TextureFormat,
        size: UVec2,
    ) -> Self {
        let shader = match format {
            wgpu::TextureFormat::Rgba16Float => &engine.shaders.clear_rgba16,
            wgpu::TextureFormat::Rgba32Float => &engine.shaders.clear_rgba32,
            format => panic!("Cannot clear texture `{label}` of {format:?}"),
        };

        let pass = RendererComputePass::builder(format!("clear_{label}"))
            .bind([target])
            .build(device, shader);

        Self { pass, size }
    }

    pub fn run(
        &self,
        renderer: &Renderer,
        encoder: &mut wgpu::CommandEncoder,
        value: Vec4,
    ) {
        self.pass.run(
            renderer,
            encoder,
            workgroups_8x8(self.size),
            gpu::ClearPassParams {
                value,
                size: self.size,
                _pad: Default::default(),
            },
        );
    }
}
