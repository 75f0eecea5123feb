use glam::{vec4, Vec4};

use crate::{
    ClearPass, Config, DoubleBuffered, Engine, Renderer, RendererBuffers,
    Texture,
};

/// Clears the history side of double-buffered images before the very first
/// frame (and after they've been reallocated or the passes reading them have
/// been rebuilt), so that temporal passes see neutral values instead of
/// garbage.
#[derive(Debug)]
pub struct HistoryPass {
    clears: Vec<(ClearPass, Vec4)>,
}

impl HistoryPass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        _: &Config,
        buffers: &RendererBuffers,
    ) -> Self {
        let lit = vec4(1.0, 0.0, 0.0, 0.0);

        let images: [(&str, &DoubleBuffered<Texture>, Vec4); 9] = [
            ("shadow_moments", &buffers.shadow_moments, Vec4::ZERO),
            ("shadow_history", &buffers.shadow_history, lit),
            ("ao_temporal", &buffers.ao_temporal, lit),
            ("refl_main", &buffers.refl_main, Vec4::ZERO),
            ("refl_blur", &buffers.refl_blur, Vec4::ONE),
            ("gi_temporal", &buffers.gi_temporal, Vec4::ZERO),
            ("gi_blur", &buffers.gi_blur, Vec4::ONE),
            ("taa", &buffers.taa, Vec4::ZERO),
            ("gt_accum", &buffers.gt_accum, Vec4::ZERO),
        ];

        let mut clears = Vec::new();

        for (label, image, value) in images {
            let texture = image.get(false);

            let pass = ClearPass::new(
                engine,
                device,
                &format!("{label}_history"),
                &image.prev().bind_writable(),
                texture.format(),
                texture.size(),
            );

            clears.push((pass, value));
        }

        // Zeroed depth makes reprojection reject the history everywhere
        let linear_z = buffers.linear_z.get(false);

        for mip in 0..linear_z.mips() {
            let pass = ClearPass::new(
                engine,
                device,
                &format!("linear_z_history_{mip}"),
                &buffers.linear_z.prev().bind_writable_mip(mip),
                linear_z.format(),
                linear_z.mip_size(mip),
            );

            clears.push((pass, Vec4::ZERO));
        }

        Self { clears }
    }

    pub fn run(&self, renderer: &Renderer, encoder: &mut wgpu::CommandEncoder) {
        for (pass, value) in &self.clears {
            pass.run(renderer, encoder, *value);
        }
    }
}
