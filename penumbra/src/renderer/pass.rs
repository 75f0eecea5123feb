use std::marker::PhantomData;
use std::mem;
use std::ops::Range;

use bytemuck::Pod;
use glam::UVec2;
use log::{debug, trace};

use crate::{
    BindGroup, BindGroupBuilder, DoubleBufferedBindable, Renderer, Shader,
};

/// Compute pipeline together with its bind groups and push constants `P`.
#[derive(Debug)]
pub struct RendererComputePass<P> {
    label: String,
    bind_groups: Vec<BindGroup>,
    pipeline: wgpu::ComputePipeline,
    _params: PhantomData<P>,
}

impl<P> RendererComputePass<P>
where
    P: Pod,
{
    pub fn builder<'a>(label: impl ToString) -> RendererPassBuilder<'a, P> {
        RendererPassBuilder {
            label: label.to_string(),
            bind_groups: Default::default(),
            _params: Default::default(),
        }
    }

    /// Dispatches `size` workgroups.
    pub fn run(
        &self,
        renderer: &Renderer,
        encoder: &mut wgpu::CommandEncoder,
        size: UVec2,
        params: P,
    ) {
        trace!("Dispatching {}: {}x{}", self.label, size.x, size.y);

        let mut pass = self.begin(renderer, encoder, params);

        pass.dispatch_workgroups(size.x, size.y, 1);
    }

    /// Dispatches as many workgroups as the `args` buffer says, which is how
    /// the tile lists get processed.
    pub fn run_indirect(
        &self,
        renderer: &Renderer,
        encoder: &mut wgpu::CommandEncoder,
        args: &wgpu::Buffer,
        params: P,
    ) {
        trace!("Dispatching {} (indirect)", self.label);

        let mut pass = self.begin(renderer, encoder, params);

        pass.dispatch_workgroups_indirect(args, 0);
    }

    fn begin<'a>(
        &'a self,
        renderer: &Renderer,
        encoder: &'a mut wgpu::CommandEncoder,
        params: P,
    ) -> wgpu::ComputePass<'a> {
        let label = format!("penumbra_{}_pass", self.label);

        let mut pass =
            encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(&label),
            });

        pass.set_pipeline(&self.pipeline);

        if mem::size_of::<P>() > 0 {
            pass.set_push_constants(0, bytemuck::bytes_of(&params));
        }

        for (bind_group_idx, bind_group) in self.bind_groups.iter().enumerate()
        {
            pass.set_bind_group(
                bind_group_idx as u32,
                bind_group.get(renderer.is_alternate()),
                &[],
            );
        }

        pass
    }
}

pub struct RendererPassBuilder<'a, P> {
    label: String,
    bind_groups: Vec<BindGroupBuilder<'a>>,
    _params: PhantomData<P>,
}

impl<'a, P> RendererPassBuilder<'a, P>
where
    P: Pod,
{
    /// Adds a bind group, consisting of given items.
    pub fn bind<const N: usize>(
        mut self,
        items: [&'a dyn DoubleBufferedBindable; N],
    ) -> Self {
        let mut bind_group = BindGroup::builder(format!(
            "{}_bg{}",
            self.label,
            self.bind_groups.len()
        ));

        for item in items {
            bind_group = bind_group.add(item);
        }

        self.bind_groups.push(bind_group);
        self
    }

    pub fn build(
        self,
        device: &wgpu::Device,
        (module, entry_point): &Shader,
    ) -> RendererComputePass<P> {
        debug!("Initializing pass: {}:{}", self.label, entry_point);

        let bind_groups: Vec<_> = self
            .bind_groups
            .into_iter()
            .map(|bg| bg.build(device))
            .collect();

        let bind_group_layouts: Vec<_> =
            bind_groups.iter().map(|bg| bg.layout()).collect();

        let push_constant_ranges = push_constant_ranges::<P>(
            wgpu::ShaderStages::COMPUTE,
        );

        let pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&format!(
                    "penumbra_{}_pipeline_layout",
                    self.label
                )),
                bind_group_layouts: &bind_group_layouts,
                push_constant_ranges: &push_constant_ranges,
            });

        let pipeline =
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(&format!("penumbra_{}_pipeline", self.label)),
                layout: Some(&pipeline_layout),
                module,
                entry_point,
            });

        RendererComputePass {
            label: self.label,
            bind_groups,
            pipeline,
            _params: PhantomData,
        }
    }
}

/// Returns push-constant ranges for a pipeline parametrized with `P`; empty
/// for zero-sized parameters.
pub fn push_constant_ranges<P>(
    stages: wgpu::ShaderStages,
) -> Vec<wgpu::PushConstantRange> {
    if mem::size_of::<P>() > 0 {
        vec![wgpu::PushConstantRange {
            stages,
            range: Range {
                start: 0,
                end: mem::size_of::<P>() as u32,
            },
        }]
    } else {
        vec![]
    }
}

/// Returns how many 8x8 workgroups cover an image of given size.
pub fn workgroups_8x8(size: UVec2) -> UVec2 {
    (size + 7) / 8
}

#[cfg(test)]
mod tests {
    use glam::uvec2;

    use super::*;
    use crate::gpu;

    #[test]
    fn workgroups() {
        assert_eq!(uvec2(1, 1), workgroups_8x8(uvec2(1, 1)));
        assert_eq!(uvec2(1, 1), workgroups_8x8(uvec2(8, 8)));
        assert_eq!(uvec2(2, 1), workgroups_8x8(uvec2(9, 8)));
        assert_eq!(uvec2(240, 135), workgroups_8x8(uvec2(1920, 1080)));
    }

    #[test]
    fn push_constants() {
        let ranges = push_constant_ranges::<gpu::TaaPassParams>(
            wgpu::ShaderStages::COMPUTE,
        );

        assert_eq!(1, ranges.len());
        assert_eq!(0..24, ranges[0].range);
        assert!(push_constant_ranges::<()>(wgpu::ShaderStages::COMPUTE)
            .is_empty());
    }
}
