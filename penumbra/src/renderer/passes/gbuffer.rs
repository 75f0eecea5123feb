use std::mem;

use log::debug;

use crate::{
    gpu, push_constant_ranges, BindGroup, Config, Engine, Renderer,
    RendererBuffers,
};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Formats of the color attachments, in the order the fragment shader writes
/// them.
const TARGETS: [wgpu::TextureFormat; 5] = [
    wgpu::TextureFormat::Rgba8Unorm,
    wgpu::TextureFormat::Rgba16Float,
    wgpu::TextureFormat::Rgba32Float,
    wgpu::TextureFormat::Rgba32Float,
    wgpu::TextureFormat::R32Float,
];

/// Rasterizes the scene into the current side of the G-Buffer.
#[derive(Debug)]
pub struct GBufferPass {
    bg0: BindGroup,
    pipeline: wgpu::RenderPipeline,
}

impl GBufferPass {
    pub fn new(
        engine: &Engine,
        device: &wgpu::Device,
        _: &Config,
        buffers: &RendererBuffers,
    ) -> Self {
        debug!("Initializing pass: gbuffer");

        let bg0 = BindGroup::builder("gbuffer_bg0")
            .add(&buffers.camera.bind_readable())
            .add(&engine.scene.bind_materials())
            .build(device);

        let push_constant_ranges = push_constant_ranges::<
            gpu::GBufferPassParams,
        >(wgpu::ShaderStages::FRAGMENT);

        let pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("penumbra_gbuffer_pipeline_layout"),
                bind_group_layouts: &[bg0.layout()],
                push_constant_ranges: &push_constant_ranges,
            });

        let (vs_module, vs_entry_point) = &engine.shaders.gbuffer_vs;
        let (fs_module, fs_entry_point) = &engine.shaders.gbuffer_fs;

        let targets = TARGETS.map(|format| {
            Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })
        });

        let pipeline =
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("penumbra_gbuffer_pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: vs_module,
                    entry_point: vs_entry_point,
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: gpu::Triangle::VERTEX_STRIDE,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &[
                            // position (xyz)
                            wgpu::VertexAttribute {
                                offset: 0,
                                shader_location: 0,
                                format: wgpu::VertexFormat::Float32x4,
                            },
                            // normal (xyz)
                            wgpu::VertexAttribute {
                                offset: (4 * mem::size_of::<f32>()) as _,
                                shader_location: 1,
                                format: wgpu::VertexFormat::Float32x4,
                            },
                        ],
                    }],
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    // Back faces get their normals flipped by the fragment
                    // shader
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: fs_module,
                    entry_point: fs_entry_point,
                    targets: &targets,
                }),
                multiview: None,
            });

        Self { bg0, pipeline }
    }

    pub fn run(
        &self,
        engine: &Engine,
        renderer: &Renderer,
        encoder: &mut wgpu::CommandEncoder,
    ) {
        let alternate = renderer.is_alternate();
        let buffers = &renderer.buffers;

        // Zero in `linear_z` marks pixels without any surface
        let attachment = |view, clear: wgpu::Color| {
            Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: true,
                },
            })
        };

        let max_depth = wgpu::Color {
            r: 1.0,
            ..wgpu::Color::BLACK
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("penumbra_gbuffer_pass"),
            color_attachments: &[
                attachment(
                    buffers.albedo_metallic.get(alternate).view(),
                    wgpu::Color::BLACK,
                ),
                attachment(
                    buffers.normal_roughness.get(alternate).view(),
                    wgpu::Color::BLACK,
                ),
                attachment(
                    buffers.position.get(alternate).view(),
                    wgpu::Color::BLACK,
                ),
                attachment(
                    buffers.linear_z.get(alternate).view(),
                    wgpu::Color::BLACK,
                ),
                attachment(buffers.depth.get(alternate).view(), max_depth),
            ],
            depth_stencil_attachment: Some(
                wgpu::RenderPassDepthStencilAttachment {
                    view: &buffers.depth_attachment,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: true,
                    }),
                    stencil_ops: None,
                },
            ),
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, self.bg0.get(alternate), &[]);

        for instance in &engine.scene.instances {
            let params = gpu::GBufferPassParams {
                object_id: instance.object_id,
                material_id: instance.material_id,
            };

            let vertices = 3 * instance.triangles.len() as u32;

            pass.set_vertex_buffer(
                0,
                engine.scene.triangles.slice(instance.triangles.clone()),
            );

            pass.set_push_constants(
                wgpu::ShaderStages::FRAGMENT,
                0,
                bytemuck::bytes_of(&params),
            );

            pass.draw(0..vertices, 0..1);
        }
    }
}
