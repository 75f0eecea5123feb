use std::mem;

use glam::UVec2;
use log::debug;

use crate::{
    gpu, mip_size, Bindings, Camera, Config, DoubleBuffered,
    MappedUniformBuffer, RayTraceScale, Texture, UnmappedStorageBuffer,
};

/// Number of mips of each G-Buffer image.
pub const GBUFFER_MIPS: u32 = 9;

/// Images and buffers of a single renderer.
///
/// Everything here is sized after the camera and the configured ray-trace
/// scales; changing any of them reallocates the whole set.
#[derive(Debug)]
pub struct RendererBuffers {
    pub camera: MappedUniformBuffer<gpu::Camera>,

    pub full: Extent,
    pub shadows_extent: Extent,
    pub ao_extent: Extent,
    pub reflections_extent: Extent,
    pub diffuse_extent: Extent,

    // G-Buffer
    pub albedo_metallic: DoubleBuffered<Texture>,
    pub normal_roughness: DoubleBuffered<Texture>,
    pub position: DoubleBuffered<Texture>,
    pub linear_z: DoubleBuffered<Texture>,
    pub depth: DoubleBuffered<Texture>,
    pub depth_attachment: wgpu::TextureView,

    // Shadows
    pub shadow_tiles: Texture,
    pub shadow_lists: TileLists,
    pub shadow_temporal: Texture,
    pub shadow_moments: DoubleBuffered<Texture>,
    pub shadow_history: DoubleBuffered<Texture>,
    pub shadow_atrous: [Texture; 2],
    pub shadows: Texture,

    // Ambient occlusion
    pub ao_tiles: Texture,
    pub ao_lists: TileLists,
    pub ao_temporal: DoubleBuffered<Texture>,
    pub ao_blur: [Texture; 2],
    pub ao: Texture,

    // Reflections
    pub refl_trace: Texture,
    pub refl_reconstructed: Texture,
    pub refl_pre: Texture,
    pub refl_main: DoubleBuffered<Texture>,
    pub refl_blur: DoubleBuffered<Texture>,

    // Diffuse illumination
    pub gi_trace: Texture,
    pub gi_temporal: DoubleBuffered<Texture>,
    pub gi_blur: DoubleBuffered<Texture>,
    pub gi: Texture,

    // Output
    pub hdr: Texture,
    pub taa: DoubleBuffered<Texture>,
    pub gt_accum: DoubleBuffered<Texture>,
    pub gt_output: Texture,
    pub output: Texture,
}

impl RendererBuffers {
    pub fn new(
        device: &wgpu::Device,
        camera: &Camera,
        config: &Config,
        camera_data: gpu::Camera,
    ) -> Self {
        debug!("Initializing renderer buffers: {}", camera.describe());

        let size = camera.size.max(UVec2::ONE);

        let gbuffer = |label: &str, format| {
            DoubleBuffered::new(|suffix| {
                Texture::builder(format!("{label}_{suffix}"))
                    .with_size(size)
                    .with_format(format)
                    .with_mips(GBUFFER_MIPS)
                    .with_usage(wgpu::TextureUsages::RENDER_ATTACHMENT)
                    .build(device)
            })
        };

        let albedo_metallic =
            gbuffer("albedo_metallic", wgpu::TextureFormat::Rgba8Unorm);

        let normal_roughness =
            gbuffer("normal_roughness", wgpu::TextureFormat::Rgba16Float);

        let position = gbuffer("position", wgpu::TextureFormat::Rgba32Float);
        let linear_z = gbuffer("linear_z", wgpu::TextureFormat::Rgba32Float);
        let depth = gbuffer("depth", wgpu::TextureFormat::R32Float);

        let depth_attachment = device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("penumbra_depth_attachment"),
                size: wgpu::Extent3d {
                    width: size.x,
                    height: size.y,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Depth32Float,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&Default::default());

        let mips = albedo_metallic.get(false).mips();
        let full = Extent::new(size, RayTraceScale::Full, mips);
        let shadows_extent = Extent::new(size, config.shadows.scale, mips);
        let ao_extent = Extent::new(size, config.ao.scale, mips);
        let reflections_extent = Extent::new(size, RayTraceScale::Half, mips);
        let diffuse_extent = Extent::new(size, config.diffuse.scale, mips);

        let rgba16 = |label: &str, extent: Extent| {
            Texture::new(
                device,
                label,
                extent.size,
                wgpu::TextureFormat::Rgba16Float,
            )
        };

        let rgba16x2 = |label: &str, extent: Extent| {
            DoubleBuffered::texture(
                device,
                label,
                extent.size,
                wgpu::TextureFormat::Rgba16Float,
            )
        };

        let tiles = |label: &str, extent: Extent| {
            Texture::new(
                device,
                label,
                gpu::tile_count(extent.size),
                wgpu::TextureFormat::R32Uint,
            )
        };

        // ---

        let shadow_tiles = tiles("shadow_tiles", shadows_extent);

        let shadow_lists = TileLists::new(
            device,
            "shadow",
            shadows_extent,
            ["denoise", "fast"],
        );

        let shadow_temporal = rgba16("shadow_temporal", shadows_extent);
        let shadow_moments = rgba16x2("shadow_moments", shadows_extent);
        let shadow_history = rgba16x2("shadow_history", shadows_extent);

        let shadow_atrous = [
            rgba16("shadow_atrous_a", shadows_extent),
            rgba16("shadow_atrous_b", shadows_extent),
        ];

        let shadows = rgba16("shadows", full);

        // ---

        let ao_tiles = tiles("ao_tiles", ao_extent);

        let ao_lists =
            TileLists::new(device, "ao", ao_extent, ["blur", "disocclusion"]);

        let ao_temporal = rgba16x2("ao_temporal", ao_extent);
        let ao_blur = [
            rgba16("ao_blur_a", ao_extent),
            rgba16("ao_blur_b", ao_extent),
        ];
        let ao = rgba16("ao", full);

        // ---

        let refl_trace = rgba16("refl_trace", reflections_extent);
        let refl_reconstructed = rgba16("refl_reconstructed", full);
        let refl_pre = rgba16("refl_pre", full);
        let refl_main = rgba16x2("refl_main", full);
        let refl_blur = rgba16x2("refl_blur", full);

        // ---

        let gi_trace = rgba16("gi_trace", diffuse_extent);
        let gi_temporal = rgba16x2("gi_temporal", diffuse_extent);
        let gi_blur = rgba16x2("gi_blur", diffuse_extent);
        let gi = rgba16("gi", full);

        // ---

        let hdr = rgba16("hdr", full);
        let taa = rgba16x2("taa", full);

        // Thousands of accumulated frames weight each new sample below 16F's
        // precision
        let gt_accum = DoubleBuffered::texture(
            device,
            "gt_accum",
            size,
            wgpu::TextureFormat::Rgba32Float,
        );

        let gt_output = rgba16("gt_output", full);
        let output = rgba16("output", full);

        Self {
            camera: MappedUniformBuffer::new(device, "camera", camera_data),
            full,
            shadows_extent,
            ao_extent,
            reflections_extent,
            diffuse_extent,
            albedo_metallic,
            normal_roughness,
            position,
            linear_z,
            depth,
            depth_attachment,
            shadow_tiles,
            shadow_lists,
            shadow_temporal,
            shadow_moments,
            shadow_history,
            shadow_atrous,
            shadows,
            ao_tiles,
            ao_lists,
            ao_temporal,
            ao_blur,
            ao,
            refl_trace,
            refl_reconstructed,
            refl_pre,
            refl_main,
            refl_blur,
            gi_trace,
            gi_temporal,
            gi_blur,
            gi,
            hdr,
            taa,
            gt_accum,
            gt_output,
            output,
        }
    }

    /// Binds camera together with the current and previous G-Buffer at
    /// given mip, which is what reprojecting passes read.
    pub fn bind_gbuffer_temporal(&self, mip: u32) -> Bindings<'_> {
        Bindings::default()
            .with(self.camera.bind_readable())
            .with(self.albedo_metallic.curr().bind_readable_mip(mip))
            .with(self.normal_roughness.curr().bind_readable_mip(mip))
            .with(self.position.curr().bind_readable_mip(mip))
            .with(self.linear_z.curr().bind_readable_mip(mip))
            .with(self.normal_roughness.prev().bind_readable_mip(mip))
            .with(self.linear_z.prev().bind_readable_mip(mip))
    }

    /// Binds normals and depths at given mip, which is what the edge-aware
    /// filters read.
    pub fn bind_gbuffer_edges(&self, mip: u32) -> Bindings<'_> {
        Bindings::default()
            .with(self.normal_roughness.curr().bind_readable_mip(mip))
            .with(self.linear_z.curr().bind_readable_mip(mip))
    }

    /// Binds what upsampling from `extent` to the full resolution needs.
    pub fn bind_gbuffer_upsample(&self, extent: Extent) -> Bindings<'_> {
        self.bind_gbuffer_edges(0)
            .with(self.normal_roughness.curr().bind_readable_mip(extent.mip))
            .with(self.linear_z.curr().bind_readable_mip(extent.mip))
    }
}

/// Size of an image rendered at a particular G-Buffer mip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Extent {
    pub size: UVec2,
    pub mip: u32,
}

impl Extent {
    /// Returns extent for given scale, considering that tiny images have
    /// fewer than [`GBUFFER_MIPS`] mips.
    pub fn new(full: UVec2, scale: RayTraceScale, mips: u32) -> Self {
        let mip = scale.mip().min(mips.saturating_sub(1));

        Self {
            size: mip_size(full, mip),
            mip,
        }
    }

    /// Ratio between the full resolution and this extent.
    pub fn scale(self) -> u32 {
        1 << self.mip
    }
}

/// Two lists of tiles (together with their indirect-dispatch arguments)
/// filled by a temporal pass and consumed by the filters.
#[derive(Debug)]
pub struct TileLists {
    pub a_tiles: UnmappedStorageBuffer,
    pub a_args: UnmappedStorageBuffer,
    pub b_tiles: UnmappedStorageBuffer,
    pub b_args: UnmappedStorageBuffer,
}

impl TileLists {
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        extent: Extent,
        [a, b]: [&str; 2],
    ) -> Self {
        let count = gpu::tile_count(extent.size);
        let list_size = (gpu::TILE_LIST_HEADER + count.x * count.y) as usize
            * mem::size_of::<u32>();
        let args_size = mem::size_of::<gpu::DispatchIndirectArgs>();

        let list = |name: &str| {
            UnmappedStorageBuffer::new(
                device,
                format!("{label}_{name}_tiles"),
                list_size,
                wgpu::BufferUsages::empty(),
            )
        };

        let args = |name: &str| {
            UnmappedStorageBuffer::new(
                device,
                format!("{label}_{name}_args"),
                args_size,
                wgpu::BufferUsages::INDIRECT,
            )
        };

        Self {
            a_tiles: list(a),
            a_args: args(a),
            b_tiles: list(b),
            b_args: args(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::uvec2;

    use super::*;

    #[test]
    fn extents() {
        let full = uvec2(1920, 1080);

        assert_eq!(
            Extent {
                size: full,
                mip: 0
            },
            Extent::new(full, RayTraceScale::Full, GBUFFER_MIPS)
        );

        let quarter = Extent::new(full, RayTraceScale::Quarter, GBUFFER_MIPS);

        assert_eq!(uvec2(480, 270), quarter.size);
        assert_eq!(2, quarter.mip);
        assert_eq!(4, quarter.scale());
    }

    #[test]
    fn extents_of_tiny_images() {
        let extent = Extent::new(uvec2(2, 1), RayTraceScale::Quarter, 2);

        assert_eq!(1, extent.mip);
        assert_eq!(uvec2(1, 1), extent.size);
    }

    #[test]
    fn extents_match_configured_scale() {
        let full = uvec2(1921, 1081);

        for scale in [
            RayTraceScale::Full,
            RayTraceScale::Half,
            RayTraceScale::Quarter,
        ] {
            assert_eq!(
                scale.size(full),
                Extent::new(full, scale, GBUFFER_MIPS).size
            );
        }
    }
}
