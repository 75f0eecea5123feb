use glam::UVec2;
use log::debug;

use crate::Bindable;

/// Two-dimensional texture accessed from shaders as a storage image, with an
/// optional chain of mips (each of which can be bound separately).
#[derive(Debug)]
pub struct Texture {
    tex: wgpu::Texture,
    views: Vec<wgpu::TextureView>,
    format: wgpu::TextureFormat,
    size: UVec2,
}

impl Texture {
    pub fn builder(label: impl ToString) -> TextureBuilder {
        TextureBuilder {
            label: label.to_string(),
            size: UVec2::ONE,
            format: wgpu::TextureFormat::Rgba16Float,
            mips: 1,
            usage: wgpu::TextureUsages::empty(),
        }
    }

    pub fn new(
        device: &wgpu::Device,
        label: impl ToString,
        size: UVec2,
        format: wgpu::TextureFormat,
    ) -> Self {
        Self::builder(label)
            .with_size(size)
            .with_format(format)
            .build(device)
    }

    pub fn tex(&self) -> &wgpu::Texture {
        &self.tex
    }

    /// Returns view of the first mip.
    pub fn view(&self) -> &wgpu::TextureView {
        self.mip_view(0)
    }

    pub fn mip_view(&self, mip: u32) -> &wgpu::TextureView {
        &self.views[mip as usize]
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn mips(&self) -> u32 {
        self.views.len() as u32
    }

    pub fn mip_size(&self, mip: u32) -> UVec2 {
        mip_size(self.size, mip)
    }

    /// Copies the first mip into `target`, which must be of the same size
    /// and format.
    pub fn copy_to(&self, encoder: &mut wgpu::CommandEncoder, target: &Self) {
        assert_eq!(self.size, target.size);
        assert_eq!(self.format, target.format);

        encoder.copy_texture_to_texture(
            self.tex.as_image_copy(),
            target.tex.as_image_copy(),
            wgpu::Extent3d {
                width: self.size.x,
                height: self.size.y,
                depth_or_array_layers: 1,
            },
        );
    }

    pub fn bind_readable(&self) -> impl Bindable + '_ {
        self.bind_readable_mip(0)
    }

    pub fn bind_readable_mip(&self, mip: u32) -> impl Bindable + '_ {
        TextureBinder {
            parent: self,
            mip,
            access: wgpu::StorageTextureAccess::ReadOnly,
        }
    }

    pub fn bind_writable(&self) -> impl Bindable + '_ {
        self.bind_writable_mip(0)
    }

    pub fn bind_writable_mip(&self, mip: u32) -> impl Bindable + '_ {
        TextureBinder {
            parent: self,
            mip,
            access: wgpu::StorageTextureAccess::WriteOnly,
        }
    }
}

pub struct TextureBuilder {
    label: String,
    size: UVec2,
    format: wgpu::TextureFormat,
    mips: u32,
    usage: wgpu::TextureUsages,
}

impl TextureBuilder {
    pub fn with_size(mut self, size: UVec2) -> Self {
        self.size = size;
        self
    }

    pub fn with_format(mut self, format: wgpu::TextureFormat) -> Self {
        self.format = format;
        self
    }

    /// Requests given number of mips; clamped to what the texture's size
    /// allows.
    pub fn with_mips(mut self, mips: u32) -> Self {
        self.mips = mips;
        self
    }

    pub fn with_usage(mut self, usage: wgpu::TextureUsages) -> Self {
        self.usage = usage;
        self
    }

    pub fn build(self, device: &wgpu::Device) -> Texture {
        let label = format!("penumbra_{}", self.label);
        let mips = self.mips.clamp(1, max_mips(self.size));

        debug!(
            "Allocating texture `{label}`; size={:?}, format={:?}, mips={mips}",
            self.size, self.format,
        );

        assert!(self.size.x > 0);
        assert!(self.size.y > 0);

        let tex = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&label),
            size: wgpu::Extent3d {
                width: self.size.x,
                height: self.size.y,
                depth_or_array_layers: 1,
            },
            mip_level_count: mips,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST
                | self.usage,
            view_formats: &[],
        });

        let views = (0..mips)
            .map(|mip| {
                tex.create_view(&wgpu::TextureViewDescriptor {
                    label: Some(&format!("{label}_mip{mip}")),
                    base_mip_level: mip,
                    mip_level_count: Some(1),
                    ..Default::default()
                })
            })
            .collect();

        Texture {
            tex,
            views,
            format: self.format,
            size: self.size,
        }
    }
}

struct TextureBinder<'a> {
    parent: &'a Texture,
    mip: u32,
    access: wgpu::StorageTextureAccess,
}

impl Bindable for TextureBinder<'_> {
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, wgpu::BindingResource)> {
        let layout = wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::StorageTexture {
                access: self.access,
                format: self.parent.format,
                view_dimension: wgpu::TextureViewDimension::D2,
            },
            count: None,
        };

        let resource =
            wgpu::BindingResource::TextureView(self.parent.mip_view(self.mip));

        vec![(layout, resource)]
    }
}

/// Size of given mip of a texture, following wgpu's rounding.
pub fn mip_size(size: UVec2, mip: u32) -> UVec2 {
    (size >> mip).max(UVec2::ONE)
}

/// Maximum number of mips a texture of given size can have.
pub fn max_mips(size: UVec2) -> u32 {
    u32::BITS - size.max_element().max(1).leading_zeros()
}

#[cfg(test)]
mod tests {
    use glam::uvec2;

    use super::*;

    #[test]
    fn mips() {
        assert_eq!(1, max_mips(uvec2(1, 1)));
        assert_eq!(2, max_mips(uvec2(2, 1)));
        assert_eq!(11, max_mips(uvec2(1920, 1080)));

        assert_eq!(uvec2(960, 540), mip_size(uvec2(1920, 1080), 1));
        assert_eq!(uvec2(7, 4), mip_size(uvec2(1920, 1080), 8));
        assert_eq!(uvec2(1, 1), mip_size(uvec2(3, 2), 4));
    }
}
