use glam::{uvec2, vec3, UVec2, Vec3, Vec4};
use log::info;

use crate::{gpu, Texture};

/// What rays see when they don't hit anything.
#[derive(Clone, Debug, PartialEq)]
pub enum Environment {
    /// Analytic sky lit by a sun shining along (the opposite of) the
    /// scene's light direction.
    ProceduralSky { sun_intensity: f32 },

    /// Equirectangular HDR image.
    Hdr(HdrImage),
}

impl Environment {
    pub(crate) fn serialize(&self, light: &gpu::Light) -> gpu::World {
        match self {
            Environment::ProceduralSky { sun_intensity } => {
                gpu::World::procedural_sky(
                    sun_direction(light),
                    *sun_intensity,
                )
            }

            Environment::Hdr(image) => {
                gpu::World::hdr(image.size, image.intensity)
            }
        }
    }

    /// Returns size of the texture this environment needs; the procedural
    /// sky doesn't read it, but the binding has to exist anyway.
    pub(crate) fn map_size(&self) -> UVec2 {
        match self {
            Environment::ProceduralSky { .. } => UVec2::ONE,
            Environment::Hdr(image) => image.size,
        }
    }

    /// Creates the environment's texture and fills it.
    pub(crate) fn create_map(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Texture {
        let size = self.map_size();

        info!("Creating environment map; size={size:?}");

        let map = Texture::new(
            device,
            "env_map",
            size,
            wgpu::TextureFormat::Rgba32Float,
        );

        let texels = match self {
            Environment::ProceduralSky { .. } => vec![Vec4::ZERO],
            Environment::Hdr(image) => image.texels.clone(),
        };

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: map.tex(),
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(&texels),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(size.x * 16),
                rows_per_image: Some(size.y),
            },
            wgpu::Extent3d {
                width: size.x,
                height: size.y,
                depth_or_array_layers: 1,
            },
        );

        map
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::ProceduralSky {
            sun_intensity: 50.0,
        }
    }
}

/// Equirectangular image with linear RGBA texels, row by row, starting at
/// the top (i.e. looking straight up).
#[derive(Clone, Debug, PartialEq)]
pub struct HdrImage {
    size: UVec2,
    texels: Vec<Vec4>,
    intensity: f32,
}

impl HdrImage {
    /// Creates an image out of given texels; returns `None` if their number
    /// doesn't match the size.
    pub fn new(size: UVec2, texels: Vec<Vec4>, intensity: f32) -> Option<Self> {
        let is_valid = size.x > 0
            && size.y > 0
            && texels.len() == (size.x as usize) * (size.y as usize);

        is_valid.then_some(Self {
            size,
            texels,
            intensity,
        })
    }

    /// Creates a single-color image, e.g. for a uniformly lit environment.
    pub fn uniform(color: Vec3, intensity: f32) -> Self {
        Self {
            size: uvec2(1, 1),
            texels: vec![color.extend(1.0)],
            intensity,
        }
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }
}

/// The sun follows the scene's light when that's a directional one, and
/// stays at a fixed, high position otherwise.
fn sun_direction(light: &gpu::Light) -> Vec3 {
    let fallback = vec3(0.3, 1.0, 0.2).normalize();

    if light.is_directional() {
        (-light.direction()).try_normalize().unwrap_or(fallback)
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn hdr_image_validation() {
        assert!(HdrImage::new(uvec2(2, 1), vec![Vec4::ONE; 2], 1.0).is_some());
        assert!(HdrImage::new(uvec2(2, 2), vec![Vec4::ONE; 2], 1.0).is_none());
        assert!(HdrImage::new(uvec2(0, 0), vec![], 1.0).is_none());
    }

    #[test]
    fn serialize_hdr() {
        let image = HdrImage::uniform(Vec3::ONE, 2.5);
        let world = Environment::Hdr(image).serialize(&gpu::Light::default());

        assert_eq!(gpu::World::ENV_HDR, world.env_kind());
        assert_eq!(uvec2(1, 1), world.env_size());
    }

    #[test]
    fn sun_follows_directional_light() {
        let light = gpu::Light::directional(
            vec3(0.0, -1.0, 0.0),
            Vec3::ONE,
            1.0,
            0.01,
        );

        let world = Environment::default().serialize(&light);

        assert_eq!(gpu::World::ENV_PROCEDURAL_SKY, world.env_kind());
        assert_relative_eq!(1.0, world.sun.y);
    }
}
