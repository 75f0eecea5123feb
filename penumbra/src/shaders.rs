use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::{fs, mem};

use log::debug;

use crate::{Error, Result};

/// Magic number starting every SPIR-V module.
const SPIRV_MAGIC: u32 = 0x0723_0203;

/// Compiled entry point: its module and the name of the entry point inside
/// of it.
pub type Shader = (wgpu::ShaderModule, &'static str);

macro_rules! shaders {
    ([ $( $name:ident => $entry_point:literal, )* ]) => {
        #[derive(Debug)]
        pub struct Shaders {
            $( pub $name: Shader, )*
        }

        impl Shaders {
            /// Loads all the shaders from given directory, as produced by
            /// `penumbra-shader-builder`.
            pub fn new(device: &wgpu::Device, dir: &Path) -> Result<Self> {
                debug!("Loading shaders from: {}", dir.display());

                Ok(Self {
                    $( $name: load(device, dir, $entry_point)?, )*
                })
            }
        }
    };
}

shaders!([
    ao_blur => "ao::blur",
    ao_disocclusion_blur => "ao::disocclusion_blur",
    ao_temporal => "ao::temporal",
    ao_trace => "ao::trace",
    ao_unpack => "ao::unpack",
    bilateral_blur => "bilateral_blur::main",
    clear_rgba16 => "clear::rgba16",
    clear_rgba32 => "clear::rgba32",
    deferred_shading => "deferred_shading::main",
    diffuse_trace => "diffuse::trace",
    gbuffer_fs => "gbuffer::main_fs",
    gbuffer_mips_linear_z => "gbuffer_mips::linear_z",
    gbuffer_mips_r32 => "gbuffer_mips::r32",
    gbuffer_mips_rgba16 => "gbuffer_mips::rgba16",
    gbuffer_mips_rgba32 => "gbuffer_mips::rgba32",
    gbuffer_mips_rgba8 => "gbuffer_mips::rgba8",
    gbuffer_vs => "gbuffer::main_vs",
    ground_truth => "ground_truth::main",
    reflections_reconstruct => "reflections::reconstruct",
    reflections_trace => "reflections::trace",
    shadows_atrous => "shadows::atrous",
    shadows_copy_tiles => "shadows::copy_tiles",
    shadows_temporal => "shadows::temporal",
    shadows_trace => "shadows::trace",
    shadows_unpack => "shadows::unpack",
    taa => "taa::main",
    temporal_reprojection => "temporal_reprojection::main",
    tiles_reset_args => "tiles::reset_args",
    upsample_color => "upsample::color",
    upsample_scalar => "upsample::scalar",
]);

const MAX_STORAGE_TEXTURES_PER_STAGE: u32 = 16;
const MAX_STORAGE_BUFFERS_PER_STAGE: u32 = 8;

impl Shaders {
    /// Features the device has to be created with.
    pub fn required_features() -> wgpu::Features {
        wgpu::Features::SPIRV_SHADER_PASSTHROUGH
            | wgpu::Features::PUSH_CONSTANTS
            | wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES
    }

    /// Limits the device has to be created with.
    ///
    /// Temporal passes bind up to eleven storage images at once, well above
    /// the default of four.
    pub fn required_limits() -> wgpu::Limits {
        wgpu::Limits {
            max_push_constant_size: 128,
            max_storage_textures_per_shader_stage:
                MAX_STORAGE_TEXTURES_PER_STAGE,
            max_storage_buffers_per_shader_stage:
                MAX_STORAGE_BUFFERS_PER_STAGE,
            ..Default::default()
        }
    }
}

fn load(
    device: &wgpu::Device,
    dir: &Path,
    entry_point: &'static str,
) -> Result<Shader> {
    let path = shader_path(dir, entry_point);

    debug!("Loading shader: {}", path.display());

    let bytes = fs::read(&path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            Error::ShaderNotFound { path: path.clone() }
        } else {
            Error::ShaderLoad {
                path: path.clone(),
                source,
            }
        }
    })?;

    validate(&path, &bytes)?;

    let label = format!("penumbra_{entry_point}");

    // Safety: the module comes from rust-gpu, which emits valid SPIR-V; its
    // header has been checked above
    let module = unsafe {
        device.create_shader_module_spirv(&wgpu::ShaderModuleDescriptorSpirV {
            label: Some(&label),
            source: wgpu::util::make_spirv_raw(&bytes),
        })
    };

    Ok((module, entry_point))
}

/// Returns where the module of given entry point lives, e.g. `ao::trace`
/// becomes `<dir>/ao.trace.spv`.
pub fn shader_path(dir: &Path, entry_point: &str) -> PathBuf {
    dir.join(format!("{}.spv", entry_point.replace("::", ".")))
}

fn validate(path: &Path, bytes: &[u8]) -> Result<()> {
    let word = mem::size_of::<u32>();

    let is_valid = bytes.len() >= word
        && bytes.len() % word == 0
        && u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
            == SPIRV_MAGIC;

    if is_valid {
        Ok(())
    } else {
        Err(Error::InvalidShader {
            path: path.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths() {
        let dir = Path::new("target/shaders");

        assert_eq!(
            Path::new("target/shaders/ao.trace.spv"),
            shader_path(dir, "ao::trace")
        );

        assert_eq!(
            Path::new("target/shaders/gbuffer_mips.rgba16.spv"),
            shader_path(dir, "gbuffer_mips::rgba16")
        );
    }

    #[test]
    fn valid_header() {
        let mut bytes = SPIRV_MAGIC.to_le_bytes().to_vec();

        bytes.extend([0; 4]);

        assert!(validate(Path::new("x.spv"), &bytes).is_ok());
    }

    #[test]
    fn invalid_modules() {
        let path = Path::new("x.spv");

        assert!(matches!(
            validate(path, &[]),
            Err(Error::InvalidShader { .. })
        ));

        assert!(matches!(
            validate(path, b"hello world!"),
            Err(Error::InvalidShader { .. })
        ));

        let mut misaligned = SPIRV_MAGIC.to_le_bytes().to_vec();

        misaligned.push(0);

        assert!(matches!(
            validate(path, &misaligned),
            Err(Error::InvalidShader { .. })
        ));
    }

    #[test]
    fn required_push_constants_fit() {
        assert!(Shaders::required_limits().max_push_constant_size >= 128);
    }

    /// Storage images bound by the widest pass (shadows' temporal resolve).
    const MAX_STORAGE_TEXTURES_USED: u32 = 11;

    /// Storage buffers bound by the widest pass (ray tracing).
    const MAX_STORAGE_BUFFERS_USED: u32 = 6;

    #[test]
    fn required_limits_cover_widest_passes() {
        let limits = Shaders::required_limits();

        assert!(
            limits.max_storage_textures_per_shader_stage
                >= MAX_STORAGE_TEXTURES_USED
        );

        assert!(
            limits.max_storage_buffers_per_shader_stage
                >= MAX_STORAGE_BUFFERS_USED
        );

        // Default limits can't run the temporal passes
        assert!(
            wgpu::Limits::default().max_storage_textures_per_shader_stage
                < MAX_STORAGE_TEXTURES_USED
        );
    }
}
