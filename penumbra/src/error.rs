use std::io;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("shader module not found: {path}")]
    ShaderNotFound { path: PathBuf },

    #[error("couldn't load shader module {path}")]
    ShaderLoad {
        path: PathBuf,

        #[source]
        source: io::Error,
    },

    #[error("not a SPIR-V module: {path}")]
    InvalidShader { path: PathBuf },

    #[error("device lacks required features: {0:?}")]
    MissingFeatures(wgpu::Features),

    #[error("device lost: {0}")]
    DeviceLost(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
