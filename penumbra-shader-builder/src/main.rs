//! Compiles `penumbra-shaders` into SPIR-V modules.
//!
//! Usage: `penumbra-shader-builder [output-dir]`; each entry point lands in
//! `<output-dir>/<module>.<entry>.spv` (e.g. `shadows.trace.spv`), which is
//! where `penumbra::Shaders` looks for it.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::{env, fs};

use spirv_builder::{Capability, MetadataPrintout, SpirvBuilder};

const DEFAULT_OUTPUT_DIR: &str = "target/shaders";

fn main() -> Result<(), Box<dyn Error>> {
    let output_dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

    let crate_path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .ok_or("couldn't find the workspace's directory")?
        .join("penumbra-shaders");

    let result = SpirvBuilder::new(crate_path, "spirv-unknown-spv1.3")
        .multimodule(true)
        .print_metadata(MetadataPrintout::None)
        .capability(Capability::Int8)
        .extra_arg("--spirt-passes=reduce,fuse_selects")
        .build()?;

    fs::create_dir_all(&output_dir)?;

    for (shader_name, shader_path) in result.module.unwrap_multi() {
        let target =
            output_dir.join(format!("{}.spv", shader_name.replace("::", ".")));

        fs::copy(shader_path, &target)?;

        println!("{} -> {}", shader_name, target.display());
    }

    Ok(())
}
