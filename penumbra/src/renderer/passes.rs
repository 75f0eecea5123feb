mod bilateral_blur;
mod clear;
mod temporal_reprojection;

use log::debug;

pub use self::bilateral_blur::*;
pub use self::clear::*;
pub use self::temporal_reprojection::*;
use crate::{Config, Engine, RendererBuffers};

macro_rules! passes {
    ([ $( $name:ident => $class:ident, )* ]) => {
        $( mod $name; )*
        $( pub use self::$name::*; )*

        #[derive(Debug)]
        pub struct RendererPasses {
            $( pub $name: $class, )*
        }

        impl RendererPasses {
            pub fn new(
                engine: &Engine,
                device: &wgpu::Device,
                config: &Config,
                buffers: &RendererBuffers,
            ) -> Self {
                debug!("Initializing renderer passes");

                Self {
                    $( $name: $class::new(engine, device, config, buffers), )*
                }
            }
        }
    };
}

passes!([
    ao => AoPass,
    deferred_shading => DeferredShadingPass,
    diffuse => DiffusePass,
    gbuffer => GBufferPass,
    gbuffer_mips => GBufferMipsPass,
    ground_truth => GroundTruthPass,
    history => HistoryPass,
    reflections => ReflectionsPass,
    shadows => ShadowsPass,
    taa => TaaPass,
]);
