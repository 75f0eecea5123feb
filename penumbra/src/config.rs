use std::fmt::Debug;

use glam::UVec2;
use log::warn;

use crate::gpu;

/// Renderer's configuration.
///
/// Out-of-range values are never rejected; they get clamped (with a warning)
/// when the configuration is handed to the renderer, see [`Config::clamped()`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Config {
    pub shadows: ShadowsConfig,
    pub ao: AoConfig,
    pub reflections: ReflectionsConfig,
    pub diffuse: DiffuseConfig,
    pub taa: TaaConfig,
    pub ground_truth: GroundTruthConfig,
    pub visualization: Visualization,
}

impl Config {
    pub fn clamped(self) -> Self {
        Self {
            shadows: self.shadows.clamped(),
            ao: self.ao.clamped(),
            reflections: self.reflections.clamped(),
            diffuse: self.diffuse.clamped(),
            taa: self.taa.clamped(),
            ground_truth: self.ground_truth.clamped(),
            visualization: self.visualization,
        }
    }

    /// Returns whether switching from `self` to `other` changes the size of
    /// any of the renderer's images.
    pub(crate) fn invalidates_buffers(&self, other: &Self) -> bool {
        self.shadows.scale != other.shadows.scale
            || self.ao.scale != other.ao.scale
            || self.diffuse.scale != other.diffuse.scale
    }

    /// Returns whether switching from `self` to `other` changes the shape of
    /// the frame graph (which images are read by which passes).
    ///
    /// Parameters passed through push constants don't count, since they are
    /// read anew each frame.
    pub(crate) fn invalidates_passes(&self, other: &Self) -> bool {
        self.invalidates_buffers(other)
            || self.shadows.denoise != other.shadows.denoise
            || self.shadows.iterations != other.shadows.iterations
            || self.shadows.feedback_iteration
                != other.shadows.feedback_iteration
            || self.ao.denoise != other.ao.denoise
            || self.reflections.denoise != other.reflections.denoise
            || self.reflections.pre_pass != other.reflections.pre_pass
            || self.reflections.blur != other.reflections.blur
            || self.reflections.feedback != other.reflections.feedback
            || self.diffuse.use_blur_as_temporal_input
                != other.diffuse.use_blur_as_temporal_input
    }

    pub(crate) fn effects(&self) -> u32 {
        let mut effects = 0;

        if self.shadows.enabled {
            effects |= gpu::ShadingPassParams::EFFECT_SHADOWS;
        }

        if self.ao.enabled {
            effects |= gpu::ShadingPassParams::EFFECT_AO;
        }

        if self.reflections.enabled {
            effects |= gpu::ShadingPassParams::EFFECT_REFLECTIONS;
        }

        if self.diffuse.enabled {
            effects |= gpu::ShadingPassParams::EFFECT_GI;
        }

        effects
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowsConfig {
    pub enabled: bool,

    /// When disabled, the raw ray-traced visibility is displayed
    pub denoise: bool,

    /// Offset of the ray's origin along the surface normal, in world units
    pub bias: f32,

    pub alpha: f32,
    pub moments_alpha: f32,
    pub phi_visibility: f32,
    pub phi_normal: f32,
    pub sigma_depth: f32,

    /// Number of à-trous iterations
    pub iterations: u32,

    /// À-trous iteration whose output becomes the next frame's history
    pub feedback_iteration: u32,

    /// Exponent applied while upsampling
    pub power: f32,

    pub scale: RayTraceScale,
}

impl ShadowsConfig {
    pub const MAX_ITERATIONS: u32 = 8;

    fn clamped(self) -> Self {
        let iterations = clamp(
            "shadows.iterations",
            self.iterations,
            1,
            Self::MAX_ITERATIONS,
        );

        Self {
            bias: clamp("shadows.bias", self.bias, 0.0, 10.0),
            alpha: clamp("shadows.alpha", self.alpha, 0.001, 1.0),
            moments_alpha: clamp(
                "shadows.moments_alpha",
                self.moments_alpha,
                0.001,
                1.0,
            ),
            phi_visibility: clamp(
                "shadows.phi_visibility",
                self.phi_visibility,
                0.01,
                1000.0,
            ),
            phi_normal: clamp(
                "shadows.phi_normal",
                self.phi_normal,
                1.0,
                1024.0,
            ),
            sigma_depth: clamp(
                "shadows.sigma_depth",
                self.sigma_depth,
                0.001,
                100.0,
            ),
            iterations,
            feedback_iteration: clamp(
                "shadows.feedback_iteration",
                self.feedback_iteration,
                0,
                iterations - 1,
            ),
            power: clamp("shadows.power", self.power, 0.1, 8.0),
            ..self
        }
    }
}

impl Default for ShadowsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            denoise: true,
            bias: 0.1,
            alpha: 0.01,
            moments_alpha: 0.2,
            phi_visibility: 10.0,
            phi_normal: 128.0,
            sigma_depth: 1.0,
            iterations: 4,
            feedback_iteration: 1,
            power: 1.0,
            scale: RayTraceScale::Full,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AoConfig {
    pub enabled: bool,

    /// When disabled, the raw ray-traced occlusion is displayed
    pub denoise: bool,

    pub ray_length: f32,
    pub bias: f32,
    pub alpha: f32,
    pub blur_radius: u32,
    pub disocclusion_blur: bool,
    pub disocclusion_radius: u32,

    /// History length below which a pixel goes through the disocclusion blur
    pub disocclusion_threshold: f32,

    pub upsample_power: f32,
    pub scale: RayTraceScale,
    pub rays_per_pixel: u32,
}

impl AoConfig {
    fn clamped(self) -> Self {
        Self {
            ray_length: clamp("ao.ray_length", self.ray_length, 0.01, 1000.0),
            bias: clamp("ao.bias", self.bias, 0.0, 10.0),
            alpha: clamp("ao.alpha", self.alpha, 0.001, 1.0),
            blur_radius: clamp(
                "ao.blur_radius",
                self.blur_radius,
                1,
                gpu::MAX_BLUR_RADIUS,
            ),
            disocclusion_radius: clamp(
                "ao.disocclusion_radius",
                self.disocclusion_radius,
                1,
                gpu::MAX_DISOCCLUSION_RADIUS,
            ),
            disocclusion_threshold: clamp(
                "ao.disocclusion_threshold",
                self.disocclusion_threshold,
                0.0,
                gpu::MAX_HISTORY_LENGTH,
            ),
            upsample_power: clamp(
                "ao.upsample_power",
                self.upsample_power,
                0.1,
                8.0,
            ),
            rays_per_pixel: clamp(
                "ao.rays_per_pixel",
                self.rays_per_pixel,
                1,
                16,
            ),
            ..self
        }
    }
}

impl Default for AoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            denoise: true,
            ray_length: 7.0,
            bias: 0.1,
            alpha: 0.01,
            blur_radius: 5,
            disocclusion_blur: true,
            disocclusion_radius: 8,
            disocclusion_threshold: 8.0,
            upsample_power: 1.2,
            scale: RayTraceScale::Half,
            rays_per_pixel: 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReflectionsConfig {
    pub enabled: bool,

    /// When disabled, the reconstructed (but otherwise raw) reflections are
    /// displayed
    pub denoise: bool,

    pub bias: f32,

    /// How much of the GGX distribution's tail gets cut off when sampling
    pub trim: f32,

    pub pre_pass: bool,
    pub main_alpha: f32,
    pub pre_alpha: f32,
    pub blur: bool,
    pub blur_radius: u32,
    pub sigma_min: f32,
    pub sigma_max: f32,
    pub phi_color: f32,
    pub phi_normal: f32,
    pub neighborhood_scale: f32,
    pub feedback: ReflectionsFeedback,
}

impl ReflectionsConfig {
    fn clamped(self) -> Self {
        let sigma_min =
            clamp("reflections.sigma_min", self.sigma_min, 0.0, 1.0);

        Self {
            bias: clamp("reflections.bias", self.bias, 0.0, 10.0),
            trim: clamp("reflections.trim", self.trim, 0.0, 1.0),
            main_alpha: clamp(
                "reflections.main_alpha",
                self.main_alpha,
                0.001,
                1.0,
            ),
            pre_alpha: clamp(
                "reflections.pre_alpha",
                self.pre_alpha,
                0.001,
                1.0,
            ),
            blur_radius: clamp(
                "reflections.blur_radius",
                self.blur_radius,
                1,
                gpu::MAX_BLUR_RADIUS,
            ),
            sigma_min,
            sigma_max: clamp(
                "reflections.sigma_max",
                self.sigma_max,
                sigma_min,
                1.0,
            ),
            phi_color: clamp(
                "reflections.phi_color",
                self.phi_color,
                0.0,
                1000.0,
            ),
            phi_normal: clamp(
                "reflections.phi_normal",
                self.phi_normal,
                1.0,
                1024.0,
            ),
            neighborhood_scale: clamp(
                "reflections.neighborhood_scale",
                self.neighborhood_scale,
                0.0,
                16.0,
            ),
            ..self
        }
    }

    /// Returns which image the main temporal pass reads as its history.
    pub(crate) fn effective_feedback(&self) -> ReflectionsFeedback {
        if self.blur {
            self.feedback
        } else {
            ReflectionsFeedback::TemporalMain
        }
    }
}

impl Default for ReflectionsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            denoise: true,
            bias: 0.5,
            trim: 0.8,
            pre_pass: true,
            main_alpha: 0.01,
            pre_alpha: 0.05,
            blur: true,
            blur_radius: 1,
            sigma_min: 0.001,
            sigma_max: 0.01,
            phi_color: 10.0,
            phi_normal: 32.0,
            neighborhood_scale: 3.5,
            feedback: ReflectionsFeedback::Blur,
        }
    }
}

/// Which stage of the reflection denoiser is fed back as the main temporal
/// pass' history.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReflectionsFeedback {
    TemporalMain,

    #[default]
    Blur,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiffuseConfig {
    pub enabled: bool,
    pub use_blur_as_temporal_input: bool,
    pub bias: f32,
    pub neighborhood_scale: f32,
    pub alpha: f32,
    pub blur_radius: u32,
    pub scale: RayTraceScale,
}

impl DiffuseConfig {
    fn clamped(self) -> Self {
        Self {
            neighborhood_scale: clamp(
                "diffuse.neighborhood_scale",
                self.neighborhood_scale,
                0.0,
                16.0,
            ),
            bias: clamp("diffuse.bias", self.bias, 0.0, 10.0),
            alpha: clamp("diffuse.alpha", self.alpha, 0.001, 1.0),
            blur_radius: clamp(
                "diffuse.blur_radius",
                self.blur_radius,
                1,
                gpu::MAX_BLUR_RADIUS,
            ),
            ..self
        }
    }
}

impl Default for DiffuseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            use_blur_as_temporal_input: false,
            bias: 0.1,
            neighborhood_scale: 3.5,
            alpha: 0.01,
            blur_radius: 5,
            scale: RayTraceScale::Quarter,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TaaConfig {
    pub enabled: bool,
    pub sharpen: bool,

    /// Feedback used for fast-moving pixels
    pub feedback_min: f32,

    /// Feedback used for static pixels
    pub feedback_max: f32,

    pub halton_samples: u32,
}

impl TaaConfig {
    fn clamped(self) -> Self {
        let feedback_min =
            clamp("taa.feedback_min", self.feedback_min, 0.0, 1.0);

        Self {
            feedback_min,
            feedback_max: clamp(
                "taa.feedback_max",
                self.feedback_max,
                feedback_min,
                1.0,
            ),
            halton_samples: clamp(
                "taa.halton_samples",
                self.halton_samples,
                1,
                256,
            ),
            ..self
        }
    }
}

impl Default for TaaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sharpen: true,
            feedback_min: 0.88,
            feedback_max: 0.97,
            halton_samples: 16,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundTruthConfig {
    pub max_ray_bounces: u32,
}

impl GroundTruthConfig {
    fn clamped(self) -> Self {
        Self {
            max_ray_bounces: clamp(
                "ground_truth.max_ray_bounces",
                self.max_ray_bounces,
                0,
                16,
            ),
        }
    }
}

impl Default for GroundTruthConfig {
    fn default() -> Self {
        Self { max_ray_bounces: 2 }
    }
}

/// Resolution at which an effect is ray-traced and denoised, relative to
/// the viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RayTraceScale {
    #[default]
    Full,
    Half,
    Quarter,
}

impl RayTraceScale {
    /// Returns the G-Buffer's mip level matching this scale.
    pub fn mip(self) -> u32 {
        match self {
            RayTraceScale::Full => 0,
            RayTraceScale::Half => 1,
            RayTraceScale::Quarter => 2,
        }
    }

    pub fn divisor(self) -> u32 {
        1 << self.mip()
    }

    /// Returns the size of an effect image traced at this scale for a
    /// viewport of given size; matches the size of G-Buffer's mip, so that
    /// each effect pixel has its own G-Buffer texel.
    pub fn size(self, full: UVec2) -> UVec2 {
        (full / self.divisor()).max(UVec2::ONE)
    }
}

/// What the renderer outputs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Visualization {
    /// Shaded image
    #[default]
    Final,

    /// Denoised shadows
    Shadows,

    /// Denoised ambient occlusion
    AmbientOcclusion,

    /// Denoised reflections
    Reflections,

    /// Denoised diffuse illumination
    GlobalIllumination,

    /// Progressively accumulated path-traced image
    GroundTruth,
}

impl Visualization {
    pub(crate) fn serialize(self) -> u32 {
        match self {
            Visualization::Final | Visualization::GroundTruth => {
                gpu::ShadingPassParams::VISUALIZATION_FINAL
            }
            Visualization::Shadows => {
                gpu::ShadingPassParams::VISUALIZATION_SHADOWS
            }
            Visualization::AmbientOcclusion => {
                gpu::ShadingPassParams::VISUALIZATION_AO
            }
            Visualization::Reflections => {
                gpu::ShadingPassParams::VISUALIZATION_REFLECTIONS
            }
            Visualization::GlobalIllumination => {
                gpu::ShadingPassParams::VISUALIZATION_GI
            }
        }
    }

    pub fn is_ground_truth(self) -> bool {
        matches!(self, Visualization::GroundTruth)
    }
}

fn clamp<T>(name: &str, value: T, min: T, max: T) -> T
where
    T: PartialOrd + Copy + Debug,
{
    // Written so that NaNs end up at `min`
    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    let clamped = if !(value >= min) {
        min
    } else if value > max {
        max
    } else {
        value
    };

    if clamped != value {
        warn!("Clamping `{name}` from {value:?} to {clamped:?}");
    }

    clamped
}

#[cfg(test)]
mod tests {
    use glam::uvec2;

    use super::*;

    #[test]
    fn defaults_are_left_intact() {
        assert_eq!(Config::default(), Config::default().clamped());
    }

    #[test]
    fn defaults() {
        let config = Config::default();

        assert_eq!(RayTraceScale::Full, config.shadows.scale);
        assert_eq!(RayTraceScale::Half, config.ao.scale);
        assert_eq!(RayTraceScale::Quarter, config.diffuse.scale);
        assert_eq!(4, config.shadows.iterations);
        assert_eq!(1, config.shadows.feedback_iteration);
        assert_eq!(8, config.ao.disocclusion_radius);
        assert_eq!(ReflectionsFeedback::Blur, config.reflections.feedback);
        assert_eq!(16, config.taa.halton_samples);
        assert_eq!(2, config.ground_truth.max_ray_bounces);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let config = Config {
            shadows: ShadowsConfig {
                alpha: 5.0,
                iterations: 0,
                feedback_iteration: 3,
                ..Default::default()
            },
            ao: AoConfig {
                blur_radius: 100,
                rays_per_pixel: 0,
                ..Default::default()
            },
            taa: TaaConfig {
                feedback_min: 0.99,
                feedback_max: 0.5,
                ..Default::default()
            },
            ..Default::default()
        }
        .clamped();

        assert_eq!(1.0, config.shadows.alpha);
        assert_eq!(1, config.shadows.iterations);
        assert_eq!(0, config.shadows.feedback_iteration);
        assert_eq!(7, config.ao.blur_radius);
        assert_eq!(1, config.ao.rays_per_pixel);
        assert_eq!(0.99, config.taa.feedback_max);
    }

    #[test]
    fn nans_are_clamped() {
        let config = ReflectionsConfig {
            trim: f32::NAN,
            ..Default::default()
        }
        .clamped();

        assert_eq!(0.0, config.trim);
    }

    #[test]
    fn scale() {
        let full = uvec2(1921, 1080);

        assert_eq!(full, RayTraceScale::Full.size(full));
        assert_eq!(uvec2(960, 540), RayTraceScale::Half.size(full));
        assert_eq!(uvec2(480, 270), RayTraceScale::Quarter.size(full));
        assert_eq!(UVec2::ONE, RayTraceScale::Quarter.size(uvec2(1, 1)));
        assert_eq!(2, RayTraceScale::Quarter.mip());
    }

    #[test]
    fn invalidation() {
        let config = Config::default();

        let tweaked = Config {
            shadows: ShadowsConfig {
                alpha: 0.5,
                ..Default::default()
            },
            ..config
        };

        assert!(!config.invalidates_passes(&tweaked));

        let rescaled = Config {
            ao: AoConfig {
                scale: RayTraceScale::Full,
                ..Default::default()
            },
            ..config
        };

        assert!(config.invalidates_buffers(&rescaled));
        assert!(config.invalidates_passes(&rescaled));

        let reshaped = Config {
            reflections: ReflectionsConfig {
                blur: false,
                ..Default::default()
            },
            ..config
        };

        assert!(!config.invalidates_buffers(&reshaped));
        assert!(config.invalidates_passes(&reshaped));
    }

    #[test]
    fn effects() {
        let mut config = Config::default();

        config.ao.enabled = false;

        let effects = config.effects();

        assert_eq!(
            gpu::ShadingPassParams::EFFECT_SHADOWS
                | gpu::ShadingPassParams::EFFECT_REFLECTIONS
                | gpu::ShadingPassParams::EFFECT_GI,
            effects
        );
    }

    #[test]
    fn reflections_without_blur_feed_back_temporal_pass() {
        let config = ReflectionsConfig {
            blur: false,
            ..Default::default()
        };

        assert_eq!(
            ReflectionsFeedback::TemporalMain,
            config.effective_feedback()
        );
    }
}
