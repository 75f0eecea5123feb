use glam::Vec3;

use crate::{fresnel, DiffuseBrdf, F32Ext, GBufferEntry, Light, SpecularBrdf};

/// Returns light reflected from given surface towards `v`, coming straight
/// from the scene's light; `visibility` is the (possibly denoised) shadow.
pub fn direct_lighting(
    light: &Light,
    entry: &GBufferEntry,
    v: Vec3,
    visibility: f32,
) -> Vec3 {
    if visibility <= 0.0 {
        return Vec3::ZERO;
    }

    let (l, _) = light.to_light(entry.position);
    let n_o_l = entry.normal.dot(l);

    if n_o_l <= 0.0 {
        return Vec3::ZERO;
    }

    let brdf = DiffuseBrdf::new(entry).eval(l, v)
        + SpecularBrdf::new(entry).eval(l, v);

    brdf * light.radiance(entry.position) * n_o_l * visibility
}

/// Combines direct lighting with the denoised indirect signals.
///
/// `irradiance` is the diffuse global illumination (already divided by PI,
/// i.e. as returned from a cosine-weighted estimator), `reflection` is the
/// radiance reflected along the specular lobe.
pub fn compose(
    entry: &GBufferEntry,
    v: Vec3,
    direct: Vec3,
    ambient_occlusion: f32,
    irradiance: Vec3,
    reflection: Vec3,
) -> Vec3 {
    let diffuse =
        entry.albedo * (1.0 - entry.metallic) * irradiance * ambient_occlusion;

    let n_o_v = entry.normal.dot(v).saturate();
    let specular = fresnel(SpecularBrdf::new(entry).f0(), n_o_v) * reflection;

    direct + diffuse + specular
}

#[cfg(test)]
mod tests {
    use glam::vec3;

    use super::*;

    fn surface() -> GBufferEntry {
        GBufferEntry {
            albedo: Vec3::splat(0.8),
            metallic: 0.0,
            normal: vec3(0.0, 1.0, 0.0),
            roughness: 0.5,
            position: Vec3::ZERO,
            ..Default::default()
        }
    }

    #[test]
    fn light_from_below_does_not_contribute() {
        let light = Light::directional(
            vec3(0.0, 1.0, 0.0),
            Vec3::ONE,
            10.0,
            0.01,
        );

        assert_eq!(
            Vec3::ZERO,
            direct_lighting(&light, &surface(), vec3(0.0, 1.0, 0.0), 1.0)
        );
    }

    #[test]
    fn shadow_scales_direct_lighting() {
        let light = Light::directional(
            vec3(0.0, -1.0, 0.0),
            Vec3::ONE,
            10.0,
            0.01,
        );

        let v = vec3(0.0, 1.0, 0.0);
        let lit = direct_lighting(&light, &surface(), v, 1.0);
        let half = direct_lighting(&light, &surface(), v, 0.5);

        assert!(lit.x > 0.0);
        assert!((lit * 0.5 - half).length() < 1e-5);
        assert_eq!(Vec3::ZERO, direct_lighting(&light, &surface(), v, 0.0));
    }

    #[test]
    fn occlusion_darkens_indirect_diffuse() {
        let v = vec3(0.0, 1.0, 0.0);
        let open =
            compose(&surface(), v, Vec3::ZERO, 1.0, Vec3::ONE, Vec3::ZERO);
        let occluded =
            compose(&surface(), v, Vec3::ZERO, 0.25, Vec3::ONE, Vec3::ZERO);

        assert!((open * 0.25 - occluded).length() < 1e-5);
    }
}
