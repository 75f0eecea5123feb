use core::f32::consts::PI;

use glam::{vec3, Vec2, Vec3};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::{lerp, F32Ext, GBufferEntry, Vec3Ext};

#[derive(Clone, Copy)]
pub struct DiffuseBrdf<'a> {
    gbuffer: &'a GBufferEntry,
}

impl<'a> DiffuseBrdf<'a> {
    pub fn new(gbuffer: &'a GBufferEntry) -> Self {
        Self { gbuffer }
    }

    pub fn eval(self, l: Vec3, v: Vec3) -> Vec3 {
        let n = self.gbuffer.normal;
        let h = (l + v).normalize();
        let n_o_v = n.dot(v).max(0.0001);
        let n_o_l = n.dot(l).saturate();
        let l_o_h = l.dot(h).saturate();

        self.gbuffer.albedo
            * fd_burley(self.gbuffer.clamped_roughness(), n_o_v, n_o_l, l_o_h)
            * (1.0 - self.gbuffer.metallic)
    }

    /// Samples a cosine-weighted direction around the surface's normal.
    pub fn sample(self, sample: Vec2) -> Vec3 {
        let r = sample.x.sqrt();
        let phi = 2.0 * PI * sample.y;

        let local = vec3(
            r * phi.cos(),
            r * phi.sin(),
            (1.0 - sample.x).max(0.0).sqrt(),
        );

        self.gbuffer.normal.to_world(local)
    }
}

#[derive(Clone, Copy)]
pub struct SpecularBrdf<'a> {
    gbuffer: &'a GBufferEntry,
}

impl<'a> SpecularBrdf<'a> {
    pub fn new(gbuffer: &'a GBufferEntry) -> Self {
        Self { gbuffer }
    }

    /// Returns the GGX alpha of this surface.
    pub fn alpha(self) -> f32 {
        self.gbuffer.clamped_roughness().sqr()
    }

    pub fn f0(self) -> Vec3 {
        lerp(Vec3::splat(0.04), self.gbuffer.albedo, self.gbuffer.metallic)
    }

    pub fn eval(self, l: Vec3, v: Vec3) -> Vec3 {
        let n = self.gbuffer.normal;
        let h = (l + v).normalize();
        let n_o_v = n.dot(v).max(0.0001);
        let n_o_l = n.dot(l).saturate();
        let n_o_h = n.dot(h).saturate();
        let l_o_h = l.dot(h).saturate();

        let d = d_ggx(self.alpha(), n_o_h);
        let v = v_smith_ggx_correlated(self.alpha(), n_o_v, n_o_l);
        let f = fresnel(self.f0(), l_o_h);

        d * v * f
    }

    /// Evaluates the lobe's shape (without Fresnel) for given directions,
    /// including the cosine term; used to weight neighbouring samples.
    pub fn eval_f(self, l: Vec3, v: Vec3) -> f32 {
        let n = self.gbuffer.normal;
        let h = (l + v).normalize();
        let n_o_l = n.dot(l).saturate();
        let n_o_v = n.dot(v).max(0.0001);
        let n_o_h = n.dot(h).saturate();

        let d = d_ggx(self.alpha(), n_o_h);
        let v = v_smith_ggx_correlated(self.alpha(), n_o_v, n_o_l);

        d * v * n_o_l
    }

    /// Importance-samples the GGX distribution; `trim` in `(0.0, 1.0>`
    /// discards the distribution's tail (the least probable, most grazing
    /// half-vectors), trading bias for noise.
    ///
    /// Returns the reflected direction and its pdf.
    pub fn sample(self, v: Vec3, sample: Vec2, trim: f32) -> (Vec3, f32) {
        let n = self.gbuffer.normal;
        let a2 = self.alpha().sqr();
        let u = sample.x * trim.clamp(0.0, 1.0);

        let cos_theta = ((1.0 - u) / (1.0 + (a2 - 1.0) * u)).max(0.0).sqrt();
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        let phi = 2.0 * PI * sample.y;

        let h = n.to_world(vec3(
            sin_theta * phi.cos(),
            sin_theta * phi.sin(),
            cos_theta,
        ));

        let l = (-v).reflect(h);
        let n_o_h = n.dot(h).saturate();
        let v_o_h = v.dot(h).max(0.0001);
        let pdf = d_ggx(self.alpha(), n_o_h) * n_o_h / (4.0 * v_o_h);

        (l, pdf)
    }
}

pub fn fd_burley(roughness: f32, n_o_v: f32, n_o_l: f32, l_o_h: f32) -> f32 {
    let f90 = 0.5 + 2.0 * roughness * l_o_h * l_o_h;
    let light_scatter = f_schlick(1.0, f90, n_o_l);
    let view_scatter = f_schlick(1.0, f90, n_o_v);

    light_scatter * view_scatter * (1.0 / PI)
}

pub fn d_ggx(alpha: f32, n_o_h: f32) -> f32 {
    let one_minus_noh_squared = 1.0 - n_o_h * n_o_h;
    let a = n_o_h * alpha;
    let k = alpha / (one_minus_noh_squared + a * a).max(1e-7);

    k * k * (1.0 / PI)
}

pub fn v_smith_ggx_correlated(alpha: f32, n_o_v: f32, n_o_l: f32) -> f32 {
    let a2 = alpha * alpha;
    let lambda_v = n_o_l * ((n_o_v - a2 * n_o_v) * n_o_v + a2).sqrt();
    let lambda_l = n_o_v * ((n_o_l - a2 * n_o_l) * n_o_l + a2).sqrt();

    0.5 / (lambda_v + lambda_l).max(1e-7)
}

pub fn fresnel(f0: Vec3, l_o_h: f32) -> Vec3 {
    let f90 = f0.dot(Vec3::splat(50.0 * 0.33)).saturate();

    f_schlick_vec(f0, f90, l_o_h)
}

fn f_schlick(f0: f32, f90: f32, v_o_h: f32) -> f32 {
    f0 + (f90 - f0) * (1.0 - v_o_h).max(0.001).powf(5.0)
}

fn f_schlick_vec(f0: Vec3, f90: f32, v_o_h: f32) -> Vec3 {
    f0 + (f90 - f0) * (1.0 - v_o_h).max(0.001).powf(5.0)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::vec2;

    use super::*;

    fn surface(roughness: f32) -> GBufferEntry {
        GBufferEntry {
            albedo: Vec3::ONE,
            normal: vec3(0.0, 1.0, 0.0),
            roughness,
            ..Default::default()
        }
    }

    #[test]
    fn diffuse_samples_stay_in_hemisphere() {
        let gbuffer = surface(0.5);
        let brdf = DiffuseBrdf::new(&gbuffer);

        for i in 0..8 {
            for j in 0..8 {
                let l = brdf.sample(vec2(i as f32 / 8.0, j as f32 / 8.0));

                assert!(l.y >= 0.0);
                assert_relative_eq!(1.0, l.length(), epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn mirror_reflects() {
        let gbuffer = surface(0.0);
        let brdf = SpecularBrdf::new(&gbuffer);
        let v = vec3(1.0, 1.0, 0.0).normalize();
        let (l, _) = brdf.sample(v, vec2(0.5, 0.5), 0.8);

        assert_relative_eq!(-v.x, l.x, epsilon = 0.01);
        assert_relative_eq!(v.y, l.y, epsilon = 0.01);
    }

    #[test]
    fn trim_narrows_the_lobe() {
        let gbuffer = surface(0.8);
        let brdf = SpecularBrdf::new(&gbuffer);
        let v = vec3(0.0, 1.0, 0.0);

        let (untrimmed, _) = brdf.sample(v, vec2(0.99, 0.0), 1.0);
        let (trimmed, _) = brdf.sample(v, vec2(0.99, 0.0), 0.5);

        assert!(trimmed.y > untrimmed.y);
    }

    #[test]
    fn lobe_peaks_at_mirror_direction() {
        let gbuffer = surface(0.3);
        let brdf = SpecularBrdf::new(&gbuffer);
        let v = vec3(1.0, 1.0, 0.0).normalize();
        let mirror = (-v).reflect(gbuffer.normal);
        let off = vec3(-0.2, 1.0, 0.3).normalize();

        assert!(brdf.eval_f(mirror, v) > brdf.eval_f(off, v));
    }
}
