use glam::{ivec2, vec4, IVec2, UVec2, Vec2, Vec4};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

/// 2x2 footprint of a bilinear fetch, where each tap can be individually
/// rejected (e.g. because it belongs to a different surface).
#[derive(Clone, Copy, Default)]
pub struct BilinearFilter {
    /// Sample at `f(x=0, y=0)`
    pub s00: Vec4,

    /// Sample at `f(x=1, y=0)`
    pub s10: Vec4,

    /// Sample at `f(x=0, y=1)`
    pub s01: Vec4,

    /// Sample at `f(x=1, y=1)`
    pub s11: Vec4,

    /// Validity of each sample (0.0 or 1.0)
    pub weights: Vec4,

    /// Fractional position inside the footprint
    pub uv: Vec2,
}

impl BilinearFilter {
    /// Gathers the footprint around given continuous position, expressed in
    /// pixels of an image sized `size` (pixel centers lay at `+0.5`).
    ///
    /// `sample` returns the tap's value and whether it's valid; taps outside
    /// of the image are always invalid.
    pub fn gather(
        pos: Vec2,
        size: UVec2,
        sample: impl Fn(UVec2) -> (Vec4, bool),
    ) -> Self {
        let pos = pos - 0.5;
        let uv = pos - pos.floor();
        let [p00, p10, p01, p11] = Self::coords(pos);

        let mut this = Self {
            uv,
            ..Default::default()
        };

        if let Some((s, valid)) = Self::fetch(p00, size, &sample) {
            this.s00 = s;
            this.weights.x = valid;
        }

        if let Some((s, valid)) = Self::fetch(p10, size, &sample) {
            this.s10 = s;
            this.weights.y = valid;
        }

        if let Some((s, valid)) = Self::fetch(p01, size, &sample) {
            this.s01 = s;
            this.weights.z = valid;
        }

        if let Some((s, valid)) = Self::fetch(p11, size, &sample) {
            this.s11 = s;
            this.weights.w = valid;
        }

        this
    }

    fn fetch(
        pos: IVec2,
        size: UVec2,
        sample: &impl Fn(UVec2) -> (Vec4, bool),
    ) -> Option<(Vec4, f32)> {
        let size = size.as_ivec2();

        if pos.x < 0 || pos.y < 0 || pos.x >= size.x || pos.y >= size.y {
            return None;
        }

        let (s, valid) = sample(pos.as_uvec2());

        Some((s, if valid { 1.0 } else { 0.0 }))
    }

    pub fn coords(pos: Vec2) -> [IVec2; 4] {
        let p00 = ivec2(pos.x.floor() as i32, pos.y.floor() as i32);

        [p00, p00 + ivec2(1, 0), p00 + ivec2(0, 1), p00 + ivec2(1, 1)]
    }

    /// Returns the filtered value together with the sum of weights of taps
    /// that contributed to it; zero sum means the history is unusable.
    pub fn eval(&self) -> (Vec4, f32) {
        let uv = self.uv;

        let weights = self.weights
            * vec4(
                (1.0 - uv.x) * (1.0 - uv.y),
                uv.x * (1.0 - uv.y),
                (1.0 - uv.x) * uv.y,
                uv.x * uv.y,
            );

        let w_sum = weights.dot(Vec4::ONE);

        if w_sum <= 1e-5 {
            (Vec4::ZERO, 0.0)
        } else {
            let value = (self.s00 * weights.x
                + self.s10 * weights.y
                + self.s01 * weights.z
                + self.s11 * weights.w)
                / w_sum;

            (value, w_sum)
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{uvec2, vec2};

    use super::*;

    fn image(pos: UVec2) -> (Vec4, bool) {
        (Vec4::splat((pos.x + 10 * pos.y) as f32), true)
    }

    #[test]
    fn exact() {
        let (value, weight) =
            BilinearFilter::gather(vec2(1.5, 2.5), uvec2(4, 4), image).eval();

        assert_relative_eq!(21.0, value.x);
        assert_relative_eq!(1.0, weight);
    }

    #[test]
    fn halfway() {
        let (value, _) =
            BilinearFilter::gather(vec2(2.0, 1.5), uvec2(4, 4), image).eval();

        assert_relative_eq!(11.5, value.x);
    }

    #[test]
    fn rejected_taps_are_renormalized() {
        let (value, weight) =
            BilinearFilter::gather(vec2(2.0, 1.5), uvec2(4, 4), |pos| {
                (image(pos).0, pos.x == 2)
            })
            .eval();

        assert_relative_eq!(12.0, value.x);
        assert_relative_eq!(0.5, weight);
    }

    #[test]
    fn everything_rejected() {
        let (_, weight) =
            BilinearFilter::gather(vec2(2.0, 1.5), uvec2(4, 4), |pos| {
                (image(pos).0, false)
            })
            .eval();

        assert_eq!(0.0, weight);
    }

    #[test]
    fn outside_of_image() {
        let (value, weight) =
            BilinearFilter::gather(vec2(0.0, 0.5), uvec2(4, 4), image).eval();

        assert_relative_eq!(0.0, value.x);
        assert_relative_eq!(0.5, weight);
    }
}
