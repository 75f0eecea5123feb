use glam::{vec2, Vec2};

/// Returns the `index`-th element of the Halton sequence of given base, in
/// `<0.0, 1.0)`.
pub fn halton(mut index: u32, base: u32) -> f32 {
    let mut f = 1.0;
    let mut r = 0.0;

    while index > 0 {
        f /= base as f32;
        r += f * (index % base) as f32;
        index /= base;
    }

    r
}

/// Returns sub-pixel jitter for given frame, cycling through the first
/// `samples` points of the Halton(2, 3) sequence, mapped to `<-1.0, 1.0)`.
///
/// To apply it, translate the projection by `jitter / resolution` (in NDC).
pub fn halton_jitter(frame: u32, samples: u32) -> Vec2 {
    let index = frame % samples.max(1) + 1;

    vec2(halton(index, 2), halton(index, 3)) * 2.0 - 1.0
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn base_2() {
        let actual: Vec<_> = (1..=4).map(|i| halton(i, 2)).collect();

        assert_eq!(vec![0.5, 0.25, 0.75, 0.125], actual);
    }

    #[test]
    fn base_3() {
        assert_relative_eq!(1.0 / 3.0, halton(1, 3));
        assert_relative_eq!(2.0 / 3.0, halton(2, 3));
        assert_relative_eq!(1.0 / 9.0, halton(3, 3));
    }

    #[test]
    fn jitter_cycles() {
        for frame in 0..16 {
            assert_eq!(halton_jitter(frame, 16), halton_jitter(frame + 16, 16));
        }

        assert_ne!(halton_jitter(0, 16), halton_jitter(1, 16));
    }

    #[test]
    fn jitter_range() {
        for frame in 0..16 {
            let jitter = halton_jitter(frame, 16);

            assert!(jitter.cmpge(Vec2::splat(-1.0)).all());
            assert!(jitter.cmplt(Vec2::splat(1.0)).all());
        }
    }
}
