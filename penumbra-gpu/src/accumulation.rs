use glam::Vec3;

use crate::lerp;

/// Progressive (running) average used by the ground-truth path tracer.
///
/// `frame_idx` is the number of samples averaged so far; zero means there's
/// no history and `sample` is returned as-is.
pub fn progressive_average(
    history: Vec3,
    sample: Vec3,
    frame_idx: u32,
) -> Vec3 {
    lerp(history, sample, 1.0 / (frame_idx as f32 + 1.0))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::WhiteNoise;

    #[test]
    fn first_frame_discards_history() {
        let actual =
            progressive_average(Vec3::splat(100.0), Vec3::splat(0.5), 0);

        assert_eq!(Vec3::splat(0.5), actual);
    }

    #[test]
    fn equals_arithmetic_mean() {
        let samples = [0.1, 0.9, 0.4, 0.6, 0.5];
        let mut value = Vec3::ZERO;

        for (frame_idx, sample) in samples.iter().enumerate() {
            value = progressive_average(
                value,
                Vec3::splat(*sample),
                frame_idx as u32,
            );
        }

        assert_relative_eq!(0.5, value.x, epsilon = 1e-6);
    }

    #[test]
    fn variance_decreases_over_time() {
        // Simulates many independent pixels of a static scene, each
        // accumulating noisy samples, and checks the spread of the estimates
        // shrinks as the accumulation goes on.
        const PIXELS: u32 = 2048;

        let mut values = vec![Vec3::ZERO; PIXELS as usize];
        let mut noises: Vec<_> = (0..PIXELS)
            .map(|id| WhiteNoise::new(1234, glam::uvec2(id, 0)))
            .collect();

        let mut prev_variance = f32::MAX;

        for frame_idx in 0..256 {
            for (value, noise) in values.iter_mut().zip(&mut noises) {
                let sample = Vec3::splat(noise.sample());

                *value = progressive_average(*value, sample, frame_idx);
            }

            if (frame_idx + 1) % 32 == 0 {
                let mean = values.iter().map(|v| v.x).sum::<f32>()
                    / PIXELS as f32;

                let variance = values
                    .iter()
                    .map(|v| (v.x - mean) * (v.x - mean))
                    .sum::<f32>()
                    / PIXELS as f32;

                assert!(variance <= prev_variance);

                prev_variance = variance;
            }
        }

        assert!(prev_variance < 0.001);
    }

    #[test]
    fn long_accumulation_needs_full_precision() {
        // Rounds to the nearest value representable as a 16-bit float
        fn to_half(x: f32) -> f32 {
            f32::from_bits((x.to_bits() + 0x1000) & !0x1fff)
        }

        let mut full = Vec3::ZERO;
        let mut half = Vec3::ZERO;
        let mut hits = 0;

        // A rarely-hit light source: one in ten samples finds it
        for frame_idx in 0..4096 {
            let sample = if frame_idx % 10 == 0 {
                hits += 1;
                Vec3::ONE
            } else {
                Vec3::ZERO
            };

            full = progressive_average(full, sample, frame_idx);
            half = progressive_average(half, sample, frame_idx);
            half = Vec3::splat(to_half(half.x));
        }

        let expected = hits as f32 / 4096.0;

        assert_relative_eq!(expected, full.x, epsilon = 1e-3);

        // Once the weights drop below half of the precision, the small
        // corrections vanish and the average drifts away
        assert!((half.x - expected).abs() > 0.01);
    }
}
