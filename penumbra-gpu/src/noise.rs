use core::f32::consts::PI;

use glam::{vec2, UVec2, Vec2};
use spirv_std::arch::IndexUnchecked;
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

/// Cheap hash-based noise; used where sample quality doesn't matter much
/// (e.g. rotating sampling patterns).
#[derive(Copy, Clone)]
pub struct WhiteNoise {
    state: u32,
}

impl WhiteNoise {
    pub fn new(seed: u32, id: UVec2) -> Self {
        Self {
            state: seed
                ^ 48619u32.wrapping_mul(id.x)
                ^ 95461u32.wrapping_mul(id.y),
        }
    }

    /// Generates a uniform sample in range `<0.0, 1.0)`.
    pub fn sample(&mut self) -> f32 {
        (self.sample_int() >> 8) as f32 / 16777216.0
    }

    /// Generates a uniform sample in range `<0, u32::MAX>`.
    pub fn sample_int(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(747796405)
            .wrapping_add(2891336453);

        let word = ((self.state >> ((self.state >> 28) + 4)) ^ self.state)
            .wrapping_mul(277803737);

        (word >> 22) ^ word
    }

    pub fn sample2(&mut self) -> Vec2 {
        vec2(self.sample(), self.sample())
    }

    /// Generates a random angle in range `<0.0, 2 * PI)`.
    pub fn sample_angle(&mut self) -> f32 {
        self.sample() * 2.0 * PI
    }
}

/// Tables of the blue-noise sampler (Sobol sequence + per-pixel scrambling
/// and ranking, see `blue_noise_sample()`).
#[derive(Clone, Copy)]
pub struct BlueNoiseTables<'a> {
    pub sobol: &'a [u32],
    pub scrambling_tile: &'a [u32],
    pub ranking_tile: &'a [u32],
}

/// Blue-noise sampler distributing Monte Carlo errors as blue noise in
/// screen space; each call to `sample()` advances the dimension.
#[derive(Clone, Copy)]
pub struct BlueNoise<'a> {
    tables: BlueNoiseTables<'a>,
    pixel: UVec2,
    sample_index: u32,
    dimension: u32,
}

impl<'a> BlueNoise<'a> {
    /// Size of the scrambling and ranking tiles, in pixels.
    pub const TILE_SIZE: u32 = 128;

    /// Number of dimensions each tile has been optimized for.
    pub const TILE_DIMENSIONS: u32 = 8;

    pub fn new(
        tables: BlueNoiseTables<'a>,
        pixel: UVec2,
        sample_index: u32,
    ) -> Self {
        Self {
            tables,
            pixel,
            sample_index,
            dimension: 0,
        }
    }

    pub fn sample(&mut self) -> f32 {
        let value = blue_noise_sample(
            self.tables,
            self.pixel,
            self.sample_index,
            self.dimension,
        );

        self.dimension += 1;
        value
    }

    pub fn sample2(&mut self) -> Vec2 {
        vec2(self.sample(), self.sample())
    }
}

/// Returns a sample from the Heitz et al. blue-noise sampler ("A Low-
/// Discrepancy Sampler that Distributes Monte Carlo Errors as a Blue Noise in
/// Screen Space", 2019).
pub fn blue_noise_sample(
    tables: BlueNoiseTables,
    pixel: UVec2,
    sample_index: u32,
    dimension: u32,
) -> f32 {
    let pixel = pixel % BlueNoise::TILE_SIZE;
    let sample_index = sample_index & 255;
    let dimension = dimension & 255;

    let tile_idx = (dimension % BlueNoise::TILE_DIMENSIONS)
        + (pixel.x + pixel.y * BlueNoise::TILE_SIZE)
            * BlueNoise::TILE_DIMENSIONS;

    let ranked_sample_index = sample_index
        ^ unsafe { *tables.ranking_tile.index_unchecked(tile_idx as usize) };

    let sobol_idx = dimension + (ranked_sample_index & 255) * 256;
    let value = unsafe { *tables.sobol.index_unchecked(sobol_idx as usize) };

    let value = value
        ^ unsafe {
            *tables.scrambling_tile.index_unchecked(tile_idx as usize)
        };

    (0.5 + (value & 255) as f32) / 256.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn white_noise_range() {
        let mut noise = WhiteNoise::new(0xcafebabe, UVec2::new(123, 456));

        for _ in 0..1024 {
            let sample = noise.sample();

            assert!(sample >= 0.0 && sample < 1.0);
        }
    }

    #[test]
    fn white_noise_depends_on_pixel() {
        let mut a = WhiteNoise::new(1, UVec2::new(0, 0));
        let mut b = WhiteNoise::new(1, UVec2::new(1, 0));

        assert_ne!(a.sample_int(), b.sample_int());
    }

    #[test]
    fn blue_noise_stays_in_bounds() {
        // The tables are filled with the largest values the real ones carry,
        // so that any out-of-bounds access would be caught by the slices.
        let sobol = vec![255u32; 256 * 256];
        let tile = vec![255u32; 128 * 128 * 8];

        let tables = BlueNoiseTables {
            sobol: &sobol,
            scrambling_tile: &tile,
            ranking_tile: &tile,
        };

        let mut noise =
            BlueNoise::new(tables, UVec2::new(u32::MAX, 1000), u32::MAX);

        for _ in 0..300 {
            let sample = noise.sample();

            assert!(sample > 0.0 && sample < 1.0);
        }
    }

    #[test]
    fn blue_noise_scrambles_per_pixel() {
        let sobol: Vec<_> = (0..256 * 256).map(|i| (i % 256) as u32).collect();
        let ranking = vec![0u32; 128 * 128 * 8];

        let scrambling: Vec<_> =
            (0..128 * 128 * 8).map(|i| (i / 8 % 256) as u32).collect();

        let tables = BlueNoiseTables {
            sobol: &sobol,
            scrambling_tile: &scrambling,
            ranking_tile: &ranking,
        };

        let a = blue_noise_sample(tables, UVec2::new(0, 0), 0, 3);
        let b = blue_noise_sample(tables, UVec2::new(1, 0), 0, 3);

        assert_eq!((0.5 + 3.0) / 256.0, a);
        assert_eq!((0.5 + (3 ^ 1) as f32) / 256.0, b);
    }
}
