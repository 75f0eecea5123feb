use log::info;

use crate::{Bindable, StorageBuffer};

/// Tables of the blue-noise sampler, shared by all ray-tracing passes.
///
/// Uploaded once, when the engine is created; the tables come from
/// `blue_noise_sampler::spp2`.
#[derive(Debug)]
pub struct Noise {
    sobol: StorageBuffer<u32>,
    scrambling_tile: StorageBuffer<u32>,
    ranking_tile: StorageBuffer<u32>,
}

impl Noise {
    pub fn new(device: &wgpu::Device) -> Self {
        use blue_noise_sampler::spp2 as bn;

        info!("Initializing blue noise");

        Self {
            sobol: StorageBuffer::new(
                device,
                "blue_noise_sobol",
                &table(&bn::SOBOL),
            ),
            scrambling_tile: StorageBuffer::new(
                device,
                "blue_noise_scrambling_tile",
                &table(&bn::SCRAMBLING_TILE),
            ),
            ranking_tile: StorageBuffer::new(
                device,
                "blue_noise_ranking_tile",
                &table(&bn::RANKING_TILE),
            ),
        }
    }

    pub fn bind_sobol(&self) -> impl Bindable + '_ {
        self.sobol.bind_readable()
    }

    pub fn bind_scrambling_tile(&self) -> impl Bindable + '_ {
        self.scrambling_tile.bind_readable()
    }

    pub fn bind_ranking_tile(&self) -> impl Bindable + '_ {
        self.ranking_tile.bind_readable()
    }
}

/// Shaders read the tables as `u32`; all values are non-negative.
fn table(values: &[i32]) -> Vec<u32> {
    values.iter().map(|&value| value as u32).collect()
}

#[cfg(test)]
mod tests {
    use blue_noise_sampler::spp2 as bn;

    use super::*;

    #[test]
    fn tables_are_non_negative() {
        assert!(bn::SOBOL.iter().all(|&value| value >= 0));
        assert!(bn::SCRAMBLING_TILE.iter().all(|&value| value >= 0));
        assert!(bn::RANKING_TILE.iter().all(|&value| value >= 0));
    }

    #[test]
    fn conversion() {
        assert_eq!(vec![0, 1, 255], table(&[0, 1, 255]));
    }
}
