use crate::{TemporalBlend, TileClass};

/// Ambient occlusion below which a pixel takes part in the blur; tiles
/// without such pixels are fully unoccluded and skip it.
pub const AO_BLUR_THRESHOLD: f32 = 0.999;

/// Upper bound of the disocclusion blur's radius; it's allowed to be wider
/// than the regular blur.
pub const MAX_DISOCCLUSION_RADIUS: u32 = 8;

/// Returns whether a pixel, traced with `rays` rays out of which
/// `unoccluded` escaped, is considered unoccluded (i.e. its tile bit is set).
pub fn ao_bit(unoccluded: u32, rays: u32) -> bool {
    2 * unoccluded >= rays.max(1)
}

pub fn needs_blur(ao: f32) -> bool {
    ao < AO_BLUR_THRESHOLD
}

/// Returns the ambient occlusion of tiles that are unoccluded (or occluded)
/// as a whole; such tiles skip accumulation and both blurs.
pub fn uniform_ao(class: TileClass) -> Option<f32> {
    match class {
        TileClass::Visible => Some(1.0),
        TileClass::Occluded => Some(0.0),
        TileClass::Mixed => None,
    }
}

/// Returns whether a pixel has too short history to be trusted and needs the
/// wider disocclusion blur.
pub fn is_disoccluded(history_length: f32, threshold: f32) -> bool {
    history_length < threshold
}

#[derive(Clone, Copy)]
pub struct AoTemporal {
    pub alpha: f32,
}

impl AoTemporal {
    /// Returns the new ambient occlusion and history length; rejected history
    /// has length zero.
    pub fn resolve(
        self,
        ao: f32,
        history: f32,
        history_length: f32,
    ) -> (f32, f32) {
        let blend = TemporalBlend::new(self.alpha, history_length);

        (blend.blend(history, ao), blend.history_length)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use glam::uvec2;

    use super::*;
    use crate::TileMask;

    #[test]
    fn bits() {
        assert!(ao_bit(1, 1));
        assert!(!ao_bit(0, 1));
        assert!(ao_bit(2, 4));
        assert!(!ao_bit(1, 4));
        assert!(!ao_bit(0, 0));
    }

    #[test]
    fn blur_and_disocclusion_classification() {
        assert!(needs_blur(0.5));
        assert!(!needs_blur(1.0));
        assert!(is_disoccluded(1.0, 8.0));
        assert!(!is_disoccluded(8.0, 8.0));
    }

    #[test]
    fn fully_unoccluded_tile_emits_one() {
        let size = uvec2(1920, 1080);
        let valid = TileMask::valid_pixels(uvec2(3, 5), size);
        let class = TileMask::new(u32::MAX).classify(valid);

        assert_eq!(Some(1.0), uniform_ao(class));

        // Blending with stale history would've given a value below one
        let (blended, _) = AoTemporal { alpha: 0.01 }.resolve(1.0, 0.0, 2.0);

        assert!(needs_blur(blended));
    }

    #[test]
    fn fully_occluded_tile_emits_zero() {
        let size = uvec2(9, 5);
        let valid = TileMask::valid_pixels(uvec2(1, 1), size);

        // Only the corner pixel lies inside of the image; the rest of the
        // bits are garbage
        let class = TileMask::new(!1).classify(valid);

        assert_eq!(Some(0.0), uniform_ao(class));
    }

    #[test]
    fn mixed_tile_gets_accumulated() {
        let valid = TileMask::new(u32::MAX);

        assert_eq!(None, uniform_ao(TileMask::new(0xf0f0).classify(valid)));
    }

    #[test]
    fn resolve() {
        let temporal = AoTemporal { alpha: 0.01 };

        assert_eq!((0.0, 1.0), temporal.resolve(0.0, 1.0, 0.0));

        let (ao, len) = temporal.resolve(0.0, 1.0, 3.0);

        assert_relative_eq!(0.75, ao);
        assert_eq!(4.0, len);
    }
}
