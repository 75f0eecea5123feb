use bytemuck::{Pod, Zeroable};
use glam::{uvec2, UVec2};

/// Size of a tile, in pixels; a tile's visibility bits fit a single `u32`.
pub const TILE_SIZE: UVec2 = uvec2(8, 4);

/// Returns how many tiles are needed to cover an image of given size.
pub fn tile_count(size: UVec2) -> UVec2 {
    (size + TILE_SIZE - 1) / TILE_SIZE
}

/// Visibility of a tile's pixels, one bit per pixel, with bit number
/// `y * 8 + x`.
#[repr(C)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct TileMask(u32);

impl TileMask {
    pub fn new(bits: u32) -> Self {
        Self(bits)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn bit(local: UVec2) -> u32 {
        1 << (local.y * TILE_SIZE.x + local.x)
    }

    pub fn with(self, local: UVec2, visible: bool) -> Self {
        if visible {
            Self(self.0 | Self::bit(local))
        } else {
            Self(self.0 & !Self::bit(local))
        }
    }

    pub fn is_visible(self, local: UVec2) -> bool {
        self.0 & Self::bit(local) != 0
    }

    pub fn visibility(self, local: UVec2) -> f32 {
        if self.is_visible(local) {
            1.0
        } else {
            0.0
        }
    }

    /// Returns the mask of pixels of given tile that lay inside of an image
    /// sized `size`; tiles at the right and bottom edges can be partial.
    pub fn valid_pixels(tile: UVec2, size: UVec2) -> Self {
        let origin = tile * TILE_SIZE;
        let mut bits = 0;
        let mut y = 0;

        while y < TILE_SIZE.y {
            let mut x = 0;

            while x < TILE_SIZE.x {
                if origin.x + x < size.x && origin.y + y < size.y {
                    bits |= Self::bit(uvec2(x, y));
                }

                x += 1;
            }

            y += 1;
        }

        Self(bits)
    }

    /// Classifies this tile, considering only the `valid` pixels.
    pub fn classify(self, valid: Self) -> TileClass {
        let bits = self.0 & valid.0;

        if bits == 0 {
            TileClass::Occluded
        } else if bits == valid.0 {
            TileClass::Visible
        } else {
            TileClass::Mixed
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub enum TileClass {
    /// All pixels are occluded (shadowed / occluded by nearby geometry)
    Occluded,

    /// All pixels are visible
    Visible,

    /// Pixels disagree; such tile has to go through the filters
    Mixed,
}

impl TileClass {
    pub fn is_uniform(self) -> bool {
        self != TileClass::Mixed
    }
}

/// Tile coordinates packed into a single `u32`, as stored in the tile lists
/// consumed by indirect dispatches.
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct TileCoord(UVec2);

impl TileCoord {
    pub fn new(tile: UVec2) -> Self {
        Self(tile)
    }

    pub fn get(self) -> UVec2 {
        self.0
    }

    pub fn pack(self) -> u32 {
        (self.0.x & 0xffff) | (self.0.y << 16)
    }

    pub fn unpack(d0: u32) -> Self {
        Self(uvec2(d0 & 0xffff, d0 >> 16))
    }

    /// Returns the position of a tile's pixel in the image.
    pub fn pixel(self, local: UVec2) -> UVec2 {
        self.0 * TILE_SIZE + local
    }
}

/// Arguments of `dispatch_workgroups_indirect()`, as laid out in the
/// indirect buffer.
#[repr(C)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct DispatchIndirectArgs {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl DispatchIndirectArgs {
    /// Workgroups per row of a tile-list dispatch; longer lists spill into
    /// further rows, since a single dimension can't exceed 65535 workgroups
    /// (which a full-resolution 4K image does).
    pub const ROW_LENGTH: u32 = 1024;

    /// Arguments of an empty list, as written before each classification.
    pub fn reset() -> Self {
        Self { x: 0, y: 1, z: 1 }
    }

    /// Returns arguments covering a list of `len` tiles.
    ///
    /// Grows monotonically with `len`, so concurrent pushes can maintain it
    /// through atomic maximums.
    pub fn for_list(len: u32) -> Self {
        Self {
            x: len.min(Self::ROW_LENGTH),
            y: ((len + Self::ROW_LENGTH - 1) / Self::ROW_LENGTH).max(1),
            z: 1,
        }
    }

    /// Returns which entry of a tile list given workgroup processes; the
    /// last row can contain workgroups past the list's end.
    pub fn list_entry(workgroup_id: UVec2) -> u32 {
        workgroup_id.y * Self::ROW_LENGTH + workgroup_id.x
    }
}

/// Number of `u32`s preceding the entries of a tile list; the first one
/// holds the list's length.
pub const TILE_LIST_HEADER: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts() {
        assert_eq!(uvec2(1, 1), tile_count(uvec2(8, 4)));
        assert_eq!(uvec2(2, 2), tile_count(uvec2(9, 5)));
        assert_eq!(uvec2(240, 270), tile_count(uvec2(1920, 1080)));
    }

    #[test]
    fn pack_and_unpack_bits() {
        let visible = |x: u32, y: u32| (x * 7 + y * 3) % 5 < 2;
        let mut mask = TileMask::default();

        for y in 0..TILE_SIZE.y {
            for x in 0..TILE_SIZE.x {
                mask = mask.with(uvec2(x, y), visible(x, y));
            }
        }

        for y in 0..TILE_SIZE.y {
            for x in 0..TILE_SIZE.x {
                assert_eq!(visible(x, y), mask.is_visible(uvec2(x, y)));
            }
        }
    }

    #[test]
    fn bit_order() {
        assert_eq!(1, TileMask::bit(uvec2(0, 0)));
        assert_eq!(1 << 7, TileMask::bit(uvec2(7, 0)));
        assert_eq!(1 << 8, TileMask::bit(uvec2(0, 1)));
        assert_eq!(1 << 31, TileMask::bit(uvec2(7, 3)));
    }

    #[test]
    fn valid_pixels() {
        assert_eq!(
            u32::MAX,
            TileMask::valid_pixels(uvec2(0, 0), uvec2(9, 5)).get()
        );

        // Only the first column and row are inside of the image
        assert_eq!(
            0b1_0000_0001 | 1 << 16 | 1 << 24,
            TileMask::valid_pixels(uvec2(1, 0), uvec2(9, 5)).get()
        );

        assert_eq!(
            0xff,
            TileMask::valid_pixels(uvec2(0, 1), uvec2(9, 5)).get()
        );
    }

    #[test]
    fn classify() {
        let all = TileMask::new(u32::MAX);

        assert_eq!(TileClass::Occluded, TileMask::new(0).classify(all));
        assert_eq!(TileClass::Visible, TileMask::new(u32::MAX).classify(all));
        assert_eq!(TileClass::Mixed, TileMask::new(1).classify(all));
    }

    #[test]
    fn classify_ignores_pixels_outside_of_image() {
        let valid = TileMask::new(0xff);

        assert_eq!(TileClass::Visible, TileMask::new(0xff).classify(valid));
        assert_eq!(
            TileClass::Occluded,
            TileMask::new(0xff00).classify(valid)
        );
    }

    #[test]
    fn coords() {
        let coord = TileCoord::new(uvec2(239, 269));

        assert_eq!(coord, TileCoord::unpack(coord.pack()));
        assert_eq!(uvec2(239 * 8 + 3, 269 * 4 + 1), coord.pixel(uvec2(3, 1)));
    }

    #[test]
    fn empty_list_dispatches_nothing() {
        let args = DispatchIndirectArgs::for_list(0);

        assert_eq!(DispatchIndirectArgs::reset(), args);
        assert_eq!(0, args.x * args.y * args.z);
    }

    #[test]
    fn list_dispatch_dimensions() {
        let args = |len| {
            let args = DispatchIndirectArgs::for_list(len);

            (args.x, args.y, args.z)
        };

        assert_eq!((1, 1, 1), args(1));
        assert_eq!((1024, 1, 1), args(1024));
        assert_eq!((1024, 2, 1), args(1025));
    }

    #[test]
    fn full_resolution_4k_list_fits_dispatch_limits() {
        let tiles = tile_count(uvec2(3840, 2160));
        let len = tiles.x * tiles.y;

        assert!(len > 65535);

        let args = DispatchIndirectArgs::for_list(len);

        assert!(args.x <= 65535);
        assert!(args.y <= 65535);
        assert!(args.x * args.y >= len);
    }

    #[test]
    fn each_entry_gets_exactly_one_workgroup() {
        let len = 2500;
        let args = DispatchIndirectArgs::for_list(len);
        let mut entries = Vec::new();

        for y in 0..args.y {
            for x in 0..args.x {
                let entry = DispatchIndirectArgs::list_entry(uvec2(x, y));

                if entry < len {
                    entries.push(entry);
                }
            }
        }

        entries.sort();

        assert_eq!((0..len).collect::<Vec<_>>(), entries);
    }

    #[test]
    fn concurrent_pushes_converge() {
        // Pushes race each other, so each one bumps the arguments through
        // an atomic maximum with what its own index requires
        let mut args = DispatchIndirectArgs::reset();

        for idx in [3000, 5, 1023, 1024, 0, 2047] {
            let required = DispatchIndirectArgs::for_list(idx + 1);

            args.x = args.x.max(required.x);
            args.y = args.y.max(required.y);
        }

        assert_eq!(DispatchIndirectArgs::for_list(3001), args);
    }
}
