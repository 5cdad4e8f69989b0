use crate::raster::RasterImage;

/// Sixteen texels of a 4x4 block, row-major.
///
/// Each texel is packed into one word with red in the lowest byte followed by
/// green, blue and alpha.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct PixelBlock {
    texels: [u32; 16],
}

impl PixelBlock {
    /// Gathers the 4x4 window anchored at `(x, y)`.
    ///
    /// Coordinates past the right or bottom edge are clamped to the last valid
    /// column or row, so partial border blocks replicate their edge texels.
    pub fn gather(image: &RasterImage, x: u32, y: u32) -> Self {
        let mut texels = [0; 16];

        for block_y in 0..4 {
            for block_x in 0..4 {
                let texel = image.texel_clamped(x + block_x, y + block_y);
                texels[(block_y * 4 + block_x) as usize] = u32::from_le_bytes(texel);
            }
        }

        Self { texels }
    }

    pub const fn from_words(texels: [u32; 16]) -> Self {
        Self { texels }
    }

    /// Builds a block from sixteen RGBA texels in row-major order.
    pub fn from_rgba(rgba: [[u8; 4]; 16]) -> Self {
        Self {
            texels: rgba.map(u32::from_le_bytes),
        }
    }

    pub const fn words(&self) -> &[u32; 16] {
        &self.texels
    }

    /// Texel at `(x, y)` inside the block as RGBA.
    #[inline(always)]
    pub fn rgba(&self, x: usize, y: usize) -> [u8; 4] {
        self.texels[y * 4 + x].to_le_bytes()
    }

    /// All texels as RGBA in row-major order.
    pub fn to_rgba(&self) -> [[u8; 4]; 16] {
        self.texels.map(u32::to_le_bytes)
    }
}
