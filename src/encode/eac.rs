use crate::{block::PixelBlock, encode::common::selector_index, EtcSettings};

/// EAC alpha modifier tables, selectors index the rows directly.
pub(crate) const ALPHA_MODIFIERS: [[i32; 8]; 16] = [
    [-3, -6, -9, -15, 2, 5, 8, 14],
    [-3, -7, -10, -13, 2, 6, 9, 12],
    [-2, -5, -8, -13, 1, 4, 7, 12],
    [-2, -4, -6, -13, 1, 3, 5, 12],
    [-3, -6, -8, -12, 2, 5, 7, 11],
    [-3, -7, -9, -11, 2, 6, 8, 10],
    [-4, -7, -8, -11, 3, 6, 7, 10],
    [-3, -5, -8, -11, 2, 4, 7, 10],
    [-2, -6, -8, -10, 1, 5, 7, 9],
    [-2, -5, -8, -10, 1, 4, 7, 9],
    [-2, -4, -8, -10, 1, 3, 7, 9],
    [-2, -5, -7, -10, 1, 4, 6, 9],
    [-3, -4, -7, -10, 2, 3, 6, 9],
    [-1, -2, -3, -10, 0, 1, 2, 9],
    [-4, -6, -8, -9, 3, 5, 7, 8],
    [-3, -5, -7, -9, 2, 4, 6, 8],
];

/// Table 13 holds a zero modifier at selector 4, used for uniform alpha.
const UNIFORM_TABLE: usize = 13;
const UNIFORM_SELECTOR: u8 = 4;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct AlphaBlock {
    pub(crate) base: i32,
    pub(crate) multiplier: i32,
    pub(crate) table: usize,
    /// Row-major selectors.
    pub(crate) selectors: [u8; 16],
    pub(crate) error: u32,
}

impl AlphaBlock {
    pub(crate) fn pack(&self) -> u64 {
        let mut bits = (self.base as u64) << 56;
        bits |= (self.multiplier as u64) << 52;
        bits |= (self.table as u64) << 48;

        for y in 0..4 {
            for x in 0..4 {
                let shift = 45 - 3 * selector_index(x, y);
                bits |= (self.selectors[y * 4 + x] as u64) << shift;
            }
        }

        bits
    }
}

#[inline(always)]
fn alpha_value(base: i32, multiplier: i32, table: usize, selector: usize) -> i32 {
    (base + multiplier * ALPHA_MODIFIERS[table][selector]).clamp(0, 255)
}

pub(crate) struct BlockCompressorEac<'a> {
    settings: &'a EtcSettings,
    alpha: [i32; 16],
}

impl<'a> BlockCompressorEac<'a> {
    pub(crate) fn new(settings: &'a EtcSettings) -> Self {
        Self {
            settings,
            alpha: [0; 16],
        }
    }

    pub(crate) fn load_block(&mut self, block: &PixelBlock) {
        for y in 0..4 {
            for x in 0..4 {
                self.alpha[y * 4 + x] = block.rgba(x, y)[3] as i32;
            }
        }
    }

    pub(crate) fn store_data(&self, bits: u64, destination: &mut [u8]) {
        destination.copy_from_slice(&bits.to_be_bytes());
    }

    pub(crate) fn compress_block_core(&self) -> AlphaBlock {
        let min = self.alpha.iter().copied().min().unwrap_or(0);
        let max = self.alpha.iter().copied().max().unwrap_or(0);

        if min == max {
            return AlphaBlock {
                base: min,
                multiplier: 1,
                table: UNIFORM_TABLE,
                selectors: [UNIFORM_SELECTOR; 16],
                error: 0,
            };
        }

        let radius = self.settings.alpha_radius;
        let mut best: Option<AlphaBlock> = None;

        for table in 0..ALPHA_MODIFIERS.len() {
            let row = &ALPHA_MODIFIERS[table];
            let low = row.iter().copied().min().unwrap_or(0);
            let high = row.iter().copied().max().unwrap_or(0);

            let multiplier =
                ((max - min) as f32 / (high - low) as f32).round().clamp(1.0, 15.0) as i32;

            for multiplier in multiplier - radius..=multiplier + radius {
                if !(1..=15).contains(&multiplier) {
                    continue;
                }

                let center =
                    (min + max) as f32 / 2.0 - (low + high) as f32 * multiplier as f32 / 2.0;
                let center = center.round() as i32;

                for base in center - radius..=center + radius {
                    let base = base.clamp(0, 255);
                    let candidate = self.fit(base, multiplier, table);

                    if best.map_or(true, |best| candidate.error < best.error) {
                        best = Some(candidate);
                    }
                }
            }
        }

        // At least one multiplier lies in 1..=15 for every table.
        best.unwrap_or_else(|| self.fit((min + max) / 2, 1, 0))
    }

    fn fit(&self, base: i32, multiplier: i32, table: usize) -> AlphaBlock {
        let mut selectors = [0u8; 16];
        let mut error = 0;

        for (texel, &alpha) in self.alpha.iter().enumerate() {
            let mut best_selector = 0;
            let mut best_error = u32::MAX;

            for selector in 0..8 {
                let diff = alpha_value(base, multiplier, table, selector) - alpha;
                let texel_error = (diff * diff) as u32;
                if texel_error < best_error {
                    best_error = texel_error;
                    best_selector = selector;
                }
            }

            selectors[texel] = best_selector as u8;
            error += best_error;
        }

        AlphaBlock {
            base,
            multiplier,
            table,
            selectors,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alpha_block(alpha: [u8; 16]) -> PixelBlock {
        PixelBlock::from_rgba(alpha.map(|a| [0, 0, 0, a]))
    }

    fn decode(bits: u64) -> [i32; 16] {
        let base = (bits >> 56) as i32;
        let multiplier = ((bits >> 52) & 0xF) as i32;
        let table = ((bits >> 48) & 0xF) as usize;

        let mut alpha = [0; 16];
        for y in 0..4 {
            for x in 0..4 {
                let selector = ((bits >> (45 - 3 * selector_index(x, y))) & 7) as usize;
                alpha[y * 4 + x] = alpha_value(base, multiplier, table, selector);
            }
        }
        alpha
    }

    #[test]
    fn uniform_alpha_is_exact() {
        let settings = EtcSettings::fast();
        let mut compressor = BlockCompressorEac::new(&settings);

        for value in [0u8, 1, 128, 254, 255] {
            compressor.load_block(&alpha_block([value; 16]));
            let block = compressor.compress_block_core();
            assert_eq!(block.error, 0);
            assert_eq!(block.multiplier, 1);
            assert_eq!(decode(block.pack()), [value as i32; 16]);
        }
    }

    #[test]
    fn binary_alpha_is_exact() {
        let settings = EtcSettings::medium();
        let mut compressor = BlockCompressorEac::new(&settings);

        let mut alpha = [0u8; 16];
        for (index, value) in alpha.iter_mut().enumerate() {
            *value = if index % 3 == 0 { 255 } else { 0 };
        }
        compressor.load_block(&alpha_block(alpha));

        let block = compressor.compress_block_core();
        assert_eq!(decode(block.pack()), alpha.map(|a| a as i32));
    }

    #[test]
    fn ramp_error_is_bounded() {
        let settings = EtcSettings::medium();
        let mut compressor = BlockCompressorEac::new(&settings);

        let alpha = std::array::from_fn(|index| (index * 16) as u8);
        compressor.load_block(&alpha_block(alpha));

        let block = compressor.compress_block_core();
        let decoded = decode(block.pack());
        let error: i32 = decoded
            .iter()
            .zip(alpha)
            .map(|(&decoded, alpha)| (decoded - alpha as i32).pow(2))
            .sum();
        assert_eq!(error as u32, block.error);
        assert!(block.error < 16 * 100, "error {}", block.error);
    }

    #[test]
    fn selectors_are_stored_column_major() {
        let mut selectors = [0u8; 16];
        // Texel (1, 0) is the fifth selector in column-major order.
        selectors[1] = 0b101;
        let block = AlphaBlock {
            base: 0xAB,
            multiplier: 3,
            table: 9,
            selectors,
            error: 0,
        };

        let bits = block.pack();
        assert_eq!(bits >> 56, 0xAB);
        assert_eq!((bits >> 52) & 0xF, 3);
        assert_eq!((bits >> 48) & 0xF, 9);
        assert_eq!((bits >> (45 - 12)) & 7, 0b101);
    }
}
