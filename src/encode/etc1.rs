use crate::{
    block::PixelBlock,
    encode::common::{
        clamp_u8, expand, intensity_modifier, quantize, rgb_error, selector_index,
    },
    EtcSettings,
};

/// Best intensity table and selectors for one sub-block and base color.
#[derive(Copy, Clone, Debug)]
struct SubBlockFit {
    /// Quantized base color (4 or 5 bits per channel).
    color: [i32; 3],
    table: u8,
    /// Selectors of the eight sub-block texels, in sub-block texel order.
    selectors: [u8; 8],
    error: u32,
}

/// A fully chosen ETC1 block.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Etc1Block {
    flip: bool,
    differential: bool,
    colors: [[i32; 3]; 2],
    tables: [u8; 2],
    /// Selectors indexed by `x * 4 + y`.
    selectors: [u8; 16],
    pub(crate) error: u32,
}

impl Etc1Block {
    pub(crate) fn pack(&self) -> u64 {
        let mut bits = 0u64;
        let [first, second] = self.colors;

        if self.differential {
            for (channel, shift) in [59, 51, 43].into_iter().enumerate() {
                let delta = second[channel] - first[channel];
                bits |= (first[channel] as u64) << shift;
                bits |= ((delta & 7) as u64) << (shift - 3);
            }
        } else {
            for (channel, shift) in [60, 52, 44].into_iter().enumerate() {
                bits |= (first[channel] as u64) << shift;
                bits |= (second[channel] as u64) << (shift - 4);
            }
        }

        bits |= (self.tables[0] as u64) << 37;
        bits |= (self.tables[1] as u64) << 34;
        bits |= (self.differential as u64) << 33;
        bits |= (self.flip as u64) << 32;

        for (index, &selector) in self.selectors.iter().enumerate() {
            bits |= ((selector >> 1) as u64) << (16 + index);
            bits |= ((selector & 1) as u64) << index;
        }

        bits
    }
}

/// Texel coordinates `(x, y)` of one half of the block.
const fn sub_block_coords(flip: bool, sub_block: usize) -> [(usize, usize); 8] {
    let mut coords = [(0, 0); 8];
    let mut index = 0;
    while index < 8 {
        coords[index] = if flip {
            (index % 4, sub_block * 2 + index / 4)
        } else {
            (sub_block * 2 + index / 4, index % 4)
        };
        index += 1;
    }
    coords
}

pub(crate) struct BlockCompressorEtc1<'a> {
    settings: &'a EtcSettings,
    /// RGB texels in row-major order.
    texels: [[i32; 3]; 16],
}

impl<'a> BlockCompressorEtc1<'a> {
    pub(crate) fn new(settings: &'a EtcSettings) -> Self {
        Self {
            settings,
            texels: [[0; 3]; 16],
        }
    }

    pub(crate) fn load_block(&mut self, block: &PixelBlock) {
        for y in 0..4 {
            for x in 0..4 {
                let [red, green, blue, _] = block.rgba(x, y);
                self.texels[y * 4 + x] = [red as i32, green as i32, blue as i32];
            }
        }
    }

    #[inline(always)]
    fn texel(&self, x: usize, y: usize) -> [i32; 3] {
        self.texels[y * 4 + x]
    }

    /// Searches both orientations in individual and differential mode.
    pub(crate) fn compress_block_core(&self) -> Etc1Block {
        let mut best = self.compress_individual(false);

        for flip in [false, true] {
            if best.error == 0 {
                break;
            }

            let individual = flip.then(|| self.compress_individual(flip));
            let differential = self.compress_differential(flip);

            for candidate in [individual, differential].into_iter().flatten() {
                if candidate.error < best.error {
                    best = candidate;
                }
            }
        }

        best
    }

    pub(crate) fn store_data(&self, block: &Etc1Block, destination: &mut [u8]) {
        destination.copy_from_slice(&block.pack().to_be_bytes());
    }

    fn compress_individual(&self, flip: bool) -> Etc1Block {
        let first = self.best_fit(flip, 0, 4);
        let second = self.best_fit(flip, 1, 4);
        self.assemble(flip, false, first, second)
    }

    fn compress_differential(&self, flip: bool) -> Option<Etc1Block> {
        let first_candidates = self.candidate_fits(flip, 0, 5);
        let second_candidates = self.candidate_fits(flip, 1, 5);

        let mut best: Option<(SubBlockFit, SubBlockFit)> = None;
        for first in &first_candidates {
            for second in &second_candidates {
                if !delta_in_range(first.color, second.color) {
                    continue;
                }

                let error = first.error + second.error;
                if best.map_or(true, |(a, b)| error < a.error + b.error) {
                    best = Some((*first, *second));
                }
            }
        }

        best.map(|(first, second)| self.assemble(flip, true, first, second))
    }

    fn assemble(
        &self,
        flip: bool,
        differential: bool,
        first: SubBlockFit,
        second: SubBlockFit,
    ) -> Etc1Block {
        let mut selectors = [0; 16];
        for (sub_block, fit) in [first, second].iter().enumerate() {
            for (index, (x, y)) in sub_block_coords(flip, sub_block).into_iter().enumerate() {
                selectors[selector_index(x, y)] = fit.selectors[index];
            }
        }

        Etc1Block {
            flip,
            differential,
            colors: [first.color, second.color],
            tables: [first.table, second.table],
            selectors,
            error: first.error + second.error,
        }
    }

    fn best_fit(&self, flip: bool, sub_block: usize, bits: u32) -> SubBlockFit {
        let coords = sub_block_coords(flip, sub_block);
        let colors = self.candidate_colors(&coords, bits);

        let mut best = self.fit_sub_block(&coords, colors[0], bits);
        for &color in &colors[1..] {
            let fit = self.fit_sub_block(&coords, color, bits);
            if fit.error < best.error {
                best = fit;
            }
        }

        best
    }

    fn candidate_fits(&self, flip: bool, sub_block: usize, bits: u32) -> Vec<SubBlockFit> {
        let coords = sub_block_coords(flip, sub_block);

        self.candidate_colors(&coords, bits)
            .into_iter()
            .map(|color| self.fit_sub_block(&coords, color, bits))
            .collect()
    }

    /// Base colors worth trying for a sub-block: the quantized average and its
    /// neighbours as configured by the settings. Never empty.
    fn candidate_colors(&self, coords: &[(usize, usize); 8], bits: u32) -> Vec<[i32; 3]> {
        let mut average = [0.0f32; 3];
        for &(x, y) in coords {
            let texel = self.texel(x, y);
            for channel in 0..3 {
                average[channel] += texel[channel] as f32;
            }
        }
        let base = average.map(|sum| quantize(sum / 8.0, bits));

        let max = (1 << bits) - 1;
        let mut colors = vec![base];

        let luma_radius = self.settings.luma_radius;
        for offset in (-luma_radius..=luma_radius).filter(|&offset| offset != 0) {
            colors.push(base.map(|value| (value + offset).clamp(0, max)));
        }

        let channel_radius = self.settings.channel_radius;
        for red in -channel_radius..=channel_radius {
            for green in -channel_radius..=channel_radius {
                for blue in -channel_radius..=channel_radius {
                    if red == 0 && green == 0 && blue == 0 {
                        continue;
                    }
                    colors.push([
                        (base[0] + red).clamp(0, max),
                        (base[1] + green).clamp(0, max),
                        (base[2] + blue).clamp(0, max),
                    ]);
                }
            }
        }

        colors.sort_unstable();
        colors.dedup();
        colors
    }

    /// Picks the intensity table and selectors that minimize the error for a
    /// fixed base color.
    fn fit_sub_block(
        &self,
        coords: &[(usize, usize); 8],
        color: [i32; 3],
        bits: u32,
    ) -> SubBlockFit {
        let expanded = color.map(|value| expand(value, bits));

        let mut best = SubBlockFit {
            color,
            table: 0,
            selectors: [0; 8],
            error: u32::MAX,
        };

        for table in 0..8 {
            let mut selectors = [0; 8];
            let mut error = 0;

            for (index, &(x, y)) in coords.iter().enumerate() {
                let texel = self.texel(x, y);
                let mut best_selector = 0;
                let mut best_error = u32::MAX;

                for selector in 0..4 {
                    let modifier = intensity_modifier(table, selector);
                    let decoded = expanded.map(|value| clamp_u8(value + modifier));
                    let texel_error = rgb_error(decoded, texel);
                    if texel_error < best_error {
                        best_error = texel_error;
                        best_selector = selector;
                    }
                }

                selectors[index] = best_selector as u8;
                error += best_error;

                if error >= best.error {
                    break;
                }
            }

            if error < best.error {
                best = SubBlockFit {
                    color,
                    table: table as u8,
                    selectors,
                    error,
                };
            }
        }

        best
    }
}

/// Differential mode stores the second color as a signed 3-bit delta.
#[inline(always)]
fn delta_in_range(first: [i32; 3], second: [i32; 3]) -> bool {
    (0..3).all(|channel| (-4..=3).contains(&(second[channel] - first[channel])))
}
