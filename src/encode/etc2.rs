use crate::{
    block::PixelBlock,
    encode::{
        common::{clamp_u8, expand, quantize, sq},
        etc1::BlockCompressorEtc1,
    },
    EtcSettings,
};

/// Planar mode endpoints: origin, horizontal and vertical color, quantized to
/// 6:7:6 bits.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct PlanarBlock {
    origin: [i32; 3],
    horizontal: [i32; 3],
    vertical: [i32; 3],
    pub(crate) error: u32,
}

const PLANAR_BITS: [u32; 3] = [6, 7, 6];

impl PlanarBlock {
    /// Packs the endpoints and sets the filler bits so that a decoder reading
    /// the block in differential mode sees red and green in range and blue
    /// overflowing, which selects planar mode.
    pub(crate) fn pack(&self) -> u64 {
        let [red_o, green_o, blue_o] = self.origin.map(|value| value as u64);
        let [red_h, green_h, blue_h] = self.horizontal.map(|value| value as u64);
        let [red_v, green_v, blue_v] = self.vertical.map(|value| value as u64);

        let mut bits = 0u64;
        bits |= red_o << 57;
        bits |= (green_o >> 6) << 56;
        bits |= (green_o & 0x3F) << 49;
        bits |= (blue_o >> 5) << 48;
        bits |= ((blue_o >> 3) & 3) << 43;
        bits |= (blue_o & 7) << 39;
        bits |= (red_h >> 1) << 34;
        bits |= 1 << 33;
        bits |= (red_h & 1) << 32;
        bits |= green_h << 25;
        bits |= blue_h << 19;
        bits |= red_v << 13;
        bits |= green_v << 6;
        bits |= blue_v;

        // Red: base in bits 63..59, delta in 58..56.
        if red_green_overflows(bits, 59) {
            bits |= 1 << 63;
        }
        // Green: base in bits 55..51, delta in 50..48.
        if red_green_overflows(bits, 51) {
            bits |= 1 << 55;
        }
        // Blue: base in bits 47..43, delta in 42..40. Force the overflow.
        let base_low = (bits >> 43) & 3;
        let delta_low = (bits >> 40) & 3;
        if base_low + delta_low < 4 {
            bits |= 1 << 42;
        } else {
            bits |= 0b111 << 45;
        }

        bits
    }

    /// Decodes the texel at `(x, y)`.
    #[cfg(test)]
    fn texel(&self, x: i32, y: i32) -> [i32; 3] {
        let mut texel = [0; 3];
        for (channel, value) in texel.iter_mut().enumerate() {
            let bits = PLANAR_BITS[channel];
            *value = planar_value(
                expand(self.origin[channel], bits),
                expand(self.horizontal[channel], bits),
                expand(self.vertical[channel], bits),
                x,
                y,
            );
        }
        texel
    }
}

/// Whether the 5-bit base at `shift` plus the 3-bit delta below it leaves
/// `0..=31` when the base's top bit is clear.
#[inline(always)]
fn red_green_overflows(bits: u64, shift: u32) -> bool {
    let base = ((bits >> shift) & 0xF) as i32;
    let delta = crate::encode::common::sign_extend3(bits >> (shift - 3));
    base + delta < 0
}

#[inline(always)]
fn planar_value(origin: i32, horizontal: i32, vertical: i32, x: i32, y: i32) -> i32 {
    clamp_u8((x * (horizontal - origin) + y * (vertical - origin) + 4 * origin + 2) >> 2)
}

pub(crate) struct BlockCompressorEtc2<'a> {
    settings: &'a EtcSettings,
    etc1: BlockCompressorEtc1<'a>,
    /// RGB texels in row-major order.
    texels: [[i32; 3]; 16],
}

impl<'a> BlockCompressorEtc2<'a> {
    pub(crate) fn new(settings: &'a EtcSettings) -> Self {
        Self {
            settings,
            etc1: BlockCompressorEtc1::new(settings),
            texels: [[0; 3]; 16],
        }
    }

    pub(crate) fn load_block(&mut self, block: &PixelBlock) {
        self.etc1.load_block(block);
        for y in 0..4 {
            for x in 0..4 {
                let [red, green, blue, _] = block.rgba(x, y);
                self.texels[y * 4 + x] = [red as i32, green as i32, blue as i32];
            }
        }
    }

    /// Encodes the block with whichever of the ETC1 compatible modes and the
    /// planar mode reproduces it best.
    // TODO: Add the T and H modes, they help with blocks holding two distinct colors.
    pub(crate) fn compress_block_core(&self) -> u64 {
        let etc1 = self.etc1.compress_block_core();
        if etc1.error == 0 {
            return etc1.pack();
        }

        let planar = self.compress_planar();
        if planar.error < etc1.error {
            planar.pack()
        } else {
            etc1.pack()
        }
    }

    pub(crate) fn store_data(&self, bits: u64, destination: &mut [u8]) {
        destination.copy_from_slice(&bits.to_be_bytes());
    }

    pub(crate) fn compress_planar(&self) -> PlanarBlock {
        let mut block = PlanarBlock {
            origin: [0; 3],
            horizontal: [0; 3],
            vertical: [0; 3],
            error: 0,
        };

        // Channels are independent, so each one is fitted on its own.
        for channel in 0..3 {
            let (origin, horizontal, vertical) = self.fit_plane(channel);
            let bits = PLANAR_BITS[channel];

            let mut best = (
                quantize(origin, bits),
                quantize(horizontal, bits),
                quantize(vertical, bits),
            );
            let mut best_error = self.planar_channel_error(channel, best);

            if self.settings.planar_refine {
                let max = (1 << bits) - 1;
                let (o, h, v) = best;
                for delta_o in -1..=1 {
                    for delta_h in -1..=1 {
                        for delta_v in -1..=1 {
                            let candidate = (
                                (o + delta_o).clamp(0, max),
                                (h + delta_h).clamp(0, max),
                                (v + delta_v).clamp(0, max),
                            );
                            let error = self.planar_channel_error(channel, candidate);
                            if error < best_error {
                                best_error = error;
                                best = candidate;
                            }
                        }
                    }
                }
            }

            block.origin[channel] = best.0;
            block.horizontal[channel] = best.1;
            block.vertical[channel] = best.2;
            block.error += best_error;
        }

        block
    }

    /// Least squares fit of `c(x, y) = O + x (H - O) / 4 + y (V - O) / 4`.
    fn fit_plane(&self, channel: usize) -> (f32, f32, f32) {
        let mut sum = 0.0;
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;

        for y in 0..4 {
            for x in 0..4 {
                let value = self.texels[y * 4 + x][channel] as f32;
                sum += value;
                sum_x += (x as f32 - 1.5) * value;
                sum_y += (y as f32 - 1.5) * value;
            }
        }

        // Sum of (x - 1.5)^2 over the sixteen texels.
        let slope_x = sum_x / 20.0;
        let slope_y = sum_y / 20.0;
        let origin = sum / 16.0 - 1.5 * slope_x - 1.5 * slope_y;

        (origin, origin + 4.0 * slope_x, origin + 4.0 * slope_y)
    }

    fn planar_channel_error(&self, channel: usize, (o, h, v): (i32, i32, i32)) -> u32 {
        let bits = PLANAR_BITS[channel];
        let (o, h, v) = (expand(o, bits), expand(h, bits), expand(v, bits));

        let mut error = 0;
        for y in 0..4 {
            for x in 0..4 {
                let decoded = planar_value(o, h, v, x as i32, y as i32);
                error += sq(decoded - self.texels[y * 4 + x][channel]);
            }
        }
        error
    }
}
