//! Mipmap chain generation.

use tracing::debug;

use crate::{
    compress::{compress_level, CompressedLevel},
    dispatch::TaskDispatcher,
    raster::{Channels, RasterImage},
    CompressionParams, Error,
};

/// Number of levels of a full chain: `floor(log2(min(width, height))) + 1`.
///
/// The chain ends with the level whose smaller side is one texel.
pub const fn mip_level_count(width: u32, height: u32) -> u32 {
    let min = if width < height { width } else { height };
    if min == 0 {
        0
    } else {
        min.ilog2() + 1
    }
}

/// Dimensions of `level`. Each level halves the previous one with floor
/// division and never drops below one texel.
pub const fn level_dimensions(width: u32, height: u32, level: u32) -> (u32, u32) {
    let width = width >> level;
    let height = height >> level;
    (if width == 0 { 1 } else { width }, if height == 0 { 1 } else { height })
}

/// Resamples `image` to `new_width` x `new_height` with an area weighted box
/// filter.
///
/// Color is filtered in linear light. Alpha is filtered as plain data and, for
/// four channel images, weights the color so that fully transparent texels do
/// not bleed into their neighbours.
pub fn downsample(
    image: &RasterImage,
    new_width: u32,
    new_height: u32,
) -> Result<RasterImage, Error> {
    let channels = image.channels();
    let columns = box_weights(image.width(), new_width);
    let rows = box_weights(image.height(), new_height);

    let to_linear: [f32; 256] = std::array::from_fn(|value| srgb_to_linear(value as u8));

    let mut data = Vec::with_capacity(new_width as usize * new_height as usize * channels.count());

    for row in &rows {
        for column in &columns {
            let mut weighted = [0.0f32; 3];
            let mut unweighted = [0.0f32; 3];
            let mut alpha_sum = 0.0f32;
            let mut weight_sum = 0.0f32;

            for &(y, weight_y) in row {
                for &(x, weight_x) in column {
                    let weight = weight_x * weight_y;
                    let texel = image.texel(x, y);
                    let alpha = texel[3] as f32 / 255.0;

                    for channel in 0..3 {
                        let linear = to_linear[texel[channel] as usize];
                        unweighted[channel] += linear * weight;
                        weighted[channel] += linear * weight * alpha;
                    }
                    alpha_sum += alpha * weight;
                    weight_sum += weight;
                }
            }

            let color = match channels {
                Channels::Rgba if alpha_sum > 0.0 => weighted.map(|sum| sum / alpha_sum),
                _ => unweighted.map(|sum| sum / weight_sum),
            };
            data.extend(color.map(linear_to_srgb));

            if channels.has_alpha() {
                data.push((alpha_sum / weight_sum * 255.0).round().clamp(0.0, 255.0) as u8);
            }
        }
    }

    RasterImage::new(new_width, new_height, channels, data)
}

/// Source texels and their coverage for every destination texel along one
/// axis. The weights of one destination texel sum to one.
fn box_weights(source: u32, destination: u32) -> Vec<Vec<(u32, f32)>> {
    let scale = source as f64 / destination as f64;

    (0..destination)
        .map(|index| {
            let start = index as f64 * scale;
            let end = ((index + 1) as f64 * scale).min(source as f64);

            let mut weights = Vec::new();
            let mut texel = start.floor() as u32;
            while (texel as f64) < end && texel < source {
                let covered = (end.min(texel as f64 + 1.0) - start.max(texel as f64)) / scale;
                if covered > 0.0 {
                    weights.push((texel, covered as f32));
                }
                texel += 1;
            }
            weights
        })
        .collect()
}

fn srgb_to_linear(value: u8) -> f32 {
    let value = value as f32 / 255.0;
    if value <= 0.04045 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(value: f32) -> u8 {
    let value = value.clamp(0.0, 1.0);
    let srgb = if value <= 0.003_130_8 {
        value * 12.92
    } else {
        1.055 * value.powf(1.0 / 2.4) - 0.055
    };
    (srgb * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Streams the compressed levels of an image, largest first.
///
/// Only the image of the level being compressed is kept. The next level is
/// resampled from it after its compression batch has drained.
pub struct MipmapChain<'a> {
    dispatcher: &'a TaskDispatcher,
    params: CompressionParams,
    current: Option<RasterImage>,
    level: u32,
    level_count: u32,
}

impl<'a> MipmapChain<'a> {
    pub fn new(
        dispatcher: &'a TaskDispatcher,
        base: RasterImage,
        params: CompressionParams,
    ) -> Result<Self, Error> {
        params.validate(base.channels())?;

        Ok(Self {
            dispatcher,
            params,
            level_count: mip_level_count(base.width(), base.height()),
            current: Some(base),
            level: 0,
        })
    }

    pub fn level_count(&self) -> u32 {
        self.level_count
    }

    fn advance(&mut self, image: RasterImage) -> Result<CompressedLevel, Error> {
        let level = compress_level(self.dispatcher, &image, &self.params)?;

        self.level += 1;
        if self.level < self.level_count {
            let (width, height) = level_dimensions(image.width(), image.height(), 1);
            debug!(level = self.level, width, height, "resampling next level");
            self.current = Some(downsample(&image, width, height)?);
        }

        Ok(level)
    }
}

impl Iterator for MipmapChain<'_> {
    type Item = Result<CompressedLevel, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let image = self.current.take()?;
        Some(self.advance(image))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.current.is_some() {
            (self.level_count - self.level) as usize
        } else {
            0
        };
        (remaining, Some(remaining))
    }
}

/// Compresses the full chain of `base` into memory.
pub fn build_chain(
    dispatcher: &TaskDispatcher,
    base: RasterImage,
    params: CompressionParams,
) -> Result<Vec<CompressedLevel>, Error> {
    MipmapChain::new(dispatcher, base, params)?.collect()
}
