#![allow(dead_code)]

pub mod metrics;

use std::{num::NonZeroUsize, path::Path};

use etc_compression::{
    dispatch::{DispatcherConfig, TaskDispatcher},
    Channels, PixelFormat, RasterImage,
};

const INTENSITY_TABLES: [[i32; 2]; 8] = [
    [2, 8],
    [5, 17],
    [9, 29],
    [13, 42],
    [18, 60],
    [24, 80],
    [33, 106],
    [47, 183],
];

const ALPHA_MODIFIERS: [[i32; 8]; 16] = [
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

pub fn create_dispatcher(threads: usize) -> TaskDispatcher {
    let config = DispatcherConfig::default()
        .with_threads(NonZeroUsize::new(threads).expect("thread count must not be zero"))
        .with_thread_name_prefix("test-worker");
    TaskDispatcher::new(config).expect("can't start worker pool")
}

/// Smooth color ramps with a radial alpha falloff.
pub fn gradient_image(width: u32, height: u32, channels: Channels) -> RasterImage {
    let mut data = Vec::with_capacity((width * height) as usize * channels.count());

    for y in 0..height {
        for x in 0..width {
            let u = x as f32 / (width.max(2) - 1) as f32;
            let v = y as f32 / (height.max(2) - 1) as f32;

            data.push((u * 255.0).round() as u8);
            data.push((v * 255.0).round() as u8);
            data.push((128.0 + 60.0 * (u * 3.0).sin() * (v * 2.0).cos()).round() as u8);

            if channels.has_alpha() {
                let distance = ((u - 0.5).powi(2) + (v - 0.5).powi(2)).sqrt();
                data.push((255.0 * (1.0 - distance * 1.4).clamp(0.0, 1.0)).round() as u8);
            }
        }
    }

    RasterImage::new(width, height, channels, data).expect("valid image")
}

/// Deterministic pseudo random texels.
pub fn noise_image(width: u32, height: u32, channels: Channels, seed: u32) -> RasterImage {
    let mut state = seed.wrapping_mul(747_796_405).wrapping_add(2_891_336_453);
    let len = (width * height) as usize * channels.count();

    let data = (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 24) as u8
        })
        .collect();

    RasterImage::new(width, height, channels, data).expect("valid image")
}

pub fn save_png(path: &Path, image: &RasterImage) {
    let color = match image.channels() {
        Channels::Rgb => image::ExtendedColorType::Rgb8,
        Channels::Rgba => image::ExtendedColorType::Rgba8,
    };
    image::save_buffer(path, image.as_bytes(), image.width(), image.height(), color)
        .expect("can't write test image");
}

/// Decodes a level of compressed blocks into tightly packed RGBA data.
pub fn decompress_level(format: PixelFormat, blocks: &[u8], width: u32, height: u32) -> Vec<u8> {
    let block_size = format.block_byte_size() as usize;
    let blocks_x = width.div_ceil(4) as usize;
    let mut rgba = vec![0; (width * height * 4) as usize];

    for (index, block) in blocks.chunks_exact(block_size).enumerate() {
        let texels = match format {
            PixelFormat::Etc1Rgb | PixelFormat::Etc2Rgb => decode_rgb_block(read_u64(block), 255),
            PixelFormat::Etc2Rgba => {
                let alpha = decode_alpha_block(read_u64(&block[..8]));
                let mut texels = decode_rgb_block(read_u64(&block[8..]), 255);
                for (texel, alpha) in texels.iter_mut().zip(alpha) {
                    texel[3] = alpha;
                }
                texels
            }
        };

        let (block_x, block_y) = (index % blocks_x, index / blocks_x);
        for y in 0..4 {
            for x in 0..4 {
                let (px, py) = (block_x * 4 + x, block_y * 4 + y);
                if px < width as usize && py < height as usize {
                    let offset = (py * width as usize + px) * 4;
                    rgba[offset..offset + 4].copy_from_slice(&texels[y * 4 + x]);
                }
            }
        }
    }

    rgba
}

/// Expands an image to RGBA, alpha 255 when absent.
pub fn to_rgba(image: &RasterImage) -> Vec<u8> {
    match image.channels() {
        Channels::Rgba => image.as_bytes().to_vec(),
        Channels::Rgb => image
            .as_bytes()
            .chunks_exact(3)
            .flat_map(|texel| [texel[0], texel[1], texel[2], 255])
            .collect(),
    }
}

fn read_u64(bytes: &[u8]) -> u64 {
    u64::from_be_bytes(bytes.try_into().expect("8 byte block"))
}

fn extend(value: u64, bits: u32) -> i32 {
    let value = value as i32;
    (value << (8 - bits)) | (value >> (2 * bits - 8))
}

fn sign_extend3(value: u64) -> i32 {
    let value = (value & 7) as i32;
    if value >= 4 {
        value - 8
    } else {
        value
    }
}

fn field(bits: u64, shift: u32, width: u32) -> u64 {
    (bits >> shift) & ((1 << width) - 1)
}

/// Decodes an ETC1 or ETC2 RGB block into row-major RGBA texels.
pub fn decode_rgb_block(bits: u64, alpha: u8) -> [[u8; 4]; 16] {
    let differential = field(bits, 33, 1) == 1;
    let flip = field(bits, 32, 1) == 1;

    let colors = if differential {
        let mut colors = [[0; 3]; 2];
        for (channel, shift) in [59, 51, 43].into_iter().enumerate() {
            let base = field(bits, shift, 5) as i32;
            let second = base + sign_extend3(bits >> (shift - 3));
            if !(0..=31).contains(&second) {
                assert_eq!(channel, 2, "T and H modes are never produced");
                return decode_planar(bits, alpha);
            }
            colors[0][channel] = extend(base as u64, 5);
            colors[1][channel] = extend(second as u64, 5);
        }
        colors
    } else {
        let mut colors = [[0; 3]; 2];
        for (channel, shift) in [60, 52, 44].into_iter().enumerate() {
            colors[0][channel] = extend(field(bits, shift, 4), 4);
            colors[1][channel] = extend(field(bits, shift - 4, 4), 4);
        }
        colors
    };
    let tables = [field(bits, 37, 3) as usize, field(bits, 34, 3) as usize];

    let mut texels = [[0; 4]; 16];
    for y in 0..4 {
        for x in 0..4 {
            let sub_block = if flip { usize::from(y >= 2) } else { usize::from(x >= 2) };
            let index = x * 4 + y;
            let selector =
                (field(bits, 16 + index as u32, 1) << 1 | field(bits, index as u32, 1)) as usize;

            let magnitude = INTENSITY_TABLES[tables[sub_block]][selector & 1];
            let modifier = if selector & 2 == 0 { magnitude } else { -magnitude };

            let color = colors[sub_block];
            texels[y * 4 + x] = [
                (color[0] + modifier).clamp(0, 255) as u8,
                (color[1] + modifier).clamp(0, 255) as u8,
                (color[2] + modifier).clamp(0, 255) as u8,
                alpha,
            ];
        }
    }
    texels
}

fn decode_planar(bits: u64, alpha: u8) -> [[u8; 4]; 16] {
    let origin = [
        extend(field(bits, 57, 6), 6),
        extend(field(bits, 56, 1) << 6 | field(bits, 49, 6), 7),
        extend(field(bits, 48, 1) << 5 | field(bits, 43, 2) << 3 | field(bits, 39, 3), 6),
    ];
    let horizontal = [
        extend(field(bits, 34, 5) << 1 | field(bits, 32, 1), 6),
        extend(field(bits, 25, 7), 7),
        extend(field(bits, 19, 6), 6),
    ];
    let vertical = [
        extend(field(bits, 13, 6), 6),
        extend(field(bits, 6, 7), 7),
        extend(field(bits, 0, 6), 6),
    ];

    let mut texels = [[0; 4]; 16];
    for y in 0..4i32 {
        for x in 0..4i32 {
            let mut texel = [0; 4];
            for channel in 0..3 {
                let (o, h, v) = (origin[channel], horizontal[channel], vertical[channel]);
                texel[channel] = ((x * (h - o) + y * (v - o) + 4 * o + 2) >> 2).clamp(0, 255) as u8;
            }
            texel[3] = alpha;
            texels[(y * 4 + x) as usize] = texel;
        }
    }
    texels
}

/// Decodes an EAC alpha block into row-major alpha values.
pub fn decode_alpha_block(bits: u64) -> [u8; 16] {
    let base = field(bits, 56, 8) as i32;
    let multiplier = field(bits, 52, 4) as i32;
    let table = field(bits, 48, 4) as usize;

    let mut alpha = [0; 16];
    for y in 0..4 {
        for x in 0..4 {
            let selector = field(bits, 45 - 3 * (x * 4 + y) as u32, 3) as usize;
            alpha[y * 4 + x] =
                (base + multiplier * ALPHA_MODIFIERS[table][selector]).clamp(0, 255) as u8;
        }
    }
    alpha
}

/// Sum of squared differences over the color channels of two RGBA buffers.
pub fn rgb_squared_error(original: &[u8], decoded: &[u8]) -> u64 {
    original
        .chunks_exact(4)
        .zip(decoded.chunks_exact(4))
        .map(|(a, b)| {
            (0..3)
                .map(|channel| (a[channel] as i64 - b[channel] as i64).pow(2) as u64)
                .sum::<u64>()
        })
        .sum()
}
