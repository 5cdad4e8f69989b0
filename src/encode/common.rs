/// ETC1/ETC2 intensity modifier tables. Each row holds the small and the large
/// magnitude, selectors map to `[+small, +large, -small, -large]`.
pub(crate) const INTENSITY_TABLES: [[i32; 2]; 8] = [
    [2, 8],
    [5, 17],
    [9, 29],
    [13, 42],
    [18, 60],
    [24, 80],
    [33, 106],
    [47, 183],
];

#[inline(always)]
pub(crate) const fn intensity_modifier(table: usize, selector: usize) -> i32 {
    let magnitude = INTENSITY_TABLES[table][selector & 1];
    if selector & 2 == 0 {
        magnitude
    } else {
        -magnitude
    }
}

#[inline(always)]
pub(crate) const fn clamp_u8(value: i32) -> i32 {
    if value < 0 {
        0
    } else if value > 255 {
        255
    } else {
        value
    }
}

#[inline(always)]
pub(crate) const fn sq(value: i32) -> u32 {
    (value * value) as u32
}

/// Expands a quantized component of `bits` width to 8 bits by bit replication.
#[inline(always)]
pub(crate) const fn expand(value: i32, bits: u32) -> i32 {
    (value << (8 - bits)) | (value >> (2 * bits - 8))
}

/// Quantizes an 8-bit value to `bits` width, rounding to nearest.
#[inline(always)]
pub(crate) fn quantize(value: f32, bits: u32) -> i32 {
    let max = ((1 << bits) - 1) as f32;
    (value * max / 255.0).round().clamp(0.0, max) as i32
}

#[inline(always)]
pub(crate) fn rgb_error(decoded: [i32; 3], texel: [i32; 3]) -> u32 {
    sq(decoded[0] - texel[0]) + sq(decoded[1] - texel[1]) + sq(decoded[2] - texel[2])
}

/// Sign extends a 3-bit two's complement value.
#[inline(always)]
pub(crate) const fn sign_extend3(value: u64) -> i32 {
    let value = (value & 7) as i32;
    if value >= 4 {
        value - 8
    } else {
        value
    }
}

/// Bit position of the selector of texel `(x, y)`. ETC selectors are stored
/// column-major.
#[inline(always)]
pub(crate) const fn selector_index(x: usize, y: usize) -> usize {
    x * 4 + y
}
