//! KTX 1.1 header construction and level framing.

use crate::{error::ContainerError, PixelFormat};

pub const KTX_IDENTIFIER: [u8; 12] = [
    0xAB, 0x4B, 0x54, 0x58, 0x20, 0x31, 0x31, 0xBB, 0x0D, 0x0A, 0x1A, 0x0A,
];
pub const KTX_ENDIANNESS: u32 = 0x0403_0201;
pub const KTX_HEADER_SIZE: usize = 64;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KtxHeader {
    pub gl_type: u32,
    pub gl_type_size: u32,
    pub gl_format: u32,
    pub gl_internal_format: u32,
    pub gl_base_internal_format: u32,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub pixel_depth: u32,
    pub number_of_array_elements: u32,
    pub number_of_faces: u32,
    pub number_of_mipmap_levels: u32,
    pub bytes_of_key_value_data: u32,
}

impl KtxHeader {
    /// Header of a compressed 2D texture. Type and format are zero because the
    /// payload is already block compressed.
    pub fn new(width: u32, height: u32, mipmap_count: u32, format: PixelFormat) -> Self {
        Self {
            gl_type: 0,
            gl_type_size: 1,
            gl_format: 0,
            gl_internal_format: format.gl_internal_format(),
            gl_base_internal_format: format.gl_base_internal_format(),
            pixel_width: width,
            pixel_height: height,
            pixel_depth: 0,
            number_of_array_elements: 0,
            number_of_faces: 1,
            number_of_mipmap_levels: mipmap_count,
            bytes_of_key_value_data: 0,
        }
    }

    fn fields(&self) -> [u32; 13] {
        [
            KTX_ENDIANNESS,
            self.gl_type,
            self.gl_type_size,
            self.gl_format,
            self.gl_internal_format,
            self.gl_base_internal_format,
            self.pixel_width,
            self.pixel_height,
            self.pixel_depth,
            self.number_of_array_elements,
            self.number_of_faces,
            self.number_of_mipmap_levels,
            self.bytes_of_key_value_data,
        ]
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(KTX_HEADER_SIZE);
        bytes.extend_from_slice(&KTX_IDENTIFIER);
        for field in self.fields() {
            bytes.extend_from_slice(&field.to_le_bytes());
        }
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ContainerError> {
        if bytes.len() < KTX_HEADER_SIZE {
            return Err(ContainerError::Truncated);
        }
        if bytes[..12] != KTX_IDENTIFIER {
            return Err(ContainerError::BadIdentifier);
        }

        let mut fields = bytes[12..KTX_HEADER_SIZE]
            .chunks_exact(4)
            .map(|field| u32::from_le_bytes([field[0], field[1], field[2], field[3]]));
        let mut next = || fields.next().unwrap_or_default();

        if next() != KTX_ENDIANNESS {
            return Err(ContainerError::BadIdentifier);
        }

        Ok(Self {
            gl_type: next(),
            gl_type_size: next(),
            gl_format: next(),
            gl_internal_format: next(),
            gl_base_internal_format: next(),
            pixel_width: next(),
            pixel_height: next(),
            pixel_depth: next(),
            number_of_array_elements: next(),
            number_of_faces: next(),
            number_of_mipmap_levels: next(),
            bytes_of_key_value_data: next(),
        })
    }
}

/// Splits a KTX file into its header and level payloads.
///
/// Level boundaries come from the `imageSize` prefixes alone.
pub fn read_ktx_levels(bytes: &[u8]) -> Result<(KtxHeader, Vec<&[u8]>), ContainerError> {
    let header = KtxHeader::from_bytes(bytes)?;

    let mut offset = KTX_HEADER_SIZE + header.bytes_of_key_value_data as usize;
    // The level count is untrusted, the payload bounds the real one.
    let mut levels = Vec::new();

    for _ in 0..header.number_of_mipmap_levels {
        let prefix = bytes
            .get(offset..offset + 4)
            .ok_or(ContainerError::Truncated)?;
        let size = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
        offset += 4;

        let end = offset.checked_add(size).ok_or(ContainerError::Truncated)?;
        let level = bytes.get(offset..end).ok_or(ContainerError::Truncated)?;
        levels.push(level);
        // Levels are padded to four bytes.
        offset = end.next_multiple_of(4);
    }

    Ok((header, levels))
}
