//! DDS header construction.

use crate::PixelFormat;

pub const DDS_MAGIC: [u8; 4] = *b"DDS ";
pub const DDS_HEADER_SIZE: u32 = 124;
const DDS_PIXEL_FORMAT_SIZE: u32 = 32;

pub const DDSD_CAPS: u32 = 0x1;
pub const DDSD_HEIGHT: u32 = 0x2;
pub const DDSD_WIDTH: u32 = 0x4;
pub const DDSD_PIXELFORMAT: u32 = 0x1000;
pub const DDSD_MIPMAPCOUNT: u32 = 0x2_0000;
pub const DDSD_LINEARSIZE: u32 = 0x8_0000;

pub const DDPF_FOURCC: u32 = 0x4;

pub const DDSCAPS_COMPLEX: u32 = 0x8;
pub const DDSCAPS_TEXTURE: u32 = 0x1000;
pub const DDSCAPS_MIPMAP: u32 = 0x40_0000;

/// The 124 byte DDS header. The magic is written separately.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DdsHeader {
    pub flags: u32,
    pub height: u32,
    pub width: u32,
    pub pitch_or_linear_size: u32,
    pub depth: u32,
    pub mipmap_count: u32,
    pub fourcc: [u8; 4],
    pub caps: u32,
}

impl DdsHeader {
    pub fn new(width: u32, height: u32, mipmap_count: u32, format: PixelFormat) -> Self {
        let mut flags = DDSD_CAPS | DDSD_HEIGHT | DDSD_WIDTH | DDSD_PIXELFORMAT | DDSD_LINEARSIZE;
        let mut caps = DDSCAPS_TEXTURE;
        if mipmap_count > 1 {
            flags |= DDSD_MIPMAPCOUNT;
            caps |= DDSCAPS_COMPLEX | DDSCAPS_MIPMAP;
        }

        Self {
            flags,
            height,
            width,
            pitch_or_linear_size: format.blocks_byte_size(width, height) as u32,
            depth: 0,
            mipmap_count,
            fourcc: format.dds_fourcc(),
            caps,
        }
    }

    /// Magic followed by the header, 128 bytes in total.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(4 + DDS_HEADER_SIZE as usize);

        bytes.extend_from_slice(&DDS_MAGIC);
        bytes.extend_from_slice(&DDS_HEADER_SIZE.to_le_bytes());
        bytes.extend_from_slice(&self.flags.to_le_bytes());
        bytes.extend_from_slice(&self.height.to_le_bytes());
        bytes.extend_from_slice(&self.width.to_le_bytes());
        bytes.extend_from_slice(&self.pitch_or_linear_size.to_le_bytes());
        bytes.extend_from_slice(&self.depth.to_le_bytes());
        bytes.extend_from_slice(&self.mipmap_count.to_le_bytes());
        // reserved1
        bytes.extend_from_slice(&[0; 11 * 4]);

        bytes.extend_from_slice(&DDS_PIXEL_FORMAT_SIZE.to_le_bytes());
        bytes.extend_from_slice(&DDPF_FOURCC.to_le_bytes());
        bytes.extend_from_slice(&self.fourcc);
        // Bit count and the four channel masks are unused for compressed data.
        bytes.extend_from_slice(&[0; 5 * 4]);

        bytes.extend_from_slice(&self.caps.to_le_bytes());
        // caps2, caps3, caps4, reserved2
        bytes.extend_from_slice(&[0; 4 * 4]);

        bytes
    }
}
