//! # etc_compression
//!
//! ETC texture compression with mipmap generation and DDS / KTX output.
//!
//! An image is decoded, a full mipmap chain is generated from it and every
//! level is split into 4x4 blocks that are compressed in parallel on a fixed
//! size worker pool. The compressed levels are written into a DDS or KTX
//! container.
//!
//! ## Supported block compressions
//!
//!  * ETC1 (RGB)
//!  * ETC2 RGB
//!  * ETC2 RGBA8 with EAC alpha
//!
//! ## Example
//!
//! ```no_run
//! use etc_compression::{
//!     dispatch::{DispatcherConfig, TaskDispatcher},
//!     pipeline::Pipeline,
//!     Codec, EtcSettings,
//! };
//!
//! let dispatcher = TaskDispatcher::new(DispatcherConfig::default())?;
//! let pipeline = Pipeline::new(dispatcher, EtcSettings::medium());
//! let summary = pipeline.encode_file("albedo.png", "albedo.ktx", Codec::Etc2)?;
//! println!("{} levels, {} bytes", summary.mip_levels, summary.bytes_written);
//! # Ok::<(), etc_compression::Error>(())
//! ```
mod block;
pub mod compress;
pub mod container;
pub mod dispatch;
pub mod encode;
mod error;
pub mod mipmap;
pub mod pipeline;
mod raster;
mod settings;

pub use block::PixelBlock;
pub use error::{ContainerError, Error};
pub use raster::{Channels, RasterImage};
pub use settings::{Codec, CompressionParams, EtcSettings, Quality};

/// Compressed pixel formats produced by this crate.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Debug)]
pub enum PixelFormat {
    /// ETC1 (RGB)
    Etc1Rgb,
    /// ETC2 (RGB)
    Etc2Rgb,
    /// ETC2 with EAC alpha (RGBA)
    Etc2Rgba,
}

impl PixelFormat {
    /// Returns the bytes per row for the given width.
    ///
    /// The width is used to calculate how many blocks are needed per row,
    /// which is then multiplied by the block size.
    /// Width is rounded up to the nearest multiple of 4.
    pub const fn bytes_per_row(self, width: u32) -> u32 {
        let blocks_per_row = (width + 3) / 4;
        blocks_per_row * self.block_byte_size()
    }

    /// Returns the byte size required for storing compressed blocks for the given dimensions.
    ///
    /// Width and height are rounded up to the nearest multiple of 4.
    pub const fn blocks_byte_size(self, width: u32, height: u32) -> usize {
        let block_width = (width as usize + 3) / 4;
        let block_height = (height as usize + 3) / 4;
        let block_count = block_width * block_height;
        let block_size = self.block_byte_size() as usize;
        block_count * block_size
    }

    pub const fn block_byte_size(self) -> u32 {
        match self {
            PixelFormat::Etc1Rgb | PixelFormat::Etc2Rgb => 8,
            PixelFormat::Etc2Rgba => 16,
        }
    }

    pub const fn has_alpha(self) -> bool {
        matches!(self, PixelFormat::Etc2Rgba)
    }

    pub const fn name(self) -> &'static str {
        match self {
            PixelFormat::Etc1Rgb => "etc1",
            PixelFormat::Etc2Rgb => "etc2",
            PixelFormat::Etc2Rgba => "etc2_eac",
        }
    }

    /// FourCC stored in the DDS pixel format.
    pub const fn dds_fourcc(self) -> [u8; 4] {
        match self {
            PixelFormat::Etc1Rgb => *b"ETC1",
            PixelFormat::Etc2Rgb => *b"ETC2",
            PixelFormat::Etc2Rgba => *b"ETCA",
        }
    }

    /// `glInternalFormat` of the KTX header.
    pub const fn gl_internal_format(self) -> u32 {
        match self {
            // GL_ETC1_RGB8_OES
            PixelFormat::Etc1Rgb => 0x8D64,
            // GL_COMPRESSED_RGB8_ETC2
            PixelFormat::Etc2Rgb => 0x9274,
            // GL_COMPRESSED_RGBA8_ETC2_EAC
            PixelFormat::Etc2Rgba => 0x9278,
        }
    }

    /// `glBaseInternalFormat` of the KTX header.
    pub const fn gl_base_internal_format(self) -> u32 {
        if self.has_alpha() {
            // GL_RGBA
            0x1908
        } else {
            // GL_RGB
            0x1907
        }
    }
}
