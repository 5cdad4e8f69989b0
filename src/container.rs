//! Texture container output.
//!
//! Two layouts are supported:
//!
//!  * DDS: magic, 124 byte header, then every level back to back.
//!  * KTX 1.1: 64 byte header, then every level prefixed by its byte size.

mod dds;
mod ktx;

use std::{fmt, io::Write, path::Path};

pub use dds::{DdsHeader, DDS_HEADER_SIZE, DDS_MAGIC};
pub use ktx::{read_ktx_levels, KtxHeader, KTX_HEADER_SIZE, KTX_IDENTIFIER};

use crate::{error::ContainerError, mipmap::level_dimensions, PixelFormat};

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub enum ContainerFormat {
    Dds,
    Ktx,
}

impl ContainerFormat {
    /// Selects the container from the file suffix, ignoring case.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ContainerError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("dds") => Ok(ContainerFormat::Dds),
            Some("ktx") => Ok(ContainerFormat::Ktx),
            _ => Err(ContainerError::UnknownFormat(path.display().to_string())),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ContainerFormat::Dds => "DDS",
            ContainerFormat::Ktx => "KTX",
        }
    }

    /// Bytes written before the first level.
    pub const fn header_size(self) -> usize {
        match self {
            ContainerFormat::Dds => 4 + DDS_HEADER_SIZE as usize,
            ContainerFormat::Ktx => KTX_HEADER_SIZE,
        }
    }

    /// Bytes written per level in addition to its payload.
    pub const fn level_overhead(self) -> usize {
        match self {
            ContainerFormat::Dds => 0,
            ContainerFormat::Ktx => 4,
        }
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Writes one texture into a byte sink.
///
/// The header is written on construction. Afterwards exactly `mip_levels`
/// buffers must be passed to [`write_level`](Self::write_level), largest first,
/// before [`finish`](Self::finish) is called.
pub struct ContainerWriter<W: Write> {
    sink: W,
    format: ContainerFormat,
    pixel_format: PixelFormat,
    width: u32,
    height: u32,
    mip_levels: u32,
    next_level: u32,
    bytes_written: u64,
}

impl<W: Write> ContainerWriter<W> {
    pub fn new(
        mut sink: W,
        format: ContainerFormat,
        pixel_format: PixelFormat,
        width: u32,
        height: u32,
        mip_levels: u32,
    ) -> Result<Self, ContainerError> {
        let header = match format {
            ContainerFormat::Dds => {
                DdsHeader::new(width, height, mip_levels, pixel_format).to_bytes()
            }
            ContainerFormat::Ktx => {
                KtxHeader::new(width, height, mip_levels, pixel_format).to_bytes()
            }
        };
        sink.write_all(&header)
            .map_err(ContainerError::io("file header"))?;

        Ok(Self {
            sink,
            format,
            pixel_format,
            width,
            height,
            mip_levels,
            next_level: 0,
            bytes_written: header.len() as u64,
        })
    }

    pub fn format(&self) -> ContainerFormat {
        self.format
    }

    /// Appends the next level.
    ///
    /// The buffer must hold exactly the block data of that level.
    pub fn write_level(&mut self, data: &[u8]) -> Result<(), ContainerError> {
        let index = self.next_level;
        if index >= self.mip_levels {
            return Err(ContainerError::UnexpectedLevel {
                index,
                expected: self.mip_levels,
            });
        }

        let (width, height) = level_dimensions(self.width, self.height, index);
        let expected = self.pixel_format.blocks_byte_size(width, height);
        if data.len() != expected {
            return Err(ContainerError::LevelSize {
                index,
                expected,
                actual: data.len(),
            });
        }

        if self.format == ContainerFormat::Ktx {
            let size = u32::try_from(data.len())
                .map_err(|_| ContainerError::LevelTooLarge(data.len()))?;
            self.sink
                .write_all(&size.to_le_bytes())
                .map_err(ContainerError::io("level size"))?;
            self.bytes_written += 4;
        }

        self.sink
            .write_all(data)
            .map_err(ContainerError::io("level data"))?;
        self.bytes_written += data.len() as u64;
        self.next_level += 1;

        Ok(())
    }

    /// Flushes the sink and returns it with the number of bytes written.
    pub fn finish(mut self) -> Result<(W, u64), ContainerError> {
        if self.next_level != self.mip_levels {
            return Err(ContainerError::MissingLevels {
                written: self.next_level,
                expected: self.mip_levels,
            });
        }

        self.sink.flush().map_err(ContainerError::io("output file"))?;
        Ok((self.sink, self.bytes_written))
    }
}
