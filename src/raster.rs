//! Decoded raster images.

use std::path::Path;

use bytemuck::cast_slice;
use image::{DynamicImage, ImageReader};

use crate::Error;

/// Interleaved channel layout of a [`RasterImage`].
#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub enum Channels {
    Rgb,
    Rgba,
}

impl Channels {
    /// Maps a decoder channel count to a layout.
    pub fn from_count(count: u8) -> Result<Self, Error> {
        match count {
            3 => Ok(Channels::Rgb),
            4 => Ok(Channels::Rgba),
            other => Err(Error::UnsupportedChannels(other)),
        }
    }

    pub const fn count(self) -> usize {
        match self {
            Channels::Rgb => 3,
            Channels::Rgba => 4,
        }
    }

    pub const fn has_alpha(self) -> bool {
        matches!(self, Channels::Rgba)
    }
}

/// Row-major image with interleaved 8-bit samples.
///
/// The buffer always holds exactly `width * height * channels` bytes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    channels: Channels,
    data: Vec<u8>,
}

impl RasterImage {
    pub fn new(width: u32, height: u32, channels: Channels, data: Vec<u8>) -> Result<Self, Error> {
        if width == 0 || height == 0 {
            return Err(Error::EmptyImage);
        }

        let expected = width as usize * height as usize * channels.count();
        if data.len() != expected {
            return Err(Error::BufferSize {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Decodes an image file, keeping its native channel count.
    ///
    /// Only RGB and RGBA images are accepted. Palette images are expanded by the
    /// decoder, 16-bit images are reduced to 8 bits per channel.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let decode_error = |source| Error::Decode {
            path: path.to_path_buf(),
            source,
        };

        let image = ImageReader::open(path)
            .map_err(|err| decode_error(image::ImageError::IoError(err)))?
            .with_guessed_format()
            .map_err(|err| decode_error(image::ImageError::IoError(err)))?
            .decode()
            .map_err(decode_error)?;

        Self::from_dynamic(image)
    }

    pub fn from_dynamic(image: DynamicImage) -> Result<Self, Error> {
        let width = image.width();
        let height = image.height();

        match Channels::from_count(image.color().channel_count())? {
            Channels::Rgb => Self::new(width, height, Channels::Rgb, image.into_rgb8().into_raw()),
            Channels::Rgba => {
                Self::new(width, height, Channels::Rgba, image.into_rgba8().into_raw())
            }
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> Channels {
        self.channels
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Returns the texel at `(x, y)` as RGBA. Images without alpha report 255.
    ///
    /// # Panics
    /// If the coordinate lies outside the image.
    #[inline]
    pub fn texel(&self, x: u32, y: u32) -> [u8; 4] {
        assert!(x < self.width && y < self.height);
        let index = y as usize * self.width as usize + x as usize;

        match self.channels {
            Channels::Rgb => {
                let texels: &[[u8; 3]] = cast_slice(&self.data);
                let [red, green, blue] = texels[index];
                [red, green, blue, 255]
            }
            Channels::Rgba => {
                let texels: &[[u8; 4]] = cast_slice(&self.data);
                texels[index]
            }
        }
    }

    /// Returns the texel at `(x, y)` with the coordinate clamped to the last
    /// valid column and row.
    #[inline]
    pub fn texel_clamped(&self, x: u32, y: u32) -> [u8; 4] {
        self.texel(x.min(self.width - 1), y.min(self.height - 1))
    }
}
