use std::fmt;

use crate::{raster::Channels, Error, PixelFormat};

/// Block codec family.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Debug, Default)]
pub enum Codec {
    /// ETC1, RGB only. Understood by every OpenGL ES 2.0 device.
    Etc1,
    /// ETC2 RGB, or ETC2 RGBA8 with EAC alpha.
    #[default]
    Etc2,
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Codec::Etc1 => f.write_str("ETC1"),
            Codec::Etc2 => f.write_str("ETC2"),
        }
    }
}

/// Search effort of the block encoders.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Debug, Default)]
pub enum Quality {
    Fast,
    #[default]
    Medium,
    Slow,
}

impl Quality {
    pub const fn name(self) -> &'static str {
        match self {
            Quality::Fast => "fast",
            Quality::Medium => "medium",
            Quality::Slow => "slow",
        }
    }
}

/// Encoding settings for the ETC encoders.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct EtcSettings {
    pub(crate) quality: Quality,
    /// Offsets applied along the grey axis to the sub-block base color.
    pub(crate) luma_radius: i32,
    /// Per-channel offsets applied to the sub-block base color.
    pub(crate) channel_radius: i32,
    pub(crate) planar_refine: bool,
    pub(crate) alpha_radius: i32,
}

impl EtcSettings {
    /// Fast settings. Only the averaged sub-block colors are tried.
    pub const fn fast() -> Self {
        Self {
            quality: Quality::Fast,
            luma_radius: 0,
            channel_radius: 0,
            planar_refine: false,
            alpha_radius: 0,
        }
    }

    /// Medium settings.
    pub const fn medium() -> Self {
        Self {
            quality: Quality::Medium,
            luma_radius: 2,
            channel_radius: 0,
            planar_refine: true,
            alpha_radius: 1,
        }
    }

    /// Slow settings.
    pub const fn slow() -> Self {
        Self {
            quality: Quality::Slow,
            luma_radius: 3,
            channel_radius: 1,
            planar_refine: true,
            alpha_radius: 2,
        }
    }

    pub const fn from_quality(quality: Quality) -> Self {
        match quality {
            Quality::Fast => Self::fast(),
            Quality::Medium => Self::medium(),
            Quality::Slow => Self::slow(),
        }
    }

    pub const fn quality(&self) -> Quality {
        self.quality
    }
}

impl Default for EtcSettings {
    fn default() -> Self {
        Self::medium()
    }
}

/// Immutable parameters shared by every block job of a run.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CompressionParams {
    codec: Codec,
    alpha: bool,
    settings: EtcSettings,
}

impl CompressionParams {
    /// Creates parameters with an explicit alpha choice.
    ///
    /// Fails if alpha is requested for ETC1.
    pub fn new(codec: Codec, alpha: bool, settings: EtcSettings) -> Result<Self, Error> {
        if alpha && codec == Codec::Etc1 {
            return Err(Error::AlphaUnsupported(codec));
        }

        Ok(Self {
            codec,
            alpha,
            settings,
        })
    }

    /// Derives the parameters for an image with the given channel layout.
    ///
    /// Alpha is enabled only for four channel images compressed with ETC2.
    /// A three channel image never produces alpha blocks.
    pub fn for_channels(codec: Codec, channels: Channels, settings: EtcSettings) -> Self {
        let alpha = codec == Codec::Etc2 && channels == Channels::Rgba;

        Self {
            codec,
            alpha,
            settings,
        }
    }

    /// Checks that these parameters can be applied to an image.
    pub fn validate(&self, channels: Channels) -> Result<(), Error> {
        if self.alpha && channels != Channels::Rgba {
            return Err(Error::AlphaWithoutChannel);
        }
        Ok(())
    }

    pub const fn codec(&self) -> Codec {
        self.codec
    }

    pub const fn alpha(&self) -> bool {
        self.alpha
    }

    pub const fn settings(&self) -> &EtcSettings {
        &self.settings
    }

    pub const fn pixel_format(&self) -> PixelFormat {
        match (self.codec, self.alpha) {
            (Codec::Etc1, _) => PixelFormat::Etc1Rgb,
            (Codec::Etc2, false) => PixelFormat::Etc2Rgb,
            (Codec::Etc2, true) => PixelFormat::Etc2Rgba,
        }
    }

    pub const fn block_byte_size(&self) -> usize {
        self.pixel_format().block_byte_size() as usize
    }
}
