//! End-to-end conversion of an image file into a compressed texture file.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use tracing::{debug, info, instrument, warn};

use crate::{
    container::{ContainerFormat, ContainerWriter},
    dispatch::TaskDispatcher,
    mipmap::MipmapChain,
    raster::{Channels, RasterImage},
    Codec, CompressionParams, Error, EtcSettings, PixelFormat,
};

/// What was written by one encode.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EncodeSummary {
    pub width: u32,
    pub height: u32,
    pub channels: Channels,
    pub pixel_format: PixelFormat,
    pub container: ContainerFormat,
    pub mip_levels: u32,
    pub bytes_written: u64,
}

pub struct Pipeline {
    dispatcher: TaskDispatcher,
    settings: EtcSettings,
}

impl Pipeline {
    pub fn new(dispatcher: TaskDispatcher, settings: EtcSettings) -> Self {
        Self {
            dispatcher,
            settings,
        }
    }

    pub fn dispatcher(&self) -> &TaskDispatcher {
        &self.dispatcher
    }

    pub fn settings(&self) -> &EtcSettings {
        &self.settings
    }

    /// Decodes `input` and writes its compressed mip chain to `output`.
    ///
    /// The container is chosen from the suffix of `output`. The output file is
    /// only created once the suffix is known to be valid and the input has
    /// been decoded. A file left behind by a failed write is not removed.
    #[instrument(
        skip_all,
        fields(input = %input.as_ref().display(), output = %output.as_ref().display(), %codec)
    )]
    pub fn encode_file(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        codec: Codec,
    ) -> Result<EncodeSummary, Error> {
        let (input, output) = (input.as_ref(), output.as_ref());

        let container = ContainerFormat::from_path(output)?;
        let image = RasterImage::open(input)?;
        debug!(
            width = image.width(),
            height = image.height(),
            channels = image.channels().count(),
            "decoded input"
        );

        let file = File::create(output).map_err(|source| Error::CreateOutput {
            path: output.to_path_buf(),
            source,
        })?;

        self.encode_image(image, codec, container, BufWriter::new(file))
    }

    /// Writes the compressed mip chain of `image` into `sink`.
    ///
    /// Alpha blocks are produced only for four channel images encoded with
    /// ETC2. Only the image of the level in flight is kept in memory.
    pub fn encode_image<W: Write>(
        &self,
        image: RasterImage,
        codec: Codec,
        container: ContainerFormat,
        sink: W,
    ) -> Result<EncodeSummary, Error> {
        let channels = image.channels();
        if codec == Codec::Etc1 && channels.has_alpha() {
            warn!("ETC1 has no alpha channel, alpha will be discarded");
        }

        let params = CompressionParams::for_channels(codec, channels, self.settings);
        let pixel_format = params.pixel_format();
        let (width, height) = (image.width(), image.height());

        let chain = MipmapChain::new(&self.dispatcher, image, params)?;
        let mip_levels = chain.level_count();

        let mut writer =
            ContainerWriter::new(sink, container, pixel_format, width, height, mip_levels)?;
        for level in chain {
            let level = level?;
            writer.write_level(&level.data)?;
        }
        let (_, bytes_written) = writer.finish()?;

        info!(
            width,
            height,
            format = pixel_format.name(),
            container = container.name(),
            mip_levels,
            bytes_written,
            "texture written"
        );

        Ok(EncodeSummary {
            width,
            height,
            channels,
            pixel_format,
            container,
            mip_levels,
            bytes_written,
        })
    }
}
