use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::settings::Codec;

/// Errors returned by the compression pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// The input file could not be read or decoded.
    #[error("can't decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The decoded image has a channel count other than 3 or 4.
    #[error("unsupported number of channels: {0}")]
    UnsupportedChannels(u8),

    /// The image has a zero width or height.
    #[error("image has no pixels")]
    EmptyImage,

    /// The pixel buffer does not match `width * height * channels`.
    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    /// Alpha compression was requested for an image without an alpha channel.
    #[error("alpha compression requires a four channel image")]
    AlphaWithoutChannel,

    /// The selected codec has no alpha variant.
    #[error("{0} has no alpha variant")]
    AlphaUnsupported(Codec),

    /// The output file could not be created.
    #[error("error opening output file {}: {source}", path.display())]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing or reading a container failed.
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// The worker pool could not be started.
    #[error("can't start worker pool: {0}")]
    Dispatcher(#[from] rayon::ThreadPoolBuildError),
}

/// Errors raised while writing or parsing texture containers.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// The output path has no recognised container suffix.
    #[error("unknown output format: {0:?} (expected .dds or .ktx)")]
    UnknownFormat(String),

    /// The byte sink rejected a write.
    #[error("error writing {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: io::Error,
    },

    /// More levels were written than the header announced.
    #[error("level {index} was written but the header announces {expected} levels")]
    UnexpectedLevel { index: u32, expected: u32 },

    /// A level buffer does not have the size its dimensions require.
    #[error("level {index} holds {actual} bytes, expected {expected}")]
    LevelSize {
        index: u32,
        expected: usize,
        actual: usize,
    },

    /// The container was finished before every level was written.
    #[error("only {written} of {expected} levels were written")]
    MissingLevels { written: u32, expected: u32 },

    /// A level is too large for the 32-bit size prefix.
    #[error("level of {0} bytes does not fit a 32-bit size field")]
    LevelTooLarge(usize),

    /// The byte stream ended inside a header or level.
    #[error("container data is truncated")]
    Truncated,

    /// The byte stream does not start with the expected identifier.
    #[error("container identifier does not match")]
    BadIdentifier,
}

impl ContainerError {
    pub(crate) fn io(context: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| ContainerError::Io { context, source }
    }
}
