//! CPU based ETC encoding.

mod common;
mod eac;
mod etc1;
mod etc2;

use crate::{
    block::PixelBlock,
    encode::{eac::BlockCompressorEac, etc1::BlockCompressorEtc1, etc2::BlockCompressorEtc2},
    Codec, CompressionParams,
};

/// Compresses one 4x4 block into its ETC representation.
///
/// The codec, the alpha handling and the search effort are taken from `params`.
/// Encoding is total: every block produces a valid code.
///
/// # Buffer Requirements
/// `destination` must be exactly [`CompressionParams::block_byte_size()`] bytes
/// long: 8 bytes for the RGB formats, 16 bytes for ETC2 with alpha. With alpha
/// the EAC alpha block comes first, followed by the ETC2 color block.
///
/// # Panics
/// If `destination` has the wrong length.
///
/// # Example
/// ```
/// use etc_compression::{encode::encode_block, Codec, CompressionParams, EtcSettings, PixelBlock};
///
/// let block = PixelBlock::from_rgba([[200, 100, 50, 255]; 16]);
/// let params = CompressionParams::new(Codec::Etc2, false, EtcSettings::fast()).unwrap();
///
/// let mut code = [0u8; 8];
/// encode_block(&block, &params, &mut code);
/// ```
pub fn encode_block(block: &PixelBlock, params: &CompressionParams, destination: &mut [u8]) {
    let block_size = params.block_byte_size();
    assert_eq!(
        destination.len(),
        block_size,
        "destination size ({}) does not match the block size ({})",
        destination.len(),
        block_size
    );

    let settings = params.settings();

    match (params.codec(), params.alpha()) {
        (Codec::Etc1, _) => {
            let mut block_compressor = BlockCompressorEtc1::new(settings);

            block_compressor.load_block(block);
            let color_result = block_compressor.compress_block_core();
            block_compressor.store_data(&color_result, destination);
        }
        (Codec::Etc2, false) => {
            let mut block_compressor = BlockCompressorEtc2::new(settings);

            block_compressor.load_block(block);
            let color_result = block_compressor.compress_block_core();
            block_compressor.store_data(color_result, destination);
        }
        (Codec::Etc2, true) => {
            let (alpha_data, color_data) = destination.split_at_mut(8);

            let mut alpha_compressor = BlockCompressorEac::new(settings);
            alpha_compressor.load_block(block);
            let alpha_result = alpha_compressor.compress_block_core();
            alpha_compressor.store_data(alpha_result.pack(), alpha_data);

            let mut block_compressor = BlockCompressorEtc2::new(settings);
            block_compressor.load_block(block);
            let color_result = block_compressor.compress_block_core();
            block_compressor.store_data(color_result, color_data);
        }
    }
}
