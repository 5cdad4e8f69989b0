//! Compression of one mip level into its block grid.

use tracing::{debug, instrument};

use crate::{
    block::PixelBlock,
    dispatch::{FinishFlag, Task, TaskDispatcher},
    encode::encode_block,
    raster::RasterImage,
    CompressionParams, Error, PixelFormat,
};

/// Compressed blocks of one mip level in row-major block order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CompressedLevel {
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
    pub data: Vec<u8>,
}

impl CompressedLevel {
    pub fn block_count(&self) -> usize {
        self.data.len() / self.pixel_format.block_byte_size() as usize
    }
}

/// Compresses the 4x4 block anchored at `(block_x * 4, block_y * 4)` into its
/// own slot of the level buffer.
pub struct BlockJob<'a> {
    image: &'a RasterImage,
    block_x: u32,
    block_y: u32,
    params: CompressionParams,
    destination: &'a mut [u8],
}

impl Task for BlockJob<'_> {
    fn run(self) {
        let block = PixelBlock::gather(self.image, self.block_x * 4, self.block_y * 4);
        encode_block(&block, &self.params, self.destination);
    }
}

/// Compresses `image` into `ceil(width / 4) * ceil(height / 4)` blocks.
///
/// One job per block is submitted to `dispatcher` and the call returns once
/// the whole batch has finished. Blocks past the right or bottom edge sample
/// the last valid column or row. The output does not depend on the order in
/// which the jobs ran.
#[instrument(
    skip_all,
    fields(width = image.width(), height = image.height(), format = params.pixel_format().name())
)]
pub fn compress_level(
    dispatcher: &TaskDispatcher,
    image: &RasterImage,
    params: &CompressionParams,
) -> Result<CompressedLevel, Error> {
    params.validate(image.channels())?;

    let pixel_format = params.pixel_format();
    let block_size = pixel_format.block_byte_size() as usize;
    let blocks_x = image.width().div_ceil(4);

    let mut data = vec![0; pixel_format.blocks_byte_size(image.width(), image.height())];

    dispatcher.scope(|queue| {
        let batch = FinishFlag::new();

        for (index, destination) in data.chunks_exact_mut(block_size).enumerate() {
            let index = index as u32;
            let job = BlockJob {
                image,
                block_x: index % blocks_x,
                block_y: index / blocks_x,
                params: *params,
                destination,
            };
            queue.enqueue_task(job, &batch);
        }

        queue.wait_until_finished(&batch);
    });

    debug!(bytes = data.len(), "level compressed");

    Ok(CompressedLevel {
        width: image.width(),
        height: image.height(),
        pixel_format,
        data,
    })
}
