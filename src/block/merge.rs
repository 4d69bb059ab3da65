use rayon::prelude::*;

use super::image_block::ImageBlock;
use super::opts::ExecCaps;
use crate::foundation::error::{FilmError, FilmResult};
use crate::storage::buffer::AccumBuffer;

/// Overlap of two padded buffers, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Overlap {
    /// Top-left of the overlap inside the source buffer.
    pub(crate) source: [usize; 2],
    /// Top-left of the overlap inside the target buffer.
    pub(crate) target: [usize; 2],
    pub(crate) width: usize,
    pub(crate) height: usize,
}

impl Overlap {
    /// Clip a `source_size` buffer placed at `anchor` (target pixels) to `[0, target_size)`.
    ///
    /// Returns `None` when nothing overlaps.
    pub(crate) fn clip(
        anchor: [i64; 2],
        source_size: [usize; 2],
        target_size: [usize; 2],
    ) -> Option<Self> {
        let mut source = [0usize; 2];
        let mut target = [0usize; 2];
        let mut extent = [0usize; 2];

        for axis in 0..2 {
            let lo = anchor[axis].max(0);
            let hi = (anchor[axis] + source_size[axis] as i64).min(target_size[axis] as i64);
            if hi <= lo {
                return None;
            }
            source[axis] = (lo - anchor[axis]) as usize;
            target[axis] = lo as usize;
            extent[axis] = (hi - lo) as usize;
        }

        Some(Self {
            source,
            target,
            width: extent[0],
            height: extent[1],
        })
    }
}

/// Raster add of `region` from `source` (row stride `source_width`) into `target`.
///
/// With `concurrent`, rows are distributed over the rayon pool and every add is atomic.
pub(crate) fn accumulate_2d(
    source: &AccumBuffer,
    source_width: usize,
    target: &mut AccumBuffer,
    target_width: usize,
    region: Overlap,
    channels: usize,
    concurrent: bool,
) {
    let row_len = region.width * channels;
    let source_row =
        |y: usize| ((region.source[1] + y) * source_width + region.source[0]) * channels;
    let target_row =
        |y: usize| ((region.target[1] + y) * target_width + region.target[0]) * channels;

    if concurrent {
        let target = &*target;
        (0..region.height).into_par_iter().for_each(|y| {
            let (src, dst) = (source_row(y), target_row(y));
            for i in 0..row_len {
                target.atomic_add(dst + i, source.get(src + i));
            }
        });
    } else {
        for y in 0..region.height {
            let (src, dst) = (source_row(y), target_row(y));
            for i in 0..row_len {
                target.add(dst + i, source.get(src + i));
            }
        }
    }
}

impl ImageBlock {
    /// Accumulate `other` (border included) into this block, sequentially.
    ///
    /// Pixels of `other` that fall outside this block's padded buffer are dropped.
    pub fn merge(&mut self, other: &ImageBlock) -> FilmResult<()> {
        self.merge_with(other, ExecCaps::SCALAR)
    }

    /// Accumulate `other` into this block, row-parallel when `caps` allows concurrent scatter.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(target = %self.size, source = %other.size)
    )]
    pub fn merge_with(&mut self, other: &ImageBlock, caps: ExecCaps) -> FilmResult<()> {
        if other.channel_count != self.channel_count {
            return Err(FilmError::configuration(format!(
                "ImageBlock::merge(): channel counts differ ({} into {})",
                other.channel_count, self.channel_count
            )));
        }

        if self.buffer.is_pristine()
            && self.size == other.size
            && self.offset == other.offset
            && self.border_size == other.border_size
        {
            tracing::debug!("merging into an empty block with identical geometry, copying");
            self.buffer.copy_from(&other.buffer);
            return Ok(());
        }

        let source_anchor = other.offset.padded_anchor(other.border_size);
        let target_anchor = self.offset.padded_anchor(self.border_size);
        let anchor = [
            i64::from(source_anchor[0]) - i64::from(target_anchor[0]),
            i64::from(source_anchor[1]) - i64::from(target_anchor[1]),
        ];
        let source_ext = other.size.extended(other.border_size);
        let target_ext = self.size.extended(self.border_size);

        let Some(region) = Overlap::clip(
            anchor,
            [source_ext.width as usize, source_ext.height as usize],
            [target_ext.width as usize, target_ext.height as usize],
        ) else {
            return Ok(());
        };

        accumulate_2d(
            &other.buffer,
            source_ext.width as usize,
            &mut self.buffer,
            target_ext.width as usize,
            region,
            self.channel_count as usize,
            caps.concurrent_scatter,
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/block/merge.rs"]
mod tests;
