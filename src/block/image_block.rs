use std::sync::Arc;

use super::diag::{DiagnosticSink, TracingSink, invalid_sample_message, is_invalid};
use super::footprint::{FilterCtx, Geometry};
use super::gather::{gather_box, gather_scalar, gather_unrolled};
use super::opts::BlockOpts;
use super::splat::{splat_box, splat_scalar};
use super::trace::TraceSet;
use crate::filter::{BOX_FILTER_RADIUS, ReconstructionFilter};
use crate::foundation::core::{BlockSize, PixelOffset, Point};
use crate::foundation::error::{FilmError, FilmResult};
use crate::foundation::math::point_to_f32;
use crate::storage::buffer::{AccumBuffer, Exclusive};
use crate::storage::tensor::TensorXf;

/// A bordered tile of an image holding per-pixel channel sums.
///
/// Samples are splatted with [`put`](Self::put) (or [`put_batch`](Self::put_batch)), filtered
/// values are read back with [`read`](Self::read), and tiles are combined with
/// [`merge`](Self::merge).
///
/// The buffer covers the interior plus `border_size` pixels on every side, laid out row-major
/// as `(height + 2b, width + 2b, channel_count)`.
pub struct ImageBlock {
    pub(super) offset: PixelOffset,
    pub(super) size: BlockSize,
    pub(super) border_size: u32,
    pub(super) channel_count: u32,
    pub(super) buffer: AccumBuffer,
    pub(super) filter: Option<Arc<dyn ReconstructionFilter>>,
    pub(super) opts: BlockOpts,
    pub(super) sink: Arc<dyn DiagnosticSink>,
    pub(super) traces: TraceSet,
}

/// Drop box filters: the fast path reproduces them exactly.
fn effective_filter(
    filter: Option<Arc<dyn ReconstructionFilter>>,
) -> Option<Arc<dyn ReconstructionFilter>> {
    filter.filter(|f| f.radius() != BOX_FILTER_RADIUS)
}

fn border_for(filter: Option<&Arc<dyn ReconstructionFilter>>, opts: &BlockOpts) -> u32 {
    match filter {
        Some(f) if opts.border => f.border_size(),
        _ => 0,
    }
}

fn buffer_len(size: BlockSize, border_size: u32, channel_count: u32) -> usize {
    size.extended(border_size).area() * channel_count as usize
}

impl ImageBlock {
    /// Zero-filled block with an interior of `size` pixels.
    pub fn new(
        size: BlockSize,
        channel_count: u32,
        filter: Option<Arc<dyn ReconstructionFilter>>,
        opts: BlockOpts,
    ) -> FilmResult<Self> {
        if channel_count == 0 {
            return Err(FilmError::configuration(
                "ImageBlock::new(): channel_count must be > 0",
            ));
        }
        let filter = effective_filter(filter);
        let border_size = border_for(filter.as_ref(), &opts);

        Ok(Self {
            offset: PixelOffset::default(),
            size,
            border_size,
            channel_count,
            buffer: AccumBuffer::zeroed(buffer_len(size, border_size, channel_count)),
            filter,
            opts,
            sink: Arc::new(TracingSink),
            traces: TraceSet::default(),
        })
    }

    /// Block holding a deep copy of a `(height, width, channels)` tensor.
    ///
    /// With a border, the tensor is the padded buffer: its outer `border_size` ring becomes the
    /// border and the interior shrinks accordingly.
    #[tracing::instrument(level = "debug", skip_all, fields(shape = ?tensor.shape()))]
    pub fn from_tensor(
        tensor: &TensorXf,
        filter: Option<Arc<dyn ReconstructionFilter>>,
        opts: BlockOpts,
    ) -> FilmResult<Self> {
        let &[height, width, channels] = tensor.shape() else {
            return Err(FilmError::configuration(format!(
                "ImageBlock::from_tensor(): expected a 3D tensor (height x width x channels), got rank {}",
                tensor.ndim()
            )));
        };
        if channels == 0 {
            return Err(FilmError::configuration(
                "ImageBlock::from_tensor(): tensor has no channels",
            ));
        }

        let filter = effective_filter(filter);
        let border_size = border_for(filter.as_ref(), &opts);
        let doubled = 2 * border_size as usize;
        if width < doubled || height < doubled {
            return Err(FilmError::configuration(format!(
                "ImageBlock::from_tensor(): {width}x{height} image is too small to have a {border_size} pixel boundary"
            )));
        }

        let dim = |v: usize, what: &str| {
            u32::try_from(v).map_err(|_| {
                FilmError::configuration(format!(
                    "ImageBlock::from_tensor(): {what} {v} exceeds u32"
                ))
            })
        };
        let size = BlockSize::new(dim(width - doubled, "width")?, dim(height - doubled, "height")?);
        let channel_count = dim(channels, "channel count")?;

        Ok(Self {
            offset: PixelOffset::default(),
            size,
            border_size,
            channel_count,
            buffer: AccumBuffer::from_slice(tensor.as_slice()),
            filter,
            opts,
            sink: Arc::new(TracingSink),
            traces: TraceSet::default(),
        })
    }

    /// Route invalid-sample warnings to `sink` instead of `tracing`.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Change the interior size. A no-op for the current size; otherwise the buffer is
    /// reallocated and zero-filled.
    pub fn resize(&mut self, size: BlockSize) {
        if size == self.size {
            return;
        }
        self.size = size;
        self.buffer = AccumBuffer::zeroed(buffer_len(size, self.border_size, self.channel_count));
        self.traces = TraceSet::default();
    }

    /// Zero the whole buffer, border included.
    pub fn clear(&mut self) {
        self.buffer =
            AccumBuffer::zeroed(buffer_len(self.size, self.border_size, self.channel_count));
    }

    /// Position of the interior's top-left pixel in the parent image.
    pub fn offset(&self) -> PixelOffset {
        self.offset
    }

    /// Move the block within the parent image. Contents are kept.
    pub fn set_offset(&mut self, offset: PixelOffset) {
        self.offset = offset;
    }

    /// Interior size (border excluded).
    pub fn size(&self) -> BlockSize {
        self.size
    }

    /// Padding on each side of the interior.
    pub fn border_size(&self) -> u32 {
        self.border_size
    }

    /// Values stored per pixel.
    pub fn channel_count(&self) -> u32 {
        self.channel_count
    }

    /// The reconstruction filter, or `None` when the box fast path is in use.
    pub fn filter(&self) -> Option<&Arc<dyn ReconstructionFilter>> {
        self.filter.as_ref()
    }

    /// Accumulation options.
    pub fn opts(&self) -> BlockOpts {
        self.opts
    }

    /// Whether splats and gathers are normalized by their total filter weight.
    pub fn normalize(&self) -> bool {
        self.opts.normalize
    }

    /// Whether batched scatter uses the coalesced footprint.
    pub fn coalesce(&self) -> bool {
        self.opts.coalesce
    }

    /// Whether negative sample values are reported.
    pub fn warn_negative(&self) -> bool {
        self.opts.warn_negative
    }

    /// Enable or disable negative-value warnings.
    pub fn set_warn_negative(&mut self, value: bool) {
        self.opts.warn_negative = value;
    }

    /// Whether non-finite sample values are reported.
    pub fn warn_invalid(&self) -> bool {
        self.opts.warn_invalid
    }

    /// Enable or disable non-finite-value warnings.
    pub fn set_warn_invalid(&mut self, value: bool) {
        self.opts.warn_invalid = value;
    }

    /// Deep copy of the padded buffer as a `(height + 2b, width + 2b, channels)` tensor.
    pub fn to_tensor(&self) -> TensorXf {
        let ext = self.size.extended(self.border_size);
        TensorXf::new(
            &[
                ext.height as usize,
                ext.width as usize,
                self.channel_count as usize,
            ],
            self.buffer.to_vec(),
        )
        .unwrap_or_else(|_| {
            unreachable!("block buffers always hold size_ext.area() * channels floats")
        })
    }

    /// Sum of every stored value, border included.
    pub fn total(&self) -> f64 {
        self.buffer.sum()
    }

    pub(super) fn geometry(&self) -> Geometry {
        let ext = self.size.extended(self.border_size);
        Geometry {
            offset: [self.offset.x, self.offset.y],
            size: self.size.as_i32(),
            size_ext: ext.as_i32(),
            border: self.border_size as i32,
            channels: self.channel_count as usize,
        }
    }

    pub(super) fn check_values_len(&self, values: &[f32]) {
        assert_eq!(
            values.len(),
            self.channel_count as usize,
            "expected one value per channel"
        );
    }

    pub(super) fn check_sample(&self, values: &[f32], active: bool) {
        let BlockOpts {
            warn_negative,
            warn_invalid,
            ..
        } = self.opts;
        if active && is_invalid(values, warn_negative, warn_invalid) {
            self.sink.warn(&invalid_sample_message(values));
        }
    }

    /// Splat one sample at `pos` (parent image coordinates).
    ///
    /// Samples whose footprint misses the buffer are dropped. Inactive samples are ignored
    /// entirely. Panics if `values.len() != channel_count`.
    pub fn put(&mut self, pos: Point, values: &[f32], active: bool) {
        self.check_values_len(values);
        self.check_sample(values, active);
        let pos = point_to_f32(pos);
        if !active || !pos[0].is_finite() || !pos[1].is_finite() {
            return;
        }

        let geo = self.geometry();
        let mut target = Exclusive(&mut self.buffer);
        match self.filter.as_deref() {
            None => splat_box(&geo, &mut target, pos, values),
            Some(filter) => {
                let ctx = FilterCtx {
                    geo,
                    filter,
                    normalize: self.opts.normalize,
                };
                splat_scalar(&ctx, &mut target, pos, values);
            }
        }
    }

    /// Read the filtered value at `pos` (parent image coordinates) into `values`.
    ///
    /// Returns the sample's final active state: `false` (with all-zero output) when `active`
    /// is false or the position lies outside the interior. Panics if
    /// `values.len() != channel_count`.
    pub fn read(&self, pos: Point, values: &mut [f32], active: bool) -> bool {
        self.read_with(pos, values, active, gather_scalar)
    }

    pub(super) fn read_unrolled(&self, pos: Point, values: &mut [f32], active: bool) -> bool {
        self.read_with(pos, values, active, gather_unrolled)
    }

    fn read_with(
        &self,
        pos: Point,
        values: &mut [f32],
        active: bool,
        kernel: impl Fn(&FilterCtx<'_>, &AccumBuffer, [f32; 2], &mut [f32]) -> bool,
    ) -> bool {
        self.check_values_len(values);
        values.fill(0.0);
        if !active {
            return false;
        }

        let geo = self.geometry();
        let local = geo.local(point_to_f32(pos));
        match self.filter.as_deref() {
            None => gather_box(&geo, &self.buffer, local, values),
            Some(filter) => {
                if !geo.inside(local) {
                    return false;
                }
                let ctx = FilterCtx {
                    geo,
                    filter,
                    normalize: self.opts.normalize,
                };
                kernel(&ctx, &self.buffer, local, values)
            }
        }
    }
}

impl std::fmt::Debug for ImageBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageBlock")
            .field("offset", &self.offset)
            .field("size", &self.size)
            .field("border_size", &self.border_size)
            .field("channel_count", &self.channel_count)
            .field("filter", &self.filter)
            .field("opts", &self.opts)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for ImageBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "ImageBlock[")?;
        writeln!(f, "  offset = {},", self.offset)?;
        writeln!(f, "  size = {},", self.size)?;
        writeln!(f, "  border_size = {},", self.border_size)?;
        writeln!(f, "  channel_count = {},", self.channel_count)?;
        writeln!(f, "  normalize = {},", self.opts.normalize)?;
        writeln!(f, "  coalesce = {},", self.opts.coalesce)?;
        writeln!(f, "  warn_negative = {},", self.opts.warn_negative)?;
        writeln!(f, "  warn_invalid = {},", self.opts.warn_invalid)?;
        match &self.filter {
            Some(filter) => writeln!(f, "  rfilter = {filter:?}")?,
            None => writeln!(f, "  rfilter = none")?,
        }
        write!(f, "]")
    }
}

#[cfg(test)]
#[path = "../../tests/unit/block/image_block.rs"]
mod tests;
