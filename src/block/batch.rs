use rayon::prelude::*;

use super::footprint::FilterCtx;
use super::image_block::ImageBlock;
use super::opts::{ExecCaps, ExecStrategy};
use super::splat::{splat_box, splat_coalesced, splat_unrolled};
use super::trace::TraceKind;
use crate::foundation::core::Point;
use crate::foundation::error::{FilmError, FilmResult};
use crate::foundation::math::point_to_f32;
use crate::storage::buffer::Atomic;

/// Samples to splat: positions, sample-major channel values and active flags.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleBatch {
    channel_count: usize,
    positions: Vec<Point>,
    values: Vec<f32>,
    active: Vec<bool>,
}

impl SampleBatch {
    /// Empty batch for samples with `channel_count` values each.
    pub fn new(channel_count: u32) -> Self {
        Self {
            channel_count: channel_count as usize,
            ..Self::default()
        }
    }

    /// Build a batch from parallel arrays. `values` holds `channel_count` floats per sample.
    pub fn from_parts(
        channel_count: u32,
        positions: Vec<Point>,
        values: Vec<f32>,
        active: Vec<bool>,
    ) -> FilmResult<Self> {
        let c = channel_count as usize;
        if positions.len() != active.len() {
            return Err(FilmError::batch(format!(
                "{} positions but {} active flags",
                positions.len(),
                active.len()
            )));
        }
        if values.len() != positions.len() * c {
            return Err(FilmError::batch(format!(
                "{} samples with {c} channels need {} values, got {}",
                positions.len(),
                positions.len() * c,
                values.len()
            )));
        }
        Ok(Self {
            channel_count: c,
            positions,
            values,
            active,
        })
    }

    /// Append one sample.
    pub fn push(&mut self, pos: Point, values: &[f32], active: bool) -> FilmResult<()> {
        if values.len() != self.channel_count {
            return Err(FilmError::batch(format!(
                "sample has {} values, batch expects {}",
                values.len(),
                self.channel_count
            )));
        }
        self.positions.push(pos);
        self.values.extend_from_slice(values);
        self.active.push(active);
        Ok(())
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// `true` when the batch holds no samples.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Values per sample.
    pub fn channel_count(&self) -> u32 {
        self.channel_count as u32
    }

    /// Position, values and active flag of sample `i`.
    pub fn sample(&self, i: usize) -> (Point, &[f32], bool) {
        let c = self.channel_count;
        (
            self.positions[i],
            &self.values[i * c..(i + 1) * c],
            self.active[i],
        )
    }
}

/// Result of a batched gather: sample-major values and per-sample active flags.
#[derive(Clone, Debug, PartialEq)]
pub struct GatherBatch {
    channel_count: usize,
    values: Vec<f32>,
    active: Vec<bool>,
}

impl GatherBatch {
    pub(super) fn for_positions(
        channel_count: u32,
        positions: &[Point],
        active: &[bool],
    ) -> FilmResult<Self> {
        if positions.len() != active.len() {
            return Err(FilmError::batch(format!(
                "{} positions but {} active flags",
                positions.len(),
                active.len()
            )));
        }
        let c = channel_count as usize;
        Ok(Self {
            channel_count: c,
            values: vec![0.0; positions.len() * c],
            active: vec![false; positions.len()],
        })
    }

    pub(super) fn parts_mut(&mut self) -> (&mut [f32], &mut [bool]) {
        (&mut self.values, &mut self.active)
    }

    /// Number of gathered samples.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// `true` when no samples were gathered.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Filtered values of sample `i`.
    pub fn values(&self, i: usize) -> &[f32] {
        let c = self.channel_count;
        &self.values[i * c..(i + 1) * c]
    }

    /// Whether sample `i` was in range and active.
    pub fn is_active(&self, i: usize) -> bool {
        self.active[i]
    }

    /// All values, sample-major.
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}

/// Shared handle for concurrent scatter into one block.
///
/// Holds the block by shared borrow, so the block cannot be resized or cleared while any
/// splatter is alive. Every per-pixel add is atomic.
#[derive(Clone, Copy, Debug)]
pub struct Splatter<'a> {
    block: &'a ImageBlock,
}

impl<'a> Splatter<'a> {
    pub(super) fn new(block: &'a ImageBlock) -> Self {
        Self { block }
    }

    /// Scatter one sample. Uses the coalesced footprint when the block enables it.
    pub fn put(&self, pos: Point, values: &[f32], active: bool) {
        let block = self.block;
        block.check_values_len(values);
        block.check_sample(values, active);
        let pos = point_to_f32(pos);
        if !active || !pos[0].is_finite() || !pos[1].is_finite() {
            return;
        }

        let geo = block.geometry();
        let mut target = Atomic(&block.buffer);
        match block.filter.as_deref() {
            None => splat_box(&geo, &mut target, pos, values),
            Some(filter) => {
                let ctx = FilterCtx {
                    geo,
                    filter,
                    normalize: block.opts.normalize,
                };
                if block.opts.coalesce {
                    splat_coalesced(&ctx, &mut target, pos, values);
                } else {
                    splat_unrolled(&ctx, &mut target, pos, values);
                }
            }
        }
    }

    /// Scatter every sample of `batch` on the rayon pool.
    pub fn put_batch(&self, batch: &SampleBatch) {
        (0..batch.len()).into_par_iter().for_each(|i| {
            let (pos, values, active) = batch.sample(i);
            self.put(pos, values, active);
        });
    }
}

impl ImageBlock {
    /// Shared handle for scattering from parallel code.
    pub fn splatter(&self) -> Splatter<'_> {
        Splatter::new(self)
    }

    pub(super) fn check_batch_channels(&self, channel_count: u32) -> FilmResult<()> {
        if channel_count != self.channel_count {
            return Err(FilmError::batch(format!(
                "batch has {channel_count} channels, block has {}",
                self.channel_count
            )));
        }
        Ok(())
    }

    /// Splat a batch using the strategy selected from `caps`.
    #[tracing::instrument(level = "debug", skip_all, fields(samples = batch.len(), ?caps))]
    pub fn put_batch(&mut self, batch: &SampleBatch, caps: ExecCaps) -> FilmResult<()> {
        self.check_batch_channels(batch.channel_count())?;

        match ExecStrategy::select(caps) {
            ExecStrategy::Scalar => {
                for i in 0..batch.len() {
                    let (pos, values, active) = batch.sample(i);
                    self.put(pos, values, active);
                }
            }
            ExecStrategy::Vectorized => self.splatter().put_batch(batch),
            ExecStrategy::Traced => match self.traced_splat_kind() {
                Some(kind) => {
                    let trace = self.trace(kind)?;
                    self.replay_splat(trace, batch);
                }
                None => {
                    tracing::debug!("splat not traceable for this block, using unrolled loops");
                    self.splatter().put_batch(batch);
                }
            },
        }
        Ok(())
    }

    fn traced_splat_kind(&self) -> Option<TraceKind> {
        if self.filter.is_none() || self.opts.normalize {
            return None;
        }
        Some(if self.opts.coalesce {
            TraceKind::CoalescedSplat
        } else {
            TraceKind::Splat
        })
    }

    /// Gather filtered values at `positions` using the strategy selected from `caps`.
    #[tracing::instrument(level = "debug", skip_all, fields(samples = positions.len(), ?caps))]
    pub fn read_batch(
        &self,
        positions: &[Point],
        active: &[bool],
        caps: ExecCaps,
    ) -> FilmResult<GatherBatch> {
        let mut out = GatherBatch::for_positions(self.channel_count, positions, active)?;
        let strategy = ExecStrategy::select(caps);

        if strategy == ExecStrategy::Traced && self.filter.is_some() {
            let trace = self.trace(TraceKind::Gather)?;
            self.replay_gather(trace, positions, active, &mut out);
            return Ok(out);
        }

        let channels = self.channel_count as usize;
        let (values, flags) = out.parts_mut();
        match strategy {
            ExecStrategy::Scalar => {
                for (i, (vals, flag)) in values
                    .chunks_mut(channels)
                    .zip(flags.iter_mut())
                    .enumerate()
                {
                    *flag = self.read(positions[i], vals, active[i]);
                }
            }
            ExecStrategy::Vectorized | ExecStrategy::Traced => {
                values
                    .par_chunks_mut(channels)
                    .zip(flags.par_iter_mut())
                    .enumerate()
                    .for_each(|(i, (vals, flag))| {
                        *flag = self.read_unrolled(positions[i], vals, active[i]);
                    });
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/block/batch.rs"]
mod tests;
