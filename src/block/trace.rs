//! Replayable loop traces.
//!
//! A [`LoopTrace`] is the per-sample iteration structure of a filtered splat or gather,
//! recorded once per block geometry and replayed for every sample of every batch. Its trip
//! count depends only on the filter radius, so the same trace is valid for any sample: taps a
//! particular sample does not cover are masked during replay, never skipped structurally.

use std::sync::OnceLock;

use rayon::prelude::*;

use super::batch::{GatherBatch, SampleBatch};
use super::footprint::FilterCtx;
use super::gather::GatherLane;
use super::image_block::ImageBlock;
use super::splat::{CoalescedLane, SplatLane};
use crate::filter::ReconstructionFilter;
use crate::foundation::core::{BlockSize, Point};
use crate::foundation::error::{FilmError, FilmResult};
use crate::foundation::math::{coalesced_half_width, conservative_tap_count, point_to_f32};
use crate::storage::buffer::Atomic;

/// Which kernel a trace drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    /// Scatter over the exact (clipped) footprint.
    Splat,
    /// Scatter over the fixed, position-snapped footprint.
    CoalescedSplat,
    /// Gather over the exact (clipped) footprint.
    Gather,
}

impl TraceKind {
    /// Uniform per-axis trip count for a filter of `radius`.
    pub fn trip_count(self, radius: f32) -> u32 {
        match self {
            Self::Splat | Self::Gather => conservative_tap_count(radius),
            Self::CoalescedSplat => 2 * coalesced_half_width(radius) + 1,
        }
    }

    fn is_splat(self) -> bool {
        matches!(self, Self::Splat | Self::CoalescedSplat)
    }
}

/// Everything a trace's structure depends on. A trace replays only against matching blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct TraceKey {
    pub(crate) kind: TraceKind,
    pub(crate) size_ext: BlockSize,
    pub(crate) border_size: u32,
    pub(crate) channel_count: u32,
    pub(crate) radius_bits: u32,
}

impl TraceKey {
    fn radius(&self) -> f32 {
        f32::from_bits(self.radius_bits)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TraceOp {
    /// Begin outer iteration `ys`: evaluate the Y weight and row mask.
    Row(u32),
    /// Inner iteration `xs` of the current row: weight, mask, scatter or gather.
    Col(u32),
}

/// Executes trace ops for one sample.
pub(crate) trait TraceLane {
    fn row(&mut self, ys: u32);
    fn col(&mut self, xs: u32);
}

/// Recorded two-level loop with a uniform, sample-independent trip count.
#[derive(Clone, Debug)]
pub struct LoopTrace {
    key: TraceKey,
    trip: u32,
    ops: Vec<TraceOp>,
}

impl LoopTrace {
    pub(crate) fn record(key: TraceKey) -> Self {
        let trip = key.kind.trip_count(key.radius());
        let mut ops = Vec::with_capacity((trip * (trip + 1)) as usize);
        for ys in 0..trip {
            ops.push(TraceOp::Row(ys));
            ops.extend((0..trip).map(TraceOp::Col));
        }
        tracing::debug!(kind = ?key.kind, trip, ops = ops.len(), "recorded loop trace");
        Self { key, trip, ops }
    }

    /// Kernel this trace drives.
    pub fn kind(&self) -> TraceKind {
        self.key.kind
    }

    /// Iterations per axis.
    pub fn trip_count(&self) -> u32 {
        self.trip
    }

    /// Total recorded ops (`trip * (trip + 1)`).
    pub fn op_count(&self) -> usize {
        self.ops.len()
    }

    pub(crate) fn key(&self) -> TraceKey {
        self.key
    }

    pub(crate) fn replay(&self, lane: &mut impl TraceLane) {
        assert_eq!(
            self.trip,
            self.key.kind.trip_count(self.key.radius()),
            "loop trace trip count must derive from the filter radius alone"
        );
        for &op in &self.ops {
            match op {
                TraceOp::Row(ys) => lane.row(ys),
                TraceOp::Col(xs) => lane.col(xs),
            }
        }
    }
}

/// Lazily recorded traces of one block geometry.
#[derive(Debug, Default)]
pub(crate) struct TraceSet {
    splat: OnceLock<LoopTrace>,
    coalesced: OnceLock<LoopTrace>,
    gather: OnceLock<LoopTrace>,
}

impl TraceSet {
    fn slot(&self, kind: TraceKind) -> &OnceLock<LoopTrace> {
        match kind {
            TraceKind::Splat => &self.splat,
            TraceKind::CoalescedSplat => &self.coalesced,
            TraceKind::Gather => &self.gather,
        }
    }
}

impl ImageBlock {
    fn trace_key(&self, kind: TraceKind, filter: &dyn ReconstructionFilter) -> TraceKey {
        TraceKey {
            kind,
            size_ext: self.size.extended(self.border_size),
            border_size: self.border_size,
            channel_count: self.channel_count,
            radius_bits: filter.radius().to_bits(),
        }
    }

    fn traced_filter(&self) -> FilmResult<&dyn ReconstructionFilter> {
        self.filter
            .as_deref()
            .ok_or_else(|| FilmError::trace("box-filter blocks accumulate without a loop trace"))
    }

    /// Cached trace of `kind` for this block, recorded on first use.
    pub fn trace(&self, kind: TraceKind) -> FilmResult<&LoopTrace> {
        let filter = self.traced_filter()?;
        let key = self.trace_key(kind, filter);
        Ok(self.traces.slot(kind).get_or_init(|| LoopTrace::record(key)))
    }

    /// Record a fresh, owned trace of `kind` for this block's geometry.
    pub fn record_trace(&self, kind: TraceKind) -> FilmResult<LoopTrace> {
        let filter = self.traced_filter()?;
        Ok(LoopTrace::record(self.trace_key(kind, filter)))
    }

    fn check_trace(&self, trace: &LoopTrace) -> FilmResult<&dyn ReconstructionFilter> {
        let filter = self.traced_filter()?;
        let expected = self.trace_key(trace.kind(), filter);
        if trace.key() != expected {
            return Err(FilmError::trace(format!(
                "trace recorded for {:?} does not match block {:?}",
                trace.key(),
                expected
            )));
        }
        Ok(filter)
    }

    /// Scatter `batch` by replaying `trace`, in parallel with atomic adds.
    pub fn put_traced(&mut self, trace: &LoopTrace, batch: &SampleBatch) -> FilmResult<()> {
        if !trace.kind().is_splat() {
            return Err(FilmError::trace("put_traced requires a splat trace"));
        }
        if self.opts.normalize {
            return Err(FilmError::trace(
                "normalized splats cannot be replayed from a loop trace",
            ));
        }
        self.check_batch_channels(batch.channel_count())?;
        self.check_trace(trace)?;
        self.replay_splat(trace, batch);
        Ok(())
    }

    /// Gather `positions` by replaying `trace`, in parallel.
    pub fn read_traced(
        &self,
        trace: &LoopTrace,
        positions: &[Point],
        active: &[bool],
    ) -> FilmResult<GatherBatch> {
        if trace.kind() != TraceKind::Gather {
            return Err(FilmError::trace("read_traced requires a gather trace"));
        }
        self.check_trace(trace)?;
        let mut out = GatherBatch::for_positions(self.channel_count, positions, active)?;
        self.replay_gather(trace, positions, active, &mut out);
        Ok(out)
    }

    pub(super) fn replay_splat(&self, trace: &LoopTrace, batch: &SampleBatch) {
        let Some(filter) = self.filter.as_deref() else {
            return;
        };
        let ctx = FilterCtx {
            geo: self.geometry(),
            filter,
            normalize: false,
        };
        let target = Atomic(&self.buffer);
        let coalesced = trace.kind() == TraceKind::CoalescedSplat;

        (0..batch.len()).into_par_iter().for_each(|i| {
            let (pos, values, active) = batch.sample(i);
            self.check_sample(values, active);
            let pos = point_to_f32(pos);
            let active = active && pos[0].is_finite() && pos[1].is_finite();
            if coalesced {
                trace.replay(&mut CoalescedLane::new(ctx, target, pos, values, active));
            } else {
                trace.replay(&mut SplatLane::new(ctx, target, pos, values, active));
            }
        });
    }

    pub(super) fn replay_gather(
        &self,
        trace: &LoopTrace,
        positions: &[Point],
        active: &[bool],
        out: &mut GatherBatch,
    ) {
        let Some(filter) = self.filter.as_deref() else {
            return;
        };
        let ctx = FilterCtx {
            geo: self.geometry(),
            filter,
            normalize: self.opts.normalize,
        };
        let channels = self.channel_count as usize;
        let (values, flags) = out.parts_mut();

        values
            .par_chunks_mut(channels)
            .zip(flags.par_iter_mut())
            .enumerate()
            .for_each(|(i, (vals, flag))| {
                let local = ctx.geo.local(point_to_f32(positions[i]));
                let inside = active[i] && ctx.geo.inside(local);
                let mut lane = GatherLane::new(ctx, &self.buffer, local, vals, inside);
                trace.replay(&mut lane);
                *flag = lane.finish();
            });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/block/trace.rs"]
mod tests;
