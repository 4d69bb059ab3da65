//! Gather kernels behind `ImageBlock::read`.
//!
//! Callers zero `out` and reject positions outside the interior before dispatching here.

use super::footprint::{
    FilterCtx, Footprint, Geometry, axis_weights, gather_outer, scale, total_weight,
};
use super::trace::TraceLane;
use crate::foundation::math::{Point2f, conservative_tap_count, floor2int, rcp_or_zero};
use crate::storage::buffer::AccumBuffer;

/// Box filter: copy the pixel containing `local`. Returns whether it was in range.
pub(crate) fn gather_box(
    geo: &Geometry,
    buffer: &AccumBuffer,
    local: Point2f,
    out: &mut [f32],
) -> bool {
    if !geo.inside(local) {
        return false;
    }
    let p = floor2int(local);
    let index = geo.index(p[0], p[1]);
    for (k, o) in out.iter_mut().enumerate() {
        *o = buffer.get(index + k);
    }
    true
}

/// Exact footprint, discretized weights. Returns the sample's final active state.
pub(crate) fn gather_scalar(
    ctx: &FilterCtx<'_>,
    buffer: &AccumBuffer,
    local: Point2f,
    out: &mut [f32],
) -> bool {
    let geo = &ctx.geo;
    let fp = Footprint::exact(geo.padded(local), ctx.filter.radius(), geo.size_ext);
    if fp.is_empty() {
        return false;
    }

    let count = fp.count();
    let eval = |x| ctx.filter.eval_discretized(x);
    let mut wx = axis_weights(count[0], fp.rel[0], eval, |_| true);
    let wy = axis_weights(count[1], fp.rel[1], eval, |_| true);

    if ctx.normalize {
        let total = total_weight(&wx, &wy);
        if total == 0.0 {
            return true;
        }
        scale(&mut wx, total.recip());
    }

    gather_outer(buffer, geo, fp.first, &wx, &wy, out, |_, _| true);
    true
}

/// Conservative `ceil(2r)` taps per axis with masking, continuous weights.
pub(crate) fn gather_unrolled(
    ctx: &FilterCtx<'_>,
    buffer: &AccumBuffer,
    local: Point2f,
    out: &mut [f32],
) -> bool {
    let geo = &ctx.geo;
    let fp = Footprint::exact(geo.padded(local), ctx.filter.radius(), geo.size_ext);
    if fp.is_empty() {
        return false;
    }

    let taps = conservative_tap_count(ctx.filter.radius());
    let eval = |x| ctx.filter.eval(x);
    let mut wx = axis_weights(taps, fp.rel[0], eval, |i| fp.covers(0, i));
    let wy = axis_weights(taps, fp.rel[1], eval, |i| fp.covers(1, i));

    if ctx.normalize {
        let factor = rcp_or_zero(total_weight(&wx, &wy));
        scale(&mut wx, factor);
    }

    gather_outer(buffer, geo, fp.first, &wx, &wy, out, |axis, i| {
        fp.covers(axis, i)
    });
    true
}

/// Trace lane gathering one sample; normalizes by the weight it actually applied.
pub(crate) struct GatherLane<'a> {
    ctx: FilterCtx<'a>,
    buffer: &'a AccumBuffer,
    out: &'a mut [f32],
    fp: Footprint,
    active: bool,
    ys: u32,
    weight_y: f32,
    row_active: bool,
    weight_sum: f32,
}

impl<'a> GatherLane<'a> {
    pub(crate) fn new(
        ctx: FilterCtx<'a>,
        buffer: &'a AccumBuffer,
        local: Point2f,
        out: &'a mut [f32],
        active: bool,
    ) -> Self {
        let fp = Footprint::exact(ctx.geo.padded(local), ctx.filter.radius(), ctx.geo.size_ext);
        Self {
            ctx,
            buffer,
            out,
            fp,
            active: active && !fp.is_empty(),
            ys: 0,
            weight_y: 0.0,
            row_active: false,
            weight_sum: 0.0,
        }
    }

    /// Apply normalization and return the sample's final active state.
    pub(crate) fn finish(self) -> bool {
        if self.ctx.normalize {
            scale(self.out, rcp_or_zero(self.weight_sum));
        }
        self.active
    }
}

impl TraceLane for GatherLane<'_> {
    fn row(&mut self, ys: u32) {
        self.ys = ys;
        self.weight_y = self.ctx.filter.eval(self.fp.rel[1] + ys as f32);
        self.row_active = self.active && self.fp.covers(1, ys);
    }

    fn col(&mut self, xs: u32) {
        if !(self.row_active && self.fp.covers(0, xs)) {
            return;
        }
        let weight = self.ctx.filter.eval(self.fp.rel[0] + xs as f32) * self.weight_y;
        let index = self.ctx.geo.index(
            self.fp.first[0] + xs as i32,
            self.fp.first[1] + self.ys as i32,
        );
        for (k, o) in self.out.iter_mut().enumerate() {
            *o += self.buffer.get(index + k) * weight;
        }
        self.weight_sum += weight;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/block/gather.rs"]
mod tests;
