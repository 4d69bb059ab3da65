//! Scatter kernels behind `ImageBlock::put`.

use super::footprint::{
    CoalescedFootprint, FilterCtx, Footprint, Geometry, axis_weights, scale, scatter_outer,
    total_weight,
};
use super::trace::TraceLane;
use crate::foundation::math::{Point2f, conservative_tap_count, floor2int, rcp_or_zero};
use crate::storage::buffer::ScatterTarget;

/// Box filter: add the values to the single pixel containing `pos`.
pub(crate) fn splat_box<T: ScatterTarget>(
    geo: &Geometry,
    target: &mut T,
    pos: Point2f,
    values: &[f32],
) {
    let local = geo.local(pos);
    if !geo.inside(local) {
        return;
    }
    let p = floor2int(local);
    // No border with a box filter, so interior and padded coordinates coincide.
    let index = geo.index(p[0], p[1]);
    for (k, &v) in values.iter().enumerate() {
        target.scatter_add(index + k, v);
    }
}

/// Exact footprint, discretized weights, one sample at a time.
pub(crate) fn splat_scalar<T: ScatterTarget>(
    ctx: &FilterCtx<'_>,
    target: &mut T,
    pos: Point2f,
    values: &[f32],
) {
    let geo = &ctx.geo;
    let fp = Footprint::exact(geo.padded(geo.local(pos)), ctx.filter.radius(), geo.size_ext);
    if fp.is_empty() {
        return;
    }

    let count = fp.count();
    let eval = |x| ctx.filter.eval_discretized(x);
    let mut wx = axis_weights(count[0], fp.rel[0], eval, |_| true);
    let wy = axis_weights(count[1], fp.rel[1], eval, |_| true);

    if ctx.normalize {
        let total = total_weight(&wx, &wy);
        if total == 0.0 {
            return;
        }
        scale(&mut wx, total.recip());
    }

    scatter_outer(target, geo, fp.first, &wx, &wy, values, |_, _| true);
}

/// Conservative `ceil(2r)` taps per axis with masking, continuous weights.
pub(crate) fn splat_unrolled<T: ScatterTarget>(
    ctx: &FilterCtx<'_>,
    target: &mut T,
    pos: Point2f,
    values: &[f32],
) {
    let geo = &ctx.geo;
    let fp = Footprint::exact(geo.padded(geo.local(pos)), ctx.filter.radius(), geo.size_ext);
    if fp.is_empty() {
        return;
    }

    let taps = conservative_tap_count(ctx.filter.radius());
    let eval = |x| ctx.filter.eval(x);
    let mut wx = axis_weights(taps, fp.rel[0], eval, |i| fp.covers(0, i));
    let wy = axis_weights(taps, fp.rel[1], eval, |i| fp.covers(1, i));

    if ctx.normalize {
        let factor = rcp_or_zero(total_weight(&wx, &wy));
        scale(&mut wx, factor);
    }

    scatter_outer(target, geo, fp.first, &wx, &wy, values, |axis, i| {
        fp.covers(axis, i)
    });
}

/// Fixed `2n + 1` footprint around the sample's pixel; taps outside the buffer are skipped.
pub(crate) fn splat_coalesced<T: ScatterTarget>(
    ctx: &FilterCtx<'_>,
    target: &mut T,
    pos: Point2f,
    values: &[f32],
) {
    let geo = &ctx.geo;
    let fp = CoalescedFootprint::new(geo, pos, ctx.filter.radius());
    let eval = |x| ctx.filter.eval(x);

    let (mut wx, wy) = if ctx.normalize {
        (
            axis_weights(fp.count, fp.rel[0], eval, |i| fp.covers(0, i)),
            axis_weights(fp.count, fp.rel[1], eval, |i| fp.covers(1, i)),
        )
    } else {
        (
            axis_weights(fp.count, fp.rel[0], eval, |_| true),
            axis_weights(fp.count, fp.rel[1], eval, |_| true),
        )
    };

    if ctx.normalize {
        let factor = rcp_or_zero(total_weight(&wx, &wy));
        scale(&mut wx, factor);
    }

    scatter_outer(target, geo, fp.origin, &wx, &wy, values, |axis, i| {
        fp.covers(axis, i)
    });
}

/// Trace lane scattering one sample over the exact footprint.
pub(crate) struct SplatLane<'a, T> {
    ctx: FilterCtx<'a>,
    target: T,
    values: &'a [f32],
    fp: Footprint,
    active: bool,
    ys: u32,
    weight_y: f32,
    row_active: bool,
}

impl<'a, T: ScatterTarget> SplatLane<'a, T> {
    pub(crate) fn new(
        ctx: FilterCtx<'a>,
        target: T,
        pos: Point2f,
        values: &'a [f32],
        active: bool,
    ) -> Self {
        let geo = &ctx.geo;
        let fp = Footprint::exact(geo.padded(geo.local(pos)), ctx.filter.radius(), geo.size_ext);
        Self {
            ctx,
            target,
            values,
            fp,
            active: active && !fp.is_empty(),
            ys: 0,
            weight_y: 0.0,
            row_active: false,
        }
    }
}

impl<T: ScatterTarget> TraceLane for SplatLane<'_, T> {
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
        for (k, &v) in self.values.iter().enumerate() {
            self.target.scatter_add(index + k, v * weight);
        }
    }
}

/// Trace lane scattering one sample over the coalesced footprint.
pub(crate) struct CoalescedLane<'a, T> {
    ctx: FilterCtx<'a>,
    target: T,
    values: &'a [f32],
    fp: CoalescedFootprint,
    active: bool,
    ys: u32,
    weight_y: f32,
    row_active: bool,
}

impl<'a, T: ScatterTarget> CoalescedLane<'a, T> {
    pub(crate) fn new(
        ctx: FilterCtx<'a>,
        target: T,
        pos: Point2f,
        values: &'a [f32],
        active: bool,
    ) -> Self {
        let fp = CoalescedFootprint::new(&ctx.geo, pos, ctx.filter.radius());
        Self {
            ctx,
            target,
            values,
            fp,
            active,
            ys: 0,
            weight_y: 0.0,
            row_active: false,
        }
    }
}

impl<T: ScatterTarget> TraceLane for CoalescedLane<'_, T> {
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
            self.fp.origin[0] + xs as i32,
            self.fp.origin[1] + self.ys as i32,
        );
        for (k, &v) in self.values.iter().enumerate() {
            self.target.scatter_add(index + k, v * weight);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/block/splat.rs"]
mod tests;
