use smallvec::SmallVec;

use crate::filter::ReconstructionFilter;
use crate::foundation::math::{Point2f, Point2i, ceil2int, coalesced_half_width, floor2int};
use crate::storage::buffer::{AccumBuffer, ScatterTarget};

/// Per-axis filter weights. Inline capacity covers radii up to 4 pixels.
pub(crate) type Weights = SmallVec<[f32; 8]>;

/// Block layout as seen by the splat and gather kernels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Geometry {
    pub(crate) offset: Point2i,
    pub(crate) size: Point2i,
    pub(crate) size_ext: Point2i,
    pub(crate) border: i32,
    pub(crate) channels: usize,
}

impl Geometry {
    /// Flat index of the first channel of padded-buffer pixel `(x, y)`.
    pub(crate) fn index(&self, x: i32, y: i32) -> usize {
        debug_assert!(x >= 0 && x < self.size_ext[0] && y >= 0 && y < self.size_ext[1]);
        ((y as usize) * (self.size_ext[0] as usize) + x as usize) * self.channels
    }

    /// Parent-image position relative to the block's interior origin.
    pub(crate) fn local(&self, pos: Point2f) -> Point2f {
        [pos[0] - self.offset[0] as f32, pos[1] - self.offset[1] as f32]
    }

    /// Local position in padded-buffer space, shifted so integers fall on pixel centers.
    pub(crate) fn padded(&self, local: Point2f) -> Point2f {
        let shift = self.border as f32 - 0.5;
        [local[0] + shift, local[1] + shift]
    }

    /// `true` when a local position lies inside the interior `[0, size)`.
    pub(crate) fn inside(&self, local: Point2f) -> bool {
        local[0] >= 0.0
            && local[1] >= 0.0
            && local[0] < self.size[0] as f32
            && local[1] < self.size[1] as f32
    }
}

/// Exact pixel interval covered by `position ± radius`, clipped to the padded buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Footprint {
    /// First covered pixel per axis (inclusive).
    pub(crate) first: Point2i,
    /// Last covered pixel per axis (inclusive); `last < first` means empty.
    pub(crate) last: Point2i,
    /// Offset from the sample to the center of `first`.
    pub(crate) rel: Point2f,
}

impl Footprint {
    pub(crate) fn exact(padded: Point2f, radius: f32, size_ext: Point2i) -> Self {
        let lo = ceil2int([padded[0] - radius, padded[1] - radius]);
        let hi = floor2int([padded[0] + radius, padded[1] + radius]);
        let first = [lo[0].max(0), lo[1].max(0)];
        let last = [hi[0].min(size_ext[0] - 1), hi[1].min(size_ext[1] - 1)];
        Self {
            first,
            last,
            rel: [first[0] as f32 - padded[0], first[1] as f32 - padded[1]],
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.first[0] > self.last[0] || self.first[1] > self.last[1]
    }

    /// Exact tap count per axis.
    pub(crate) fn count(&self) -> [u32; 2] {
        [
            (self.last[0] - self.first[0] + 1).max(0) as u32,
            (self.last[1] - self.first[1] + 1).max(0) as u32,
        ]
    }

    /// Whether tap `i` along `axis` lies inside the clipped interval.
    pub(crate) fn covers(&self, axis: usize, i: u32) -> bool {
        self.first[axis] + i as i32 <= self.last[axis]
    }
}

/// Fixed `2n + 1` footprint snapped to the pixel containing the sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct CoalescedFootprint {
    /// Top-left tap in padded-buffer pixels; may lie outside the buffer.
    pub(crate) origin: Point2i,
    pub(crate) rel: Point2f,
    pub(crate) count: u32,
    size_ext: Point2i,
}

impl CoalescedFootprint {
    pub(crate) fn new(geo: &Geometry, pos: Point2f, radius: f32) -> Self {
        let n = i64::from(coalesced_half_width(radius));
        let count = 2 * n + 1;
        let snapped = floor2int(pos);
        let anchor = [i64::from(snapped[0]) - n, i64::from(snapped[1]) - n];
        // Origins far outside the buffer are pinned just outside it: no tap is covered either way.
        let origin = |axis: usize| {
            let o = anchor[axis] + i64::from(geo.border) - i64::from(geo.offset[axis]);
            o.clamp(-count, i64::from(geo.size_ext[axis])) as i32
        };
        Self {
            origin: [origin(0), origin(1)],
            rel: [
                anchor[0] as f32 + 0.5 - pos[0],
                anchor[1] as f32 + 0.5 - pos[1],
            ],
            count: count as u32,
            size_ext: geo.size_ext,
        }
    }

    /// Whether tap `i` along `axis` lands inside `[0, size_ext)`.
    pub(crate) fn covers(&self, axis: usize, i: u32) -> bool {
        let p = self.origin[axis] + i as i32;
        p >= 0 && p < self.size_ext[axis]
    }
}

/// Shared inputs of every filtered kernel.
#[derive(Clone, Copy)]
pub(crate) struct FilterCtx<'a> {
    pub(crate) geo: Geometry,
    pub(crate) filter: &'a dyn ReconstructionFilter,
    pub(crate) normalize: bool,
}

/// Evaluate `count` taps starting at `rel`, zeroing the taps `keep` rejects.
pub(crate) fn axis_weights(
    count: u32,
    rel: f32,
    eval: impl Fn(f32) -> f32,
    keep: impl Fn(u32) -> bool,
) -> Weights {
    (0..count)
        .map(|i| if keep(i) { eval(rel + i as f32) } else { 0.0 })
        .collect()
}

/// Total 2D weight of a separable footprint.
pub(crate) fn total_weight(wx: &[f32], wy: &[f32]) -> f32 {
    wx.iter().sum::<f32>() * wy.iter().sum::<f32>()
}

pub(crate) fn scale(weights: &mut [f32], factor: f32) {
    for w in weights {
        *w *= factor;
    }
}

/// Add the outer product `wx * wy * values` at every covered tap, row-major.
pub(crate) fn scatter_outer<T: ScatterTarget>(
    target: &mut T,
    geo: &Geometry,
    origin: Point2i,
    wx: &[f32],
    wy: &[f32],
    values: &[f32],
    covers: impl Fn(usize, u32) -> bool,
) {
    for (ys, &weight_y) in wy.iter().enumerate() {
        if !covers(1, ys as u32) {
            continue;
        }
        for (xs, &weight_x) in wx.iter().enumerate() {
            if !covers(0, xs as u32) {
                continue;
            }
            let weight = weight_x * weight_y;
            let index = geo.index(origin[0] + xs as i32, origin[1] + ys as i32);
            for (k, &v) in values.iter().enumerate() {
                target.scatter_add(index + k, v * weight);
            }
        }
    }
}

/// Weighted sum of the covered taps into `out`, row-major.
pub(crate) fn gather_outer(
    buffer: &AccumBuffer,
    geo: &Geometry,
    origin: Point2i,
    wx: &[f32],
    wy: &[f32],
    out: &mut [f32],
    covers: impl Fn(usize, u32) -> bool,
) {
    for (ys, &weight_y) in wy.iter().enumerate() {
        if !covers(1, ys as u32) {
            continue;
        }
        for (xs, &weight_x) in wx.iter().enumerate() {
            if !covers(0, xs as u32) {
                continue;
            }
            let weight = weight_x * weight_y;
            let index = geo.index(origin[0] + xs as i32, origin[1] + ys as i32);
            for (k, o) in out.iter_mut().enumerate() {
                *o += buffer.get(index + k) * weight;
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/block/footprint.rs"]
mod tests;
