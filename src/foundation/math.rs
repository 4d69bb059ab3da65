pub(crate) type Point2f = [f32; 2];
pub(crate) type Point2i = [i32; 2];

pub(crate) fn floor2int(p: Point2f) -> Point2i {
    [p[0].floor() as i32, p[1].floor() as i32]
}

pub(crate) fn ceil2int(p: Point2f) -> Point2i {
    [p[0].ceil() as i32, p[1].ceil() as i32]
}

/// `1 / x`, or `0` when `x == 0`.
pub(crate) fn rcp_or_zero(x: f32) -> f32 {
    if x != 0.0 { x.recip() } else { 0.0 }
}

/// Number of filter taps a uniform loop must visit per axis to cover `[-radius, radius]`.
pub(crate) fn conservative_tap_count(radius: f32) -> u32 {
    (2.0 * radius).ceil() as u32
}

/// Half-width `n` of the fixed `2n + 1` coalesced footprint.
pub(crate) fn coalesced_half_width(radius: f32) -> u32 {
    (radius - 0.5).ceil().max(0.0) as u32
}

pub(crate) fn point_to_f32(p: kurbo::Point) -> Point2f {
    [p.x as f32, p.y as f32]
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
