use super::*;
use crate::storage::buffer::Exclusive;

fn geo(size_ext: [i32; 2], border: i32, channels: usize) -> Geometry {
    Geometry {
        offset: [0, 0],
        size: [size_ext[0] - 2 * border, size_ext[1] - 2 * border],
        size_ext,
        border,
        channels,
    }
}

#[test]
fn index_is_row_major_and_channel_interleaved() {
    let g = geo([4, 3], 0, 2);
    assert_eq!(g.index(0, 0), 0);
    assert_eq!(g.index(1, 2), 18);
}

#[test]
fn local_and_padded_shift_by_offset_and_border() {
    let mut g = geo([6, 6], 1, 1);
    g.offset = [10, 20];
    let local = g.local([11.5, 22.0]);
    assert_eq!(local, [1.5, 2.0]);
    assert_eq!(g.padded(local), [2.0, 2.5]);
    assert!(g.inside(local));
    assert!(!g.inside([4.0, 0.0]));
    assert!(!g.inside([-0.1, 0.0]));
}

#[test]
fn exact_footprint_covers_radius() {
    let fp = Footprint::exact([1.0, 1.0], 1.0, [3, 3]);
    assert_eq!(fp.first, [0, 0]);
    assert_eq!(fp.last, [2, 2]);
    assert_eq!(fp.rel, [-1.0, -1.0]);
    assert_eq!(fp.count(), [3, 3]);
    assert!(fp.covers(0, 2));
    assert!(!fp.covers(0, 3));
}

#[test]
fn exact_footprint_clips_at_buffer_edge() {
    let fp = Footprint::exact([-0.5, 0.5], 1.0, [3, 3]);
    assert!(!fp.is_empty());
    assert_eq!(fp.first, [0, 0]);
    assert_eq!(fp.last, [0, 1]);
    assert_eq!(fp.rel, [0.5, -0.5]);
    assert_eq!(fp.count(), [1, 2]);
}

#[test]
fn far_away_footprint_is_empty() {
    assert!(Footprint::exact([10.0, 1.0], 1.0, [3, 3]).is_empty());
    assert!(Footprint::exact([1.0, -10.0], 1.0, [3, 3]).is_empty());
    assert_eq!(Footprint::exact([10.0, 1.0], 1.0, [3, 3]).count()[0], 0);
}

#[test]
fn coalesced_footprint_snaps_to_sample_pixel() {
    let g = geo([4, 4], 1, 1);
    let fp = CoalescedFootprint::new(&g, [1.25, 2.75], 1.0);
    assert_eq!(fp.count, 3);
    assert_eq!(fp.origin, [1, 2]);
    assert!((fp.rel[0] - (-0.75)).abs() < 1e-6);
    assert!((fp.rel[1] - (-1.25)).abs() < 1e-6);
    assert!(fp.covers(1, 1));
    assert!(!fp.covers(1, 2));
}

#[test]
fn axis_weights_zero_rejected_taps() {
    let w = axis_weights(3, 0.0, |x| x + 10.0, |i| i < 2);
    assert_eq!(w.as_slice(), &[10.0, 11.0, 0.0]);
}

#[test]
fn total_weight_is_separable_product() {
    assert_eq!(total_weight(&[1.0, 2.0], &[3.0]), 9.0);
    let mut w = [1.0, 2.0];
    scale(&mut w, 0.5);
    assert_eq!(w, [0.5, 1.0]);
}

#[test]
fn outer_product_scatter_then_gather() {
    let g = geo([3, 3], 0, 1);
    let mut buffer = AccumBuffer::zeroed(9);
    scatter_outer(
        &mut Exclusive(&mut buffer),
        &g,
        [1, 1],
        &[1.0, 2.0],
        &[1.0, 1.0],
        &[1.0],
        |_, _| true,
    );
    assert_eq!(
        buffer.to_vec(),
        vec![0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 0.0, 1.0, 2.0]
    );

    let mut out = [0.0];
    gather_outer(&buffer, &g, [1, 1], &[1.0, 2.0], &[1.0, 1.0], &mut out, |_, _| true);
    assert_eq!(out, [10.0]);
}

#[test]
fn outer_product_skips_uncovered_rows() {
    let g = geo([3, 3], 0, 1);
    let mut buffer = AccumBuffer::zeroed(9);
    scatter_outer(
        &mut Exclusive(&mut buffer),
        &g,
        [0, 0],
        &[1.0],
        &[1.0, 1.0],
        &[4.0],
        |axis, i| axis == 0 || i == 1,
    );
    assert_eq!(buffer.get(0), 0.0);
    assert_eq!(buffer.get(3), 4.0);
}
