use std::sync::Arc;

use super::*;
use crate::block::opts::{BlockOpts, ExecCaps};
use crate::filter::TentFilter;

fn tent(radius: f32) -> Option<Arc<dyn ReconstructionFilter>> {
    Some(Arc::new(TentFilter::new(radius)))
}

fn block(size: u32, opts: BlockOpts) -> ImageBlock {
    ImageBlock::new(BlockSize::new(size, size), 1, tent(1.0), opts).unwrap()
}

fn samples() -> SampleBatch {
    let mut batch = SampleBatch::new(1);
    for (i, (x, y)) in [(0.3, 0.4), (1.5, 2.25), (3.9, 3.1), (-0.7, 2.0), (2.2, 9.0)]
        .into_iter()
        .enumerate()
    {
        batch.push(Point::new(x, y), &[1.0 + i as f32], true).unwrap();
    }
    batch.push(Point::new(1.0, 1.0), &[100.0], false).unwrap();
    batch
}

#[test]
fn trip_count_depends_on_radius_only() {
    assert_eq!(TraceKind::Splat.trip_count(1.0), 2);
    assert_eq!(TraceKind::Splat.trip_count(1.5), 3);
    assert_eq!(TraceKind::Gather.trip_count(2.0), 4);
    assert_eq!(TraceKind::CoalescedSplat.trip_count(1.0), 3);
    assert_eq!(TraceKind::CoalescedSplat.trip_count(2.0), 5);
}

#[test]
fn recorded_trace_has_row_and_col_ops() {
    let b = block(4, BlockOpts::default());
    let trace = b.record_trace(TraceKind::Splat).unwrap();
    assert_eq!(trace.kind(), TraceKind::Splat);
    assert_eq!(trace.trip_count(), 2);
    assert_eq!(trace.op_count(), 6);
}

#[test]
fn cached_trace_is_reused() {
    let b = block(4, BlockOpts::default());
    let first = b.trace(TraceKind::Gather).unwrap();
    let second = b.trace(TraceKind::Gather).unwrap();
    assert!(std::ptr::eq(first, second));
}

#[test]
fn resize_drops_cached_traces() {
    let mut b = block(4, BlockOpts::default());
    let before = b.trace(TraceKind::Splat).unwrap().key();
    b.resize(BlockSize::new(6, 6));
    let after = b.trace(TraceKind::Splat).unwrap().key();
    assert_ne!(before, after);
    assert_eq!(after.size_ext, BlockSize::new(8, 8));
}

#[test]
fn box_blocks_have_no_trace() {
    let b = ImageBlock::new(BlockSize::new(4, 4), 1, None, BlockOpts::default()).unwrap();
    assert!(matches!(b.trace(TraceKind::Splat), Err(FilmError::Trace(_))));
}

#[test]
fn replay_matches_vectorized_put() {
    let batch = samples();
    let trace = block(4, BlockOpts::default())
        .record_trace(TraceKind::Splat)
        .unwrap();

    let mut traced = block(4, BlockOpts::default());
    traced.put_traced(&trace, &batch).unwrap();
    traced.put_traced(&trace, &batch).unwrap();

    let mut vectorized = block(4, BlockOpts::default());
    vectorized.put_batch(&batch, ExecCaps::VECTORIZED).unwrap();
    vectorized.put_batch(&batch, ExecCaps::VECTORIZED).unwrap();

    let a = traced.to_tensor();
    let b = vectorized.to_tensor();
    for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
        assert!((x - y).abs() < 1e-5);
    }
    assert!(traced.total() > 0.0);
}

#[test]
fn stale_trace_is_rejected() {
    let trace = block(4, BlockOpts::default())
        .record_trace(TraceKind::Splat)
        .unwrap();
    let mut other = block(5, BlockOpts::default());
    let err = other.put_traced(&trace, &samples()).unwrap_err();
    assert!(matches!(err, FilmError::Trace(_)));
    assert_eq!(other.total(), 0.0);
}

#[test]
fn trace_kind_must_match_operation() {
    let mut b = block(4, BlockOpts::default());
    let gather = b.record_trace(TraceKind::Gather).unwrap();
    let splat = b.record_trace(TraceKind::Splat).unwrap();
    assert!(matches!(
        b.put_traced(&gather, &samples()),
        Err(FilmError::Trace(_))
    ));
    assert!(matches!(
        b.read_traced(&splat, &[Point::new(1.0, 1.0)], &[true]),
        Err(FilmError::Trace(_))
    ));
}

#[test]
fn normalized_splat_cannot_be_replayed() {
    let opts = BlockOpts {
        normalize: true,
        ..BlockOpts::default()
    };
    let mut b = block(4, opts);
    let trace = b.record_trace(TraceKind::Splat).unwrap();
    assert!(matches!(
        b.put_traced(&trace, &samples()),
        Err(FilmError::Trace(_))
    ));
}

#[test]
fn traced_read_matches_scalar_read() {
    let mut b = block(4, BlockOpts::default());
    b.put_batch(&samples(), ExecCaps::SCALAR).unwrap();
    let trace = b.trace(TraceKind::Gather).unwrap();

    let positions = [Point::new(1.2, 0.8), Point::new(3.5, 3.5), Point::new(4.5, 1.0)];
    let out = b.read_traced(trace, &positions, &[true, true, true]).unwrap();
    for (i, &pos) in positions.iter().enumerate() {
        let mut expected = [0.0];
        let active = b.read(pos, &mut expected, true);
        assert_eq!(out.is_active(i), active);
        assert!((out.values(i)[0] - expected[0]).abs() < 1e-5);
    }
    assert!(!out.is_active(2));
}
