use crate::block::diag::CollectingSink;
use crate::filter::{BoxFilter, GaussianFilter, TentFilter};

use super::*;

fn tent() -> Option<Arc<dyn ReconstructionFilter>> {
    Some(Arc::new(TentFilter::new(1.0)))
}

#[test]
fn zero_channels_is_a_configuration_error() {
    let err = ImageBlock::new(BlockSize::new(2, 2), 0, None, BlockOpts::default()).unwrap_err();
    assert!(matches!(err, FilmError::Configuration(_)));
}

#[test]
fn box_filter_is_discarded() {
    let b = ImageBlock::new(
        BlockSize::new(4, 4),
        1,
        Some(Arc::new(BoxFilter)),
        BlockOpts::default(),
    )
    .unwrap();
    assert!(b.filter().is_none());
    assert_eq!(b.border_size(), 0);
}

#[test]
fn border_follows_filter_and_opts() {
    let size = BlockSize::new(3, 2);
    let b = ImageBlock::new(size, 3, tent(), BlockOpts::default()).unwrap();
    assert_eq!(b.border_size(), 1);
    assert_eq!(b.to_tensor().shape(), &[4, 5, 3]);

    let g = ImageBlock::new(
        size,
        1,
        Some(Arc::new(GaussianFilter::default())),
        BlockOpts::default(),
    )
    .unwrap();
    assert_eq!(g.border_size(), 2);

    let opts = BlockOpts {
        border: false,
        ..BlockOpts::default()
    };
    let flat = ImageBlock::new(size, 1, tent(), opts).unwrap();
    assert_eq!(flat.border_size(), 0);
    assert!(flat.filter().is_some());
}

#[test]
fn from_tensor_validates_shape() {
    let rank2 = TensorXf::zeros(&[4, 4]);
    assert!(matches!(
        ImageBlock::from_tensor(&rank2, None, BlockOpts::default()),
        Err(FilmError::Configuration(_))
    ));

    let tiny = TensorXf::zeros(&[1, 4, 1]);
    let err = ImageBlock::from_tensor(&tiny, tent(), BlockOpts::default()).unwrap_err();
    assert!(err.to_string().contains("too small"), "{err}");
}

#[test]
fn from_tensor_strips_border_from_size() {
    let data: Vec<f32> = (0..5 * 6 * 2).map(|i| i as f32).collect();
    let tensor = TensorXf::new(&[5, 6, 2], data).unwrap();
    let b = ImageBlock::from_tensor(&tensor, tent(), BlockOpts::default()).unwrap();
    assert_eq!(b.size(), BlockSize::new(4, 3));
    assert_eq!(b.channel_count(), 2);
    assert_eq!(b.to_tensor(), tensor);
}

#[test]
fn resize_to_same_size_keeps_contents() {
    let mut b = ImageBlock::new(BlockSize::new(4, 4), 1, None, BlockOpts::default()).unwrap();
    b.put(Point::new(1.5, 1.5), &[2.0], true);
    b.resize(BlockSize::new(4, 4));
    assert_eq!(b.total(), 2.0);

    b.resize(BlockSize::new(5, 3));
    assert_eq!(b.total(), 0.0);
    assert_eq!(b.to_tensor().shape(), &[3, 5, 1]);
}

#[test]
fn clear_zeroes_border_too() {
    let mut b = ImageBlock::new(BlockSize::new(2, 2), 1, tent(), BlockOpts::default()).unwrap();
    b.put(Point::new(0.1, 0.1), &[4.0], true);
    assert!(b.total() > 0.0);
    b.clear();
    assert_eq!(b.total(), 0.0);
    assert_eq!(b.to_tensor().shape(), &[4, 4, 1]);
}

#[test]
fn offset_moves_the_footprint() {
    let mut b = ImageBlock::new(BlockSize::new(4, 4), 1, None, BlockOpts::default()).unwrap();
    b.set_offset(PixelOffset::new(10, 20));
    b.put(Point::new(11.5, 21.5), &[2.0], true);
    b.put(Point::new(1.5, 1.5), &[5.0], true);

    let mut out = [0.0];
    assert!(b.read(Point::new(11.2, 21.9), &mut out, true));
    assert_eq!(out, [2.0]);
    assert_eq!(b.total(), 2.0);
}

#[test]
fn inactive_and_non_finite_samples_are_ignored() {
    let mut b = ImageBlock::new(BlockSize::new(3, 3), 1, tent(), BlockOpts::default()).unwrap();
    b.put(Point::new(1.5, 1.5), &[1.0], false);
    b.put(Point::new(f64::NAN, 1.5), &[1.0], true);
    b.put(Point::new(1.5, f64::INFINITY), &[1.0], true);
    assert_eq!(b.total(), 0.0);
}

#[test]
fn read_outside_interior_is_inactive() {
    let mut b = ImageBlock::new(BlockSize::new(3, 3), 1, tent(), BlockOpts::default()).unwrap();
    b.put(Point::new(1.5, 1.5), &[1.0], true);
    let mut out = [9.0];
    assert!(!b.read(Point::new(3.0, 1.0), &mut out, true));
    assert_eq!(out, [0.0]);
    out[0] = 9.0;
    assert!(!b.read(Point::new(1.5, 1.5), &mut out, false));
    assert_eq!(out, [0.0]);
    assert!(b.read(Point::new(1.5, 1.5), &mut out, true));
    assert_eq!(out, [1.0]);
}

#[test]
fn box_read_at_nan_is_inactive() {
    let mut b = ImageBlock::new(BlockSize::new(4, 4), 1, None, BlockOpts::default()).unwrap();
    b.put(Point::new(0.5, 0.5), &[7.0], true);
    let mut out = [9.0];
    assert!(!b.read(Point::new(f64::NAN, f64::NAN), &mut out, true));
    assert_eq!(out, [0.0]);
    assert!(b.read(Point::new(0.5, 0.5), &mut out, true));
    assert_eq!(out, [7.0]);
}

#[test]
#[should_panic(expected = "one value per channel")]
fn put_checks_value_count() {
    let mut b = ImageBlock::new(BlockSize::new(2, 2), 3, None, BlockOpts::default()).unwrap();
    b.put(Point::new(0.5, 0.5), &[1.0], true);
}

#[test]
fn invalid_values_are_reported_but_accumulated() {
    let sink = Arc::new(CollectingSink::new());
    let opts = BlockOpts {
        warn_negative: true,
        warn_invalid: true,
        ..BlockOpts::default()
    };
    let mut b = ImageBlock::new(BlockSize::new(4, 4), 2, None, opts)
        .unwrap()
        .with_sink(sink.clone());

    b.put(Point::new(0.5, 0.5), &[1.0, -2.5], true);
    b.put(Point::new(1.5, 0.5), &[f32::NAN, 1.0], false);
    b.put(Point::new(2.5, 0.5), &[-1e-6, 1.0], true);
    assert_eq!(sink.messages(), vec!["invalid sample value: [1, -2.5]".to_string()]);
    assert!((b.total() - (-0.5 - 1e-6)).abs() < 1e-9);

    b.set_warn_negative(false);
    assert!(!b.warn_negative());
    b.put(Point::new(3.5, 0.5), &[-4.0, 0.0], true);
    assert_eq!(sink.messages().len(), 1);
}

#[test]
fn display_lists_configuration() {
    let b = ImageBlock::new(BlockSize::new(4, 2), 3, tent(), BlockOpts::default()).unwrap();
    let text = b.to_string();
    assert!(text.starts_with("ImageBlock["));
    assert!(text.contains("size = [4, 2]"));
    assert!(text.contains("border_size = 1"));
    assert!(text.contains("channel_count = 3"));
    assert!(text.contains("rfilter = TentFilter"));
    assert!(text.ends_with(']'));
}
