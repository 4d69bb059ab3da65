use image::{Rgb, Rgb32FImage};

use super::*;

#[test]
fn rgb_image_becomes_hwc_tensor() {
    let mut img = Rgb32FImage::new(3, 2);
    img.put_pixel(2, 1, Rgb([0.25, 0.5, 0.75]));

    let t = TensorXf::from_rgb32f(&img);
    assert_eq!(t.shape(), &[2, 3, 3]);
    let (row, col, width) = (1, 2, 3);
    let idx = (row * width + col) * 3;
    assert_eq!(&t.as_slice()[idx..idx + 3], &[0.25, 0.5, 0.75]);
}

#[test]
fn gray_tensor_expands_to_opaque_rgba() {
    let t = TensorXf::new(&[1, 2, 1], vec![0.2, 0.4]).unwrap();
    let img = t.to_rgba32f().unwrap();
    assert_eq!(img.dimensions(), (2, 1));
    assert_eq!(img.get_pixel(1, 0).0, [0.4, 0.4, 0.4, 1.0]);
}

#[test]
fn unsupported_layouts_are_rejected() {
    let t = TensorXf::zeros(&[2, 2]);
    assert!(t.to_rgba32f().is_err());

    let t = TensorXf::zeros(&[1, 1, 2]);
    let err = t.to_rgba32f().unwrap_err();
    assert!(err.to_string().contains("1, 3 or 4 channels"));
}
