use super::*;

#[test]
fn new_checks_element_count() {
    let t = TensorXf::new(&[2, 3, 1], vec![0.0; 6]).unwrap();
    assert_eq!(t.ndim(), 3);
    assert_eq!(t.shape(), &[2, 3, 1]);

    let err = TensorXf::new(&[2, 3, 1], vec![0.0; 5]).unwrap_err();
    assert!(err.to_string().contains("expects 6 elements"));
}

#[test]
fn zeros_allocates_full_shape() {
    let t = TensorXf::zeros(&[4, 5, 3]);
    assert_eq!(t.as_slice().len(), 60);
    assert!(t.as_slice().iter().all(|&v| v == 0.0));
}

#[test]
fn into_vec_returns_row_major_data() {
    let t = TensorXf::new(&[1, 2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    assert_eq!(t.into_vec(), vec![1.0, 2.0, 3.0, 4.0]);
}
