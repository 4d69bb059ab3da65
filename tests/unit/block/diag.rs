use super::*;

#[test]
fn negative_check_uses_tolerance() {
    assert!(!is_invalid(&[-1e-6, 1.0], true, false));
    assert!(is_invalid(&[-0.5, 1.0], true, false));
    assert!(!is_invalid(&[-0.5, 1.0], false, true));
}

#[test]
fn invalid_check_catches_nan_and_inf() {
    assert!(is_invalid(&[f32::NAN], false, true));
    assert!(is_invalid(&[1.0, f32::INFINITY], false, true));
    assert!(!is_invalid(&[f32::NAN], true, false));
    assert!(!is_invalid(&[f32::NAN], false, false));
}

#[test]
fn message_lists_every_channel() {
    assert_eq!(
        invalid_sample_message(&[1.0, -2.5, f32::NAN]),
        "invalid sample value: [1, -2.5, NaN]"
    );
}

#[test]
fn collecting_sink_keeps_order() {
    let sink = CollectingSink::new();
    sink.warn("a");
    sink.warn("b");
    assert_eq!(sink.messages(), vec!["a".to_string(), "b".to_string()]);
}
