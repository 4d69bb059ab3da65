use super::*;

#[test]
fn default_opts_pad_but_do_not_normalize() {
    let o = BlockOpts::default();
    assert!(o.border);
    assert!(!o.normalize);
    assert!(!o.coalesce);
    assert!(!o.warn_negative);
    assert!(!o.warn_invalid);
}

#[test]
fn opts_deserialize_with_missing_fields() {
    let o: BlockOpts =
        serde_json::from_str(r#"{"normalize": true, "warn_invalid": true}"#).unwrap();
    assert!(o.border);
    assert!(o.normalize);
    assert!(o.warn_invalid);
    assert!(!o.coalesce);
}

#[test]
fn strategy_follows_caps() {
    assert_eq!(ExecStrategy::select(ExecCaps::SCALAR), ExecStrategy::Scalar);
    assert_eq!(ExecStrategy::select(ExecCaps::VECTORIZED), ExecStrategy::Vectorized);
    assert_eq!(ExecStrategy::select(ExecCaps::TRACED), ExecStrategy::Traced);
    assert_eq!(
        ExecStrategy::select(ExecCaps {
            concurrent_scatter: false,
            trace_replay: true,
        }),
        ExecStrategy::Traced
    );
}

#[test]
fn caps_roundtrip_through_json() {
    let caps: ExecCaps = serde_json::from_str(r#"{"concurrent_scatter": true}"#).unwrap();
    assert_eq!(caps, ExecCaps::VECTORIZED);
    assert_eq!(
        serde_json::to_string(&ExecStrategy::Vectorized).unwrap(),
        "\"vectorized\""
    );
}
