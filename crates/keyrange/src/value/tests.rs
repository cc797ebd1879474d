use crate::value::{Datum, KeyBytes, Value};

#[test]
fn int_encoding_preserves_signed_order() {
    let values = [i64::MIN, -1_000, -1, 0, 1, 42, i64::MAX];

    for pair in values.windows(2) {
        let left = KeyBytes::encode(&Value::Int(pair[0]));
        let right = KeyBytes::encode(&Value::Int(pair[1]));
        assert!(left < right, "{} must encode below {}", pair[0], pair[1]);
    }
}

#[test]
fn text_encoding_is_prefix_safe() {
    let short = KeyBytes::encode(&Value::from("ab"));
    let long = KeyBytes::encode(&Value::from("abc"));
    let nul = KeyBytes::encode(&Value::Text("ab\0".to_string()));

    assert!(short < nul);
    assert!(nul < long);
}

#[test]
fn null_datum_sorts_below_every_key() {
    let null = Value::Null.to_datum();

    assert!(null.is_null());
    assert!(null < Datum::from(i64::MIN));
    assert!(null < Value::from("").to_datum());
}

#[test]
fn write_component_prefixes_null_marker() {
    let mut out = Vec::new();
    Datum::Null.write_component(&mut out);
    Datum::from(7).write_component(&mut out);

    assert_eq!(out[0], crate::value::NULL_MARKER);
    assert_eq!(out[1], crate::value::VALUE_MARKER);
    assert_eq!(out.len(), 2 + 1 + 8);
}
