use crate::value::Value;

/// Composite-key marker preceding a NULL keypart.
pub const NULL_MARKER: u8 = 0x00;

/// Composite-key marker preceding a non-null keypart.
pub const VALUE_MARKER: u8 = 0x01;

/// Encode one component so lexicographic byte order matches `Value` order.
pub(super) fn encode_component(out: &mut Vec<u8>, value: &Value) {
    out.push(value.canonical_tag());

    match value {
        Value::Null => {}
        Value::Bool(v) => out.push(u8::from(*v)),
        Value::Int(v) => out.extend_from_slice(&ordered_i64_bytes(*v)),
        Value::Uint(v) => out.extend_from_slice(&v.to_be_bytes()),
        Value::Text(v) => push_terminated_bytes(out, v.as_bytes()),
        Value::Bytes(v) => push_terminated_bytes(out, v),
    }
}

// Byte strings are escaped so tuple boundaries remain unambiguous.
fn push_terminated_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    for &byte in bytes {
        if byte == 0 {
            out.extend_from_slice(&[0, 0xFF]);
        } else {
            out.push(byte);
        }
    }

    out.extend_from_slice(&[0, 0]);
}

/// Bit-invert a component segment so a descending keypart sorts in reverse.
pub(crate) fn push_inverted(out: &mut Vec<u8>, bytes: &[u8]) {
    for &byte in bytes {
        out.push(!byte);
    }
}

const fn ordered_i64_bytes(value: i64) -> [u8; 8] {
    let biased = value.cast_unsigned() ^ (1u64 << 63);
    biased.to_be_bytes()
}
