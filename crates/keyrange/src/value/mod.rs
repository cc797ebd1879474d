//! Bound values: logical literals, their order-preserving key encoding, and the
//! `Datum` stored on interval endpoints.

mod ordered;

#[cfg(test)]
mod tests;

use derive_more::Deref;
use std::fmt;

pub(crate) use ordered::push_inverted;
pub use ordered::{NULL_MARKER, VALUE_MARKER};

///
/// Value
///
/// Logical literal handed to the leaf builder.
/// Every value of one keypart is expected to share a variant; cross-variant
/// order follows the canonical tag order below.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Value {
    /// Lower a literal into the datum stored on an interval endpoint.
    #[must_use]
    pub fn to_datum(&self) -> Datum {
        match self {
            Self::Null => Datum::Null,
            other => Datum::Key(KeyBytes::encode(other)),
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub(crate) const fn canonical_tag(&self) -> u8 {
        match self {
            Self::Null => 0x00,
            Self::Bool(_) => 0x10,
            Self::Int(_) => 0x20,
            Self::Uint(_) => 0x21,
            Self::Text(_) => 0x30,
            Self::Bytes(_) => 0x31,
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

///
/// KeyBytes
///
/// Canonical, self-delimiting component bytes for one non-null keypart value.
/// Lexicographic byte order equals logical value order.
///

#[derive(Clone, Deref, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct KeyBytes(Vec<u8>);

impl KeyBytes {
    /// Encode one non-null value.
    ///
    /// `Value::Null` encodes as the bare tag; callers wanting NULL-as-value
    /// semantics go through [`Value::to_datum`] instead.
    #[must_use]
    pub fn encode(value: &Value) -> Self {
        let mut out = Vec::new();
        ordered::encode_component(&mut out, value);

        Self(out)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for KeyBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }

        Ok(())
    }
}

///
/// Datum
///
/// Endpoint value of an interval bound.
/// `Null` sorts below every key value, matching SQL index order.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Datum {
    Null,
    Key(KeyBytes),
}

impl Datum {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Append this datum as one composite-key component.
    pub(crate) fn write_component(&self, out: &mut Vec<u8>) {
        match self {
            Self::Null => out.push(NULL_MARKER),
            Self::Key(bytes) => {
                out.push(VALUE_MARKER);
                out.extend_from_slice(bytes);
            }
        }
    }
}

impl From<Value> for Datum {
    fn from(value: Value) -> Self {
        value.to_datum()
    }
}

impl From<i64> for Datum {
    fn from(value: i64) -> Self {
        Value::Int(value).to_datum()
    }
}
