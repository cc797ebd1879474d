//! Candidate-index vocabulary: fields, keyparts, indexes and the catalog the
//! range context addresses by slot number.

mod index;

pub use index::{CatalogError, IndexCatalog, IndexModel, KeyPart};

use std::fmt;

///
/// FieldId
///
/// Weak, copyable reference to the column a keypart constrains.
/// The core never dereferences it; it is carried for downstream planners.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct FieldId(pub u32);

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

///
/// Direction
///
/// Keypart sort direction. Interval bounds are always stored in ascending
/// value order; only key materialization observes `Desc`.
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    #[must_use]
    pub const fn is_desc(self) -> bool {
        matches!(self, Self::Desc)
    }
}
