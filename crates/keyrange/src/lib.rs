//! Interval-graph core of a range optimizer: shared, reference-counted
//! per-keypart interval lists, their AND/OR composition, and the predicate
//! trees (with index-merge fallback) built on top of them.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod error;
pub mod graph;
pub mod leaf;
pub mod model;
pub mod obs;
pub mod plan;
pub mod predicate;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// CONSTANTS
///

/// Maximum number of candidate indexes one predicate tree can address.
///
/// Slot presence is tracked in a single `u64` bitmap.
pub const MAX_CANDIDATE_INDEXES: usize = 64;

/// Maximum number of keyparts in one candidate index.
pub const MAX_KEYPARTS: usize = 32;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, sinks, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        config::RangeConfig,
        graph::{IntervalId, ListId, RangeContext},
        leaf::{BetweenArg, CompareOp, Operand},
        model::{Direction, FieldId, IndexCatalog, IndexModel, KeyPart},
        plan::{IndexMergeAlternative, PredicateTree, TreeKind},
        predicate::Predicate,
        value::{Datum, Value},
    };
}
