//! Predicate trees: per-index range lists plus index-merge alternatives, and
//! the tree-level composition and lookup built on the interval graph.

mod compose;
mod merge;
mod tree;
mod validate;

#[cfg(test)]
mod tests;

pub use merge::IndexMergeAlternative;
pub use tree::{IndexSet, PredicateTree, TreeKind};
pub use validate::KeypartLookupError;
