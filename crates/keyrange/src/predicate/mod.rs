//! Boolean predicate AST and the walker that compiles it into a
//! `PredicateTree` against one candidate-index catalog.

mod ast;
mod walker;

#[cfg(test)]
mod tests;

pub use ast::{ComparePredicate, Predicate};
pub use walker::PredicateWalker;
