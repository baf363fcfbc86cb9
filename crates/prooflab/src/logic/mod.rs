//! Logic data structures
//!
//! Terms, relations, formulas, substitutions and the transformation passes
//! working on them.

pub mod formula;
pub mod substitution;
pub mod term;
mod transform;

pub use formula::Formula;
pub use substitution::Substitution;
pub use term::{Relation, Term};
