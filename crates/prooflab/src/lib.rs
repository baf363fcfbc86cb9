//! ProofLab: a stateless proof engine for interactive calculi
//!
//! A proof starts from a formula, is advanced one move at a time and can be
//! checked for closure. Every state leaves the engine as sealed JSON, so a
//! server can apply moves without keeping any session.

pub mod calculi;
pub mod calculus;
pub mod clause;
pub mod cnf;
pub mod config;
pub mod error;
pub mod logic;
pub mod misc;
pub mod parser;
pub mod seal;
pub mod tree;
pub mod unification;

pub use calculus::{apply_move, check_close, parse, Calculus, CalculusKind, CloseMessage};

pub use clause::{Atom, Clause, ClauseSet};

pub use config::{
    BacktrackingParams, ClauseSetParams, CnfConfig, CnfStrategy, FoTableauxParams, NoParams,
    TableauxParams, TableauxType,
};

pub use error::{LogicError, Result};

pub use logic::{Formula, Relation, Substitution, Term};

pub use seal::{ProtectedState, Sealed};

pub use tree::{ClosableNode, ProofTree, TreeNode};

pub use unification::{unify, UnificationError, UnificationResult};
