//! Engine configuration types.
//!
//! Nothing here is global: every entry point receives its parameters
//! explicitly, deserialized from the request.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of clauses a single disjunction may expand to during
/// naive CNF conversion.
pub const CNF_BLOWUP_LIMIT: usize = 10_000;

/// Strategy used to bring a propositional formula into clause form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CnfStrategy {
    /// Negation normal form followed by distribution; equivalent output
    Naive,
    /// One definition variable per sub-formula; equisatisfiable output
    Tseytin,
    /// Whichever of the two yields fewer clauses, ties go to `Naive`
    #[default]
    Optimal,
}

impl fmt::Display for CnfStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CnfStrategy::Naive => write!(f, "NAIVE"),
            CnfStrategy::Tseytin => write!(f, "TSEYTIN"),
            CnfStrategy::Optimal => write!(f, "OPTIMAL"),
        }
    }
}

/// Configuration for clause normal form conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CnfConfig {
    pub strategy: CnfStrategy,
    /// Clause-count ceiling for a single distribution step
    pub blowup_limit: usize,
}

impl Default for CnfConfig {
    fn default() -> Self {
        CnfConfig {
            strategy: CnfStrategy::default(),
            blowup_limit: CNF_BLOWUP_LIMIT,
        }
    }
}

impl CnfConfig {
    pub fn with_strategy(strategy: CnfStrategy) -> Self {
        CnfConfig {
            strategy,
            ..CnfConfig::default()
        }
    }
}

/// Connectedness restriction for clause tableaux
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TableauxType {
    #[default]
    Unconnected,
    WeaklyConnected,
    StronglyConnected,
}

impl TableauxType {
    pub fn is_connected(&self) -> bool {
        !matches!(self, TableauxType::Unconnected)
    }
}

impl fmt::Display for TableauxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableauxType::Unconnected => write!(f, "UNCONNECTED"),
            TableauxType::WeaklyConnected => write!(f, "WEAKLYCONNECTED"),
            TableauxType::StronglyConnected => write!(f, "STRONGLYCONNECTED"),
        }
    }
}

/// Parameters of the propositional clause tableaux
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableauxParams {
    #[serde(rename = "type")]
    pub tableaux_type: TableauxType,
    pub regular: bool,
    pub backtracking: bool,
    pub cnf_strategy: CnfStrategy,
}

/// Parameters of the first-order clause tableaux
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FoTableauxParams {
    #[serde(rename = "type")]
    pub tableaux_type: TableauxType,
    pub regular: bool,
    pub backtracking: bool,
    /// Forbid automatic unification on close moves
    pub manual_var_assign_only: bool,
}

/// Parameters of the calculi working on a propositional clause set
/// (resolution and DPLL)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClauseSetParams {
    pub cnf_strategy: CnfStrategy,
}

/// Parameters shared by the calculi that only support backtracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BacktrackingParams {
    pub backtracking: bool,
}

/// For calculi without any options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NoParams {}
