//! Propositional resolution
//!
//! The state is a growing clause set; the proof is finished once the empty
//! clause has been derived.

use crate::calculus::{Calculus, CloseMessage};
use crate::clause::{Atom, Clause, ClauseSet};
use crate::config::{ClauseSetParams, CnfConfig};
use crate::error::{LogicError, Result};
use crate::misc::log::targets;
use crate::parser::parse_flexible;
use crate::seal::{encode_opt, ProtectedState};
use serde::{Deserialize, Serialize};

pub struct PropResolution;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropResolutionState {
    pub clause_set: ClauseSet<String>,
    pub hidden_clauses: ClauseSet<String>,
    /// Index of the most recently derived clause
    pub newest_node: Option<usize>,
}

impl ProtectedState for PropResolutionState {
    const SEAL_DOMAIN: &'static str = "prop-resolution";

    fn canonical_info(&self) -> String {
        format!(
            "[{}]|[{}]|{}",
            self.clause_set,
            self.hidden_clauses,
            encode_opt(self.newest_node)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PropResolutionMove {
    /// Resolve `c1` and `c2`; without `literal` the unique complementary
    /// variable is used
    #[serde(rename = "res-resolve")]
    Resolve {
        c1: usize,
        c2: usize,
        #[serde(default)]
        literal: Option<String>,
    },
    /// Remove duplicate atoms of `c1`
    #[serde(rename = "res-factorize")]
    Factorize { c1: usize },
    /// Remove `c2` if `c1` subsumes it
    #[serde(rename = "res-subsume")]
    Subsume { c1: usize, c2: usize },
    #[serde(rename = "res-hide")]
    Hide { c1: usize },
    #[serde(rename = "res-show")]
    Show,
}

impl Calculus for PropResolution {
    const IDENTIFIER: &'static str = "prop-resolution";

    type Params = ClauseSetParams;
    type State = PropResolutionState;
    type Move = PropResolutionMove;

    fn parse_formula(formula: &str, params: ClauseSetParams) -> Result<PropResolutionState> {
        let config = CnfConfig::with_strategy(params.cnf_strategy);
        let clause_set = parse_flexible(formula, &config)?;
        Ok(PropResolutionState {
            clause_set,
            hidden_clauses: ClauseSet::default(),
            newest_node: None,
        })
    }

    fn apply_move(
        state: PropResolutionState,
        mv: PropResolutionMove,
    ) -> Result<PropResolutionState> {
        match mv {
            PropResolutionMove::Resolve { c1, c2, literal } => resolve(state, c1, c2, literal),
            PropResolutionMove::Factorize { c1 } => factorize(state, c1),
            PropResolutionMove::Subsume { c1, c2 } => subsume(state, c1, c2),
            PropResolutionMove::Hide { c1 } => hide(state, c1),
            PropResolutionMove::Show => Ok(show(state)),
        }
    }

    fn check_close(state: &PropResolutionState) -> CloseMessage {
        let closed = state.clause_set.contains_empty_clause()
            || state.hidden_clauses.contains_empty_clause();
        if closed {
            CloseMessage::new(
                true,
                "The proof is closed and proves the unsatisfiability of the clause set",
            )
        } else {
            CloseMessage::new(false, "The proof is not closed")
        }
    }
}

pub(crate) fn clause_at<L>(clause_set: &ClauseSet<L>, id: usize) -> Result<&Clause<L>> {
    clause_set
        .clauses()
        .get(id)
        .ok_or_else(|| LogicError::illegal(format!("There is no clause with id {}", id)))
}

pub(crate) fn check_distinct(c1: usize, c2: usize) -> Result<()> {
    if c1 == c2 {
        return Err(LogicError::illegal("Both ids refer to the same clause"));
    }
    Ok(())
}

/// The atom of `c1` whose complement occurs in `c2`
fn resolution_atom(
    c1: &Clause<String>,
    c2: &Clause<String>,
    literal: Option<&str>,
) -> Result<Atom<String>> {
    let mut candidates: Vec<&Atom<String>> = c1
        .atoms()
        .iter()
        .filter(|a| c2.contains(&a.not()))
        .collect();
    if let Some(lit) = literal {
        candidates.retain(|a| a.lit() == lit);
    }
    candidates.dedup();

    match (candidates.as_slice(), literal) {
        ([atom], _) => Ok((*atom).clone()),
        ([], Some(lit)) => Err(LogicError::illegal(format!(
            "Clauses '{}' and '{}' do not contain complementary atoms on '{}'",
            c1, c2, lit
        ))),
        ([], None) => Err(LogicError::illegal(format!(
            "Clauses '{}' and '{}' do not contain complementary atoms",
            c1, c2
        ))),
        (_, _) => Err(LogicError::illegal(
            "There are multiple candidates for resolution, please specify a literal",
        )),
    }
}

/// Resolvent of `c1` and `c2` on `atom` (from `c1`) and its complement
pub(crate) fn resolvent<L: Clone + PartialEq>(
    c1: &Clause<L>,
    c2: &Clause<L>,
    atom: &Atom<L>,
) -> Clause<L> {
    let complement = atom.not();
    let atoms = c1
        .atoms()
        .iter()
        .filter(|a| *a != atom)
        .chain(c2.atoms().iter().filter(|a| **a != complement))
        .cloned()
        .collect();
    let mut clause = Clause::new(atoms);
    clause.dedup();
    clause
}

fn resolve(
    mut state: PropResolutionState,
    c1: usize,
    c2: usize,
    literal: Option<String>,
) -> Result<PropResolutionState> {
    check_distinct(c1, c2)?;
    let first = clause_at(&state.clause_set, c1)?;
    let second = clause_at(&state.clause_set, c2)?;
    let atom = resolution_atom(first, second, literal.as_deref())?;
    let result = resolvent(first, second, &atom);
    log::debug!(
        target: targets::CALCULUS,
        "resolved {} and {} on {} to {}",
        first,
        second,
        atom,
        result
    );

    state.clause_set.add(result);
    state.newest_node = Some(state.clause_set.size() - 1);
    Ok(state)
}

fn factorize(mut state: PropResolutionState, c1: usize) -> Result<PropResolutionState> {
    let clause = clause_at(&state.clause_set, c1)?;
    let mut factorized = clause.clone();
    factorized.dedup();
    if factorized.size() == clause.size() {
        return Err(LogicError::illegal(format!("Clause '{}' contains no duplicate atoms", clause)));
    }
    state.clause_set.clauses[c1] = factorized;
    state.newest_node = Some(c1);
    Ok(state)
}

fn subsume(mut state: PropResolutionState, c1: usize, c2: usize) -> Result<PropResolutionState> {
    check_distinct(c1, c2)?;
    let first = clause_at(&state.clause_set, c1)?;
    let second = clause_at(&state.clause_set, c2)?;
    if !first.subsumes(second) {
        return Err(LogicError::illegal(format!(
            "Clause '{}' does not subsume '{}'",
            first, second
        )));
    }
    state.clause_set.remove(c2);
    state.newest_node = None;
    Ok(state)
}

pub(crate) fn hide_clause<L>(
    clause_set: &mut ClauseSet<L>,
    hidden: &mut ClauseSet<L>,
    c1: usize,
) -> Result<()> {
    let clause = clause_set
        .remove(c1)
        .ok_or_else(|| LogicError::illegal(format!("There is no clause with id {}", c1)))?;
    hidden.add(clause);
    Ok(())
}

fn hide(mut state: PropResolutionState, c1: usize) -> Result<PropResolutionState> {
    hide_clause(&mut state.clause_set, &mut state.hidden_clauses, c1)?;
    state.newest_node = None;
    Ok(state)
}

fn show(mut state: PropResolutionState) -> PropResolutionState {
    let hidden = std::mem::take(&mut state.hidden_clauses);
    state.clause_set.unite(hidden);
    state.newest_node = None;
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use PropResolutionMove::*;

    fn start(formula: &str) -> PropResolutionState {
        PropResolution::parse_formula(formula, ClauseSetParams::default()).unwrap()
    }

    fn apply(state: PropResolutionState, mv: PropResolutionMove) -> Result<PropResolutionState> {
        PropResolution::apply_move(state, mv)
    }

    #[test]
    fn test_resolve_to_empty_clause() {
        let state = start("a;!a");
        assert!(!PropResolution::check_close(&state).closed);
        let resolve_a = Resolve { c1: 0, c2: 1, literal: Some("a".to_string()) };
        let state = apply(state, resolve_a).unwrap();
        assert_eq!(state.clause_set.to_string(), "{a},{!a},{}");
        assert_eq!(state.newest_node, Some(2));
        assert!(PropResolution::check_close(&state).closed);
    }

    #[test]
    fn test_resolve_infers_unique_literal() {
        let state = start("a,b;!a,c");
        let state = apply(state, Resolve { c1: 0, c2: 1, literal: None }).unwrap();
        assert_eq!(state.clause_set.clauses()[2].to_string(), "{b,c}");
    }

    #[test]
    fn test_resolve_ambiguous_or_impossible() {
        let state = start("a,b;!a,!b;c");
        assert!(apply(state.clone(), Resolve { c1: 0, c2: 1, literal: None }).is_err());
        let resolve_b = Resolve { c1: 0, c2: 1, literal: Some("b".to_string()) };
        assert!(apply(state.clone(), resolve_b).is_ok());
        assert!(apply(state.clone(), Resolve { c1: 0, c2: 2, literal: None }).is_err());
        assert!(apply(state.clone(), Resolve { c1: 0, c2: 0, literal: None }).is_err());
        assert!(apply(state, Resolve { c1: 0, c2: 7, literal: None }).is_err());
    }

    #[test]
    fn test_factorize() {
        let state = start("a,a,b;c");
        let state = apply(state, Factorize { c1: 0 }).unwrap();
        assert_eq!(state.clause_set.to_string(), "{a,b},{c}");
        assert!(apply(state, Factorize { c1: 0 }).is_err());
    }

    #[test]
    fn test_subsume() {
        let state = start("a;a,b;c");
        assert!(apply(state.clone(), Subsume { c1: 1, c2: 0 }).is_err());
        let state = apply(state, Subsume { c1: 0, c2: 1 }).unwrap();
        assert_eq!(state.clause_set.to_string(), "{a},{c}");
    }

    #[test]
    fn test_hide_and_show() {
        let state = start("a;b;c");
        let state = apply(state, Hide { c1: 1 }).unwrap();
        assert_eq!(state.clause_set.to_string(), "{a},{c}");
        assert_eq!(state.hidden_clauses.to_string(), "{b}");
        let state = apply(state, Show).unwrap();
        assert_eq!(state.clause_set.to_string(), "{a},{c},{b}");
        assert!(state.hidden_clauses.is_empty());
    }

    #[test]
    fn test_hidden_empty_clause_still_closes() {
        let state = start("a;!a");
        let state = apply(state, Resolve { c1: 0, c2: 1, literal: None }).unwrap();
        let state = apply(state, Hide { c1: 2 }).unwrap();
        assert!(PropResolution::check_close(&state).closed);
    }

    #[test]
    fn test_move_json_shape() {
        let json = r#"{"type":"res-resolve","c1":0,"c2":1}"#;
        let mv: PropResolutionMove = serde_json::from_str(json).unwrap();
        assert_eq!(mv, Resolve { c1: 0, c2: 1, literal: None });
    }
}
