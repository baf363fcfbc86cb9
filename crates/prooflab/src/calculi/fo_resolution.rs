//! First-order resolution
//!
//! Clauses never share variables: every clause in the set, including every
//! derived one, carries its own variable suffix.

use super::prop_resolution::{check_distinct, clause_at, hide_clause, resolvent};
use super::{encode_var_assign, parse_var_assign};
use crate::calculus::{Calculus, CloseMessage};
use crate::clause::{Atom, Clause, ClauseSet};
use crate::cnf::fo_clause_set;
use crate::config::{NoParams, CNF_BLOWUP_LIMIT};
use crate::error::{LogicError, Result};
use crate::logic::{Relation, Substitution};
use crate::misc::log::targets;
use crate::parser::parse_fo;
use crate::seal::{encode_opt, ProtectedState};
use crate::unification::unify;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub struct FoResolution;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoResolutionState {
    pub clause_set: ClauseSet<Relation>,
    pub hidden_clauses: ClauseSet<Relation>,
    pub newest_node: Option<usize>,
    /// Next variable suffix handed out to a new clause
    pub var_counter: usize,
}

impl ProtectedState for FoResolutionState {
    const SEAL_DOMAIN: &'static str = "fo-resolution";

    fn canonical_info(&self) -> String {
        format!(
            "[{}]|[{}]|{}|{}",
            self.clause_set,
            self.hidden_clauses,
            encode_opt(self.newest_node),
            self.var_counter
        )
    }
}

impl FoResolutionState {
    /// Add `clause` with fresh variable names and mark it as newest
    fn add_fresh(&mut self, clause: Clause<Relation>) {
        let clause = rename_fresh(&clause, self.var_counter);
        self.var_counter += 1;
        self.clause_set.add(clause);
        self.newest_node = Some(self.clause_set.size() - 1);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FoResolutionMove {
    /// Resolve atom `l1` of `c1` with atom `l2` of `c2` using their unifier
    #[serde(rename = "res-resolveunify")]
    ResolveUnify { c1: usize, c2: usize, l1: usize, l2: usize },
    /// Resolve after applying a user supplied assignment
    #[serde(rename = "res-resolvecustom")]
    ResolveCustom {
        c1: usize,
        c2: usize,
        l1: usize,
        l2: usize,
        #[serde(rename = "varAssign")]
        var_assign: BTreeMap<String, String>,
    },
    /// Add an instance of `c1`
    #[serde(rename = "res-instantiate")]
    Instantiate {
        c1: usize,
        #[serde(rename = "varAssign")]
        var_assign: BTreeMap<String, String>,
    },
    /// Unify the listed atoms of `c1` and add the factor
    #[serde(rename = "res-factorize")]
    Factorize { c1: usize, atoms: Vec<usize> },
    #[serde(rename = "res-hide")]
    Hide { c1: usize },
    #[serde(rename = "res-show")]
    Show,
}

impl Calculus for FoResolution {
    const IDENTIFIER: &'static str = "fo-resolution";

    type Params = NoParams;
    type State = FoResolutionState;
    type Move = FoResolutionMove;

    fn parse_formula(formula: &str, _params: NoParams) -> Result<FoResolutionState> {
        let parsed = fo_clause_set(&parse_fo(formula)?, CNF_BLOWUP_LIMIT)?;
        let mut state = FoResolutionState {
            clause_set: ClauseSet::default(),
            hidden_clauses: ClauseSet::default(),
            newest_node: None,
            var_counter: 0,
        };
        for clause in parsed.clauses {
            state.add_fresh(clause);
        }
        state.newest_node = None;
        Ok(state)
    }

    fn apply_move(state: FoResolutionState, mv: FoResolutionMove) -> Result<FoResolutionState> {
        log::debug!(target: targets::CALCULUS, "fo-resolution move {}", describe(&mv));
        match mv {
            FoResolutionMove::ResolveUnify { c1, c2, l1, l2 } => {
                resolve(state, c1, c2, l1, l2, None)
            }
            FoResolutionMove::ResolveCustom { c1, c2, l1, l2, var_assign } => {
                let subst = parse_var_assign(&var_assign, true)?;
                resolve(state, c1, c2, l1, l2, Some(subst))
            }
            FoResolutionMove::Instantiate { c1, var_assign } => instantiate(state, c1, &var_assign),
            FoResolutionMove::Factorize { c1, atoms } => factorize(state, c1, &atoms),
            FoResolutionMove::Hide { c1 } => {
                let mut state = state;
                hide_clause(&mut state.clause_set, &mut state.hidden_clauses, c1)?;
                state.newest_node = None;
                Ok(state)
            }
            FoResolutionMove::Show => {
                let mut state = state;
                let hidden = std::mem::take(&mut state.hidden_clauses);
                state.clause_set.unite(hidden);
                state.newest_node = None;
                Ok(state)
            }
        }
    }

    fn check_close(state: &FoResolutionState) -> CloseMessage {
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

fn describe(mv: &FoResolutionMove) -> String {
    match mv {
        FoResolutionMove::ResolveUnify { c1, c2, l1, l2 } => {
            format!("resolveunify({},{},{},{})", c1, c2, l1, l2)
        }
        FoResolutionMove::ResolveCustom { c1, c2, l1, l2, var_assign } => format!(
            "resolvecustom({},{},{},{},{})",
            c1,
            c2,
            l1,
            l2,
            encode_var_assign(var_assign)
        ),
        FoResolutionMove::Instantiate { c1, var_assign } => {
            format!("instantiate({},{})", c1, encode_var_assign(var_assign))
        }
        FoResolutionMove::Factorize { c1, atoms } => format!("factorize({},{:?})", c1, atoms),
        FoResolutionMove::Hide { c1 } => format!("hide({})", c1),
        FoResolutionMove::Show => "show".to_string(),
    }
}

/// `V_<n>` becomes `V_<suffix>`, keeping distinct variables distinct
fn rename_fresh(clause: &Clause<Relation>, suffix: usize) -> Clause<Relation> {
    let mut vars = BTreeSet::new();
    for atom in clause.atoms() {
        atom.lit().collect_variables(&mut vars);
    }

    let mut mapping: BTreeMap<String, String> = BTreeMap::new();
    let mut used_bases = BTreeSet::new();
    for var in &vars {
        let stripped = strip_suffix(var);
        let base = if used_bases.contains(stripped) { var.as_str() } else { stripped };
        used_bases.insert(base.to_string());
        mapping.insert(var.clone(), format!("{}_{}", base, suffix));
    }

    let rename = |v: &str| mapping.get(v).cloned().unwrap_or_else(|| v.to_string());
    Clause::new(
        clause
            .atoms()
            .iter()
            .map(|a| a.map(|r| r.rename_variables(&rename)))
            .collect(),
    )
}

fn strip_suffix(var: &str) -> &str {
    match var.rsplit_once('_') {
        Some((base, digits))
            if !base.is_empty()
                && !digits.is_empty()
                && digits.chars().all(|c| c.is_ascii_digit()) =>
        {
            base
        }
        _ => var,
    }
}

fn apply_to_clause(clause: &Clause<Relation>, subst: &Substitution) -> Clause<Relation> {
    Clause::new(
        clause
            .atoms()
            .iter()
            .map(|a| a.map(|r| r.apply_substitution(subst)))
            .collect(),
    )
}

fn atom_at(clause: &Clause<Relation>, id: usize) -> Result<&Atom<Relation>> {
    clause
        .atoms()
        .get(id)
        .ok_or_else(|| {
            LogicError::illegal(format!("Clause '{}' has no atom with id {}", clause, id))
        })
}

fn resolve(
    mut state: FoResolutionState,
    c1: usize,
    c2: usize,
    l1: usize,
    l2: usize,
    custom: Option<Substitution>,
) -> Result<FoResolutionState> {
    check_distinct(c1, c2)?;
    let first = clause_at(&state.clause_set, c1)?;
    let second = clause_at(&state.clause_set, c2)?;
    let a1 = atom_at(first, l1)?;
    let a2 = atom_at(second, l2)?;
    if a1.negated() == a2.negated() {
        return Err(LogicError::illegal(format!(
            "Atoms '{}' and '{}' have the same polarity",
            a1, a2
        )));
    }

    let subst = match custom {
        Some(subst) => subst,
        None => unify(a1.lit(), a2.lit())?,
    };

    let first = apply_to_clause(first, &subst);
    let second = apply_to_clause(second, &subst);
    let atom = first.atoms()[l1].clone();
    if atom.lit() != second.atoms()[l2].lit() {
        return Err(LogicError::illegal(format!(
            "Atoms '{}' and '{}' are not equal after instantiation with {}",
            atom,
            second.atoms()[l2],
            subst
        )));
    }

    let result = resolvent(&first, &second, &atom);
    log::debug!(target: targets::CALCULUS, "resolvent {} with {}", result, subst);
    state.add_fresh(result);
    Ok(state)
}

fn instantiate(
    mut state: FoResolutionState,
    c1: usize,
    var_assign: &BTreeMap<String, String>,
) -> Result<FoResolutionState> {
    let clause = clause_at(&state.clause_set, c1)?;
    let subst = parse_var_assign(var_assign, true)?;
    let instance = apply_to_clause(clause, &subst);
    state.add_fresh(instance);
    Ok(state)
}

fn factorize(
    mut state: FoResolutionState,
    c1: usize,
    atoms: &[usize],
) -> Result<FoResolutionState> {
    let clause = clause_at(&state.clause_set, c1)?;
    if atoms.len() < 2 {
        return Err(LogicError::illegal("Factorization needs at least two atoms"));
    }
    let distinct: BTreeSet<usize> = atoms.iter().copied().collect();
    if distinct.len() != atoms.len() {
        return Err(LogicError::illegal("Atoms selected for factorization have to be distinct"));
    }
    for &id in atoms {
        atom_at(clause, id)?;
    }

    let mut current = clause.clone();
    let first = atoms[0];
    for &other in &atoms[1..] {
        let a = &current.atoms()[first];
        let b = &current.atoms()[other];
        if a.negated() != b.negated() {
            return Err(LogicError::illegal(format!(
                "Atoms '{}' and '{}' have different polarity",
                a, b
            )));
        }
        let mgu = unify(a.lit(), b.lit())?;
        current = apply_to_clause(&current, &mgu);
    }
    current.dedup();

    state.add_fresh(current);
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use FoResolutionMove::*;

    fn start(formula: &str) -> FoResolutionState {
        FoResolution::parse_formula(formula, NoParams::default()).unwrap()
    }

    fn assign(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn apply(state: FoResolutionState, mv: FoResolutionMove) -> Result<FoResolutionState> {
        FoResolution::apply_move(state, mv)
    }

    fn unify(c1: usize, c2: usize, l1: usize, l2: usize) -> FoResolutionMove {
        ResolveUnify { c1, c2, l1, l2 }
    }

    #[test]
    fn test_clauses_are_standardized_apart() {
        let state = start("\\all X: (R(X) & Q(X))");
        assert_eq!(state.clause_set.to_string(), "{R(X_0)},{Q(X_1)}");
        assert_eq!(state.var_counter, 2);
        assert_eq!(state.newest_node, None);
    }

    #[test]
    fn test_rename_keeps_distinct_variables_apart() {
        let clause = Clause::new(vec![Atom::positive(Relation::new(
            "R",
            vec![crate::logic::Term::var("X_1"), crate::logic::Term::var("X_2")],
        ))]);
        assert_eq!(rename_fresh(&clause, 7).to_string(), "{R(X_7,X_2_7)}");
    }

    #[test]
    fn test_resolve_unify() {
        let state = start("(\\all X: R(X)) & !R(a)");
        let state = apply(state, unify(0, 1, 0, 0)).unwrap();
        assert_eq!(state.clause_set.clauses()[2].to_string(), "{}");
        assert!(FoResolution::check_close(&state).closed);
    }

    #[test]
    fn test_resolve_unify_keeps_rest() {
        let state = start("(\\all X: (R(X) | Q(X))) & !R(a)");
        let state = apply(state, unify(0, 1, 0, 0)).unwrap();
        assert_eq!(state.clause_set.clauses()[2].to_string(), "{Q(a)}");
    }

    #[test]
    fn test_resolve_rejections() {
        let state = start("R(a) & R(b) & !R(b)");
        assert!(apply(state.clone(), unify(0, 1, 0, 0)).is_err());
        assert!(matches!(
            apply(state.clone(), unify(0, 2, 0, 0)),
            Err(LogicError::UnificationImpossible(_))
        ));
        assert!(apply(state.clone(), unify(0, 0, 0, 0)).is_err());
        assert!(apply(state, unify(1, 2, 0, 3)).is_err());
    }

    #[test]
    fn test_resolve_custom() {
        let state = start("(\\all X: R(X)) & !R(a)");
        let custom = |value: &str| ResolveCustom {
            c1: 0,
            c2: 1,
            l1: 0,
            l2: 0,
            var_assign: assign(&[("X_0", value)]),
        };
        let wrong = custom("b");
        assert!(apply(state.clone(), wrong).is_err());
        let right = custom("a");
        assert!(apply(state, right).is_ok());
    }

    #[test]
    fn test_instantiate_appends_instance() {
        let state = start("\\all X: R(X, f(X))");
        let instantiate = Instantiate { c1: 0, var_assign: assign(&[("X_0", "a")]) };
        let state = apply(state, instantiate).unwrap();
        assert_eq!(state.clause_set.to_string(), "{R(X_0,f(X_0))},{R(a,f(a))}");
        assert_eq!(state.newest_node, Some(1));
    }

    #[test]
    fn test_factorize() {
        let state = start("\\all X: \\all Y: (R(X) | R(Y) | Q(Y))");
        let state = apply(state, Factorize { c1: 0, atoms: vec![0, 1] }).unwrap();
        assert_eq!(state.clause_set.clauses()[1].atoms().len(), 2);
        assert!(apply(state.clone(), Factorize { c1: 0, atoms: vec![0] }).is_err());
        assert!(apply(state.clone(), Factorize { c1: 0, atoms: vec![0, 0] }).is_err());
        assert!(apply(state, Factorize { c1: 0, atoms: vec![0, 2] }).is_err());
    }

    #[test]
    fn test_hide_and_show() {
        let state = start("R(a) & Q(b)");
        let state = apply(state, Hide { c1: 0 }).unwrap();
        assert_eq!(state.hidden_clauses.size(), 1);
        let state = apply(state, Show).unwrap();
        assert_eq!(state.clause_set.to_string(), "{Q(b)},{R(a)}");
    }
}
