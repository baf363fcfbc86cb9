//! First-order clause tableaux with rigid variables
//!
//! Every expansion copies the clause with fresh variable names. Closing a
//! branch instantiates variables in the whole tree, either with the most
//! general unifier of the two relations or with a user supplied assignment.

use super::{
    check_close_pair, check_connectedness, check_open_leaf, check_regular_expansion,
    check_regular_tree, close_branch, close_message, expand_leaf, TableauxNode, TableauxTree,
    ROOT_SPELLING,
};
use crate::calculi::{encode_var_assign, parse_var_assign};
use crate::calculus::{Calculus, CloseMessage};
use crate::clause::{Clause, ClauseSet};
use crate::cnf::fo_clause_set;
use crate::config::{FoTableauxParams, TableauxType, CNF_BLOWUP_LIMIT};
use crate::error::{LogicError, Result};
use crate::logic::{Relation, Substitution};
use crate::misc::log::targets;
use crate::parser::parse_fo;
use crate::seal::{encode_list, ProtectedState};
use crate::tree::ProofTree;
use crate::unification::unify;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub struct FoTableaux;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoTableauxState {
    pub clause_set: ClauseSet<Relation>,
    #[serde(rename = "type")]
    pub tableaux_type: TableauxType,
    pub regular: bool,
    pub backtracking: bool,
    pub manual_var_assign_only: bool,
    /// Number of expansions so far, used to name fresh variables
    pub expansion_counter: usize,
    pub tree: TableauxTree<Relation>,
    pub move_history: Vec<FoTableauxMove>,
}

impl FoTableauxState {
    pub fn new(clause_set: ClauseSet<Relation>, params: &FoTableauxParams) -> Self {
        FoTableauxState {
            clause_set,
            tableaux_type: params.tableaux_type,
            regular: params.regular,
            backtracking: params.backtracking,
            manual_var_assign_only: params.manual_var_assign_only,
            expansion_counter: 0,
            tree: ProofTree::new(TableauxNode::new(Relation::new(ROOT_SPELLING, vec![]), false)),
            move_history: Vec::new(),
        }
    }

    fn initial(&self) -> Self {
        let params = FoTableauxParams {
            tableaux_type: self.tableaux_type,
            regular: self.regular,
            backtracking: self.backtracking,
            manual_var_assign_only: self.manual_var_assign_only,
        };
        FoTableauxState::new(self.clause_set.clone(), &params)
    }
}

impl ProtectedState for FoTableauxState {
    const SEAL_DOMAIN: &'static str = "fo-tableaux";

    fn canonical_info(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}|{}|{}",
            self.clause_set,
            self.tableaux_type,
            self.regular,
            self.backtracking,
            self.manual_var_assign_only,
            self.expansion_counter,
            encode_list(self.tree.nodes(), TableauxNode::encode),
            encode_list(&self.move_history, ToString::to_string)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FoTableauxMove {
    #[serde(rename = "tableaux-expand")]
    Expand { id1: usize, id2: usize },
    /// Close leaf `id1` against `id2`; an empty assignment asks for the
    /// most general unifier
    #[serde(rename = "tableaux-close")]
    Close {
        id1: usize,
        id2: usize,
        #[serde(default, rename = "varAssign")]
        var_assign: BTreeMap<String, String>,
    },
    #[serde(rename = "tableaux-undo")]
    Undo,
}

impl fmt::Display for FoTableauxMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FoTableauxMove::Expand { id1, id2 } => write!(f, "expand({},{})", id1, id2),
            FoTableauxMove::Close { id1, id2, var_assign } => {
                write!(f, "close({},{},{})", id1, id2, encode_var_assign(var_assign))
            }
            FoTableauxMove::Undo => write!(f, "undo"),
        }
    }
}

impl Calculus for FoTableaux {
    const IDENTIFIER: &'static str = "fo-tableaux";

    type Params = FoTableauxParams;
    type State = FoTableauxState;
    type Move = FoTableauxMove;

    fn parse_formula(formula: &str, params: FoTableauxParams) -> Result<FoTableauxState> {
        let clause_set = fo_clause_set(&parse_fo(formula)?, CNF_BLOWUP_LIMIT)?;
        Ok(FoTableauxState::new(clause_set, &params))
    }

    fn apply_move(state: FoTableauxState, mv: FoTableauxMove) -> Result<FoTableauxState> {
        match mv {
            FoTableauxMove::Expand { id1, id2 } => expand(state, id1, id2),
            FoTableauxMove::Close { id1, id2, var_assign } => close(state, id1, id2, var_assign),
            FoTableauxMove::Undo => undo(state),
        }
    }

    fn check_close(state: &FoTableauxState) -> CloseMessage {
        close_message(&state.tree)
    }
}

/// Copy of `clause` with every variable `V` renamed to `V_<suffix>`
fn instantiate_clause(clause: &Clause<Relation>, suffix: usize) -> Clause<Relation> {
    let rename = |v: &str| format!("{}_{}", v, suffix);
    Clause::new(
        clause
            .atoms()
            .iter()
            .map(|a| a.map(|r| r.rename_variables(&rename)))
            .collect(),
    )
}

fn expand(mut state: FoTableauxState, leaf: usize, clause_id: usize) -> Result<FoTableauxState> {
    check_open_leaf(&state.tree, leaf)?;
    let clause = state
        .clause_set
        .clauses()
        .get(clause_id)
        .ok_or_else(|| {
            LogicError::illegal(format!("Clause with ID {} does not exist", clause_id))
        })?;
    let clause = instantiate_clause(clause, state.expansion_counter);

    if state.regular {
        check_regular_expansion(&state.tree, leaf, &clause)?;
    }
    check_connectedness(&state.tree, state.tableaux_type, leaf, &clause, |a, b| {
        unify(a, b).is_ok()
    })?;

    expand_leaf(&mut state.tree, leaf, &clause);
    log::debug!(target: targets::CALCULUS, "expanded leaf {} with clause {}", leaf, clause);
    state.expansion_counter += 1;
    state.move_history.push(FoTableauxMove::Expand { id1: leaf, id2: clause_id });
    Ok(state)
}

fn close(
    mut state: FoTableauxState,
    leaf: usize,
    node: usize,
    var_assign: BTreeMap<String, String>,
) -> Result<FoTableauxState> {
    check_close_pair(&state.tree, leaf, node)?;
    let leaf_rel = &state.tree.nodes()[leaf].spelling;
    let node_rel = &state.tree.nodes()[node].spelling;

    let subst = if var_assign.is_empty() && !state.manual_var_assign_only {
        unify(leaf_rel, node_rel)?
    } else {
        parse_var_assign(&var_assign, true)?
    };
    log::debug!(target: targets::CALCULUS, "closing leaf {} against {} with {}", leaf, node, subst);

    apply_to_tree(&mut state.tree, &subst);
    let leaf_rel = &state.tree.nodes()[leaf].spelling;
    let node_rel = &state.tree.nodes()[node].spelling;
    if leaf_rel != node_rel {
        return Err(LogicError::illegal(format!(
            "Relations '{}' and '{}' are not equal after instantiation with {}",
            leaf_rel, node_rel, subst
        )));
    }
    if state.regular {
        check_regular_tree(&state.tree)?;
    }

    close_branch(&mut state.tree, leaf, node)?;
    state.move_history.push(FoTableauxMove::Close {
        id1: leaf,
        id2: node,
        var_assign,
    });
    Ok(state)
}

/// Variables are rigid: an instantiation affects every node
fn apply_to_tree(tree: &mut TableauxTree<Relation>, subst: &Substitution) {
    if subst.is_empty() {
        return;
    }
    for id in 0..tree.len() {
        if let Ok(node) = tree.node_mut(id) {
            node.spelling = node.spelling.apply_substitution(subst);
        }
    }
}

fn undo(state: FoTableauxState) -> Result<FoTableauxState> {
    if !state.backtracking {
        return Err(LogicError::illegal("Backtracking is not enabled for this proof"));
    }
    let mut history = state.move_history.clone();
    if history.pop().is_none() {
        return Err(LogicError::illegal("Can't undo in initial state"));
    }

    let mut replay = state.initial();
    for mv in history {
        replay = FoTableaux::apply_move(replay, mv)?;
    }
    Ok(replay)
}
