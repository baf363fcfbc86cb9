//! Propositional clause tableaux

use super::{
    check_close_pair, check_connectedness, check_open_leaf, check_regular_expansion, close_branch,
    close_message, expand_leaf, TableauxNode, TableauxTree, ROOT_SPELLING,
};
use crate::calculus::{Calculus, CloseMessage};
use crate::clause::ClauseSet;
use crate::config::{CnfConfig, TableauxParams, TableauxType};
use crate::error::{LogicError, Result};
use crate::misc::log::targets;
use crate::parser::parse_flexible;
use crate::seal::{encode_list, ProtectedState};
use crate::tree::ProofTree;
use serde::{Deserialize, Serialize};
use std::fmt;

pub struct PropTableaux;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropTableauxState {
    pub clause_set: ClauseSet<String>,
    #[serde(rename = "type")]
    pub tableaux_type: TableauxType,
    pub regular: bool,
    pub backtracking: bool,
    pub tree: TableauxTree<String>,
    pub move_history: Vec<PropTableauxMove>,
}

impl PropTableauxState {
    pub fn new(clause_set: ClauseSet<String>, params: &TableauxParams) -> Self {
        PropTableauxState {
            clause_set,
            tableaux_type: params.tableaux_type,
            regular: params.regular,
            backtracking: params.backtracking,
            tree: ProofTree::new(TableauxNode::new(ROOT_SPELLING.to_string(), false)),
            move_history: Vec::new(),
        }
    }

    /// The state before any move was applied
    fn initial(&self) -> Self {
        let params = TableauxParams {
            tableaux_type: self.tableaux_type,
            regular: self.regular,
            backtracking: self.backtracking,
            ..TableauxParams::default()
        };
        PropTableauxState::new(self.clause_set.clone(), &params)
    }
}

impl ProtectedState for PropTableauxState {
    const SEAL_DOMAIN: &'static str = "prop-tableaux";

    fn canonical_info(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}",
            self.clause_set,
            self.tableaux_type,
            self.regular,
            self.backtracking,
            encode_list(self.tree.nodes(), TableauxNode::encode),
            encode_list(&self.move_history, ToString::to_string)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PropTableauxMove {
    /// Expand leaf `id1` with clause `id2`
    #[serde(rename = "tableaux-expand")]
    Expand { id1: usize, id2: usize },
    /// Close leaf `id1` against its ancestor `id2`
    #[serde(rename = "tableaux-close")]
    Close { id1: usize, id2: usize },
    #[serde(rename = "tableaux-undo")]
    Undo,
}

impl fmt::Display for PropTableauxMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropTableauxMove::Expand { id1, id2 } => write!(f, "expand({},{})", id1, id2),
            PropTableauxMove::Close { id1, id2 } => write!(f, "close({},{})", id1, id2),
            PropTableauxMove::Undo => write!(f, "undo"),
        }
    }
}

impl Calculus for PropTableaux {
    const IDENTIFIER: &'static str = "prop-tableaux";

    type Params = TableauxParams;
    type State = PropTableauxState;
    type Move = PropTableauxMove;

    fn parse_formula(formula: &str, params: TableauxParams) -> Result<PropTableauxState> {
        let clause_set = parse_flexible(formula, &CnfConfig::with_strategy(params.cnf_strategy))?;
        Ok(PropTableauxState::new(clause_set, &params))
    }

    fn apply_move(state: PropTableauxState, mv: PropTableauxMove) -> Result<PropTableauxState> {
        match mv {
            PropTableauxMove::Expand { id1, id2 } => expand(state, id1, id2),
            PropTableauxMove::Close { id1, id2 } => close(state, id1, id2),
            PropTableauxMove::Undo => undo(state),
        }
    }

    fn check_close(state: &PropTableauxState) -> CloseMessage {
        close_message(&state.tree)
    }
}

fn expand(
    mut state: PropTableauxState,
    leaf: usize,
    clause_id: usize,
) -> Result<PropTableauxState> {
    check_open_leaf(&state.tree, leaf)?;
    let clause = state
        .clause_set
        .clauses()
        .get(clause_id)
        .ok_or_else(|| LogicError::illegal(format!("Clause with ID {} does not exist", clause_id)))?
        .clone();

    if state.regular {
        check_regular_expansion(&state.tree, leaf, &clause)?;
    }
    check_connectedness(&state.tree, state.tableaux_type, leaf, &clause, |a, b| a == b)?;

    expand_leaf(&mut state.tree, leaf, &clause);
    log::debug!(target: targets::CALCULUS, "expanded leaf {} with clause {}", leaf, clause);
    state.move_history.push(PropTableauxMove::Expand { id1: leaf, id2: clause_id });
    Ok(state)
}

fn close(mut state: PropTableauxState, leaf: usize, node: usize) -> Result<PropTableauxState> {
    check_close_pair(&state.tree, leaf, node)?;
    let leaf_node = &state.tree.nodes()[leaf];
    let target = &state.tree.nodes()[node];
    if leaf_node.spelling != target.spelling {
        return Err(LogicError::illegal(format!(
            "Leaf '{}' and node '{}' do not share a variable",
            leaf_node, target
        )));
    }

    close_branch(&mut state.tree, leaf, node)?;
    log::debug!(target: targets::CALCULUS, "closed leaf {} against node {}", leaf, node);
    state.move_history.push(PropTableauxMove::Close { id1: leaf, id2: node });
    Ok(state)
}

/// Rebuild the state from its history without the last move
fn undo(state: PropTableauxState) -> Result<PropTableauxState> {
    if !state.backtracking {
        return Err(LogicError::illegal("Backtracking is not enabled for this proof"));
    }
    let mut history = state.move_history.clone();
    if history.pop().is_none() {
        return Err(LogicError::illegal("Can't undo in initial state"));
    }

    let mut replay = state.initial();
    for mv in history {
        replay = PropTableaux::apply_move(replay, mv)?;
    }
    Ok(replay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CnfStrategy;

    fn params(tableaux_type: TableauxType, regular: bool, backtracking: bool) -> TableauxParams {
        TableauxParams {
            tableaux_type,
            regular,
            backtracking,
            cnf_strategy: CnfStrategy::Naive,
        }
    }

    fn start(formula: &str, p: TableauxParams) -> PropTableauxState {
        PropTableaux::parse_formula(formula, p).unwrap()
    }

    fn apply(state: PropTableauxState, mv: PropTableauxMove) -> Result<PropTableauxState> {
        PropTableaux::apply_move(state, mv)
    }

    use PropTableauxMove::*;

    #[test]
    fn test_initial_state() {
        let state = start("a,!b;!a,b", TableauxParams::default());
        assert_eq!(state.clause_set.to_string(), "{a,!b},{!a,b}");
        assert_eq!(state.tree.len(), 1);
        assert_eq!(state.tree.nodes()[0].spelling, "true");
    }

    #[test]
    fn test_expand_and_close() {
        let state = start("a,!b;!a,b", TableauxParams::default());
        let state = apply(state, Expand { id1: 0, id2: 0 }).unwrap();
        assert_eq!(state.tree.len(), 3);
        let state = apply(state, Expand { id1: 1, id2: 1 }).unwrap();
        // 3 = !a below a
        let closed = apply(state.clone(), Close { id1: 3, id2: 1 }).unwrap();
        assert!(closed.tree.nodes()[3].is_closed);
        assert_eq!(closed.tree.nodes()[3].close_ref, Some(1));
        // 4 = b below a
        assert!(apply(state, Close { id1: 4, id2: 1 }).is_err());
    }

    #[test]
    fn test_close_requires_same_variable_and_opposite_polarity() {
        let state = start("a,!b;!a,b", TableauxParams::default());
        let state = apply(state, Expand { id1: 0, id2: 0 }).unwrap();
        let state = apply(state, Expand { id1: 2, id2: 0 }).unwrap();
        // 3 = a below !b, 4 = !b below !b
        assert!(apply(state.clone(), Close { id1: 3, id2: 2 }).is_err());
        assert!(apply(state, Close { id1: 4, id2: 2 }).is_err());
    }

    #[test]
    fn test_expand_rejects_bad_targets() {
        let state = start("a;!a", TableauxParams::default());
        assert!(apply(state.clone(), Expand { id1: 0, id2: 5 }).is_err());
        assert!(apply(state.clone(), Expand { id1: 3, id2: 0 }).is_err());
        let state = apply(state, Expand { id1: 0, id2: 0 }).unwrap();
        assert!(apply(state, Expand { id1: 0, id2: 1 }).is_err());
    }

    #[test]
    fn test_regular_tableaux() {
        let state = start("a,b;a", params(TableauxType::Unconnected, true, false));
        let state = apply(state, Expand { id1: 0, id2: 0 }).unwrap();
        assert!(apply(state.clone(), Expand { id1: 1, id2: 1 }).is_err());
        assert!(apply(state, Expand { id1: 2, id2: 1 }).is_ok());
    }

    #[test]
    fn test_weakly_connected_tableaux() {
        let state = start("a;!a,b;c", params(TableauxType::WeaklyConnected, false, false));
        let state = apply(state, Expand { id1: 0, id2: 0 }).unwrap();
        assert!(apply(state.clone(), Expand { id1: 1, id2: 2 }).is_err());
        assert!(apply(state, Expand { id1: 1, id2: 1 }).is_ok());
    }

    #[test]
    fn test_strongly_connected_tableaux() {
        let state = start("a;!a,b;!b", params(TableauxType::StronglyConnected, false, false));
        let state = apply(state, Expand { id1: 0, id2: 0 }).unwrap();
        let state = apply(state, Expand { id1: 1, id2: 1 }).unwrap();
        // !a (2) not yet closed against a (1)
        assert!(apply(state.clone(), Expand { id1: 3, id2: 2 }).is_err());
        let state = apply(state, Close { id1: 2, id2: 1 }).unwrap();
        assert!(apply(state, Expand { id1: 3, id2: 2 }).is_ok());
    }

    #[test]
    fn test_undo_replays_history() {
        let state = start("a;!a", params(TableauxType::Unconnected, false, true));
        let one = apply(state, Expand { id1: 0, id2: 0 }).unwrap();
        let two = apply(one.clone(), Expand { id1: 1, id2: 1 }).unwrap();
        let undone = apply(two, Undo).unwrap();
        assert_eq!(undone, one);
        assert_eq!(undone.compute_seal(), one.compute_seal());
    }

    #[test]
    fn test_undo_requires_backtracking_and_history() {
        let state = start("a;!a", TableauxParams::default());
        assert!(apply(state, Undo).is_err());
        let state = start("a;!a", params(TableauxType::Unconnected, false, true));
        assert!(apply(state, Undo).is_err());
    }

    #[test]
    fn test_check_close() {
        let state = start("a;!a", TableauxParams::default());
        let state = apply(state, Expand { id1: 0, id2: 0 }).unwrap();
        let state = apply(state, Expand { id1: 1, id2: 1 }).unwrap();
        assert!(!PropTableaux::check_close(&state).closed);
        let state = apply(state, Close { id1: 2, id2: 1 }).unwrap();
        assert!(PropTableaux::check_close(&state).closed);
    }

    #[test]
    fn test_move_json_shape() {
        let json = r#"{"type":"tableaux-expand","id1":0,"id2":1}"#;
        let mv: PropTableauxMove = serde_json::from_str(json).unwrap();
        assert_eq!(mv, Expand { id1: 0, id2: 1 });
        let mv: PropTableauxMove = serde_json::from_str(r#"{"type":"tableaux-undo"}"#).unwrap();
        assert_eq!(mv, Undo);
    }
}
