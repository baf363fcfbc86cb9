//! Signed modal tableaux
//!
//! Nodes carry a sign (`T` or `F`), a formula and a prefix naming the world
//! the formula is evaluated in. The root is `F φ` in world `1`; closing
//! every branch proves `φ` valid in K.

use crate::calculus::{Calculus, CloseMessage};
use crate::config::BacktrackingParams;
use crate::error::{LogicError, Result};
use crate::logic::Formula;
use crate::misc::log::targets;
use crate::parser::parse_modal;
use crate::seal::{encode_list, encode_opt, ProtectedState};
use crate::tree::{ClosableNode, ProofTree, TreeNode};
use serde::{Deserialize, Serialize};
use std::fmt;

pub struct SignedModalTableaux;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalNode {
    pub parent: Option<usize>,
    pub prefix: Vec<usize>,
    /// `true` for T, `false` for F
    pub sign: bool,
    pub formula: Formula,
    pub is_closed: bool,
    pub close_ref: Option<usize>,
    pub children: Vec<usize>,
}

impl ModalNode {
    pub fn new(prefix: Vec<usize>, sign: bool, formula: Formula) -> Self {
        ModalNode {
            parent: None,
            prefix,
            sign,
            formula,
            is_closed: false,
            close_ref: None,
            children: Vec::new(),
        }
    }

    fn encode(&self) -> String {
        format!(
            "({}|{}|{}|{}|{}|{}|{})",
            encode_opt(self.parent),
            encode_list(&self.prefix, ToString::to_string),
            sign_name(self.sign),
            self.formula.encode(),
            self.is_closed,
            encode_opt(self.close_ref),
            encode_list(&self.children, ToString::to_string)
        )
    }
}

fn sign_name(sign: bool) -> &'static str {
    if sign {
        "T"
    } else {
        "F"
    }
}

fn prefix_name(prefix: &[usize]) -> String {
    prefix.iter().map(ToString::to_string).collect::<Vec<_>>().join(".")
}

impl fmt::Display for ModalNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", prefix_name(&self.prefix), sign_name(self.sign), self.formula)
    }
}

impl TreeNode for ModalNode {
    fn parent(&self) -> Option<usize> {
        self.parent
    }

    fn set_parent(&mut self, parent: Option<usize>) {
        self.parent = parent;
    }

    fn children(&self) -> &[usize] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut Vec<usize> {
        &mut self.children
    }

    fn remap_references(&mut self, remap: &dyn Fn(usize) -> Option<usize>) {
        self.close_ref = self.close_ref.and_then(remap);
    }

    fn references(&self) -> Vec<usize> {
        self.close_ref.into_iter().collect()
    }
}

impl ClosableNode for ModalNode {
    fn is_closed(&self) -> bool {
        self.is_closed
    }

    fn set_closed_flag(&mut self, closed: bool) {
        self.is_closed = closed;
        if !closed {
            self.close_ref = None;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalState {
    pub backtracking: bool,
    pub tree: ProofTree<ModalNode>,
    pub move_history: Vec<ModalMove>,
}

impl ModalState {
    pub fn new(formula: Formula, backtracking: bool) -> Self {
        ModalState {
            backtracking,
            tree: ProofTree::new(ModalNode::new(vec![1], false, formula)),
            move_history: Vec::new(),
        }
    }

    fn initial(&self) -> Self {
        ModalState::new(self.tree.nodes()[0].formula.clone(), self.backtracking)
    }
}

impl ProtectedState for ModalState {
    const SEAL_DOMAIN: &'static str = "signed-modal-tableaux";

    fn canonical_info(&self) -> String {
        format!(
            "{}|{}|{}",
            self.backtracking,
            encode_list(self.tree.nodes(), ModalNode::encode),
            encode_list(&self.move_history, ToString::to_string)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ModalMove {
    /// Non-branching rule; without `leafID` applied at every open leaf below
    /// `nodeID`
    #[serde(rename = "smtab-alpha")]
    Alpha {
        #[serde(rename = "nodeID")]
        node_id: usize,
        #[serde(default, rename = "leafID")]
        leaf_id: Option<usize>,
    },
    #[serde(rename = "smtab-beta")]
    Beta {
        #[serde(rename = "nodeID")]
        node_id: usize,
        #[serde(default, rename = "leafID")]
        leaf_id: Option<usize>,
    },
    /// Move `T□φ` / `F◇φ` into the existing world `σ.prefix`
    #[serde(rename = "smtab-nu")]
    Nu {
        #[serde(rename = "nodeID")]
        node_id: usize,
        #[serde(default, rename = "leafID")]
        leaf_id: Option<usize>,
        prefix: usize,
    },
    /// Move `F□φ` / `T◇φ` into the fresh world `σ.prefix`
    #[serde(rename = "smtab-pi")]
    Pi {
        #[serde(rename = "nodeID")]
        node_id: usize,
        #[serde(default, rename = "leafID")]
        leaf_id: Option<usize>,
        prefix: usize,
    },
    #[serde(rename = "smtab-close")]
    Close {
        #[serde(rename = "nodeID")]
        node_id: usize,
        #[serde(rename = "leafID")]
        leaf_id: usize,
    },
    #[serde(rename = "smtab-prune")]
    Prune {
        #[serde(rename = "nodeID")]
        node_id: usize,
    },
    #[serde(rename = "smtab-undo")]
    Undo,
}

impl fmt::Display for ModalMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModalMove::Alpha { node_id, leaf_id } => {
                write!(f, "alpha({},{})", node_id, encode_opt(*leaf_id))
            }
            ModalMove::Beta { node_id, leaf_id } => {
                write!(f, "beta({},{})", node_id, encode_opt(*leaf_id))
            }
            ModalMove::Nu { node_id, leaf_id, prefix } => {
                write!(f, "nu({},{},{})", node_id, encode_opt(*leaf_id), prefix)
            }
            ModalMove::Pi { node_id, leaf_id, prefix } => {
                write!(f, "pi({},{},{})", node_id, encode_opt(*leaf_id), prefix)
            }
            ModalMove::Close { node_id, leaf_id } => write!(f, "close({},{})", node_id, leaf_id),
            ModalMove::Prune { node_id } => write!(f, "prune({})", node_id),
            ModalMove::Undo => write!(f, "undo"),
        }
    }
}

impl Calculus for SignedModalTableaux {
    const IDENTIFIER: &'static str = "signed-modal-tableaux";

    type Params = BacktrackingParams;
    type State = ModalState;
    type Move = ModalMove;

    fn parse_formula(formula: &str, params: BacktrackingParams) -> Result<ModalState> {
        let formula = parse_modal(formula)?.eliminate_equivalences();
        Ok(ModalState::new(formula, params.backtracking))
    }

    fn apply_move(mut state: ModalState, mv: ModalMove) -> Result<ModalState> {
        match &mv {
            ModalMove::Alpha { node_id, leaf_id } => alpha(&mut state.tree, *node_id, *leaf_id)?,
            ModalMove::Beta { node_id, leaf_id } => beta(&mut state.tree, *node_id, *leaf_id)?,
            ModalMove::Nu { node_id, leaf_id, prefix } => {
                nu(&mut state.tree, *node_id, *leaf_id, *prefix)?
            }
            ModalMove::Pi { node_id, leaf_id, prefix } => {
                pi(&mut state.tree, *node_id, *leaf_id, *prefix)?
            }
            ModalMove::Close { node_id, leaf_id } => close(&mut state.tree, *node_id, *leaf_id)?,
            ModalMove::Prune { node_id } => {
                state.tree.node(*node_id)?;
                state.tree.prune_and_reopen(*node_id);
            }
            ModalMove::Undo => return undo(state),
        }
        log::debug!(target: targets::CALCULUS, "signed modal tableaux applied {}", mv);
        state.move_history.push(mv);
        Ok(state)
    }

    fn check_close(state: &ModalState) -> CloseMessage {
        if state.tree.is_closed() {
            CloseMessage::new(true, "The proof tree has been successfully closed")
        } else {
            CloseMessage::new(false, "The proof tree is not closed")
        }
    }
}

type Signed = (bool, Formula);

/// Leaves a rule on `node_id` extends: `leaf_id` alone, or every open leaf
/// below `node_id`
fn target_leaves(
    tree: &ProofTree<ModalNode>,
    node_id: usize,
    leaf_id: Option<usize>,
) -> Result<Vec<usize>> {
    tree.node(node_id)?;
    match leaf_id {
        Some(leaf) => {
            let node = tree.node(leaf)?;
            if !node.is_leaf() {
                return Err(LogicError::illegal(format!("Node {} is not a leaf", leaf)));
            }
            if node.is_closed {
                return Err(LogicError::illegal(format!("Leaf {} is already closed", leaf)));
            }
            if leaf != node_id && !tree.is_ancestor_of(node_id, leaf) {
                return Err(LogicError::illegal(format!(
                    "Node {} is not on the branch of leaf {}",
                    node_id, leaf
                )));
            }
            Ok(vec![leaf])
        }
        None => {
            let leaves: Vec<usize> = tree
                .child_leaves_of(node_id)
                .into_iter()
                .filter(|&l| !tree.nodes()[l].is_closed)
                .collect();
            if leaves.is_empty() {
                return Err(LogicError::illegal(format!(
                    "There are no open leaves below node {}",
                    node_id
                )));
            }
            Ok(leaves)
        }
    }
}

fn not_applicable(rule: &str, node: &ModalNode) -> LogicError {
    LogicError::illegal(format!("The {} rule can not be applied to '{}'", rule, node))
}

fn alpha_components(sign: bool, formula: &Formula) -> Option<Vec<Signed>> {
    match (sign, formula) {
        (true, Formula::And(l, r)) => Some(vec![(true, (**l).clone()), (true, (**r).clone())]),
        (false, Formula::Or(l, r)) => Some(vec![(false, (**l).clone()), (false, (**r).clone())]),
        (false, Formula::Impl(l, r)) => Some(vec![(true, (**l).clone()), (false, (**r).clone())]),
        (s, Formula::Not(c)) => Some(vec![(!s, (**c).clone())]),
        _ => None,
    }
}

fn beta_components(sign: bool, formula: &Formula) -> Option<(Signed, Signed)> {
    match (sign, formula) {
        (false, Formula::And(l, r)) => Some(((false, (**l).clone()), (false, (**r).clone()))),
        (true, Formula::Or(l, r)) => Some(((true, (**l).clone()), (true, (**r).clone()))),
        (true, Formula::Impl(l, r)) => Some(((false, (**l).clone()), (true, (**r).clone()))),
        _ => None,
    }
}

fn alpha(tree: &mut ProofTree<ModalNode>, node_id: usize, leaf_id: Option<usize>) -> Result<()> {
    let leaves = target_leaves(tree, node_id, leaf_id)?;
    let node = &tree.nodes()[node_id];
    let components =
        alpha_components(node.sign, &node.formula).ok_or_else(|| not_applicable("alpha", node))?;
    let prefix = node.prefix.clone();

    for leaf in leaves {
        let mut parent = leaf;
        for (sign, formula) in &components {
            parent = tree.add_child(parent, ModalNode::new(prefix.clone(), *sign, formula.clone()));
        }
    }
    Ok(())
}

fn beta(tree: &mut ProofTree<ModalNode>, node_id: usize, leaf_id: Option<usize>) -> Result<()> {
    let leaves = target_leaves(tree, node_id, leaf_id)?;
    let node = &tree.nodes()[node_id];
    let (left, right) =
        beta_components(node.sign, &node.formula).ok_or_else(|| not_applicable("beta", node))?;
    let prefix = node.prefix.clone();

    for leaf in leaves {
        tree.add_child(leaf, ModalNode::new(prefix.clone(), left.0, left.1.clone()));
        tree.add_child(leaf, ModalNode::new(prefix.clone(), right.0, right.1.clone()));
    }
    Ok(())
}

fn nu(
    tree: &mut ProofTree<ModalNode>,
    node_id: usize,
    leaf_id: Option<usize>,
    world: usize,
) -> Result<()> {
    let leaves = target_leaves(tree, node_id, leaf_id)?;
    let node = &tree.nodes()[node_id];
    let (sign, formula) = match (node.sign, &node.formula) {
        (true, Formula::Necessity(c)) => (true, (**c).clone()),
        (false, Formula::Possibility(c)) => (false, (**c).clone()),
        _ => return Err(not_applicable("nu", node)),
    };
    let mut prefix = node.prefix.clone();
    prefix.push(world);

    for &leaf in &leaves {
        let known = tree.branch_of(leaf).into_iter().any(|id| tree.nodes()[id].prefix == prefix);
        if !known {
            return Err(LogicError::illegal(format!(
                "Prefix {} is not used on the branch of leaf {}",
                prefix_name(&prefix),
                leaf
            )));
        }
    }
    for leaf in leaves {
        tree.add_child(leaf, ModalNode::new(prefix.clone(), sign, formula.clone()));
    }
    Ok(())
}

fn pi(
    tree: &mut ProofTree<ModalNode>,
    node_id: usize,
    leaf_id: Option<usize>,
    world: usize,
) -> Result<()> {
    let leaves = target_leaves(tree, node_id, leaf_id)?;
    let node = &tree.nodes()[node_id];
    let (sign, formula) = match (node.sign, &node.formula) {
        (false, Formula::Necessity(c)) => (false, (**c).clone()),
        (true, Formula::Possibility(c)) => (true, (**c).clone()),
        _ => return Err(not_applicable("pi", node)),
    };
    let mut prefix = node.prefix.clone();
    prefix.push(world);

    for &leaf in &leaves {
        let used = tree
            .branch_of(leaf)
            .into_iter()
            .any(|id| tree.nodes()[id].prefix.starts_with(&prefix));
        if used {
            return Err(LogicError::illegal(format!(
                "Prefix {} is already used on the branch of leaf {}",
                prefix_name(&prefix),
                leaf
            )));
        }
    }
    for leaf in leaves {
        tree.add_child(leaf, ModalNode::new(prefix.clone(), sign, formula.clone()));
    }
    Ok(())
}

fn close(tree: &mut ProofTree<ModalNode>, node_id: usize, leaf_id: usize) -> Result<()> {
    let leaf = tree.node(leaf_id)?;
    let node = tree.node(node_id)?;
    if !leaf.is_leaf() || leaf.is_closed {
        return Err(LogicError::illegal(format!("Node {} is not an open leaf", leaf_id)));
    }
    if !tree.is_ancestor_of(node_id, leaf_id) {
        return Err(LogicError::illegal(format!(
            "Node {} is not an ancestor of leaf {}",
            node_id, leaf_id
        )));
    }
    if node.prefix != leaf.prefix || node.formula != leaf.formula || node.sign == leaf.sign {
        return Err(LogicError::illegal(format!(
            "Leaf '{}' is not contradictory with node '{}'",
            leaf, node
        )));
    }

    tree.set_closed(leaf_id);
    tree.node_mut(leaf_id)?.close_ref = Some(node_id);
    Ok(())
}

fn undo(state: ModalState) -> Result<ModalState> {
    if !state.backtracking {
        return Err(LogicError::illegal("Backtracking is not enabled for this proof"));
    }
    let mut history = state.move_history.clone();
    if history.pop().is_none() {
        return Err(LogicError::illegal("Can't undo in initial state"));
    }
    let mut replay = state.initial();
    for mv in history {
        replay = SignedModalTableaux::apply_move(replay, mv)?;
    }
    Ok(replay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ModalMove::*;

    fn start(formula: &str) -> ModalState {
        let params = BacktrackingParams { backtracking: true };
        SignedModalTableaux::parse_formula(formula, params).unwrap()
    }

    fn apply(state: ModalState, mv: ModalMove) -> Result<ModalState> {
        SignedModalTableaux::apply_move(state, mv)
    }

    fn rendered(state: &ModalState) -> Vec<String> {
        state.tree.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_root() {
        let state = start("[]a -> a");
        assert_eq!(rendered(&state), vec!["1 F (□a → a)"]);
    }

    #[test]
    fn test_alpha_chains_components() {
        let state = start("a -> a");
        let state = apply(state, Alpha { node_id: 0, leaf_id: None }).unwrap();
        assert_eq!(rendered(&state), vec!["1 F (a → a)", "1 T a", "1 F a"]);
        assert_eq!(state.tree.nodes()[2].parent, Some(1));
        let state = apply(state, Close { node_id: 1, leaf_id: 2 }).unwrap();
        assert!(SignedModalTableaux::check_close(&state).closed);
        assert_eq!(state.tree.nodes()[2].close_ref, Some(1));
    }

    #[test]
    fn test_beta_applies_at_every_open_leaf() {
        let state = start("!((a | b) & (c | d))");
        let state = apply(state, Alpha { node_id: 0, leaf_id: None }).unwrap();
        // 1 = T (a ∨ b) ∧ (c ∨ d)
        let state = apply(state, Alpha { node_id: 1, leaf_id: None }).unwrap();
        let state = apply(state, Beta { node_id: 2, leaf_id: None }).unwrap();
        let state = apply(state, Beta { node_id: 3, leaf_id: None }).unwrap();
        assert_eq!(state.tree.child_leaves_of(0).len(), 4);
    }

    #[test]
    fn test_wrong_connective() {
        let state = start("a & b");
        assert!(matches!(
            apply(state.clone(), Alpha { node_id: 0, leaf_id: None }),
            Err(LogicError::IllegalMove(_))
        ));
        let state = apply(state, Beta { node_id: 0, leaf_id: None }).unwrap();
        assert!(apply(state, Beta { node_id: 0, leaf_id: Some(0) }).is_err());
    }

    #[test]
    fn test_axiom_k() {
        // □(a → b) → (□a → □b)
        let state = start("[](a -> b) -> ([]a -> []b)");
        let state = apply(state, Alpha { node_id: 0, leaf_id: None }).unwrap();
        // 1 = T □(a → b), 2 = F (□a → □b)
        let state = apply(state, Alpha { node_id: 2, leaf_id: None }).unwrap();
        // 3 = T □a, 4 = F □b
        assert!(apply(state.clone(), Nu { node_id: 3, leaf_id: None, prefix: 1 }).is_err());
        let state = apply(state, Pi { node_id: 4, leaf_id: None, prefix: 1 }).unwrap();
        assert_eq!(state.tree.nodes()[5].to_string(), "1.1 F b");
        assert!(apply(state.clone(), Pi { node_id: 4, leaf_id: None, prefix: 1 }).is_err());
        let state = apply(state, Nu { node_id: 3, leaf_id: None, prefix: 1 }).unwrap();
        let state = apply(state, Nu { node_id: 1, leaf_id: None, prefix: 1 }).unwrap();
        // 6 = 1.1 T a, 7 = 1.1 T (a → b)
        let state = apply(state, Beta { node_id: 7, leaf_id: None }).unwrap();
        // 8 = 1.1 F a, 9 = 1.1 T b
        let state = apply(state, Close { node_id: 6, leaf_id: 8 }).unwrap();
        assert!(!SignedModalTableaux::check_close(&state).closed);
        assert!(apply(state.clone(), Close { node_id: 6, leaf_id: 9 }).is_err());
        let state = apply(state, Close { node_id: 5, leaf_id: 9 }).unwrap();
        assert!(SignedModalTableaux::check_close(&state).closed);
    }

    #[test]
    fn test_close_needs_same_prefix() {
        let state = start("<>a -> a");
        let state = apply(state, Alpha { node_id: 0, leaf_id: None }).unwrap();
        // 1 = T ◇a, 2 = F a
        assert!(apply(state.clone(), Pi { node_id: 2, leaf_id: None, prefix: 1 }).is_err());
        let state = apply(state, Pi { node_id: 1, leaf_id: None, prefix: 1 }).unwrap();
        assert_eq!(state.tree.nodes()[3].to_string(), "1.1 T a");
        assert!(apply(state, Close { node_id: 2, leaf_id: 3 }).is_err());
    }

    #[test]
    fn test_prune_and_undo() {
        let state = start("a -> a");
        let one = apply(state, Alpha { node_id: 0, leaf_id: None }).unwrap();
        let two = apply(one.clone(), Close { node_id: 1, leaf_id: 2 }).unwrap();
        let undone = apply(two.clone(), Undo).unwrap();
        assert_eq!(undone, one);
        assert_eq!(undone.compute_seal(), one.compute_seal());

        let pruned = apply(two, Prune { node_id: 0 }).unwrap();
        assert_eq!(pruned.tree.len(), 1);
        assert!(!pruned.tree.is_closed());
    }

    #[test]
    fn test_undo_requires_backtracking() {
        let params = BacktrackingParams::default();
        let state = SignedModalTableaux::parse_formula("a -> a", params).unwrap();
        let state = apply(state, Alpha { node_id: 0, leaf_id: None }).unwrap();
        assert!(apply(state, Undo).is_err());
    }

    #[test]
    fn test_move_json_shape() {
        let json = r#"{"type":"smtab-nu","nodeID":3,"prefix":1}"#;
        let mv: ModalMove = serde_json::from_str(json).unwrap();
        assert_eq!(mv, Nu { node_id: 3, leaf_id: None, prefix: 1 });
    }
}
