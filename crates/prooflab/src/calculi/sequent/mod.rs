//! Sequent calculus
//!
//! A node holds a sequent `Γ ⊢ Δ`. Rules decompose one formula of an open
//! leaf into one or two child sequents; a leaf is closed by the axiom rule
//! once some formula occurs on both sides.

pub mod first_order;
pub mod propositional;

use crate::calculus::{Calculus, CloseMessage};
use crate::config::NoParams;
use crate::error::{LogicError, Result};
use crate::logic::Formula;
use crate::misc::log::targets;
use crate::parser::{parse_sequent, Dialect};
use crate::seal::{encode_list, encode_opt, ProtectedState};
use crate::tree::{ClosableNode, ProofTree, TreeNode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

/// Distinguishes the propositional and first-order sequent calculi
pub trait SequentVariant {
    const IDENTIFIER: &'static str;
    const DIALECT: Dialect;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Propositional;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FirstOrder;

impl SequentVariant for Propositional {
    const IDENTIFIER: &'static str = "prop-sequent";
    const DIALECT: Dialect = Dialect::Propositional;
}

impl SequentVariant for FirstOrder {
    const IDENTIFIER: &'static str = "fo-sequent";
    const DIALECT: Dialect = Dialect::FirstOrder;
}

pub struct SequentCalculus<V>(PhantomData<V>);

pub type PropSequent = SequentCalculus<Propositional>;
pub type FoSequent = SequentCalculus<FirstOrder>;

/// Left and right side of a sequent
pub type Sequent = (Vec<Formula>, Vec<Formula>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequentNode {
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub left_formulas: Vec<Formula>,
    pub right_formulas: Vec<Formula>,
    pub is_closed: bool,
    /// Name of the rule that produced this node, `None` for the root
    pub rule: Option<String>,
}

impl SequentNode {
    pub fn new(
        left_formulas: Vec<Formula>,
        right_formulas: Vec<Formula>,
        rule: Option<String>,
    ) -> Self {
        SequentNode {
            parent: None,
            children: Vec::new(),
            left_formulas,
            right_formulas,
            is_closed: false,
            rule,
        }
    }

    fn encode(&self) -> String {
        format!(
            "({}|{}|{}|{}|{}|{})",
            encode_opt(self.parent),
            encode_list(&self.children, ToString::to_string),
            self.is_closed,
            self.rule.as_deref().unwrap_or("null"),
            encode_list(&self.left_formulas, Formula::encode),
            encode_list(&self.right_formulas, Formula::encode)
        )
    }
}

impl fmt::Display for SequentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |formulas: &[Formula]| {
            formulas.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        };
        write!(f, "{} ⊢ {}", side(&self.left_formulas), side(&self.right_formulas))
    }
}

impl TreeNode for SequentNode {
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
}

impl ClosableNode for SequentNode {
    fn is_closed(&self) -> bool {
        self.is_closed
    }

    fn set_closed_flag(&mut self, closed: bool) {
        self.is_closed = closed;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequentState<V> {
    pub tree: ProofTree<SequentNode>,
    pub move_history: Vec<SequentMove>,
    #[serde(skip)]
    variant: PhantomData<V>,
}

impl<V> SequentState<V> {
    pub fn new(left: Vec<Formula>, right: Vec<Formula>) -> Self {
        SequentState {
            tree: ProofTree::new(SequentNode::new(left, right, None)),
            move_history: Vec::new(),
            variant: PhantomData,
        }
    }

    fn initial(&self) -> Self {
        let root = &self.tree.nodes()[0];
        SequentState::new(root.left_formulas.clone(), root.right_formulas.clone())
    }
}

impl<V: SequentVariant> ProtectedState for SequentState<V> {
    const SEAL_DOMAIN: &'static str = V::IDENTIFIER;

    fn canonical_info(&self) -> String {
        format!(
            "{}|{}",
            encode_list(self.tree.nodes(), SequentNode::encode),
            encode_list(&self.move_history, ToString::to_string)
        )
    }
}

/// Moves of both sequent calculi; the quantifier rules are rejected by the
/// propositional one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SequentMove {
    #[serde(rename = "notLeft")]
    NotLeft {
        #[serde(rename = "nodeID")]
        node_id: usize,
        #[serde(rename = "listIndex")]
        list_index: usize,
    },
    #[serde(rename = "notRight")]
    NotRight {
        #[serde(rename = "nodeID")]
        node_id: usize,
        #[serde(rename = "listIndex")]
        list_index: usize,
    },
    #[serde(rename = "andLeft")]
    AndLeft {
        #[serde(rename = "nodeID")]
        node_id: usize,
        #[serde(rename = "listIndex")]
        list_index: usize,
    },
    #[serde(rename = "andRight")]
    AndRight {
        #[serde(rename = "nodeID")]
        node_id: usize,
        #[serde(rename = "listIndex")]
        list_index: usize,
    },
    #[serde(rename = "orLeft")]
    OrLeft {
        #[serde(rename = "nodeID")]
        node_id: usize,
        #[serde(rename = "listIndex")]
        list_index: usize,
    },
    #[serde(rename = "orRight")]
    OrRight {
        #[serde(rename = "nodeID")]
        node_id: usize,
        #[serde(rename = "listIndex")]
        list_index: usize,
    },
    #[serde(rename = "impLeft")]
    ImpLeft {
        #[serde(rename = "nodeID")]
        node_id: usize,
        #[serde(rename = "listIndex")]
        list_index: usize,
    },
    #[serde(rename = "impRight")]
    ImpRight {
        #[serde(rename = "nodeID")]
        node_id: usize,
        #[serde(rename = "listIndex")]
        list_index: usize,
    },
    #[serde(rename = "allLeft")]
    AllLeft {
        #[serde(rename = "nodeID")]
        node_id: usize,
        #[serde(rename = "listIndex")]
        list_index: usize,
        #[serde(rename = "varAssign")]
        var_assign: BTreeMap<String, String>,
    },
    #[serde(rename = "allRight")]
    AllRight {
        #[serde(rename = "nodeID")]
        node_id: usize,
        #[serde(rename = "listIndex")]
        list_index: usize,
        #[serde(rename = "varAssign")]
        var_assign: BTreeMap<String, String>,
    },
    #[serde(rename = "exLeft")]
    ExLeft {
        #[serde(rename = "nodeID")]
        node_id: usize,
        #[serde(rename = "listIndex")]
        list_index: usize,
        #[serde(rename = "varAssign")]
        var_assign: BTreeMap<String, String>,
    },
    #[serde(rename = "exRight")]
    ExRight {
        #[serde(rename = "nodeID")]
        node_id: usize,
        #[serde(rename = "listIndex")]
        list_index: usize,
        #[serde(rename = "varAssign")]
        var_assign: BTreeMap<String, String>,
    },
    #[serde(rename = "Ax")]
    Axiom {
        #[serde(rename = "nodeID")]
        node_id: usize,
    },
    #[serde(rename = "prune")]
    Prune {
        #[serde(rename = "nodeID")]
        node_id: usize,
    },
    #[serde(rename = "undo")]
    Undo,
}

impl fmt::Display for SequentMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use SequentMove::*;
        match self {
            NotLeft { node_id, list_index }
            | NotRight { node_id, list_index }
            | AndLeft { node_id, list_index }
            | AndRight { node_id, list_index }
            | OrLeft { node_id, list_index }
            | OrRight { node_id, list_index }
            | ImpLeft { node_id, list_index }
            | ImpRight { node_id, list_index } => {
                write!(f, "{}({},{})", self.rule_name(), node_id, list_index)
            }
            AllLeft { node_id, list_index, var_assign }
            | AllRight { node_id, list_index, var_assign }
            | ExLeft { node_id, list_index, var_assign }
            | ExRight { node_id, list_index, var_assign } => write!(
                f,
                "{}({},{},{})",
                self.rule_name(),
                node_id,
                list_index,
                super::encode_var_assign(var_assign)
            ),
            Axiom { node_id } | Prune { node_id } => write!(f, "{}({})", self.rule_name(), node_id),
            Undo => write!(f, "undo"),
        }
    }
}

impl SequentMove {
    pub fn rule_name(&self) -> &'static str {
        use SequentMove::*;
        match self {
            NotLeft { .. } => "notLeft",
            NotRight { .. } => "notRight",
            AndLeft { .. } => "andLeft",
            AndRight { .. } => "andRight",
            OrLeft { .. } => "orLeft",
            OrRight { .. } => "orRight",
            ImpLeft { .. } => "impLeft",
            ImpRight { .. } => "impRight",
            AllLeft { .. } => "allLeft",
            AllRight { .. } => "allRight",
            ExLeft { .. } => "exLeft",
            ExRight { .. } => "exRight",
            Axiom { .. } => "Ax",
            Prune { .. } => "prune",
            Undo => "undo",
        }
    }
}

impl<V: SequentVariant> Calculus for SequentCalculus<V> {
    const IDENTIFIER: &'static str = V::IDENTIFIER;

    type Params = NoParams;
    type State = SequentState<V>;
    type Move = SequentMove;

    fn parse_formula(formula: &str, _params: NoParams) -> Result<SequentState<V>> {
        let (left, right) = parse_sequent(formula, V::DIALECT)?;
        let left = left.iter().map(Formula::eliminate_equivalences).collect();
        let right = right.iter().map(Formula::eliminate_equivalences).collect();
        Ok(SequentState::new(left, right))
    }

    fn apply_move(mut state: SequentState<V>, mv: SequentMove) -> Result<SequentState<V>> {
        use SequentMove::*;
        let (node_id, children) = match &mv {
            NotLeft { node_id, list_index }
            | NotRight { node_id, list_index }
            | AndLeft { node_id, list_index }
            | AndRight { node_id, list_index }
            | OrLeft { node_id, list_index }
            | OrRight { node_id, list_index }
            | ImpLeft { node_id, list_index }
            | ImpRight { node_id, list_index } => {
                let node = open_leaf(&state.tree, *node_id)?;
                (*node_id, propositional::apply_rule(node, &mv, *list_index)?)
            }
            AllLeft { node_id, list_index, var_assign }
            | AllRight { node_id, list_index, var_assign }
            | ExLeft { node_id, list_index, var_assign }
            | ExRight { node_id, list_index, var_assign } => {
                if V::DIALECT != Dialect::FirstOrder {
                    return Err(LogicError::illegal(format!(
                        "Rule {} is not available in propositional sequent calculus",
                        mv.rule_name()
                    )));
                }
                let node = open_leaf(&state.tree, *node_id)?;
                (*node_id, first_order::apply_rule(node, &mv, *list_index, var_assign)?)
            }
            Axiom { node_id } => {
                axiom(&mut state.tree, *node_id)?;
                state.move_history.push(mv);
                return Ok(state);
            }
            Prune { node_id } => {
                state.tree.node(*node_id)?;
                state.tree.prune_and_reopen(*node_id);
                state.move_history.push(mv);
                return Ok(state);
            }
            Undo => return undo(state),
        };

        let rule = mv.rule_name().to_string();
        for (left, right) in children {
            state
                .tree
                .add_child(node_id, SequentNode::new(left, right, Some(rule.clone())));
        }
        log::debug!(target: targets::CALCULUS, "{} applied {}", V::IDENTIFIER, mv);
        state.move_history.push(mv);
        Ok(state)
    }

    fn check_close(state: &SequentState<V>) -> CloseMessage {
        if state.tree.is_closed() {
            CloseMessage::new(true, "The proof tree has been successfully closed")
        } else {
            CloseMessage::new(false, "The proof tree is not closed")
        }
    }
}

/// `id` exists, is a leaf and is still open
fn open_leaf(tree: &ProofTree<SequentNode>, id: usize) -> Result<&SequentNode> {
    let node = tree.node(id)?;
    if !node.is_leaf() {
        return Err(LogicError::illegal(format!("Node {} is not a leaf", id)));
    }
    if node.is_closed {
        return Err(LogicError::illegal(format!("Node {} is already closed", id)));
    }
    Ok(node)
}

/// Close `id` with an axiom child if some formula occurs on both sides
fn axiom(tree: &mut ProofTree<SequentNode>, id: usize) -> Result<()> {
    let node = open_leaf(tree, id)?;
    let applicable = node
        .left_formulas
        .iter()
        .any(|l| node.right_formulas.contains(l));
    if !applicable {
        return Err(LogicError::illegal(format!(
            "The axiom rule is not applicable to '{}', no formula occurs on both sides",
            node
        )));
    }
    let child = SequentNode::new(
        node.left_formulas.clone(),
        node.right_formulas.clone(),
        Some("Ax".to_string()),
    );
    let child_id = tree.add_child(id, child);
    tree.set_closed(child_id);
    Ok(())
}

fn undo<V: SequentVariant>(state: SequentState<V>) -> Result<SequentState<V>> {
    let mut history = state.move_history.clone();
    if history.pop().is_none() {
        return Err(LogicError::illegal("Can't undo in initial state"));
    }
    let mut replay = state.initial();
    for mv in history {
        replay = SequentCalculus::<V>::apply_move(replay, mv)?;
    }
    Ok(replay)
}

/// Formula at `index` of one side of a sequent
pub(crate) fn formula_at<'a>(
    formulas: &'a [Formula],
    index: usize,
    side: &str,
) -> Result<&'a Formula> {
    formulas.get(index).ok_or_else(|| {
        LogicError::illegal(format!(
            "There is no formula at index {} on the {} side",
            index, side
        ))
    })
}

/// `formulas` with the entry at `index` replaced by `replacement`
pub(crate) fn replace_at(
    formulas: &[Formula],
    index: usize,
    replacement: Vec<Formula>,
) -> Vec<Formula> {
    let mut result = formulas[..index].to_vec();
    result.extend(replacement);
    result.extend_from_slice(&formulas[index + 1..]);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use SequentMove::*;

    fn start(formula: &str) -> SequentState<Propositional> {
        PropSequent::parse_formula(formula, NoParams::default()).unwrap()
    }

    fn apply(
        state: SequentState<Propositional>,
        mv: SequentMove,
    ) -> Result<SequentState<Propositional>> {
        PropSequent::apply_move(state, mv)
    }

    #[test]
    fn test_parse_eliminates_equivalences() {
        let state = start("a <-> a");
        let root = &state.tree.nodes()[0];
        assert!(root.left_formulas.is_empty());
        assert_eq!(root.right_formulas[0].to_string(), "((a → a) ∧ (a → a))");
    }

    #[test]
    fn test_prove_excluded_middle() {
        let state = start("a | !a");
        let state = apply(state, OrRight { node_id: 0, list_index: 0 }).unwrap();
        let state = apply(state, NotRight { node_id: 1, list_index: 1 }).unwrap();
        assert_eq!(state.tree.nodes()[2].to_string(), "a ⊢ a");
        let state = apply(state, Axiom { node_id: 2 }).unwrap();
        assert!(PropSequent::check_close(&state).closed);
    }

    #[test]
    fn test_axiom_requires_shared_formula() {
        let state = start("a |- b");
        assert!(apply(state, Axiom { node_id: 0 }).is_err());
    }

    #[test]
    fn test_rules_only_on_open_leaves() {
        let state = start("a -> a");
        let state = apply(state, ImpRight { node_id: 0, list_index: 0 }).unwrap();
        assert!(apply(state.clone(), ImpRight { node_id: 0, list_index: 0 }).is_err());
        assert!(apply(state, NotLeft { node_id: 1, list_index: 0 }).is_err());
    }

    #[test]
    fn test_quantifier_rules_rejected() {
        let state = start("a");
        let mv = AllLeft { node_id: 0, list_index: 0, var_assign: BTreeMap::new() };
        assert!(matches!(apply(state, mv), Err(LogicError::IllegalMove(_))));
    }

    #[test]
    fn test_prune_reopens() {
        let state = start("a & b |- a");
        let state = apply(state, AndLeft { node_id: 0, list_index: 0 }).unwrap();
        let state = apply(state, Axiom { node_id: 1 }).unwrap();
        assert!(state.tree.is_closed());
        let state = apply(state, Prune { node_id: 0 }).unwrap();
        assert_eq!(state.tree.len(), 1);
        assert!(!state.tree.is_closed());
    }

    #[test]
    fn test_undo() {
        let state = start("a & b |- a");
        let one = apply(state, AndLeft { node_id: 0, list_index: 0 }).unwrap();
        let two = apply(one.clone(), Axiom { node_id: 1 }).unwrap();
        assert_eq!(apply(two, Undo).unwrap(), one);
    }

    #[test]
    fn test_move_json_shape() {
        let json = r#"{"type":"andLeft","nodeID":0,"listIndex":1}"#;
        let mv: SequentMove = serde_json::from_str(json).unwrap();
        assert_eq!(mv, AndLeft { node_id: 0, list_index: 1 });
        let mv: SequentMove = serde_json::from_str(r#"{"type":"Ax","nodeID":3}"#).unwrap();
        assert_eq!(mv, Axiom { node_id: 3 });
    }
}
