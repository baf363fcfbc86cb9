//! Interactive DPLL
//!
//! Every node stores the change it makes to its parent's clause set, so the
//! clause set of a branch is the root set with the diffs along the path
//! replayed. CLOSED and MODEL leaves are annotations added by propagation.

use crate::calculus::{Calculus, CloseMessage};
use crate::clause::{Atom, Clause, ClauseSet};
use crate::config::{ClauseSetParams, CnfConfig};
use crate::error::{LogicError, Result};
use crate::misc::log::targets;
use crate::parser::{parse_flexible, tokenize};
use crate::seal::{encode_list, encode_opt, ProtectedState};
use crate::tree::{ProofTree, TreeNode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub struct Dpll;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeType {
    Root,
    Prop,
    Split,
    Model,
    Closed,
}

impl NodeType {
    pub fn is_annotation(&self) -> bool {
        matches!(self, NodeType::Model | NodeType::Closed)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeType::Root => "ROOT",
            NodeType::Prop => "PROP",
            NodeType::Split => "SPLIT",
            NodeType::Model => "MODEL",
            NodeType::Closed => "CLOSED",
        };
        write!(f, "{}", name)
    }
}

/// Change a node applies to its parent's clause set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CsDiff {
    #[serde(rename = "cd-identity")]
    Identity,
    #[serde(rename = "cd-delclause")]
    RemoveClause { id: usize },
    #[serde(rename = "cd-addclause")]
    AddClause { clause: Clause<String> },
    #[serde(rename = "cd-delatom")]
    RemoveAtom { cid: usize, aid: usize },
}

impl CsDiff {
    pub fn apply(&self, mut clause_set: ClauseSet<String>) -> ClauseSet<String> {
        match self {
            CsDiff::Identity => {}
            CsDiff::RemoveClause { id } => {
                clause_set.remove(*id);
            }
            CsDiff::AddClause { clause } => clause_set.add(clause.clone()),
            CsDiff::RemoveAtom { cid, aid } => {
                clause_set.remove_atom(*cid, *aid);
            }
        }
        clause_set
    }
}

impl fmt::Display for CsDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CsDiff::Identity => write!(f, "identity"),
            CsDiff::RemoveClause { id } => write!(f, "remove-{}", id),
            CsDiff::AddClause { clause } => write!(f, "add-{}", clause),
            CsDiff::RemoveAtom { cid, aid } => write!(f, "remove-{}-{}", cid, aid),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DpllNode {
    pub parent: Option<usize>,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub label: String,
    pub diff: CsDiff,
    pub children: Vec<usize>,
    /// Set once a model leaf has been confirmed by an interpretation
    #[serde(rename = "modelVerified")]
    pub model_verified: Option<bool>,
}

impl DpllNode {
    pub fn new(node_type: NodeType, label: impl Into<String>, diff: CsDiff) -> Self {
        DpllNode {
            parent: None,
            node_type,
            label: label.into(),
            diff,
            children: Vec::new(),
            model_verified: None,
        }
    }

    pub fn is_annotation(&self) -> bool {
        self.node_type.is_annotation()
    }

    /// Inner nodes count as closed, leaves only if they are CLOSED
    pub fn is_closed(&self) -> bool {
        !self.is_leaf() || self.node_type == NodeType::Closed
    }

    fn encode(&self) -> String {
        let verified = match self.model_verified {
            Some(v) => v.to_string(),
            None => "null".to_string(),
        };
        format!(
            "({}|{}|{}|{}|{}|{})",
            encode_opt(self.parent),
            encode_list(&self.children, ToString::to_string),
            self.node_type,
            self.label,
            self.diff,
            verified
        )
    }
}

impl TreeNode for DpllNode {
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DpllState {
    pub clause_set: ClauseSet<String>,
    pub tree: ProofTree<DpllNode>,
}

impl DpllState {
    pub fn new(clause_set: ClauseSet<String>) -> Self {
        DpllState {
            clause_set,
            tree: ProofTree::new(DpllNode::new(NodeType::Root, "true", CsDiff::Identity)),
        }
    }

    /// Clause set at `branch`: the root set with every diff on the path applied
    pub fn clause_set_at(&self, branch: usize) -> ClauseSet<String> {
        self.tree
            .branch_of(branch)
            .into_iter()
            .fold(self.clause_set.clone(), |cs, id| self.tree.nodes()[id].diff.apply(cs))
    }
}

impl ProtectedState for DpllState {
    const SEAL_DOMAIN: &'static str = "dpll";

    fn canonical_info(&self) -> String {
        format!(
            "{}|{}",
            self.clause_set,
            encode_list(self.tree.nodes(), DpllNode::encode)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DpllMove {
    /// Case distinction on a variable below leaf `branch`
    #[serde(rename = "dpll-split")]
    Split { branch: usize, literal: String },
    /// Unit propagation of clause `base_id` into atom `atom_id` of `prop_id`
    #[serde(rename = "dpll-prop")]
    Propagate {
        branch: usize,
        #[serde(rename = "baseID")]
        base_id: usize,
        #[serde(rename = "propID")]
        prop_id: usize,
        #[serde(rename = "atomID")]
        atom_id: usize,
    },
    #[serde(rename = "dpll-prune")]
    Prune { branch: usize },
    #[serde(rename = "dpll-modelcheck")]
    ModelCheck {
        branch: usize,
        interpretation: BTreeMap<String, bool>,
    },
}

impl Calculus for Dpll {
    const IDENTIFIER: &'static str = "dpll";

    type Params = ClauseSetParams;
    type State = DpllState;
    type Move = DpllMove;

    fn parse_formula(formula: &str, params: ClauseSetParams) -> Result<DpllState> {
        let clause_set = parse_flexible(formula, &CnfConfig::with_strategy(params.cnf_strategy))?;
        Ok(DpllState::new(clause_set))
    }

    fn apply_move(state: DpllState, mv: DpllMove) -> Result<DpllState> {
        let state = match mv {
            DpllMove::Split { branch, literal } => split(state, branch, &literal)?,
            DpllMove::Propagate { branch, base_id, prop_id, atom_id } => {
                propagate(state, branch, base_id, prop_id, atom_id)?
            }
            DpllMove::Prune { branch } => prune(state, branch)?,
            DpllMove::ModelCheck { branch, interpretation } => {
                model_check(state, branch, &interpretation)?
            }
        };
        Ok(state)
    }

    fn check_close(state: &DpllState) -> CloseMessage {
        let closed = state.tree.iter().all(DpllNode::is_closed);
        let done = state.tree.iter().all(|n| !n.is_leaf() || n.is_annotation());
        match (closed, done) {
            (true, _) => CloseMessage::new(
                true,
                "The proof is closed and proves the unsatisfiability of the clause set",
            ),
            (false, true) => CloseMessage::new(
                false,
                "The proof is not closed - however, all branches are completed. \
                 The clause set is satisfiable.",
            ),
            (false, false) => CloseMessage::new(false, "The proof is not closed yet."),
        }
    }
}

/// `branch` is a leaf that is not an annotation
fn check_branch(state: &DpllState, branch: usize) -> Result<&DpllNode> {
    let node = state
        .tree
        .get(branch)
        .ok_or_else(|| LogicError::illegal(format!("Branch with ID {} does not exist", branch)))?;
    if !node.is_leaf() {
        return Err(LogicError::illegal(format!("ID {} does not reference a leaf", branch)));
    }
    if node.is_annotation() {
        return Err(LogicError::illegal(format!("Cannot expand annotation '{}'", node.label)));
    }
    Ok(node)
}

fn split(mut state: DpllState, branch: usize, literal: &str) -> Result<DpllState> {
    check_branch(&state, branch)?;
    let invalid = || LogicError::illegal(format!("Invalid variable name '{}'", literal));
    let tokens = tokenize(literal).map_err(|_| invalid())?;
    let variable = match tokens.as_slice() {
        [token] if token.kind.is_identifier() => token.spelling.clone(),
        _ => return Err(invalid()),
    };

    let positive = DpllNode::new(
        NodeType::Split,
        variable.clone(),
        CsDiff::AddClause { clause: Clause::new(vec![Atom::positive(variable.clone())]) },
    );
    let negative = DpllNode::new(
        NodeType::Split,
        format!("¬{}", variable),
        CsDiff::AddClause { clause: Clause::new(vec![Atom::negative(variable.clone())]) },
    );
    state.tree.add_children(branch, [positive, negative]);
    log::debug!(target: targets::CALCULUS, "split branch {} on {}", branch, variable);
    Ok(state)
}

fn propagate(
    mut state: DpllState,
    branch: usize,
    base_id: usize,
    prop_id: usize,
    atom_id: usize,
) -> Result<DpllState> {
    check_branch(&state, branch)?;
    let clause_set = state.clause_set_at(branch);

    let clause = |id: usize| {
        clause_set
            .clauses()
            .get(id)
            .ok_or_else(|| LogicError::illegal(format!("Clause set has no clause with ID {}", id)))
    };
    let base = clause(base_id)?;
    let prop = clause(prop_id)?;
    if base_id == prop_id {
        return Err(LogicError::illegal("Base and propagation clauses have to be different"));
    }
    let prop_atom = prop.atoms().get(atom_id).ok_or_else(|| {
        LogicError::illegal(format!("Clause '{}' has no atom with ID {}", prop, atom_id))
    })?;
    let base_atom = match base.atoms() {
        [atom] => atom,
        _ => {
            return Err(LogicError::illegal(format!(
                "Base clause {} may only have exactly one atom",
                base
            )))
        }
    };

    // A satisfied clause disappears, a falsified atom is dropped
    let diff = if base_atom == prop_atom {
        CsDiff::RemoveClause { id: prop_id }
    } else if base_atom.is_complement_of(prop_atom) {
        CsDiff::RemoveAtom { cid: prop_id, aid: atom_id }
    } else {
        return Err(LogicError::illegal(format!(
            "Selected atom '{}' is not compatible with '{}'",
            prop_atom, base_atom
        )));
    };

    let result = diff.apply(clause_set.clone());
    let prop_node = state.tree.add_child(branch, DpllNode::new(NodeType::Prop, "prop", diff));

    if result.contains_empty_clause() {
        state
            .tree
            .add_child(prop_node, DpllNode::new(NodeType::Closed, "closed", CsDiff::Identity));
    } else if is_model(&result) {
        state
            .tree
            .add_child(prop_node, DpllNode::new(NodeType::Model, "model", CsDiff::Identity));
    }
    log::debug!(
        target: targets::CALCULUS,
        "propagated clause {} into {} on branch {}",
        base_id,
        prop_id,
        branch
    );
    Ok(state)
}

/// Only unit clauses, each over a different variable
fn is_model(clause_set: &ClauseSet<String>) -> bool {
    let mut variables = BTreeSet::new();
    clause_set
        .clauses()
        .iter()
        .all(|c| matches!(c.atoms(), [atom] if variables.insert(atom.lit().clone())))
}

fn prune(mut state: DpllState, branch: usize) -> Result<DpllState> {
    let node = state
        .tree
        .get(branch)
        .ok_or_else(|| LogicError::illegal(format!("Branch with ID {} does not exist", branch)))?;
    if let [only] = node.children() {
        if state.tree.nodes()[*only].is_annotation() {
            return Err(LogicError::illegal(format!(
                "Cannot prune annotation below node {}",
                branch
            )));
        }
    }
    state.tree.prune_branch(branch);
    Ok(state)
}

fn model_check(
    mut state: DpllState,
    branch: usize,
    interpretation: &BTreeMap<String, bool>,
) -> Result<DpllState> {
    let node = state
        .tree
        .get(branch)
        .ok_or_else(|| LogicError::illegal(format!("Branch with ID {} does not exist", branch)))?;
    if node.node_type != NodeType::Model {
        return Err(LogicError::illegal(format!("Node '{}' is not a model node", node.label)));
    }
    if node.model_verified == Some(true) {
        return Err(LogicError::illegal("This node has already been checked"));
    }

    for clause in state.clause_set_at(branch).clauses() {
        let satisfied = clause
            .atoms()
            .iter()
            .any(|a| interpretation.get(a.lit()).map_or(false, |value| *value != a.negated()));
        if !satisfied {
            return Err(LogicError::illegal(format!(
                "The given interpretation does not satisfy any atom of clause {}",
                clause
            )));
        }
    }

    let node = state.tree.node_mut(branch)?;
    node.model_verified = Some(true);
    node.label = format!("{} ✓", node.label);
    Ok(state)
}
