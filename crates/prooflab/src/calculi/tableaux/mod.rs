//! Clause tableaux
//!
//! The propositional and first-order variants share the node type and the
//! structural checks on expansion and closure; they differ in how two
//! literals are matched.

pub mod first_order;
pub mod propositional;

pub use first_order::FoTableaux;
pub use propositional::PropTableaux;

use crate::calculus::CloseMessage;
use crate::clause::{Atom, Clause};
use crate::config::TableauxType;
use crate::error::{LogicError, Result};
use crate::seal::encode_opt;
use crate::tree::{ClosableNode, ProofTree, TreeNode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Spelling of the root node
pub const ROOT_SPELLING: &str = "true";

/// A tableaux node holding one literal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableauxNode<L> {
    pub parent: Option<usize>,
    pub spelling: L,
    pub negated: bool,
    pub is_closed: bool,
    pub close_ref: Option<usize>,
    pub children: Vec<usize>,
}

impl<L> TableauxNode<L> {
    pub fn new(spelling: L, negated: bool) -> Self {
        TableauxNode {
            parent: None,
            spelling,
            negated,
            is_closed: false,
            close_ref: None,
            children: Vec::new(),
        }
    }
}

impl<L: Clone> TableauxNode<L> {
    pub fn from_atom(atom: &Atom<L>) -> Self {
        TableauxNode::new(atom.lit().clone(), atom.negated())
    }
}

impl<L: fmt::Display> TableauxNode<L> {
    /// Canonical encoding for sealing
    pub fn encode(&self) -> String {
        let children: Vec<String> = self.children.iter().map(ToString::to_string).collect();
        format!(
            "({}|{}|{}|{}|[{}])",
            encode_opt(self.parent),
            self,
            self.is_closed,
            encode_opt(self.close_ref),
            children.join(",")
        )
    }
}

impl<L: fmt::Display> fmt::Display for TableauxNode<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "!")?;
        }
        write!(f, "{}", self.spelling)
    }
}

impl<L> TreeNode for TableauxNode<L> {
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

impl<L> ClosableNode for TableauxNode<L> {
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

pub type TableauxTree<L> = ProofTree<TableauxNode<L>>;

/// `leaf` exists, is a leaf and is still open
pub(crate) fn check_open_leaf<L>(tree: &TableauxTree<L>, leaf: usize) -> Result<()> {
    let node = tree.node(leaf)?;
    if !node.is_leaf() {
        return Err(LogicError::illegal(format!("Node {} is not a leaf", leaf)));
    }
    if node.is_closed {
        return Err(LogicError::illegal(format!("Node {} is already closed", leaf)));
    }
    Ok(())
}

/// No atom of `clause` may repeat a literal already on the branch of `leaf`
pub(crate) fn check_regular_expansion<L: PartialEq + fmt::Display>(
    tree: &TableauxTree<L>,
    leaf: usize,
    clause: &Clause<L>,
) -> Result<()> {
    let branch = tree.branch_of(leaf);
    for atom in clause.atoms() {
        let duplicate = branch.iter().skip(1).any(|&id| {
            let node = &tree.nodes()[id];
            node.spelling == *atom.lit() && node.negated == atom.negated()
        });
        if duplicate {
            return Err(LogicError::illegal(format!(
                "Expanding this clause would introduce a duplicate node '{}' on the branch, \
                 making the tree irregular",
                atom
            )));
        }
    }
    Ok(())
}

/// No node may repeat a literal of one of its ancestors
pub(crate) fn check_regular_tree<L: PartialEq + fmt::Display>(
    tree: &TableauxTree<L>,
) -> Result<()> {
    for (id, node) in tree.iter().enumerate().skip(1) {
        let mut current = node.parent;
        while let Some(p) = current {
            if p == 0 {
                break;
            }
            let ancestor = &tree.nodes()[p];
            if ancestor.spelling == node.spelling && ancestor.negated == node.negated {
                return Err(LogicError::illegal(format!(
                    "Node {} '{}' duplicates its ancestor {}, making the tree irregular",
                    id, node, p
                )));
            }
            current = ancestor.parent;
        }
    }
    Ok(())
}

/// Connectedness restrictions on expanding `leaf` with `clause`.
///
/// `connects` decides whether two literals of opposite polarity can close.
pub(crate) fn check_connectedness<L: fmt::Display>(
    tree: &TableauxTree<L>,
    tableaux_type: TableauxType,
    leaf: usize,
    clause: &Clause<L>,
    connects: impl Fn(&L, &L) -> bool,
) -> Result<()> {
    if !tableaux_type.is_connected() {
        return Ok(());
    }

    if tableaux_type == TableauxType::StronglyConnected {
        check_strongly_connected(tree)?;
    }

    if leaf == 0 {
        return Ok(());
    }
    let node = &tree.nodes()[leaf];
    let connected = clause
        .atoms()
        .iter()
        .any(|a| a.negated() != node.negated && connects(a.lit(), &node.spelling));
    if !connected {
        return Err(LogicError::illegal(format!(
            "No literal in clause {} can close with leaf '{}', \
             the expansion would leave the tree unconnected",
            clause, node
        )));
    }
    Ok(())
}

/// Every inner node except the root has a child closed against it
fn check_strongly_connected<L>(tree: &TableauxTree<L>) -> Result<()> {
    for (id, node) in tree.iter().enumerate().skip(1) {
        if node.is_leaf() {
            continue;
        }
        let has_closed_child = node.children.iter().any(|&c| {
            let child = &tree.nodes()[c];
            child.is_closed && child.close_ref == Some(id)
        });
        if !has_closed_child {
            return Err(LogicError::illegal(format!(
                "Node {} has no child closed against it, \
                 close it before expanding further to keep the tree strongly connected",
                id
            )));
        }
    }
    Ok(())
}

/// Structural preconditions of a close move between `leaf` and `node`
pub(crate) fn check_close_pair<L: fmt::Display>(
    tree: &TableauxTree<L>,
    leaf: usize,
    node: usize,
) -> Result<()> {
    check_open_leaf(tree, leaf)?;
    let target = tree.node(node)?;
    if node == 0 {
        return Err(LogicError::illegal("The root node cannot be used for branch closure"));
    }
    if !tree.is_ancestor_of(node, leaf) {
        return Err(LogicError::illegal(format!(
            "Node {} is not an ancestor of leaf {}",
            node, leaf
        )));
    }
    let leaf_node = &tree.nodes()[leaf];
    if leaf_node.negated == target.negated {
        return Err(LogicError::illegal(format!(
            "Leaf '{}' and node '{}' have the same polarity",
            leaf_node, target
        )));
    }
    Ok(())
}

/// Record the closure of `leaf` against `node`
pub(crate) fn close_branch<L>(tree: &mut TableauxTree<L>, leaf: usize, node: usize) -> Result<()> {
    tree.node_mut(leaf)?.close_ref = Some(node);
    tree.set_closed(leaf);
    Ok(())
}

/// Add one child per atom of `clause` below `leaf`
pub(crate) fn expand_leaf<L: Clone>(tree: &mut TableauxTree<L>, leaf: usize, clause: &Clause<L>) {
    tree.add_children(leaf, clause.atoms().iter().map(TableauxNode::from_atom));
}

pub(crate) fn close_message<L>(tree: &TableauxTree<L>) -> CloseMessage {
    if tree.is_closed() {
        CloseMessage::new(true, "The proof tree has been successfully closed")
    } else {
        CloseMessage::new(false, "The proof tree is not closed")
    }
}
