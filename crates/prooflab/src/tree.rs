//! Index-addressed proof trees shared by every tree-shaped calculus.
//!
//! Nodes live in one vector and refer to each other by index. The root is
//! node 0 and children are always appended, so a child's index is larger
//! than its parent's.

use crate::error::{LogicError, Result};
use serde::{de, Deserialize, Deserializer, Serialize};

/// Structural accessors every proof tree node provides
pub trait TreeNode {
    fn parent(&self) -> Option<usize>;
    fn set_parent(&mut self, parent: Option<usize>);
    fn children(&self) -> &[usize];
    fn children_mut(&mut self) -> &mut Vec<usize>;

    /// Renumber node references other than parent and children, e.g. close
    /// references. `remap` returns `None` for removed nodes.
    fn remap_references(&mut self, _remap: &dyn Fn(usize) -> Option<usize>) {}

    /// Node references other than parent and children
    fn references(&self) -> Vec<usize> {
        Vec::new()
    }

    fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }
}

/// Nodes carrying a closed flag
pub trait ClosableNode: TreeNode {
    fn is_closed(&self) -> bool;
    fn set_closed_flag(&mut self, closed: bool);
}

/// Deserialization checks the structure with [`ProofTree::validate`], so
/// index operations on a tree read from JSON stay in bounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProofTree<N> {
    nodes: Vec<N>,
}

impl<'de, N: TreeNode + Deserialize<'de>> Deserialize<'de> for ProofTree<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let tree = ProofTree {
            nodes: Vec::<N>::deserialize(deserializer)?,
        };
        tree.validate().map_err(|e| match e {
            LogicError::JsonParse(msg) => <D::Error as de::Error>::custom(msg),
            other => <D::Error as de::Error>::custom(other),
        })?;
        Ok(tree)
    }
}

impl<N> ProofTree<N> {
    pub fn new(root: N) -> Self {
        ProofTree { nodes: vec![root] }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[N] {
        &self.nodes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, N> {
        self.nodes.iter()
    }

    pub fn get(&self, id: usize) -> Option<&N> {
        self.nodes.get(id)
    }

    /// Node by id, or an `IllegalMove` naming the missing id
    pub fn node(&self, id: usize) -> Result<&N> {
        self.nodes
            .get(id)
            .ok_or_else(|| LogicError::illegal(format!("Node with ID {} does not exist", id)))
    }

    pub fn node_mut(&mut self, id: usize) -> Result<&mut N> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| LogicError::illegal(format!("Node with ID {} does not exist", id)))
    }
}

impl<N: TreeNode> ProofTree<N> {
    /// Check the arena invariants: node 0 is the only root, every parent has
    /// a smaller index and lists the node exactly once among its children,
    /// and every other reference points at an existing node.
    pub fn validate(&self) -> Result<()> {
        let invalid =
            |msg: String| Err(LogicError::JsonParse(format!("Invalid proof tree: {}", msg)));
        let len = self.nodes.len();
        if len == 0 {
            return invalid("the tree has no root".to_string());
        }

        let mut listed = 0;
        for (id, node) in self.nodes.iter().enumerate() {
            match (id, node.parent()) {
                (0, None) => {}
                (0, Some(p)) => return invalid(format!("the root has parent {}", p)),
                (_, None) => return invalid(format!("node {} has no parent", id)),
                (_, Some(p)) if p >= id => {
                    return invalid(format!(
                        "node {} has parent {}, which does not precede it",
                        id, p
                    ));
                }
                (_, Some(p)) => {
                    if !self.nodes[p].children().contains(&id) {
                        return invalid(format!(
                            "node {} is missing from the children of {}",
                            id, p
                        ));
                    }
                }
            }

            for &child in node.children() {
                if child >= len {
                    return invalid(format!(
                        "node {} lists child {}, which does not exist",
                        id, child
                    ));
                }
                if self.nodes[child].parent() != Some(id) {
                    return invalid(format!("node {} lists child {} of another parent", id, child));
                }
            }
            listed += node.children().len();

            if let Some(r) = node.references().into_iter().find(|&r| r >= len) {
                return invalid(format!("node {} refers to node {}, which does not exist", id, r));
            }
        }

        // Every non-root node is listed by its parent, so any surplus is a duplicate
        if listed != len - 1 {
            return invalid("a child is listed more than once".to_string());
        }
        Ok(())
    }

    /// Append `node` below `parent` and return its index
    pub fn add_child(&mut self, parent: usize, mut node: N) -> usize {
        let idx = self.nodes.len();
        node.set_parent(Some(parent));
        node.children_mut().clear();
        self.nodes.push(node);
        self.nodes[parent].children_mut().push(idx);
        idx
    }

    pub fn add_children(
        &mut self,
        parent: usize,
        nodes: impl IntoIterator<Item = N>,
    ) -> Vec<usize> {
        nodes.into_iter().map(|n| self.add_child(parent, n)).collect()
    }

    pub fn is_leaf(&self, id: usize) -> bool {
        self.nodes.get(id).map_or(false, |n| n.is_leaf())
    }

    /// All transitive descendants of `id` in breadth-first order
    pub fn descendants(&self, id: usize) -> Vec<usize> {
        let mut result = Vec::new();
        let mut queue: Vec<usize> = self.nodes[id].children().to_vec();
        let mut next = 0;
        while next < queue.len() {
            let idx = queue[next];
            next += 1;
            result.push(idx);
            queue.extend_from_slice(self.nodes[idx].children());
        }
        result
    }

    /// Leaves reachable from `id`; `id` itself if it is a leaf
    pub fn child_leaves_of(&self, id: usize) -> Vec<usize> {
        let mut leaves = Vec::new();
        let mut stack = vec![id];
        while let Some(idx) = stack.pop() {
            let children = self.nodes[idx].children();
            if children.is_empty() {
                leaves.push(idx);
            } else {
                stack.extend(children.iter().rev());
            }
        }
        leaves
    }

    /// `ancestor` lies strictly above `node`
    pub fn is_ancestor_of(&self, ancestor: usize, node: usize) -> bool {
        let mut current = self.nodes.get(node).and_then(TreeNode::parent);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.nodes[p].parent();
        }
        false
    }

    /// Indices on the path from the root down to `id`, inclusive
    pub fn branch_of(&self, id: usize) -> Vec<usize> {
        let mut branch = vec![id];
        let mut current = self.nodes[id].parent();
        while let Some(p) = current {
            branch.push(p);
            current = self.nodes[p].parent();
        }
        branch.reverse();
        branch
    }

    /// Remove every descendant of `id`, keeping `id` itself.
    ///
    /// Remaining nodes are renumbered and children lists are rebuilt from
    /// the parent pointers.
    pub fn prune_branch(&mut self, id: usize) {
        let mut removed = vec![false; self.nodes.len()];
        let descendants = self.descendants(id);
        if descendants.is_empty() {
            return;
        }
        for d in descendants {
            removed[d] = true;
        }

        let mut new_index = vec![None; self.nodes.len()];
        let mut next = 0;
        for (old, gone) in removed.iter().enumerate() {
            if !gone {
                new_index[old] = Some(next);
                next += 1;
            }
        }
        let remap = |old: usize| new_index.get(old).copied().flatten();

        let old_nodes = std::mem::take(&mut self.nodes);
        for (old, mut node) in old_nodes.into_iter().enumerate() {
            if removed[old] {
                continue;
            }
            let parent = node.parent().and_then(remap);
            node.set_parent(parent);
            node.remap_references(&remap);
            node.children_mut().clear();
            self.nodes.push(node);
        }

        for idx in 0..self.nodes.len() {
            if let Some(p) = self.nodes[idx].parent() {
                self.nodes[p].children_mut().push(idx);
            }
        }
    }
}

impl<N: ClosableNode> ProofTree<N> {
    /// Close `id`, every descendant, and every ancestor whose children are
    /// then all closed
    pub fn set_closed(&mut self, id: usize) {
        self.nodes[id].set_closed_flag(true);
        for d in self.descendants(id) {
            self.nodes[d].set_closed_flag(true);
        }

        let mut current = self.nodes[id].parent();
        while let Some(p) = current {
            let all_closed = self.nodes[p]
                .children()
                .iter()
                .all(|&c| self.nodes[c].is_closed());
            if !all_closed {
                break;
            }
            self.nodes[p].set_closed_flag(true);
            current = self.nodes[p].parent();
        }
    }

    /// Leaves keep their flag; inner nodes are closed iff all children are
    pub fn recompute_closure(&mut self) {
        for idx in (0..self.nodes.len()).rev() {
            if self.nodes[idx].is_leaf() {
                continue;
            }
            let closed = self.nodes[idx]
                .children()
                .iter()
                .all(|&c| self.nodes[c].is_closed());
            self.nodes[idx].set_closed_flag(closed);
        }
    }

    /// Prune below `id` and reopen whatever depended on the removed nodes
    pub fn prune_and_reopen(&mut self, id: usize) {
        self.prune_branch(id);
        if let Some(node) = self.nodes.get_mut(id) {
            node.set_closed_flag(false);
        }
        self.recompute_closure();
    }

    pub fn is_closed(&self) -> bool {
        self.nodes.first().map_or(false, ClosableNode::is_closed)
    }
}
