use compact_str::CompactString;
use serde::Serialize;

use crate::query::types::Scalar;

/// Display text for a null grouping key.
pub const EMPTY_LABEL: &str = "(empty)";

/// Index into the arena `Vec<GroupNode>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifier used to correlate layout output with rendering elements.
/// Unique within one `IdGenerator`; not stable across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeUid(pub u64);

/// Monotonic id source. Never reset; each `mint` hands out a fresh id.
#[derive(Debug)]
pub struct IdGenerator {
    next: u64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn mint(&mut self) -> NodeUid {
        let id = NodeUid(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn minted(&self) -> u64 {
        self.next - 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Branch,
    /// Wraps exactly one input row (index into the caller's row slice).
    Leaf { row: usize },
}

/// A single node in the grouping tree, stored in a flat arena.
/// Uses sibling-list representation: each node has `first_child` and `next_sibling`.
#[derive(Debug, Clone)]
pub struct GroupNode {
    /// Grouping key (the dimension value at this level)
    pub key: Scalar,
    pub kind: NodeKind,
    pub uid: NodeUid,
    /// Parent node index (None for root)
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    /// Last child, so appends keep first-seen order
    pub last_child: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    /// Depth in the tree (root = 0)
    pub depth: u16,
    /// Sum of leaf primary values under this node
    pub size: f64,
    /// Weighted mean of the secondary measure; None when undefined
    pub color_metric: Option<f64>,
}

impl GroupNode {
    pub fn branch(key: Scalar, uid: NodeUid) -> Self {
        Self::with_kind(key, NodeKind::Branch, uid)
    }

    pub fn leaf(key: Scalar, row: usize, uid: NodeUid) -> Self {
        Self::with_kind(key, NodeKind::Leaf { row }, uid)
    }

    fn with_kind(key: Scalar, kind: NodeKind, uid: NodeUid) -> Self {
        Self {
            key,
            kind,
            uid,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            depth: 0,
            size: 0.0,
            color_metric: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    pub fn row(&self) -> Option<usize> {
        match self.kind {
            NodeKind::Leaf { row } => Some(row),
            NodeKind::Branch => None,
        }
    }

    /// Key as label text; null keys render as `EMPTY_LABEL`.
    pub fn display_key(&self) -> CompactString {
        self.key
            .display()
            .unwrap_or_else(|| CompactString::new(EMPTY_LABEL))
    }
}

/// The grouping tree stored as a flat arena of nodes.
#[derive(Debug, Clone)]
pub struct GroupTree {
    /// All nodes in contiguous memory; children always follow their parent
    pub nodes: Vec<GroupNode>,
    pub root: NodeId,
    /// Number of dimension fields the tree was grouped by
    pub dimension_count: u16,
}

impl GroupTree {
    /// Create an empty tree with a root branch.
    pub fn new(root_uid: NodeUid) -> Self {
        GroupTree {
            nodes: vec![GroupNode::branch(Scalar::Null, root_uid)],
            root: NodeId(0),
            dimension_count: 0,
        }
    }

    /// Append a child under the given parent. Returns the new node's ID.
    pub fn add_child(&mut self, parent: NodeId, mut node: GroupNode) -> NodeId {
        let new_id = NodeId(self.nodes.len() as u32);
        node.parent = Some(parent);
        node.depth = self.nodes[parent.index()].depth + 1;
        node.next_sibling = None;

        match self.nodes[parent.index()].last_child {
            Some(last) => self.nodes[last.index()].next_sibling = Some(new_id),
            None => self.nodes[parent.index()].first_child = Some(new_id),
        }
        self.nodes[parent.index()].last_child = Some(new_id);

        self.nodes.push(node);
        new_id
    }

    pub fn get(&self, id: NodeId) -> &GroupNode {
        &self.nodes[id.index()]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut GroupNode {
        &mut self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree is empty (only root).
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Iterate over children of a node in insertion order.
    pub fn children(&self, parent: NodeId) -> ChildIter<'_> {
        ChildIter {
            tree: self,
            current: self.nodes[parent.index()].first_child,
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// All leaves under `id` (inclusive), in depth-first insertion order.
    pub fn leaves(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if self.get(current).is_leaf() {
                out.push(current);
                continue;
            }
            let children: Vec<NodeId> = self.children(current).collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Nodes from the first level below root down to `id`.
    pub fn path(&self, id: NodeId) -> Vec<NodeId> {
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root {
                break;
            }
            parts.push(node);
            current = self.get(node).parent;
        }
        parts.reverse();
        parts
    }

    /// Ancestor one level below the root (the node itself at depth 1).
    pub fn top_level_ancestor(&self, id: NodeId) -> Option<NodeId> {
        self.path(id).first().copied()
    }

    /// Levels between each node and its deepest leaf (leaves = 0).
    pub fn heights(&self) -> Vec<u16> {
        let mut heights = vec![0u16; self.nodes.len()];
        // Children always have higher indices than their parents.
        for i in (1..self.nodes.len()).rev() {
            if let Some(parent) = self.nodes[i].parent {
                let h = heights[i] + 1;
                if h > heights[parent.index()] {
                    heights[parent.index()] = h;
                }
            }
        }
        heights
    }
}

/// Iterator over the children of a node.
pub struct ChildIter<'a> {
    tree: &'a GroupTree,
    current: Option<NodeId>,
}

impl<'a> Iterator for ChildIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.current?;
        self.current = self.tree.nodes[id.index()].next_sibling;
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_keep_insertion_order() {
        let mut ids = IdGenerator::new();
        let mut tree = GroupTree::new(ids.mint());
        let a = tree.add_child(tree.root, GroupNode::branch("a".into(), ids.mint()));
        let b = tree.add_child(tree.root, GroupNode::branch("b".into(), ids.mint()));
        let c = tree.add_child(a, GroupNode::leaf("c".into(), 0, ids.mint()));
        assert_eq!(tree.children(tree.root).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(tree.get(c).depth, 2);
        assert_eq!(tree.path(c), vec![a, c]);
        assert_eq!(tree.top_level_ancestor(c), Some(a));
        assert_eq!(tree.top_level_ancestor(tree.root), None);
        assert_eq!(tree.heights()[tree.root.index()], 2);
        assert_eq!(tree.heights()[b.index()], 0);
    }

    #[test]
    fn id_generator_never_repeats() {
        let mut ids = IdGenerator::new();
        let first = ids.mint();
        let second = ids.mint();
        assert_ne!(first, second);
        assert!(second.0 > first.0);
        assert_eq!(ids.minted(), 2);
    }

    #[test]
    fn null_key_uses_empty_marker() {
        let mut ids = IdGenerator::new();
        let node = GroupNode::branch(Scalar::Null, ids.mint());
        assert_eq!(node.display_key(), EMPTY_LABEL);
    }
}
