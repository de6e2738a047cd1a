use crate::layout::Layout;
use crate::query::types::Scalar;
use crate::tree::arena::{GroupTree, NodeId};

/// Direction of a keyboard focus move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusMove {
    /// Previous sibling in layout order
    Prev,
    /// Next sibling in layout order
    Next,
    FirstChild,
    Parent,
}

/// Keyboard focus. The root is never focusable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FocusState {
    pub node: Option<NodeId>,
}

impl FocusState {
    pub fn focused(&self) -> Option<NodeId> {
        self.node
    }

    pub fn set(&mut self, node: Option<NodeId>) {
        self.node = node;
    }

    pub fn clear(&mut self) {
        self.node = None;
    }

    /// Move focus. With nothing focused, any move lands on the first
    /// top-level node. Moves past either end of a sibling run, below a leaf
    /// or above the top level leave focus where it is.
    pub fn apply(&mut self, tree: &GroupTree, layout: &Layout, mv: FocusMove) {
        let Some(current) = self.node else {
            self.node = layout_children(tree, layout, tree.root).first().copied();
            return;
        };

        let target = match mv {
            FocusMove::Prev | FocusMove::Next => {
                let Some(parent) = tree.get(current).parent else {
                    return;
                };
                let siblings = layout_children(tree, layout, parent);
                let Some(pos) = siblings.iter().position(|&s| s == current) else {
                    return;
                };
                match mv {
                    FocusMove::Prev => pos.checked_sub(1).map(|i| siblings[i]),
                    _ => siblings.get(pos + 1).copied(),
                }
            }
            FocusMove::FirstChild => layout_children(tree, layout, current).first().copied(),
            FocusMove::Parent => tree.get(current).parent.filter(|&p| p != tree.root),
        };

        if let Some(target) = target {
            self.node = Some(target);
        }
    }

    /// Re-resolve focus against a rebuilt tree by matching the key path.
    /// Focus is dropped when the path no longer exists.
    pub fn carry_over(&self, old: &GroupTree, new: &GroupTree) -> FocusState {
        let node = self.node.and_then(|id| {
            let keys: Vec<&Scalar> = old.path(id).into_iter().map(|n| &old.get(n).key).collect();
            find_by_keys(new, &keys)
        });
        if self.node.is_some() && node.is_none() {
            tracing::debug!("Focused node no longer exists; clearing focus");
        }
        FocusState { node }
    }
}

/// Children of `parent` in the order the layout placed them.
pub fn layout_children(tree: &GroupTree, layout: &Layout, parent: NodeId) -> Vec<NodeId> {
    let mut children: Vec<(usize, NodeId)> = tree
        .children(parent)
        .filter_map(|c| layout.node_to_rect.get(&c).map(|&i| (i, c)))
        .collect();
    children.sort_unstable_by_key(|&(i, _)| i);
    children.into_iter().map(|(_, c)| c).collect()
}

fn find_by_keys(tree: &GroupTree, keys: &[&Scalar]) -> Option<NodeId> {
    let mut current = tree.root;
    for key in keys {
        current = tree.children(current).find(|&c| tree.get(c).key == **key)?;
    }
    (current != tree.root).then_some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{compute_layout, Bounds, LayoutConfig};
    use crate::query::types::{Cell, Field, Row};
    use crate::tree::aggregate::reduce;
    use crate::tree::arena::IdGenerator;
    use crate::tree::build_hierarchy;

    fn build(ids: &mut IdGenerator, entries: &[(&str, &str, f64)]) -> (GroupTree, Layout) {
        let rows: Vec<Row> = entries
            .iter()
            .map(|(a, b, m)| {
                Row::from_cells([("a", Cell::new(*a)), ("b", Cell::new(*b)), ("m", Cell::new(*m))])
            })
            .collect();
        let mut tree = build_hierarchy(&rows, &[Field::dimension("a"), Field::dimension("b")], ids);
        reduce(&mut tree, &rows, &Field::measure("m"), None);
        let layout = compute_layout(&tree, Bounds::new(400.0, 300.0), &LayoutConfig::default());
        (tree, layout)
    }

    fn key_of(tree: &GroupTree, focus: &FocusState) -> Scalar {
        tree.get(focus.node.unwrap()).key.clone()
    }

    #[test]
    fn arrows_walk_siblings_in_layout_order() {
        let mut ids = IdGenerator::new();
        let (tree, layout) = build(&mut ids, &[("small", "x", 1.0), ("big", "y", 9.0)]);
        let mut focus = FocusState::default();

        focus.apply(&tree, &layout, FocusMove::Next);
        assert_eq!(key_of(&tree, &focus), Scalar::text("big"));
        focus.apply(&tree, &layout, FocusMove::Next);
        assert_eq!(key_of(&tree, &focus), Scalar::text("small"));
        focus.apply(&tree, &layout, FocusMove::Next);
        assert_eq!(key_of(&tree, &focus), Scalar::text("small"));
        focus.apply(&tree, &layout, FocusMove::Prev);
        assert_eq!(key_of(&tree, &focus), Scalar::text("big"));
    }

    #[test]
    fn down_and_up_change_level() {
        let mut ids = IdGenerator::new();
        let (tree, layout) = build(&mut ids, &[("a", "x", 1.0), ("a", "y", 2.0)]);
        let mut focus = FocusState::default();
        focus.apply(&tree, &layout, FocusMove::FirstChild);
        focus.apply(&tree, &layout, FocusMove::FirstChild);
        assert_eq!(key_of(&tree, &focus), Scalar::text("y"));
        focus.apply(&tree, &layout, FocusMove::FirstChild);
        assert_eq!(key_of(&tree, &focus), Scalar::text("y"));
        focus.apply(&tree, &layout, FocusMove::Parent);
        assert_eq!(key_of(&tree, &focus), Scalar::text("a"));
        focus.apply(&tree, &layout, FocusMove::Parent);
        assert_eq!(key_of(&tree, &focus), Scalar::text("a"));
    }

    #[test]
    fn focus_survives_rebuild_by_key_path() {
        let mut ids = IdGenerator::new();
        let (old, old_layout) = build(&mut ids, &[("a", "x", 1.0), ("b", "y", 2.0)]);
        let (new, _) = build(&mut ids, &[("b", "y", 5.0), ("c", "z", 1.0)]);

        let mut focus = FocusState::default();
        focus.apply(&old, &old_layout, FocusMove::Next);
        focus.apply(&old, &old_layout, FocusMove::FirstChild);
        assert_eq!(key_of(&old, &focus), Scalar::text("y"));

        let carried = focus.carry_over(&old, &new);
        assert_eq!(key_of(&new, &carried), Scalar::text("y"));
        assert_eq!(new.get(carried.node.unwrap()).parent, new.children(new.root).next());

        let mut gone = FocusState::default();
        gone.set(old.children(old.root).next());
        assert_eq!(gone.carry_over(&old, &new).node, None);
    }
}
