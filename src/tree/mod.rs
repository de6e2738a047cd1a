pub mod aggregate;
pub mod arena;

use std::collections::HashMap;

use compact_str::CompactString;

use self::arena::{GroupNode, GroupTree, IdGenerator, NodeId};
use crate::query::types::{Field, Row, Scalar};

/// Hashable identity of a grouping key.
/// Numbers compare by value (`-0.0 == 0.0`); `1` and `"1"` stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Null,
    Number(u64),
    Text(CompactString),
}

impl From<&Scalar> for GroupKey {
    fn from(value: &Scalar) -> Self {
        match value {
            Scalar::Null => GroupKey::Null,
            Scalar::Number(n) if *n == 0.0 => GroupKey::Number(0f64.to_bits()),
            Scalar::Number(n) if n.is_nan() => GroupKey::Number(f64::NAN.to_bits()),
            Scalar::Number(n) => GroupKey::Number(n.to_bits()),
            Scalar::Text(s) => GroupKey::Text(s.clone()),
        }
    }
}

/// Group a flat row set into a tree, one level per dimension field.
///
/// Every dimension but the last becomes a level of branches, created on first
/// occurrence so siblings keep the row order they were first seen in. Each row
/// is then attached as a leaf keyed by its last dimension value. With no
/// dimensions at all, the root wraps every row directly.
pub fn build_hierarchy(rows: &[Row], dimensions: &[Field], ids: &mut IdGenerator) -> GroupTree {
    let mut tree = GroupTree::new(ids.mint());
    tree.dimension_count = dimensions.len() as u16;

    if dimensions.is_empty() {
        tracing::warn!("Building hierarchy without dimensions; all rows hang off the root");
    }

    let branch_levels = dimensions.len().saturating_sub(1);
    let mut branch_map: HashMap<(NodeId, GroupKey), NodeId> = HashMap::new();

    for (row_index, row) in rows.iter().enumerate() {
        let mut parent = tree.root;
        for field in &dimensions[..branch_levels] {
            let key = row.value(&field.name);
            let lookup = (parent, GroupKey::from(key));
            parent = match branch_map.get(&lookup) {
                Some(&id) => id,
                None => {
                    let id = tree.add_child(parent, GroupNode::branch(key.clone(), ids.mint()));
                    branch_map.insert(lookup, id);
                    id
                }
            };
        }

        let leaf_key = dimensions
            .last()
            .map(|field| row.value(&field.name).clone())
            .unwrap_or(Scalar::Null);
        tree.add_child(parent, GroupNode::leaf(leaf_key, row_index, ids.mint()));
    }

    tracing::info!(
        "Hierarchy built: {} rows over {} dimensions → {} nodes ({} top-level groups)",
        rows.len(),
        dimensions.len(),
        tree.len(),
        tree.children(tree.root).count()
    );

    tree
}
