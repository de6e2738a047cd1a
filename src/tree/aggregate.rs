use super::arena::GroupTree;
use crate::query::types::{Field, Row, Scalar};

/// Counts of leaf values that had to be coerced while sizing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReduceStats {
    /// Negative primary values clamped to 0
    pub clamped_negative: usize,
    /// Null, text or non-finite primary values sized as 0
    pub non_numeric: usize,
}

/// Sizing weight of a primary cell. Non-numeric and non-finite values
/// count as 0; negative values are clamped to 0.
pub fn sizing_value(value: &Scalar, stats: &mut ReduceStats) -> f64 {
    match value.as_number() {
        Some(n) if n.is_finite() && n >= 0.0 => n,
        Some(n) if n.is_finite() => {
            stats.clamped_negative += 1;
            0.0
        }
        _ => {
            stats.non_numeric += 1;
            0.0
        }
    }
}

/// Compute sizes and (optionally) weighted color metrics for every node.
pub fn reduce(
    tree: &mut GroupTree,
    rows: &[Row],
    primary: &Field,
    secondary: Option<&Field>,
) -> ReduceStats {
    let stats = aggregate_sizes(tree, rows, primary);
    if let Some(secondary) = secondary {
        aggregate_color_metric(tree, rows, secondary);
    }

    if stats.clamped_negative > 0 || stats.non_numeric > 0 {
        tracing::warn!(
            "Sizing '{}': {} negative values clamped, {} non-numeric values counted as 0",
            primary.name,
            stats.clamped_negative,
            stats.non_numeric
        );
    }
    stats
}

/// Compute aggregated sizes bottom-up.
/// After this, each branch's `size` equals the sum of its children's sizes.
pub fn aggregate_sizes(tree: &mut GroupTree, rows: &[Row], primary: &Field) -> ReduceStats {
    let mut stats = ReduceStats::default();

    // Children always have higher indices than their parents in the arena,
    // so a reverse sweep visits every child before its parent.
    let len = tree.nodes.len();
    for i in (0..len).rev() {
        let size = match tree.nodes[i].row() {
            Some(row) => sizing_value(rows[row].value(&primary.name), &mut stats),
            None => {
                let mut total = 0.0;
                let mut child = tree.nodes[i].first_child;
                while let Some(child_id) = child {
                    total += tree.nodes[child_id.index()].size;
                    child = tree.nodes[child_id.index()].next_sibling;
                }
                total
            }
        };
        tree.nodes[i].size = size;
    }

    stats
}

/// Weighted mean of the secondary measure over each subtree's leaves,
/// weighted by leaf size: `sum(w * v) / sum(w)`.
/// Leaves with a non-finite secondary value do not participate.
/// Nodes whose total weight is 0 get `None`.
///
/// Must run after `aggregate_sizes`.
pub fn aggregate_color_metric(tree: &mut GroupTree, rows: &[Row], secondary: &Field) {
    let len = tree.nodes.len();
    // (sum of weights, sum of weight * value)
    let mut sums = vec![(0.0f64, 0.0f64); len];

    for i in (0..len).rev() {
        if let Some(row) = tree.nodes[i].row() {
            let weight = tree.nodes[i].size;
            if let Some(value) = rows[row].value(&secondary.name).as_number() {
                if value.is_finite() {
                    sums[i] = (weight, weight * value);
                }
            }
        }

        let (w, wv) = sums[i];
        tree.nodes[i].color_metric = if w != 0.0 { Some(wv / w) } else { None };

        if let Some(parent) = tree.nodes[i].parent {
            let p = &mut sums[parent.index()];
            p.0 += w;
            p.1 += wv;
        }
    }
}

/// `[min, max]` of the finite secondary values across all leaves.
pub fn leaf_extent(tree: &GroupTree, rows: &[Row], secondary: &Field) -> Option<(f64, f64)> {
    tree.nodes
        .iter()
        .filter_map(|node| node.row())
        .filter_map(|row| rows[row].value(&secondary.name).as_number())
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::types::Cell;
    use crate::tree::arena::IdGenerator;
    use crate::tree::build_hierarchy;

    fn rows(pairs: &[(&str, &str, Scalar, Scalar)]) -> Vec<Row> {
        pairs
            .iter()
            .map(|(a, b, m, c)| {
                Row::from_cells([
                    ("a", Cell::new(*a)),
                    ("b", Cell::new(*b)),
                    ("m", Cell::new(m.clone())),
                    ("c", Cell::new(c.clone())),
                ])
            })
            .collect()
    }

    fn build(rows: &[Row]) -> GroupTree {
        let mut ids = IdGenerator::new();
        build_hierarchy(
            rows,
            &[Field::dimension("a"), Field::dimension("b")],
            &mut ids,
        )
    }

    #[test]
    fn branch_size_is_sum_of_children() {
        let rows = rows(&[
            ("x", "p", 1.0.into(), Scalar::Null),
            ("x", "q", 2.5.into(), Scalar::Null),
            ("y", "p", 4.0.into(), Scalar::Null),
        ]);
        let mut tree = build(&rows);
        reduce(&mut tree, &rows, &Field::measure("m"), None);

        for id in tree.ids() {
            let node = tree.get(id);
            if node.is_leaf() {
                continue;
            }
            let sum: f64 = tree.children(id).map(|c| tree.get(c).size).sum();
            assert!((node.size - sum).abs() < 1e-9);
        }
        assert!((tree.get(tree.root).size - 7.5).abs() < 1e-9);
    }

    #[test]
    fn weighted_mean_over_leaves() {
        let rows = rows(&[
            ("x", "p", 2.0.into(), 10.0.into()),
            ("x", "q", 2.0.into(), 20.0.into()),
        ]);
        let mut tree = build(&rows);
        reduce(&mut tree, &rows, &Field::measure("m"), Some(&Field::measure("c")));
        let x = tree.children(tree.root).next().unwrap();
        assert_eq!(tree.get(x).color_metric, Some(15.0));
        assert_eq!(tree.get(tree.root).color_metric, Some(15.0));
    }

    #[test]
    fn zero_weights_leave_metric_undefined() {
        let rows = rows(&[
            ("x", "p", 0.0.into(), 10.0.into()),
            ("x", "q", 0.0.into(), 20.0.into()),
        ]);
        let mut tree = build(&rows);
        reduce(&mut tree, &rows, &Field::measure("m"), Some(&Field::measure("c")));
        let x = tree.children(tree.root).next().unwrap();
        assert_eq!(tree.get(x).color_metric, None);
    }

    #[test]
    fn malformed_and_negative_values_size_as_zero() {
        let rows = rows(&[
            ("x", "p", Scalar::text("oops"), Scalar::Null),
            ("x", "q", (-3.0).into(), Scalar::Null),
            ("x", "r", f64::NAN.into(), Scalar::Null),
            ("x", "s", 5.0.into(), Scalar::Null),
        ]);
        let mut tree = build(&rows);
        let stats = reduce(&mut tree, &rows, &Field::measure("m"), None);
        assert_eq!(stats.clamped_negative, 1);
        assert_eq!(stats.non_numeric, 2);
        assert_eq!(tree.get(tree.root).size, 5.0);
    }

    #[test]
    fn extent_ignores_non_finite_values() {
        let rows = rows(&[
            ("x", "p", 1.0.into(), 3.0.into()),
            ("x", "q", 1.0.into(), Scalar::Null),
            ("y", "p", 1.0.into(), (-2.0).into()),
            ("y", "q", 1.0.into(), f64::INFINITY.into()),
        ]);
        let tree = build(&rows);
        assert_eq!(leaf_extent(&tree, &rows, &Field::measure("c")), Some((-2.0, 3.0)));
    }
}
