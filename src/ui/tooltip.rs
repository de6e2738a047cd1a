use serde::Serialize;

use crate::pipeline::Frame;
use crate::tree::arena::{GroupTree, NodeId};

/// Separator between path segments in tooltips.
pub const PATH_SEPARATOR: &str = " › ";

/// Information to display in the tooltip when hovering over a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipInfo {
    pub name: String,
    pub full_path: String,
    pub size_label: String,
    pub size_display: String,
    /// Share of the total size, e.g. `"12.5%"`
    pub share: String,
    pub metric_label: Option<String>,
    pub metric_display: Option<String>,
    pub is_leaf: bool,
    pub child_count: Option<usize>,
}

/// Build tooltip info for a node.
pub fn build_tooltip(frame: &Frame, node_id: NodeId) -> TooltipInfo {
    let node = frame.node(node_id);

    let child_count = if node.is_leaf() {
        None
    } else {
        Some(frame.tree.children(node_id).count())
    };

    let metric_label = frame
        .secondary
        .as_ref()
        .map(|f| f.display_label().to_string());
    let metric_display = match (node.color_metric, frame.secondary_format()) {
        (Some(metric), Some(format)) => Some(format.format(metric)),
        _ => None,
    };

    TooltipInfo {
        name: node.display_key().to_string(),
        full_path: build_path(&frame.tree, node_id),
        size_label: frame.primary.display_label().to_string(),
        size_display: frame.primary_format().format(node.size),
        share: format_share(node.size, frame.total_size()),
        metric_label,
        metric_display,
        is_leaf: node.is_leaf(),
        child_count,
    }
}

/// Build the key path of a node from the top level down.
pub fn build_path(tree: &GroupTree, node_id: NodeId) -> String {
    let parts: Vec<String> = tree
        .path(node_id)
        .into_iter()
        .map(|id| tree.get(id).display_key().to_string())
        .collect();
    parts.join(PATH_SEPARATOR)
}

/// Percentage of `total` taken by `size`, one decimal place.
pub fn format_share(size: f64, total: f64) -> String {
    if total > 0.0 && size.is_finite() {
        format!("{:.1}%", size / total * 100.0)
    } else {
        "0.0%".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VisConfig;
    use crate::layout::Bounds;
    use crate::pipeline::render;
    use crate::query::types::{Cell, Field, QueryFields, QueryResponse, Row};
    use crate::render::text::AverageCharMeasurer;
    use crate::tree::arena::IdGenerator;
    use crate::validate::Requirements;

    fn frame() -> Frame {
        let mut measure = Field::measure("revenue").with_format("$#,##0");
        measure.label = Some("Revenue".into());
        let fields = QueryFields {
            dimension_like: vec![Field::dimension("region"), Field::dimension("store")],
            measure_like: vec![measure, Field::measure("margin").with_format("0.0%")],
            ..Default::default()
        };
        let row = |region: &str, store: &str, revenue: f64, margin: f64| {
            Row::from_cells([
                ("region", Cell::new(region)),
                ("store", Cell::new(store)),
                ("revenue", Cell::new(revenue)),
                ("margin", Cell::new(margin)),
            ])
        };
        let rows = vec![
            row("West", "Portland", 3000.0, 0.2),
            row("West", "Seattle", 1000.0, 0.4),
            row("East", "Boston", 4000.0, 0.1),
        ];
        let mut ids = IdGenerator::new();
        render(
            &QueryResponse::new(fields, rows),
            &VisConfig::default(),
            Bounds::new(500.0, 400.0),
            &Requirements::default(),
            &mut ids,
            &AverageCharMeasurer::default(),
        )
        .unwrap()
    }

    #[test]
    fn branch_tooltip_summarizes_group() {
        let frame = frame();
        let west = frame.tree.children(frame.tree.root).next().unwrap();
        let info = build_tooltip(&frame, west);
        assert_eq!(info.full_path, "West");
        assert_eq!(info.size_label, "Revenue");
        assert_eq!(info.size_display, "$4,000");
        assert_eq!(info.share, "50.0%");
        assert_eq!(info.metric_label.as_deref(), Some("margin"));
        assert_eq!(info.metric_display.as_deref(), Some("25.0%"));
        assert_eq!(info.child_count, Some(2));
    }

    #[test]
    fn leaf_tooltip_shows_full_path() {
        let frame = frame();
        let west = frame.tree.children(frame.tree.root).next().unwrap();
        let seattle = frame.tree.children(west).nth(1).unwrap();
        let info = build_tooltip(&frame, seattle);
        assert_eq!(info.full_path, "West › Seattle");
        assert_eq!(info.share, "12.5%");
        assert!(info.is_leaf);
        assert_eq!(info.child_count, None);
    }

    #[test]
    fn share_of_empty_total_is_zero() {
        assert_eq!(format_share(0.0, 0.0), "0.0%");
        assert_eq!(format_share(1.0, 3.0), "33.3%");
    }
}
