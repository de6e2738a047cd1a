use crate::config::VisConfig;
use crate::layout::{compute_layout, Bounds, Layout, LayoutConfig};
use crate::query::types::{Field, QueryResponse};
use crate::render::colors::{resolve_styles, CategoricalScale, GradientScale, NodeStyle};
use crate::render::format::ValueFormat;
use crate::render::scene::{build_nodes, RenderedNode};
use crate::render::text::{format_label, LabelOptions, NodeLabel, TextMeasurer};
use crate::tree::aggregate::{leaf_extent, reduce, ReduceStats};
use crate::tree::arena::{GroupNode, GroupTree, IdGenerator, NodeId};
use crate::tree::build_hierarchy;
use crate::validate::{validate, Requirements, ValidationError};

/// Everything derived from one update: the weighted tree, its geometry,
/// and per-node colors and labels. Per-node vectors are indexed by `NodeId`.
#[derive(Debug, Clone)]
pub struct Frame {
    pub tree: GroupTree,
    pub layout: Layout,
    pub styles: Vec<NodeStyle>,
    /// `None` for the root
    pub labels: Vec<Option<NodeLabel>>,
    pub primary: Field,
    pub secondary: Option<Field>,
    /// Domain of the color gradient, when a secondary measure is present
    pub gradient_domain: Option<(f64, f64)>,
    pub stats: ReduceStats,
}

impl Frame {
    pub fn node(&self, id: NodeId) -> &GroupNode {
        self.tree.get(id)
    }

    pub fn style(&self, id: NodeId) -> NodeStyle {
        self.styles[id.index()]
    }

    pub fn label(&self, id: NodeId) -> Option<&NodeLabel> {
        self.labels[id.index()].as_ref()
    }

    pub fn primary_format(&self) -> ValueFormat {
        ValueFormat::from_option(self.primary.value_format.as_deref())
    }

    pub fn secondary_format(&self) -> Option<ValueFormat> {
        self.secondary
            .as_ref()
            .map(|f| ValueFormat::from_option(f.value_format.as_deref()))
    }

    pub fn total_size(&self) -> f64 {
        self.tree.get(self.tree.root).size
    }

    /// Flattened render records, parents before children.
    pub fn nodes(&self) -> Vec<RenderedNode> {
        build_nodes(self)
    }
}

/// Run the whole pipeline for one update.
///
/// Validation runs first; on failure nothing is built. Otherwise the rows are
/// grouped, reduced, laid out, colored and labeled in that order.
pub fn render(
    query: &QueryResponse,
    config: &VisConfig,
    bounds: Bounds,
    requirements: &Requirements,
    ids: &mut IdGenerator,
    measurer: &dyn TextMeasurer,
) -> Result<Frame, ValidationError> {
    validate(&query.fields, requirements)?;

    let primary = query
        .fields
        .primary_measure()
        .cloned()
        .ok_or(ValidationError::MissingPrimaryMeasure)?;
    let secondary = query.fields.secondary_measure().cloned();

    let mut tree = build_hierarchy(&query.rows, &query.fields.dimension_like, ids);
    let stats = reduce(&mut tree, &query.rows, &primary, secondary.as_ref());

    let layout_config = LayoutConfig::from_vis(config);
    let layout = compute_layout(&tree, bounds, &layout_config);

    let categorical = CategoricalScale::from_config(config);
    let gradient = secondary
        .as_ref()
        .map(|field| GradientScale::from_config(config, leaf_extent(&tree, &query.rows, field)));
    let styles = resolve_styles(&tree, &categorical, gradient.as_ref());

    let options = LabelOptions {
        display_measure: config.display_measure,
        hide_clipped: config.hide_clipped_labels,
        value_format: ValueFormat::from_option(primary.value_format.as_deref()),
    };
    let heights = tree.heights();
    let labels: Vec<Option<NodeLabel>> = tree
        .ids()
        .map(|id| {
            if id == tree.root {
                return None;
            }
            layout.get(id).map(|placed| {
                format_label(
                    tree.get(id),
                    placed,
                    heights[id.index()],
                    &options,
                    &layout_config,
                    measurer,
                )
            })
        })
        .collect();

    let occluded = labels.iter().flatten().filter(|l| l.occluded).count();
    if occluded > 0 {
        tracing::debug!("{} labels flagged as clipped", occluded);
    }

    Ok(Frame {
        tree,
        layout,
        styles,
        labels,
        primary,
        secondary,
        gradient_domain: gradient.map(|g| g.domain),
        stats,
    })
}
