pub mod squarify;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::VisConfig;
use crate::tree::arena::{GroupTree, NodeId};
use self::squarify::{squarify, Edges};

/// Margin kept clear on every side of the bounds (px).
pub const OUTER_MARGIN: f64 = 4.0;
/// Header band height as a multiple of the label font size.
pub const HEADER_LINE_HEIGHT: f64 = 1.5;
/// Per-level growth of header bands (and their labels) away from the leaves.
pub const HEADER_SCALE: f64 = 1.2;

/// Size of the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Whether `other` lies entirely inside this rect (edges inclusive).
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Whether the interiors intersect (shared edges do not count).
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    fn edges(&self) -> Edges {
        Edges::new(self.x, self.y, self.right(), self.bottom())
    }
}

impl From<Edges> for Rect {
    fn from(e: Edges) -> Self {
        Rect::new(e.x0, e.y0, e.width(), e.height())
    }
}

/// A positioned rectangle in the treemap layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutRect {
    pub node: NodeId,
    pub rect: Rect,
    /// Height of the label band reserved at the top (0 for leaves and the root)
    pub header: f64,
    pub depth: u16,
}

impl LayoutRect {
    /// Area left for children once the header band is reserved.
    pub fn content(&self) -> Rect {
        let header = self.header.min(self.rect.height);
        Rect::new(
            self.rect.x,
            self.rect.y + header,
            self.rect.width,
            self.rect.height - header,
        )
    }
}

/// The full layout result (rects + fast lookup).
#[derive(Debug, Clone, Default)]
pub struct Layout {
    /// Parents always precede their children
    pub rects: Vec<LayoutRect>,
    /// node → index into `rects`
    pub node_to_rect: HashMap<NodeId, usize>,
}

impl Layout {
    pub fn get(&self, node: NodeId) -> Option<&LayoutRect> {
        self.node_to_rect.get(&node).map(|&i| &self.rects[i])
    }
}

/// Configuration for treemap layout.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Margin subtracted from each side of the bounds (px)
    pub margin: f64,
    /// Base label font size (px)
    pub font_size: f64,
    /// Header band height relative to the font size
    pub header_line_height: f64,
    /// Header growth per level above the leaves; must be > 1
    pub header_scale: f64,
    /// Maximum recursion depth (safety)
    pub max_depth: u16,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin: OUTER_MARGIN,
            font_size: 12.0,
            header_line_height: HEADER_LINE_HEIGHT,
            header_scale: HEADER_SCALE,
            max_depth: 64,
        }
    }
}

impl LayoutConfig {
    pub fn from_vis(config: &VisConfig) -> Self {
        Self {
            font_size: config.effective_font_size(),
            ..Self::default()
        }
    }

    /// Label font size for a node `height` levels above its leaves.
    /// Grows by one `header_scale` step per level, so leaves keep `font_size`.
    pub fn label_font_size(&self, height: u16) -> f64 {
        self.font_size * self.header_scale.powi(i32::from(height))
    }

    /// Header band for a node `height` levels above its leaves (0 for leaves).
    pub fn header_height(&self, height: u16) -> f64 {
        if height == 0 {
            return 0.0;
        }
        (self.label_font_size(height) * self.header_line_height).round()
    }
}

/// Compute layout for the whole tree inside `bounds`.
pub fn compute_layout(tree: &GroupTree, bounds: Bounds, config: &LayoutConfig) -> Layout {
    let mut layout = Layout {
        rects: Vec::with_capacity(tree.len()),
        node_to_rect: HashMap::with_capacity(tree.len()),
    };

    let width = bounds.width.max(0.0);
    let height = bounds.height.max(0.0);
    let mx = config.margin.min(width / 2.0);
    let my = config.margin.min(height / 2.0);
    let outer = Edges::new(mx, my, width - mx, height - my).rounded();

    layout.rects.push(LayoutRect {
        node: tree.root,
        rect: outer.into(),
        header: 0.0,
        depth: 0,
    });
    layout.node_to_rect.insert(tree.root, 0);

    let heights = tree.heights();
    layout_children(tree, tree.root, outer, 0, &heights, config, &mut layout);

    tracing::info!(
        "Layout computed: {} rects in {:.0}x{:.0} (root size {})",
        layout.rects.len(),
        width,
        height,
        tree.get(tree.root).size
    );
    layout
}

/// Recursively lay out the children of `parent` inside `region`
/// (the parent's rounded rect minus its header band).
fn layout_children(
    tree: &GroupTree,
    parent: NodeId,
    region: Edges,
    depth: u16,
    heights: &[u16],
    config: &LayoutConfig,
    layout: &mut Layout,
) {
    if depth >= config.max_depth {
        tracing::warn!("Layout depth limit {} reached, not descending further", config.max_depth);
        return;
    }

    let mut children: Vec<NodeId> = tree.children(parent).collect();
    if children.is_empty() {
        return;
    }

    // Largest first; the stable sort keeps insertion order among equal sizes.
    children.sort_by(|&a, &b| tree.get(b).size.total_cmp(&tree.get(a).size));
    let weights: Vec<f64> = children.iter().map(|&id| tree.get(id).size.max(0.0)).collect();

    if depth == 0 {
        tracing::debug!(
            "Laying out {} top-level groups in {:.0}x{:.0}",
            children.len(),
            region.width(),
            region.height()
        );
    }

    let cells = squarify(&weights, region);

    for (&child, cell) in children.iter().zip(cells) {
        let edges = cell.clamp_to(&region).rounded();
        let node = tree.get(child);
        let rect = Rect::from(edges);

        let header = if node.is_leaf() {
            0.0
        } else {
            config.header_height(heights[child.index()]).min(rect.height)
        };

        let index = layout.rects.len();
        layout.rects.push(LayoutRect {
            node: child,
            rect,
            header,
            depth: depth + 1,
        });
        layout.node_to_rect.insert(child, index);

        if !node.is_leaf() {
            let content = layout.rects[index].content().edges();
            layout_children(tree, child, content, depth + 1, heights, config, layout);
        }
    }
}
