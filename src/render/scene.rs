use compact_str::{format_compact, CompactString};
use serde::Serialize;

use super::colors::NodeStyle;
use super::text::NodeLabel;
use crate::layout::Rect;
use crate::pipeline::Frame;
use crate::query::types::Scalar;
use crate::tree::arena::NodeUid;

/// Prefix of the element id each node is rendered under.
pub const ELEMENT_ID_PREFIX: &str = "grovemap-node-";

/// One drawable node: geometry, style and label, flattened for a renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedNode {
    pub element_id: CompactString,
    pub uid: NodeUid,
    pub parent: Option<NodeUid>,
    pub depth: u16,
    pub is_leaf: bool,
    pub key: Scalar,
    pub size: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_metric: Option<f64>,
    pub rect: Rect,
    /// Height of the header band (0 for leaves)
    pub header: f64,
    pub style: NodeStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<NodeLabel>,
}

pub fn element_id(uid: NodeUid) -> CompactString {
    format_compact!("{}{}", ELEMENT_ID_PREFIX, uid.0)
}

/// Flatten a frame into render records in layout order (parents first,
/// larger siblings first). Zero-area rects are kept so every node has an
/// element to correlate with.
pub fn build_nodes(frame: &Frame) -> Vec<RenderedNode> {
    let tree = &frame.tree;
    frame
        .layout
        .rects
        .iter()
        .map(|placed| {
            let node = tree.get(placed.node);
            RenderedNode {
                element_id: element_id(node.uid),
                uid: node.uid,
                parent: node.parent.map(|p| tree.get(p).uid),
                depth: placed.depth,
                is_leaf: node.is_leaf(),
                key: node.key.clone(),
                size: node.size,
                color_metric: node.color_metric,
                rect: placed.rect,
                header: placed.header,
                style: frame.style(placed.node),
                label: frame.label(placed.node).cloned(),
            }
        })
        .collect()
}
