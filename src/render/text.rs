use compact_str::CompactString;
use serde::Serialize;

use super::format::ValueFormat;
use crate::layout::{LayoutConfig, LayoutRect, Rect};
use crate::tree::arena::GroupNode;

/// Inset of labels from their rectangle's left/top edge (px).
pub const LABEL_PADDING: f64 = 4.0;
/// Average glyph advance relative to the font size.
pub const AVERAGE_CHAR_WIDTH: f64 = 0.6;

/// Measures rendered text width. Hosts with real font metrics plug in here.
pub trait TextMeasurer {
    fn text_width(&self, text: &str, font_size: f64) -> f64;
}

/// Width estimate from an average glyph advance.
#[derive(Debug, Clone, Copy)]
pub struct AverageCharMeasurer {
    pub char_width: f64,
}

impl Default for AverageCharMeasurer {
    fn default() -> Self {
        Self {
            char_width: AVERAGE_CHAR_WIDTH,
        }
    }
}

impl TextMeasurer for AverageCharMeasurer {
    fn text_width(&self, text: &str, font_size: f64) -> f64 {
        text.chars().count() as f64 * font_size * self.char_width
    }
}

/// Options that shape label text and clipping.
#[derive(Debug, Clone)]
pub struct LabelOptions {
    pub display_measure: bool,
    pub hide_clipped: bool,
    pub value_format: ValueFormat,
}

/// A positioned label. `occluded` only tells the renderer to hide or clip it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeLabel {
    pub text: CompactString,
    pub font_size: f64,
    /// Bounding box of the rendered text
    pub bounds: Rect,
    pub occluded: bool,
}

/// Label text: the node's key, plus its formatted size when requested.
pub fn label_text(node: &GroupNode, options: &LabelOptions) -> CompactString {
    let key = node.display_key();
    if options.display_measure {
        compact_str::format_compact!("{} ({})", key, options.value_format.format(node.size))
    } else {
        key
    }
}

/// Format and place the label for one laid-out node.
///
/// Branch labels sit vertically centered in the header band and scale with
/// the band; leaf labels sit at the top-left corner in the base font size.
pub fn format_label(
    node: &GroupNode,
    placed: &LayoutRect,
    height_above_leaves: u16,
    options: &LabelOptions,
    layout_config: &LayoutConfig,
    measurer: &dyn TextMeasurer,
) -> NodeLabel {
    let text = label_text(node, options);
    let rect = placed.rect;

    let font_size = if node.is_leaf() {
        layout_config.font_size
    } else {
        layout_config.label_font_size(height_above_leaves)
    };
    let width = measurer.text_width(&text, font_size);

    let x = rect.x + LABEL_PADDING;
    let y = if node.is_leaf() {
        rect.y + LABEL_PADDING
    } else {
        rect.y + ((placed.header - font_size) / 2.0).max(0.0)
    };
    let bounds = Rect::new(x, y, width, font_size);

    let occluded = options.hide_clipped && !rect.contains(&bounds);

    NodeLabel {
        text,
        font_size,
        bounds,
        occluded,
    }
}
