use crate::layout::Layout;
use crate::tree::arena::NodeId;

use super::drill::Anchor;
use super::focus::FocusMove;

/// Hit-test: find the deepest laid-out node containing the point.
/// The root and zero-area rects never match.
pub fn hit_test(layout: &Layout, x: f64, y: f64) -> Option<NodeId> {
    // Iterate in reverse since deeper nodes are added later
    layout
        .rects
        .iter()
        .skip(1)
        .rev()
        .find(|lr| lr.rect.area() > 0.0 && lr.rect.contains_point(x, y))
        .map(|lr| lr.node)
}

/// Keys the treemap responds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationKey {
    Enter,
    Space,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Escape,
}

impl ActivationKey {
    /// Map a DOM-style key name (`"Enter"`, `" "`, `"ArrowLeft"`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Enter" => Some(ActivationKey::Enter),
            " " | "Space" | "Spacebar" => Some(ActivationKey::Space),
            "ArrowLeft" | "Left" => Some(ActivationKey::ArrowLeft),
            "ArrowRight" | "Right" => Some(ActivationKey::ArrowRight),
            "ArrowUp" | "Up" => Some(ActivationKey::ArrowUp),
            "ArrowDown" | "Down" => Some(ActivationKey::ArrowDown),
            "Escape" | "Esc" => Some(ActivationKey::Escape),
            _ => None,
        }
    }
}

/// A user gesture directed at the treemap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Activation {
    Pointer { x: f64, y: f64 },
    Key(ActivationKey),
}

/// Input action produced from an activation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputAction {
    /// Resolve and open the drill menu for a node
    Drill { node: NodeId, anchor: Anchor },
    MoveFocus(FocusMove),
    ClearFocus,
    /// No action
    None,
}

/// Translate an activation into an action. Keyboard activation drills into
/// the focused node, anchored at the center of its rectangle.
pub fn process_activation(
    activation: Activation,
    layout: &Layout,
    focused: Option<NodeId>,
) -> InputAction {
    match activation {
        Activation::Pointer { x, y } => match hit_test(layout, x, y) {
            Some(node) => InputAction::Drill {
                node,
                anchor: Anchor { x, y },
            },
            None => InputAction::None,
        },
        Activation::Key(key) => match key {
            ActivationKey::Enter | ActivationKey::Space => {
                match focused.and_then(|node| layout.get(node)) {
                    Some(placed) => InputAction::Drill {
                        node: placed.node,
                        anchor: Anchor {
                            x: placed.rect.x + placed.rect.width / 2.0,
                            y: placed.rect.y + placed.rect.height / 2.0,
                        },
                    },
                    None => InputAction::None,
                }
            }
            ActivationKey::ArrowLeft => InputAction::MoveFocus(FocusMove::Prev),
            ActivationKey::ArrowRight => InputAction::MoveFocus(FocusMove::Next),
            ActivationKey::ArrowUp => InputAction::MoveFocus(FocusMove::Parent),
            ActivationKey::ArrowDown => InputAction::MoveFocus(FocusMove::FirstChild),
            ActivationKey::Escape => InputAction::ClearFocus,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutRect, Rect};

    fn layout() -> Layout {
        let mut layout = Layout::default();
        let rects = [
            (0, Rect::new(0.0, 0.0, 100.0, 100.0), 0),
            (1, Rect::new(0.0, 0.0, 60.0, 100.0), 1),
            (2, Rect::new(0.0, 20.0, 60.0, 80.0), 2),
            (3, Rect::new(60.0, 0.0, 40.0, 100.0), 1),
            (4, Rect::new(100.0, 100.0, 0.0, 0.0), 1),
        ];
        for (i, (node, rect, depth)) in rects.into_iter().enumerate() {
            layout.rects.push(LayoutRect {
                node: NodeId(node),
                rect,
                header: 0.0,
                depth,
            });
            layout.node_to_rect.insert(NodeId(node), i);
        }
        layout
    }

    #[test]
    fn hit_test_prefers_deepest_node() {
        let layout = layout();
        assert_eq!(hit_test(&layout, 10.0, 50.0), Some(NodeId(2)));
        assert_eq!(hit_test(&layout, 10.0, 5.0), Some(NodeId(1)));
        assert_eq!(hit_test(&layout, 70.0, 5.0), Some(NodeId(3)));
        assert_eq!(hit_test(&layout, 100.0, 100.0), None);
        assert_eq!(hit_test(&layout, -1.0, 5.0), None);
    }

    #[test]
    fn keyboard_activation_uses_focus() {
        let layout = layout();
        let enter = Activation::Key(ActivationKey::Enter);
        assert_eq!(process_activation(enter, &layout, None), InputAction::None);
        assert_eq!(
            process_activation(enter, &layout, Some(NodeId(3))),
            InputAction::Drill {
                node: NodeId(3),
                anchor: Anchor { x: 80.0, y: 50.0 }
            }
        );
    }

    #[test]
    fn key_names_map_to_actions() {
        let layout = layout();
        let act = |name: &str| {
            let key = ActivationKey::from_name(name).unwrap();
            process_activation(Activation::Key(key), &layout, None)
        };
        assert_eq!(act("ArrowRight"), InputAction::MoveFocus(FocusMove::Next));
        assert_eq!(act("Up"), InputAction::MoveFocus(FocusMove::Parent));
        assert_eq!(act("Escape"), InputAction::ClearFocus);
        assert_eq!(ActivationKey::from_name(" "), Some(ActivationKey::Space));
        assert_eq!(ActivationKey::from_name("Tab"), None);
    }
}
