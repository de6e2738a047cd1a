use crate::config::VisConfig;
use crate::layout::Bounds;
use crate::pipeline::{self, Frame};
use crate::query::types::{NavigationLink, QueryResponse};
use crate::render::text::{AverageCharMeasurer, TextMeasurer};
use crate::tree::arena::{IdGenerator, NodeId};
use crate::ui::drill::{resolve_drill, DrillSink};
use crate::ui::focus::FocusState;
use crate::ui::input::{hit_test, process_activation, Activation, InputAction};
use crate::ui::tooltip::{build_tooltip, TooltipInfo};
use crate::validate::{ErrorSink, Requirements};

/// Visualization lifecycle phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisPhase {
    /// No update received yet
    Empty,
    /// The last update rendered a frame
    Ready,
    /// The last update failed validation; nothing is retained
    Invalid,
}

/// What the last successful update left behind.
#[derive(Debug)]
pub struct RenderState {
    pub query: QueryResponse,
    pub frame: Frame,
    pub focus: FocusState,
}

/// Host-facing shell around the pure pipeline. Owns the id generator,
/// the retained frame and keyboard focus between updates.
pub struct Visualization {
    pub phase: VisPhase,
    pub requirements: Requirements,
    ids: IdGenerator,
    measurer: Box<dyn TextMeasurer>,
    state: Option<RenderState>,
}

impl Default for Visualization {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization {
    pub fn new() -> Self {
        Self::with_measurer(Box::new(AverageCharMeasurer::default()))
    }

    pub fn with_measurer(measurer: Box<dyn TextMeasurer>) -> Self {
        Self {
            phase: VisPhase::Empty,
            requirements: Requirements::default(),
            ids: IdGenerator::new(),
            measurer,
            state: None,
        }
    }

    /// Run the pipeline for a new update and replace the retained state.
    ///
    /// Errors from the previous update are cleared first. On validation
    /// failure the error goes to `errors` and the previous frame and focus
    /// are dropped so no stale geometry stays on screen.
    pub fn update(
        &mut self,
        query: QueryResponse,
        config: &VisConfig,
        bounds: Bounds,
        errors: &mut dyn ErrorSink,
    ) -> Option<&Frame> {
        errors.clear_errors(None);

        let result = pipeline::render(
            &query,
            config,
            bounds,
            &self.requirements,
            &mut self.ids,
            self.measurer.as_ref(),
        );

        match result {
            Ok(frame) => {
                let focus = match &self.state {
                    Some(prev) => prev.focus.carry_over(&prev.frame.tree, &frame.tree),
                    None => FocusState::default(),
                };
                tracing::info!(
                    "Update rendered: {} nodes, total size {}",
                    frame.tree.len(),
                    frame.total_size()
                );
                self.phase = VisPhase::Ready;
                self.state = Some(RenderState {
                    query,
                    frame,
                    focus,
                });
                self.frame()
            }
            Err(e) => {
                tracing::warn!("Update rejected: {}", e);
                errors.add_error(&e.to_vis_error());
                self.phase = VisPhase::Invalid;
                self.state = None;
                None
            }
        }
    }

    /// Handle a pointer or key activation. A drill produces the resolved
    /// link, which is also handed to `sink`.
    pub fn activate(
        &mut self,
        activation: Activation,
        sink: &mut dyn DrillSink,
    ) -> Option<NavigationLink> {
        let state = self.state.as_mut()?;
        let frame = &state.frame;

        match process_activation(activation, &frame.layout, state.focus.focused()) {
            InputAction::Drill { node, anchor } => {
                state.focus.set(Some(node));
                let link = resolve_drill(&frame.tree, &state.query.rows, node, &frame.primary);
                match &link {
                    Some(link) => sink.open_drill_menu(std::slice::from_ref(link), anchor),
                    None => tracing::debug!("No drill links under {:?}", node),
                }
                link
            }
            InputAction::MoveFocus(mv) => {
                state.focus.apply(&frame.tree, &frame.layout, mv);
                None
            }
            InputAction::ClearFocus => {
                state.focus.clear();
                None
            }
            InputAction::None => None,
        }
    }

    /// Tooltip for whatever node lies under the point.
    pub fn tooltip_at(&self, x: f64, y: f64) -> Option<TooltipInfo> {
        let frame = self.frame()?;
        hit_test(&frame.layout, x, y).map(|node| build_tooltip(frame, node))
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.state.as_ref().map(|s| &s.frame)
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.state.as_ref().and_then(|s| s.focus.focused())
    }

    /// Number of node ids handed out over this visualization's lifetime.
    pub fn ids_minted(&self) -> u64 {
        self.ids.minted()
    }
}
