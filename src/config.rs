use serde::{Deserialize, Serialize};

/// Categorical fallback palette for top-level branches.
pub const DEFAULT_PALETTE: &[&str] = &[
    "#4276be", "#3fb0d5", "#e57947", "#ffd95f", "#b42f37", "#6a013a", "#7496d0", "#6fc29c",
    "#f3ab7e", "#ae7acb",
];

/// Sequential fallback gradient for the secondary metric (low → high).
pub const DEFAULT_GRADIENT: &[&str] = &["#dd3333", "#f5e663", "#4ab04a"];

/// User-facing visualization options, as the host delivers them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VisConfig {
    /// Base label size in px. Drives header band height and label scaling.
    pub font_size: f64,
    /// Ordered `#rrggbb` colors for top-level branches.
    pub palette: Vec<String>,
    /// Ordered `#rrggbb` gradient stops for the secondary metric.
    pub gradient: Vec<String>,
    pub gradient_min: Option<f64>,
    pub gradient_max: Option<f64>,
    /// Append the formatted primary value to each label.
    pub display_measure: bool,
    /// Flag labels that do not fit inside their rectangle.
    pub hide_clipped_labels: bool,
}

impl Default for VisConfig {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            palette: DEFAULT_PALETTE.iter().map(|s| s.to_string()).collect(),
            gradient: DEFAULT_GRADIENT.iter().map(|s| s.to_string()).collect(),
            gradient_min: None,
            gradient_max: None,
            display_measure: true,
            hide_clipped_labels: false,
        }
    }
}

impl VisConfig {
    /// Font size actually used; non-positive or non-finite values fall back to the default.
    pub fn effective_font_size(&self) -> f64 {
        if self.font_size.is_finite() && self.font_size > 0.0 {
            self.font_size
        } else {
            tracing::warn!("Ignoring invalid fontSize {}, using default", self.font_size);
            VisConfig::default().font_size
        }
    }
}
