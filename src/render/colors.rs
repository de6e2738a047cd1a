use serde::{Serialize, Serializer};

use crate::config::{VisConfig, DEFAULT_GRADIENT, DEFAULT_PALETTE};
use crate::tree::arena::GroupTree;

/// Fill for the root, which is never colored by data.
pub const ROOT_FILL: Color = Color::new(1.0, 1.0, 1.0);
/// Label color for light backgrounds.
pub const DARK_TEXT: Color = Color::new(0.15, 0.16, 0.18);
/// Label color for dark backgrounds.
pub const LIGHT_TEXT: Color = Color::new(1.0, 1.0, 1.0);
/// CIE L* above which a background counts as light.
pub const LIGHTNESS_THRESHOLD: f32 = 60.0;

/// sRGB color with straight alpha, components in 0..=1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parse `#rrggbb` or `#rgb` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v as f32 / 255.0);
        match digits.len() {
            6 if digits.is_ascii() => Some(Self::new(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            3 if digits.is_ascii() => {
                let short = |i: usize| channel(&digits[i..i + 1]).map(|v| v * 17.0);
                Some(Self::new(short(0)?, short(1)?, short(2)?))
            }
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", to_u8(self.r), to_u8(self.g), to_u8(self.b))
    }

    /// Linear interpolation in sRGB space.
    pub fn lerp(self, other: Color, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// Create a darker version (for borders).
    pub fn darken(self, amount: f32) -> Self {
        Self {
            r: (self.r - amount).max(0.0),
            g: (self.g - amount).max(0.0),
            b: (self.b - amount).max(0.0),
            a: self.a,
        }
    }

    /// Perceptual lightness (CIE L*, 0..=100).
    pub fn lightness(self) -> f32 {
        let linear = |c: f32| {
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        };
        let y = 0.2126 * linear(self.r) + 0.7152 * linear(self.g) + 0.0722 * linear(self.b);
        if y > 216.0 / 24389.0 {
            116.0 * y.cbrt() - 16.0
        } else {
            y * 24389.0 / 27.0
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Legible label color over `background`.
pub fn text_color(background: Color) -> Color {
    if background.lightness() > LIGHTNESS_THRESHOLD {
        DARK_TEXT
    } else {
        LIGHT_TEXT
    }
}

/// Parse a configured color list, skipping bad entries.
/// Falls back to `fallback` when nothing usable remains.
pub fn parse_colors(entries: &[String], fallback: &[&str]) -> Vec<Color> {
    let mut colors: Vec<Color> = entries
        .iter()
        .filter_map(|entry| {
            let color = Color::from_hex(entry);
            if color.is_none() {
                tracing::warn!("Ignoring unparseable color '{}'", entry);
            }
            color
        })
        .collect();
    if colors.is_empty() {
        colors = fallback.iter().filter_map(|hex| Color::from_hex(hex)).collect();
    }
    colors
}

/// Ordinal mapping from top-level branches to a cyclic palette.
#[derive(Debug, Clone)]
pub struct CategoricalScale {
    palette: Vec<Color>,
}

impl CategoricalScale {
    pub fn new(palette: Vec<Color>) -> Self {
        Self { palette }
    }

    pub fn from_config(config: &VisConfig) -> Self {
        Self::new(parse_colors(&config.palette, DEFAULT_PALETTE))
    }

    /// Color of the `index`-th top-level key (first-seen order).
    pub fn color(&self, index: usize) -> Color {
        if self.palette.is_empty() {
            return ROOT_FILL;
        }
        self.palette[index % self.palette.len()]
    }
}

/// Sequential mapping through evenly spaced color stops.
#[derive(Debug, Clone)]
pub struct GradientScale {
    stops: Vec<Color>,
    pub domain: (f64, f64),
}

impl GradientScale {
    pub fn new(stops: Vec<Color>, domain: (f64, f64)) -> Self {
        Self { stops, domain }
    }

    /// Build from config; the data extent fills whichever end the user left unset.
    pub fn from_config(config: &VisConfig, extent: Option<(f64, f64)>) -> Self {
        let stops = parse_colors(&config.gradient, DEFAULT_GRADIENT);
        Self::new(
            stops,
            resolve_domain(extent, config.gradient_min, config.gradient_max),
        )
    }

    pub fn color(&self, value: f64) -> Color {
        gradient(&self.stops, value, self.domain)
    }
}

/// Domain from the data extent with per-end overrides.
pub fn resolve_domain(
    extent: Option<(f64, f64)>,
    min_override: Option<f64>,
    max_override: Option<f64>,
) -> (f64, f64) {
    let (lo, hi) = extent.unwrap_or((0.0, 0.0));
    (
        min_override.filter(|v| v.is_finite()).unwrap_or(lo),
        max_override.filter(|v| v.is_finite()).unwrap_or(hi),
    )
}

/// Map `value` through `stops` over `domain`. Values outside the domain
/// clamp to the end stops; an empty domain maps to the middle.
pub fn gradient(stops: &[Color], value: f64, domain: (f64, f64)) -> Color {
    match stops {
        [] => ROOT_FILL,
        [only] => *only,
        _ => {
            let (lo, hi) = domain;
            let span = hi - lo;
            let t = if span.abs() < f64::EPSILON || !value.is_finite() {
                0.5
            } else {
                ((value - lo) / span).clamp(0.0, 1.0)
            };
            let segments = stops.len() - 1;
            let pos = t * segments as f64;
            let i = (pos.floor() as usize).min(segments - 1);
            stops[i].lerp(stops[i + 1], (pos - i as f64) as f32)
        }
    }
}

/// Per-node visual attributes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodeStyle {
    pub fill: Color,
    pub stroke: Color,
    pub text: Color,
}

impl NodeStyle {
    fn from_fill(fill: Color) -> Self {
        Self {
            fill,
            stroke: fill.darken(0.15),
            text: text_color(fill),
        }
    }
}

/// Resolve each node's colors, indexed by `NodeId`.
///
/// With a gradient, nodes use their weighted color metric and fall back to
/// the categorical color of their top-level branch when it is undefined.
/// Without one, every node inherits its top-level branch's palette color.
pub fn resolve_styles(
    tree: &GroupTree,
    categorical: &CategoricalScale,
    gradient: Option<&GradientScale>,
) -> Vec<NodeStyle> {
    let mut top_index = vec![None; tree.len()];
    for (i, top) in tree.children(tree.root).enumerate() {
        top_index[top.index()] = Some(i);
    }

    let mut fallbacks = 0usize;
    let styles = tree
        .ids()
        .map(|id| {
            if id == tree.root {
                return NodeStyle::from_fill(ROOT_FILL);
            }
            let categorical_fill = || {
                let top = tree.top_level_ancestor(id);
                categorical.color(top.and_then(|t| top_index[t.index()]).unwrap_or(0))
            };
            let fill = match gradient {
                Some(scale) => match tree.get(id).color_metric {
                    Some(metric) => scale.color(metric),
                    None => {
                        fallbacks += 1;
                        categorical_fill()
                    }
                },
                None => categorical_fill(),
            };
            NodeStyle::from_fill(fill)
        })
        .collect();

    if fallbacks > 0 {
        tracing::debug!(
            "{} nodes had no weighted color metric; using categorical colors",
            fallbacks
        );
    }
    styles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        assert_eq!(Color::from_hex("#4276be").unwrap().to_hex(), "#4276be");
        assert_eq!(Color::from_hex("fff").unwrap().to_hex(), "#ffffff");
        assert!(Color::from_hex("#12345").is_none());
        assert!(Color::from_hex("#zzzzzz").is_none());
    }

    #[test]
    fn palette_cycles() {
        let scale = CategoricalScale::new(vec![
            Color::from_hex("#ff0000").unwrap(),
            Color::from_hex("#00ff00").unwrap(),
        ]);
        assert_eq!(scale.color(0), scale.color(2));
        assert_ne!(scale.color(0), scale.color(1));
    }

    #[test]
    fn gradient_hits_stops_and_midpoints() {
        let stops = [
            Color::from_hex("#000000").unwrap(),
            Color::from_hex("#ffffff").unwrap(),
        ];
        assert_eq!(gradient(&stops, 0.0, (0.0, 10.0)).to_hex(), "#000000");
        assert_eq!(gradient(&stops, 10.0, (0.0, 10.0)).to_hex(), "#ffffff");
        assert_eq!(gradient(&stops, 5.0, (0.0, 10.0)).to_hex(), "#808080");
        assert_eq!(gradient(&stops, 50.0, (0.0, 10.0)).to_hex(), "#ffffff");
        assert_eq!(gradient(&stops, 3.0, (3.0, 3.0)).to_hex(), "#808080");
    }

    #[test]
    fn three_stop_gradient_passes_through_middle() {
        let stops = parse_colors(
            &["#ff0000".to_string(), "#00ff00".to_string(), "#0000ff".to_string()],
            DEFAULT_GRADIENT,
        );
        assert_eq!(gradient(&stops, 0.5, (0.0, 1.0)).to_hex(), "#00ff00");
        assert_eq!(gradient(&stops, 1.0, (0.0, 1.0)).to_hex(), "#0000ff");
    }

    #[test]
    fn domain_overrides_apply_per_end() {
        assert_eq!(resolve_domain(Some((2.0, 8.0)), None, None), (2.0, 8.0));
        assert_eq!(resolve_domain(Some((2.0, 8.0)), Some(0.0), None), (0.0, 8.0));
        assert_eq!(resolve_domain(Some((2.0, 8.0)), None, Some(100.0)), (2.0, 100.0));
        assert_eq!(resolve_domain(None, Some(1.0), Some(5.0)), (1.0, 5.0));
    }

    #[test]
    fn text_color_tracks_background_lightness() {
        assert_eq!(text_color(Color::from_hex("#ffffff").unwrap()), DARK_TEXT);
        assert_eq!(text_color(Color::from_hex("#f5e663").unwrap()), DARK_TEXT);
        assert_eq!(text_color(Color::from_hex("#000000").unwrap()), LIGHT_TEXT);
        assert_eq!(text_color(Color::from_hex("#6a013a").unwrap()), LIGHT_TEXT);
    }

    #[test]
    fn bad_palette_entries_fall_back() {
        let colors = parse_colors(&["nope".to_string()], DEFAULT_PALETTE);
        assert_eq!(colors.len(), DEFAULT_PALETTE.len());
    }
}
