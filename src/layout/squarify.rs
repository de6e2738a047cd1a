/// Axis-aligned box by its edges. Adjacent cells share edge values exactly,
/// so rounding both sides of a shared edge lands on the same whole unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edges {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Edges {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Zero-area box at a point.
    pub fn point(x: f64, y: f64) -> Self {
        Self::new(x, y, x, y)
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn rounded(self) -> Self {
        Self::new(self.x0.round(), self.y0.round(), self.x1.round(), self.y1.round())
    }

    /// Pull every edge inside `outer` (guards float drift past the parent).
    pub fn clamp_to(self, outer: &Edges) -> Self {
        Self::new(
            self.x0.clamp(outer.x0, outer.x1),
            self.y0.clamp(outer.y0, outer.y1),
            self.x1.clamp(outer.x0, outer.x1),
            self.y1.clamp(outer.y0, outer.y1),
        )
    }
}

/// Squarified partition of `region` into one cell per weight.
///
/// `weights` must already be sorted descending. Cells come back in the same
/// order with area proportional to weight. Zero weights (or a degenerate
/// region) get a zero-area cell at the region's far corner.
pub fn squarify(weights: &[f64], region: Edges) -> Vec<Edges> {
    let mut out = vec![Edges::point(region.x1, region.y1); weights.len()];

    // Weights are taken relative to the largest one so the total stays
    // finite even when the raw sum would overflow.
    let max = weights
        .iter()
        .filter(|w| **w > 0.0)
        .map(|w| w.min(f64::MAX))
        .fold(0.0, f64::max);
    let (w, h) = (region.width(), region.height());
    if max <= 0.0 || w <= 0.0 || h <= 0.0 {
        return out;
    }

    let relative = |weight: f64| weight.min(f64::MAX) / max;
    let total: f64 = weights.iter().filter(|w| **w > 0.0).map(|w| relative(*w)).sum();
    let scale = (w * h) / total;
    let (slots, areas): (Vec<usize>, Vec<f64>) = weights
        .iter()
        .enumerate()
        .filter(|(_, w)| **w > 0.0)
        .map(|(i, w)| (i, relative(*w) * scale))
        .unzip();

    let mut rest = region;
    let mut start = 0;
    while start < areas.len() {
        let (rw, rh) = (rest.width(), rest.height());
        if rw <= 0.0 || rh <= 0.0 {
            tracing::debug!(
                "Squarify: region exhausted with {} cells left, collapsing them",
                areas.len() - start
            );
            break;
        }

        // A wide region gets a column along its left edge, a tall one a row along its top.
        let column = rw >= rh;
        let short = if column { rh } else { rw };

        // Grow the strip while its worst aspect ratio keeps improving.
        let mut end = start + 1;
        let mut strip_sum = areas[start];
        let mut best = worst_aspect_ratio(&areas[start..end], strip_sum, short);
        while end < areas.len() {
            let sum = strip_sum + areas[end];
            let score = worst_aspect_ratio(&areas[start..=end], sum, short);
            if score > best {
                break;
            }
            best = score;
            strip_sum = sum;
            end += 1;
        }

        let last_strip = end == areas.len();
        let thickness = strip_sum / short;

        if column {
            let x1 = if last_strip {
                rest.x1
            } else {
                (rest.x0 + thickness).min(rest.x1)
            };
            let mut y = rest.y0;
            for k in start..end {
                let y_end = if k + 1 == end {
                    rest.y1
                } else {
                    (y + areas[k] / thickness).min(rest.y1)
                };
                out[slots[k]] = Edges::new(rest.x0, y, x1, y_end);
                y = y_end;
            }
            rest.x0 = x1;
        } else {
            let y1 = if last_strip {
                rest.y1
            } else {
                (rest.y0 + thickness).min(rest.y1)
            };
            let mut x = rest.x0;
            for k in start..end {
                let x_end = if k + 1 == end {
                    rest.x1
                } else {
                    (x + areas[k] / thickness).min(rest.x1)
                };
                out[slots[k]] = Edges::new(x, rest.y0, x_end, y1);
                x = x_end;
            }
            rest.y0 = y1;
        }

        start = end;
    }

    out
}

fn worst_aspect_ratio(row: &[f64], sum: f64, side: f64) -> f64 {
    if row.is_empty() || sum <= 0.0 || side <= 0.0 {
        return f64::MAX;
    }
    let side_sq = side * side;
    let sum_sq = sum * sum;
    let max_r = row.iter().copied().fold(0.0, f64::max);
    let min_r = row.iter().copied().fold(f64::INFINITY, f64::min);
    let a = (side_sq * max_r) / sum_sq;
    let b = sum_sq / (side_sq * min_r);
    a.max(b)
}
