use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::query::types::QueryFields;

/// Which field list a cardinality check applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Dimension,
    Measure,
    Pivot,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldKind::Dimension => "dimension",
            FieldKind::Measure => "measure",
            FieldKind::Pivot => "pivot",
        })
    }
}

/// Inclusive `[min, max]` count band; no max means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub min: usize,
    pub max: Option<usize>,
}

impl Band {
    pub fn contains(&self, n: usize) -> bool {
        n >= self.min && self.max.map_or(true, |max| n <= max)
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "exactly {}", max),
            Some(max) => write!(f, "{} to {}", self.min, max),
            None => write!(f, "at least {}", self.min),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Treemap requires at least {required} dimension(s), but {found} selected")]
    InsufficientDimensions { required: usize, found: usize },

    #[error("Treemap requires a measure or a table calculation to size regions")]
    MissingPrimaryMeasure,

    #[error("Treemap accepts {band} {kind} field(s), but {found} selected")]
    CardinalityOutOfRange {
        kind: FieldKind,
        found: usize,
        band: Band,
    },
}

impl ValidationError {
    /// Error group id; a host replaces errors of the same group.
    pub fn group(&self) -> &'static str {
        match self {
            ValidationError::InsufficientDimensions { .. } => "dimension-req",
            ValidationError::MissingPrimaryMeasure => "measure-req",
            ValidationError::CardinalityOutOfRange { kind, .. } => match kind {
                FieldKind::Dimension => "dimension-req",
                FieldKind::Measure => "measure-req",
                FieldKind::Pivot => "pivot-req",
            },
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ValidationError::InsufficientDimensions { .. } => "Not enough dimensions",
            ValidationError::MissingPrimaryMeasure => "No measure selected",
            ValidationError::CardinalityOutOfRange { kind, .. } => match kind {
                FieldKind::Dimension => "Incompatible dimensions",
                FieldKind::Measure => "Incompatible measures",
                FieldKind::Pivot => "Pivots not supported",
            },
        }
    }

    pub fn to_vis_error(&self) -> VisError {
        VisError {
            group: self.group(),
            title: self.title().to_string(),
            message: self.to_string(),
        }
    }
}

/// Structured error object handed to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisError {
    pub group: &'static str,
    pub title: String,
    pub message: String,
}

/// Host capability for surfacing validation errors.
pub trait ErrorSink {
    fn add_error(&mut self, error: &VisError);
    /// Clear errors of one group, or all of them with `None`.
    fn clear_errors(&mut self, group: Option<&str>);
}

/// Keeps errors in memory (tests, CLI reporting).
#[derive(Debug, Default)]
pub struct CollectedErrors {
    pub errors: Vec<VisError>,
}

impl ErrorSink for CollectedErrors {
    fn add_error(&mut self, error: &VisError) {
        self.errors.retain(|e| e.group != error.group);
        self.errors.push(error.clone());
    }

    fn clear_errors(&mut self, group: Option<&str>) {
        match group {
            Some(group) => self.errors.retain(|e| e.group != group),
            None => self.errors.clear(),
        }
    }
}

/// Accepted field counts.
#[derive(Debug, Clone)]
pub struct Requirements {
    pub min_dimensions: usize,
    pub max_dimensions: Option<usize>,
    pub min_measures: usize,
    pub max_measures: Option<usize>,
    pub min_pivots: usize,
    pub max_pivots: Option<usize>,
}

impl Default for Requirements {
    fn default() -> Self {
        Self {
            min_dimensions: 1,
            max_dimensions: None,
            min_measures: 1,
            max_measures: None,
            min_pivots: 0,
            max_pivots: Some(0),
        }
    }
}

/// Check field counts before the pipeline runs. Pivots are checked first,
/// then dimensions, then measures; the first failure is returned.
pub fn validate(fields: &QueryFields, req: &Requirements) -> Result<(), ValidationError> {
    check_band(
        FieldKind::Pivot,
        fields.pivots.len(),
        Band {
            min: req.min_pivots,
            max: req.max_pivots,
        },
    )?;

    let dimensions = fields.dimension_like.len();
    if dimensions < req.min_dimensions {
        return Err(ValidationError::InsufficientDimensions {
            required: req.min_dimensions,
            found: dimensions,
        });
    }
    check_band(
        FieldKind::Dimension,
        dimensions,
        Band {
            min: req.min_dimensions,
            max: req.max_dimensions,
        },
    )?;

    if fields.primary_measure().is_none() {
        return Err(ValidationError::MissingPrimaryMeasure);
    }
    check_band(
        FieldKind::Measure,
        fields.measure_candidates().count(),
        Band {
            min: req.min_measures,
            max: req.max_measures,
        },
    )
}

fn check_band(kind: FieldKind, found: usize, band: Band) -> Result<(), ValidationError> {
    if band.contains(found) {
        Ok(())
    } else {
        Err(ValidationError::CardinalityOutOfRange { kind, found, band })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::types::Field;

    fn fields(dims: usize, measures: usize, calcs: usize, pivots: usize) -> QueryFields {
        let mut fields = QueryFields {
            dimension_like: (0..dims).map(|i| Field::dimension(&format!("d{i}"))).collect(),
            measure_like: (0..measures).map(|i| Field::measure(&format!("m{i}"))).collect(),
            table_calculations: (0..calcs).map(|i| Field::measure(&format!("t{i}"))).collect(),
            pivots: (0..pivots).map(|i| Field::dimension(&format!("p{i}"))).collect(),
        };
        fields.tag_roles();
        fields
    }

    #[test]
    fn accepts_typical_query() {
        assert!(validate(&fields(2, 2, 0, 0), &Requirements::default()).is_ok());
    }

    #[test]
    fn zero_dimensions_is_insufficient() {
        let err = validate(&fields(0, 1, 0, 0), &Requirements::default()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InsufficientDimensions {
                required: 1,
                found: 0
            }
        );
        assert_eq!(err.group(), "dimension-req");
    }

    #[test]
    fn table_calculation_substitutes_for_measure() {
        assert!(validate(&fields(1, 0, 1, 0), &Requirements::default()).is_ok());
        let err = validate(&fields(1, 0, 0, 0), &Requirements::default()).unwrap_err();
        assert_eq!(err, ValidationError::MissingPrimaryMeasure);
    }

    #[test]
    fn pivots_are_rejected_first() {
        let err = validate(&fields(0, 0, 0, 1), &Requirements::default()).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::CardinalityOutOfRange {
                kind: FieldKind::Pivot,
                found: 1,
                ..
            }
        ));
        assert_eq!(err.to_vis_error().group, "pivot-req");
        assert!(err.to_string().contains("exactly 0"));
    }

    #[test]
    fn too_many_dimensions_is_out_of_range() {
        let req = Requirements {
            max_dimensions: Some(2),
            ..Default::default()
        };
        let err = validate(&fields(3, 1, 0, 0), &req).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::CardinalityOutOfRange {
                kind: FieldKind::Dimension,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn collected_errors_replace_by_group() {
        let mut sink = CollectedErrors::default();
        sink.add_error(&ValidationError::MissingPrimaryMeasure.to_vis_error());
        sink.add_error(&ValidationError::MissingPrimaryMeasure.to_vis_error());
        assert_eq!(sink.errors.len(), 1);
        sink.clear_errors(Some("measure-req"));
        assert!(sink.errors.is_empty());
    }
}
