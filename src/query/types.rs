use std::collections::BTreeMap;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// A single cell value. Query results only ever carry numbers, strings or null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    #[default]
    Null,
    Number(f64),
    Text(CompactString),
}

impl Scalar {
    pub fn text(s: &str) -> Self {
        Scalar::Text(CompactString::new(s))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Numeric view of the value. Text and null are not numbers.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Display form used for keys and labels; `None` for null.
    pub fn display(&self) -> Option<CompactString> {
        match self {
            Scalar::Null => None,
            Scalar::Number(n) => Some(compact_str::format_compact!("{}", n)),
            Scalar::Text(s) => Some(s.clone()),
        }
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Number(n)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::text(s)
    }
}

/// A navigation link attached to a data cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationLink {
    #[serde(default)]
    pub label: CompactString,
    #[serde(rename = "type", default)]
    pub link_type: CompactString,
    #[serde(default)]
    pub type_label: CompactString,
    pub url: String,
}

impl NavigationLink {
    pub fn new(label: &str, url: &str) -> Self {
        Self {
            label: CompactString::new(label),
            link_type: CompactString::new("drill"),
            type_label: CompactString::new("Explore"),
            url: url.to_string(),
        }
    }
}

/// One cell of a result row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(default)]
    pub value: Scalar,
    #[serde(default)]
    pub links: Vec<NavigationLink>,
    /// Host-rendered text (HTML or pre-formatted value). Never read by the pipeline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendered: Option<String>,
}

impl Cell {
    pub fn new(value: impl Into<Scalar>) -> Self {
        Self {
            value: value.into(),
            links: Vec::new(),
            rendered: None,
        }
    }

    pub fn with_link(mut self, link: NavigationLink) -> Self {
        self.links.push(link);
        self
    }
}

/// A result row: field name → cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    cells: BTreeMap<String, Cell>,
}

static NULL_SCALAR: Scalar = Scalar::Null;

impl Row {
    pub fn from_cells<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = (S, Cell)>,
        S: Into<String>,
    {
        Self {
            cells: cells.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn cell(&self, field: &str) -> Option<&Cell> {
        self.cells.get(field)
    }

    /// Value of the named field; a missing cell reads as null.
    pub fn value(&self, field: &str) -> &Scalar {
        self.cells.get(field).map(|c| &c.value).unwrap_or(&NULL_SCALAR)
    }

    pub fn links(&self, field: &str) -> &[NavigationLink] {
        self.cells.get(field).map(|c| c.links.as_slice()).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// How a field participates in the query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRole {
    #[default]
    Dimension,
    Measure,
    /// Calculated column; stands in for a measure when none is selected.
    TableCalculation,
    Pivot,
}

/// Field metadata from the query response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    /// Spreadsheet-style number format, e.g. `$#,##0.00`.
    #[serde(default)]
    pub value_format: Option<String>,
    #[serde(default)]
    pub role: FieldRole,
}

impl Field {
    pub fn new(name: &str, role: FieldRole) -> Self {
        Self {
            name: name.to_string(),
            label: None,
            value_format: None,
            role,
        }
    }

    pub fn dimension(name: &str) -> Self {
        Self::new(name, FieldRole::Dimension)
    }

    pub fn measure(name: &str) -> Self {
        Self::new(name, FieldRole::Measure)
    }

    pub fn with_format(mut self, format: &str) -> Self {
        self.value_format = Some(format.to_string());
        self
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

/// Role-tagged field lists, as delivered alongside the rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryFields {
    #[serde(default)]
    pub dimension_like: Vec<Field>,
    #[serde(default)]
    pub measure_like: Vec<Field>,
    #[serde(default)]
    pub table_calculations: Vec<Field>,
    #[serde(default)]
    pub pivots: Vec<Field>,
}

impl QueryFields {
    /// Overwrite each field's role with the list it was delivered in.
    pub fn tag_roles(&mut self) {
        let lists = [
            (&mut self.dimension_like, FieldRole::Dimension),
            (&mut self.measure_like, FieldRole::Measure),
            (&mut self.table_calculations, FieldRole::TableCalculation),
            (&mut self.pivots, FieldRole::Pivot),
        ];
        for (fields, role) in lists {
            for field in fields.iter_mut() {
                field.role = role;
            }
        }
    }

    /// Measures first, then table calculations as substitutes.
    pub fn measure_candidates(&self) -> impl Iterator<Item = &Field> {
        self.measure_like.iter().chain(self.table_calculations.iter())
    }

    /// Sizing measure.
    pub fn primary_measure(&self) -> Option<&Field> {
        self.measure_candidates().next()
    }

    /// Color-gradient measure, if a second one is present.
    pub fn secondary_measure(&self) -> Option<&Field> {
        self.measure_candidates().nth(1)
    }
}

/// Rows plus field metadata for one update cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub fields: QueryFields,
    #[serde(default, alias = "data")]
    pub rows: Vec<Row>,
}

impl QueryResponse {
    pub fn new(fields: QueryFields, rows: Vec<Row>) -> Self {
        let mut fields = fields;
        fields.tag_roles();
        Self { fields, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_decodes_closed_variants() {
        let values: Vec<Scalar> = serde_json::from_value(json!([null, 3, 2.5, "x"])).unwrap();
        assert_eq!(
            values,
            vec![
                Scalar::Null,
                Scalar::Number(3.0),
                Scalar::Number(2.5),
                Scalar::text("x")
            ]
        );
    }

    #[test]
    fn missing_cell_reads_as_null() {
        let row: Row = serde_json::from_value(json!({
            "orders.count": { "value": 4, "links": [{ "label": "Show", "url": "/x?a=1" }] }
        }))
        .unwrap();
        assert_eq!(row.value("orders.count"), &Scalar::Number(4.0));
        assert_eq!(row.value("nope"), &Scalar::Null);
        assert_eq!(row.links("orders.count").len(), 1);
        assert!(row.links("nope").is_empty());
    }

    #[test]
    fn table_calculation_substitutes_for_missing_measure() {
        let mut fields = QueryFields {
            dimension_like: vec![Field::dimension("d")],
            table_calculations: vec![Field::new("calc", FieldRole::Dimension)],
            ..Default::default()
        };
        fields.tag_roles();
        let primary = fields.primary_measure().unwrap();
        assert_eq!(primary.name, "calc");
        assert_eq!(primary.role, FieldRole::TableCalculation);
        assert!(fields.secondary_measure().is_none());
    }

    #[test]
    fn number_display_drops_trailing_zero_fraction() {
        assert_eq!(Scalar::Number(2019.0).display().unwrap(), "2019");
        assert_eq!(Scalar::Number(0.5).display().unwrap(), "0.5");
        assert!(Scalar::Null.display().is_none());
    }
}
