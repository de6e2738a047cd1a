pub mod types;

use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::config::VisConfig;
use crate::layout::Bounds;
use self::types::QueryResponse;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed update document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid bounds {width}x{height}")]
    InvalidBounds { width: f64, height: f64 },
}

/// One host update: query results, options and the current surface size.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDocument {
    #[serde(alias = "queryResponse")]
    pub query: QueryResponse,
    #[serde(default)]
    pub config: VisConfig,
    pub bounds: Bounds,
}

/// Decode an update document and tag field roles from their source lists.
pub fn parse_update(json: &str) -> Result<UpdateDocument, InputError> {
    let mut doc: UpdateDocument = serde_json::from_str(json)?;
    doc.query.fields.tag_roles();

    let Bounds { width, height } = doc.bounds;
    if !width.is_finite() || !height.is_finite() || width < 0.0 || height < 0.0 {
        return Err(InputError::InvalidBounds { width, height });
    }

    tracing::debug!(
        "Parsed update: {} rows, {} dimensions, {} measures, {} table calcs, {} pivots",
        doc.query.rows.len(),
        doc.query.fields.dimension_like.len(),
        doc.query.fields.measure_like.len(),
        doc.query.fields.table_calculations.len(),
        doc.query.fields.pivots.len()
    );
    Ok(doc)
}

pub fn load_update(path: &Path) -> Result<UpdateDocument, InputError> {
    let mut text = String::new();
    std::fs::File::open(path)?.read_to_string(&mut text)?;
    parse_update(&text)
}
