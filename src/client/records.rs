//! Flat-file record source
//!
//! Reads client records from a CSV export (one row per client) and hands
//! them out by identifier.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::models::{FeatureRecord, FeatureValue};

/// Identifier column of the source dataset
pub const DEFAULT_ID_COLUMN: &str = "SK_ID_CURR";

#[derive(Debug, thiserror::Error)]
pub enum RecordSourceError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("id column '{0}' not found in header")]
    MissingIdColumn(String),
}

/// Interpret one CSV cell the way a DataFrame reader would
pub fn parse_cell(raw: &str) -> FeatureValue {
    let cell = raw.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") || cell.eq_ignore_ascii_case("na") {
        return FeatureValue::Missing;
    }
    if let Ok(n) = cell.parse::<f64>() {
        return FeatureValue::Number(n);
    }
    match cell {
        "True" | "true" => FeatureValue::Bool(true),
        "False" | "false" => FeatureValue::Bool(false),
        _ => FeatureValue::Text(cell.to_string()),
    }
}

#[derive(Debug, Clone)]
pub struct RecordSource {
    id_column: String,
    rows: Vec<(String, FeatureRecord)>,
}

impl RecordSource {
    pub fn from_path(path: &Path, id_column: &str) -> Result<Self, RecordSourceError> {
        let file = File::open(path).map_err(|source| RecordSourceError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(file, id_column)
    }

    pub fn from_reader<R: Read>(reader: R, id_column: &str) -> Result<Self, RecordSourceError> {
        let mut rdr = csv::ReaderBuilder::new().flexible(false).from_reader(reader);
        let headers: StringRecord = rdr.headers()?.clone();

        let id_index = headers
            .iter()
            .position(|h| h == id_column)
            .ok_or_else(|| RecordSourceError::MissingIdColumn(id_column.to_string()))?;

        let mut rows = Vec::new();
        for row in rdr.records() {
            let row = row?;
            let id = row.get(id_index).unwrap_or_default().trim().to_string();
            let record: FeatureRecord = headers
                .iter()
                .zip(row.iter())
                .map(|(name, cell)| (name, parse_cell(cell)))
                .collect();
            rows.push((id, record));
        }

        Ok(Self {
            id_column: id_column.to_string(),
            rows,
        })
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Record identifiers in file order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|(id, _)| id.as_str())
    }

    /// First record with the given identifier
    pub fn find(&self, id: &str) -> Option<&FeatureRecord> {
        let id = id.trim();
        self.rows
            .iter()
            .find(|(row_id, _)| row_id == id || same_number(row_id, id))
            .map(|(_, record)| record)
    }
}

// "100002" and "100002.0" name the same client
fn same_number(a: &str, b: &str) -> bool {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x == y,
        _ => false,
    }
}
