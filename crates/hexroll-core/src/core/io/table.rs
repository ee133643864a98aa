use crate::core::models::params::{ChiralIndex, ParameterError, TubeClass};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Class tag of planar rows.
pub const PLANAR_CLASS: &str = "planar";

/// One row of a batch parameter table.
///
/// Columns: `class,n,m,bond_length,filename`, optionally followed by `vacuum` (fixed
/// lateral size) or `buffer` (adaptive padding). `n` and `m` are left empty on planar rows.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ParameterRow {
    pub class: String,
    #[serde(default)]
    pub n: Option<i64>,
    #[serde(default)]
    pub m: Option<i64>,
    pub bond_length: f64,
    pub filename: String,
    #[serde(default)]
    pub vacuum: Option<f64>,
    #[serde(default)]
    pub buffer: Option<f64>,
}

/// What a row asks to be built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowStructure {
    Tube(ChiralIndex),
    Planar,
}

impl ParameterRow {
    /// Validates the class tag against the indices.
    ///
    /// A tube row whose class disagrees with its indices (e.g. `zigzag` with `(3, 3)`)
    /// is rejected rather than silently reclassified.
    pub fn structure(&self) -> Result<RowStructure, ParameterError> {
        if self.vacuum.is_some() && self.buffer.is_some() {
            return Err(ParameterError::invalid(
                "vacuum",
                format!("{:?}", self.vacuum),
                "cannot be combined with buffer",
            ));
        }
        if self.class.trim().eq_ignore_ascii_case(PLANAR_CLASS) {
            return Ok(RowStructure::Planar);
        }
        let class: TubeClass = self.class.trim().parse().map_err(|_| {
            ParameterError::invalid(
                "class",
                &self.class,
                "must be armchair, zigzag, chiral or planar",
            )
        })?;
        let (Some(n), Some(m)) = (self.n, self.m) else {
            return Err(ParameterError::invalid(
                "n, m",
                format!("{:?}, {:?}", self.n, self.m),
                "both indices are required for tube rows",
            ));
        };
        let chirality = ChiralIndex::new(n, m)?;
        if chirality.class() != class {
            return Err(ParameterError::invalid(
                "class",
                &self.class,
                "does not match the class implied by the chiral indices",
            ));
        }
        Ok(RowStructure::Tube(chirality))
    }
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Invalid row {row} in '{path}': {source}")]
    Row {
        path: String,
        row: usize,
        source: ParameterError,
    },
}

/// A validated batch parameter table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterTable {
    rows: Vec<ParameterRow>,
}

impl ParameterTable {
    pub fn load(path: &Path) -> Result<Self, TableError> {
        let display = path.to_string_lossy().to_string();
        let file = std::fs::File::open(path).map_err(|e| TableError::Io {
            path: display.clone(),
            source: e,
        })?;
        Self::from_reader(file, &display)
    }

    /// Reads and validates a table; `origin` names the source in error messages.
    pub fn from_reader(reader: impl Read, origin: &str) -> Result<Self, TableError> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let mut rows = Vec::new();
        for (index, result) in csv_reader.deserialize::<ParameterRow>().enumerate() {
            let row = result.map_err(|e| TableError::Csv {
                path: origin.to_string(),
                source: e,
            })?;
            row.structure().map_err(|e| TableError::Row {
                path: origin.to_string(),
                row: index + 1,
                source: e,
            })?;
            rows.push(row);
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[ParameterRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
