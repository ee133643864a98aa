use thiserror::Error;

use crate::core::io::cif::CifError;
use crate::core::lattice::GeometryError;
use crate::core::models::cell::CellError;
use crate::core::models::params::ParameterError;
use std::path::PathBuf;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid chiral indices ({n}, {m}): {reason}")]
    InvalidChirality {
        n: i64,
        m: i64,
        reason: &'static str,
    },

    #[error("Invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Failed to write structure to '{}': {source}", path.display())]
    SerializationFailure {
        path: PathBuf,
        #[source]
        source: CifError,
    },

    #[error("Cannot split {count} sites evenly between two species")]
    UnbalancedSpecies { count: usize },

    #[error("Output file name '{filename}' is used more than once in this batch")]
    DuplicateOutput { filename: String },

    #[error("Output directory '{}' is unusable: {source}", path.display())]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),
}

impl From<ParameterError> for EngineError {
    fn from(error: ParameterError) -> Self {
        match error {
            ParameterError::InvalidChirality { n, m, reason } => {
                EngineError::InvalidChirality { n, m, reason }
            }
            ParameterError::InvalidParameter {
                name,
                value,
                reason,
            } => EngineError::InvalidParameter {
                name,
                value,
                reason,
            },
        }
    }
}

impl From<GeometryError> for EngineError {
    fn from(error: GeometryError) -> Self {
        match error {
            GeometryError::Parameter(e) => e.into(),
            mismatch @ GeometryError::AtomCountMismatch { .. } => {
                EngineError::Internal(mismatch.to_string())
            }
        }
    }
}

impl From<CellError> for EngineError {
    fn from(error: CellError) -> Self {
        match error {
            CellError::InvalidParameter { name, value } => EngineError::InvalidParameter {
                name,
                value: value.to_string(),
                reason: "produces an invalid periodic cell",
            },
            singular @ CellError::Singular { .. } => EngineError::Internal(singular.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::params::ChiralIndex;

    #[test]
    fn parameter_errors_map_onto_matching_variants() {
        let chirality: EngineError = ChiralIndex::new(0, 0).unwrap_err().into();
        assert!(matches!(
            chirality,
            EngineError::InvalidChirality { n: 0, m: 0, .. }
        ));

        let parameter: EngineError =
            ParameterError::invalid("bond_length", -1.0, "must be positive").into();
        assert!(matches!(
            parameter,
            EngineError::InvalidParameter {
                name: "bond_length",
                ..
            }
        ));
    }

    #[test]
    fn geometry_errors_keep_parameter_context() {
        let geometry = GeometryError::Parameter(ParameterError::invalid("length", 0, "must be at least 1"));
        let engine: EngineError = geometry.into();
        assert!(matches!(
            engine,
            EngineError::InvalidParameter { name: "length", .. }
        ));
        assert!(engine.to_string().contains("length"));
    }

    #[test]
    fn count_mismatch_is_an_internal_error() {
        let mismatch = GeometryError::AtomCountMismatch {
            chirality: ChiralIndex::new(5, 0).unwrap(),
            expected: 20,
            found: 18,
        };
        assert!(matches!(EngineError::from(mismatch), EngineError::Internal(_)));
    }
}
