use hexroll::core::io::table::TableError;
use hexroll::core::presets::PresetError;
use hexroll::engine::config::ConfigError;
use hexroll::engine::error::EngineError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Compound preset error: {0}")]
    Preset(#[from] PresetError),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Batch finished with {failed} failed structure(s) out of {total}")]
    BatchFailed { failed: usize, total: usize },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ConfigError> for CliError {
    fn from(error: ConfigError) -> Self {
        CliError::Config(error.to_string())
    }
}

impl From<TableError> for CliError {
    fn from(error: TableError) -> Self {
        match error {
            TableError::Io { path, source } => CliError::FileParsing {
                path: PathBuf::from(path),
                source: source.into(),
            },
            TableError::Csv { path, source } => CliError::FileParsing {
                path: PathBuf::from(path),
                source: source.into(),
            },
            TableError::Row { path, row, source } => CliError::FileParsing {
                path: PathBuf::from(path),
                source: anyhow::anyhow!("row {}: {}", row, source),
            },
        }
    }
}
