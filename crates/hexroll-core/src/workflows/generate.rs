use crate::core::io::cif::{CifError, CifFile};
use crate::core::io::traits::StructureFile;
use crate::core::models::structure::Structure;
use crate::engine::builder::build_structure;
use crate::engine::config::GenerationConfig;
use crate::engine::error::EngineError;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{info, instrument, warn};

/// Builds the structure described by `config`.
#[instrument(skip_all, name = "generate_workflow")]
pub fn run(config: &GenerationConfig) -> Result<Structure, EngineError> {
    let structure = build_structure(config)?;
    info!(
        "Generated {} atoms in a {:.3} x {:.3} x {:.3} A cell.",
        structure.len(),
        structure.cell().lengths()[0],
        structure.cell().lengths()[1],
        structure.cell().lengths()[2]
    );
    Ok(structure)
}

/// Writes `structure` as a CIF record to `path`.
///
/// If writing fails after the file was created, whatever was written is removed so
/// that no partial record is left behind. A file that could not be opened is left
/// untouched.
///
/// # Errors
///
/// Returns [`EngineError::SerializationFailure`] carrying the path and the I/O or format
/// error.
pub fn write(structure: &Structure, path: &Path) -> Result<(), EngineError> {
    let failure = |source: CifError| EngineError::SerializationFailure {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(|e| failure(e.into()))?;
    let mut writer = BufWriter::new(file);
    let written = CifFile::write_to(structure, &mut writer)
        .and_then(|()| writer.flush().map_err(CifError::from));

    if let Err(source) = written {
        drop(writer);
        if let Err(e) = fs::remove_file(path) {
            warn!("Could not remove partial file '{}': {}", path.display(), e);
        }
        return Err(failure(source));
    }
    info!("Wrote {}.", path.display());
    Ok(())
}

/// Builds the structure described by `config` and writes it to `path`.
///
/// Nothing is written if generation fails.
pub fn run_to_path(config: &GenerationConfig, path: &Path) -> Result<Structure, EngineError> {
    let structure = run(config)?;
    write(&structure, path)?;
    Ok(structure)
}
