use super::cell_sizer::Footprint;
use super::coloring::assign_species;
use super::config::{GenerationConfig, StructureKind};
use super::error::EngineError;
use crate::core::lattice::honeycomb::HoneycombLattice;
use crate::core::lattice::rolling::roll;
use crate::core::models::site::LatticeSite;
use crate::core::models::structure::Structure;
use nalgebra::{Point3, Vector3};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Builds the finished structure described by `config`.
///
/// Parameters are validated before any geometry is computed; on error no structure is
/// produced.
pub fn build_structure(config: &GenerationConfig) -> Result<Structure, EngineError> {
    config.vacuum.validate()?;
    let lattice = HoneycombLattice::from_params(&config.lattice);

    let (sites, footprint, mut metadata) = match config.structure {
        StructureKind::Tube { chirality, length } => {
            let tube = roll(&lattice, &chirality, length)?;
            let footprint = Footprint::Tube {
                diameter: tube.diameter(),
                period: tube.total_period(),
            };
            let mut metadata = BTreeMap::new();
            metadata.insert("structure_class".to_string(), "tube".to_string());
            metadata.insert("chiral_indices".to_string(), chirality.to_string());
            metadata.insert("tube_class".to_string(), chirality.class().to_string());
            metadata.insert("diameter".to_string(), format_length(tube.diameter()));
            metadata.insert("axial_period".to_string(), format_length(tube.axial_period));
            metadata.insert("length".to_string(), length.to_string());
            (tube.sites, footprint, metadata)
        }
        StructureKind::Sheet { repeats, shape } => {
            let sheet = lattice.tile(repeats, shape)?;
            let sites: Vec<LatticeSite> = sheet
                .sites
                .iter()
                .map(|s| LatticeSite::new(Point3::new(s.position.x, s.position.y, 0.0), s.sublattice))
                .collect();
            let footprint = Footprint::Sheet {
                in_plane: sheet.cell,
                thickness: 0.0,
            };
            let mut metadata = BTreeMap::new();
            metadata.insert("structure_class".to_string(), "planar".to_string());
            metadata.insert(
                "lattice_constant".to_string(),
                format_length(lattice.lattice_constant()),
            );
            (sites, footprint, metadata)
        }
    };
    metadata.insert(
        "bond_length".to_string(),
        format_length(config.lattice.bond_length()),
    );
    metadata.insert("species".to_string(), config.species.to_string());
    metadata.insert("coloring".to_string(), config.coloring.as_str().to_string());

    let mut atoms = assign_species(&sites, &config.species, config.coloring, config.odd_count)?;
    trace!(atoms = atoms.len(), "Assigned species.");

    let sized = config.vacuum.sizer().size(&footprint)?;
    let shift = if config.center {
        sized.centering
    } else {
        Vector3::zeros()
    };
    for atom in &mut atoms {
        atom.position += shift;
    }

    debug!(
        "Built {} structure with {} atoms ({}).",
        metadata
            .get("structure_class")
            .map(String::as_str)
            .unwrap_or("unknown"),
        atoms.len(),
        config.species
    );

    Ok(Structure::new(atoms, sized.cell, [true; 3], metadata))
}

/// Formats a length in Angstroms with at most six decimals and no trailing zeros.
pub fn format_length(value: f64) -> String {
    let text = format!("{:.6}", value);
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}
