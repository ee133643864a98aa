use crate::cli::SheetArgs;
use crate::config::resolve_structure_args;
use crate::error::Result;
use hexroll::core::lattice::honeycomb::SheetShape;
use hexroll::core::models::params::LatticeParams;
use hexroll::engine::config::StructureKind;
use hexroll::engine::error::EngineError;
use hexroll::workflows;
use tracing::info;

pub fn run(args: SheetArgs) -> Result<()> {
    let (compound, settings) = resolve_structure_args(&args.structure)?;
    let lattice = match (args.bond_length, args.lattice_constant) {
        (Some(bond_length), _) => LatticeParams::from_bond_length(bond_length),
        (None, Some(lattice_constant)) => LatticeParams::from_lattice_constant(lattice_constant),
        (None, None) => Ok(compound.planar_params()),
    }
    .map_err(EngineError::from)?;
    let shape = if args.rectangular {
        SheetShape::Rectangular
    } else {
        SheetShape::Hexagonal
    };
    let config = settings.config(
        StructureKind::Sheet {
            repeats: args.repeats,
            shape,
        },
        lattice,
        None,
    )?;

    info!(
        "Building {} {:?} sheet, {}x{} cells, lattice constant {:.4} A.",
        settings.species,
        shape,
        args.repeats[0],
        args.repeats[1],
        lattice.lattice_constant()
    );
    let structure = workflows::generate::run_to_path(&config, &args.output)?;

    println!(
        "✓ {} sheet: {} atoms, written to: {}",
        settings.species.formula(),
        structure.len(),
        args.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use hexroll::core::io::cif::CifFile;
    use hexroll::core::io::traits::StructureFile;
    use tempfile::tempdir;

    fn sheet_args(extra: &[&str]) -> SheetArgs {
        let args = ["hexroll", "sheet"].iter().chain(extra.iter()).copied();
        match Cli::parse_from(args).command {
            Commands::Sheet(args) => args,
            _ => panic!("Expected 'sheet' subcommand"),
        }
    }

    #[test]
    fn default_sheet_uses_the_compound_lattice_constant() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("AlP_sheet.cif");

        run(sheet_args(&["-o", output.to_str().unwrap()])).unwrap();

        let structure = CifFile::read_from_path(&output).unwrap();
        assert_eq!(structure.len(), 2);
        assert_eq!(structure.metadata_value("structure_class"), Some("planar"));
        assert_eq!(structure.metadata_value("lattice_constant"), Some("3.82"));
        let lengths = structure.cell().lengths();
        assert!((lengths[0] - 3.82).abs() < 1e-6);
        assert!((lengths[2] - 20.0).abs() < 1e-6);
    }

    #[test]
    fn rectangular_repeats_with_adaptive_padding() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("BN_sheet.cif");

        run(sheet_args(&[
            "--compound",
            "BN",
            "--repeats",
            "3,2",
            "--rectangular",
            "--buffer",
            "12",
            "-o",
            output.to_str().unwrap(),
        ]))
        .unwrap();

        let structure = CifFile::read_from_path(&output).unwrap();
        assert_eq!(structure.len(), 24);
        let counts = structure.species_counts();
        assert_eq!(counts.get("B"), Some(&12));
        assert_eq!(counts.get("N"), Some(&12));
        let lengths = structure.cell().lengths();
        assert!((lengths[2] - 12.0).abs() < 1e-6);
        let angles = structure.cell().angles();
        assert!((angles[2] - 90.0).abs() < 1e-6);
    }
}
