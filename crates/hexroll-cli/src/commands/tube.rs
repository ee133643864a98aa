use crate::cli::TubeArgs;
use crate::config::resolve_structure_args;
use crate::error::Result;
use hexroll::core::models::params::{ChiralIndex, LatticeParams};
use hexroll::engine::config::StructureKind;
use hexroll::engine::error::EngineError;
use hexroll::workflows;
use tracing::info;

pub fn run(args: TubeArgs) -> Result<()> {
    let (compound, settings) = resolve_structure_args(&args.structure)?;
    let chirality = ChiralIndex::new(args.n, args.m).map_err(EngineError::from)?;
    let lattice = match args.bond_length {
        Some(bond_length) => LatticeParams::from_bond_length(bond_length).map_err(EngineError::from)?,
        None => compound.tube_params(chirality.class()),
    };
    let config = settings.config(
        StructureKind::Tube {
            chirality,
            length: args.length,
        },
        lattice,
        None,
    )?;

    info!(
        "Building {} {} tube {} with bond length {:.4} A.",
        settings.species,
        chirality.class(),
        chirality,
        lattice.bond_length()
    );
    let structure = workflows::generate::run_to_path(&config, &args.output)?;

    println!(
        "✓ {} tube {}: {} atoms, diameter {} A, written to: {}",
        settings.species.formula(),
        chirality,
        structure.len(),
        structure.metadata_value("diameter").unwrap_or("?"),
        args.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::error::CliError;
    use clap::Parser;
    use hexroll::core::io::cif::CifFile;
    use hexroll::core::io::traits::StructureFile;
    use tempfile::tempdir;

    fn tube_args(extra: &[&str]) -> TubeArgs {
        let args = ["hexroll", "tube"].iter().chain(extra.iter()).copied();
        match Cli::parse_from(args).command {
            Commands::Tube(args) => args,
            _ => panic!("Expected 'tube' subcommand"),
        }
    }

    #[test]
    fn writes_a_readable_tube() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("Z_AlPNT_5x0.cif");
        let output_str = output.to_str().unwrap();

        run(tube_args(&["-n", "5", "-m", "0", "-o", output_str])).unwrap();

        let structure = CifFile::read_from_path(&output).unwrap();
        assert_eq!(structure.len(), 20);
        assert_eq!(structure.metadata_value("chiral_indices"), Some("(5, 0)"));
        assert_eq!(structure.metadata_value("bond_length"), Some("2.27"));
        let counts = structure.species_counts();
        assert_eq!(counts.get("Al"), Some(&10));
        assert_eq!(counts.get("P"), Some(&10));
    }

    #[test]
    fn bond_length_and_species_overrides_apply() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("bn.cif");

        run(tube_args(&[
            "-n",
            "3",
            "-m",
            "3",
            "--bond-length",
            "1.44",
            "--species",
            "B,N",
            "--length",
            "2",
            "-o",
            output.to_str().unwrap(),
        ]))
        .unwrap();

        let structure = CifFile::read_from_path(&output).unwrap();
        assert_eq!(structure.len(), 24);
        assert_eq!(structure.metadata_value("bond_length"), Some("1.44"));
        assert_eq!(structure.metadata_value("species"), Some("B-N"));
    }

    #[test]
    fn invalid_chirality_writes_nothing() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("bad.cif");

        let result = run(tube_args(&["-n", "2", "-m", "4", "-o", output.to_str().unwrap()]));

        assert!(matches!(
            result,
            Err(CliError::Core(EngineError::InvalidChirality { n: 2, m: 4, .. }))
        ));
        assert!(!output.exists());
    }
}
