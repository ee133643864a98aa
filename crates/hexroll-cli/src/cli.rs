use crate::utils::parser::{parse_coloring, parse_repeats, parse_species_pair};
use clap::{Args, Parser, Subcommand};
use hexroll::core::models::species::SpeciesPair;
use hexroll::engine::config::ColoringStrategy;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "hexroll - builds binary-compound honeycomb sheets and nanotubes in vacuum-padded periodic cells and writes them as CIF files.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used for batch generation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a single (n, m) nanotube and write it as a CIF file.
    Tube(TubeArgs),
    /// Build a flat honeycomb sheet and write it as a CIF file.
    Sheet(SheetArgs),
    /// Build a whole batch of structures into an output directory.
    Batch(BatchArgs),
}

/// Options shared by every command that builds structures.
#[derive(Args, Debug, Clone, Default)]
pub struct StructureArgs {
    /// Compound preset supplying species and bond lengths (e.g., 'AlP', 'BN', 'SiC').
    #[arg(long, value_name = "NAME")]
    pub compound: Option<String>,

    /// TOML file with additional compound presets.
    #[arg(long, value_name = "PATH")]
    pub compounds: Option<PathBuf>,

    /// Override the two species, in sublattice order (e.g., 'Al,P').
    #[arg(long, value_name = "A,B", value_parser = parse_species_pair)]
    pub species: Option<SpeciesPair>,

    #[command(flatten)]
    pub vacuum: VacuumArgs,

    /// Species assignment strategy: 'traversal-parity' or 'sublattice'.
    #[arg(long, value_name = "STRATEGY", value_parser = parse_coloring)]
    pub coloring: Option<ColoringStrategy>,

    /// Accept structures with an odd number of sites (species A gets the extra site).
    #[arg(long)]
    pub allow_odd_count: bool,

    /// Keep generation coordinates instead of centering the structure in the cell.
    #[arg(long)]
    pub no_center: bool,
}

/// Cell sizing: a fixed padded size or the structure's extent plus a buffer.
#[derive(Args, Debug, Clone, Copy, Default)]
#[group(required = false, multiple = false)]
pub struct VacuumArgs {
    /// Fixed size of the padded cell directions, in Angstroms.
    #[arg(long, value_name = "ANGSTROM")]
    pub vacuum: Option<f64>,

    /// Pad the cell to the structure's extent plus this buffer, in Angstroms.
    #[arg(long, value_name = "ANGSTROM")]
    pub buffer: Option<f64>,
}

/// Arguments for the `tube` subcommand.
#[derive(Args, Debug)]
pub struct TubeArgs {
    /// First chiral index.
    #[arg(short = 'n', long = "n", value_name = "INT")]
    pub n: i64,

    /// Second chiral index (0 <= m <= n).
    #[arg(short = 'm', long = "m", value_name = "INT")]
    pub m: i64,

    /// Override the bond length, in Angstroms. Defaults to the compound's value for the
    /// tube class.
    #[arg(short, long, value_name = "ANGSTROM")]
    pub bond_length: Option<f64>,

    /// Number of axial periods to stack.
    #[arg(short = 'L', long, value_name = "INT", default_value_t = 1)]
    pub length: usize,

    /// Path for the output CIF file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    #[command(flatten)]
    pub structure: StructureArgs,
}

/// Arguments for the `sheet` subcommand.
#[derive(Args, Debug)]
pub struct SheetArgs {
    /// Override the bond length, in Angstroms.
    #[arg(short, long, value_name = "ANGSTROM", conflicts_with = "lattice_constant")]
    pub bond_length: Option<f64>,

    /// Override the lattice constant, in Angstroms.
    #[arg(short = 'a', long, value_name = "ANGSTROM")]
    pub lattice_constant: Option<f64>,

    /// Number of cells along each in-plane direction.
    #[arg(short, long, value_name = "NX,NY", value_parser = parse_repeats, default_value = "1,1")]
    pub repeats: [usize; 2],

    /// Tile the orthogonal four-atom cell instead of the primitive hexagonal one.
    #[arg(long)]
    pub rectangular: bool,

    /// Path for the output CIF file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    #[command(flatten)]
    pub structure: StructureArgs,
}

/// Arguments for the `batch` subcommand.
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Batch plan in TOML format.
    #[arg(short, long, value_name = "PATH", required_unless_present = "table")]
    pub config: Option<PathBuf>,

    /// CSV parameter table (class,n,m,bond_length,filename), added to the plan's entries.
    #[arg(short, long, value_name = "PATH")]
    pub table: Option<PathBuf>,

    /// Override the output directory.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Keep files already in the output directory instead of resetting it.
    #[arg(long)]
    pub keep_existing: bool,

    /// Stop at the first structure that fails.
    #[arg(long)]
    pub fail_fast: bool,

    #[command(flatten)]
    pub structure: StructureArgs,

    /// Set a specific plan value, overriding the config file.
    /// Can be used multiple times. Example: -S vacuum=25
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}
