mod defaults;

use self::defaults::DefaultsConfig;
use crate::cli::{BatchArgs, StructureArgs};
use crate::error::{CliError, Result};
use crate::utils::parser;
use hexroll::core::io::table::{ParameterRow, ParameterTable, RowStructure};
use hexroll::core::lattice::honeycomb::SheetShape;
use hexroll::core::models::params::{ChiralIndex, LatticeParams};
use hexroll::core::models::species::SpeciesPair;
use hexroll::core::presets::{Compound, CompoundRegistry};
use hexroll::engine::config::{
    ColoringStrategy, GenerationConfig, GenerationConfigBuilder, OddCountPolicy, StructureKind,
    VacuumStrategy,
};
use hexroll::engine::error::EngineError;
use hexroll::workflows::batch::{BatchEntry, FailurePolicy, SeriesSpec, series_filename};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Generation settings shared by every structure of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedSettings {
    pub species: SpeciesPair,
    pub vacuum: VacuumStrategy,
    pub coloring: ColoringStrategy,
    pub odd_count: OddCountPolicy,
    pub center: bool,
}

impl SharedSettings {
    /// Completes the settings into a core configuration; `vacuum` overrides the shared
    /// strategy for this structure only.
    pub fn config(
        &self,
        structure: StructureKind,
        lattice: LatticeParams,
        vacuum: Option<VacuumStrategy>,
    ) -> Result<GenerationConfig> {
        Ok(GenerationConfigBuilder::new()
            .structure(structure)
            .lattice(lattice)
            .species(self.species.clone())
            .vacuum(vacuum.unwrap_or(self.vacuum))
            .coloring(self.coloring)
            .odd_count(self.odd_count)
            .center(self.center)
            .build()?)
    }
}

fn odd_count_policy(allow: bool) -> OddCountPolicy {
    if allow {
        OddCountPolicy::Permit
    } else {
        OddCountPolicy::Reject
    }
}

fn vacuum_strategy(vacuum: Option<f64>, buffer: Option<f64>) -> Result<Option<VacuumStrategy>> {
    match (vacuum, buffer) {
        (Some(_), Some(_)) => Err(CliError::Config(
            "`vacuum` and `buffer` are mutually exclusive".to_string(),
        )),
        (Some(size), None) => Ok(Some(VacuumStrategy::Fixed { size })),
        (None, Some(buffer)) => Ok(Some(VacuumStrategy::Adaptive { buffer })),
        (None, None) => Ok(None),
    }
}

fn bond_length_params(bond_length: Option<f64>) -> Result<Option<LatticeParams>> {
    Ok(bond_length
        .map(LatticeParams::from_bond_length)
        .transpose()
        .map_err(EngineError::from)?)
}

fn chiral_index(n: i64, m: i64) -> Result<ChiralIndex> {
    Ok(ChiralIndex::new(n, m).map_err(EngineError::from)?)
}

/// The built-in compound presets, extended by `extra` when given.
pub fn load_registry(extra: Option<&Path>) -> Result<CompoundRegistry> {
    let mut registry = CompoundRegistry::builtin()?;
    if let Some(path) = extra {
        debug!("Loading compound presets from {:?}", path);
        registry.load(path)?;
    }
    Ok(registry)
}

/// Resolves the structure options of a single-structure command against the compound
/// presets.
pub fn resolve_structure_args(args: &StructureArgs) -> Result<(Compound, SharedSettings)> {
    let defaults = DefaultsConfig::default();
    let registry = load_registry(args.compounds.as_deref())?;
    let compound = registry
        .get(args.compound.as_deref().unwrap_or(&defaults.compound))?
        .clone();
    let vacuum = vacuum_strategy(args.vacuum.vacuum, args.vacuum.buffer)?.unwrap_or(
        VacuumStrategy::Fixed {
            size: defaults.vacuum,
        },
    );
    let settings = SharedSettings {
        species: args
            .species
            .clone()
            .unwrap_or_else(|| compound.species.clone()),
        vacuum,
        coloring: args.coloring.unwrap_or(defaults.coloring),
        odd_count: odd_count_policy(args.allow_odd_count || defaults.allow_odd_count),
        center: defaults.center && !args.no_center,
    };
    Ok((compound, settings))
}

/// A batch plan after merging the plan file, the command line and the defaults.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub output_dir: PathBuf,
    /// Wipe the output directory before writing.
    pub reset: bool,
    pub policy: FailurePolicy,
    pub entries: Vec<BatchEntry>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialSeries {
    class: String,
    count: usize,
    start: Option<u32>,
    step: Option<u32>,
    bond_length: Option<f64>,
}

impl PartialSeries {
    fn entries(&self, compound: &Compound, plan: &PlanContext) -> Result<Vec<BatchEntry>> {
        let class = parser::parse_tube_class(&self.class)
            .map_err(|e| CliError::Config(e.to_string()))?;
        let spec = SeriesSpec {
            class,
            count: self.count,
            start: self.start.unwrap_or(SeriesSpec::DEFAULT_START),
            step: self.step.unwrap_or_else(|| SeriesSpec::default_step(class)),
        };
        let lattice =
            bond_length_params(self.bond_length)?.unwrap_or_else(|| compound.tube_params(class));
        spec.chiralities()
            .map_err(EngineError::from)?
            .into_iter()
            .map(|chirality| {
                Ok(BatchEntry {
                    filename: series_filename(&chirality, &plan.formula),
                    config: plan.settings.config(
                        StructureKind::Tube {
                            chirality,
                            length: plan.length,
                        },
                        lattice,
                        None,
                    )?,
                })
            })
            .collect()
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(
    rename_all = "kebab-case",
    rename_all_fields = "kebab-case",
    tag = "kind",
    deny_unknown_fields
)]
enum PartialStructure {
    Tube {
        n: i64,
        m: i64,
        filename: Option<String>,
        bond_length: Option<f64>,
        length: Option<usize>,
        vacuum: Option<f64>,
        buffer: Option<f64>,
    },
    Sheet {
        filename: String,
        bond_length: Option<f64>,
        lattice_constant: Option<f64>,
        repeats: Option<[usize; 2]>,
        rectangular: Option<bool>,
        vacuum: Option<f64>,
        buffer: Option<f64>,
    },
}

impl PartialStructure {
    fn entry(&self, compound: &Compound, plan: &PlanContext) -> Result<BatchEntry> {
        match self {
            PartialStructure::Tube {
                n,
                m,
                filename,
                bond_length,
                length,
                vacuum,
                buffer,
            } => {
                let chirality = chiral_index(*n, *m)?;
                let lattice = bond_length_params(*bond_length)?
                    .unwrap_or_else(|| compound.tube_params(chirality.class()));
                let structure = StructureKind::Tube {
                    chirality,
                    length: length.unwrap_or(plan.length),
                };
                Ok(BatchEntry {
                    filename: filename
                        .clone()
                        .unwrap_or_else(|| series_filename(&chirality, &plan.formula)),
                    config: plan.settings.config(
                        structure,
                        lattice,
                        vacuum_strategy(*vacuum, *buffer)?,
                    )?,
                })
            }
            PartialStructure::Sheet {
                filename,
                bond_length,
                lattice_constant,
                repeats,
                rectangular,
                vacuum,
                buffer,
            } => {
                let lattice = match (bond_length, lattice_constant) {
                    (Some(_), Some(_)) => {
                        return Err(CliError::Config(format!(
                            "Sheet '{}' sets both `bond-length` and `lattice-constant`",
                            filename
                        )));
                    }
                    (Some(b), None) => LatticeParams::from_bond_length(*b),
                    (None, Some(a)) => LatticeParams::from_lattice_constant(*a),
                    (None, None) => Ok(compound.planar_params()),
                }
                .map_err(EngineError::from)?;
                let shape = if rectangular.unwrap_or(false) {
                    SheetShape::Rectangular
                } else {
                    SheetShape::Hexagonal
                };
                let structure = StructureKind::Sheet {
                    repeats: repeats.unwrap_or(plan.repeats),
                    shape,
                };
                Ok(BatchEntry {
                    filename: filename.clone(),
                    config: plan.settings.config(
                        structure,
                        lattice,
                        vacuum_strategy(*vacuum, *buffer)?,
                    )?,
                })
            }
        }
    }
}

/// Values every plan entry is resolved against.
struct PlanContext {
    settings: SharedSettings,
    formula: String,
    length: usize,
    repeats: [usize; 2],
}

impl PlanContext {
    fn row_entry(&self, row: &ParameterRow) -> Result<BatchEntry> {
        let lattice = LatticeParams::from_bond_length(row.bond_length).map_err(EngineError::from)?;
        let structure = match row.structure().map_err(EngineError::from)? {
            RowStructure::Tube(chirality) => StructureKind::Tube {
                chirality,
                length: self.length,
            },
            RowStructure::Planar => StructureKind::Sheet {
                repeats: self.repeats,
                shape: SheetShape::Hexagonal,
            },
        };
        Ok(BatchEntry {
            filename: row.filename.clone(),
            config: self.settings.config(
                structure,
                lattice,
                vacuum_strategy(row.vacuum, row.buffer)?,
            )?,
        })
    }
}

/// A batch plan as written in its TOML file; every field may be overridden from the
/// command line.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialBatchConfig {
    compound: Option<String>,
    compounds_file: Option<PathBuf>,
    species: Option<[String; 2]>,
    output_dir: Option<PathBuf>,
    reset: Option<bool>,
    fail_fast: Option<bool>,
    table: Option<PathBuf>,
    vacuum: Option<f64>,
    buffer: Option<f64>,
    coloring: Option<String>,
    allow_odd_count: Option<bool>,
    center: Option<bool>,
    length: Option<usize>,
    #[serde(default)]
    series: Vec<PartialSeries>,
    #[serde(default)]
    structure: Vec<PartialStructure>,
}

impl PartialBatchConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading batch plan from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn merge_with_cli(mut self, args: &BatchArgs) -> Result<BatchConfig> {
        self.apply_set_values(&args.set_values)?;
        self.apply_cli_args(args);

        let defaults = DefaultsConfig::default();
        let registry = load_registry(self.compounds_file.as_deref())?;
        let compound = registry.get(self.compound.as_deref().unwrap_or(&defaults.compound))?;

        let species = match (&args.structure.species, &self.species) {
            (Some(pair), _) => pair.clone(),
            (None, Some([a, b])) => SpeciesPair::new(a, b).map_err(EngineError::from)?,
            (None, None) => compound.species.clone(),
        };
        let coloring = match (args.structure.coloring, &self.coloring) {
            (Some(strategy), _) => strategy,
            (None, Some(name)) => {
                parser::parse_coloring(name).map_err(|e| CliError::Config(e.to_string()))?
            }
            (None, None) => defaults.coloring,
        };
        let vacuum = vacuum_strategy(self.vacuum, self.buffer)?.unwrap_or(VacuumStrategy::Fixed {
            size: defaults.vacuum,
        });

        let plan = PlanContext {
            formula: species.formula(),
            settings: SharedSettings {
                species,
                vacuum,
                coloring,
                odd_count: odd_count_policy(
                    self.allow_odd_count.unwrap_or(defaults.allow_odd_count),
                ),
                center: self.center.unwrap_or(defaults.center),
            },
            length: self.length.unwrap_or(defaults.length),
            repeats: defaults.repeats,
        };

        let mut entries = Vec::new();
        for series in &self.series {
            entries.extend(series.entries(compound, &plan)?);
        }
        for structure in &self.structure {
            entries.push(structure.entry(compound, &plan)?);
        }
        if let Some(path) = &self.table {
            let table = ParameterTable::load(path)?;
            debug!("Loaded {} row(s) from {:?}", table.len(), path);
            for row in table.rows() {
                entries.push(plan.row_entry(row)?);
            }
        }
        if entries.is_empty() {
            return Err(CliError::Config(
                "The batch plan defines no structures (add [[series]], [[structure]] or a table)"
                    .to_string(),
            ));
        }

        let policy = if self.fail_fast.unwrap_or(defaults.fail_fast) {
            FailurePolicy::Abort
        } else {
            FailurePolicy::Continue
        };

        Ok(BatchConfig {
            output_dir: self
                .output_dir
                .unwrap_or_else(|| PathBuf::from(format!("{}NT", plan.formula))),
            reset: self.reset.unwrap_or(defaults.reset),
            policy,
            entries,
        })
    }

    fn apply_cli_args(&mut self, args: &BatchArgs) {
        let structure = &args.structure;
        if let Some(name) = &structure.compound {
            self.compound = Some(name.clone());
        }
        if let Some(path) = &structure.compounds {
            self.compounds_file = Some(path.clone());
        }
        if structure.vacuum.vacuum.is_some() || structure.vacuum.buffer.is_some() {
            self.vacuum = structure.vacuum.vacuum;
            self.buffer = structure.vacuum.buffer;
        }
        if structure.allow_odd_count {
            self.allow_odd_count = Some(true);
        }
        if structure.no_center {
            self.center = Some(false);
        }
        if let Some(dir) = &args.output_dir {
            self.output_dir = Some(dir.clone());
        }
        if let Some(path) = &args.table {
            self.table = Some(path.clone());
        }
        if args.keep_existing {
            self.reset = Some(false);
        }
        if args.fail_fast {
            self.fail_fast = Some(true);
        }
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };

            match key {
                "compound" => self.compound = Some(value_str.to_string()),
                "compounds-file" => self.compounds_file = Some(PathBuf::from(value_str)),
                "output-dir" => self.output_dir = Some(PathBuf::from(value_str)),
                "table" => self.table = Some(PathBuf::from(value_str)),
                "coloring" => self.coloring = Some(value_str.to_string()),
                "reset" => self.reset = Some(parse_value(key, value_str, "boolean")?),
                "fail-fast" => self.fail_fast = Some(parse_value(key, value_str, "boolean")?),
                "allow-odd-count" => {
                    self.allow_odd_count = Some(parse_value(key, value_str, "boolean")?)
                }
                "center" => self.center = Some(parse_value(key, value_str, "boolean")?),
                "length" => self.length = Some(parse_value(key, value_str, "integer")?),
                "vacuum" => {
                    self.vacuum = Some(parse_value(key, value_str, "float")?);
                    self.buffer = None;
                }
                "buffer" => {
                    self.buffer = Some(parse_value(key, value_str, "float")?);
                    self.vacuum = None;
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}
