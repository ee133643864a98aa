use crate::core::models::params::{LatticeParams, ParameterError, TubeClass};
use crate::core::models::species::SpeciesPair;
use phf::{Map, phf_map};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Built-in compound parameters. Tube bond lengths are per class; sheets use the
/// lattice constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompoundPreset {
    pub species_a: &'static str,
    pub species_b: &'static str,
    pub armchair_bond_length: f64,
    pub zigzag_bond_length: f64,
    pub chiral_bond_length: f64,
    pub planar_lattice_constant: f64,
}

pub static BUILTIN_COMPOUNDS: Map<&'static str, CompoundPreset> = phf_map! {
    "AlP" => CompoundPreset {
        species_a: "Al",
        species_b: "P",
        armchair_bond_length: 2.25,
        zigzag_bond_length: 2.27,
        chiral_bond_length: 2.27,
        planar_lattice_constant: 3.82,
    },
    "BN" => CompoundPreset {
        species_a: "B",
        species_b: "N",
        armchair_bond_length: 1.45,
        zigzag_bond_length: 1.45,
        chiral_bond_length: 1.45,
        planar_lattice_constant: 2.504,
    },
    "SiC" => CompoundPreset {
        species_a: "Si",
        species_b: "C",
        armchair_bond_length: 1.79,
        zigzag_bond_length: 1.79,
        chiral_bond_length: 1.79,
        planar_lattice_constant: 3.10,
    },
};

/// Name of the compound used when none is requested.
pub const DEFAULT_COMPOUND: &str = "AlP";

/// A validated compound: species pair plus the lattice parameters used for each structure
/// class.
#[derive(Debug, Clone, PartialEq)]
pub struct Compound {
    pub name: String,
    pub species: SpeciesPair,
    armchair: LatticeParams,
    zigzag: LatticeParams,
    chiral: LatticeParams,
    planar: LatticeParams,
}

impl Compound {
    fn from_preset(name: &str, preset: &CompoundPreset) -> Result<Self, ParameterError> {
        Ok(Self {
            name: name.to_string(),
            species: SpeciesPair::new(preset.species_a, preset.species_b)?,
            armchair: LatticeParams::from_bond_length(preset.armchair_bond_length)?,
            zigzag: LatticeParams::from_bond_length(preset.zigzag_bond_length)?,
            chiral: LatticeParams::from_bond_length(preset.chiral_bond_length)?,
            planar: LatticeParams::from_lattice_constant(preset.planar_lattice_constant)?,
        })
    }

    pub fn tube_params(&self, class: TubeClass) -> LatticeParams {
        match class {
            TubeClass::Armchair => self.armchair,
            TubeClass::Zigzag => self.zigzag,
            TubeClass::Chiral => self.chiral,
        }
    }

    pub fn planar_params(&self) -> LatticeParams {
        self.planar
    }
}

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid compound '{name}': {source}")]
    Invalid {
        name: String,
        source: ParameterError,
    },
    #[error("Unknown compound '{0}'")]
    Unknown(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct CompoundEntry {
    species: [String; 2],
    bond_length: Option<f64>,
    armchair_bond_length: Option<f64>,
    zigzag_bond_length: Option<f64>,
    chiral_bond_length: Option<f64>,
    lattice_constant: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegistryFile {
    #[serde(default)]
    compounds: BTreeMap<String, CompoundEntry>,
}

impl CompoundEntry {
    /// Per-class bond lengths fall back to `bond-length`; the planar lattice constant
    /// falls back to `bond-length · √3`.
    fn into_compound(self, name: &str) -> Result<Compound, ParameterError> {
        let pick = |specific: Option<f64>, field: &'static str| {
            specific
                .or(self.bond_length)
                .ok_or_else(|| ParameterError::invalid(field, "missing", "set it or `bond-length`"))
                .and_then(LatticeParams::from_bond_length)
        };
        let armchair = pick(self.armchair_bond_length, "armchair-bond-length")?;
        let zigzag = pick(self.zigzag_bond_length, "zigzag-bond-length")?;
        let chiral = pick(self.chiral_bond_length, "chiral-bond-length")?;
        let planar = match (self.lattice_constant, self.bond_length) {
            (Some(a), _) => LatticeParams::from_lattice_constant(a)?,
            (None, Some(b)) => LatticeParams::from_bond_length(b)?,
            (None, None) => {
                return Err(ParameterError::invalid(
                    "lattice-constant",
                    "missing",
                    "set it or `bond-length`",
                ));
            }
        };
        Ok(Compound {
            name: name.to_string(),
            species: SpeciesPair::new(&self.species[0], &self.species[1])?,
            armchair,
            zigzag,
            chiral,
            planar,
        })
    }
}

/// Compounds available by name: the built-in presets plus any loaded from TOML files.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundRegistry {
    compounds: BTreeMap<String, Compound>,
}

impl CompoundRegistry {
    pub fn builtin() -> Result<Self, PresetError> {
        let mut compounds = BTreeMap::new();
        for (name, preset) in BUILTIN_COMPOUNDS.entries() {
            let compound = Compound::from_preset(name, preset).map_err(|e| PresetError::Invalid {
                name: name.to_string(),
                source: e,
            })?;
            compounds.insert(name.to_string(), compound);
        }
        Ok(Self { compounds })
    }

    /// Adds (or overrides) compounds from a TOML registry file:
    ///
    /// ```toml
    /// [compounds.GaN]
    /// species = ["Ga", "N"]
    /// bond-length = 1.85
    /// lattice-constant = 3.21
    /// ```
    pub fn load(&mut self, path: &Path) -> Result<(), PresetError> {
        let origin = path.to_string_lossy().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| PresetError::Io {
            path: origin.clone(),
            source: e,
        })?;
        let file: RegistryFile = toml::from_str(&content).map_err(|e| PresetError::Toml {
            path: origin.clone(),
            source: e,
        })?;
        for (name, entry) in file.compounds {
            let compound = entry
                .into_compound(&name)
                .map_err(|e| PresetError::Invalid {
                    name: name.clone(),
                    source: e,
                })?;
            debug!("Registered compound '{}' from {}.", name, origin);
            self.compounds.insert(name, compound);
        }
        Ok(())
    }

    /// Looks a compound up by name, exact match first, then ignoring ASCII case.
    pub fn get(&self, name: &str) -> Result<&Compound, PresetError> {
        self.compounds
            .get(name)
            .or_else(|| {
                self.compounds
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, compound)| compound)
            })
            .ok_or_else(|| PresetError::Unknown(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.compounds.keys().map(String::as_str)
    }
}
