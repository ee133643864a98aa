use crate::core::lattice::honeycomb::SheetShape;
use crate::core::models::params::{ChiralIndex, LatticeParams, ParameterError};
use crate::core::models::species::SpeciesPair;
use thiserror::Error;

/// Lateral cell size used when no vacuum strategy is configured, in Angstroms.
pub const DEFAULT_VACUUM: f64 = 20.0;
/// Padding added to the structure extent by the adaptive strategy by default, in Angstroms.
pub const DEFAULT_BUFFER: f64 = 10.0;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StructureKind {
    /// A nanotube of `length` stacked axial units.
    Tube { chirality: ChiralIndex, length: usize },
    /// A flat sheet of `repeats[0] × repeats[1]` cells.
    Sheet { repeats: [usize; 2], shape: SheetShape },
}

impl StructureKind {
    pub fn tube(chirality: ChiralIndex) -> Self {
        StructureKind::Tube {
            chirality,
            length: 1,
        }
    }

    pub fn sheet() -> Self {
        StructureKind::Sheet {
            repeats: [1, 1],
            shape: SheetShape::default(),
        }
    }
}

/// How the padded directions of the periodic cell are sized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VacuumStrategy {
    /// Padded dimensions are exactly `size`, whatever the structure's extent.
    Fixed { size: f64 },
    /// Padded dimensions are the structure's extent plus `buffer`.
    Adaptive { buffer: f64 },
}

impl Default for VacuumStrategy {
    fn default() -> Self {
        VacuumStrategy::Fixed {
            size: DEFAULT_VACUUM,
        }
    }
}

impl VacuumStrategy {
    pub fn validate(&self) -> Result<(), ParameterError> {
        let (name, value) = match *self {
            VacuumStrategy::Fixed { size } => ("vacuum", size),
            VacuumStrategy::Adaptive { buffer } => ("buffer", buffer),
        };
        if !(value.is_finite() && value > 0.0) {
            return Err(ParameterError::invalid(
                name,
                value,
                "must be a positive, finite length in Angstroms",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColoringStrategy {
    /// Species alternate with the site's position in generation order.
    #[default]
    TraversalParity,
    /// Species follow the honeycomb sublattice each site was generated on.
    Sublattice,
}

impl ColoringStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColoringStrategy::TraversalParity => "traversal-parity",
            ColoringStrategy::Sublattice => "sublattice",
        }
    }
}

impl std::str::FromStr for ColoringStrategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "traversal-parity" | "parity" => Ok(ColoringStrategy::TraversalParity),
            "sublattice" => Ok(ColoringStrategy::Sublattice),
            _ => Err(()),
        }
    }
}

/// What to do with a structure whose site count is odd, so that the two species
/// cannot be split 1:1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OddCountPolicy {
    #[default]
    Reject,
    /// Keep alternating; species A ends up with one extra site.
    Permit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub structure: StructureKind,
    pub lattice: LatticeParams,
    pub species: SpeciesPair,
    pub vacuum: VacuumStrategy,
    pub coloring: ColoringStrategy,
    pub odd_count: OddCountPolicy,
    /// Translate the structure to the middle of the padded directions.
    pub center: bool,
}

#[derive(Default)]
pub struct GenerationConfigBuilder {
    structure: Option<StructureKind>,
    lattice: Option<LatticeParams>,
    species: Option<SpeciesPair>,
    vacuum: Option<VacuumStrategy>,
    coloring: Option<ColoringStrategy>,
    odd_count: Option<OddCountPolicy>,
    center: Option<bool>,
}

impl GenerationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn structure(mut self, structure: StructureKind) -> Self {
        self.structure = Some(structure);
        self
    }
    pub fn lattice(mut self, lattice: LatticeParams) -> Self {
        self.lattice = Some(lattice);
        self
    }
    pub fn species(mut self, species: SpeciesPair) -> Self {
        self.species = Some(species);
        self
    }
    pub fn vacuum(mut self, vacuum: VacuumStrategy) -> Self {
        self.vacuum = Some(vacuum);
        self
    }
    pub fn coloring(mut self, coloring: ColoringStrategy) -> Self {
        self.coloring = Some(coloring);
        self
    }
    pub fn odd_count(mut self, policy: OddCountPolicy) -> Self {
        self.odd_count = Some(policy);
        self
    }
    pub fn center(mut self, center: bool) -> Self {
        self.center = Some(center);
        self
    }

    pub fn build(self) -> Result<GenerationConfig, ConfigError> {
        Ok(GenerationConfig {
            structure: self
                .structure
                .ok_or(ConfigError::MissingParameter("structure"))?,
            lattice: self.lattice.ok_or(ConfigError::MissingParameter("lattice"))?,
            species: self.species.unwrap_or_default(),
            vacuum: self.vacuum.unwrap_or_default(),
            coloring: self.coloring.unwrap_or_default(),
            odd_count: self.odd_count.unwrap_or_default(),
            center: self.center.unwrap_or(true),
        })
    }
}
