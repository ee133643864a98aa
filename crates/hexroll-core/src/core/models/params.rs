use std::f64::consts::PI;
use std::fmt;
use thiserror::Error;

const SQRT_3: f64 = 1.732_050_807_568_877_2;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParameterError {
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
}

impl ParameterError {
    pub(crate) fn invalid(name: &'static str, value: impl ToString, reason: &'static str) -> Self {
        Self::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}

/// The three nanotube classes selected by a chiral index pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TubeClass {
    /// `m == n`.
    Armchair,
    /// `m == 0`.
    Zigzag,
    /// `0 < m < n`.
    Chiral,
}

impl TubeClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TubeClass::Armchair => "armchair",
            TubeClass::Zigzag => "zigzag",
            TubeClass::Chiral => "chiral",
        }
    }

    /// Single-letter tag used in conventional output file names (`A_`, `Z_`, `C_`).
    pub fn prefix(&self) -> char {
        match self {
            TubeClass::Armchair => 'A',
            TubeClass::Zigzag => 'Z',
            TubeClass::Chiral => 'C',
        }
    }
}

impl fmt::Display for TubeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TubeClass {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "armchair" | "a" => Ok(TubeClass::Armchair),
            "zigzag" | "z" => Ok(TubeClass::Zigzag),
            "chiral" | "c" => Ok(TubeClass::Chiral),
            _ => Err(()),
        }
    }
}

/// A validated chiral index pair `(n, m)` with `n >= m >= 0` and `(n, m) != (0, 0)`.
///
/// All derived tube quantities (circumference, diameter, axial period, atom count per
/// periodic unit) are closed-form functions of the pair and the lattice constant, and are
/// exposed here so that every consumer computes them the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChiralIndex {
    n: u32,
    m: u32,
}

impl ChiralIndex {
    /// Validates and creates a chiral index pair.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::InvalidChirality`] if either index is negative, if
    /// `n < m`, or if both indices are zero (zero circumference).
    pub fn new(n: i64, m: i64) -> Result<Self, ParameterError> {
        let reject = |reason| ParameterError::InvalidChirality { n, m, reason };
        if n < 0 || m < 0 {
            return Err(reject("indices must be non-negative"));
        }
        if n < m {
            return Err(reject("n must be greater than or equal to m"));
        }
        if n == 0 {
            return Err(reject("(0, 0) has zero circumference"));
        }
        let n = u32::try_from(n).map_err(|_| reject("index out of range"))?;
        let m = u32::try_from(m).map_err(|_| reject("index out of range"))?;
        Ok(Self { n, m })
    }

    pub fn n(&self) -> u32 {
        self.n
    }

    pub fn m(&self) -> u32 {
        self.m
    }

    pub fn class(&self) -> TubeClass {
        if self.m == 0 {
            TubeClass::Zigzag
        } else if self.m == self.n {
            TubeClass::Armchair
        } else {
            TubeClass::Chiral
        }
    }

    /// `n² + nm + m²`, the squared length of the chiral vector in units of `a²`.
    pub fn norm_squared(&self) -> i64 {
        let (n, m) = (self.n as i64, self.m as i64);
        n * n + n * m + m * m
    }

    /// `gcd(2n + m, 2m + n)`, the divisor shared by the translation vector components.
    pub fn d_r(&self) -> i64 {
        let (n, m) = (self.n as i64, self.m as i64);
        gcd(2 * n + m, 2 * m + n)
    }

    /// Primitive translation vector `T = t1·a1 + t2·a2`, perpendicular to the chiral vector.
    pub fn translation_indices(&self) -> (i64, i64) {
        let (n, m) = (self.n as i64, self.m as i64);
        let d_r = self.d_r();
        ((2 * m + n) / d_r, -(2 * n + m) / d_r)
    }

    /// Number of graphene-like unit cells (hexagons) in one axial period: `2(n² + nm + m²) / d_R`.
    pub fn hexagons_per_period(&self) -> usize {
        (2 * self.norm_squared() / self.d_r()) as usize
    }

    /// Number of atoms in one axial period: `4(n² + nm + m²) / d_R`.
    pub fn atoms_per_period(&self) -> usize {
        2 * self.hexagons_per_period()
    }

    pub fn circumference(&self, lattice_constant: f64) -> f64 {
        lattice_constant * (self.norm_squared() as f64).sqrt()
    }

    pub fn diameter(&self, lattice_constant: f64) -> f64 {
        self.circumference(lattice_constant) / PI
    }

    /// Smallest translation along the tube axis mapping the lattice onto itself:
    /// `√3 · C / d_R`.
    pub fn axial_period(&self, lattice_constant: f64) -> f64 {
        SQRT_3 * self.circumference(lattice_constant) / self.d_r() as f64
    }
}

impl fmt::Display for ChiralIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.n, self.m)
    }
}

/// Lattice parameters of the honeycomb sheet, stored as the nearest-neighbour bond length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticeParams {
    bond_length: f64,
}

impl LatticeParams {
    pub fn from_bond_length(bond_length: f64) -> Result<Self, ParameterError> {
        if !(bond_length.is_finite() && bond_length > 0.0) {
            return Err(ParameterError::invalid(
                "bond_length",
                bond_length,
                "must be a positive, finite length in Angstroms",
            ));
        }
        Ok(Self { bond_length })
    }

    pub fn from_lattice_constant(lattice_constant: f64) -> Result<Self, ParameterError> {
        if !(lattice_constant.is_finite() && lattice_constant > 0.0) {
            return Err(ParameterError::invalid(
                "lattice_constant",
                lattice_constant,
                "must be a positive, finite length in Angstroms",
            ));
        }
        Ok(Self {
            bond_length: lattice_constant / SQRT_3,
        })
    }

    pub fn bond_length(&self) -> f64 {
        self.bond_length
    }

    /// `a = bond_length · √3`.
    pub fn lattice_constant(&self) -> f64 {
        self.bond_length * SQRT_3
    }
}

pub(crate) fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}
