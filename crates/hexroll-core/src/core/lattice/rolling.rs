use super::GeometryError;
use super::honeycomb::{FlatSheet, HoneycombLattice, SheetSite};
use crate::core::models::params::{ChiralIndex, ParameterError};
use crate::core::models::site::{LatticeSite, Sublattice};
use nalgebra::{Point2, Point3, Vector2};
use std::f64::consts::PI;
use tracing::{debug, trace};

/// A honeycomb sheet rolled into a cylinder around the z axis.
#[derive(Debug, Clone, PartialEq)]
pub struct RolledTube {
    pub chirality: ChiralIndex,
    /// Sites of all axial copies, copy `k` after copy `k - 1`.
    pub sites: Vec<LatticeSite>,
    pub radius: f64,
    pub circumference: f64,
    /// Axial period of a single unit, `T`.
    pub axial_period: f64,
    /// Number of axial units stacked along z.
    pub length: usize,
}

impl RolledTube {
    pub fn diameter(&self) -> f64 {
        2.0 * self.radius
    }

    /// Total axial extent, `length · T`.
    pub fn total_period(&self) -> f64 {
        self.axial_period * self.length as f64
    }
}

/// Exact rational coordinates of a sheet point in the `(C_h, T)` frame.
///
/// Along the chiral vector the denominator is `2(n² + nm + m²)`; along the translation
/// vector it is `2(t1² + t1·t2 + t2²)`. Keeping numerators as integers makes the
/// half-open cut of the sheet exact, so the per-period site count never depends on
/// floating-point rounding at the cell edges.
#[derive(Debug, Clone, Copy)]
struct ChiralFrame {
    s_coeffs: (i64, i64),
    t_coeffs: (i64, i64),
    s_den: i64,
    t_den: i64,
    basis_shift: (i64, i64),
}

impl ChiralFrame {
    fn new(chirality: &ChiralIndex) -> Self {
        let (n, m) = (chirality.n() as i64, chirality.m() as i64);
        let (t1, t2) = chirality.translation_indices();
        Self {
            s_coeffs: (2 * n + m, n + 2 * m),
            t_coeffs: (2 * t1 + t2, t1 + 2 * t2),
            s_den: 2 * chirality.norm_squared(),
            t_den: 2 * (t1 * t1 + t1 * t2 + t2 * t2),
            basis_shift: (n + m, t1 + t2),
        }
    }

    fn numerators(&self, i: i64, j: i64) -> (i64, i64) {
        (
            i * self.s_coeffs.0 + j * self.s_coeffs.1,
            i * self.t_coeffs.0 + j * self.t_coeffs.1,
        )
    }

    fn contains(&self, (s, t): (i64, i64)) -> bool {
        (0..self.s_den).contains(&s) && (0..self.t_den).contains(&t)
    }

    /// The B partner of an A site, wrapped back into the half-open cell.
    fn partner(&self, (s, t): (i64, i64)) -> (i64, i64) {
        (
            (s + self.basis_shift.0).rem_euclid(self.s_den),
            (t + self.basis_shift.1).rem_euclid(self.t_den),
        )
    }
}

/// Cuts the flat sheet that rolls into the `chirality` tube: the rectangle spanned by the
/// chiral vector (width `C`, along x) and the translation vector (height `T`, along y).
///
/// A sites are ordered by their axial then circumferential coordinate, and each is
/// immediately followed by its B partner (wrapped into the rectangle).
///
/// # Errors
///
/// Returns [`GeometryError::AtomCountMismatch`] if the cut does not contain exactly
/// `4(n² + nm + m²)/d_R` sites.
pub fn unroll(lattice: &HoneycombLattice, chirality: &ChiralIndex) -> Result<FlatSheet, GeometryError> {
    let frame = ChiralFrame::new(chirality);
    let (n, m) = (chirality.n() as i64, chirality.m() as i64);
    let (t1, t2) = chirality.translation_indices();

    let corners_i = [0, n, t1, n + t1];
    let corners_j = [0, m, t2, m + t2];
    let (i_min, i_max) = min_max(&corners_i);
    let (j_min, j_max) = min_max(&corners_j);

    let mut cut: Vec<(i64, i64)> = Vec::new();
    for i in i_min..=i_max {
        for j in j_min..=j_max {
            let coords = frame.numerators(i, j);
            if frame.contains(coords) {
                cut.push(coords);
            }
        }
    }
    cut.sort_unstable_by_key(|&(s, t)| (t, s));

    let expected = chirality.hexagons_per_period();
    if cut.len() != expected {
        return Err(GeometryError::AtomCountMismatch {
            chirality: *chirality,
            expected: 2 * expected,
            found: 2 * cut.len(),
        });
    }

    let width = chirality.circumference(lattice.lattice_constant());
    let height = chirality.axial_period(lattice.lattice_constant());
    let to_point = |(s, t): (i64, i64)| {
        Point2::new(
            s as f64 / frame.s_den as f64 * width,
            t as f64 / frame.t_den as f64 * height,
        )
    };

    let mut sites = Vec::with_capacity(2 * cut.len());
    for coords in cut {
        sites.push(SheetSite {
            position: to_point(coords),
            sublattice: Sublattice::A,
        });
        sites.push(SheetSite {
            position: to_point(frame.partner(coords)),
            sublattice: Sublattice::B,
        });
    }
    trace!(sites = sites.len(), width, height, "Cut unrolled sheet.");

    Ok(FlatSheet {
        sites,
        cell: [Vector2::new(width, 0.0), Vector2::new(0.0, height)],
    })
}

/// Rolls the `chirality` sheet into a cylinder and stacks `length` axial units.
///
/// Each sheet point `(x, y)` maps to `(r·cos θ, r·sin θ, y)` with `θ = 2πx / C` and
/// `r = C / 2π`; the tube axis is the z axis through the origin.
pub fn roll(
    lattice: &HoneycombLattice,
    chirality: &ChiralIndex,
    length: usize,
) -> Result<RolledTube, GeometryError> {
    if length == 0 {
        return Err(ParameterError::invalid("length", length, "must be at least 1").into());
    }

    let sheet = unroll(lattice, chirality)?;
    let circumference = sheet.cell[0].x;
    let axial_period = sheet.cell[1].y;
    let radius = circumference / (2.0 * PI);

    let unit: Vec<LatticeSite> = sheet
        .sites
        .iter()
        .map(|site| {
            let theta = 2.0 * PI * site.position.x / circumference;
            LatticeSite::new(
                Point3::new(radius * theta.cos(), radius * theta.sin(), site.position.y),
                site.sublattice,
            )
        })
        .collect();

    let mut sites = Vec::with_capacity(unit.len() * length);
    for copy in 0..length {
        let dz = copy as f64 * axial_period;
        sites.extend(unit.iter().map(|site| {
            LatticeSite::new(
                Point3::new(site.position.x, site.position.y, site.position.z + dz),
                site.sublattice,
            )
        }));
    }

    debug!(
        "Rolled {} tube: {} atoms, radius {:.4} A, period {:.4} A.",
        chirality,
        sites.len(),
        radius,
        axial_period
    );

    Ok(RolledTube {
        chirality: *chirality,
        sites,
        radius,
        circumference,
        axial_period,
        length,
    })
}

fn min_max(values: &[i64]) -> (i64, i64) {
    values
        .iter()
        .fold((i64::MAX, i64::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}
