use super::GeometryError;
use crate::core::models::params::{LatticeParams, ParameterError};
use crate::core::models::site::Sublattice;
use nalgebra::{Point2, Vector2};

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// Shape of the repeating cell used when tiling a flat sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetShape {
    /// The primitive 60° cell, two atoms.
    #[default]
    Hexagonal,
    /// The orthogonal supercell `(a1, 2·a2 − a1)`, four atoms.
    Rectangular,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetSite {
    pub position: Point2<f64>,
    pub sublattice: Sublattice,
}

/// An ordered flat sheet: 2D sites plus the two in-plane cell vectors spanning its period.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatSheet {
    pub sites: Vec<SheetSite>,
    pub cell: [Vector2<f64>; 2],
}

impl FlatSheet {
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

/// The honeycomb Bravais lattice with primitive vectors `a1 = (a, 0)` and
/// `a2 = (a/2, a·√3/2)`, and a two-site basis at `0` (A) and `(a1 + a2)/3` (B).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoneycombLattice {
    lattice_constant: f64,
}

impl HoneycombLattice {
    pub fn new(lattice_constant: f64) -> Result<Self, GeometryError> {
        let params = LatticeParams::from_lattice_constant(lattice_constant)?;
        Ok(Self::from_params(&params))
    }

    pub fn from_params(params: &LatticeParams) -> Self {
        Self {
            lattice_constant: params.lattice_constant(),
        }
    }

    pub fn lattice_constant(&self) -> f64 {
        self.lattice_constant
    }

    pub fn bond_length(&self) -> f64 {
        self.lattice_constant / SQRT_3
    }

    pub fn primitive_vectors(&self) -> [Vector2<f64>; 2] {
        let a = self.lattice_constant;
        [Vector2::new(a, 0.0), Vector2::new(0.5 * a, 0.5 * SQRT_3 * a)]
    }

    /// Offset of the B site from the A site of the same cell.
    pub fn basis_offset(&self) -> Vector2<f64> {
        let [a1, a2] = self.primitive_vectors();
        (a1 + a2) / 3.0
    }

    /// Cartesian position of the site on `sublattice` in cell `(i, j)`.
    pub fn site(&self, i: i64, j: i64, sublattice: Sublattice) -> Point2<f64> {
        let [a1, a2] = self.primitive_vectors();
        let origin = Point2::origin() + a1 * i as f64 + a2 * j as f64;
        match sublattice {
            Sublattice::A => origin,
            Sublattice::B => origin + self.basis_offset(),
        }
    }

    /// Tiles the chosen cell `repeats[0] × repeats[1]` times.
    ///
    /// Sites are emitted row by row (`j` outer, `i` inner) and, within a cell, in basis
    /// order, so that every A site is immediately followed by its B partner.
    pub fn tile(&self, repeats: [usize; 2], shape: SheetShape) -> Result<FlatSheet, GeometryError> {
        for (name, count) in [("repeats_x", repeats[0]), ("repeats_y", repeats[1])] {
            if count == 0 {
                return Err(ParameterError::invalid(name, count, "must be at least 1").into());
            }
        }

        let (cell, basis) = self.cell_and_basis(shape);
        let mut sites = Vec::with_capacity(repeats[0] * repeats[1] * basis.len());
        for j in 0..repeats[1] {
            for i in 0..repeats[0] {
                let origin = cell[0] * i as f64 + cell[1] * j as f64;
                for &(offset, sublattice) in &basis {
                    sites.push(SheetSite {
                        position: Point2::from(origin + offset),
                        sublattice,
                    });
                }
            }
        }

        Ok(FlatSheet {
            sites,
            cell: [cell[0] * repeats[0] as f64, cell[1] * repeats[1] as f64],
        })
    }

    fn cell_and_basis(&self, shape: SheetShape) -> ([Vector2<f64>; 2], Vec<(Vector2<f64>, Sublattice)>) {
        let [a1, a2] = self.primitive_vectors();
        let delta = self.basis_offset();
        match shape {
            SheetShape::Hexagonal => (
                [a1, a2],
                vec![(Vector2::zeros(), Sublattice::A), (delta, Sublattice::B)],
            ),
            SheetShape::Rectangular => {
                let b2 = a2 * 2.0 - a1;
                // a2 + delta lies on the x = a edge; shift it back by a1 into the cell.
                (
                    [a1, b2],
                    vec![
                        (Vector2::zeros(), Sublattice::A),
                        (delta, Sublattice::B),
                        (a2, Sublattice::A),
                        (a2 + delta - a1, Sublattice::B),
                    ],
                )
            }
        }
    }
}
