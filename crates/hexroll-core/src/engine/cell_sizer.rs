use super::config::VacuumStrategy;
use super::error::EngineError;
use crate::core::models::cell::Cell;
use nalgebra::{Vector2, Vector3};
use tracing::{debug, warn};

/// The geometric extent of a structure that a cell has to enclose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Footprint {
    /// A tube around the z axis; `period` is the full axial repeat of the generated
    /// structure.
    Tube { diameter: f64, period: f64 },
    /// A sheet in the xy plane spanned by `in_plane`, `thickness` thick along z.
    Sheet {
        in_plane: [Vector2<f64>; 2],
        thickness: f64,
    },
}

impl Footprint {
    /// Extent across the padded directions.
    pub fn padded_extent(&self) -> f64 {
        match self {
            Footprint::Tube { diameter, .. } => *diameter,
            Footprint::Sheet { thickness, .. } => *thickness,
        }
    }
}

/// A periodic cell plus the translation that centers the structure in it.
#[derive(Debug, Clone, PartialEq)]
pub struct SizedCell {
    pub cell: Cell,
    pub centering: Vector3<f64>,
}

/// Sizes the padded directions of a periodic cell.
///
/// The unpadded directions (the tube axis, the sheet plane) always keep the structure's
/// own period.
pub trait CellSizer {
    fn padded_size(&self, extent: f64) -> f64;

    fn size(&self, footprint: &Footprint) -> Result<SizedCell, EngineError> {
        let extent = footprint.padded_extent();
        let size = self.padded_size(extent);
        if size < extent {
            warn!(
                "Padded cell size {:.3} A is smaller than the structure extent {:.3} A; periodic images will overlap.",
                size, extent
            );
        }

        let (cell, centering) = match footprint {
            Footprint::Tube { period, .. } => (
                Cell::orthorhombic(size, size, *period)?,
                Vector3::new(0.5 * size, 0.5 * size, 0.0),
            ),
            Footprint::Sheet { in_plane, .. } => (
                Cell::from_vectors(
                    Vector3::new(in_plane[0].x, in_plane[0].y, 0.0),
                    Vector3::new(in_plane[1].x, in_plane[1].y, 0.0),
                    Vector3::new(0.0, 0.0, size),
                )?,
                Vector3::new(0.0, 0.0, 0.5 * size),
            ),
        };
        debug!(
            "Sized cell: lengths {:?} A for extent {:.3} A.",
            cell.lengths(),
            extent
        );
        Ok(SizedCell { cell, centering })
    }
}

/// Padded dimensions equal a constant, regardless of the structure's extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedVacuum {
    pub size: f64,
}

impl CellSizer for FixedVacuum {
    fn padded_size(&self, _extent: f64) -> f64 {
        self.size
    }
}

/// Padded dimensions equal the structure's extent plus a buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveVacuum {
    pub buffer: f64,
}

impl CellSizer for AdaptiveVacuum {
    fn padded_size(&self, extent: f64) -> f64 {
        extent + self.buffer
    }
}

impl VacuumStrategy {
    pub fn sizer(&self) -> Box<dyn CellSizer> {
        match *self {
            VacuumStrategy::Fixed { size } => Box::new(FixedVacuum { size }),
            VacuumStrategy::Adaptive { buffer } => Box::new(AdaptiveVacuum { buffer }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::params::{ChiralIndex, LatticeParams};

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn tube_footprint(n: i64, m: i64, bond_length: f64) -> Footprint {
        let a = LatticeParams::from_bond_length(bond_length)
            .unwrap()
            .lattice_constant();
        let chirality = ChiralIndex::new(n, m).unwrap();
        Footprint::Tube {
            diameter: chirality.diameter(a),
            period: chirality.axial_period(a),
        }
    }

    #[test]
    fn adaptive_vacuum_is_diameter_plus_buffer() {
        for (n, m) in [(5, 0), (3, 3), (5, 3), (12, 7)] {
            let footprint = tube_footprint(n, m, 2.27);
            let sized = AdaptiveVacuum { buffer: 8.0 }.size(&footprint).unwrap();
            let [a, b, c] = sized.cell.lengths();
            let diameter = footprint.padded_extent();
            assert!(f64_approx_equal(a, diameter + 8.0));
            assert!(f64_approx_equal(b, diameter + 8.0));
            if let Footprint::Tube { period, .. } = footprint {
                assert!(f64_approx_equal(c, period));
            }
        }
    }

    #[test]
    fn fixed_vacuum_ignores_the_structure_extent() {
        let small = tube_footprint(3, 3, 2.25);
        let large = tube_footprint(40, 40, 2.25);
        for footprint in [small, large] {
            let sized = FixedVacuum { size: 20.0 }.size(&footprint).unwrap();
            assert!(f64_approx_equal(sized.cell.lengths()[0], 20.0));
            assert!(f64_approx_equal(sized.cell.lengths()[1], 20.0));
        }
        assert!(large.padded_extent() > 20.0);
    }

    #[test]
    fn tube_is_centered_in_the_lateral_plane() {
        let sized = FixedVacuum { size: 20.0 }.size(&tube_footprint(5, 0, 2.27)).unwrap();
        assert_eq!(sized.centering, Vector3::new(10.0, 10.0, 0.0));
    }

    #[test]
    fn sheet_keeps_in_plane_period_and_pads_z() {
        let a = 3.82;
        let in_plane = [Vector2::new(a, 0.0), Vector2::new(0.5 * a, 0.5 * 3f64.sqrt() * a)];
        let footprint = Footprint::Sheet {
            in_plane,
            thickness: 0.0,
        };
        let sized = AdaptiveVacuum { buffer: 15.0 }.size(&footprint).unwrap();
        let lengths = sized.cell.lengths();
        let angles = sized.cell.angles();
        assert!(f64_approx_equal(lengths[0], a));
        assert!(f64_approx_equal(lengths[1], a));
        assert!(f64_approx_equal(lengths[2], 15.0));
        assert!(f64_approx_equal(angles[2], 60.0));
        assert_eq!(sized.centering, Vector3::new(0.0, 0.0, 7.5));
    }

    #[test]
    fn strategy_selects_matching_sizer() {
        let footprint = tube_footprint(5, 0, 2.27);
        let fixed = VacuumStrategy::Fixed { size: 25.0 }.sizer();
        let adaptive = VacuumStrategy::Adaptive { buffer: 5.0 }.sizer();
        assert!(f64_approx_equal(fixed.padded_size(footprint.padded_extent()), 25.0));
        assert!(f64_approx_equal(
            adaptive.padded_size(footprint.padded_extent()),
            footprint.padded_extent() + 5.0
        ));
    }
}
