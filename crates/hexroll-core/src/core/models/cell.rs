use nalgebra::{Matrix3, Point3, Vector3};
use thiserror::Error;

const SINGULAR_VOLUME_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CellError {
    #[error("Cell matrix is singular (volume {volume:.3e} A^3)")]
    Singular { volume: f64 },
    #[error("Invalid cell parameter `{name}` = {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

/// A periodic cell whose rows are the three lattice vectors `a`, `b`, `c` in Angstroms.
///
/// A `Cell` can only be constructed non-singular; the inverse needed for fractional
/// coordinates is computed once up front.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    matrix: Matrix3<f64>,
    inverse_transpose: Matrix3<f64>,
}

impl Cell {
    /// Creates a cell from its three lattice vectors.
    ///
    /// # Errors
    ///
    /// Returns [`CellError::Singular`] if the vectors are (numerically) coplanar.
    pub fn from_vectors(
        a: Vector3<f64>,
        b: Vector3<f64>,
        c: Vector3<f64>,
    ) -> Result<Self, CellError> {
        let matrix = Matrix3::from_rows(&[a.transpose(), b.transpose(), c.transpose()]);
        let volume = matrix.determinant();
        if !volume.is_finite() || volume.abs() < SINGULAR_VOLUME_TOLERANCE {
            return Err(CellError::Singular { volume });
        }
        let inverse_transpose = matrix
            .transpose()
            .try_inverse()
            .ok_or(CellError::Singular { volume })?;
        Ok(Self {
            matrix,
            inverse_transpose,
        })
    }

    /// An orthorhombic cell with axes along x, y and z.
    pub fn orthorhombic(a: f64, b: f64, c: f64) -> Result<Self, CellError> {
        Self::from_vectors(
            Vector3::new(a, 0.0, 0.0),
            Vector3::new(0.0, b, 0.0),
            Vector3::new(0.0, 0.0, c),
        )
    }

    /// Reconstructs a cell from lengths and angles (degrees) in the standard orientation:
    /// `a` along x, `b` in the xy-plane.
    pub fn from_parameters(lengths: [f64; 3], angles: [f64; 3]) -> Result<Self, CellError> {
        for (name, value) in ["a", "b", "c"].into_iter().zip(lengths) {
            if !(value.is_finite() && value > 0.0) {
                return Err(CellError::InvalidParameter { name, value });
            }
        }
        for (name, value) in ["alpha", "beta", "gamma"].into_iter().zip(angles) {
            if !(value.is_finite() && value > 0.0 && value < 180.0) {
                return Err(CellError::InvalidParameter { name, value });
            }
        }

        let [a, b, c] = lengths;
        let [alpha, beta, gamma] = angles.map(f64::to_radians);
        let (cos_a, cos_b, cos_g) = (alpha.cos(), beta.cos(), gamma.cos());
        let sin_g = gamma.sin();

        let volume_factor_sq =
            1.0 - cos_a * cos_a - cos_b * cos_b - cos_g * cos_g + 2.0 * cos_a * cos_b * cos_g;
        if volume_factor_sq <= 0.0 {
            return Err(CellError::Singular { volume: 0.0 });
        }

        Self::from_vectors(
            Vector3::new(a, 0.0, 0.0),
            Vector3::new(b * cos_g, b * sin_g, 0.0),
            Vector3::new(
                c * cos_b,
                c * (cos_a - cos_b * cos_g) / sin_g,
                c * volume_factor_sq.sqrt() / sin_g,
            ),
        )
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    pub fn vector(&self, axis: usize) -> Vector3<f64> {
        self.matrix.row(axis).transpose()
    }

    pub fn vectors(&self) -> [Vector3<f64>; 3] {
        [self.vector(0), self.vector(1), self.vector(2)]
    }

    /// Lengths `|a|`, `|b|`, `|c|` in Angstroms.
    pub fn lengths(&self) -> [f64; 3] {
        self.vectors().map(|v| v.norm())
    }

    /// Angles `alpha` (b, c), `beta` (a, c), `gamma` (a, b) in degrees.
    pub fn angles(&self) -> [f64; 3] {
        let [a, b, c] = self.vectors();
        [angle_between(&b, &c), angle_between(&a, &c), angle_between(&a, &b)]
    }

    pub fn volume(&self) -> f64 {
        self.matrix.determinant().abs()
    }

    pub fn to_fractional(&self, position: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.inverse_transpose * position.coords)
    }

    pub fn to_cartesian(&self, fractional: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.matrix.transpose() * fractional.coords)
    }
}

fn angle_between(u: &Vector3<f64>, v: &Vector3<f64>) -> f64 {
    (u.dot(v) / (u.norm() * v.norm()))
        .clamp(-1.0, 1.0)
        .acos()
        .to_degrees()
}
