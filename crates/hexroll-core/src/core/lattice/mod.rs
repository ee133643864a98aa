//! Honeycomb lattice geometry.
//!
//! [`honeycomb`] tiles the flat two-atom honeycomb cell; [`rolling`] cuts the sheet whose
//! width is the chiral circumference and rolls it into a cylinder.

pub mod honeycomb;
pub mod rolling;

use crate::core::models::params::{ChiralIndex, ParameterError};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    #[error("Rolled {chirality} tube has {found} sites per period, expected {expected}")]
    AtomCountMismatch {
        chirality: ChiralIndex,
        expected: usize,
        found: usize,
    },
}
