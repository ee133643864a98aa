//! # Core Models Module
//!
//! Data structures describing a generated nanostructure.
//!
//! ## Key Components
//!
//! - [`params`] - Validated generation parameters: chiral indices and lattice parameters
//! - [`species`] - The binary species pair placed on the lattice
//! - [`site`] - Lattice sites before and after species assignment
//! - [`cell`] - The periodic cell and coordinate conversions
//! - [`structure`] - The finished, read-only structure handed to serializers
//!
//! ## Usage
//!
//! ```ignore
//! use hexroll::core::models::params::{ChiralIndex, LatticeParams};
//!
//! let chirality = ChiralIndex::new(5, 0)?;
//! let lattice = LatticeParams::from_bond_length(2.27)?;
//! let diameter = chirality.diameter(lattice.lattice_constant());
//! ```

pub mod cell;
pub mod params;
pub mod site;
pub mod species;
pub mod structure;
