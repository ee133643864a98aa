//! Provides input/output functionality for generated structures.
//!
//! Structures are written as P1 CIF records through the [`traits::StructureFile`]
//! interface; batch parameter tables are read from CSV by [`table`].

pub mod cif;
pub mod table;
pub mod traits;
