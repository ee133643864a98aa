//! # Core Module
//!
//! Fundamental building blocks for nanostructure generation.
//!
//! ## Architecture
//!
//! - **Structural Representation** ([`models`]) - Chiral indices, atom sites, periodic cells
//!   and the finished `Structure`
//! - **Lattice Geometry** ([`lattice`]) - Flat honeycomb tiling and the sheet-to-tube mapping
//! - **File I/O** ([`io`]) - The CIF exchange record and CSV parameter tables
//! - **Compound Presets** ([`presets`]) - Species pairs and reference bond lengths
//!
//! Everything in this layer is a pure function of its inputs; no component here touches
//! global state or the filesystem unless it is explicitly handed a path or a writer.

pub mod io;
pub mod lattice;
pub mod models;
pub mod presets;
