//! # hexroll Core Library
//!
//! Builds atomic-resolution geometries of binary-compound honeycomb sheets and
//! nanotubes, sizes a vacuum-padded periodic cell around them and serializes the
//! result as a crystallographic exchange record (CIF).
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Structure`, `Cell`,
//!   `ChiralIndex`), the pure lattice geometry (honeycomb tiling and sheet-to-tube
//!   rolling) and file I/O.
//!
//! - **[`engine`]: The Generation Logic.** Configuration, species assignment
//!   strategies, cell sizing strategies, progress reporting and the error type every
//!   generation failure is surfaced as.
//!
//! - **[`workflows`]: The Public API.** Ties `engine` and `core` together: build a
//!   single structure from its parameters, or drive a whole batch into an output
//!   directory.

pub mod core;
pub mod engine;
pub mod workflows;
