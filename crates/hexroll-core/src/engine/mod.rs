//! # Engine Module
//!
//! Turns validated generation parameters into a finished [`Structure`]: the lattice
//! sites produced by [`crate::core::lattice`] are labelled with species by a
//! [`coloring`] strategy, enclosed in a periodic cell by a [`cell_sizer`] strategy,
//! and annotated with metadata.
//!
//! - **Configuration** ([`config`]) - what to build and which strategies to use
//! - **Species assignment** ([`coloring`]) - traversal-parity and sublattice coloring
//! - **Cell sizing** ([`cell_sizer`]) - fixed and adaptive vacuum, centering
//! - **Progress Monitoring** ([`progress`]) - callbacks for long batch runs
//! - **Error Handling** ([`error`]) - the error type shared with the workflows
//!
//! [`Structure`]: crate::core::models::structure::Structure

pub mod builder;
pub mod cell_sizer;
pub mod coloring;
pub mod config;
pub mod error;
pub mod progress;
