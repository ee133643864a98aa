//! # Workflows Module
//!
//! The top-level entry points of the library.
//!
//! - **Generation Workflow** ([`generate`]) - one structure from its parameters, optionally
//!   written to a CIF file.
//! - **Batch Workflow** ([`batch`]) - many independent structures written into one output
//!   directory, in parallel, with a caller-chosen failure policy.

pub mod batch;
pub mod generate;
