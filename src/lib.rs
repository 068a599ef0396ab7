//! # vuh
//!
//! Helpers for configuring VUnit projects: UVVM presets, project assembly
//! from a `vuh.toml` description and the `vuh` command line interface.
//! The simulator-independent pieces live in [`vuh_core`].
pub mod cli;
pub mod setup;
pub mod uvvm;

pub use setup::build_project;
