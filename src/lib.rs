// src/lib.rs

//! GCLI: an incremental command-line parsing and assignment engine.
//!
//! Typed input is tokenized, matched against registered commands and
//! distributed over typed parameters on every keystroke. The engine reports
//! per-character status, completions and normalized command lines, and runs
//! commands once their input is valid.

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod state;
pub mod system;
