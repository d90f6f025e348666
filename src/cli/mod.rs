//! Command-line interface for lingoforge.
//!
//! Provides commands for running translation jobs against local JSON
//! datasets, inspecting stored jobs, and listing supported languages.

mod commands;

pub use commands::{parse_cli, run, run_with_cli};
