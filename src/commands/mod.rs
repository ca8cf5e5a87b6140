//! CLI command implementations for herakles-nmt-exporter.
//!
//! This module provides implementations for all CLI subcommands:
//! - `collect`: Run collection cycles against the target JVM
//! - `parse`: Parse a saved NMT report
//! - `check`: Configuration and runtime validation
//! - `config`: Configuration file generation

pub mod check;
pub mod collect;
pub mod config;
pub mod parse;

// Re-export command functions
pub use check::command_check;
pub use collect::command_collect;
pub use config::command_config;
pub use parse::command_parse;
