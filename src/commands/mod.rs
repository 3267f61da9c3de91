//! CLI command implementations for process-group-exporter.
//!
//! This module provides implementations for all CLI subcommands:
//! - `check`: Runtime requirement validation
//! - `config`: Configuration file generation
//! - `test`: Collection cycle testing

pub mod config;
pub mod test;

// Re-export command functions
pub use config::command_config;
pub use test::command_test;
