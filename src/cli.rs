//! CLI arguments and subcommands for process-group-exporter.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "process-group-exporter",
    about = "Prometheus exporter for CPU and memory usage per process group",
    long_about = "Prometheus exporter for CPU and memory usage per process group.\n\n\
                  Every scrape enumerates all processes, labels each one with its own name \
                  and the name of its session root (the top-most ancestor below the root \
                  supervisor) and exports summed CPU seconds and memory percent per group.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// HTTP listen port
    #[arg(short = 'p', long, env = "PORT")]
    pub port: Option<u16>,

    /// Bind to specific interface/IP
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Log level (overrides log_level from the config file)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Name of the root supervisor process where ancestor walks stop
    #[arg(long)]
    pub root_supervisor: Option<String>,

    /// Parallel processing threads (0 = auto)
    #[arg(long)]
    pub parallelism: Option<usize>,

    /// Abort a collection cycle after N seconds
    #[arg(long)]
    pub collect_timeout: Option<u64>,

    /// procfs root to scan (Linux only)
    #[arg(long)]
    pub proc_root: Option<PathBuf>,

    /// Path to JSON test data file (uses synthetic data instead of /proc)
    #[arg(short = 't', long)]
    pub test_data_file: Option<PathBuf>,

    /// Disable /health endpoint
    #[arg(long)]
    pub disable_health: bool,

    /// Disable internal process_group_exporter_* metrics
    #[arg(long)]
    pub disable_telemetry: bool,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check runtime requirements and permissions
    Check,

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Run collection cycles and print the group table
    Test {
        /// Number of test iterations
        #[arg(short = 'n', long, default_value_t = 1)]
        iterations: usize,

        /// Show every group instead of the top 20 by CPU
        #[arg(long)]
        verbose: bool,
    },
}
