//! Configuration management for process-group-exporter.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat};
use process_group_exporter::DEFAULT_ROOT_SUPERVISOR;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 19002;
pub const DEFAULT_COLLECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Exporter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,

    // Collection
    #[serde(alias = "root-supervisor")]
    pub root_supervisor: Option<String>,
    pub parallelism: Option<usize>,
    #[serde(alias = "collect-timeout-secs")]
    pub collect_timeout_secs: Option<u64>,
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,

    /// Path to JSON test data file (uses synthetic data instead of /proc)
    #[serde(alias = "test-data-file")]
    pub test_data_file: Option<PathBuf>,

    // Feature flags
    pub enable_health: Option<bool>,
    pub enable_telemetry: Option<bool>,

    // Logging
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: Some(DEFAULT_PORT),
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            root_supervisor: Some(DEFAULT_ROOT_SUPERVISOR.to_string()),
            parallelism: None,
            collect_timeout_secs: Some(DEFAULT_COLLECT_TIMEOUT_SECS),
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            test_data_file: None,
            enable_health: Some(true),
            enable_telemetry: Some(true),
            log_level: Some("info".into()),
        }
    }
}

impl Config {
    pub fn root_supervisor(&self) -> &str {
        self.root_supervisor
            .as_deref()
            .unwrap_or(DEFAULT_ROOT_SUPERVISOR)
    }

    pub fn collect_timeout(&self) -> Duration {
        Duration::from_secs(
            self.collect_timeout_secs
                .unwrap_or(DEFAULT_COLLECT_TIMEOUT_SECS),
        )
    }

    pub fn proc_root(&self) -> &Path {
        self.proc_root
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_PROC_ROOT))
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if cfg.collect_timeout_secs == Some(0) {
        return Err("collect_timeout_secs must be greater than 0".into());
    }

    if cfg
        .root_supervisor
        .as_deref()
        .is_some_and(|s| s.trim().is_empty())
    {
        return Err("root_supervisor must not be empty".into());
    }

    if let Some(bind) = cfg.bind.as_deref() {
        if bind.parse::<std::net::IpAddr>().is_err() {
            return Err(format!("Invalid bind address '{}'", bind).into());
        }
    }

    if let Some(path) = &cfg.test_data_file {
        if !path.exists() {
            return Err(format!("Test data file not found: {}", path.display()).into());
        }
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI / environment (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }

    // Set from --port or the PORT environment variable
    if let Some(port) = args.port {
        config.port = Some(port);
    }

    if let Some(supervisor) = &args.root_supervisor {
        config.root_supervisor = Some(supervisor.clone());
    }
    if let Some(threads) = args.parallelism {
        config.parallelism = Some(threads);
    }
    if let Some(secs) = args.collect_timeout {
        config.collect_timeout_secs = Some(secs);
    }
    if let Some(root) = &args.proc_root {
        config.proc_root = Some(root.clone());
    }
    if let Some(test_file) = &args.test_data_file {
        config.test_data_file = Some(test_file.clone());
    }

    if args.disable_health {
        config.enable_health = Some(false);
    }
    if args.disable_telemetry {
        config.enable_telemetry = Some(false);
    }

    Ok(config)
}

/// Configuration loading with multiple format support
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(format!("Config file not found: {}", p.display()).into());
            }
            p.to_path_buf()
        }
        None => {
            let defaults = [
                "/etc/process-group-exporter/config.yaml",
                "/etc/process-group-exporter/config.yml",
                "/etc/process-group-exporter/config.json",
                "./process-group-exporter.yaml",
                "./process-group-exporter.yml",
                "./process-group-exporter.json",
            ];

            match defaults.iter().find(|p| Path::new(p).exists()) {
                Some(p) => PathBuf::from(p),
                None => return Ok(Config::default()),
            }
        }
    };

    let content = fs::read_to_string(&path)?;
    parse_config(&content, path.extension().and_then(|s| s.to_str())).map(|config| {
        info!("Loaded configuration from: {}", path.display());
        config
    })
}

/// Parses configuration content, picking the format from the file extension.
///
/// Keys missing from the file keep their default values.
pub fn parse_config(
    content: &str,
    extension: Option<&str>,
) -> Result<Config, Box<dyn std::error::Error>> {
    let parsed: Config = match extension {
        Some("json") => serde_json::from_str(content)?,
        Some("toml") => toml::from_str(content)?,
        _ => serde_yaml::from_str(content)?,
    };
    Ok(merge_defaults(parsed))
}

fn merge_defaults(parsed: Config) -> Config {
    let d = Config::default();
    Config {
        port: parsed.port.or(d.port),
        bind: parsed.bind.or(d.bind),
        root_supervisor: parsed.root_supervisor.or(d.root_supervisor),
        parallelism: parsed.parallelism.or(d.parallelism),
        collect_timeout_secs: parsed.collect_timeout_secs.or(d.collect_timeout_secs),
        proc_root: parsed.proc_root.or(d.proc_root),
        test_data_file: parsed.test_data_file.or(d.test_data_file),
        enable_health: parsed.enable_health.or(d.enable_health),
        enable_telemetry: parsed.enable_telemetry.or(d.enable_telemetry),
        log_level: parsed.log_level.or(d.log_level),
    }
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, format)?);
    Ok(())
}

pub fn render_config(
    config: &Config,
    format: ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}
