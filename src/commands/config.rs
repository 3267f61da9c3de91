//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = match output {
        Some(path) => path,
        None => PathBuf::from("process-group-exporter.yaml"),
    };

    let is_yaml = matches!(format, ConfigFormat::Yaml);
    let mut content = render_config(&config, format)?;
    if commented && is_yaml {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# Process Group Exporter Configuration
# ====================================
#
# Server Configuration
# --------------------
# bind: "127.0.0.1"            # Bind IP (loopback by default)
# port: 19002                  # HTTP port (the PORT environment variable overrides it)
#
# Collection
# ----------
# root_supervisor: "systemd"   # PID 1 name; ancestor walks stop below it ("launchd" on macOS)
# parallelism: null            # Parallel threads (null = auto)
# collect_timeout_secs: 10     # Fail a scrape whose collection takes longer
# proc_root: "/proc"           # procfs root to scan (Linux only; other hosts use sysinfo)
# test_data_file: null         # JSON process table used instead of procfs
#
# Feature Flags
# -------------
# enable_health: true          # Enable /health endpoint
# enable_telemetry: true       # Export process_group_exporter_* self-metrics
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
"#;

    format!("{comments}\n{yaml}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comments_prefix_yaml() {
        let out = add_config_comments("port: 19002\n".into());
        assert!(out.starts_with("# Process Group Exporter Configuration"));
        assert!(out.ends_with("port: 19002\n"));
    }
}
