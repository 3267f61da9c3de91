//! Startup requirement validation for process-group-exporter.
//!
//! This module validates that the exporter can read the procfs root and that
//! the configured root supervisor matches PID 1 before serving scrapes.

use nix::unistd::geteuid;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::config::Config;

/// Validate all runtime requirements
pub fn validate_requirements(config: &Config) -> Result<(), ValidationError> {
    info!("🔍 Validating runtime requirements...");

    if let Some(path) = &config.test_data_file {
        info!("✅ Using test data from {} - skipping procfs checks", path.display());
        return Ok(());
    }

    if !cfg!(target_os = "linux") {
        check_user_privileges();
        info!("✅ Using the sysinfo process table - skipping procfs checks");
        return Ok(());
    }

    check_user_privileges();
    check_proc_access(config.proc_root())?;

    match check_root_supervisor(config.proc_root(), config.root_supervisor()) {
        SupervisorCheck::Matches => {
            info!("✅ PID 1 is '{}'", config.root_supervisor());
        }
        SupervisorCheck::Mismatch(actual) => {
            warn!(
                "⚠️  PID 1 is '{}', not the configured root supervisor '{}'",
                actual,
                config.root_supervisor()
            );
            warn!("   Every process will be grouped under '{}'", actual);
            warn!("   Recommendation: set root_supervisor: {}", actual);
        }
        SupervisorCheck::Unknown(e) => {
            warn!("⚠️  Could not read the name of PID 1: {}", e);
        }
    }

    info!("✅ All runtime requirements validated");
    Ok(())
}

/// Check if running with sufficient privileges
fn check_user_privileges() {
    if !geteuid().is_root() {
        warn!("⚠️  Not running as root - processes of other users may be skipped");
        warn!("   Recommendation: Run as root for full system monitoring");
    } else {
        info!("✅ Running as root (uid=0)");
    }
}

/// Check that the procfs root can be enumerated
fn check_proc_access(root: &Path) -> Result<(), ValidationError> {
    match fs::read_dir(root) {
        Ok(_) => {
            debug!("{} is readable", root.display());
        }
        Err(e) => {
            error!("❌ Cannot enumerate {}: {}", root.display(), e);
            error!("   Every scrape will fail until this is fixed");
            return Err(ValidationError::ProcUnreadable(format!(
                "{}: {}",
                root.display(),
                e
            )));
        }
    }

    let test_file = root.join("1").join("stat");
    match fs::metadata(&test_file) {
        Ok(_) => info!("✅ procfs access: {} readable", test_file.display()),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            warn!("⚠️  Cannot read {} - insufficient permissions", test_file.display());
            warn!("   Ancestor chains through PID 1 will fail to resolve");
        }
        Err(e) => {
            warn!("⚠️  Could not test procfs access: {}", e);
        }
    }
    Ok(())
}

/// Outcome of comparing PID 1 with the configured supervisor.
#[derive(Debug, PartialEq, Eq)]
pub enum SupervisorCheck {
    Matches,
    Mismatch(String),
    Unknown(String),
}

pub fn check_root_supervisor(root: &Path, supervisor: &str) -> SupervisorCheck {
    match fs::read_to_string(root.join("1").join("comm")) {
        Ok(name) if name.trim() == supervisor => SupervisorCheck::Matches,
        Ok(name) => SupervisorCheck::Mismatch(name.trim().to_string()),
        Err(e) => SupervisorCheck::Unknown(e.to_string()),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("procfs root not readable: {0}")]
    ProcUnreadable(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_check_root_supervisor() {
        let dir = tempdir().expect("Failed to create temp dir");
        fs::create_dir(dir.path().join("1")).unwrap();
        fs::write(dir.path().join("1").join("comm"), "systemd\n").unwrap();

        assert_eq!(
            check_root_supervisor(dir.path(), "systemd"),
            SupervisorCheck::Matches
        );
        assert_eq!(
            check_root_supervisor(dir.path(), "launchd"),
            SupervisorCheck::Mismatch("systemd".into())
        );
    }

    #[test]
    fn test_check_root_supervisor_missing_pid1() {
        let dir = tempdir().expect("Failed to create temp dir");
        assert!(matches!(
            check_root_supervisor(dir.path(), "systemd"),
            SupervisorCheck::Unknown(_)
        ));
    }

    #[test]
    fn test_unreadable_proc_root_fails() {
        assert!(check_proc_access(Path::new("/nonexistent/proc")).is_err());
    }
}
