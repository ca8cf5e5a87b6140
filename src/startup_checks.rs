//! Startup requirement validation for herakles-nmt-exporter.
//!
//! This module validates that jcmd can be run against the target JVM
//! before the first collection cycle.

use herakles_nmt_exporter::nmt::platform::JCMD;
use herakles_nmt_exporter::{CommandPlatform, UnsupportedPlatform};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::Config;

/// Validate all runtime requirements.
///
/// Only an unsupported platform is fatal; everything else degrades to
/// "no metrics" per cycle. Every check runs, and the first non-fatal
/// failure is returned.
pub fn validate_requirements(config: &Config) -> Result<CommandPlatform, ValidationError> {
    info!("🔍 Validating runtime requirements...");

    let platform = CommandPlatform::detect()?;
    info!("✅ Platform {} uses {:?} jcmd invocation", std::env::consts::OS, platform);

    match check_requirements(config, platform).into_iter().next() {
        Some(e) => Err(e),
        None => {
            info!("✅ All runtime requirements validated");
            Ok(platform)
        }
    }
}

/// Runs the non-fatal checks for `platform` and collects their failures.
pub fn check_requirements(config: &Config, platform: CommandPlatform) -> Vec<ValidationError> {
    let mut failures = Vec::new();

    if let Some(java_home) = config.java_home.as_deref() {
        if let Err(e) = check_jcmd(platform, Path::new(java_home)) {
            failures.push(e);
        }
    }

    if let Some(pid) = config.pid.as_deref() {
        if let Err(e) = check_target_process(&config.proc_root(), pid) {
            failures.push(e);
        }
    }

    failures
}

/// Check that `<java_home>/bin` (and on Unix `jcmd` inside it) exists
fn check_jcmd(platform: CommandPlatform, java_home: &Path) -> Result<(), ValidationError> {
    let bin_dir = java_home.join("bin");
    if !bin_dir.is_dir() {
        warn!("⚠️  {} is not a directory", bin_dir.display());
        warn!("   Set java_home to the installation root of the target JVM");
        return Err(ValidationError::MissingBinDir(bin_dir.display().to_string()));
    }

    match platform {
        CommandPlatform::Unix => {
            let jcmd = platform.program(&bin_dir);
            if !jcmd.exists() {
                warn!("⚠️  {} not found - is this a JDK rather than a JRE?", jcmd.display());
                return Err(ValidationError::MissingJcmd(jcmd.display().to_string()));
            }
            info!("✅ {} found", jcmd.display());
        }
        CommandPlatform::WindowsOrMac => {
            debug!("{} is resolved from PATH on this platform", JCMD);
        }
    }

    Ok(())
}

/// Check the target process is visible (Linux only, best effort)
fn check_target_process(proc_root: &Path, pid: &str) -> Result<(), ValidationError> {
    if !proc_root.exists() {
        debug!("{} not available, skipping target process check", proc_root.display());
        return Ok(());
    }

    if proc_root.join(pid).exists() {
        info!("✅ Target process {} is running", pid);
        Ok(())
    } else {
        warn!("⚠️  Target process {} not found under {}", pid, proc_root.display());
        Err(ValidationError::TargetNotRunning {
            pid: pid.to_string(),
            proc_root: proc_root.display().to_string(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error(transparent)]
    UnsupportedPlatform(#[from] UnsupportedPlatform),

    #[error("JVM bin directory not found: {0}")]
    MissingBinDir(String),

    #[error("jcmd not found: {0}")]
    MissingJcmd(String),

    #[error("target process {pid} not found under {proc_root}")]
    TargetNotRunning { pid: String, proc_root: String },
}

impl ValidationError {
    /// Whether the collector cannot operate at all.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ValidationError::UnsupportedPlatform(_))
    }
}
