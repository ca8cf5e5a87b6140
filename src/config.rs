//! Configuration management for herakles-nmt-exporter.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

// Default configuration constants
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Environment variable consulted for the installation root.
pub const JAVA_HOME_ENV: &str = "JAVA_HOME";

/// Effective configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    // Target JVM
    pub pid: Option<String>,
    #[serde(alias = "java-home")]
    pub java_home: Option<String>,

    // NMT detection
    /// Startup flags of the target JVM; read from /proc when unset
    #[serde(alias = "jvm-flags")]
    pub jvm_flags: Option<Vec<String>>,
    /// Skip detection and assume this answer
    #[serde(alias = "nmt-enabled")]
    pub nmt_enabled: Option<bool>,
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,

    // Feature flags
    #[serde(alias = "enable-nmt-metrics")]
    pub enable_nmt_metrics: Option<bool>,

    // Performance tuning
    /// jcmd timeout in seconds, 0 disables the timeout
    #[serde(alias = "command-timeout-secs")]
    pub command_timeout_secs: Option<u64>,

    // Logging
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pid: None,
            java_home: None,
            jvm_flags: None,
            nmt_enabled: None,
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            enable_nmt_metrics: Some(true),
            command_timeout_secs: Some(DEFAULT_COMMAND_TIMEOUT_SECS),
            log_level: Some("info".into()),
        }
    }
}

impl Config {
    /// jcmd timeout, `None` when disabled with 0.
    pub fn command_timeout(&self) -> Option<Duration> {
        match self
            .command_timeout_secs
            .unwrap_or(DEFAULT_COMMAND_TIMEOUT_SECS)
        {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn proc_root(&self) -> PathBuf {
        self.proc_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT))
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if !cfg.enable_nmt_metrics.unwrap_or(true) {
        // Nothing is collected, target settings are irrelevant
        return Ok(());
    }

    match cfg.pid.as_deref().map(str::trim) {
        None | Some("") => {
            return Err("pid of the target JVM is not set (use --pid or `pid:`)".into());
        }
        Some(pid) if !pid.chars().all(|c| c.is_ascii_digit()) => {
            return Err(format!("Invalid pid '{}', expected a numeric process id", pid).into());
        }
        Some(_) => {}
    }

    match cfg.java_home.as_deref().map(str::trim) {
        None | Some("") => {
            return Err(format!(
                "java_home is not set (use --java-home, `java_home:` or {})",
                JAVA_HOME_ENV
            )
            .into());
        }
        Some(_) => {}
    }

    if let Some(flags) = &cfg.jvm_flags {
        if flags.iter().any(|f| f.trim().is_empty()) {
            return Err("jvm_flags must not contain empty entries".into());
        }
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, environment, and defaults.
/// This enforces precedence: CLI (if provided) > config file > environment > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref().and_then(|p| p.to_str()))?
    };

    if let Some(pid) = &args.pid {
        config.pid = Some(pid.clone());
    }

    if let Some(java_home) = &args.java_home {
        config.java_home = Some(java_home.clone());
    } else if config.java_home.is_none() {
        config.java_home = std::env::var(JAVA_HOME_ENV).ok().filter(|v| !v.is_empty());
    }

    if !args.jvm_flags.is_empty() {
        config.jvm_flags = Some(args.jvm_flags.clone());
    }

    if args.nmt_enabled.is_some() {
        config.nmt_enabled = args.nmt_enabled;
    }

    if let Some(timeout) = args.timeout_secs {
        config.command_timeout_secs = Some(timeout);
    }

    // Feature flags
    if args.disable_nmt_metrics {
        config.enable_nmt_metrics = Some(false);
    }

    Ok(config)
}

/// Enhanced configuration loading with multiple format support
pub fn load_config(path: Option<&str>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = if let Some(p) = path {
        PathBuf::from(p)
    } else {
        // Try default locations
        let defaults = [
            "/etc/herakles/nmt-exporter.yaml",
            "/etc/herakles/nmt-exporter.yml",
            "/etc/herakles/nmt-exporter.json",
            "./herakles-nmt-exporter.yaml",
            "./herakles-nmt-exporter.yml",
            "./herakles-nmt-exporter.json",
        ];

        defaults
            .iter()
            .find(|p| Path::new(p).exists())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(""))
    };

    if path.to_string_lossy().is_empty() || !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)?;
    let config = parse_config(&content, path.extension().and_then(|s| s.to_str()))?;
    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

/// Parses config content, picking the format from the file extension.
fn parse_config(content: &str, extension: Option<&str>) -> Result<Config, Box<dyn std::error::Error>> {
    let config = match extension {
        Some("json") => serde_json::from_str(content)?,
        Some("toml") => toml::from_str(content)?,
        // Default to YAML
        _ => serde_yaml::from_str(content)?,
    };
    Ok(config)
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };

    println!("{output}");
    Ok(())
}
