//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::Config;

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = match output {
        Some(path) => path,
        None => PathBuf::from("herakles-nmt-exporter.yaml"),
    };

    let content = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(&config)?,
        ConfigFormat::Toml => toml::to_string_pretty(&config)?,
        ConfigFormat::Yaml => {
            let mut content = serde_yaml::to_string(&config)?;
            if commented {
                content = add_config_comments(content);
            }
            content
        }
    };

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
    let comments = r#"# Herakles NMT Exporter Configuration
# ===================================
#
# Target JVM
# ----------
# pid: "12345"                 # Process id of the JVM to inspect
# java_home: /usr/lib/jvm/jdk  # Installation root, jcmd runs from <java_home>/bin
#                              # (falls back to $JAVA_HOME)
#
# NMT Detection
# -------------
# jvm_flags: null              # Startup flags of the JVM; null = read /proc/<pid>/{cmdline,environ}
# nmt_enabled: null            # true/false skips detection entirely
# proc_root: /proc             # Where the target command line is read from
#
# Collection
# ----------
# enable_nmt_metrics: true     # false disables collection
# command_timeout_secs: 30     # jcmd timeout, 0 waits forever
#
# Logging
# -------
# log_level: info

"#;
    format!("{comments}{yaml}")
}
