//! Parse command implementation.
//!
//! Parses a saved `VM.native_memory summary` report, useful for checking
//! what a given JDK version produces without a running JVM.

use anyhow::Context;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

use herakles_nmt_exporter::{flatten, parse_with_diagnostics};

use crate::cli::OutputFormat;
use crate::commands::collect::render_metrics;

/// Reads the report from a file or, for `-`, from stdin.
fn read_report(input: &Path) -> anyhow::Result<String> {
    if input.to_string_lossy() == "-" {
        let mut raw = String::new();
        io::stdin()
            .read_to_string(&mut raw)
            .context("Failed to read report from stdin")?;
        return Ok(raw);
    }

    fs::read_to_string(input).with_context(|| format!("Failed to read report {}", input.display()))
}

/// Parses a report and prints flat metrics or the structured report.
pub fn command_parse(
    input: &Path,
    format: OutputFormat,
    structured: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let raw = read_report(input)?;
    let outcome = parse_with_diagnostics(&raw);

    for diagnostic in &outcome.diagnostics {
        eprintln!("⚠️  {}", diagnostic);
    }

    let output = if structured {
        match format {
            OutputFormat::Json => serde_json::to_string_pretty(&outcome.report)?,
            OutputFormat::Toml => toml::to_string_pretty(&outcome.report)?,
            OutputFormat::Yaml | OutputFormat::Prometheus => serde_yaml::to_string(&outcome.report)?,
        }
    } else {
        render_metrics(&flatten(&outcome.report), format)?
    };

    print!("{}", output);
    if format == OutputFormat::Json {
        println!();
    }
    Ok(())
}
