//! Collect command implementation.
//!
//! Runs NMT collection cycles against the configured JVM and prints the
//! resulting metrics.

use std::time::Instant;
use tracing::{debug, info};

use herakles_nmt_exporter::{
    render_prometheus, CommandPlatform, InstrumentationGate, JcmdFetcher, MetricMap,
    NmtCollector, TargetProcess,
};

use crate::cli::OutputFormat;
use crate::config::Config;

/// Builds the collector from the effective configuration.
///
/// The gate is resolved here, once, and never re-evaluated.
pub fn build_collector(config: &Config, platform: CommandPlatform) -> NmtCollector<JcmdFetcher> {
    let pid = config.pid.clone().unwrap_or_default();
    let install_root = config.java_home.clone().unwrap_or_default();

    let gate = match config.nmt_enabled {
        Some(enabled) => {
            debug!("NMT detection overridden by configuration: {}", enabled);
            InstrumentationGate::fixed(enabled)
        }
        None => InstrumentationGate::detect(config.jvm_flags.as_deref(), &config.proc_root(), &pid),
    };
    gate.log_status();

    let fetcher = JcmdFetcher::new(platform, config.command_timeout());
    NmtCollector::new(gate, fetcher, TargetProcess::new(pid, install_root))
}

/// Renders flat metrics in the requested format.
pub fn render_metrics(
    metrics: &MetricMap,
    format: OutputFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    let output = match format {
        OutputFormat::Yaml => serde_yaml::to_string(metrics)?,
        OutputFormat::Json => serde_json::to_string_pretty(metrics)?,
        OutputFormat::Toml => toml::to_string_pretty(metrics)?,
        OutputFormat::Prometheus => render_prometheus(metrics)?,
    };
    Ok(output)
}

/// Runs `iterations` collection cycles and prints each result.
pub fn command_collect(
    format: OutputFormat,
    iterations: usize,
    config: &Config,
    platform: CommandPlatform,
) -> Result<(), Box<dyn std::error::Error>> {
    if !config.enable_nmt_metrics.unwrap_or(true) {
        info!("NMT metrics collection is disabled by configuration");
        return Ok(());
    }

    let collector = build_collector(config, platform);

    for iteration in 1..=iterations {
        let start = Instant::now();
        let metrics = collector.collect();
        info!(
            "Cycle {}/{}: {} metrics in {:.2}ms",
            iteration,
            iterations,
            metrics.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        if iterations > 1 && format == OutputFormat::Yaml {
            println!("---");
        }
        print!("{}", render_metrics(&metrics, format)?);
        if format == OutputFormat::Json {
            println!();
        }
    }

    Ok(())
}
