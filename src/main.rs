//! herakles-nmt-exporter - version 0.1.0
//!
//! Collects JVM Native Memory Tracking metrics with tracing logging.
//! This is the main entry point that resolves configuration and dispatches subcommands.

mod cli;
mod commands;
mod config;
mod startup_checks;

use clap::Parser;
use tracing::{error, info};

use cli::{Args, Commands, OutputFormat};
use commands::{command_check, command_collect, command_config, command_parse};
use config::{resolve_config, show_config, validate_effective_config, Config};

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(args: &Args) {
    // stdout carries command output, logs go to stderr
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(args.log_level.filter())
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    info!("Logging initialized with level: {:?}", args.log_level);
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Main application entry point.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format.clone());
    }

    setup_logging(&args);

    // Parse, Config and Check commands don't need a valid target
    match &args.command {
        Some(Commands::Parse {
            input,
            format,
            report,
        }) => return command_parse(input, *format, *report),

        Some(Commands::Config {
            output,
            format,
            commented,
        }) => return command_config(output.clone(), format.clone(), *commented),

        Some(Commands::Check) => {
            let config = resolve_config(&args)?;
            return command_check(&config);
        }

        _ => {}
    }

    let config = load_validated_config(&args)?;

    // An unsupported OS is the only condition that stops the collector from starting
    let platform = match startup_checks::validate_requirements(&config) {
        Ok(platform) => platform,
        Err(e) if e.is_fatal() => {
            error!("❌ Startup validation failed: {}", e);
            return Err(e.into());
        }
        Err(e) => {
            error!("❌ Startup validation failed: {}", e);
            error!("   Collection will run but is unlikely to produce metrics!");
            herakles_nmt_exporter::CommandPlatform::detect()?
        }
    };

    let (format, iterations) = match &args.command {
        Some(Commands::Collect { format, iterations }) => (*format, *iterations),
        _ => (OutputFormat::Yaml, 1),
    };

    command_collect(format, iterations, &config, platform)
}
