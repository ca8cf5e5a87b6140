//! CLI arguments and subcommands for herakles-nmt-exporter.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

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

impl LogLevel {
    /// Maximum level passed to the subscriber; `Off` silences everything.
    pub fn filter(&self) -> LevelFilter {
        match self {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Output format for collected metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
    Toml,
    /// Prometheus text exposition format
    Prometheus,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "herakles-nmt-exporter",
    about = "Collects JVM Native Memory Tracking metrics via jcmd",
    long_about = "Collects JVM Native Memory Tracking metrics via jcmd.\n\n\
                  Runs `jcmd <pid> VM.native_memory summary` against a JVM started with \
                  -XX:NativeMemoryTracking=summary, parses the report and prints one \
                  nmt.<category>.<field> metric per reported value.",
    author = "Michael Moll <exporter@herakles.now> - Herakles",
    version = "0.1.0",
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

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

    /// Process id of the target JVM
    #[arg(short = 'p', long)]
    pub pid: Option<String>,

    /// Installation root of the target JVM (jcmd is run from <java-home>/bin)
    #[arg(long)]
    pub java_home: Option<String>,

    /// JVM startup flag of the target (repeatable); skips /proc detection
    #[arg(long = "jvm-flag", allow_hyphen_values = true)]
    pub jvm_flags: Vec<String>,

    /// Assume NMT is enabled (or disabled) instead of detecting it
    #[arg(long)]
    pub nmt_enabled: Option<bool>,

    /// Timeout for jcmd in seconds (0 = wait forever)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Disable NMT metrics collection
    #[arg(long)]
    pub disable_nmt_metrics: bool,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Collect NMT metrics from the target JVM and print them (default)
    Collect {
        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: OutputFormat,

        /// Number of collection cycles
        #[arg(short = 'n', long, default_value_t = 1)]
        iterations: usize,
    },

    /// Parse a saved `VM.native_memory summary` report
    Parse {
        /// Report file ("-" reads stdin)
        input: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: OutputFormat,

        /// Print the structured report instead of flat metrics
        #[arg(long)]
        report: bool,
    },

    /// Validate configuration and runtime requirements
    Check,

    /// Generate configuration files
    Config {
        /// Output file path ("-" prints to stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },
}
