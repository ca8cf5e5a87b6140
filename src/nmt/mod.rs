//! Native Memory Tracking pipeline.
//!
//! This module provides:
//! - `gate`: detection of `-XX:NativeMemoryTracking=summary` in the target JVM
//! - `platform`: how `jcmd` is located on the host OS
//! - `fetcher`: running `jcmd <pid> VM.native_memory summary`
//! - `parser`: turning the report text into a typed model
//! - `report`: the typed model
//! - `adapter`: flattening the model into dotted metric names
//! - `collector`: one full collection cycle
//! - `exposition`: Prometheus text rendering of a flat metric map

pub mod adapter;
pub mod collector;
pub mod exposition;
pub mod fetcher;
pub mod gate;
pub mod parser;
pub mod platform;
pub mod report;

// Re-export commonly used types
pub use adapter::{flatten, metric_name, MetricMap, METRIC_PREFIX};
pub use collector::{CollectError, NmtCollector, TargetProcess};
pub use exposition::{prometheus_name, render_prometheus};
pub use fetcher::{FetchError, JcmdFetcher, ReportFetcher, NMT_SUMMARY_COMMAND};
pub use gate::{env_options, jvm_options, InstrumentationGate, NMT_SUMMARY_FLAG};
pub use parser::{classify_line, parse, parse_with_diagnostics, LineShape, ParseDiagnostic, ParseOutcome};
pub use platform::{CommandPlatform, UnsupportedPlatform};
pub use report::{category_key, Allocation, CategoryMetrics, MemoryFootprint, NativeMemoryReport};
