//! Herakles NMT Exporter Library
//!
//! This library extracts JVM Native Memory Tracking (NMT) data from the
//! output of `jcmd <pid> VM.native_memory summary` and turns it into a flat
//! set of numeric metrics. Publishing those metrics is left to the caller.
//!
//! # Features
//!
//! - **NMT Detection**: Check the JVM startup flags once for summary tracking
//! - **Report Fetching**: Run `jcmd` synchronously with an optional timeout
//! - **Tolerant Parsing**: Unknown lines are skipped, garbage yields an empty report
//! - **Flat Metrics**: `nmt.<category>.<field>` names with integer values
//!
//! # Usage
//!
//! ```rust
//! use herakles_nmt_exporter::{flatten, parse};
//!
//! let raw = "Total: reserved=2048KB, committed=1024KB\n\
//!            \n\
//!            -  Java Heap (reserved=1024KB, committed=512KB)\n\
//!                  (mmap: reserved=1024KB, committed=512KB)\n";
//!
//! let report = parse(raw);
//! let metrics = flatten(&report);
//!
//! assert_eq!(metrics["nmt.total.reservedKB"], 2048);
//! assert_eq!(metrics["nmt.java.heap.mmapCommittedKB"], 512);
//! ```

pub mod nmt;

// Re-export main types for convenience
pub use nmt::{
    flatten, parse, parse_with_diagnostics, render_prometheus, CategoryMetrics, CollectError,
    CommandPlatform, FetchError, InstrumentationGate, JcmdFetcher, MetricMap, NativeMemoryReport,
    NmtCollector, ParseDiagnostic, ReportFetcher, TargetProcess, UnsupportedPlatform,
    NMT_SUMMARY_FLAG,
};
