//! One NMT collection cycle: gate, fetch, parse, flatten.

use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use super::adapter::{flatten, MetricMap};
use super::fetcher::{FetchError, ReportFetcher};
use super::gate::{InstrumentationGate, NMT_SUMMARY_FLAG};
use super::parser::parse;
use super::report::NativeMemoryReport;

/// JVM process whose native memory is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetProcess {
    pub pid: String,
    pub install_root: String,
}

impl TargetProcess {
    pub fn new(pid: impl Into<String>, install_root: impl Into<String>) -> Self {
        Self {
            pid: pid.into(),
            install_root: install_root.into(),
        }
    }
}

/// Reasons a cycle produced no metrics.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("native memory tracking is not enabled, add -XX:NativeMemoryTracking=summary to the JVM command line")]
    InstrumentationDisabled,

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Runs collection cycles against a single JVM.
#[derive(Debug)]
pub struct NmtCollector<F> {
    gate: InstrumentationGate,
    fetcher: F,
    target: TargetProcess,
}

impl<F: ReportFetcher> NmtCollector<F> {
    pub fn new(gate: InstrumentationGate, fetcher: F, target: TargetProcess) -> Self {
        Self {
            gate,
            fetcher,
            target,
        }
    }

    pub fn gate(&self) -> InstrumentationGate {
        self.gate
    }

    pub fn target(&self) -> &TargetProcess {
        &self.target
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetches and parses a fresh report.
    ///
    /// The fetcher is never called while the gate is closed.
    #[instrument(skip(self), fields(pid = %self.target.pid))]
    pub fn try_collect_report(&self) -> Result<NativeMemoryReport, CollectError> {
        if !self.gate.is_enabled() {
            return Err(CollectError::InstrumentationDisabled);
        }

        let start = Instant::now();
        let raw = self
            .fetcher
            .fetch_report(&self.target.pid, &self.target.install_root)?;
        let report = parse(&raw);
        debug!(
            "NMT report fetched and parsed in {:.2}ms",
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(report)
    }

    /// Runs one cycle and returns the flat metrics or the reason for none.
    pub fn try_collect(&self) -> Result<MetricMap, CollectError> {
        let report = self.try_collect_report()?;
        Ok(flatten(&report))
    }

    /// Runs one cycle, degrading every failure to an empty map.
    pub fn collect(&self) -> MetricMap {
        match self.try_collect() {
            Ok(metrics) => {
                if metrics.is_empty() {
                    info!("No NMT metric has been collected this cycle");
                } else {
                    debug!("Collected {} NMT metrics", metrics.len());
                }
                metrics
            }
            Err(CollectError::InstrumentationDisabled) => {
                warn!("Could not collect NMT metrics - NMT not enabled");
                warn!("   Please add {} to your Java command line params", NMT_SUMMARY_FLAG);
                MetricMap::new()
            }
            Err(CollectError::Fetch(e)) => {
                error!("Error while fetching NMT report: {}", e);
                MetricMap::new()
            }
        }
    }
}
