//! Integration tests for the collection cycle.
//!
//! A scripted fetcher stands in for jcmd so the gate and error handling
//! can be checked without a JVM.

use std::cell::{Cell, RefCell};
use std::time::Duration;

use herakles_nmt_exporter::{
    CollectError, FetchError, InstrumentationGate, NmtCollector, ReportFetcher, TargetProcess,
    NMT_SUMMARY_FLAG,
};

const JDK8_REPORT: &str = include_str!("data/nmt_summary_jdk8.txt");

/// Fetcher double that records its calls.
struct ScriptedFetcher {
    response: fn() -> Result<String, FetchError>,
    calls: Cell<usize>,
    last_target: RefCell<Option<(String, String)>>,
}

impl ScriptedFetcher {
    fn new(response: fn() -> Result<String, FetchError>) -> Self {
        Self {
            response,
            calls: Cell::new(0),
            last_target: RefCell::new(None),
        }
    }
}

impl ReportFetcher for ScriptedFetcher {
    fn fetch_report(&self, pid: &str, install_root: &str) -> Result<String, FetchError> {
        self.calls.set(self.calls.get() + 1);
        *self.last_target.borrow_mut() = Some((pid.to_string(), install_root.to_string()));
        (self.response)()
    }
}

fn report_ok() -> Result<String, FetchError> {
    Ok(JDK8_REPORT.to_string())
}

fn spawn_failure() -> Result<String, FetchError> {
    Err(FetchError::Spawn {
        program: "./jcmd".to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
    })
}

fn timed_out() -> Result<String, FetchError> {
    Err(FetchError::TimedOut {
        program: "./jcmd".to_string(),
        timeout: Duration::from_secs(30),
    })
}

fn not_enabled_output() -> Result<String, FetchError> {
    Ok("12345:\nNative memory tracking is not enabled\n".to_string())
}

fn target() -> TargetProcess {
    TargetProcess::new("12345", "/usr/lib/jvm/java-8")
}

fn enabled_gate() -> InstrumentationGate {
    InstrumentationGate::from_flags(["-Xmx256m", NMT_SUMMARY_FLAG])
}

#[test]
fn test_disabled_gate_never_fetches() {
    let gate = InstrumentationGate::from_flags(["-Xmx256m"]);
    let collector = NmtCollector::new(gate, ScriptedFetcher::new(report_ok), target());

    assert!(collector.collect().is_empty());
    assert!(matches!(
        collector.try_collect(),
        Err(CollectError::InstrumentationDisabled)
    ));
    assert_eq!(collector.fetcher().calls.get(), 0);
}

#[test]
fn test_enabled_gate_collects_metrics() {
    let collector = NmtCollector::new(enabled_gate(), ScriptedFetcher::new(report_ok), target());

    let metrics = collector.collect();
    assert_eq!(metrics["nmt.total.reservedKB"], 1493345);
    assert_eq!(metrics["nmt.java.heap.mmapCommittedKB"], 47104);
    assert_eq!(collector.fetcher().calls.get(), 1);
    assert_eq!(
        collector.fetcher().last_target.borrow().clone(),
        Some(("12345".to_string(), "/usr/lib/jvm/java-8".to_string()))
    );
}

#[test]
fn test_each_cycle_fetches_a_fresh_report() {
    let collector = NmtCollector::new(enabled_gate(), ScriptedFetcher::new(report_ok), target());

    let first = collector.collect();
    let second = collector.collect();
    assert_eq!(first, second);
    assert_eq!(collector.fetcher().calls.get(), 2);
}

#[test]
fn test_spawn_failure_degrades_to_no_metrics() {
    let collector = NmtCollector::new(enabled_gate(), ScriptedFetcher::new(spawn_failure), target());

    assert!(collector.collect().is_empty());
    assert!(matches!(
        collector.try_collect(),
        Err(CollectError::Fetch(FetchError::Spawn { .. }))
    ));
    // No automatic retry: one fetch per cycle.
    assert_eq!(collector.fetcher().calls.get(), 2);
}

#[test]
fn test_timeout_degrades_to_no_metrics() {
    let collector = NmtCollector::new(enabled_gate(), ScriptedFetcher::new(timed_out), target());
    assert!(collector.collect().is_empty());

    let err = collector.try_collect().unwrap_err();
    assert!(err.to_string().contains("30s"), "unexpected message: {}", err);
}

#[test]
fn test_unparseable_output_degrades_to_no_metrics() {
    let collector =
        NmtCollector::new(enabled_gate(), ScriptedFetcher::new(not_enabled_output), target());

    let report = collector.try_collect_report().unwrap();
    assert!(report.is_empty());
    assert!(collector.collect().is_empty());
}
