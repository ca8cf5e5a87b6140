//! Parser for the `VM.native_memory summary` text report.
//!
//! The report has no formal grammar. The parser is strict about a single
//! anchor (the `Total:` line) and best-effort about everything else: lines
//! that do not match one of the known shapes are skipped, because newer JDKs
//! keep adding shapes without a machine readable schema.
//!
//! Typical input:
//!
//! ```text
//! Native Memory Tracking:
//!
//! Total: reserved=2048KB, committed=1024KB
//!
//! -                 Java Heap (reserved=1024KB, committed=512KB)
//!                             (mmap: reserved=1024KB, committed=512KB)
//!
//! -                    Class (reserved=1066139KB, committed=14491KB)
//!                             (classes #2103)
//!                             (malloc=1179KB #1650)
//!                             (mmap: reserved=1064960KB, committed=13312KB)
//! ```

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::{debug, error, info, warn};

use super::report::{category_key, Allocation, CategoryMetrics, MemoryFootprint, NativeMemoryReport};

static TOTAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Total: reserved=(?P<reserved>\d+)KB, committed=(?P<committed>\d+)KB")
        .expect("static regex")
});
static CATEGORY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"-\s*(?P<category>.*) \(reserved=(?P<reserved>\d+)KB, committed=(?P<committed>\d+)KB\)",
    )
    .expect("static regex")
});
static MALLOC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(malloc=(?P<kb>\d+)KB(?: #(?P<calls>\d+))?\)").expect("static regex")
});
static ARENA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(arena=(?P<kb>\d+)KB(?: #(?P<calls>\d+))?\)").expect("static regex")
});
static MMAP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(mmap: reserved=(?P<reserved>\d+)KB, committed=(?P<committed>\d+)KB\)")
        .expect("static regex")
});
static STACK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(stack: reserved=(?P<reserved>\d+)KB, committed=(?P<committed>\d+)KB\)")
        .expect("static regex")
});
static CLASSIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((?P<name>\w+) #(?P<count>\d+)\)").expect("static regex"));
/// Blank line between two category blocks.
static BLOCK_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r?\n\s*\r?\n").expect("static regex"));

/// Something the parser noticed while reading a report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseDiagnostic {
    #[error("no `Total: reserved=<N>KB, committed=<M>KB` line found")]
    MissingTotal,

    #[error("no category marker `-` found, report has a total only")]
    NoCategoryMarker,

    #[error("cannot parse `{value}` as {field}, parsing stopped")]
    InvalidNumber { field: &'static str, value: String },

    #[error("category `{key}` appears more than once, keeping the later block")]
    DuplicateCategory { key: String },
}

/// Result of parsing: the (possibly partial) report and what went wrong.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    pub report: NativeMemoryReport,
    pub diagnostics: Vec<ParseDiagnostic>,
}

/// Shape of a single line below a category header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineShape {
    Malloc(Allocation),
    Arena(Allocation),
    Mmap(MemoryFootprint),
    Stack(MemoryFootprint),
    /// `(classes #2103)`, `(thread #21)` and similar named counters.
    Classifier { name: String, count: u64 },
    Unrecognized,
}

/// Parses a report, logging any diagnostics.
///
/// Never fails: garbage in yields an empty report.
pub fn parse(raw: &str) -> NativeMemoryReport {
    let outcome = parse_with_diagnostics(raw);

    for diagnostic in &outcome.diagnostics {
        match diagnostic {
            ParseDiagnostic::InvalidNumber { .. } => error!("Could not parse NMT output: {}", diagnostic),
            ParseDiagnostic::DuplicateCategory { .. } => warn!("NMT output: {}", diagnostic),
            _ => info!("NMT output: {}", diagnostic),
        }
    }

    if outcome.report.categories.is_empty() {
        info!("NMT report has no categories after extraction");
    } else {
        debug!("Extracted NMT report : {:?}", outcome.report);
    }

    outcome.report
}

/// Parses a report and returns the diagnostics alongside the result.
pub fn parse_with_diagnostics(raw: &str) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();

    let total = match extract_total(raw) {
        Ok(Some(total)) => total,
        Ok(None) => {
            outcome.diagnostics.push(ParseDiagnostic::MissingTotal);
            return outcome;
        }
        Err(diagnostic) => {
            outcome.diagnostics.push(diagnostic);
            return outcome;
        }
    };
    outcome.report.total = Some(total);

    let Some(marker) = raw.find('-') else {
        outcome.diagnostics.push(ParseDiagnostic::NoCategoryMarker);
        return outcome;
    };

    for block in BLOCK_SEPARATOR_RE.split(&raw[marker..]) {
        match parse_block(block) {
            Ok(Some((key, metrics))) => {
                if outcome.report.categories.insert(key.clone(), metrics).is_some() {
                    outcome
                        .diagnostics
                        .push(ParseDiagnostic::DuplicateCategory { key });
                }
            }
            Ok(None) => {}
            Err(diagnostic) => {
                outcome.diagnostics.push(diagnostic);
                break;
            }
        }
    }

    outcome
}

fn extract_total(raw: &str) -> Result<Option<MemoryFootprint>, ParseDiagnostic> {
    match TOTAL_RE.captures(raw) {
        Some(caps) => Ok(Some(footprint(&caps, "total")?)),
        None => Ok(None),
    }
}

/// Parses one category block; `Ok(None)` when the header does not match.
fn parse_block(block: &str) -> Result<Option<(String, CategoryMetrics)>, ParseDiagnostic> {
    let mut lines = block.lines();
    let Some(header) = lines.next() else {
        return Ok(None);
    };
    let Some(caps) = CATEGORY_RE.captures(header) else {
        return Ok(None);
    };

    let key = category_key(&caps["category"]);
    let mut metrics = CategoryMetrics::new(
        number(&caps, "reserved", "category reserved KB")?,
        number(&caps, "committed", "category committed KB")?,
    );

    for line in lines {
        match classify_line(line)? {
            LineShape::Malloc(allocation) => metrics.malloc = Some(allocation),
            LineShape::Arena(allocation) => metrics.arena = Some(allocation),
            LineShape::Mmap(footprint) => metrics.mmap = Some(footprint),
            LineShape::Stack(footprint) => metrics.stack = Some(footprint),
            LineShape::Classifier { name, count } => {
                metrics.classifier_counts.insert(name, count);
            }
            LineShape::Unrecognized => {}
        }
    }

    Ok(Some((key, metrics)))
}

/// Classifies a line by the marker it contains and extracts its numbers.
///
/// A line that carries a known marker but does not match its full pattern
/// is `Unrecognized`; only numbers that match but do not fit in a `u64`
/// are reported as errors.
pub fn classify_line(line: &str) -> Result<LineShape, ParseDiagnostic> {
    let shape = if line.contains("(malloc=") {
        match MALLOC_RE.captures(line) {
            Some(caps) => LineShape::Malloc(allocation(&caps, "malloc")?),
            None => LineShape::Unrecognized,
        }
    } else if line.contains("(arena=") {
        match ARENA_RE.captures(line) {
            Some(caps) => LineShape::Arena(allocation(&caps, "arena")?),
            None => LineShape::Unrecognized,
        }
    } else if line.contains("(mmap: ") {
        match MMAP_RE.captures(line) {
            Some(caps) => LineShape::Mmap(footprint(&caps, "mmap")?),
            None => LineShape::Unrecognized,
        }
    } else if line.contains("(stack: ") {
        match STACK_RE.captures(line) {
            Some(caps) => LineShape::Stack(footprint(&caps, "stack")?),
            None => LineShape::Unrecognized,
        }
    } else {
        match CLASSIFIER_RE.captures(line) {
            Some(caps) => LineShape::Classifier {
                name: caps["name"].to_string(),
                count: number(&caps, "count", "classifier count")?,
            },
            None => LineShape::Unrecognized,
        }
    };

    Ok(shape)
}

fn allocation(caps: &Captures<'_>, field: &'static str) -> Result<Allocation, ParseDiagnostic> {
    let kb = number(caps, "kb", field)?;
    let calls = match caps.name("calls") {
        Some(m) => Some(parse_u64(m.as_str(), field)?),
        None => None,
    };
    Ok(Allocation { kb, calls })
}

fn footprint(caps: &Captures<'_>, field: &'static str) -> Result<MemoryFootprint, ParseDiagnostic> {
    Ok(MemoryFootprint::new(
        number(caps, "reserved", field)?,
        number(caps, "committed", field)?,
    ))
}

fn number(caps: &Captures<'_>, group: &str, field: &'static str) -> Result<u64, ParseDiagnostic> {
    let value = caps.name(group).map(|m| m.as_str()).unwrap_or_default();
    parse_u64(value, field)
}

fn parse_u64(value: &str, field: &'static str) -> Result<u64, ParseDiagnostic> {
    value.parse().map_err(|_| ParseDiagnostic::InvalidNumber {
        field,
        value: value.to_string(),
    })
}
