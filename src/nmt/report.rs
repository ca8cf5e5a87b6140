//! Typed model of a `VM.native_memory summary` report.
//!
//! A report is built fresh for every collection cycle and is never mutated
//! after the parser hands it out.

use serde::Serialize;
use std::collections::BTreeMap;

/// Reserved/committed pair as printed by NMT, in kilobytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemoryFootprint {
    pub reserved_kb: u64,
    pub committed_kb: u64,
}

impl MemoryFootprint {
    pub fn new(reserved_kb: u64, committed_kb: u64) -> Self {
        Self {
            reserved_kb,
            committed_kb,
        }
    }
}

/// `(malloc=<N>KB #<calls>)` and `(arena=<N>KB #<calls>)` lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Allocation {
    /// Amount as printed by the JVM (kilobytes).
    pub kb: u64,
    /// Number of allocation sites/calls, omitted when the line carries none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calls: Option<u64>,
}

/// Metrics of a single NMT category block (`Java Heap`, `Thread`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryMetrics {
    pub reserved_kb: u64,
    pub committed_kb: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub malloc: Option<Allocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arena: Option<Allocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mmap: Option<MemoryFootprint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<MemoryFootprint>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub classifier_counts: BTreeMap<String, u64>,
}

impl CategoryMetrics {
    pub fn new(reserved_kb: u64, committed_kb: u64) -> Self {
        Self {
            reserved_kb,
            committed_kb,
            ..Self::default()
        }
    }
}

/// Parsed NMT summary.
///
/// `total` is `None` only for the empty report: the total line is the anchor
/// that proves the text came from NMT at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NativeMemoryReport {
    pub total: Option<MemoryFootprint>,
    pub categories: BTreeMap<String, CategoryMetrics>,
}

impl NativeMemoryReport {
    /// True when neither a total nor any category was extracted.
    pub fn is_empty(&self) -> bool {
        self.total.is_none() && self.categories.is_empty()
    }

    pub fn category(&self, key: &str) -> Option<&CategoryMetrics> {
        self.categories.get(key)
    }
}

/// Converts a human readable category name into its metric key.
///
/// `"Java Heap"` becomes `"java.heap"`.
pub fn category_key(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', ".")
}
