//! Flattens a parsed report into `dotted name -> value` pairs.

use std::collections::BTreeMap;
use tracing::debug;

use super::report::{Allocation, CategoryMetrics, MemoryFootprint, NativeMemoryReport};

/// Prefix shared by every metric name.
pub const METRIC_PREFIX: &str = "nmt";

/// Key used for the report-wide total.
pub const TOTAL_KEY: &str = "total";

/// Flat metric names mapped to their values.
pub type MetricMap = BTreeMap<String, u64>;

/// Flattens `report` into metric entries.
///
/// A report without categories yields no entries at all, even when the total
/// was parsed: callers treat that as "no metrics this cycle".
pub fn flatten(report: &NativeMemoryReport) -> MetricMap {
    let mut metrics = MetricMap::new();

    if report.categories.is_empty() {
        return metrics;
    }

    if let Some(total) = report.total {
        push_footprint(&mut metrics, TOTAL_KEY, "", total);
    }

    for (category, values) in &report.categories {
        push_category(&mut metrics, category, values);
        debug!("Added metrics for category : {}", category);
    }

    metrics
}

fn push_category(metrics: &mut MetricMap, category: &str, values: &CategoryMetrics) {
    push_footprint(
        metrics,
        category,
        "",
        MemoryFootprint::new(values.reserved_kb, values.committed_kb),
    );

    if let Some(malloc) = values.malloc {
        push_allocation(metrics, category, "malloc", malloc);
    }
    if let Some(arena) = values.arena {
        push_allocation(metrics, category, "arena", arena);
    }
    if let Some(mmap) = values.mmap {
        push_footprint(metrics, category, "mmap", mmap);
    }
    if let Some(stack) = values.stack {
        push_footprint(metrics, category, "stack", stack);
    }

    // Fixed fields are already in place; a classifier sharing a name with
    // one of them is dropped instead of overwriting it.
    for (name, count) in &values.classifier_counts {
        let key = metric_name(category, name);
        if metrics.contains_key(&key) {
            debug!("Classifier {} collides with a fixed field, skipping", key);
            continue;
        }
        metrics.insert(key, *count);
    }
}

fn push_footprint(metrics: &mut MetricMap, category: &str, kind: &str, footprint: MemoryFootprint) {
    let (reserved, committed) = if kind.is_empty() {
        ("reservedKB".to_string(), "committedKB".to_string())
    } else {
        (format!("{kind}ReservedKB"), format!("{kind}CommittedKB"))
    };
    metrics.insert(metric_name(category, &reserved), footprint.reserved_kb);
    metrics.insert(metric_name(category, &committed), footprint.committed_kb);
}

fn push_allocation(metrics: &mut MetricMap, category: &str, kind: &str, allocation: Allocation) {
    metrics.insert(metric_name(category, &format!("{kind}KB")), allocation.kb);
    if let Some(calls) = allocation.calls {
        metrics.insert(metric_name(category, &format!("{kind}Calls")), calls);
    }
}

/// Builds `nmt.<category>.<field>`.
pub fn metric_name(category: &str, field: &str) -> String {
    format!("{METRIC_PREFIX}.{category}.{field}")
}
