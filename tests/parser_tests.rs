//! Integration tests for report parsing and flattening.
//!
//! These tests verify `parse` and `flatten` against complete reports as
//! produced by different JDK versions, and against broken input.

use herakles_nmt_exporter::nmt::{Allocation, MemoryFootprint};
use herakles_nmt_exporter::{flatten, parse, parse_with_diagnostics, ParseDiagnostic};

const JDK8_REPORT: &str = include_str!("data/nmt_summary_jdk8.txt");
const JDK17_REPORT: &str = include_str!("data/nmt_summary_jdk17.txt");

/// Sample from the collector documentation: two categories, one sub-line each.
const SMALL_REPORT: &str = "Total: reserved=2048KB, committed=1024KB

-                Java Heap (reserved=1024KB, committed=512KB)
                            (mmap: reserved=1024KB, committed=512KB)

-                   Thread (reserved=512KB, committed=256KB)
                            (thread #4)
";

#[test]
fn test_small_report_end_to_end() {
    let report = parse(SMALL_REPORT);

    assert_eq!(report.total, Some(MemoryFootprint::new(2048, 1024)));
    assert_eq!(report.categories.len(), 2);

    let heap = report.category("java.heap").expect("java.heap not found");
    assert_eq!(heap.reserved_kb, 1024);
    assert_eq!(heap.committed_kb, 512);
    assert_eq!(heap.mmap, Some(MemoryFootprint::new(1024, 512)));
    assert!(heap.malloc.is_none());
    assert!(heap.classifier_counts.is_empty());

    let thread = report.category("thread").expect("thread not found");
    assert_eq!(thread.reserved_kb, 512);
    assert_eq!(thread.committed_kb, 256);
    assert_eq!(thread.classifier_counts.get("thread"), Some(&4));
    assert!(thread.mmap.is_none());
    assert!(thread.stack.is_none());

    let metrics = flatten(&report);
    let names: Vec<&str> = metrics.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        [
            "nmt.java.heap.committedKB",
            "nmt.java.heap.mmapCommittedKB",
            "nmt.java.heap.mmapReservedKB",
            "nmt.java.heap.reservedKB",
            "nmt.thread.committedKB",
            "nmt.thread.reservedKB",
            "nmt.thread.thread",
            "nmt.total.committedKB",
            "nmt.total.reservedKB",
        ]
    );
    assert_eq!(metrics["nmt.total.reservedKB"], 2048);
    assert_eq!(metrics["nmt.java.heap.mmapReservedKB"], 1024);
    assert_eq!(metrics["nmt.thread.thread"], 4);
}

#[test]
fn test_jdk8_report() {
    let outcome = parse_with_diagnostics(JDK8_REPORT);
    assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);

    let report = outcome.report;
    assert_eq!(report.total, Some(MemoryFootprint::new(1493345, 116873)));
    assert_eq!(report.categories.len(), 10);

    let class = report.category("class").expect("class not found");
    assert_eq!(class.classifier_counts.get("classes"), Some(&2103));
    assert_eq!(
        class.malloc,
        Some(Allocation {
            kb: 1179,
            calls: Some(1650)
        })
    );
    assert_eq!(class.mmap, Some(MemoryFootprint::new(1064960, 13312)));

    let thread = report.category("thread").expect("thread not found");
    assert_eq!(thread.stack, Some(MemoryFootprint::new(21504, 21504)));
    assert_eq!(
        thread.arena,
        Some(Allocation {
            kb: 74,
            calls: Some(40)
        })
    );

    let nmt = report
        .category("native.memory.tracking")
        .expect("native.memory.tracking not found");
    assert_eq!(nmt.malloc.map(|m| m.kb), Some(115));

    let chunk = report.category("arena.chunk").expect("arena.chunk not found");
    assert_eq!(
        chunk.malloc,
        Some(Allocation {
            kb: 4116,
            calls: None
        })
    );

    let metrics = flatten(&report);
    assert_eq!(metrics["nmt.arena.chunk.mallocKB"], 4116);
    assert!(!metrics.contains_key("nmt.arena.chunk.mallocCalls"));
    assert_eq!(metrics["nmt.thread.arenaCalls"], 40);
    assert_eq!(metrics["nmt.class.classes"], 2103);
}

#[test]
fn test_jdk17_report_skips_new_line_shapes() {
    let outcome = parse_with_diagnostics(JDK17_REPORT);
    assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);

    let report = outcome.report;
    assert_eq!(report.total, Some(MemoryFootprint::new(1499843, 124195)));
    assert_eq!(report.categories.len(), 4);

    let class = report.category("class").expect("class not found");
    // "(  instance classes #1009, array classes #140)" and the metadata
    // sub-block are not known shapes and must not leak into the counts.
    assert_eq!(class.classifier_counts.len(), 1);
    assert_eq!(class.classifier_counts.get("classes"), Some(&1149));
    assert_eq!(class.mmap, Some(MemoryFootprint::new(1048832, 704)));

    let thread = report.category("thread").expect("thread not found");
    assert_eq!(thread.classifier_counts.get("thread"), Some(&17));
    assert_eq!(thread.stack, Some(MemoryFootprint::new(17432, 976)));
}

#[test]
fn test_parse_is_idempotent() {
    assert_eq!(parse(JDK8_REPORT), parse(JDK8_REPORT));
    assert_eq!(
        parse_with_diagnostics(JDK17_REPORT),
        parse_with_diagnostics(JDK17_REPORT)
    );
}

#[test]
fn test_missing_total_yields_empty_report() {
    let raw = JDK8_REPORT.replace("Total:", "Totals:");
    let outcome = parse_with_diagnostics(&raw);

    assert!(outcome.report.is_empty());
    assert!(outcome.report.categories.is_empty());
    assert_eq!(outcome.diagnostics, vec![ParseDiagnostic::MissingTotal]);
    assert!(flatten(&outcome.report).is_empty());
}

#[test]
fn test_garbage_input() {
    for raw in ["", "\n\n\n", "jcmd: command not found", "-----", "12345:\nAttachNotSupportedException"] {
        let report = parse(raw);
        assert!(report.is_empty(), "input {:?} produced {:?}", raw, report);
    }
}

#[test]
fn test_header_only_category() {
    let raw = "Total: reserved=10KB, committed=5KB\n\n-   Internal (reserved=10KB, committed=5KB)\n";
    let report = parse(raw);

    let internal = report.category("internal").expect("internal not found");
    assert_eq!(internal.reserved_kb, 10);
    assert_eq!(internal.committed_kb, 5);
    assert!(internal.malloc.is_none());
    assert!(internal.arena.is_none());
    assert!(internal.mmap.is_none());
    assert!(internal.stack.is_none());
    assert!(internal.classifier_counts.is_empty());

    assert_eq!(flatten(&report).len(), 4);
}

#[test]
fn test_malloc_without_call_count() {
    let raw = "Total: reserved=2048KB, committed=2048KB\n\n\
               -   Internal (reserved=2048KB, committed=2048KB)\n\
               \x20   (malloc=1024KB)\n";
    let report = parse(raw);
    let malloc = report
        .category("internal")
        .and_then(|c| c.malloc)
        .expect("malloc not parsed");

    assert_eq!(malloc.kb, 1024);
    assert_eq!(malloc.calls, None);
}

#[test]
fn test_duplicate_category_last_write_wins() {
    let raw = "Total: reserved=30KB, committed=30KB

-   Thread (reserved=10KB, committed=10KB)
    (thread #1)

-   Thread (reserved=20KB, committed=20KB)
    (thread #2)
";
    let outcome = parse_with_diagnostics(raw);

    assert_eq!(outcome.report.categories.len(), 1);
    let thread = outcome.report.category("thread").unwrap();
    assert_eq!(thread.reserved_kb, 20);
    assert_eq!(thread.classifier_counts.get("thread"), Some(&2));
    assert_eq!(
        outcome.diagnostics,
        vec![ParseDiagnostic::DuplicateCategory {
            key: "thread".to_string()
        }]
    );
}

#[test]
fn test_overflow_keeps_earlier_categories() {
    let raw = "Total: reserved=30KB, committed=30KB

-   Code (reserved=10KB, committed=10KB)
    (malloc=1KB #1)

-   GC (reserved=20KB, committed=20KB)
    (malloc=184467440737095516150KB #1)

-   Symbol (reserved=5KB, committed=5KB)
";
    let outcome = parse_with_diagnostics(raw);

    assert_eq!(outcome.report.total, Some(MemoryFootprint::new(30, 30)));
    assert!(outcome.report.category("code").is_some());
    // The failing block and everything after it are dropped.
    assert!(outcome.report.category("gc").is_none());
    assert!(outcome.report.category("symbol").is_none());
    assert!(matches!(
        outcome.diagnostics.as_slice(),
        [ParseDiagnostic::InvalidNumber { field: "malloc", .. }]
    ));
}

#[test]
fn test_overflowing_total_yields_empty_report() {
    let raw = "Total: reserved=99999999999999999999999KB, committed=1KB\n\n-  Code (reserved=1KB, committed=1KB)\n";
    let outcome = parse_with_diagnostics(raw);
    assert!(outcome.report.is_empty());
    assert_eq!(outcome.diagnostics.len(), 1);
}

#[test]
fn test_every_present_field_is_flattened() {
    let report = parse(JDK8_REPORT);
    let metrics = flatten(&report);

    let mut expected = 2; // total reserved + committed
    for category in report.categories.values() {
        expected += 2;
        expected += category.malloc.map_or(0, |m| 1 + usize::from(m.calls.is_some()));
        expected += category.arena.map_or(0, |a| 1 + usize::from(a.calls.is_some()));
        expected += category.mmap.map_or(0, |_| 2);
        expected += category.stack.map_or(0, |_| 2);
        expected += category.classifier_counts.len();
    }

    assert_eq!(metrics.len(), expected);
}
