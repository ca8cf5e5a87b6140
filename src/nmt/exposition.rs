//! Renders a flat metric map in the Prometheus text exposition format.
//!
//! This only formats a snapshot; nothing is served or kept between calls.

use prometheus::{Encoder, IntGauge, Registry, TextEncoder};
use tracing::warn;

use super::adapter::MetricMap;

/// Turns `nmt.java.heap.reservedKB` into `nmt_java_heap_reservedKB`.
pub fn prometheus_name(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == ':' { c } else { '_' })
        .collect();
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Encodes every entry of `metrics` as an integer gauge.
pub fn render_prometheus(metrics: &MetricMap) -> Result<String, prometheus::Error> {
    let registry = Registry::new();

    for (name, value) in metrics {
        let gauge = IntGauge::new(prometheus_name(name), format!("Native memory tracking {name}"))?;
        gauge.set(i64::try_from(*value).unwrap_or(i64::MAX));
        if let Err(e) = registry.register(Box::new(gauge)) {
            warn!("Skipping metric {}: {}", name, e);
        }
    }

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
