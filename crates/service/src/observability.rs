use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Encoder, Histogram,
    IntCounter, IntCounterVec, TextEncoder,
};

// Prometheus metrics (default registry)
pub static DOCUMENT_OPERATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "config_store_document_operations_total",
        "Document operations by kind and outcome",
        &["operation", "outcome"]
    )
    .expect("register document_operations_total")
});

pub static MARKER_REFRESH_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "config_store_marker_refresh_total",
        "Freshness marker refresh tasks executed"
    )
    .expect("register marker_refresh_total")
});

pub static MARKER_REFRESH_ERRORS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "config_store_marker_refresh_errors_total",
        "Freshness marker refreshes that failed and were dropped"
    )
    .expect("register marker_refresh_errors_total")
});

pub static MARKER_REFRESH_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "config_store_marker_refresh_duration_seconds",
        "Marker refresh duration in seconds",
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("register marker_refresh_duration")
});

pub fn record_operation(operation: &str, ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    DOCUMENT_OPERATIONS_TOTAL.with_label_values(&[operation, outcome]).inc();
}

/// Render the default registry in the Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_operations_show_up_in_exposition() -> Result<(), prometheus::Error> {
        record_operation("load", true);
        let text = encode_metrics()?;
        assert!(text.contains("config_store_document_operations_total"));
        Ok(())
    }
}
