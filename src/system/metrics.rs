//! Metrics collection and monitoring for Docvault
//!
//! Prometheus metrics registered once on a crate-local registry and served
//! at `/metrics`.

use crate::core::Result;
use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Histogram, IntCounter, IntGauge, Registry,
};
use std::time::Instant;

/// Global metrics registry
static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// Upload pipeline metrics
pub struct IngestMetrics {
    /// Uploads recorded as document files
    pub files_ingested: IntCounter,
    /// Uploads that failed during processing
    pub files_failed: IntCounter,
    /// Bytes of accepted uploads
    pub bytes_ingested: IntCounter,
    /// Uploads waiting for the background worker
    pub queue_depth: IntGauge,
    /// Time spent inspecting and storing an upload
    pub duration: Histogram,
}

/// Request level metrics
pub struct ApiMetrics {
    /// File downloads served
    pub downloads: IntCounter,
    /// Document files deleted
    pub files_deleted: IntCounter,
    /// Documents created
    pub documents_created: IntCounter,
    /// Document types created
    pub document_types_created: IntCounter,
    /// Requests rejected by a permission check (403 or hidden 404)
    pub access_denied: IntCounter,
}

/// Centralized metrics collection for all system components
pub struct Metrics {
    /// Upload pipeline
    pub ingest: IngestMetrics,
    /// REST API
    pub api: ApiMetrics,
}

impl Metrics {
    /// Create new metrics instance
    pub fn new() -> Result<Self> {
        Ok(Self {
            ingest: IngestMetrics::new()?,
            api: ApiMetrics::new()?,
        })
    }

    /// Get the global metrics instance
    pub fn global() -> &'static Metrics {
        static INSTANCE: Lazy<Metrics> = Lazy::new(|| {
            Metrics::new().expect("Failed to initialize metrics")
        });
        &INSTANCE
    }
}

impl IngestMetrics {
    fn new() -> Result<Self> {
        Ok(Self {
            files_ingested: register_int_counter_with_registry!(
                "dv_files_ingested_total",
                "Total number of uploads recorded as document files",
                REGISTRY
            )?,
            files_failed: register_int_counter_with_registry!(
                "dv_files_failed_total",
                "Total number of uploads that failed processing",
                REGISTRY
            )?,
            bytes_ingested: register_int_counter_with_registry!(
                "dv_bytes_ingested_total",
                "Total bytes of accepted uploads",
                REGISTRY
            )?,
            queue_depth: register_int_gauge_with_registry!(
                "dv_ingest_queue_depth",
                "Uploads waiting for the background worker",
                REGISTRY
            )?,
            duration: register_histogram_with_registry!(
                "dv_ingest_duration_seconds",
                "Duration of upload processing in seconds",
                vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0],
                REGISTRY
            )?,
        })
    }
}

impl ApiMetrics {
    fn new() -> Result<Self> {
        Ok(Self {
            downloads: register_int_counter_with_registry!(
                "dv_downloads_total",
                "Total number of file downloads served",
                REGISTRY
            )?,
            files_deleted: register_int_counter_with_registry!(
                "dv_files_deleted_total",
                "Total number of document files deleted",
                REGISTRY
            )?,
            documents_created: register_int_counter_with_registry!(
                "dv_documents_created_total",
                "Total number of documents created",
                REGISTRY
            )?,
            document_types_created: register_int_counter_with_registry!(
                "dv_document_types_created_total",
                "Total number of document types created",
                REGISTRY
            )?,
            access_denied: register_int_counter_with_registry!(
                "dv_access_denied_total",
                "Total number of requests rejected by a permission check",
                REGISTRY
            )?,
        })
    }
}

/// Timer for measuring operation duration with automatic histogram recording
pub struct Timer {
    /// Start time of the operation
    start: Instant,
    /// Histogram to record the duration when finished
    histogram: Histogram,
}

impl Timer {
    /// Start a new timer
    pub fn start(histogram: Histogram) -> Self {
        Self {
            start: Instant::now(),
            histogram,
        }
    }

    /// Record the elapsed time and consume the timer
    pub fn finish(self) {
        let duration = self.start.elapsed();
        self.histogram.observe(duration.as_secs_f64());
    }
}

/// Time an expression and record its duration on a histogram
#[macro_export]
macro_rules! time_operation {
    ($metric:expr, $body:expr) => {{
        let timer = $crate::system::metrics::Timer::start($metric.clone());
        let result = $body;
        timer.finish();
        result
    }};
}

/// Register all metrics
///
/// Called once during startup so `/metrics` lists every series from the
/// first scrape.
pub fn init_registry() {
    let _ = Metrics::global();
}

/// Get the Prometheus registry
pub fn registry() -> &'static Registry {
    &REGISTRY
}

/// Collect and return all metrics as a Prometheus-formatted string
pub fn collect_metrics() -> String {
    let encoder = prometheus::TextEncoder::new();
    let metric_families = registry().gather();
    encoder.encode_to_string(&metric_families).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exposition_lists_series() {
        init_registry();
        Metrics::global().api.downloads.inc();

        let text = collect_metrics();
        assert!(text.contains("dv_downloads_total"));
        assert!(text.contains("dv_ingest_duration_seconds"));
    }

    #[test]
    fn test_time_operation_records() {
        let metrics = Metrics::global();
        let before = metrics.ingest.duration.get_sample_count();
        let value = crate::time_operation!(metrics.ingest.duration, { 2 + 2 });
        assert_eq!(value, 4);
        assert!(metrics.ingest.duration.get_sample_count() > before);
    }
}
