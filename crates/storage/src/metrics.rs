//! Latency measurements for storage operations.
//!
//! Metrics live on a registry owned by [`StorageMetrics`], not on the
//! process-wide default registry; the binary creates one per run and shares
//! it with the backends through an `Arc`.

use prometheus::{HistogramOpts, HistogramTimer, HistogramVec, Registry, TextEncoder};

/// Latency histogram name.
pub const STORAGE_LATENCY: &str = "dumpster_storage_latency_seconds";

/// Bucket boundaries in seconds; object-store uploads of large dumps can run
/// into minutes.
const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.025, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0,
];

#[derive(Debug, Clone)]
pub struct StorageMetrics {
    registry: Registry,
    latency: HistogramVec,
}

impl StorageMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let latency = HistogramVec::new(
            HistogramOpts::new(STORAGE_LATENCY, "Duration of storage backend operations")
                .buckets(LATENCY_BUCKETS.to_vec()),
            &["backend", "operation"],
        )?;

        let registry = Registry::new();
        registry.register(Box::new(latency.clone()))?;

        Ok(Self { registry, latency })
    }

    /// Start timing one operation; the duration is recorded when the returned
    /// guard is dropped.
    pub fn start_timer(&self, backend: &str, operation: &str) -> HistogramTimer {
        self.latency
            .with_label_values(&[backend, operation])
            .start_timer()
    }

    /// Number of completed observations for `backend`/`operation`.
    pub fn sample_count(&self, backend: &str, operation: &str) -> u64 {
        self.latency
            .with_label_values(&[backend, operation])
            .get_sample_count()
    }

    /// Prometheus text exposition of every recorded metric.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_records_on_drop() {
        let metrics = StorageMetrics::new().unwrap();
        {
            let _timer = metrics.start_timer("local", "save");
        }
        assert_eq!(metrics.sample_count("local", "save"), 1);
        assert_eq!(metrics.sample_count("local", "load"), 0);
    }

    #[test]
    fn registries_are_independent() {
        let a = StorageMetrics::new().unwrap();
        let b = StorageMetrics::new().unwrap();
        drop(a.start_timer("s3", "purge"));
        assert_eq!(a.sample_count("s3", "purge"), 1);
        assert_eq!(b.sample_count("s3", "purge"), 0);
    }

    #[test]
    fn render_exposes_labels() {
        let metrics = StorageMetrics::new().unwrap();
        drop(metrics.start_timer("local", "purge"));
        let text = metrics.render().unwrap();
        assert!(text.contains(STORAGE_LATENCY));
        assert!(text.contains("backend=\"local\""));
        assert!(text.contains("operation=\"purge\""));
    }
}
