use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::accrual::AccrualReport;

/// Metrics registry for the application.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Upload requests received
    pub uploads_total: AtomicU64,
    pub upload_errors_total: AtomicU64,

    /// Input volume
    pub batches_total: AtomicU64,
    pub records_ingested_total: AtomicU64,
    pub duplicates_dropped_total: AtomicU64,

    /// Rule evaluation counts
    pub rules_evaluated_total: AtomicU64,
    pub rules_applied_total: AtomicU64,

    /// Output volume
    pub customer_updates_total: AtomicU64,
    pub points_awarded_total: AtomicU64,
    pub exports_written_total: AtomicU64,

    /// Run latency buckets
    pub latency_under_10ms: AtomicU64,
    pub latency_10_100ms: AtomicU64,
    pub latency_100_500ms: AtomicU64,
    pub latency_500ms_1s: AtomicU64,
    pub latency_1_5s: AtomicU64,
    pub latency_over_5s: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        MetricsRegistry::default()
    }

    /// Record an upload request and whether it succeeded.
    pub fn record_upload(&self, success: bool) {
        self.uploads_total.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.upload_errors_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record the counters of a completed run.
    pub fn record_run(&self, report: &AccrualReport) {
        self.batches_total
            .fetch_add(report.batches as u64, Ordering::Relaxed);
        self.records_ingested_total
            .fetch_add(report.input_records as u64, Ordering::Relaxed);
        self.duplicates_dropped_total
            .fetch_add(report.duplicates as u64, Ordering::Relaxed);
        self.rules_evaluated_total
            .fetch_add(report.stats.rules_evaluated, Ordering::Relaxed);
        self.rules_applied_total
            .fetch_add(report.stats.rules_applied, Ordering::Relaxed);
        self.customer_updates_total
            .fetch_add(report.customer_updates as u64, Ordering::Relaxed);
        // negative totals never come out of the calculator
        self.points_awarded_total
            .fetch_add(report.points_awarded.max(0) as u64, Ordering::Relaxed);
    }

    pub fn record_export(&self) {
        self.exports_written_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record run latency.
    pub fn record_latency(&self, start: Instant) {
        let millis = start.elapsed().as_millis() as u64;

        let bucket = match millis {
            0..=9 => &self.latency_under_10ms,
            10..=99 => &self.latency_10_100ms,
            100..=499 => &self.latency_100_500ms,
            500..=999 => &self.latency_500ms_1s,
            1000..=4999 => &self.latency_1_5s,
            _ => &self.latency_over_5s,
        };
        bucket.fetch_add(1, Ordering::Relaxed);
    }

    /// Export metrics in Prometheus format.
    pub fn to_prometheus(&self) -> String {
        format!(
            r#"# HELP pointr_uploads_total Total upload requests
# TYPE pointr_uploads_total counter
pointr_uploads_total {}

# HELP pointr_upload_errors_total Upload requests that failed
# TYPE pointr_upload_errors_total counter
pointr_upload_errors_total {}

# HELP pointr_batches_total Purchase files processed
# TYPE pointr_batches_total counter
pointr_batches_total {}

# HELP pointr_records_ingested_total Purchase records read
# TYPE pointr_records_ingested_total counter
pointr_records_ingested_total {}

# HELP pointr_duplicates_dropped_total Purchase records dropped as duplicates
# TYPE pointr_duplicates_dropped_total counter
pointr_duplicates_dropped_total {}

# HELP pointr_rules_evaluated_total Total rule evaluations
# TYPE pointr_rules_evaluated_total counter
pointr_rules_evaluated_total {}

# HELP pointr_rules_applied_total Rule evaluations that awarded points
# TYPE pointr_rules_applied_total counter
pointr_rules_applied_total {}

# HELP pointr_customer_updates_total Customer updates written
# TYPE pointr_customer_updates_total counter
pointr_customer_updates_total {}

# HELP pointr_points_awarded_total Points awarded
# TYPE pointr_points_awarded_total counter
pointr_points_awarded_total {}

# HELP pointr_exports_written_total Daily export files written
# TYPE pointr_exports_written_total counter
pointr_exports_written_total {}

# HELP pointr_run_latency_bucket Accrual run latency histogram
# TYPE pointr_run_latency_bucket counter
pointr_run_latency_bucket{{le="0.01"}} {}
pointr_run_latency_bucket{{le="0.1"}} {}
pointr_run_latency_bucket{{le="0.5"}} {}
pointr_run_latency_bucket{{le="1"}} {}
pointr_run_latency_bucket{{le="5"}} {}
pointr_run_latency_bucket{{le="+Inf"}} {}
"#,
            self.uploads_total.load(Ordering::Relaxed),
            self.upload_errors_total.load(Ordering::Relaxed),
            self.batches_total.load(Ordering::Relaxed),
            self.records_ingested_total.load(Ordering::Relaxed),
            self.duplicates_dropped_total.load(Ordering::Relaxed),
            self.rules_evaluated_total.load(Ordering::Relaxed),
            self.rules_applied_total.load(Ordering::Relaxed),
            self.customer_updates_total.load(Ordering::Relaxed),
            self.points_awarded_total.load(Ordering::Relaxed),
            self.exports_written_total.load(Ordering::Relaxed),
            self.latency_under_10ms.load(Ordering::Relaxed),
            self.latency_10_100ms.load(Ordering::Relaxed),
            self.latency_100_500ms.load(Ordering::Relaxed),
            self.latency_500ms_1s.load(Ordering::Relaxed),
            self.latency_1_5s.load(Ordering::Relaxed),
            self.latency_over_5s.load(Ordering::Relaxed),
        )
    }
}

/// Guard for timing operations.
pub struct TimingGuard<'a> {
    registry: &'a MetricsRegistry,
    start: Instant,
}

impl<'a> TimingGuard<'a> {
    pub fn new(registry: &'a MetricsRegistry) -> Self {
        TimingGuard {
            registry,
            start: Instant::now(),
        }
    }
}

impl<'a> Drop for TimingGuard<'a> {
    fn drop(&mut self) {
        self.registry.record_latency(self.start);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accrual::AggregateStats;

    fn report() -> AccrualReport {
        AccrualReport {
            run_id: "run-1".to_string(),
            batches: 2,
            input_records: 5,
            duplicates: 1,
            customer_updates: 3,
            points_awarded: 40,
            stats: AggregateStats {
                rules_evaluated: 32,
                rules_applied: 4,
            },
            exports: Vec::new(),
        }
    }

    #[test]
    fn test_record_upload() {
        let metrics = MetricsRegistry::new();

        metrics.record_upload(true);
        metrics.record_upload(false);

        assert_eq!(metrics.uploads_total.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.upload_errors_total.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_record_run() {
        let metrics = MetricsRegistry::new();

        metrics.record_run(&report());
        metrics.record_run(&report());

        assert_eq!(metrics.batches_total.load(Ordering::Relaxed), 4);
        assert_eq!(metrics.duplicates_dropped_total.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.rules_applied_total.load(Ordering::Relaxed), 8);
        assert_eq!(metrics.points_awarded_total.load(Ordering::Relaxed), 80);
    }

    #[test]
    fn test_timing_guard_records_latency() {
        let metrics = MetricsRegistry::new();

        {
            let _guard = TimingGuard::new(&metrics);
        }

        let recorded = metrics.latency_under_10ms.load(Ordering::Relaxed)
            + metrics.latency_10_100ms.load(Ordering::Relaxed)
            + metrics.latency_100_500ms.load(Ordering::Relaxed)
            + metrics.latency_500ms_1s.load(Ordering::Relaxed)
            + metrics.latency_1_5s.load(Ordering::Relaxed)
            + metrics.latency_over_5s.load(Ordering::Relaxed);
        assert_eq!(recorded, 1);
    }

    #[test]
    fn test_prometheus_format() {
        let metrics = MetricsRegistry::new();
        metrics.record_upload(true);
        metrics.record_export();
        metrics.record_export();

        let output = metrics.to_prometheus();

        assert!(output.contains("pointr_uploads_total 1"));
        assert!(output.contains("pointr_exports_written_total 2"));
        assert!(output.contains("pointr_run_latency_bucket{le=\"+Inf\"} 0"));
    }
}
