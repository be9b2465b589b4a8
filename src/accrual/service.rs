use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{Batch, DailyExport};
use crate::error::Result;
use crate::export::ExportSink;
use crate::observability::{MetricsRegistry, TimingGuard};
use crate::storage::Storage;

use super::{aggregate_with_stats, prepare, project, AggregateStats};

/// Outcome of one accrual run.
#[derive(Debug, Clone, PartialEq)]
pub struct AccrualReport {
    pub run_id: String,
    pub batches: usize,
    pub input_records: usize,
    pub duplicates: usize,
    pub customer_updates: usize,
    pub points_awarded: i64,
    pub stats: AggregateStats,
    /// One export per distinct batch date, ascending
    pub exports: Vec<DailyExport>,
}

/// Runs the accrual pipeline against storage and an export sink.
///
/// Runs are serialized: the history read by one run always includes every
/// update written by the runs before it.
pub struct AccrualService {
    storage: Arc<dyn Storage>,
    exporter: Arc<dyn ExportSink>,
    metrics: Arc<MetricsRegistry>,
    run_lock: Mutex<()>,
}

impl AccrualService {
    pub fn new(
        storage: Arc<dyn Storage>,
        exporter: Arc<dyn ExportSink>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            storage,
            exporter,
            metrics,
            run_lock: Mutex::new(()),
        }
    }

    /// Accrue points for the given batches and export cumulative totals for
    /// each batch date.
    ///
    /// Stops at the first error. Updates are written in a single call, and
    /// only when at least one rule applied. Concurrent calls wait for the
    /// running one to finish.
    pub async fn execute(&self, batches: Vec<Batch>) -> Result<AccrualReport> {
        let run = prepare(batches)?;

        let _running = self.run_lock.lock().await;
        let _timer = TimingGuard::new(&self.metrics);
        let run_id = Uuid::new_v4().to_string();
        let normalized = &run.normalized;

        info!(
            run_id = %run_id,
            batches = run.batch_count,
            records = normalized.records.len(),
            duplicates = normalized.duplicates,
            "Accrual run started"
        );

        let rules = self
            .storage
            .get_active_rules(&normalized.branch_categories)
            .await?;
        let customers = self
            .storage
            .get_customers(&normalized.customer_id_list())
            .await?;

        debug!(
            run_id = %run_id,
            rules = rules.len(),
            customers = customers.len(),
            "Loaded rules and customers"
        );

        let (updates, stats) = aggregate_with_stats(&rules, &normalized.records, &customers);
        let points_awarded: i64 = updates.iter().map(|u| u.points_to_add).sum();

        if updates.is_empty() {
            info!(run_id = %run_id, "No rule applied, nothing to write");
        } else {
            self.storage.apply_updates(&updates).await?;
        }

        let all_customers = self.storage.get_customers(&[]).await?;

        let mut exports = Vec::with_capacity(run.dates.len());
        for date in &run.dates {
            let export = DailyExport {
                date: *date,
                rows: project(&all_customers, *date)?,
            };

            self.exporter.write(&export).await?;
            self.metrics.record_export();

            info!(run_id = %run_id, date = %date, rows = export.rows.len(), "Export produced");
            exports.push(export);
        }

        let report = AccrualReport {
            run_id,
            batches: run.batch_count,
            input_records: run.input_records,
            duplicates: normalized.duplicates,
            customer_updates: updates.len(),
            points_awarded,
            stats,
            exports,
        };
        self.metrics.record_run(&report);

        info!(
            run_id = %report.run_id,
            rules = rules.len(),
            updates = report.customer_updates,
            points = report.points_awarded,
            "Accrual run completed"
        );

        Ok(report)
    }
}
