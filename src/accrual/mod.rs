pub mod aggregator;
pub mod normalizer;
pub mod projector;
pub mod service;

pub use aggregator::{aggregate, aggregate_with_stats, AggregateStats};
pub use normalizer::{normalize, BranchCategories, NormalizedBatch};
pub use projector::project;
pub use service::{AccrualReport, AccrualService};

use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::domain::Batch;
use crate::error::{AppError, Result};

/// Input of a run after validation and dedup.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRun {
    pub batch_count: usize,
    pub input_records: usize,
    pub normalized: NormalizedBatch,
    /// Distinct batch dates, one export each
    pub dates: BTreeSet<NaiveDate>,
}

/// Validate the batches of a run and deduplicate their records.
///
/// Fails with `InvalidArgument` when there are no batches or any batch is
/// empty.
pub fn prepare(batches: Vec<Batch>) -> Result<PreparedRun> {
    if batches.is_empty() {
        return Err(AppError::invalid("no files"));
    }

    if let Some(empty) = batches.iter().find(|b| b.is_empty()) {
        return Err(AppError::invalid(format!(
            "batch for {} has no purchase records",
            empty.purchase_date
        )));
    }

    let batch_count = batches.len();
    let dates = batches.iter().map(|b| b.purchase_date).collect();
    let records: Vec<_> = batches.into_iter().flat_map(|b| b.records).collect();
    let input_records = records.len();

    Ok(PreparedRun {
        batch_count,
        input_records,
        normalized: normalize(records),
        dates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PurchaseRow;
    use rust_decimal_macros::dec;

    fn row(customer: &str) -> PurchaseRow {
        PurchaseRow {
            customer_id: customer.to_string(),
            product_id: "P1".to_string(),
            category_id: "CT1001".to_string(),
            category_name: "BEVERAGE".to_string(),
            branch_id: "BR0001".to_string(),
            purchased_amount: dec!(100.00),
            currency: "THB".to_string(),
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    #[test]
    fn test_no_batches_is_invalid() {
        let err = prepare(Vec::new()).unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
    }

    #[test]
    fn test_empty_batch_is_invalid() {
        let batches = vec![
            Batch::new(date(15), vec![row("C1")]),
            Batch::new(date(16), Vec::new()),
        ];

        let err = prepare(batches).unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(msg) if msg.contains("2025-01-16")));
    }

    #[test]
    fn test_dedup_across_batches_of_same_date() {
        let batches = vec![
            Batch::new(date(15), vec![row("C1"), row("C2")]),
            Batch::new(date(15), vec![row("C1")]),
            Batch::new(date(16), vec![row("C1")]),
        ];

        let run = prepare(batches).unwrap();

        assert_eq!(run.batch_count, 3);
        assert_eq!(run.input_records, 4);
        assert_eq!(run.normalized.records.len(), 3);
        assert_eq!(run.normalized.duplicates, 1);
        assert_eq!(run.dates, BTreeSet::from([date(15), date(16)]));
    }
}
