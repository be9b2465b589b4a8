use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::purchase::{CustomerId, PurchaseRecord};
use crate::error::{AppError, Result};

/// A purchase already counted against a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub product_id: String,
    pub branch_id: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub purchase_date: NaiveDate,
}

impl HistoryRecord {
    /// Whether `record` is the same purchase, compared on date, branch,
    /// product and numeric amount.
    pub fn same_purchase(&self, record: &PurchaseRecord) -> bool {
        self.purchase_date == record.purchase_date
            && self.branch_id == record.branch_id
            && self.product_id == record.product_id
            && self.amount == record.purchased_amount
    }
}

impl From<&PurchaseRecord> for HistoryRecord {
    fn from(record: &PurchaseRecord) -> Self {
        HistoryRecord {
            product_id: record.product_id.clone(),
            branch_id: record.branch_id.clone(),
            amount: record.purchased_amount,
            purchase_date: record.purchase_date,
        }
    }
}

/// Persisted customer state as read at the start of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: CustomerId,
    pub points: i64,
    pub last_purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub records: Vec<HistoryRecord>,
    #[serde(default)]
    pub points_by_date: BTreeMap<NaiveDate, i64>,
}

impl Customer {
    /// Empty customer, as created by the first upsert.
    pub fn new(customer_id: CustomerId) -> Self {
        Customer {
            customer_id,
            points: 0,
            last_purchase_date: None,
            records: Vec::new(),
            points_by_date: BTreeMap::new(),
        }
    }

    /// Merge an update: totals and per-date points are added, records are
    /// appended and the last purchase date is overwritten.
    ///
    /// Fails without modifying the customer if any sum leaves `i64`.
    pub fn apply(&mut self, update: &CustomerUpdate) -> Result<()> {
        let overflow = || {
            AppError::internal(format!(
                "points overflow for customer {}",
                self.customer_id
            ))
        };

        let points = self
            .points
            .checked_add(update.points_to_add)
            .ok_or_else(overflow)?;

        let mut by_date = Vec::with_capacity(update.points_by_date.len());
        for (date, delta) in &update.points_by_date {
            let current = self.points_by_date.get(date).copied().unwrap_or(0);
            by_date.push((*date, current.checked_add(*delta).ok_or_else(overflow)?));
        }

        self.points = points;
        self.points_by_date.extend(by_date);
        self.records.extend(update.records.iter().cloned());
        self.last_purchase_date = Some(update.last_purchase_date);
        Ok(())
    }
}

/// Incremental change for one customer produced by a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerUpdate {
    pub customer_id: CustomerId,
    pub points_to_add: i64,
    pub last_purchase_date: NaiveDate,
    pub records: Vec<HistoryRecord>,
    pub points_by_date: BTreeMap<NaiveDate, i64>,
}

impl CustomerUpdate {
    /// Start an update from the first applied purchase.
    pub fn first(record: &PurchaseRecord, points: i64) -> Self {
        CustomerUpdate {
            customer_id: record.customer_id.clone(),
            points_to_add: points,
            last_purchase_date: record.purchase_date,
            records: vec![HistoryRecord::from(record)],
            points_by_date: BTreeMap::from([(record.purchase_date, points)]),
        }
    }

    /// Fold another applied purchase into the update.
    ///
    /// Returns `false` and leaves the update untouched when the total or the
    /// per-date delta would overflow.
    #[must_use]
    pub fn add(&mut self, record: &PurchaseRecord, points: i64) -> bool {
        let date = record.purchase_date;
        let day = self.points_by_date.get(&date).copied().unwrap_or(0);

        let (Some(total), Some(day)) = (
            self.points_to_add.checked_add(points),
            day.checked_add(points),
        ) else {
            return false;
        };

        self.points_to_add = total;
        self.points_by_date.insert(date, day);
        self.records.push(HistoryRecord::from(record));
        if date > self.last_purchase_date {
            self.last_purchase_date = date;
        }
        true
    }

    /// Sum of the per-date deltas; always equals `points_to_add`.
    pub fn points_by_date_total(&self) -> i64 {
        self.points_by_date.values().sum()
    }
}
