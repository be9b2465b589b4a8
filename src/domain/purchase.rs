use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique customer identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub String);

impl CustomerId {
    pub fn new(id: impl Into<String>) -> Self {
        CustomerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One CSV row as uploaded, before a purchase date is assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRow {
    pub customer_id: String,
    pub product_id: String,
    pub category_id: String,
    pub category_name: String,
    pub branch_id: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub purchased_amount: Decimal,
    pub currency: String,
}

/// One line-item purchase with the date of the batch it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseRecord {
    pub customer_id: CustomerId,
    pub product_id: String,
    pub category_id: String,
    pub category_name: String,
    pub branch_id: String,
    pub purchased_amount: Decimal,
    pub currency: String,
    pub purchase_date: NaiveDate,
}

impl PurchaseRecord {
    /// Attach a batch date to an uploaded row.
    pub fn from_row(row: PurchaseRow, purchase_date: NaiveDate) -> Self {
        PurchaseRecord {
            customer_id: CustomerId::new(row.customer_id),
            product_id: row.product_id,
            category_id: row.category_id,
            category_name: row.category_name,
            branch_id: row.branch_id,
            purchased_amount: row.purchased_amount,
            currency: row.currency,
            purchase_date,
        }
    }

    /// Identity used for duplicate detection.
    ///
    /// Category and currency are deliberately not part of it.
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey {
            customer_id: self.customer_id.clone(),
            product_id: self.product_id.clone(),
            branch_id: self.branch_id.clone(),
            amount: canonical_amount(self.purchased_amount),
            purchase_date: self.purchase_date,
        }
    }
}

/// Composite purchase identity: (customer, product, branch, amount, date).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub customer_id: CustomerId,
    pub product_id: String,
    pub branch_id: String,
    pub amount: String,
    pub purchase_date: NaiveDate,
}

/// Canonical string for an amount; `100.00` and `100` render the same.
pub fn canonical_amount(amount: Decimal) -> String {
    amount.normalize().to_string()
}

/// All records of one uploaded file, sharing one purchase date.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub purchase_date: NaiveDate,
    pub records: Vec<PurchaseRecord>,
}

impl Batch {
    pub fn new(purchase_date: NaiveDate, rows: Vec<PurchaseRow>) -> Self {
        let records = rows
            .into_iter()
            .map(|row| PurchaseRecord::from_row(row, purchase_date))
            .collect();

        Batch {
            purchase_date,
            records,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
