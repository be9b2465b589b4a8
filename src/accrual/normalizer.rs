use ahash::AHashSet;
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{CustomerId, PurchaseRecord};

/// Branch id to the distinct category ids seen for it.
pub type BranchCategories = BTreeMap<String, BTreeSet<String>>;

/// Deduplicated records of a run plus the indexes derived from them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedBatch {
    /// Records in input order with exact dedup-key duplicates removed
    pub records: Vec<PurchaseRecord>,

    /// Distinct customers present in `records`
    pub customer_ids: BTreeSet<CustomerId>,

    /// Categories per branch, used to scope the rule lookup
    pub branch_categories: BranchCategories,

    /// Number of input records dropped as duplicates
    pub duplicates: usize,
}

impl NormalizedBatch {
    /// Customer ids as a list for the customer source.
    pub fn customer_id_list(&self) -> Vec<String> {
        self.customer_ids
            .iter()
            .map(|id| id.as_str().to_string())
            .collect()
    }
}

/// Remove duplicate purchases and index what remains.
///
/// The first occurrence of each dedup key survives.
pub fn normalize(records: Vec<PurchaseRecord>) -> NormalizedBatch {
    let total = records.len();
    let mut seen = AHashSet::with_capacity(total);
    let mut unique = Vec::with_capacity(total);

    for record in records {
        if seen.insert(record.dedup_key()) {
            unique.push(record);
        }
    }

    let mut customer_ids = BTreeSet::new();
    let mut branch_categories = BranchCategories::new();

    for record in &unique {
        customer_ids.insert(record.customer_id.clone());
        branch_categories
            .entry(record.branch_id.clone())
            .or_default()
            .insert(record.category_id.clone());
    }

    NormalizedBatch {
        duplicates: total - unique.len(),
        records: unique,
        customer_ids,
        branch_categories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn record(customer: &str, product: &str, branch: &str, category: &str, amount: Decimal, day: u32) -> PurchaseRecord {
        PurchaseRecord {
            customer_id: CustomerId::new(customer),
            product_id: product.to_string(),
            category_id: category.to_string(),
            category_name: String::new(),
            branch_id: branch.to_string(),
            purchased_amount: amount,
            currency: "THB".to_string(),
            purchase_date: NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
        }
    }

    #[test]
    fn test_exact_duplicates_removed() {
        let records = vec![
            record("C1", "P1", "BR1", "CT1", dec!(100.00), 15),
            record("C1", "P1", "BR1", "CT1", dec!(100.00), 15),
            record("C2", "P1", "BR1", "CT1", dec!(100.00), 15),
        ];

        let batch = normalize(records);

        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.duplicates, 1);
    }

    #[test]
    fn test_category_and_currency_do_not_distinguish() {
        let first = record("C1", "P1", "BR1", "CT1", dec!(100.00), 15);
        let mut second = record("C1", "P1", "BR1", "CT2", dec!(100.0), 15);
        second.currency = "USD".to_string();

        let batch = normalize(vec![first.clone(), second]);

        assert_eq!(batch.records, vec![first]);
        assert_eq!(batch.branch_categories["BR1"].len(), 1);
    }

    #[test]
    fn test_same_purchase_on_other_dates_kept() {
        let batch = normalize(vec![
            record("C1", "P1", "BR1", "CT1", dec!(100.00), 15),
            record("C1", "P1", "BR1", "CT1", dec!(100.00), 16),
        ]);

        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.duplicates, 0);
    }

    #[test]
    fn test_indexes() {
        let batch = normalize(vec![
            record("C1", "P1", "BR1", "CT1", dec!(10), 15),
            record("C2", "P2", "BR1", "CT2", dec!(10), 15),
            record("C1", "P3", "BR1", "CT1", dec!(10), 15),
            record("C3", "P1", "BR2", "CT1", dec!(10), 15),
        ]);

        assert_eq!(batch.customer_id_list(), vec!["C1", "C2", "C3"]);
        assert_eq!(batch.branch_categories.len(), 2);
        assert_eq!(
            batch.branch_categories["BR1"],
            BTreeSet::from(["CT1".to_string(), "CT2".to_string()])
        );
        assert_eq!(
            batch.branch_categories["BR2"],
            BTreeSet::from(["CT1".to_string()])
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let records = vec![
            record("C1", "P1", "BR1", "CT1", dec!(100.00), 15),
            record("C1", "P1", "BR1", "CT9", dec!(100), 15),
            record("C2", "P1", "BR1", "CT1", dec!(50), 15),
            record("C2", "P1", "BR1", "CT1", dec!(50), 16),
            record("C2", "P1", "BR1", "CT1", dec!(50), 16),
        ];

        let once = normalize(records);
        let twice = normalize(once.records.clone());

        assert_eq!(once.records, twice.records);
        assert_eq!(once.customer_ids, twice.customer_ids);
        assert_eq!(once.branch_categories, twice.branch_categories);
        assert_eq!(twice.duplicates, 0);
    }

    #[test]
    fn test_empty_input() {
        let batch = normalize(Vec::new());
        assert!(batch.records.is_empty());
        assert!(batch.branch_categories.is_empty());
    }
}
