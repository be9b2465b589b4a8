pub mod calculator;
pub mod catalog;
pub mod matcher;

pub use calculator::calculate;
pub use catalog::{load_catalog, parse_catalog, CatalogError};
pub use matcher::{is_recorded, matches};

use crate::domain::{HistoryRecord, PurchaseRecord, Rule};

/// Points a rule awards for a purchase, or `None` if it does not apply.
///
/// Matching runs first; calculation only for matched pairs.
pub fn evaluate(rule: &Rule, record: &PurchaseRecord, history: &[HistoryRecord]) -> Option<i64> {
    if !matches(rule, record, history) {
        return None;
    }
    calculate(rule, record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Conditions, CustomerId, Reward, RuleStatus};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_evaluate_requires_match() {
        let rule = Rule {
            id: "R1".to_string(),
            name: "big spenders".to_string(),
            status: RuleStatus::Active,
            conditions: Conditions {
                min_amount: dec!(500),
                ..Default::default()
            },
            reward: Reward::FixedPoint { value: 10 },
        };

        let mut record = PurchaseRecord {
            customer_id: CustomerId::new("C1"),
            product_id: "P1".to_string(),
            category_id: "CT1003".to_string(),
            category_name: "FOOD".to_string(),
            branch_id: "BR3444".to_string(),
            purchased_amount: dec!(499.99),
            currency: "THB".to_string(),
            purchase_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
        };

        assert_eq!(evaluate(&rule, &record, &[]), None);

        record.purchased_amount = dec!(500.00);
        assert_eq!(evaluate(&rule, &record, &[]), Some(10));
    }
}
