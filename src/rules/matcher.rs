use crate::domain::{HistoryRecord, PurchaseRecord, Rule};

/// Decide whether `rule` applies to `record` for a customer with `history`.
///
/// Checks run in a fixed order and the history check short-circuits:
/// 1. the purchase is not already in the customer's history
/// 2. amount is at least the rule's minimum (inclusive)
/// 3. branch restriction, if any, equals the record's branch
/// 4. category restriction, if any, contains the record's category
pub fn matches(rule: &Rule, record: &PurchaseRecord, history: &[HistoryRecord]) -> bool {
    if is_recorded(record, history) {
        return false;
    }

    let conditions = &rule.conditions;

    if record.purchased_amount < conditions.min_amount {
        return false;
    }

    if let Some(branch) = conditions.branch() {
        if branch != record.branch_id {
            return false;
        }
    }

    if !conditions.category_ids.is_empty()
        && !conditions
            .category_ids
            .iter()
            .any(|c| *c == record.category_id)
    {
        return false;
    }

    true
}

/// Whether the purchase was already counted in a previous run.
pub fn is_recorded(record: &PurchaseRecord, history: &[HistoryRecord]) -> bool {
    history.iter().any(|h| h.same_purchase(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Conditions, CustomerId, Reward, RuleStatus};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use smallvec::smallvec;

    fn rule(min_amount: Decimal, branch: Option<&str>, categories: &[&str]) -> Rule {
        Rule {
            id: "R1".to_string(),
            name: "test".to_string(),
            status: RuleStatus::Active,
            conditions: Conditions {
                min_amount,
                branch_id: branch.map(str::to_string),
                category_ids: categories.iter().map(|c| c.to_string()).collect(),
            },
            reward: Reward::FixedPoint { value: 20 },
        }
    }

    fn record(amount: Decimal, branch: &str, category: &str) -> PurchaseRecord {
        PurchaseRecord {
            customer_id: CustomerId::new("C1"),
            product_id: "P1".to_string(),
            category_id: category.to_string(),
            category_name: String::new(),
            branch_id: branch.to_string(),
            purchased_amount: amount,
            currency: "THB".to_string(),
            purchase_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
        }
    }

    #[test]
    fn test_all_conditions_hold() {
        let r = rule(dec!(50), Some("BR0001"), &["CT1001"]);
        assert!(matches(&r, &record(dec!(100.00), "BR0001", "CT1001"), &[]));
    }

    #[test]
    fn test_min_amount_is_inclusive() {
        let r = rule(dec!(100.00), None, &[]);

        assert!(matches(&r, &record(dec!(100.00), "BR0001", "CT1001"), &[]));
        assert!(matches(&r, &record(dec!(100), "BR0001", "CT1001"), &[]));
        assert!(!matches(&r, &record(dec!(99.99), "BR0001", "CT1001"), &[]));
    }

    #[test]
    fn test_branch_restriction() {
        let r = rule(dec!(0), Some("BR0001"), &[]);

        assert!(!matches(&r, &record(dec!(10), "BR0002", "CT1001"), &[]));

        let unrestricted = rule(dec!(0), Some(""), &[]);
        assert!(matches(&unrestricted, &record(dec!(10), "BR0002", "CT1001"), &[]));
    }

    #[test]
    fn test_category_restriction() {
        let mut r = rule(dec!(0), None, &["CT1001", "CT1002"]);

        assert!(matches(&r, &record(dec!(10), "BR0001", "CT1002"), &[]));
        assert!(!matches(&r, &record(dec!(10), "BR0001", "CT1003"), &[]));

        r.conditions.category_ids = smallvec![];
        assert!(matches(&r, &record(dec!(10), "BR0001", "CT1003"), &[]));
    }

    #[test]
    fn test_history_duplicate_short_circuits() {
        let r = rule(dec!(0), None, &[]);
        let rec = record(dec!(100.00), "BR0001", "CT1001");
        let history = vec![HistoryRecord {
            product_id: "P1".to_string(),
            branch_id: "BR0001".to_string(),
            amount: dec!(100),
            purchase_date: rec.purchase_date,
        }];

        assert!(is_recorded(&rec, &history));
        assert!(!matches(&r, &rec, &history));
    }

    #[test]
    fn test_history_on_other_date_does_not_block() {
        let r = rule(dec!(0), None, &[]);
        let rec = record(dec!(100.00), "BR0001", "CT1001");
        let history = vec![HistoryRecord {
            product_id: "P1".to_string(),
            branch_id: "BR0001".to_string(),
            amount: dec!(100.00),
            purchase_date: NaiveDate::from_ymd_opt(2025, 1, 14).unwrap(),
        }];

        assert!(matches(&r, &rec, &history));
    }
}
