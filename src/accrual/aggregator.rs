use ahash::AHashMap;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::domain::{Customer, CustomerId, CustomerUpdate, HistoryRecord, PurchaseRecord, Rule};
use crate::rules;

/// Counters gathered while aggregating, for logging and metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateStats {
    pub rules_evaluated: u64,
    pub rules_applied: u64,
}

/// Fold every applicable (record, rule) pair into one update per customer.
///
/// Each applied pair appends the record to the update's history, so a
/// purchase matching two rules appears twice. Customers without any applied
/// pair get no update.
pub fn aggregate(
    rules: &[Rule],
    records: &[PurchaseRecord],
    customers: &[Customer],
) -> Vec<CustomerUpdate> {
    aggregate_with_stats(rules, records, customers).0
}

/// Same as [`aggregate`], also returning evaluation counters.
pub fn aggregate_with_stats(
    rules: &[Rule],
    records: &[PurchaseRecord],
    customers: &[Customer],
) -> (Vec<CustomerUpdate>, AggregateStats) {
    let history: AHashMap<&CustomerId, &[HistoryRecord]> = customers
        .iter()
        .map(|c| (&c.customer_id, c.records.as_slice()))
        .collect();

    let mut updates: BTreeMap<CustomerId, CustomerUpdate> = BTreeMap::new();
    let mut stats = AggregateStats::default();

    for record in records {
        let seen = history
            .get(&record.customer_id)
            .copied()
            .unwrap_or_default();

        for rule in rules {
            stats.rules_evaluated += 1;

            let Some(points) = rules::evaluate(rule, record, seen) else {
                continue;
            };

            let folded = match updates.get_mut(&record.customer_id) {
                Some(update) => update.add(record, points),
                None => {
                    updates.insert(
                        record.customer_id.clone(),
                        CustomerUpdate::first(record, points),
                    );
                    true
                }
            };

            if !folded {
                warn!(
                    customer_id = %record.customer_id,
                    rule_id = %rule.id,
                    points,
                    "Point total overflow, rule not applied"
                );
                continue;
            }
            stats.rules_applied += 1;

            debug!(
                customer_id = %record.customer_id,
                rule_id = %rule.id,
                points,
                "Rule applied"
            );
        }
    }

    (updates.into_values().collect(), stats)
}
