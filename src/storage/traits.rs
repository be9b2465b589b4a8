// src/storage/traits.rs
use async_trait::async_trait;

use crate::accrual::BranchCategories;
use crate::domain::{Customer, CustomerUpdate, Rule};
use crate::error::Result;

/// Storage trait for persistence operations.
#[async_trait]
pub trait Storage: Send + Sync {
    // Rules
    /// Active rules whose scope intersects any (branch, categories) entry.
    /// An empty map is invalid.
    async fn get_active_rules(&self, scope: &BranchCategories) -> Result<Vec<Rule>>;

    // Customers
    /// Snapshots for the given ids; an empty slice means all customers.
    async fn get_customers(&self, customer_ids: &[String]) -> Result<Vec<Customer>>;

    /// Upsert by customer id, merging points and per-date points additively,
    /// appending records and setting the last purchase date.
    async fn apply_updates(&self, updates: &[CustomerUpdate]) -> Result<()>;

    // Health
    async fn health_check(&self) -> Result<()>;
}

/// Whether a rule's branch and category scope intersects the requested map.
///
/// Shared by backends that filter in memory.
pub fn rule_in_scope(rule: &Rule, scope: &BranchCategories) -> bool {
    let conditions = &rule.conditions;

    scope.iter().any(|(branch, categories)| {
        let branch_ok = conditions.branch().map_or(true, |b| b == branch);
        let category_ok = categories.is_empty()
            || conditions.category_ids.is_empty()
            || conditions
                .category_ids
                .iter()
                .any(|c| categories.contains(c));

        branch_ok && category_ok
    })
}
