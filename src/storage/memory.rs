// src/storage/memory.rs
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::accrual::BranchCategories;
use crate::domain::{Customer, CustomerId, CustomerUpdate, Rule};
use crate::error::{AppError, Result};

use super::traits::{rule_in_scope, Storage};

/// In-memory storage, used when no database is configured and in tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    rules: Mutex<Vec<Rule>>,
    customers: Mutex<BTreeMap<CustomerId, Customer>>,
    applied_batches: Mutex<Vec<Vec<CustomerUpdate>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage seeded with a rule catalog.
    pub fn with_rules(rules: Vec<Rule>) -> Self {
        let storage = Self::default();
        *storage.rules.lock() = rules;
        storage
    }

    /// Insert or replace a customer snapshot (for testing).
    pub fn put_customer(&self, customer: Customer) {
        self.customers
            .lock()
            .insert(customer.customer_id.clone(), customer);
    }

    /// Get a customer snapshot (for assertions).
    pub fn customer(&self, customer_id: &str) -> Option<Customer> {
        self.customers
            .lock()
            .get(&CustomerId::new(customer_id))
            .cloned()
    }

    /// Update lists passed to `apply_updates`, in call order (for assertions).
    pub fn applied_batches(&self) -> Vec<Vec<CustomerUpdate>> {
        self.applied_batches.lock().clone()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_active_rules(&self, scope: &BranchCategories) -> Result<Vec<Rule>> {
        if scope.is_empty() {
            return Err(AppError::invalid("branch categories is empty"));
        }

        Ok(self
            .rules
            .lock()
            .iter()
            .filter(|rule| rule.status.is_active() && rule_in_scope(rule, scope))
            .cloned()
            .collect())
    }

    async fn get_customers(&self, customer_ids: &[String]) -> Result<Vec<Customer>> {
        let customers = self.customers.lock();

        if customer_ids.is_empty() {
            return Ok(customers.values().cloned().collect());
        }

        Ok(customer_ids
            .iter()
            .filter_map(|id| customers.get(&CustomerId::new(id.as_str())).cloned())
            .collect())
    }

    async fn apply_updates(&self, updates: &[CustomerUpdate]) -> Result<()> {
        if updates.is_empty() {
            return Err(AppError::invalid("customer updates is empty"));
        }

        let mut customers = self.customers.lock();

        // all-or-nothing: merge into copies, then swap them in
        let mut staged: BTreeMap<CustomerId, Customer> = BTreeMap::new();
        for update in updates {
            let customer = match staged.entry(update.customer_id.clone()) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => entry.insert(
                    customers
                        .get(&update.customer_id)
                        .cloned()
                        .unwrap_or_else(|| Customer::new(update.customer_id.clone())),
                ),
            };
            customer.apply(update)?;
        }
        customers.extend(staged);

        self.applied_batches.lock().push(updates.to_vec());
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
