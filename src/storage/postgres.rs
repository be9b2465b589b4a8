// src/storage/postgres.rs
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

use crate::accrual::BranchCategories;
use crate::domain::{
    Conditions, Customer, CustomerId, CustomerUpdate, HistoryRecord, Reward, Rule, RuleStatus,
};
use crate::error::{AppError, Result};

use super::traits::{rule_in_scope, Storage};

/// PostgreSQL implementation of the Storage trait.
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Create a new PostgresStorage instance with a connection pool.
    pub async fn connect(
        database_url: &str,
        min_connections: u32,
        max_connections: u32,
    ) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(min_connections)
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations.
    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Decode a rule row. `Ok(None)` for unknown rule types or statuses.
fn rule_from_row(row: &PgRow) -> std::result::Result<Option<Rule>, sqlx::Error> {
    let id: String = row.try_get("id")?;
    let rule_type: String = row.try_get("rule_type")?;
    let status: String = row.try_get("status")?;
    let value: i64 = row.try_get("reward_value")?;
    let ratio_unit: Option<Decimal> = row.try_get("ratio_unit")?;

    let Some(reward) = Reward::from_parts(&rule_type, value, ratio_unit) else {
        debug!(rule_id = %id, rule_type = %rule_type, "Skipping rule of unknown type");
        return Ok(None);
    };
    let Some(status) = RuleStatus::from_str(&status) else {
        debug!(rule_id = %id, status = %status, "Skipping rule with unknown status");
        return Ok(None);
    };

    let category_ids: Vec<String> = row.try_get("category_ids")?;

    Ok(Some(Rule {
        id,
        name: row.try_get("name")?,
        status,
        conditions: Conditions {
            min_amount: row.try_get("min_amount")?,
            branch_id: row.try_get("branch_id")?,
            category_ids: category_ids.into_iter().collect(),
        },
        reward,
    }))
}

fn customer_from_row(row: &PgRow) -> std::result::Result<Customer, sqlx::Error> {
    let mut customer = Customer::new(CustomerId::new(row.try_get::<String, _>("customer_id")?));
    customer.points = row.try_get("points")?;
    customer.last_purchase_date = row.try_get("last_purchase_date")?;
    Ok(customer)
}

fn history_from_row(row: &PgRow) -> std::result::Result<HistoryRecord, sqlx::Error> {
    Ok(HistoryRecord {
        product_id: row.try_get("product_id")?,
        branch_id: row.try_get("branch_id")?,
        amount: row.try_get("amount")?,
        purchase_date: row.try_get("purchase_date")?,
    })
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn get_active_rules(&self, scope: &BranchCategories) -> Result<Vec<Rule>> {
        if scope.is_empty() {
            return Err(AppError::invalid("branch categories is empty"));
        }

        let branches: Vec<String> = scope.keys().cloned().collect();

        let rows = sqlx::query(
            r#"
            SELECT id, name, rule_type, status, min_amount, branch_id,
                   category_ids, reward_value, ratio_unit
            FROM rules
            WHERE status = 'ACTIVE'
              AND (branch_id IS NULL OR branch_id = '' OR branch_id = ANY($1))
            ORDER BY id
            "#,
        )
        .bind(&branches)
        .fetch_all(&self.pool)
        .await?;

        let mut rules = Vec::with_capacity(rows.len());
        for row in &rows {
            match rule_from_row(row) {
                Ok(Some(rule)) if rule_in_scope(&rule, scope) => rules.push(rule),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Skipping unreadable rule row"),
            }
        }

        Ok(rules)
    }

    async fn get_customers(&self, customer_ids: &[String]) -> Result<Vec<Customer>> {
        // NULL selects every customer
        let filter: Option<Vec<String>> = if customer_ids.is_empty() {
            None
        } else {
            Some(customer_ids.to_vec())
        };

        // one snapshot for all three reads, so a concurrent apply is either
        // fully visible or not at all
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let rows = sqlx::query(
            r#"
            SELECT customer_id, points, last_purchase_date
            FROM customers
            WHERE $1::text[] IS NULL OR customer_id = ANY($1)
            "#,
        )
        .bind(&filter)
        .fetch_all(&mut *tx)
        .await?;

        let mut customers: BTreeMap<CustomerId, Customer> = BTreeMap::new();
        let mut broken: HashSet<CustomerId> = HashSet::new();

        for row in &rows {
            match customer_from_row(row) {
                Ok(customer) => {
                    customers.insert(customer.customer_id.clone(), customer);
                }
                Err(e) => warn!(error = %e, "Skipping unreadable customer row"),
            }
        }

        let record_rows = sqlx::query(
            r#"
            SELECT customer_id, product_id, branch_id, amount, purchase_date
            FROM customer_records
            WHERE $1::text[] IS NULL OR customer_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&filter)
        .fetch_all(&mut *tx)
        .await?;

        for row in &record_rows {
            let customer_id = CustomerId::new(row.try_get::<String, _>("customer_id")?);
            match history_from_row(row) {
                Ok(record) => {
                    if let Some(customer) = customers.get_mut(&customer_id) {
                        customer.records.push(record);
                    }
                }
                Err(e) => {
                    warn!(customer_id = %customer_id, error = %e, "Unreadable purchase history, skipping customer");
                    broken.insert(customer_id);
                }
            }
        }

        let point_rows = sqlx::query(
            r#"
            SELECT customer_id, purchase_date, points
            FROM customer_daily_points
            WHERE $1::text[] IS NULL OR customer_id = ANY($1)
            "#,
        )
        .bind(&filter)
        .fetch_all(&mut *tx)
        .await?;

        for row in &point_rows {
            let customer_id = CustomerId::new(row.try_get::<String, _>("customer_id")?);
            let date: NaiveDate = row.try_get("purchase_date")?;
            let points: i64 = row.try_get("points")?;

            if let Some(customer) = customers.get_mut(&customer_id) {
                *customer.points_by_date.entry(date).or_insert(0) += points;
            }
        }

        tx.commit().await?;

        Ok(customers
            .into_iter()
            .filter(|(id, _)| !broken.contains(id))
            .map(|(_, customer)| customer)
            .collect())
    }

    async fn apply_updates(&self, updates: &[CustomerUpdate]) -> Result<()> {
        if updates.is_empty() {
            return Err(AppError::invalid("customer updates is empty"));
        }

        let mut tx = self.pool.begin().await?;

        for update in updates {
            let customer_id = update.customer_id.as_str();

            sqlx::query(
                r#"
                INSERT INTO customers (customer_id, points, last_purchase_date, created_at, updated_at)
                VALUES ($1, $2, $3, now(), now())
                ON CONFLICT (customer_id)
                DO UPDATE SET
                    points = customers.points + EXCLUDED.points,
                    last_purchase_date = EXCLUDED.last_purchase_date,
                    updated_at = now()
                "#,
            )
            .bind(customer_id)
            .bind(update.points_to_add)
            .bind(update.last_purchase_date)
            .execute(&mut *tx)
            .await?;

            for (date, points) in &update.points_by_date {
                sqlx::query(
                    r#"
                    INSERT INTO customer_daily_points (customer_id, purchase_date, points)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (customer_id, purchase_date)
                    DO UPDATE SET points = customer_daily_points.points + EXCLUDED.points
                    "#,
                )
                .bind(customer_id)
                .bind(*date)
                .bind(*points)
                .execute(&mut *tx)
                .await?;
            }

            let products: Vec<&str> = update.records.iter().map(|r| r.product_id.as_str()).collect();
            let branches: Vec<&str> = update.records.iter().map(|r| r.branch_id.as_str()).collect();
            let amounts: Vec<Decimal> = update.records.iter().map(|r| r.amount).collect();
            let dates: Vec<NaiveDate> = update.records.iter().map(|r| r.purchase_date).collect();

            sqlx::query(
                r#"
                INSERT INTO customer_records (customer_id, product_id, branch_id, amount, purchase_date)
                SELECT $1, product_id, branch_id, amount, purchase_date
                FROM UNNEST($2::text[], $3::text[], $4::numeric[], $5::date[])
                    AS r(product_id, branch_id, amount, purchase_date)
                "#,
            )
            .bind(customer_id)
            .bind(&products)
            .bind(&branches)
            .bind(&amounts)
            .bind(&dates)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
