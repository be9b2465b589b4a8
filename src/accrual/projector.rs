use chrono::NaiveDate;

use crate::domain::{Customer, ExportRow};
use crate::error::{AppError, Result};

/// Cumulative points per customer as of `target`, highest first.
///
/// Only per-date entries on or before `target` count; customers without any
/// are left out. Ties on points go to the later last date, then to the
/// lower customer id. A cumulative total outside `i64` is an internal error.
pub fn project(customers: &[Customer], target: NaiveDate) -> Result<Vec<ExportRow>> {
    let mut rows = Vec::with_capacity(customers.len());

    for customer in customers {
        let mut points = 0i64;
        let mut last = None;

        for (date, value) in customer.points_by_date.range(..=target) {
            points = points.checked_add(*value).ok_or_else(|| {
                AppError::internal(format!(
                    "points overflow for customer {} as of {target}",
                    customer.customer_id
                ))
            })?;
            last = Some(*date);
        }

        if let Some(last_purchase_date) = last {
            rows.push(ExportRow {
                customer_id: customer.customer_id.clone(),
                points,
                last_purchase_date,
            });
        }
    }

    rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.last_purchase_date.cmp(&a.last_purchase_date))
            .then_with(|| a.customer_id.cmp(&b.customer_id))
    });

    Ok(rows)
}
