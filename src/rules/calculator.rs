use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::warn;

use crate::domain::{PurchaseRecord, Reward, Rule};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Points earned by an already-matched (rule, record) pair.
///
/// `None` means the rule does not apply after all: a ratio rule without a
/// positive unit, or arithmetic that overflows. That is distinct from
/// `Some(0)`, which still counts as an applied match.
pub fn calculate(rule: &Rule, record: &PurchaseRecord) -> Option<i64> {
    let amount = record.purchased_amount;

    let points = match &rule.reward {
        Reward::FixedPoint { value } => Some(*value),
        Reward::Percentage { rate } => percentage(amount, *rate),
        Reward::Ratio { value, unit } => match unit {
            Some(unit) if *unit > Decimal::ZERO => ratio(amount, *unit, *value),
            _ => return None,
        },
    };

    if points.is_none() {
        warn!(
            rule_id = %rule.id,
            amount = %amount,
            "Point calculation overflowed, rule skipped"
        );
    }

    points
}

/// `trunc(amount * rate / 100)`.
fn percentage(amount: Decimal, rate: i64) -> Option<i64> {
    amount
        .checked_mul(Decimal::from(rate))?
        .checked_div(HUNDRED)?
        .trunc()
        .to_i64()
}

/// `floor(amount / unit) * value`.
fn ratio(amount: Decimal, unit: Decimal, value: i64) -> Option<i64> {
    amount
        .checked_div(unit)?
        .floor()
        .checked_mul(Decimal::from(value))?
        .to_i64()
}
